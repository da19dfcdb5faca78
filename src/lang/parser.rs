// src/lang/parser.rs

//! Command parser: turns lexed lines into `Operation`s.
//!
//! Parsing is all-or-nothing. The first malformed line aborts the whole
//! script and nothing parsed before it is returned.

use crate::color::{Rgba, GREEN, RED, WHITE};
use crate::lang::lexer::{lex_line, Line};
use crate::painter::op::Operation;
use crate::painter::state::BackgroundRect;
use log::{debug, trace};
use std::io::BufRead;
use thiserror::Error;

/// Errors raised while parsing a script. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: unknown command '{keyword}'")]
    UnknownCommand { line: usize, keyword: String },

    #[error("line {line}: '{command}' expects {expected} arguments, got {actual}")]
    ArityMismatch {
        line: usize,
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("line {line}: invalid {field} for '{command}': '{token}' is not a number")]
    InvalidArgument {
        line: usize,
        command: &'static str,
        field: &'static str,
        token: String,
    },

    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Line the error was found on, if it came from a specific line.
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::UnknownCommand { line, .. }
            | ParseError::ArityMismatch { line, .. }
            | ParseError::InvalidArgument { line, .. } => Some(*line),
            ParseError::Io(_) => None,
        }
    }
}

/// Commands that take no arguments. Extra tokens after them are ignored.
const NO_ARG_COMMANDS: [&str; 4] = ["reset", "white", "green", "update"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Color given to every `figure`.
    pub figure_color: Rgba,
    /// Skip `#` lines instead of rejecting them.
    pub allow_comments: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            figure_color: RED,
            allow_comments: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Parser {
    options: ParserOptions,
}

impl Parser {
    pub fn new(options: ParserOptions) -> Self {
        Parser { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse a whole script from `input`.
    pub fn parse<R: BufRead>(&self, input: R) -> Result<Vec<Operation>, ParseError> {
        let mut ops = Vec::new();
        for (idx, line) in input.lines().enumerate() {
            let line = line?;
            if let Some(op) = self.parse_line(&line, idx + 1)? {
                ops.push(op);
            }
        }
        debug!("Parser: parsed {} operations", ops.len());
        Ok(ops)
    }

    pub fn parse_str(&self, script: &str) -> Result<Vec<Operation>, ParseError> {
        self.parse(script.as_bytes())
    }

    /// Parse one line. Blank and (when allowed) comment lines yield `None`.
    pub fn parse_line(&self, text: &str, line: usize) -> Result<Option<Operation>, ParseError> {
        let (keyword, args) = match lex_line(text) {
            Line::Blank => return Ok(None),
            Line::Comment(_) if self.options.allow_comments => {
                trace!("Parser: skipping comment on line {}", line);
                return Ok(None);
            }
            Line::Comment(_) => {
                let keyword = text.split_whitespace().next().unwrap_or_default();
                return Err(ParseError::UnknownCommand {
                    line,
                    keyword: keyword.to_string(),
                });
            }
            Line::Command { keyword, args } => (keyword, args),
        };

        if NO_ARG_COMMANDS.iter().any(|c| *c == keyword) && !args.is_empty() {
            debug!(
                "Parser: ignoring {} trailing arguments to '{}' on line {}",
                args.len(),
                keyword,
                line
            );
        }

        let op = match keyword {
            "reset" => Operation::Reset,
            "white" => Operation::SetBackground(WHITE),
            "green" => Operation::SetBackground(GREEN),
            "update" => Operation::Update,
            "bgrect" => {
                let [x1, y1, x2, y2] = floats(line, "bgrect", &args, ["x1", "y1", "x2", "y2"])?;
                Operation::AddBackgroundRect(BackgroundRect { x1, y1, x2, y2 })
            }
            "figure" => {
                let [x, y] = floats(line, "figure", &args, ["x", "y"])?;
                Operation::AddFigure {
                    x,
                    y,
                    color: self.options.figure_color,
                }
            }
            "move" => {
                let [x, y] = floats(line, "move", &args, ["x", "y"])?;
                Operation::Move { x, y }
            }
            other => {
                return Err(ParseError::UnknownCommand {
                    line,
                    keyword: other.to_string(),
                })
            }
        };
        Ok(Some(op))
    }
}

/// Parse exactly `N` arguments as `f32`, naming each by `fields`.
fn floats<const N: usize>(
    line: usize,
    command: &'static str,
    args: &[&str],
    fields: [&'static str; N],
) -> Result<[f32; N], ParseError> {
    if args.len() != N {
        return Err(ParseError::ArityMismatch {
            line,
            command,
            expected: N,
            actual: args.len(),
        });
    }
    let mut values = [0.0f32; N];
    for ((value, token), field) in values.iter_mut().zip(args).zip(fields) {
        *value = token
            .parse::<f32>()
            .map_err(|_| ParseError::InvalidArgument {
                line,
                command,
                field,
                token: token.to_string(),
            })?;
    }
    Ok(values)
}
