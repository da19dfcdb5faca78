// src/lang/lexer.rs

//! Command lexer.
//! Classifies one line of script text and splits commands into a keyword
//! plus whitespace-separated argument tokens.

use log::trace;

/// Prefix marking a comment line.
const COMMENT_PREFIX: char = '#';

/// A single lexed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// Empty or whitespace only.
    Blank,
    /// First non-whitespace character is `#`.
    Comment(&'a str),
    /// Keyword in column one followed by zero or more arguments.
    Command { keyword: &'a str, args: Vec<&'a str> },
}

pub fn lex_line(line: &str) -> Line<'_> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if let Some(comment) = trimmed.strip_prefix(COMMENT_PREFIX) {
        return Line::Comment(comment);
    }

    let mut fields = trimmed.split_whitespace();
    // Non-empty after trimming, so there is at least one field.
    let keyword = fields.next().unwrap_or_default();
    let args: Vec<&str> = fields.collect();
    trace!("lex_line: keyword='{}' args={:?}", keyword, args);
    Line::Command { keyword, args }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines() {
        assert_eq!(lex_line(""), Line::Blank);
        assert_eq!(lex_line("   \t  "), Line::Blank);
        assert_eq!(lex_line("\r"), Line::Blank);
    }

    #[test]
    fn comment_lines() {
        assert_eq!(lex_line("# hello"), Line::Comment(" hello"));
        assert_eq!(lex_line("   #indented"), Line::Comment("indented"));
    }

    #[test]
    fn command_with_args() {
        assert_eq!(
            lex_line("bgrect 0.1  0.2\t0.3 0.4\r"),
            Line::Command {
                keyword: "bgrect",
                args: vec!["0.1", "0.2", "0.3", "0.4"],
            }
        );
    }

    #[test]
    fn command_without_args() {
        assert_eq!(
            lex_line("update"),
            Line::Command {
                keyword: "update",
                args: vec![],
            }
        );
    }

    #[test]
    fn hash_inside_arguments_is_not_a_comment() {
        assert_eq!(
            lex_line("figure 0.5 #0.5"),
            Line::Command {
                keyword: "figure",
                args: vec!["0.5", "#0.5"],
            }
        );
    }
}
