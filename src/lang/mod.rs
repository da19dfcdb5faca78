// src/lang/mod.rs

//! The line-oriented command language.

mod lexer;
mod parser;

pub use lexer::{lex_line, Line};
pub use parser::{ParseError, Parser, ParserOptions};
