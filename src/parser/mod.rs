//! Forge source code parser
//!
//! This module transforms Forge source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: The [`Parser`] and its error type, with the grammar split
//!   across `declarations`, `statements` and `expressions`
//! - [`ast`]: AST node definitions
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary operators.
//! No external parser generator dependencies.

pub mod ast;
pub mod lexer;
pub mod parse;

mod declarations;
mod expressions;
mod statements;

pub use ast::{AstNode, Program, SourceLocation};
pub use expressions::ATTEMPT_EXPR_ERROR_NAME;
pub use lexer::{LexError, Lexer, Token};
pub use parse::{ParseError, Parser};

/// Tokenize and parse `source` into a [`Program`].
pub fn parse_source(source: &str) -> Result<Program, ParseError> {
    Parser::new(source)?.parse_program()
}

/// Parse an already tokenized program.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<Program, ParseError> {
    Parser::from_tokens(tokens).parse_program()
}
