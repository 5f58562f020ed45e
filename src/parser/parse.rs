//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including error types, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser uses a recursive descent approach with the following organization:
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: `fn`, `struct` and type annotations
//! - `statements`: `let`, `if`, loops, `load`, `attempt` and the rest
//! - `expressions`: precedence climbing plus the postfix chain
//!
//! # Implementation
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.
//!
//! There is no error recovery: the first malformed construct aborts the parse
//! and no partial [`Program`] is returned.

use crate::parser::ast::*;
use crate::parser::lexer::{LexError, Lexer, Token};
use rustc_hash::FxHashSet;
use thiserror::Error;

/// Syntax errors raised while turning tokens into an AST
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    /// Token mismatch: what the grammar wanted versus what was found
    #[error("syntax error at {location}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        location: SourceLocation,
    },

    /// Structurally valid tokens forming an invalid construct
    #[error("syntax error at {location}: {message}")]
    Invalid {
        message: String,
        location: SourceLocation,
    },
}

impl ParseError {
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::Lex(err) => err.location,
            ParseError::UnexpectedToken { location, .. } | ParseError::Invalid { location, .. } => {
                *location
            }
        }
    }
}

/// Recursive descent parser for Forge
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
    /// Struct names declared so far, so `Name(args)` parses as an instantiation
    pub(crate) struct_names: FxHashSet<String>,
    next_node_id: NodeId,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    /// Build a parser over an existing token stream. A missing trailing
    /// [`Token::Eof`] is supplied.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(Token::Eof(_))) {
            let loc = tokens.last().map(Token::location).unwrap_or_default();
            tokens.push(Token::Eof(loc));
        }
        Self {
            tokens,
            position: 0,
            struct_names: FxHashSet::default(),
            next_node_id: 0,
        }
    }

    /// Parse the entire program (top-level statements)
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut program = Program::new();

        while !self.is_at_end() {
            let stmt = self.parse_statement()?;
            program.statements.push(stmt);
        }

        Ok(program)
    }

    // ===== Helper methods =====

    pub(crate) fn fresh_node_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    pub(crate) fn match_token(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(token)
    }

    pub(crate) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.position += 1;
        }
        self.previous()
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof(_))
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.position]
    }

    pub(crate) fn peek_token(&self) -> Token {
        self.tokens[self.position].clone()
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    pub(crate) fn previous(&self) -> &Token {
        &self.tokens[self.position.saturating_sub(1)]
    }

    pub(crate) fn previous_location(&self) -> SourceLocation {
        self.previous().location()
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    /// Error for the current token not matching `expected`.
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.peek().to_string(),
            location: self.current_location(),
        }
    }

    pub(crate) fn expect_token(&mut self, token: &Token, expected: &str) -> Result<(), ParseError> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&Token::LParen(self.current_location()), &format!("'(' {ctx}"))
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&Token::RParen(self.current_location()), &format!("')' {ctx}"))
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&Token::LBrace(self.current_location()), &format!("'{{' {ctx}"))
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&Token::RBrace(self.current_location()), &format!("'}}' {ctx}"))
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<(), ParseError> {
        self.expect_token(&Token::Semicolon(self.current_location()), &format!("';' {ctx}"))
    }

    /// Statements may end with an optional `;`.
    pub(crate) fn skip_semicolon(&mut self) {
        self.match_token(&Token::Semicolon(self.current_location()));
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String, ParseError> {
        if let Token::Ident(name, _) = self.peek_token() {
            self.advance();
            Ok(name)
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    pub(crate) fn expect_string(&mut self, ctx: &str) -> Result<String, ParseError> {
        if let Token::StringLiteral(value, _) = self.peek_token() {
            self.advance();
            Ok(value)
        } else {
            Err(self.unexpected(&format!("string literal {ctx}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Program {
        let mut parser = Parser::new(source).unwrap();
        parser.parse_program().unwrap()
    }

    #[test]
    fn test_parse_simple_function() {
        let program = parse("fn add(a: int, b: int) -> int { return a + b; }");

        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            AstNode::FunctionDef {
                name,
                params,
                return_type,
                body,
                ..
            } => {
                assert_eq!(name, "add");
                assert_eq!(params.len(), 2);
                assert_eq!(params[0].type_hint, Some(TypeAnnotation::named("int")));
                assert_eq!(return_type, &Some(TypeAnnotation::named("int")));
                assert!(matches!(body, FunctionBody::Block(stmts) if stmts.len() == 1));
            }
            other => panic!("Expected function definition, got {other:?}"),
        }
    }

    #[test]
    fn test_semicolons_are_optional() {
        let program = parse("let a = 1\nlet b = 2;\nprint(a + b)");
        assert_eq!(program.statements.len(), 3);
    }

    #[test]
    fn test_parse_struct() {
        let program = parse("struct Point { x: int, y: int }");

        match &program.statements[0] {
            AstNode::StructDef { name, fields, .. } => {
                assert_eq!(name, "Point");
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[1].name, "y");
            }
            other => panic!("Expected struct definition, got {other:?}"),
        }
    }

    #[test]
    fn test_error_reports_expected_and_found() {
        let mut parser = Parser::new("let = 5").unwrap();
        let err = parser.parse_program().unwrap_err();

        match err {
            ParseError::UnexpectedToken {
                expected, found, location,
            } => {
                assert_eq!(expected, "identifier");
                assert_eq!(found, "'='");
                assert_eq!(location, SourceLocation::new(1, 5));
            }
            other => panic!("Expected token mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_from_tokens_appends_eof() {
        let tokens = vec![
            Token::Break(SourceLocation::new(1, 1)),
        ];
        let program = Parser::from_tokens(tokens).parse_program().unwrap();
        assert!(matches!(program.statements[0], AstNode::Break { .. }));
    }
}
