//! Declaration parsing implementation
//!
//! This module handles parsing of declarations in Forge programs:
//!
//! - Struct definitions: `struct Name { field: type, ... }`
//! - Function definitions: `fn name(params) [-> type] { ... }` or `=> expr`
//! - Type annotations: type names, struct names and `&` references
//!
//! # Grammar
//!
//! ```text
//! struct_def   ::= "struct" identifier "{" (identifier ":" type ","?)* "}"
//! function_def ::= "fn" identifier "(" params ")" ("->" type)? (block | "=>" expr)
//! params       ::= (identifier (":" type)? ","?)*
//! type         ::= "&"? (type_name | identifier)
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse struct definition; the `struct` keyword is already consumed.
    pub(crate) fn parse_struct_definition(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        let name = self.expect_identifier()?;
        self.expect_lbrace("after struct name")?;

        let mut fields = Vec::new();
        while !self.check(&Token::RBrace(self.current_location())) {
            let field_name = self.expect_identifier()?;
            self.expect_token(&Token::Colon(self.current_location()), "':' after field name")?;
            let field_type = self.parse_type()?;

            fields.push(Field {
                name: field_name,
                field_type,
            });

            self.match_token(&Token::Comma(self.current_location()));
        }

        self.expect_rbrace("after struct fields")?;
        self.struct_names.insert(name.clone());

        Ok(AstNode::StructDef {
            name,
            fields,
            location: loc,
        })
    }

    /// Parse function definition; the `fn` keyword is already consumed.
    pub(crate) fn parse_function_definition(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();
        let name = self.expect_identifier()?;

        self.expect_lparen("after function name")?;
        let params = self.parse_parameter_list()?;
        self.expect_rparen("after parameters")?;

        let return_type = if self.match_token(&Token::Arrow(self.current_location())) {
            Some(self.parse_type()?)
        } else {
            None
        };

        let body = if self.match_token(&Token::FatArrow(self.current_location())) {
            FunctionBody::Expr(Box::new(self.parse_expression()?))
        } else {
            self.expect_lbrace("before function body")?;
            let statements = self.parse_block_statements()?;
            self.expect_rbrace("after function body")?;
            FunctionBody::Block(statements)
        };

        Ok(AstNode::FunctionDef {
            name,
            params,
            return_type,
            body,
            location: loc,
        })
    }

    /// Parse parameter list: `a, b: int, c: &Point`
    pub(crate) fn parse_parameter_list(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();

        while !self.check(&Token::RParen(self.current_location())) {
            let name = self.expect_identifier()?;
            let type_hint = if self.match_token(&Token::Colon(self.current_location())) {
                Some(self.parse_type()?)
            } else {
                None
            };
            params.push(Param { name, type_hint });

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(params)
    }

    /// Parse type: `&`? (type name | struct name)
    pub(crate) fn parse_type(&mut self) -> Result<TypeAnnotation, ParseError> {
        let by_ref = self.match_token(&Token::Amp(self.current_location()));

        let name = match self.peek_token() {
            Token::TypeName(name, _) | Token::Ident(name, _) => {
                self.advance();
                name
            }
            _ => return Err(self.unexpected("type")),
        };

        Ok(TypeAnnotation { name, by_ref })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn first(source: &str) -> AstNode {
        let mut parser = Parser::new(source).unwrap();
        parser.parse_program().unwrap().statements.remove(0)
    }

    #[test]
    fn test_fat_arrow_body() {
        match first("fn double(x) => x * 2") {
            AstNode::FunctionDef { params, body, return_type, .. } => {
                assert_eq!(params[0].type_hint, None);
                assert_eq!(return_type, None);
                assert!(matches!(body, FunctionBody::Expr(_)));
            }
            other => panic!("Expected function definition, got {other:?}"),
        }
    }

    #[test]
    fn test_reference_parameter_and_struct_fields() {
        let node = first("fn area(r: &Rect) -> float { return r.w * r.h }");
        match node {
            AstNode::FunctionDef { params, .. } => {
                assert_eq!(params[0].type_hint, Some(TypeAnnotation::reference("Rect")));
            }
            other => panic!("Expected function definition, got {other:?}"),
        }

        match first("struct Line { a: Point b: &Point }") {
            AstNode::StructDef { fields, .. } => {
                assert_eq!(fields[0].field_type, TypeAnnotation::named("Point"));
                assert_eq!(fields[1].field_type, TypeAnnotation::reference("Point"));
            }
            other => panic!("Expected struct definition, got {other:?}"),
        }
    }
}
