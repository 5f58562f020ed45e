//! Statement parsing implementation
//!
//! This module handles parsing of all Forge statement types:
//!
//! - Bindings: `let x: int = 42`
//! - Control flow: `if`/`else if`/`else`, `while`, three-clause `for`
//! - Jump statements: `return`, `break`, `continue`
//! - Module imports: `load "math.forge"`
//! - Protected regions: `attempt { ... } rescue err { ... }`
//! - Blocks and expression statements (calls, assignments)
//!
//! # Grammar
//!
//! ```text
//! statement ::= let_stmt | fn_def | struct_def | if_stmt | while_stmt
//!             | for_stmt | return_stmt | "break" | "continue" | load_stmt
//!             | attempt_stmt | block | expr_stmt
//! ```
//!
//! Every statement may be followed by an optional `;`.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse block statements (inside braces, excluding the braces themselves)
    pub(crate) fn parse_block_statements(&mut self) -> Result<Vec<AstNode>, ParseError> {
        let mut statements = Vec::new();

        while !self.check(&Token::RBrace(self.current_location())) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(statements)
    }

    /// Parse a braced block: `{ statements }`
    pub(crate) fn parse_block(&mut self, ctx: &str) -> Result<Vec<AstNode>, ParseError> {
        self.expect_lbrace(ctx)?;
        let statements = self.parse_block_statements()?;
        self.expect_rbrace(&format!("to close block {ctx}"))?;
        Ok(statements)
    }

    /// Parse a statement
    pub(crate) fn parse_statement(&mut self) -> Result<AstNode, ParseError> {
        let stmt = self.parse_statement_inner()?;
        self.skip_semicolon();
        Ok(stmt)
    }

    fn parse_statement_inner(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        if self.match_token(&Token::Struct(loc)) {
            return self.parse_struct_definition();
        }

        if self.match_token(&Token::Fn(loc)) {
            return self.parse_function_definition();
        }

        if self.match_token(&Token::Let(loc)) {
            return self.parse_let_statement();
        }

        if self.match_token(&Token::If(loc)) {
            return self.parse_if_statement();
        }

        if self.match_token(&Token::While(loc)) {
            return self.parse_while_statement();
        }

        if self.match_token(&Token::For(loc)) {
            return self.parse_for_statement();
        }

        if self.match_token(&Token::Return(loc)) {
            return self.parse_return_statement();
        }

        if self.match_token(&Token::Break(loc)) {
            return Ok(AstNode::Break { location: loc });
        }

        if self.match_token(&Token::Continue(loc)) {
            return Ok(AstNode::Continue { location: loc });
        }

        if self.match_token(&Token::Load(loc)) {
            let path = self.expect_string("after 'load'")?;
            return Ok(AstNode::Load {
                path,
                location: loc,
            });
        }

        // `attempt {` is the statement form; `attempt expr rescue expr` is an
        // expression and falls through to the expression statement below.
        if self.check(&Token::Attempt(loc))
            && self
                .peek_ahead(1)
                .is_some_and(|t| matches!(t, Token::LBrace(_)))
        {
            self.advance();
            return self.parse_attempt_statement();
        }

        if self.check(&Token::LBrace(loc)) {
            let statements = self.parse_block("")?;
            return Ok(AstNode::Block {
                statements,
                location: loc,
            });
        }

        let expr = self.parse_expression()?;
        if matches!(expr, AstNode::Assignment { .. }) {
            return Ok(expr);
        }
        Ok(AstNode::ExpressionStatement {
            expr: Box::new(expr),
            location: loc,
        })
    }

    /// Parse `name [: type] = expr`; the `let` keyword is already consumed.
    pub(crate) fn parse_let_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();
        let name = self.expect_identifier()?;

        let type_hint = if self.match_token(&Token::Colon(self.current_location())) {
            Some(self.parse_type()?)
        } else {
            None
        };

        self.expect_token(&Token::Eq(self.current_location()), "'=' in let binding")?;
        let mut value = self.parse_expression()?;

        // Annotations the generator needs later: the coercion applied to
        // `input(...)` and the container variant of a list literal.
        if let Some(hint) = &type_hint {
            match &mut value {
                AstNode::Call {
                    callee,
                    expected_type,
                    ..
                } if callee.as_identifier() == Some("input") => {
                    *expected_type = Some(hint.clone());
                }
                AstNode::ListLiteral { forced_hint, .. } => {
                    *forced_hint = Some(hint.clone());
                }
                _ => {}
            }
        }

        Ok(AstNode::Let {
            name,
            type_hint,
            value: Box::new(value),
            location: loc,
        })
    }

    /// Parse `return [expr]`
    fn parse_return_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        let ends_here = self.check(&Token::Semicolon(self.current_location()))
            || self.check(&Token::RBrace(self.current_location()))
            || self.is_at_end();

        let expr = if ends_here {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        Ok(AstNode::Return {
            expr,
            location: loc,
        })
    }

    /// Parse `if cond { } (else if cond { } | elif cond { })* (else { })?`
    fn parse_if_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        let condition = Box::new(self.parse_expression()?);
        let then_branch = self.parse_block("after if condition")?;

        let mut else_ifs = Vec::new();
        let mut else_branch = None;

        loop {
            if self.match_token(&Token::Elif(self.current_location())) {
                let condition = self.parse_expression()?;
                let body = self.parse_block("after elif condition")?;
                else_ifs.push(ElseIf { condition, body });
            } else if self.match_token(&Token::Else(self.current_location())) {
                if self.match_token(&Token::If(self.current_location())) {
                    let condition = self.parse_expression()?;
                    let body = self.parse_block("after else-if condition")?;
                    else_ifs.push(ElseIf { condition, body });
                } else {
                    else_branch = Some(self.parse_block("after 'else'")?);
                    break;
                }
            } else {
                break;
            }
        }

        Ok(AstNode::If {
            condition,
            then_branch,
            else_ifs,
            else_branch,
            location: loc,
        })
    }

    /// Parse `while cond { }`
    fn parse_while_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        let condition = Box::new(self.parse_expression()?);
        let body = self.parse_block("after while condition")?;

        Ok(AstNode::While {
            condition,
            body,
            location: loc,
        })
    }

    /// Parse `for let i = 0; cond; increment { }`
    fn parse_for_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        self.expect_token(&Token::Let(self.current_location()), "'let' to start for-loop initializer")?;
        let init = Box::new(self.parse_let_statement()?);
        self.expect_semicolon("after for-loop initializer")?;

        let condition = Box::new(self.parse_expression()?);
        self.expect_semicolon("after for-loop condition")?;

        let increment = Box::new(self.parse_expression()?);
        let body = self.parse_block("after for-loop header")?;

        Ok(AstNode::For {
            init,
            condition,
            increment,
            body,
            location: loc,
        })
    }

    /// Parse `{ } rescue name { }`; the `attempt` keyword is already consumed.
    fn parse_attempt_statement(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.previous_location();

        let try_block = self.parse_block("after 'attempt'")?;
        self.expect_token(&Token::Rescue(self.current_location()), "'rescue' after attempt block")?;
        let error_name = self.expect_identifier()?;
        let rescue_block = self.parse_block("after rescue binding")?;

        Ok(AstNode::AttemptRescue {
            try_block,
            error_name,
            rescue_block,
            location: loc,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::{ParseError, Parser};

    fn parse(source: &str) -> Vec<AstNode> {
        let mut parser = Parser::new(source).unwrap();
        parser.parse_program().unwrap().statements
    }

    #[test]
    fn test_if_else_chain() {
        let stmts = parse("if a { } else if b { } elif c { } else { x = 1 }");
        match &stmts[0] {
            AstNode::If { else_ifs, else_branch, .. } => {
                assert_eq!(else_ifs.len(), 2);
                assert_eq!(else_branch.as_ref().map(Vec::len), Some(1));
            }
            other => panic!("Expected if statement, got {other:?}"),
        }
    }

    #[test]
    fn test_for_requires_let_initializer() {
        let stmts = parse("for let i = 0; i < 10; i++ { print(i) }");
        match &stmts[0] {
            AstNode::For { init, increment, .. } => {
                assert!(matches!(**init, AstNode::Let { ref name, .. } if name == "i"));
                assert!(matches!(**increment, AstNode::Postfix { op: PostfixOp::Inc, .. }));
            }
            other => panic!("Expected for statement, got {other:?}"),
        }

        let mut parser = Parser::new("for i = 0; i < 3; i++ { }").unwrap();
        assert!(matches!(
            parser.parse_program(),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_let_annotations_reach_input_and_list_literal() {
        let stmts = parse("let n: float = input(\"n? \")\nlet names: StringList = @(\"a\", \"b\")");
        match &stmts[0] {
            AstNode::Let { value, .. } => match &**value {
                AstNode::Call { expected_type, .. } => {
                    assert_eq!(expected_type, &Some(TypeAnnotation::named("float")));
                }
                other => panic!("Expected call, got {other:?}"),
            },
            other => panic!("Expected let, got {other:?}"),
        }
        match &stmts[1] {
            AstNode::Let { value, .. } => {
                assert!(matches!(
                    &**value,
                    AstNode::ListLiteral { forced_hint: Some(h), .. } if h.name == "StringList"
                ));
            }
            other => panic!("Expected let, got {other:?}"),
        }
    }

    #[test]
    fn test_attempt_statement_and_load() {
        let stmts = parse("load \"math.forge\"\nattempt { risky() } rescue e { print(e) }");
        assert!(matches!(&stmts[0], AstNode::Load { path, .. } if path == "math.forge"));
        match &stmts[1] {
            AstNode::AttemptRescue { error_name, try_block, rescue_block, .. } => {
                assert_eq!(error_name, "e");
                assert_eq!(try_block.len(), 1);
                assert_eq!(rescue_block.len(), 1);
            }
            other => panic!("Expected attempt statement, got {other:?}"),
        }
    }

    #[test]
    fn test_bare_return_and_assignment_statement() {
        let stmts = parse("fn f() { return }\ncount = count + 1");
        match &stmts[0] {
            AstNode::FunctionDef { body: FunctionBody::Block(body), .. } => {
                assert!(matches!(body[0], AstNode::Return { expr: None, .. }));
            }
            other => panic!("Expected function, got {other:?}"),
        }
        assert!(matches!(stmts[1], AstNode::Assignment { .. }));
    }
}
