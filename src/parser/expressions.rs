//! Expression parsing implementation
//!
//! This module handles parsing of Forge expressions using precedence climbing
//! for binary operators and recursive descent for other expression forms.
//!
//! # Supported Expressions
//!
//! - Literals: integers, floats, strings, `true`/`false`, `null`
//! - Identifiers (type names such as `int` are identifiers in expression position)
//! - Binary operators: arithmetic, `^` exponentiation, comparison, logical
//! - Unary operators: `-`, `!`, `&`, and `attempt expr rescue expr`
//! - Postfix: `[]`, `.name`, `()`, `++`, `--`
//! - List literals `@(a, b)` and array literals `[a, b]`
//! - Special forms: `extern("name", types...) -> type`, `read(path)`,
//!   `write(path, content[, spacing])`, `addto(path, content[, spacing])`
//!
//! # Precedence
//!
//! From loosest to tightest: assignment (right-associative), `||`, `&&`,
//! equality, relational, `+ - ^`, `* / %`, unary, postfix. Binary levels are
//! driven by [`BinOp::precedence`]; the right operand is parsed at one level
//! above the operator so equal-precedence chains associate to the left.
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::parser::ast::*;
use crate::parser::lexer::Token;
use crate::parser::parse::{ParseError, Parser};

/// Name bound to the error message by the expression form of `attempt`.
pub const ATTEMPT_EXPR_ERROR_NAME: &str = "err";

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        self.parse_assignment()
    }

    /// Parse assignment (right-associative)
    fn parse_assignment(&mut self) -> Result<AstNode, ParseError> {
        let expr = self.parse_binary(0)?;

        let loc = self.current_location();
        if self.match_token(&Token::Eq(loc)) {
            if !matches!(
                expr,
                AstNode::Identifier(..) | AstNode::MemberAccess { .. } | AstNode::PropertyAccess { .. }
            ) {
                return Err(ParseError::Invalid {
                    message: "invalid assignment target".to_string(),
                    location: *expr.location(),
                });
            }
            let value = Box::new(self.parse_assignment()?);
            return Ok(AstNode::Assignment {
                target: Box::new(expr),
                value,
                location: loc,
            });
        }

        Ok(expr)
    }

    /// Binary operator at the current position, if any
    fn peek_binary_op(&self) -> Option<BinOp> {
        let op = match self.peek() {
            Token::OrOr(_) => BinOp::Or,
            Token::AndAnd(_) => BinOp::And,
            Token::EqEq(_) => BinOp::Eq,
            Token::NotEq(_) => BinOp::Ne,
            Token::Lt(_) => BinOp::Lt,
            Token::Le(_) => BinOp::Le,
            Token::Gt(_) => BinOp::Gt,
            Token::Ge(_) => BinOp::Ge,
            Token::Plus(_) => BinOp::Add,
            Token::Minus(_) => BinOp::Sub,
            Token::Caret(_) => BinOp::Pow,
            Token::Star(_) => BinOp::Mul,
            Token::Slash(_) => BinOp::Div,
            Token::Percent(_) => BinOp::Mod,
            _ => return None,
        };
        Some(op)
    }

    /// Precedence climbing over all binary levels
    pub(crate) fn parse_binary(&mut self, min_precedence: u8) -> Result<AstNode, ParseError> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.peek_binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            let loc = self.current_location();
            self.advance();

            let right = self.parse_binary(precedence + 1)?;
            left = AstNode::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                location: loc,
            };
        }

        Ok(left)
    }

    /// Parse unary (! - & attempt)
    fn parse_unary(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        let op = if self.match_token(&Token::Bang(loc)) {
            Some(UnOp::Not)
        } else if self.match_token(&Token::Minus(loc)) {
            Some(UnOp::Neg)
        } else if self.match_token(&Token::Amp(loc)) {
            Some(UnOp::AddrOf)
        } else {
            None
        };

        if let Some(op) = op {
            let operand = Box::new(self.parse_unary()?);
            return Ok(AstNode::Unary {
                op,
                operand,
                location: loc,
            });
        }

        if self.match_token(&Token::Attempt(loc)) {
            let id = self.fresh_node_id();
            let try_expr = Box::new(self.parse_unary()?);
            self.expect_token(&Token::Rescue(self.current_location()), "'rescue' in attempt expression")?;
            let rescue_expr = Box::new(self.parse_unary()?);
            return Ok(AstNode::AttemptExpr {
                id,
                try_expr,
                error_name: ATTEMPT_EXPR_ERROR_NAME.to_string(),
                rescue_expr,
                location: loc,
            });
        }

        self.parse_postfix()
    }

    /// Parse postfix (++ -- [] . ())
    fn parse_postfix(&mut self) -> Result<AstNode, ParseError> {
        let mut expr = self.parse_primary()?;

        loop {
            let loc = self.current_location();

            if self.match_token(&Token::PlusPlus(loc)) {
                expr = AstNode::Postfix {
                    op: PostfixOp::Inc,
                    operand: Box::new(expr),
                    location: loc,
                };
            } else if self.match_token(&Token::MinusMinus(loc)) {
                expr = AstNode::Postfix {
                    op: PostfixOp::Dec,
                    operand: Box::new(expr),
                    location: loc,
                };
            } else if self.match_token(&Token::LBracket(loc)) {
                let index = Box::new(self.parse_expression()?);
                self.expect_token(&Token::RBracket(self.current_location()), "']' after index")?;
                expr = AstNode::Subscript {
                    target: Box::new(expr),
                    index,
                    location: loc,
                };
            } else if self.match_token(&Token::Dot(loc)) {
                let name = self.expect_identifier()?;
                expr = if matches!(expr, AstNode::Identifier(..)) {
                    AstNode::PropertyAccess {
                        object: Box::new(expr),
                        property: name,
                        location: loc,
                    }
                } else {
                    AstNode::MemberAccess {
                        object: Box::new(expr),
                        member: name,
                        location: loc,
                    }
                };
            } else if self.match_token(&Token::LParen(loc)) {
                let args = self.parse_argument_list()?;
                self.expect_rparen("after call arguments")?;

                expr = match expr {
                    AstNode::Identifier(name, ident_loc) if self.struct_names.contains(&name) => {
                        AstNode::StructInstance {
                            name,
                            args,
                            location: ident_loc,
                        }
                    }
                    callee => AstNode::Call {
                        callee: Box::new(callee),
                        args,
                        expected_type: None,
                        location: loc,
                    },
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse comma-separated arguments up to (not including) the closing ')'
    fn parse_argument_list(&mut self) -> Result<Vec<AstNode>, ParseError> {
        let mut args = Vec::new();

        if self.check(&Token::RParen(self.current_location())) {
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);

            if !self.match_token(&Token::Comma(self.current_location())) {
                break;
            }
        }

        Ok(args)
    }

    /// Parse primary (literals, identifiers, groupings, special forms)
    fn parse_primary(&mut self) -> Result<AstNode, ParseError> {
        let loc = self.current_location();

        match self.peek_token() {
            Token::IntLiteral(n, loc) => {
                self.advance();
                Ok(AstNode::IntLiteral(n, loc))
            }
            Token::FloatLiteral(n, loc) => {
                self.advance();
                Ok(AstNode::FloatLiteral(n, loc))
            }
            Token::StringLiteral(s, loc) => {
                self.advance();
                Ok(AstNode::StringLiteral(s, loc))
            }
            Token::True(loc) => {
                self.advance();
                Ok(AstNode::BoolLiteral(true, loc))
            }
            Token::False(loc) => {
                self.advance();
                Ok(AstNode::BoolLiteral(false, loc))
            }
            Token::Null(location) => {
                self.advance();
                Ok(AstNode::Null { location })
            }
            Token::Ident(name, loc) => {
                let is_extern = name == "extern"
                    && self
                        .peek_ahead(1)
                        .is_some_and(|t| matches!(t, Token::LParen(_)));
                self.advance();
                if is_extern {
                    self.parse_extern(loc)
                } else {
                    Ok(AstNode::Identifier(name, loc))
                }
            }
            // `int(x)`, `float(x)` and friends are ordinary calls
            Token::TypeName(name, loc) => {
                self.advance();
                Ok(AstNode::Identifier(name, loc))
            }
            Token::Read(_) => {
                self.advance();
                self.expect_lparen("after 'read'")?;
                let path = self.parse_expression()?;
                self.expect_rparen("after read path")?;
                Ok(builtin_call("read", vec![path], loc))
            }
            Token::Write(_) => {
                self.advance();
                self.parse_file_output("write", loc)
            }
            Token::Addto(_) => {
                self.advance();
                self.parse_file_output("addto", loc)
            }
            Token::At(_) => {
                self.advance();
                self.expect_lparen("after '@' in list literal")?;
                let elements = self.parse_argument_list()?;
                self.expect_rparen("to close list literal")?;
                Ok(AstNode::ListLiteral {
                    elements,
                    forced_hint: None,
                    location: loc,
                })
            }
            Token::LBracket(_) => {
                self.advance();
                let mut elements = Vec::new();
                while !self.check(&Token::RBracket(self.current_location())) {
                    elements.push(self.parse_expression()?);
                    if !self.match_token(&Token::Comma(self.current_location())) {
                        break;
                    }
                }
                self.expect_token(&Token::RBracket(self.current_location()), "']' to close array literal")?;
                Ok(AstNode::ArrayLiteral {
                    elements,
                    location: loc,
                })
            }
            Token::LParen(_) => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect_rparen("after expression")?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `extern("name", type, ...) [-> type]`; `extern` is already consumed.
    fn parse_extern(&mut self, loc: SourceLocation) -> Result<AstNode, ParseError> {
        self.expect_lparen("after 'extern'")?;
        let name = self.expect_string("naming the external function")?;

        let mut param_types = Vec::new();
        while self.match_token(&Token::Comma(self.current_location())) {
            param_types.push(self.parse_type()?);
        }
        self.expect_rparen("after extern parameter types")?;

        let return_type = if self.match_token(&Token::Arrow(self.current_location())) {
            Some(self.parse_type()?)
        } else {
            None
        };

        Ok(AstNode::Extern {
            name,
            param_types,
            return_type,
            location: loc,
        })
    }

    /// `write(path, content[, spacing])` and `addto(...)` desugar to calls
    /// whose spacing argument defaults to `0`.
    fn parse_file_output(&mut self, name: &str, loc: SourceLocation) -> Result<AstNode, ParseError> {
        self.expect_lparen(&format!("after '{name}'"))?;
        let path = self.parse_expression()?;
        self.expect_token(&Token::Comma(self.current_location()), "',' after file path")?;
        let content = self.parse_expression()?;
        let spacing = if self.match_token(&Token::Comma(self.current_location())) {
            self.parse_expression()?
        } else {
            AstNode::IntLiteral(0, loc)
        };
        self.expect_rparen(&format!("after {name} arguments"))?;
        Ok(builtin_call(name, vec![path, content, spacing], loc))
    }
}

fn builtin_call(name: &str, args: Vec<AstNode>, loc: SourceLocation) -> AstNode {
    AstNode::Call {
        callee: Box::new(AstNode::Identifier(name.to_string(), loc)),
        args,
        expected_type: None,
        location: loc,
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;
    use crate::parser::parse::{ParseError, Parser};

    fn expr(source: &str) -> AstNode {
        let mut parser = Parser::new(source).unwrap();
        match parser.parse_program().unwrap().statements.remove(0) {
            AstNode::ExpressionStatement { expr, .. } => *expr,
            other => other,
        }
    }

    #[test]
    fn test_precedence_mul_binds_tighter() {
        match expr("1 + 2 * 3") {
            AstNode::Binary { op: BinOp::Add, left, right, .. } => {
                assert!(matches!(*left, AstNode::IntLiteral(1, _)));
                assert!(matches!(*right, AstNode::Binary { op: BinOp::Mul, .. }));
            }
            other => panic!("Expected addition at the root, got {other:?}"),
        }
    }

    #[test]
    fn test_equal_precedence_is_left_associative() {
        match expr("10 - 4 - 3") {
            AstNode::Binary { op: BinOp::Sub, left, right, .. } => {
                assert!(matches!(*left, AstNode::Binary { op: BinOp::Sub, .. }));
                assert!(matches!(*right, AstNode::IntLiteral(3, _)));
            }
            other => panic!("Expected subtraction at the root, got {other:?}"),
        }
    }

    #[test]
    fn test_logical_binds_loosest() {
        match expr("a < 1 || b == 2 && c") {
            AstNode::Binary { op: BinOp::Or, right, .. } => {
                assert!(matches!(*right, AstNode::Binary { op: BinOp::And, .. }));
            }
            other => panic!("Expected '||' at the root, got {other:?}"),
        }
    }

    #[test]
    fn test_assignment_is_right_associative() {
        match expr("a = b = 3") {
            AstNode::Assignment { target, value, .. } => {
                assert_eq!(target.as_identifier(), Some("a"));
                assert!(matches!(*value, AstNode::Assignment { .. }));
            }
            other => panic!("Expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_assignment_target() {
        let mut parser = Parser::new("f() = 3").unwrap();
        assert!(matches!(parser.parse_program(), Err(ParseError::Invalid { .. })));
    }

    #[test]
    fn test_postfix_chain() {
        match expr("p.items[0].name") {
            AstNode::MemberAccess { object, member, .. } => {
                assert_eq!(member, "name");
                match *object {
                    AstNode::Subscript { target, .. } => {
                        assert!(matches!(*target, AstNode::PropertyAccess { ref property, .. } if property == "items"));
                    }
                    other => panic!("Expected subscript, got {other:?}"),
                }
            }
            other => panic!("Expected member access, got {other:?}"),
        }
    }

    #[test]
    fn test_struct_call_becomes_instance() {
        let mut parser = Parser::new("struct P { x: int, y: int }\nlet p = P(1, 2)").unwrap();
        let program = parser.parse_program().unwrap();
        match &program.statements[1] {
            AstNode::Let { value, .. } => {
                assert!(matches!(&**value, AstNode::StructInstance { name, args, .. } if name == "P" && args.len() == 2));
            }
            other => panic!("Expected let, got {other:?}"),
        }
    }

    #[test]
    fn test_attempt_expression_gets_unique_ids() {
        let mut parser = Parser::new("let a = attempt f() rescue 0\nlet b = attempt g() rescue 1").unwrap();
        let program = parser.parse_program().unwrap();
        let ids: Vec<NodeId> = program
            .statements
            .iter()
            .filter_map(|stmt| match stmt {
                AstNode::Let { value, .. } => match &**value {
                    AstNode::AttemptExpr { id, error_name, .. } => {
                        assert_eq!(error_name, "err");
                        Some(*id)
                    }
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_extern_special_form() {
        match expr("extern(\"socket\", int, int, int) -> int") {
            AstNode::Extern { name, param_types, return_type, .. } => {
                assert_eq!(name, "socket");
                assert_eq!(param_types.len(), 3);
                assert_eq!(return_type, Some(TypeAnnotation::named("int")));
            }
            other => panic!("Expected extern, got {other:?}"),
        }
    }

    #[test]
    fn test_write_desugars_with_default_spacing() {
        match expr("write(\"out.txt\", \"hi\")") {
            AstNode::Call { callee, args, .. } => {
                assert_eq!(callee.as_identifier(), Some("write"));
                assert_eq!(args.len(), 3);
                assert!(matches!(args[2], AstNode::IntLiteral(0, _)));
            }
            other => panic!("Expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_list_and_array_literals() {
        assert!(matches!(expr("@(1, 2, 3)"), AstNode::ListLiteral { ref elements, .. } if elements.len() == 3));
        assert!(matches!(expr("[1, 2]"), AstNode::ArrayLiteral { ref elements, .. } if elements.len() == 2));
        assert!(matches!(expr("[]"), AstNode::ArrayLiteral { ref elements, .. } if elements.is_empty()));
    }

    #[test]
    fn test_type_name_call() {
        match expr("int(\"42\")") {
            AstNode::Call { callee, .. } => assert_eq!(callee.as_identifier(), Some("int")),
            other => panic!("Expected call, got {other:?}"),
        }
    }
}
