// Parser tests through the public API

use forgec::parser::ast::{BinOp, FunctionBody};
use forgec::parser::{lexer, parse_source, parse_tokens, AstNode, ParseError};

fn expression(source: &str) -> AstNode {
    let program = parse_source(source).expect("Parsing failed");
    match program.statements.into_iter().next() {
        Some(AstNode::ExpressionStatement { expr, .. }) => *expr,
        other => panic!("Expected expression statement, got {other:?}"),
    }
}

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    match expression("1 + 2 * 3") {
        AstNode::Binary {
            op: BinOp::Add,
            left,
            right,
            ..
        } => {
            assert!(matches!(*left, AstNode::IntLiteral(1, _)));
            assert!(matches!(*right, AstNode::Binary { op: BinOp::Mul, .. }));
        }
        other => panic!("Expected addition at the root, got {other:?}"),
    }
}

#[test]
fn test_power_shares_additive_level() {
    // `^` sits with `+` and `-`, so `2 ^ 3 * 4` is `2 ^ (3 * 4)`
    match expression("2 ^ 3 * 4") {
        AstNode::Binary { op, right, .. } => {
            assert_eq!(op, BinOp::Pow);
            assert!(matches!(*right, AstNode::Binary { op: BinOp::Mul, .. }));
        }
        other => panic!("Expected power at the root, got {other:?}"),
    }
}

#[test]
fn test_program_with_every_declaration_kind() {
    let source = r#"
        load "util.forge"
        struct Point { x: int, y: int }
        fn dist(p: &Point) -> float => p.x * 1.0
        let p = Point(1, 2)
        for let i = 0; i < 3; i++ {
            if i == 1 { continue } elif i == 2 { break }
        }
        attempt { dist(&p) } rescue e { print(e) }
    "#;
    let program = parse_source(source).expect("Parsing failed");

    assert!(matches!(program.statements[0], AstNode::Load { .. }));
    assert!(matches!(program.statements[1], AstNode::StructDef { .. }));
    assert!(matches!(program.statements[4], AstNode::For { .. }));
    assert!(matches!(program.statements[5], AstNode::AttemptRescue { .. }));

    let functions: Vec<_> = program.functions().collect();
    assert_eq!(functions.len(), 1);
    match functions[0] {
        AstNode::FunctionDef {
            return_type, body, ..
        } => {
            assert_eq!(return_type.as_ref().map(|t| t.name.as_str()), Some("float"));
            assert!(matches!(body, FunctionBody::Expr(_)));
        }
        other => panic!("Expected function, got {other:?}"),
    }
}

#[test]
fn test_syntax_error_aborts_whole_parse() {
    let err = parse_source("let x = 1\nlet = 2\nlet y = 3").unwrap_err();
    match err {
        ParseError::UnexpectedToken {
            expected, location, ..
        } => {
            assert!(expected.contains("identifier"), "{expected}");
            assert_eq!(location.line, 2);
        }
        other => panic!("Expected unexpected token, got {other:?}"),
    }
}

#[test]
fn test_lex_error_surfaces_as_parse_error() {
    assert!(matches!(parse_source("let s = \"open"), Err(ParseError::Lex(_))));
}

#[test]
fn test_parse_from_token_stream() {
    let tokens = lexer::tokenize("let total = 1 + 2").expect("Tokenizing failed");
    let program = parse_tokens(tokens).expect("Parsing failed");
    assert!(matches!(
        &program.statements[0],
        AstNode::Let { name, type_hint: None, .. } if name == "total"
    ));
}
