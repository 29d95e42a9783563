use crate::parser::{
    BinaryOp, BoolOp, ComparisonOp, Expr, Literal, ParseErrorKind, Reference, Span, UnaryOp,
    parse, parse_with_max_depth,
};
use pretty_assertions::assert_eq;

fn lit(literal: Literal) -> Expr {
    Expr::Literal(literal)
}

fn boxed(expr: Expr) -> Box<Expr> {
    Box::new(expr)
}

#[test]
fn test_literals() {
    assert_eq!(parse("42"), Ok(lit(Literal::Int(42))));
    assert_eq!(parse("42u"), Ok(lit(Literal::UInt(42))));
    assert_eq!(parse("1.5"), Ok(lit(Literal::Double(1.5))));
    assert_eq!(parse("1e3"), Ok(lit(Literal::Double(1000.0))));
    assert_eq!(parse("true"), Ok(lit(Literal::Bool(true))));
    assert_eq!(parse("-7"), Ok(lit(Literal::Int(-7))));
    assert_eq!(parse("-2.5"), Ok(lit(Literal::Double(-2.5))));
}

#[test]
fn test_string_literals() {
    assert_eq!(parse(r#""US""#), Ok(lit(Literal::Str("US".to_string()))));
    assert_eq!(parse("'it'"), Ok(lit(Literal::Str("it".to_string()))));
    assert_eq!(
        parse(r#""a\"b\né""#),
        Ok(lit(Literal::Str("a\"b\né".to_string())))
    );
    assert_eq!(
        parse(r#"b"\xff\x00a""#),
        Ok(lit(Literal::Bytes(vec![0xff, 0x00, b'a'])))
    );
}

#[test]
fn test_invalid_escape() {
    let err = parse(r#""\u12""#).unwrap_err();
    assert!(
        matches!(err.kind, ParseErrorKind::Syntax { .. } | ParseErrorKind::InvalidEscape { .. }),
        "unexpected error: {err}"
    );
    let err = parse(r#""\ud800""#).unwrap_err();
    assert_eq!(
        err.kind,
        ParseErrorKind::InvalidEscape {
            text: "\\ud800".to_string(),
        }
    );
}

#[test]
fn test_identifiers_and_keywords() {
    assert_eq!(parse("trueish"), Ok(Expr::ident("trueish")));
    assert_eq!(parse("_x1"), Ok(Expr::ident("_x1")));
    assert_eq!(
        parse("index in items"),
        Ok(Expr::Comparison {
            op: ComparisonOp::In,
            left: boxed(Expr::ident("index")),
            right: boxed(Expr::ident("items")),
        })
    );
    assert!(parse("in").is_err());
}

#[test]
fn test_operators() {
    assert_eq!(
        parse("age >= 18 && !banned"),
        Ok(Expr::Boolean {
            op: BoolOp::And,
            left: boxed(Expr::Comparison {
                op: ComparisonOp::Ge,
                left: boxed(Expr::ident("age")),
                right: boxed(lit(Literal::Int(18))),
            }),
            right: boxed(Expr::Unary {
                op: UnaryOp::Not,
                expr: boxed(Expr::ident("banned")),
            }),
        })
    );
    assert_eq!(
        parse("a % 2"),
        Ok(Expr::Binary {
            op: BinaryOp::Rem,
            left: boxed(Expr::ident("a")),
            right: boxed(lit(Literal::Int(2))),
        })
    );
}

#[test]
fn test_collections() {
    assert_eq!(
        parse("[1, 'a',]"),
        Ok(Expr::List(vec![
            lit(Literal::Int(1)),
            lit(Literal::Str("a".to_string())),
        ]))
    );
    assert_eq!(
        parse(r#"{"daily": limit, "weekly": 7}"#),
        Ok(Expr::Map(vec![
            (lit(Literal::Str("daily".to_string())), Expr::ident("limit")),
            (lit(Literal::Str("weekly".to_string())), lit(Literal::Int(7))),
        ]))
    );
    assert_eq!(parse("[]"), Ok(Expr::List(vec![])));
    assert_eq!(parse("{}"), Ok(Expr::Map(vec![])));
}

#[test]
fn test_access_and_calls() {
    assert_eq!(
        parse("request.headers['x-id']"),
        Ok(Expr::Index {
            operand: boxed(Expr::Select {
                operand: boxed(Expr::ident("request")),
                field: "headers".to_string(),
            }),
            index: boxed(lit(Literal::Str("x-id".to_string()))),
        })
    );
    assert_eq!(
        parse("size(roles)"),
        Ok(Expr::Call {
            target: None,
            function: "size".to_string(),
            args: vec![Expr::ident("roles")],
        })
    );
    assert_eq!(
        parse("email.endsWith('@example.com')"),
        Ok(Expr::Call {
            target: Some(boxed(Expr::ident("email"))),
            function: "endsWith".to_string(),
            args: vec![lit(Literal::Str("@example.com".to_string()))],
        })
    );
}

#[test]
fn test_conditional() {
    assert_eq!(
        parse("vip ? 0 : fee"),
        Ok(Expr::Conditional {
            cond: boxed(Expr::ident("vip")),
            then_branch: boxed(lit(Literal::Int(0))),
            else_branch: boxed(Expr::ident("fee")),
        })
    );
}

#[test]
fn test_comments_and_whitespace() {
    assert_eq!(
        parse("a // first operand\n  || b"),
        Ok(Expr::Boolean {
            op: BoolOp::Or,
            left: boxed(Expr::ident("a")),
            right: boxed(Expr::ident("b")),
        })
    );
}

#[test]
fn test_not_callable() {
    let err = parse("[1](2)").unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::NotCallable);
}

#[test]
fn test_syntax_errors() {
    for source in ["", "a +", "(a", "a b", "1 +* 2", "{'a' 1}"] {
        let err = parse(source).unwrap_err();
        assert!(
            matches!(err.kind, ParseErrorKind::Syntax { .. }),
            "expected syntax error for {source:?}, got {err}"
        );
    }
}

#[test]
fn test_integer_out_of_range() {
    let err = parse("99999999999999999999").unwrap_err();
    assert_eq!(
        err.kind,
        ParseErrorKind::InvalidNumber {
            text: "99999999999999999999".to_string(),
        }
    );
    assert_eq!(err.span, Span::new(0, 20));
}

#[test]
fn test_max_depth() {
    let source = format!("{}x{}", "(".repeat(20), ")".repeat(20));
    assert!(parse_with_max_depth(&source, 64).is_ok());
    let err = parse_with_max_depth(&source, 8).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::MaxDepthExceeded { max_depth: 8 });
}

#[test]
fn test_references_in_source_order() {
    let parsed = parse_with_max_depth("size(roles) > limit && user.name.startsWith(p)", 64)
        .expect("parses");
    assert_eq!(
        parsed.references,
        vec![
            Reference::Function {
                name: "size".to_string(),
                arity: 1,
                method: false,
                span: Span::new(0, 11),
            },
            Reference::Variable {
                name: "roles".to_string(),
                span: Span::new(5, 10),
            },
            Reference::Variable {
                name: "limit".to_string(),
                span: Span::new(14, 19),
            },
            Reference::Variable {
                name: "user".to_string(),
                span: Span::new(23, 27),
            },
            Reference::Function {
                name: "startsWith".to_string(),
                arity: 1,
                method: true,
                span: Span::new(43, 46),
            },
            Reference::Variable {
                name: "p".to_string(),
                span: Span::new(44, 45),
            },
        ]
    );
}
