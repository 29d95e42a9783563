use super::*;
use crate::parser::{Expr, Literal};
use pretty_assertions::assert_eq;

#[test]
fn test_kind_names() {
    assert_eq!(Value::from(true).kind(), "bool");
    assert_eq!(Value::from(1u64).kind(), "uint");
    assert_eq!(Value::list([1, 2]).kind(), "list");
    assert_eq!(Value::map([("a", 1)]).kind(), "map");
}

#[test]
fn test_to_expr_scalar() {
    assert_eq!(
        Value::from("US").to_expr(),
        Some(Expr::Literal(Literal::Str("US".to_string())))
    );
    assert_eq!(
        Value::from(-3).to_expr(),
        Some(Expr::Literal(Literal::Int(-3)))
    );
}

#[test]
fn test_to_expr_map_uses_string_keys() {
    let value = Value::map([("b", Value::from(2)), ("a", Value::from(1))]);
    // BTreeMap iteration order makes the literal deterministic.
    assert_eq!(
        value.to_expr(),
        Some(Expr::Map(vec![
            (
                Expr::Literal(Literal::Str("a".to_string())),
                Expr::Literal(Literal::Int(1))
            ),
            (
                Expr::Literal(Literal::Str("b".to_string())),
                Expr::Literal(Literal::Int(2))
            ),
        ]))
    );
}

#[test]
fn test_to_expr_non_finite_double() {
    assert_eq!(Value::Double(f64::NAN).to_expr(), None);
    assert_eq!(Value::list([Value::Double(f64::INFINITY)]).to_expr(), None);
}
