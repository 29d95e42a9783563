//! Deterministic printer turning an [`Expr`] back into source text.
//!
//! The output re-parses to an equivalent tree. Parentheses are only emitted
//! where precedence or associativity requires them.

use core::fmt::Write;

use thiserror::Error;

use crate::parser::{BinaryOp, BoolOp, Expr, Literal};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnparseError {
    #[error("double literal {0} has no source representation")]
    NonFiniteDouble(f64),
    #[error("'{0}' is not a valid identifier")]
    InvalidIdentifier(String),
}

// Precedence levels, lowest to highest. Mirrors the Pratt table in parser.rs.
const TERNARY: u8 = 0;
const OR: u8 = 1;
const AND: u8 = 2;
const RELATION: u8 = 3;
const ADDITIVE: u8 = 4;
const MULTIPLICATIVE: u8 = 5;
const UNARY: u8 = 6;
const PRIMARY: u8 = 7;

impl Expr {
    /// Render the expression as source text.
    pub fn unparse(&self) -> Result<String, UnparseError> {
        let mut unparser = Unparser { out: String::new() };
        unparser.write_expr(self, TERNARY)?;
        Ok(unparser.out)
    }
}

struct Unparser {
    out: String,
}

impl Unparser {
    fn write_expr(&mut self, expr: &Expr, min_precedence: u8) -> Result<(), UnparseError> {
        let parenthesize = precedence(expr) < min_precedence;
        if parenthesize {
            self.out.push('(');
        }
        self.write_inner(expr)?;
        if parenthesize {
            self.out.push(')');
        }
        Ok(())
    }

    fn write_inner(&mut self, expr: &Expr) -> Result<(), UnparseError> {
        match expr {
            Expr::Literal(literal) => self.write_literal(literal)?,

            Expr::Ident(name) => self.write_ident(name)?,

            Expr::Select { operand, field } => {
                self.write_expr(operand, PRIMARY)?;
                self.out.push('.');
                self.write_ident(field)?;
            }

            Expr::Index { operand, index } => {
                self.write_expr(operand, PRIMARY)?;
                self.out.push('[');
                self.write_expr(index, TERNARY)?;
                self.out.push(']');
            }

            Expr::Call {
                target,
                function,
                args,
            } => {
                if let Some(target) = target {
                    self.write_expr(target, PRIMARY)?;
                    self.out.push('.');
                }
                self.write_ident(function)?;
                self.out.push('(');
                self.write_list(args)?;
                self.out.push(')');
            }

            Expr::Unary { op, expr } => {
                self.out.push_str(op.symbol());
                self.write_expr(expr, UNARY)?;
            }

            Expr::Binary { op, left, right } => {
                let level = precedence(expr);
                self.write_expr(left, level)?;
                let _ = write!(self.out, " {} ", op);
                self.write_expr(right, level + 1)?;
            }

            Expr::Comparison { op, left, right } => {
                self.write_expr(left, RELATION)?;
                let _ = write!(self.out, " {} ", op);
                self.write_expr(right, RELATION + 1)?;
            }

            Expr::Boolean { op, left, right } => {
                let level = precedence(expr);
                self.write_expr(left, level)?;
                let _ = write!(self.out, " {} ", op);
                self.write_expr(right, level + 1)?;
            }

            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                self.write_expr(cond, OR)?;
                self.out.push_str(" ? ");
                self.write_expr(then_branch, TERNARY)?;
                self.out.push_str(" : ");
                self.write_expr(else_branch, TERNARY)?;
            }

            Expr::List(items) => {
                self.out.push('[');
                self.write_list(items)?;
                self.out.push(']');
            }

            Expr::Map(entries) => {
                self.out.push('{');
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    // A ternary key would swallow the entry's `:`.
                    self.write_expr(key, OR)?;
                    self.out.push_str(": ");
                    self.write_expr(value, TERNARY)?;
                }
                self.out.push('}');
            }
        }
        Ok(())
    }

    fn write_list(&mut self, items: &[Expr]) -> Result<(), UnparseError> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.write_expr(item, TERNARY)?;
        }
        Ok(())
    }

    fn write_ident(&mut self, name: &str) -> Result<(), UnparseError> {
        if !is_identifier(name) {
            return Err(UnparseError::InvalidIdentifier(name.to_string()));
        }
        self.out.push_str(name);
        Ok(())
    }

    fn write_literal(&mut self, literal: &Literal) -> Result<(), UnparseError> {
        match literal {
            Literal::Bool(value) => {
                let _ = write!(self.out, "{value}");
            }
            // The magnitude of i64::MIN does not fit an integer literal.
            Literal::Int(i64::MIN) => self.out.push_str("(-9223372036854775807 - 1)"),
            Literal::Int(value) => {
                let _ = write!(self.out, "{value}");
            }
            Literal::UInt(value) => {
                let _ = write!(self.out, "{value}u");
            }
            Literal::Double(value) => {
                if !value.is_finite() {
                    return Err(UnparseError::NonFiniteDouble(*value));
                }
                // Debug formatting always keeps a fractional part or an
                // exponent, so the text re-parses as a double.
                let _ = write!(self.out, "{value:?}");
            }
            Literal::Str(value) => write_quoted(&mut self.out, value),
            Literal::Bytes(bytes) => {
                self.out.push_str("b\"");
                for &byte in bytes {
                    match byte {
                        b'"' => self.out.push_str("\\\""),
                        b'\\' => self.out.push_str("\\\\"),
                        0x20..=0x7e => self.out.push(char::from(byte)),
                        _ => {
                            let _ = write!(self.out, "\\x{byte:02x}");
                        }
                    }
                }
                self.out.push('"');
            }
        }
        Ok(())
    }
}

fn write_quoted(out: &mut String, value: &str) {
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() && (c as u32) <= 0xffff => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Conditional { .. } => TERNARY,
        Expr::Boolean { op: BoolOp::Or, .. } => OR,
        Expr::Boolean { op: BoolOp::And, .. } => AND,
        Expr::Comparison { .. } => RELATION,
        Expr::Binary {
            op: BinaryOp::Add | BinaryOp::Sub,
            ..
        } => ADDITIVE,
        Expr::Binary { .. } => MULTIPLICATIVE,
        Expr::Unary { .. } => UNARY,
        // Negative literals print with a leading `-`, which parses as a prefix.
        Expr::Literal(Literal::Int(value)) if *value < 0 => UNARY,
        Expr::Literal(Literal::Double(value)) if value.is_sign_negative() => UNARY,
        _ => PRIMARY,
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !matches!(name, "true" | "false" | "in")
}
