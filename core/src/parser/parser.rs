use core::cell::{Cell, RefCell};

use lazy_static::lazy_static;
use pest::Parser;
use pest::iterators::Pair;
use pest::pratt_parser::{Assoc, Op, PrattParser};
use pest_derive::Parser;

use crate::parser::{
    BinaryOp, BoolOp, ComparisonOp, Expr, Literal, ParseError, ParseErrorKind, Span, UnaryOp,
};

/// Default limit on how deeply expressions may nest (parentheses, lists,
/// call arguments, ...).
pub const DEFAULT_MAX_DEPTH: usize = 256;

lazy_static! {
    // Note: precedence is defined lowest to highest.
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        // (lowest precedence)
        .op(Op::infix(Rule::ternary_op, Assoc::Right))   // `? :`

        // Logical operators.
        .op(Op::infix(Rule::or, Assoc::Left))            // `||`
        .op(Op::infix(Rule::and, Assoc::Left))           // `&&`

        // Relations.
        .op(
            Op::infix(Rule::eq, Assoc::Left) |
            Op::infix(Rule::ne, Assoc::Left) |
            Op::infix(Rule::lt, Assoc::Left) |
            Op::infix(Rule::le, Assoc::Left) |
            Op::infix(Rule::gt, Assoc::Left) |
            Op::infix(Rule::ge, Assoc::Left) |
            Op::infix(Rule::in_op, Assoc::Left)
        )                                                // `==`, `<`, `in`, ...

        // Arithmetic operators.
        .op(
            Op::infix(Rule::add, Assoc::Left) |
            Op::infix(Rule::sub, Assoc::Left)
        )                                                // `+`, `-`
        .op(
            Op::infix(Rule::mul, Assoc::Left) |
            Op::infix(Rule::div, Assoc::Left) |
            Op::infix(Rule::rem, Assoc::Left)
        )                                                // `*`, `/`, `%`
        .op(Op::prefix(Rule::not) | Op::prefix(Rule::neg)) // `!`, `-`

        // Postfix operators.
        .op(
            Op::postfix(Rule::call_op) |
            Op::postfix(Rule::index_op) |
            Op::postfix(Rule::field_op)
        )                                                // `()`, `[]`, `.`
        // (highest precedence)
        ;
}

#[derive(Parser)]
#[grammar = "parser/expression.pest"]
pub struct ExpressionParser;

/// A name the expression refers to, with the place it appears in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Variable {
        name: String,
        span: Span,
    },
    Function {
        name: String,
        arity: usize,
        method: bool,
        span: Span,
    },
}

impl Reference {
    pub fn span(&self) -> &Span {
        match self {
            Reference::Variable { span, .. } | Reference::Function { span, .. } => span,
        }
    }
}

/// Result of parsing: the tree plus every variable and function reference in
/// source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExpr {
    pub expr: Expr,
    pub references: Vec<Reference>,
}

pub fn parse(source: &str) -> Result<Expr, ParseError> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH).map(|parsed| parsed.expr)
}

pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<ParsedExpr, ParseError> {
    let mut pairs = ExpressionParser::parse(Rule::main, source)?;
    let pair = pairs
        .next()
        .ok_or_else(|| malformed("missing expected pair in rule", Span::new(0, source.len())))?;

    let builder = Builder {
        max_depth,
        depth: Cell::new(0),
        references: RefCell::new(Vec::new()),
    };
    let expr = builder.build(pair)?;

    let mut references = builder.references.into_inner();
    references.sort_by_key(|reference| reference.span().0.start);
    Ok(ParsedExpr { expr, references })
}

struct Builder {
    max_depth: usize,
    depth: Cell<usize>,
    references: RefCell<Vec<Reference>>,
}

impl Builder {
    fn build(&self, pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        match pair.as_rule() {
            Rule::main | Rule::grouped => self.build(first_inner(pair)?),

            Rule::expression => {
                let depth = self.depth.get() + 1;
                if depth > self.max_depth {
                    return Err(ParseError::new(
                        ParseErrorKind::MaxDepthExceeded {
                            max_depth: self.max_depth,
                        },
                        pair.as_span().into(),
                    ));
                }
                self.depth.set(depth);
                let result = self.build_expression(pair);
                self.depth.set(depth - 1);
                result
            }

            Rule::list => {
                let items = pair
                    .into_inner()
                    .map(|item| self.build(item))
                    .collect::<Result<_, _>>()?;
                Ok(Expr::List(items))
            }

            Rule::map => {
                let entries = pair
                    .into_inner()
                    .map(|entry| -> Result<(Expr, Expr), ParseError> {
                        let span: Span = entry.as_span().into();
                        let mut inner = entry.into_inner();
                        let key = inner
                            .next()
                            .ok_or_else(|| malformed("missing map key", span.clone()))?;
                        let value = inner
                            .next()
                            .ok_or_else(|| malformed("missing map value", span))?;
                        Ok((self.build(key)?, self.build(value)?))
                    })
                    .collect::<Result<_, _>>()?;
                Ok(Expr::Map(entries))
            }

            Rule::integer => {
                let value = pair.as_str().parse().map_err(|_| invalid_number(&pair))?;
                Ok(Expr::Literal(Literal::Int(value)))
            }

            Rule::uint => {
                let text = pair.as_str();
                let value = text[..text.len() - 1]
                    .parse()
                    .map_err(|_| invalid_number(&pair))?;
                Ok(Expr::Literal(Literal::UInt(value)))
            }

            Rule::float => {
                let value = pair.as_str().parse().map_err(|_| invalid_number(&pair))?;
                Ok(Expr::Literal(Literal::Double(value)))
            }

            Rule::boolean => Ok(Expr::Literal(Literal::Bool(pair.as_str() == "true"))),

            Rule::string => {
                let span: Span = pair.as_span().into();
                let raw = first_inner(pair)?;
                let mut text = String::new();
                unescape(raw.as_str(), &span, |piece| match piece {
                    Piece::Char(c) => text.push(c),
                    Piece::Byte(b) => text.push(char::from(b)),
                })?;
                Ok(Expr::Literal(Literal::Str(text)))
            }

            Rule::bytes => {
                let span: Span = pair.as_span().into();
                let raw = first_inner(pair)?;
                let mut bytes = Vec::new();
                unescape(raw.as_str(), &span, |piece| match piece {
                    Piece::Char(c) => {
                        let mut buf = [0u8; 4];
                        bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                    }
                    Piece::Byte(b) => bytes.push(b),
                })?;
                Ok(Expr::Literal(Literal::Bytes(bytes)))
            }

            Rule::ident => {
                let name = pair.as_str().to_string();
                self.references.borrow_mut().push(Reference::Variable {
                    name: name.clone(),
                    span: pair.as_span().into(),
                });
                Ok(Expr::Ident(name))
            }

            rule => Err(malformed(
                &format!("unhandled rule: {rule:?}"),
                pair.as_span().into(),
            )),
        }
    }

    fn build_expression(&self, pair: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        PRATT_PARSER
            .map_primary(|primary| self.build(primary))
            .map_prefix(|op, rhs| {
                let rhs = rhs?;
                match op.as_rule() {
                    Rule::neg => Ok(negate(rhs)),
                    Rule::not => Ok(Expr::Unary {
                        op: UnaryOp::Not,
                        expr: Box::new(rhs),
                    }),
                    rule => Err(unexpected_operator(rule, &op)),
                }
            })
            .map_postfix(|lhs, op| {
                let lhs = lhs?;
                match op.as_rule() {
                    Rule::call_op => self.build_call(lhs, op),
                    Rule::index_op => Ok(Expr::Index {
                        operand: Box::new(lhs),
                        index: Box::new(self.build(first_inner(op)?)?),
                    }),
                    Rule::field_op => Ok(Expr::Select {
                        operand: Box::new(lhs),
                        field: first_inner(op)?.as_str().to_string(),
                    }),
                    rule => Err(unexpected_operator(rule, &op)),
                }
            })
            .map_infix(|lhs, op, rhs| {
                let (left, right) = (Box::new(lhs?), Box::new(rhs?));
                let expr = match op.as_rule() {
                    Rule::ternary_op => Expr::Conditional {
                        cond: left,
                        then_branch: Box::new(self.build(first_inner(op)?)?),
                        else_branch: right,
                    },
                    Rule::or => Expr::Boolean {
                        op: BoolOp::Or,
                        left,
                        right,
                    },
                    Rule::and => Expr::Boolean {
                        op: BoolOp::And,
                        left,
                        right,
                    },
                    rule => {
                        if let Some(op) = comparison_op(rule) {
                            Expr::Comparison { op, left, right }
                        } else if let Some(op) = binary_op(rule) {
                            Expr::Binary { op, left, right }
                        } else {
                            return Err(unexpected_operator(rule, &op));
                        }
                    }
                };
                Ok(expr)
            })
            .parse(pair.into_inner())
    }

    fn build_call(&self, callee: Expr, op: Pair<'_, Rule>) -> Result<Expr, ParseError> {
        let call_span: Span = op.as_span().into();
        let (target, function, span) = match callee {
            Expr::Ident(name) => {
                // The callee was recorded as a variable when it was built as a
                // primary; it names a function instead.
                let mut references = self.references.borrow_mut();
                let span = match references.last() {
                    Some(Reference::Variable { name: last, span }) if *last == name => {
                        let span = span.clone();
                        references.pop();
                        span
                    }
                    _ => call_span.clone(),
                };
                (None, name, span)
            }
            Expr::Select { operand, field } => (Some(operand), field, call_span.clone()),
            _ => return Err(ParseError::new(ParseErrorKind::NotCallable, call_span)),
        };

        let args: Vec<Expr> = op
            .into_inner()
            .map(|arg| self.build(arg))
            .collect::<Result<_, _>>()?;

        self.references.borrow_mut().push(Reference::Function {
            name: function.clone(),
            arity: args.len(),
            method: target.is_some(),
            span: Span::combine(&span, &call_span),
        });

        Ok(Expr::Call {
            target,
            function,
            args,
        })
    }
}

fn comparison_op(rule: Rule) -> Option<ComparisonOp> {
    Some(match rule {
        Rule::eq => ComparisonOp::Eq,
        Rule::ne => ComparisonOp::Neq,
        Rule::lt => ComparisonOp::Lt,
        Rule::le => ComparisonOp::Le,
        Rule::gt => ComparisonOp::Gt,
        Rule::ge => ComparisonOp::Ge,
        Rule::in_op => ComparisonOp::In,
        _ => return None,
    })
}

fn binary_op(rule: Rule) -> Option<BinaryOp> {
    Some(match rule {
        Rule::add => BinaryOp::Add,
        Rule::sub => BinaryOp::Sub,
        Rule::mul => BinaryOp::Mul,
        Rule::div => BinaryOp::Div,
        Rule::rem => BinaryOp::Rem,
        _ => return None,
    })
}

/// Negative numeric literals are folded so that `-5` parses to the literal
/// `-5` rather than a negation of `5`.
fn negate(expr: Expr) -> Expr {
    match expr {
        Expr::Literal(Literal::Int(value)) if value != i64::MIN => {
            Expr::Literal(Literal::Int(-value))
        }
        Expr::Literal(Literal::Double(value)) => Expr::Literal(Literal::Double(-value)),
        expr => Expr::Unary {
            op: UnaryOp::Neg,
            expr: Box::new(expr),
        },
    }
}

enum Piece {
    Char(char),
    Byte(u8),
}

fn unescape(raw: &str, span: &Span, mut push: impl FnMut(Piece)) -> Result<(), ParseError> {
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            push(Piece::Char(c));
            continue;
        }
        let piece = match chars.next() {
            Some('n') => Piece::Char('\n'),
            Some('r') => Piece::Char('\r'),
            Some('t') => Piece::Char('\t'),
            Some('0') => Piece::Char('\0'),
            Some(c @ ('"' | '\'' | '\\')) => Piece::Char(c),
            Some('x') => {
                let digits: String = chars.by_ref().take(2).collect();
                let byte = u8::from_str_radix(&digits, 16)
                    .map_err(|_| invalid_escape(&format!("x{digits}"), span))?;
                Piece::Byte(byte)
            }
            Some('u') => {
                let digits: String = chars.by_ref().take(4).collect();
                let c = u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| invalid_escape(&format!("u{digits}"), span))?;
                Piece::Char(c)
            }
            other => {
                let text = other.map(String::from).unwrap_or_default();
                return Err(invalid_escape(&text, span));
            }
        };
        push(piece);
    }
    Ok(())
}

fn first_inner(pair: Pair<'_, Rule>) -> Result<Pair<'_, Rule>, ParseError> {
    let span: Span = pair.as_span().into();
    pair.into_inner()
        .next()
        .ok_or_else(|| malformed("missing expected pair in rule", span))
}

fn malformed(message: &str, span: Span) -> ParseError {
    ParseError::new(
        ParseErrorKind::Syntax {
            message: message.to_string(),
        },
        span,
    )
}

fn unexpected_operator(rule: Rule, op: &Pair<'_, Rule>) -> ParseError {
    malformed(&format!("unknown operator: {rule:?}"), op.as_span().into())
}

fn invalid_number(pair: &Pair<'_, Rule>) -> ParseError {
    ParseError::new(
        ParseErrorKind::InvalidNumber {
            text: pair.as_str().to_string(),
        },
        pair.as_span().into(),
    )
}

fn invalid_escape(text: &str, span: &Span) -> ParseError {
    ParseError::new(
        ParseErrorKind::InvalidEscape {
            text: format!("\\{text}"),
        },
        span.clone(),
    )
}
