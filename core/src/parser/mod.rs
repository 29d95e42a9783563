mod ast;
pub mod error;
pub mod parser;
mod syntax;
mod unparse;

// Re-export the parser and rule enum for external use
pub use parser::ExpressionParser;
pub use parser::Rule;
pub use parser::{DEFAULT_MAX_DEPTH, ParsedExpr, Reference, parse, parse_with_max_depth};

pub use ast::{Expr, Literal};
pub use error::{ParseError, ParseErrorKind};
pub use syntax::{BinaryOp, BoolOp, ComparisonOp, Span, UnaryOp};
pub use unparse::UnparseError;

#[cfg(test)]
mod parse_test;
