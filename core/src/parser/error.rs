use pest::error::{Error as PestError, InputLocation};
use thiserror::Error;

use crate::parser::{Rule, Span};

/// Parser error with the location it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {}..{}", .span.0.start, .span.0.end)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// The input does not match the grammar.
    #[error("syntax error: {message}")]
    Syntax { message: String },
    /// Invalid number literal
    #[error("invalid number literal '{text}'")]
    InvalidNumber { text: String },
    /// Invalid escape sequence in a string or bytes literal.
    #[error("invalid escape sequence '{text}'")]
    InvalidEscape { text: String },
    /// Calls must name a function (`f(x)`) or a method (`x.f(y)`).
    #[error("expression is not callable")]
    NotCallable,
    /// Maximum nesting depth exceeded
    #[error("expression nesting depth exceeds maximum of {max_depth} levels")]
    MaxDepthExceeded { max_depth: usize },
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl From<PestError<Rule>> for ParseError {
    fn from(err: PestError<Rule>) -> Self {
        let span = match err.location {
            InputLocation::Pos(pos) => Span::new(pos, pos),
            InputLocation::Span((start, end)) => Span::new(start, end),
        };
        ParseError::new(
            ParseErrorKind::Syntax {
                message: err.variant.message().into_owned(),
            },
            span,
        )
    }
}
