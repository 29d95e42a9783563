//! Caveat evaluation engine.
//!
//! Caveats are boolean conditions attached to relationships in a
//! relationship-based authorization system. This crate decides whether a
//! compiled caveat holds for a possibly incomplete context. When the context
//! is missing parameters the caveat depends on, the result is a smaller
//! residual caveat over just those parameters, which can be stored and
//! evaluated again once more context is known.

extern crate alloc;

pub mod api;
pub mod evaluator;
pub mod parser;
pub mod stdlib;
pub mod types;
pub mod values;
