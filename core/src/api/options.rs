//! Configuration options for compiling and evaluating caveats.

use crate::parser::DEFAULT_MAX_DEPTH;

/// Configuration options for compilation.
///
/// # Example
///
/// ```
/// use caveats_core::api::CompileOptions;
///
/// let options = CompileOptions {
///     max_depth: 64,
///     ..CompileOptions::default()
/// };
/// assert_eq!(options.max_depth, 64);
/// ```
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Maximum nesting depth accepted by the parser.
    ///
    /// Default: 256
    pub max_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// What to do when an expression is undecided but no unbound parameter can
/// be blamed for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnattributedPartial {
    /// Return a partial result with an empty list of missing names.
    #[default]
    Allow,
    /// Fail the evaluation with an internal error.
    Reject,
}

/// Configuration options for caveat evaluation.
///
/// These options control resource limits during evaluation.
///
/// # Example
///
/// ```
/// use caveats_core::api::EvaluationConfig;
///
/// let config = EvaluationConfig {
///     max_cost: Some(100),
///     ..EvaluationConfig::default()
/// };
/// assert_eq!(config.max_depth, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationConfig {
    /// Maximum number of cost units a single evaluation may consume.
    ///
    /// `None` and `Some(0)` both mean unbounded.
    ///
    /// Default: None
    pub max_cost: Option<u64>,

    /// Maximum evaluation stack depth (for recursion protection).
    ///
    /// Default: 1000
    pub max_depth: usize,

    /// Default: [`UnattributedPartial::Allow`]
    pub unattributed_partial: UnattributedPartial,
}

impl EvaluationConfig {
    pub fn with_max_cost(max_cost: u64) -> Self {
        Self {
            max_cost: Some(max_cost),
            ..Self::default()
        }
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_cost: None,
            max_depth: 1000,
            unattributed_partial: UnattributedPartial::default(),
        }
    }
}
