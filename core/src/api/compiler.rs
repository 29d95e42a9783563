//! Reference compiler from caveat source text to [`CompiledExpression`].
//!
//! Compilation parses the source and resolves every name it mentions:
//! variables must be declared parameters and calls must match a standard
//! function in both style and arity. Types are not checked here; the
//! evaluator validates operands as it goes.

use tracing::debug;

use crate::{
    api::{CompileError, CompileOptions, CompiledExpression, Diagnostic},
    evaluator::ParameterDeclarations,
    parser::{self, Reference},
    stdlib::{self, CallStyle},
};

/// Compile `source` with default options.
pub fn compile(
    name: &str,
    source: &str,
    parameters: ParameterDeclarations,
) -> Result<CompiledExpression, CompileError> {
    compile_with_options(name, source, parameters, &CompileOptions::default())
}

pub fn compile_with_options(
    name: &str,
    source: &str,
    parameters: ParameterDeclarations,
    options: &CompileOptions,
) -> Result<CompiledExpression, CompileError> {
    let parsed = parser::parse_with_max_depth(source, options.max_depth).map_err(|error| {
        CompileError::Parse {
            name: name.to_string(),
            error,
        }
    })?;

    let diagnostics: Vec<Diagnostic> = parsed
        .references
        .iter()
        .filter_map(|reference| check_reference(reference, &parameters))
        .collect();
    if !diagnostics.is_empty() {
        debug!(
            caveat = name,
            errors = diagnostics.len(),
            "caveat failed to compile"
        );
        return Err(CompileError::Invalid {
            name: name.to_string(),
            diagnostics,
        });
    }

    Ok(CompiledExpression::new(name, parsed.expr, parameters))
}

fn check_reference(reference: &Reference, parameters: &ParameterDeclarations) -> Option<Diagnostic> {
    match reference {
        Reference::Variable { name, span } => {
            if parameters.contains_key(name) {
                return None;
            }
            let help = if parameters.is_empty() {
                "this caveat declares no parameters".to_string()
            } else {
                let declared: Vec<&str> = parameters.keys().map(String::as_str).collect();
                format!("declared parameters are: {}", declared.join(", "))
            };
            Some(Diagnostic {
                message: format!("reference to undeclared parameter '{}'", name),
                span: span.clone(),
                help: Some(help),
            })
        }
        Reference::Function {
            name,
            arity,
            method,
            span,
        } => {
            let style = if *method {
                CallStyle::Method
            } else {
                CallStyle::Global
            };
            let Some(decl) = stdlib::lookup(name) else {
                return Some(Diagnostic {
                    message: format!("unknown function '{}'", name),
                    span: span.clone(),
                    help: None,
                });
            };
            match decl.arity(style) {
                Some(expected) if expected == *arity => None,
                Some(expected) => Some(Diagnostic {
                    message: format!(
                        "function '{}' expects {} argument(s), got {}",
                        name, expected, arity
                    ),
                    span: span.clone(),
                    help: None,
                }),
                None => {
                    let (wrong, help) = match style {
                        CallStyle::Global => {
                            ("a global function", format!("call it as a method: x.{}(...)", name))
                        }
                        CallStyle::Method => {
                            ("a method", format!("call it as a function: {}(...)", name))
                        }
                    };
                    Some(Diagnostic {
                        message: format!("'{}' cannot be called as {}", name, wrong),
                        span: span.clone(),
                        help: Some(help),
                    })
                }
            }
        }
    }
}
