//! Unit tests for the evaluator.

use std::sync::Arc;

use super::*;
use crate::{
    api::{CompiledExpression, EvaluationConfig, UnattributedPartial, compile},
    parser::parse,
    test_utils::init_test_logging,
    types::Type,
    values::Value,
};
use pretty_assertions::assert_eq;

struct Runner {
    parameters: ParameterDeclarations,
}

impl Runner {
    fn new(parameters: &[(&str, Type)]) -> Self {
        Self {
            parameters: parameters
                .iter()
                .map(|(name, ty)| (name.to_string(), ty.clone()))
                .collect(),
        }
    }

    fn compile(&self, source: &str) -> Arc<CompiledExpression> {
        let expr = compile("test", source, self.parameters.clone())
            .unwrap_or_else(|e| panic!("compilation failed: {}\n{}", source, e));
        Arc::new(expr)
    }

    fn run(
        &self,
        source: &str,
        context: &[(&str, Value)],
    ) -> Result<CaveatResult, EvaluationError> {
        self.run_with_config(source, context, &EvaluationConfig::default())
    }

    fn run_with_config(
        &self,
        source: &str,
        context: &[(&str, Value)],
        config: &EvaluationConfig,
    ) -> Result<CaveatResult, EvaluationError> {
        evaluate_caveat_with_config(&self.compile(source), ctx(context), config)
    }

    fn decide(&self, source: &str, context: &[(&str, Value)]) -> bool {
        let result = self
            .run(source, context)
            .unwrap_or_else(|e| panic!("evaluation failed: {}\n{}", source, e));
        assert!(!result.is_partial(), "expected a decision for {}", source);
        result.value()
    }

    /// Evaluate expecting a partial result; returns the residual source and
    /// the missing names.
    fn residual(&self, source: &str, context: &[(&str, Value)]) -> (String, Vec<String>) {
        let result = self
            .run(source, context)
            .unwrap_or_else(|e| panic!("evaluation failed: {}\n{}", source, e));
        let residual = result
            .partial_value()
            .unwrap_or_else(|_| panic!("expected a partial result for {}", source));
        (
            residual.unparse().expect("residual unparses"),
            result.missing_var_names().expect("partial").to_vec(),
        )
    }
}

fn ctx(entries: &[(&str, Value)]) -> ContextValues {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn adult_in_us() -> Runner {
    Runner::new(&[("age", Type::Int), ("country", Type::String)])
}

const ADULT_IN_US: &str = r#"age >= 18 && country == "US""#;

#[test]
fn test_fully_bound_decides() {
    init_test_logging();
    let runner = adult_in_us();
    assert!(runner.decide(ADULT_IN_US, &[("age", 20.into()), ("country", "US".into())]));
    assert!(!runner.decide(ADULT_IN_US, &[("age", 20.into()), ("country", "CA".into())]));
}

#[test]
fn test_and_short_circuits_on_false() {
    let runner = adult_in_us();
    // `country` is never required.
    assert!(!runner.decide(ADULT_IN_US, &[("age", 15.into())]));
    // A false right operand decides even when the left is unknown.
    assert!(!runner.decide(r#"country == "US" && age >= 18"#, &[("age", 15.into())]));
}

#[test]
fn test_or_short_circuits_on_true() {
    let runner = Runner::new(&[("a", Type::Bool), ("b", Type::Bool)]);
    assert!(runner.decide("a || b", &[("a", true.into())]));
    assert!(runner.decide("b || a", &[("a", true.into())]));
    assert!(!runner.decide("a || b", &[("a", false.into()), ("b", false.into())]));
}

#[test]
fn test_partial_result() {
    let runner = adult_in_us();
    let result = runner.run(ADULT_IN_US, &[("age", 20.into())]).unwrap();

    assert!(result.is_partial());
    assert!(!result.value());
    assert_eq!(result.missing_var_names(), Ok(&["country".to_string()][..]));

    let residual = result.partial_value().unwrap();
    assert_eq!(residual.name(), "test");
    assert_eq!(residual.unparse(), Ok(r#"country == "US""#.to_string()));
    assert_eq!(
        residual.parameters(),
        &ParameterDeclarations::from([("country".to_string(), Type::String)])
    );

    assert_eq!(result.expression_string(), Ok(ADULT_IN_US.to_string()));
    assert_eq!(result.context_values(), &ctx(&[("age", 20.into())]));
}

#[test]
fn test_decided_result_is_not_partial() {
    let runner = adult_in_us();
    let result = runner.run(ADULT_IN_US, &[("age", 15.into())]).unwrap();
    assert_eq!(result.partial_value(), Err(NotPartial));
    assert_eq!(result.missing_var_names(), Err(NotPartial));
    assert_eq!(result.outcome(), &Outcome::Decided(false));
}

#[test]
fn test_not_keeps_unknown() {
    let runner = Runner::new(&[("banned", Type::Bool)]);
    assert_eq!(
        runner.residual("!banned", &[]),
        ("!banned".to_string(), vec!["banned".to_string()])
    );
    assert!(runner.decide("!banned", &[("banned", false.into())]));
}

#[test]
fn test_missing_names_in_first_read_order() {
    let runner = Runner::new(&[("a", Type::Int), ("b", Type::Int), ("c", Type::Int)]);
    let (residual, missing) = runner.residual("c > 0 && (a < b || c < a)", &[]);
    assert_eq!(residual, "c > 0 && (a < b || c < a)");
    assert_eq!(missing, vec!["c", "a", "b"]);
}

#[test]
fn test_unknown_condition_leaves_branches_symbolic() {
    let runner = Runner::new(&[
        ("vip", Type::Bool),
        ("fee", Type::Int),
        ("limit", Type::Int),
    ]);
    let (residual, missing) = runner.residual(
        "vip ? fee == 0 : fee < limit",
        &[("fee", 5.into()), ("limit", 10.into())],
    );
    assert_eq!(residual, "vip ? 5 == 0 : 5 < 10");
    assert_eq!(missing, vec!["vip"]);

    let (_, missing) = runner.residual("vip ? fee == 0 : fee < limit", &[("fee", 5.into())]);
    assert_eq!(missing, vec!["vip", "limit"]);
}

#[test]
fn test_untaken_branch_is_not_evaluated() {
    let runner = Runner::new(&[("vip", Type::Bool), ("zero", Type::Int)]);
    assert!(runner.decide(
        "vip ? true : 1 / zero == 0",
        &[("vip", true.into()), ("zero", 0.into())]
    ));
    // With an unknown condition neither branch runs, so no division happens.
    let (residual, _) = runner.residual("vip ? true : 1 / zero == 0", &[("zero", 0.into())]);
    assert_eq!(residual, "vip ? true : 1 / 0 == 0");
}

#[test]
fn test_cost_limit_exceeded() {
    let runner = Runner::new(&[("a", Type::Int), ("b", Type::Int), ("c", Type::Int)]);
    let context: [(&str, Value); 3] = [("a", 1.into()), ("b", 2.into()), ("c", 3.into())];
    let result = runner.run_with_config(
        "(a + b) * c - a > 0",
        &context,
        &EvaluationConfig::with_max_cost(1),
    );
    assert_eq!(
        result.unwrap_err(),
        EvaluationError::CostLimitExceeded {
            caveat: "test".to_string(),
            limit: 1,
        }
    );
}

#[test]
fn test_cost_accounting() {
    let runner = Runner::new(&[("a", Type::Int)]);
    // One unit for the comparison and one for reading `a`.
    let run = |max_cost| {
        runner.run_with_config(
            "a == 1",
            &[("a", 1.into())],
            &EvaluationConfig::with_max_cost(max_cost),
        )
    };
    assert!(run(2).unwrap().value());
    assert!(matches!(
        run(1),
        Err(EvaluationError::CostLimitExceeded { limit: 1, .. })
    ));
    // Zero means unbounded.
    assert!(run(0).unwrap().value());
}

#[test]
fn test_cost_limit_applies_to_partial_evaluation() {
    let runner = adult_in_us();
    let result = runner.run_with_config(
        ADULT_IN_US,
        &[("age", 20.into())],
        &EvaluationConfig::with_max_cost(3),
    );
    assert!(matches!(result, Err(EvaluationError::CostLimitExceeded { .. })));
}

#[test]
fn test_depth_limit() {
    let runner = Runner::new(&[("a", Type::Int)]);
    let config = EvaluationConfig {
        max_depth: 3,
        ..EvaluationConfig::default()
    };
    let result = runner.run_with_config("a + 1 + 1 + 1 > 0", &[("a", 1.into())], &config);
    assert_eq!(
        result.unwrap_err(),
        EvaluationError::DepthLimitExceeded {
            depth: 3,
            max_depth: 3,
        }
    );
}

#[test]
fn test_parameter_type_mismatch() {
    let runner = adult_in_us();
    let result = runner.run(ADULT_IN_US, &[("age", "twenty".into())]);
    assert_eq!(
        result.unwrap_err(),
        EvaluationError::Type(TypeError::ParameterMismatch {
            name: "age".to_string(),
            expected: Type::Int,
            found: "string",
        })
    );
}

#[test]
fn test_parameter_coercion() {
    let runner = Runner::new(&[("ratio", Type::Double), ("count", Type::UInt)]);
    assert!(runner.decide("ratio > 2.5", &[("ratio", 3.into())]));
    assert!(runner.decide("count == 4u", &[("count", 4.into())]));
}

#[test]
fn test_undeclared_reference() {
    let expr = Arc::new(CompiledExpression::new(
        "hand_built",
        parse("ghost == 1").unwrap(),
        ParameterDeclarations::new(),
    ));
    assert_eq!(
        evaluate_caveat(&expr, ContextValues::new()).unwrap_err(),
        EvaluationError::Type(TypeError::UndeclaredReference {
            name: "ghost".to_string(),
        })
    );

    // Undeclared context values pass through.
    let result = evaluate_caveat(&expr, ctx(&[("ghost", 1.into())])).unwrap();
    assert!(result.value());
}

#[test]
fn test_root_must_be_boolean() {
    let runner = Runner::new(&[("a", Type::Int)]);
    assert_eq!(
        runner.run("a + 1", &[("a", 1.into())]).unwrap_err(),
        EvaluationError::Type(TypeError::NotABoolean { found: "int" })
    );
    // An unknown non-boolean root is still partial.
    assert!(runner.run("a + 1", &[]).unwrap().is_partial());
}

#[test]
fn test_runtime_errors_only_on_known_operands() {
    let runner = Runner::new(&[("a", Type::Int), ("b", Type::Int)]);
    assert_eq!(
        runner
            .run("a / b == 0", &[("a", 1.into()), ("b", 0.into())])
            .unwrap_err(),
        EvaluationError::Runtime(RuntimeError::DivisionByZero)
    );
    let (residual, missing) = runner.residual("a / b == 0", &[("b", 0.into())]);
    assert_eq!(residual, "a / 0 == 0");
    assert_eq!(missing, vec!["a"]);
}

#[test]
fn test_unknown_operand_outranks_error() {
    let runner = Runner::new(&[("a", Type::Bool), ("b", Type::Int)]);

    let (residual, missing) = runner.residual("a && 1 / b == 0", &[("b", 0.into())]);
    assert_eq!(residual, "a && 1 / 0 == 0");
    assert_eq!(missing, vec!["a"]);

    let (residual, missing) = runner.residual("a || 1 / b == 0", &[("b", 0.into())]);
    assert_eq!(residual, "a || 1 / 0 == 0");
    assert_eq!(missing, vec!["a"]);

    let (residual, missing) = runner.residual("1 / b == 0 && a", &[("b", 0.into())]);
    assert_eq!(residual, "1 / 0 == 0 && a");
    assert_eq!(missing, vec!["a"]);
}

#[test]
fn test_operand_error_after_more_context() {
    let runner = Runner::new(&[("a", Type::Bool), ("b", Type::Int)]);

    // An absorbing value decides regardless of which side failed.
    assert!(!runner.decide("a && 1 / b == 0", &[("a", false.into()), ("b", 0.into())]));
    assert!(!runner.decide("1 / b == 0 && a", &[("a", false.into()), ("b", 0.into())]));
    assert!(runner.decide("1 / b == 0 || a", &[("a", true.into()), ("b", 0.into())]));

    // A known value that does not decide lets the error through.
    for source in ["a && 1 / b == 0", "1 / b == 0 && a"] {
        assert_eq!(
            runner
                .run(source, &[("a", true.into()), ("b", 0.into())])
                .unwrap_err(),
            EvaluationError::Runtime(RuntimeError::DivisionByZero)
        );
    }
    assert_eq!(
        runner
            .run("a || 1 / b == 0", &[("a", false.into()), ("b", 0.into())])
            .unwrap_err(),
        EvaluationError::Runtime(RuntimeError::DivisionByZero)
    );
}

#[test]
fn test_failed_operand_still_reports_its_missing_reads() {
    let runner = Runner::new(&[("a", Type::Bool), ("b", Type::Int), ("c", Type::Int)]);
    let (residual, missing) = runner.residual("a && [1 / b, c] == [0, 1]", &[("b", 0.into())]);
    assert_eq!(residual, "a && [1 / 0, c] == [0, 1]");
    assert_eq!(missing, vec!["a", "c"]);
}

#[test]
fn test_limits_stay_fatal_next_to_unknown_operand() {
    let runner = Runner::new(&[("a", Type::Bool), ("b", Type::Int)]);
    let result = runner.run_with_config(
        "a && 1 / b == 0",
        &[("b", 0.into())],
        &EvaluationConfig::with_max_cost(1),
    );
    assert!(matches!(result, Err(EvaluationError::CostLimitExceeded { limit: 1, .. })));
}

#[test]
fn test_depth_limit_covers_untaken_branches() {
    init_test_logging();
    let runner = Runner::new(&[("c", Type::Bool), ("x", Type::Bool)]);
    let config = EvaluationConfig {
        max_depth: 5,
        ..EvaluationConfig::default()
    };

    let deep = format!("c ? {}x : true", "!".repeat(50));
    assert_eq!(
        runner.run_with_config(&deep, &[], &config).unwrap_err(),
        EvaluationError::DepthLimitExceeded {
            depth: 5,
            max_depth: 5,
        }
    );

    let result = runner.run_with_config("c ? !!x : true", &[], &config).unwrap();
    assert_eq!(result.missing_var_names().unwrap(), ["c", "x"]);
}

#[test]
fn test_unattributed_partial_policy() {
    init_test_logging();
    let missing = ["a".to_string()];
    assert_eq!(check_attribution("test", &missing, UnattributedPartial::Reject), Ok(()));
    assert_eq!(check_attribution("test", &[], UnattributedPartial::Allow), Ok(()));
    assert_eq!(
        check_attribution("test", &[], UnattributedPartial::Reject),
        Err(EvaluationError::Internal(
            "caveat 'test' is undecided but no parameter is missing".to_string()
        ))
    );

    // Ordinary partial results carry missing names, so rejecting is a no-op.
    let config = EvaluationConfig {
        unattributed_partial: UnattributedPartial::Reject,
        ..EvaluationConfig::default()
    };
    let result = adult_in_us()
        .run_with_config(ADULT_IN_US, &[("age", 20.into())], &config)
        .unwrap();
    assert_eq!(result.missing_var_names().unwrap(), ["country"]);
}

#[test]
fn test_collections_and_functions() {
    let runner = Runner::new(&[
        ("email", Type::String),
        ("roles", Type::list(Type::String)),
        ("request", Type::map(Type::Any)),
    ]);
    let context: [(&str, Value); 3] = [
        ("email", "alice@example.com".into()),
        ("roles", Value::list(["admin", "editor"])),
        (
            "request",
            Value::map([("ip", Value::from("10.0.0.1")), ("port", Value::from(443))]),
        ),
    ];
    assert!(runner.decide(r#"email.endsWith("@example.com") && size(roles) > 1"#, &context));
    assert!(runner.decide(r#""admin" in roles && roles[1] == "editor""#, &context));
    assert!(runner.decide(r#"request.ip == "10.0.0.1" && request["port"] == 443u"#, &context));
    assert!(runner.decide(r#""port" in request && !("user" in request)"#, &context));
    assert!(runner.decide(r#"{"a": 1}.a + [1, 2][0] == 2"#, &context));

    assert_eq!(
        runner.run("request.user == 1", &context).unwrap_err(),
        EvaluationError::Runtime(RuntimeError::NoSuchKey {
            key: "user".to_string(),
        })
    );
    assert_eq!(
        runner.run("roles[5] == 1", &context).unwrap_err(),
        EvaluationError::Runtime(RuntimeError::IndexOutOfBounds { index: 5, len: 2 })
    );
}

#[test]
fn test_function_on_unknown_receiver() {
    let runner = Runner::new(&[("email", Type::String)]);
    let (residual, missing) = runner.residual(r#"email.endsWith("@example.com")"#, &[]);
    assert_eq!(residual, r#"email.endsWith("@example.com")"#);
    assert_eq!(missing, vec!["email"]);
}

#[test]
fn test_non_finite_values_keep_their_expression() {
    let runner = Runner::new(&[("x", Type::Double), ("y", Type::Double)]);
    let (residual, missing) = runner.residual("x / 0.0 > y", &[("x", 1.0.into())]);
    assert_eq!(residual, "1.0 / 0.0 > y");
    assert_eq!(missing, vec!["y"]);
}

#[test]
fn test_concurrent_evaluations_share_expression() {
    let runner = adult_in_us();
    let expr = runner.compile(ADULT_IN_US);
    let handles: Vec<_> = (15..25)
        .map(|age| {
            let expr = Arc::clone(&expr);
            std::thread::spawn(move || {
                let context = ctx(&[("age", Value::from(age)), ("country", "US".into())]);
                evaluate_caveat(&expr, context).map(|result| result.value())
            })
        })
        .collect();
    let decisions: Vec<bool> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread panicked").expect("evaluation"))
        .collect();
    assert_eq!(decisions.iter().filter(|adult| **adult).count(), 7);
}
