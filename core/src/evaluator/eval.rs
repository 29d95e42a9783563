//! Core evaluation logic.

use tracing::trace;

use crate::{
    api::EvaluationConfig,
    evaluator::{
        EvaluationError, RuntimeError, TypeError,
        binder::{Activation, Binding},
        operators,
        trace::{EvaluationTrace, PartialValue, UnknownAttribute},
    },
    parser::{BoolOp, Expr},
    stdlib,
    values::Value,
};

/// Three-valued evaluator over a partial environment.
///
/// One evaluator serves exactly one evaluation call. It owns the cost counter
/// and the trace, both of which start empty.
pub(crate) struct Evaluator<'a> {
    caveat: &'a str,
    activation: &'a Activation<'a>,
    max_cost: Option<u64>,
    max_depth: usize,
    trace: EvaluationTrace,
    cost: u64,
    depth: usize,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(
        caveat: &'a str,
        activation: &'a Activation<'a>,
        config: &EvaluationConfig,
    ) -> Self {
        Self {
            caveat,
            activation,
            // Zero means unbounded, same as `None`.
            max_cost: config.max_cost.filter(|limit| *limit > 0),
            max_depth: config.max_depth,
            trace: EvaluationTrace::new(),
            cost: 0,
            depth: 0,
        }
    }

    pub(crate) fn cost(&self) -> u64 {
        self.cost
    }

    pub(crate) fn into_trace(self) -> EvaluationTrace {
        self.trace
    }

    /// Evaluate an expression node and record its outcome in the trace.
    pub(crate) fn eval(&mut self, expr: &Expr) -> Result<PartialValue, EvaluationError> {
        // Check depth before recursing
        if self.depth >= self.max_depth {
            return Err(EvaluationError::DepthLimitExceeded {
                depth: self.depth,
                max_depth: self.max_depth,
            });
        }

        self.depth += 1;
        let result = self.eval_inner(expr);
        self.depth -= 1;

        let value = result?;
        self.trace.record(expr, &value);
        Ok(value)
    }

    fn charge(&mut self) -> Result<(), EvaluationError> {
        self.cost += 1;
        if let Some(limit) = self.max_cost {
            if self.cost > limit {
                return Err(EvaluationError::CostLimitExceeded {
                    caveat: self.caveat.to_string(),
                    limit,
                });
            }
        }
        trace!(cost = self.cost, "charged evaluation step");
        Ok(())
    }

    /// Inner evaluation logic (no depth tracking).
    fn eval_inner(&mut self, expr: &Expr) -> Result<PartialValue, EvaluationError> {
        match expr {
            Expr::Literal(literal) => Ok(PartialValue::Known(Value::from(literal))),

            Expr::Ident(name) => {
                self.charge()?;
                let activation = self.activation;
                match activation.lookup(name) {
                    Binding::Bound(value) => Ok(PartialValue::Known(value.clone())),
                    Binding::Unbound => {
                        trace!(name = name.as_str(), "read of unbound parameter");
                        let attribute = UnknownAttribute {
                            name: name.clone(),
                            declared: activation.declared_names(),
                        };
                        self.trace.record_unknown_attribute(expr, attribute);
                        Ok(PartialValue::Unknown)
                    }
                    Binding::Undeclared => {
                        Err(TypeError::UndeclaredReference { name: name.clone() }.into())
                    }
                }
            }

            Expr::Select { operand, field } => {
                self.charge()?;
                let PartialValue::Known(operand) = self.eval(operand)? else {
                    return Ok(PartialValue::Unknown);
                };
                match operand {
                    Value::Map(mut entries) => entries
                        .remove(field)
                        .map(PartialValue::Known)
                        .ok_or_else(|| RuntimeError::NoSuchKey { key: field.clone() }.into()),
                    other => Err(TypeError::NotSelectable {
                        field: field.clone(),
                        found: other.kind(),
                    }
                    .into()),
                }
            }

            Expr::Index { operand, index } => {
                self.charge()?;
                let operand = self.eval(operand)?;
                let index = self.eval(index)?;
                match (operand, index) {
                    (PartialValue::Known(operand), PartialValue::Known(index)) => {
                        index_value(operand, &index).map(PartialValue::Known)
                    }
                    _ => Ok(PartialValue::Unknown),
                }
            }

            Expr::Call {
                target,
                function,
                args,
            } => {
                self.charge()?;
                let receiver = match target {
                    Some(target) => Some(self.eval(target)?),
                    None => None,
                };
                let args = self.eval_all(args)?;
                let receiver = match receiver {
                    Some(PartialValue::Known(value)) => Some(value),
                    Some(PartialValue::Unknown) => return Ok(PartialValue::Unknown),
                    None => None,
                };
                match args {
                    Some(args) => stdlib::call(function, receiver, args).map(PartialValue::Known),
                    None => Ok(PartialValue::Unknown),
                }
            }

            Expr::Unary { op, expr: operand } => {
                self.charge()?;
                match self.eval(operand)? {
                    PartialValue::Known(value) => {
                        operators::eval_unary(*op, &value).map(PartialValue::Known)
                    }
                    PartialValue::Unknown => Ok(PartialValue::Unknown),
                }
            }

            Expr::Binary { op, left, right } => {
                self.charge()?;
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                match (left, right) {
                    (PartialValue::Known(l), PartialValue::Known(r)) => {
                        operators::eval_binary(*op, &l, &r).map(PartialValue::Known)
                    }
                    _ => Ok(PartialValue::Unknown),
                }
            }

            Expr::Comparison { op, left, right } => {
                self.charge()?;
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                match (left, right) {
                    (PartialValue::Known(l), PartialValue::Known(r)) => {
                        operators::eval_comparison(*op, &l, &r)
                            .map(|result| PartialValue::Known(Value::Bool(result)))
                    }
                    _ => Ok(PartialValue::Unknown),
                }
            }

            Expr::Boolean { op, left, right } => self.eval_boolean(*op, left, right),

            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.eval(cond)?;
                match truth(&cond)? {
                    Some(true) => self.eval(then_branch),
                    Some(false) => self.eval(else_branch),
                    None => {
                        // Neither branch is evaluated; only their parameter
                        // reads are resolved so the residual can fold them.
                        self.scan_unvisited(then_branch, self.depth)?;
                        self.scan_unvisited(else_branch, self.depth)?;
                        Ok(PartialValue::Unknown)
                    }
                }
            }

            Expr::List(items) => {
                self.charge()?;
                Ok(match self.eval_all(items)? {
                    Some(items) => PartialValue::Known(Value::List(items)),
                    None => PartialValue::Unknown,
                })
            }

            Expr::Map(entries) => {
                self.charge()?;
                let mut known = Some(Vec::with_capacity(entries.len()));
                for (key, value) in entries {
                    let key = self.eval(key)?;
                    let value = self.eval(value)?;
                    known = match (known, key, value) {
                        (Some(mut acc), PartialValue::Known(k), PartialValue::Known(v)) => {
                            acc.push((k, v));
                            Some(acc)
                        }
                        _ => None,
                    };
                }
                match known {
                    Some(entries) => build_map(entries).map(PartialValue::Known),
                    None => Ok(PartialValue::Unknown),
                }
            }
        }
    }

    /// Three-valued short-circuit evaluation of `&&` and `||`.
    ///
    /// The right operand is skipped only when the left one already decides
    /// the result. An unknown left operand still evaluates the right, which
    /// may decide the result on its own.
    ///
    /// A type or runtime error in one operand is held back: an absorbing
    /// value on the other side still decides, and an unknown one leaves the
    /// connective unknown. The error surfaces only when the other side is
    /// known and does not decide.
    fn eval_boolean(
        &mut self,
        op: BoolOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<PartialValue, EvaluationError> {
        let absorbing = match op {
            BoolOp::And => false,
            BoolOp::Or => true,
        };

        let left = self.eval_operand(left)?;
        if matches!(left, Ok(Some(l)) if l == absorbing) {
            return Ok(PartialValue::Known(Value::Bool(absorbing)));
        }

        let right = self.eval_operand(right)?;
        match (left, right) {
            (_, Ok(Some(r))) if r == absorbing => Ok(PartialValue::Known(Value::Bool(absorbing))),
            (Ok(Some(_)), Ok(Some(_))) => Ok(PartialValue::Known(Value::Bool(!absorbing))),
            (Ok(None), _) | (_, Ok(None)) => Ok(PartialValue::Unknown),
            (Err(error), _) | (_, Err(error)) => Err(error),
        }
    }

    /// Evaluate one operand of a connective as a boolean.
    ///
    /// The outer `Result` carries failures that end the evaluation outright
    /// (budget and depth limits). The inner one carries errors the other
    /// operand may still override.
    fn eval_operand(&mut self, expr: &Expr) -> Result<Operand, EvaluationError> {
        match self.eval(expr).and_then(|value| truth(&value)) {
            Ok(value) => Ok(Ok(value)),
            Err(error @ (EvaluationError::Type(_) | EvaluationError::Runtime(_))) => {
                trace!(%error, "holding back operand error");
                // Parameter reads past the failure point still count as
                // missing if the residual keeps this operand.
                self.scan_unvisited(expr, self.depth)?;
                Ok(Err(error))
            }
            Err(error) => Err(error),
        }
    }

    /// Evaluate every expression in order. Returns `None` if any is unknown.
    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Option<Vec<Value>>, EvaluationError> {
        let mut values = Some(Vec::with_capacity(exprs.len()));
        for expr in exprs {
            let value = self.eval(expr)?;
            values = match (values, value) {
                (Some(mut acc), PartialValue::Known(value)) => {
                    acc.push(value);
                    Some(acc)
                }
                _ => None,
            };
        }
        Ok(values)
    }

    /// Resolve parameter reads inside a subtree that is not evaluated.
    ///
    /// Bound parameters are recorded as known, unbound ones as unknown
    /// attributes. Nothing is charged and no operator runs, so the only way
    /// an untaken branch fails the evaluation is by nesting deeper than
    /// `max_depth`.
    fn scan_unvisited(&mut self, expr: &Expr, depth: usize) -> Result<(), EvaluationError> {
        if depth >= self.max_depth {
            return Err(EvaluationError::DepthLimitExceeded {
                depth,
                max_depth: self.max_depth,
            });
        }
        let depth = depth + 1;

        let activation = self.activation;
        match expr {
            Expr::Ident(name) => match activation.lookup(name) {
                Binding::Bound(value) => {
                    let value = PartialValue::Known(value.clone());
                    self.trace.record(expr, &value);
                }
                Binding::Unbound => {
                    let attribute = UnknownAttribute {
                        name: name.clone(),
                        declared: activation.declared_names(),
                    };
                    self.trace.record_unknown_attribute(expr, attribute);
                }
                Binding::Undeclared => {}
            },
            Expr::Literal(_) => {}
            Expr::Select { operand, .. } | Expr::Unary { expr: operand, .. } => {
                self.scan_unvisited(operand, depth)?;
            }
            Expr::Index { operand, index } => {
                self.scan_unvisited(operand, depth)?;
                self.scan_unvisited(index, depth)?;
            }
            Expr::Call { target, args, .. } => {
                if let Some(target) = target {
                    self.scan_unvisited(target, depth)?;
                }
                for arg in args {
                    self.scan_unvisited(arg, depth)?;
                }
            }
            Expr::Binary { left, right, .. }
            | Expr::Comparison { left, right, .. }
            | Expr::Boolean { left, right, .. } => {
                self.scan_unvisited(left, depth)?;
                self.scan_unvisited(right, depth)?;
            }
            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                self.scan_unvisited(cond, depth)?;
                self.scan_unvisited(then_branch, depth)?;
                self.scan_unvisited(else_branch, depth)?;
            }
            Expr::List(items) => {
                for item in items {
                    self.scan_unvisited(item, depth)?;
                }
            }
            Expr::Map(entries) => {
                for (key, value) in entries {
                    self.scan_unvisited(key, depth)?;
                    self.scan_unvisited(value, depth)?;
                }
            }
        }
        Ok(())
    }
}

/// A connective operand: known truth value, unknown (`None`), or an error
/// that is only raised if nothing else decides the connective.
type Operand = Result<Option<bool>, EvaluationError>;

/// Boolean view of a partial value: `None` when unknown.
pub(crate) fn truth(value: &PartialValue) -> Result<Option<bool>, EvaluationError> {
    match value {
        PartialValue::Known(Value::Bool(b)) => Ok(Some(*b)),
        PartialValue::Known(other) => Err(TypeError::NotABoolean {
            found: other.kind(),
        }
        .into()),
        PartialValue::Unknown => Ok(None),
    }
}

fn index_value(container: Value, index: &Value) -> Result<Value, EvaluationError> {
    match (container, index) {
        (Value::List(mut items), Value::Int(_) | Value::UInt(_)) => {
            let len = items.len();
            let (position, shown) = match *index {
                Value::Int(i) => (usize::try_from(i).ok(), i),
                Value::UInt(u) => (usize::try_from(u).ok(), i64::try_from(u).unwrap_or(i64::MAX)),
                _ => (None, 0),
            };
            match position.filter(|position| *position < len) {
                Some(position) => Ok(items.swap_remove(position)),
                None => Err(RuntimeError::IndexOutOfBounds { index: shown, len }.into()),
            }
        }
        (Value::Map(mut entries), Value::Str(key)) => entries
            .remove(key)
            .ok_or_else(|| RuntimeError::NoSuchKey { key: key.clone() }.into()),
        (container, index) => Err(TypeError::NotIndexable {
            container: container.kind(),
            index: index.kind(),
        }
        .into()),
    }
}

fn build_map(entries: Vec<(Value, Value)>) -> Result<Value, EvaluationError> {
    let mut map = std::collections::BTreeMap::new();
    for (key, value) in entries {
        let Value::Str(key) = key else {
            return Err(TypeError::InvalidMapKey { found: key.kind() }.into());
        };
        if map.contains_key(&key) {
            return Err(RuntimeError::DuplicateKey { key }.into());
        }
        map.insert(key, value);
    }
    Ok(Value::Map(map))
}
