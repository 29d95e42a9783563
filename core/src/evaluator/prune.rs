//! Residual pruning.
//!
//! Rewrites an evaluated tree into a smaller equivalent one: subtrees the
//! trace marks as decided become literals, and boolean connectives drop
//! operands that no longer affect the result. The input tree is only read;
//! the residual owns fresh nodes throughout.

use tracing::trace;

use crate::{
    evaluator::trace::{EvaluationTrace, TraceEntry},
    parser::{BoolOp, Expr, Literal},
    values::Value,
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Residual {
    pub expr: Expr,
    /// Distinct unbound parameters the residual still reads, in the order
    /// they are first encountered.
    pub missing: Vec<String>,
}

pub(crate) fn prune(expr: &Expr, trace: &EvaluationTrace) -> Residual {
    let mut pruner = Pruner {
        trace,
        missing: Vec::new(),
    };
    let expr = pruner.prune(expr);
    trace!(missing = ?pruner.missing, "pruned residual expression");
    Residual {
        expr,
        missing: pruner.missing,
    }
}

struct Pruner<'a> {
    trace: &'a EvaluationTrace,
    missing: Vec<String>,
}

impl Pruner<'_> {
    fn prune(&mut self, expr: &Expr) -> Expr {
        match self.trace.get(expr) {
            Some(TraceEntry::Known(value)) => {
                // Values without a literal form keep their folded children.
                if let Some(literal) = value.to_expr() {
                    return literal;
                }
            }
            Some(TraceEntry::Unknown(Some(attribute))) => {
                if !self.missing.contains(&attribute.name) {
                    self.missing.push(attribute.name.clone());
                }
                return expr.clone();
            }
            Some(TraceEntry::Unknown(None)) | None => {}
        }

        match expr {
            Expr::Literal(_) | Expr::Ident(_) => expr.clone(),

            Expr::Boolean { op, left, right } => {
                let left = self.prune(left);
                let right = self.prune(right);
                simplify_boolean(*op, left, right)
            }

            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
            } => match self.trace.get(cond) {
                Some(TraceEntry::Known(Value::Bool(true))) => self.prune(then_branch),
                Some(TraceEntry::Known(Value::Bool(false))) => self.prune(else_branch),
                _ => Expr::Conditional {
                    cond: Box::new(self.prune(cond)),
                    then_branch: Box::new(self.prune(then_branch)),
                    else_branch: Box::new(self.prune(else_branch)),
                },
            },

            Expr::Select { operand, field } => Expr::Select {
                operand: Box::new(self.prune(operand)),
                field: field.clone(),
            },
            Expr::Index { operand, index } => Expr::Index {
                operand: Box::new(self.prune(operand)),
                index: Box::new(self.prune(index)),
            },
            Expr::Call {
                target,
                function,
                args,
            } => Expr::Call {
                target: target.as_ref().map(|target| Box::new(self.prune(target))),
                function: function.clone(),
                args: args.iter().map(|arg| self.prune(arg)).collect(),
            },
            Expr::Unary { op, expr } => Expr::Unary {
                op: *op,
                expr: Box::new(self.prune(expr)),
            },
            Expr::Binary { op, left, right } => Expr::Binary {
                op: *op,
                left: Box::new(self.prune(left)),
                right: Box::new(self.prune(right)),
            },
            Expr::Comparison { op, left, right } => Expr::Comparison {
                op: *op,
                left: Box::new(self.prune(left)),
                right: Box::new(self.prune(right)),
            },
            Expr::List(items) => Expr::List(items.iter().map(|item| self.prune(item)).collect()),
            Expr::Map(entries) => Expr::Map(
                entries
                    .iter()
                    .map(|(key, value)| (self.prune(key), self.prune(value)))
                    .collect(),
            ),
        }
    }
}

/// Drop the identity operand of a connective: `true && x` and `false || x`
/// both reduce to `x`, from either side.
fn simplify_boolean(op: BoolOp, left: Expr, right: Expr) -> Expr {
    let identity = match op {
        BoolOp::And => true,
        BoolOp::Or => false,
    };
    let is_identity = |expr: &Expr| matches!(expr, Expr::Literal(Literal::Bool(b)) if *b == identity);

    if is_identity(&left) {
        right
    } else if is_identity(&right) {
        left
    } else {
        Expr::Boolean {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}
