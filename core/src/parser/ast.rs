use serde::{Deserialize, Serialize};

use crate::parser::{BinaryOp, BoolOp, ComparisonOp, UnaryOp};

/// Owned caveat expression tree.
///
/// Every child is heap allocated (`Box` or `Vec`), so the address of a node is
/// stable for as long as the tree is not mutated. The evaluator relies on this
/// to key its trace by node address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(Literal),
    Ident(String),
    Select {
        operand: Box<Expr>,
        field: String,
    },
    Index {
        operand: Box<Expr>,
        index: Box<Expr>,
    },
    /// Global function call (`size(x)`) when `target` is `None`, method-style
    /// call (`x.size()`) otherwise.
    Call {
        target: Option<Box<Expr>>,
        function: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Comparison {
        op: ComparisonOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Boolean {
        op: BoolOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    List(Vec<Expr>),
    Map(Vec<(Expr, Expr)>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Double(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Ident(name.into())
    }

    pub fn as_ptr(&self) -> *const Self {
        self as *const _
    }

    /// Distinct identifiers referenced anywhere in the tree, in source order.
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Ident(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::Literal(_) => {}
            Expr::Select { operand, .. } => operand.collect_names(names),
            Expr::Index { operand, index } => {
                operand.collect_names(names);
                index.collect_names(names);
            }
            Expr::Call { target, args, .. } => {
                if let Some(target) = target {
                    target.collect_names(names);
                }
                for arg in args {
                    arg.collect_names(names);
                }
            }
            Expr::Unary { expr, .. } => expr.collect_names(names),
            Expr::Binary { left, right, .. }
            | Expr::Comparison { left, right, .. }
            | Expr::Boolean { left, right, .. } => {
                left.collect_names(names);
                right.collect_names(names);
            }
            Expr::Conditional {
                cond,
                then_branch,
                else_branch,
            } => {
                cond.collect_names(names);
                then_branch.collect_names(names);
                else_branch.collect_names(names);
            }
            Expr::List(items) => {
                for item in items {
                    item.collect_names(names);
                }
            }
            Expr::Map(entries) => {
                for (key, value) in entries {
                    key.collect_names(names);
                    value.collect_names(names);
                }
            }
        }
    }
}

impl From<Literal> for Expr {
    fn from(literal: Literal) -> Self {
        Expr::Literal(literal)
    }
}
