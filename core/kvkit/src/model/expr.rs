//! Boolean expression tree over field comparisons, the explicit builder
//! that replaces the source's operator-overloaded query tree.
//!
//! `Expr` is a closed, typed enum: the only dynamic failure mode left is a
//! [`crate::error::KvError::Type`] when a `Cmp` names a field the model's
//! schema doesn't have, reported at query-compile time rather than at
//! construction.

use crate::codec::Value;
use std::ops::{BitAnd, BitOr};

/// Relational operator in a leaf comparison. Mirrors the operators the
/// secondary index knows how to answer (see `model::index`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    StartsWith,
}

/// A Boolean-composed query over one model's fields.
#[derive(Debug, Clone)]
pub enum Expr {
    Cmp(&'static str, Op, Value),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn and(self, other: Expr) -> Expr {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Expr {
        Expr::Or(Box::new(self), Box::new(other))
    }
}

impl BitAnd for Expr {
    type Output = Expr;
    fn bitand(self, rhs: Expr) -> Expr {
        self.and(rhs)
    }
}

impl BitOr for Expr {
    type Output = Expr;
    fn bitor(self, rhs: Expr) -> Expr {
        self.or(rhs)
    }
}

/// Entry point for building a leaf comparison: `field("last").eq(v)`.
pub fn field(name: &'static str) -> FieldBuilder {
    FieldBuilder { name }
}

pub struct FieldBuilder {
    name: &'static str,
}

impl FieldBuilder {
    pub fn eq(self, value: impl Into<Value>) -> Expr {
        Expr::Cmp(self.name, Op::Eq, value.into())
    }

    pub fn ne(self, value: impl Into<Value>) -> Expr {
        Expr::Cmp(self.name, Op::Ne, value.into())
    }

    pub fn lt(self, value: impl Into<Value>) -> Expr {
        Expr::Cmp(self.name, Op::Lt, value.into())
    }

    pub fn le(self, value: impl Into<Value>) -> Expr {
        Expr::Cmp(self.name, Op::Le, value.into())
    }

    pub fn gt(self, value: impl Into<Value>) -> Expr {
        Expr::Cmp(self.name, Op::Gt, value.into())
    }

    pub fn ge(self, value: impl Into<Value>) -> Expr {
        Expr::Cmp(self.name, Op::Ge, value.into())
    }

    pub fn startswith(self, value: impl Into<Value>) -> Expr {
        Expr::Cmp(self.name, Op::StartsWith, value.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Bytes(v.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Bytes(v.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_cmp_nodes() {
        let expr = field("last").eq("leifer");
        match expr {
            Expr::Cmp(name, Op::Eq, Value::Bytes(b)) => {
                assert_eq!(name, "last");
                assert_eq!(b, b"leifer");
            }
            _ => panic!("expected Cmp node"),
        }
    }

    #[test]
    fn and_or_combinators_nest_correctly() {
        let expr = field("x").lt(4i64) & field("y").ge(1i64);
        match expr {
            Expr::And(lhs, rhs) => {
                assert!(matches!(*lhs, Expr::Cmp(_, Op::Lt, _)));
                assert!(matches!(*rhs, Expr::Cmp(_, Op::Ge, _)));
            }
            _ => panic!("expected And node"),
        }

        let expr = field("x").eq(1i64) | field("x").eq(2i64);
        assert!(matches!(expr, Expr::Or(_, _)));
    }
}
