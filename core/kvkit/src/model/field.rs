//! Field declarations produced by `#[derive(Model)]`.

use crate::codec::{FieldKind, Value};

/// A default value for a field: either a constant, a nullary producer
/// invoked once per constructed instance, or no default at all (the field
/// is required, though `kvkit` itself does not enforce "required" beyond
/// leaving the field `Value::Null` until set).
pub enum FieldDefault {
    None,
    Const(Value),
    Callable(fn() -> Value),
}

impl FieldDefault {
    pub fn resolve(&self) -> Value {
        match self {
            FieldDefault::None => Value::Null,
            FieldDefault::Const(v) => v.clone(),
            FieldDefault::Callable(f) => f(),
        }
    }
}

/// One field's declaration: name, type codec, whether it carries a
/// secondary index, its default, and its declaration order (the order
/// fields were written in the struct, used to keep iteration deterministic).
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub indexed: bool,
    pub default: FieldDefault,
    pub order: usize,
}
