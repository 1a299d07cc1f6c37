//! Schema-ful record layer: typed fields, auto-assigned primary keys, and
//! secondary indexes supporting equality, range, prefix and
//! Boolean-composed queries.
//!
//! A model is declared once via `#[derive(Model)]`; the derive macro
//! implements [`ModelSchema`] for the struct, generating the field table
//! and the by-name accessors the generic save/load/delete/query machinery
//! in [`record`] dispatches through.

mod expr;
mod field;
mod index;
mod record;

pub use expr::{Expr, Op, field};
pub use field::{FieldDefault, FieldSpec};
pub use index::SecondaryIndex;
pub use record::{compile, delete, get, load, query, save};

use crate::backend::KvBackend;
use crate::codec::Value;
use crate::error::KvResult;

/// Implemented by `#[derive(Model)]` for every model struct. Generated
/// accessors dispatch by field name so the generic storage/index/query
/// layers stay oblivious to any particular model's Rust type.
pub trait ModelSchema: Sized {
    /// Logical model name (lowercased struct name).
    const MODEL_NAME: &'static str;
    /// `true` stores one opaque blob per record; `false` stores one KV
    /// entry per field.
    const SERIALIZE: bool;

    /// Ordered field table, sorted by declaration order. Memoized by the
    /// macro behind a `OnceLock` so it is built exactly once per process.
    fn schema_fields() -> &'static [FieldSpec];

    /// A fresh instance with every field defaulted (constant defaults
    /// copied, callable defaults invoked once).
    fn with_defaults() -> Self;

    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);

    fn get_field(&self, name: &str) -> KvResult<Value>;
    fn set_field(&mut self, name: &str, value: Value) -> KvResult<()>;
}

/// The model-level CRUD/query surface, blanket-implemented for every
/// `ModelSchema`: `T::load(backend, pk)`, `instance.save(backend)`,
/// `instance.delete(backend)`, `T::get(backend, expr)`, `T::query(backend,
/// expr)`.
pub trait Model: ModelSchema {
    fn save(&mut self, backend: &dyn KvBackend) -> KvResult<i64> {
        record::save(backend, self)
    }

    fn load(backend: &dyn KvBackend, pk: i64) -> KvResult<Self> {
        record::load(backend, pk)
    }

    fn delete(&self, backend: &dyn KvBackend) -> KvResult<()> {
        record::delete(backend, self)
    }

    fn get(backend: &dyn KvBackend, expr: &Expr) -> KvResult<Option<Self>> {
        record::get(backend, expr)
    }

    fn query(backend: &dyn KvBackend, expr: &Expr) -> KvResult<Vec<Self>> {
        record::query(backend, expr)
    }
}

impl<T: ModelSchema> Model for T {}
