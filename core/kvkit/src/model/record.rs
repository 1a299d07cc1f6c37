//! `save`/`load`/`delete`, and the `get`/`query` read path: the piece that
//! allocates primary keys, writes record bodies, and reconciles secondary
//! indexes under updates and deletes.

use super::expr::Expr;
use super::index::SecondaryIndex;
use super::ModelSchema;
use crate::backend::{BatchOp, KvBackend};
use crate::codec::Value;
use crate::error::{KvError, KvResult};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, instrument};

fn body_key(model: &str, pk: i64) -> Vec<u8> {
    format!("{model}:{pk}").into_bytes()
}

fn field_key(model: &str, pk: i64, field: &str) -> Vec<u8> {
    format!("{model}:{pk}:{field}").into_bytes()
}

fn index_for<T: ModelSchema>(field_name: &'static str) -> Option<SecondaryIndex> {
    T::schema_fields()
        .iter()
        .find(|f| f.name == field_name && f.indexed)
        .map(|f| SecondaryIndex::new(T::MODEL_NAME, f.name, f.kind))
}

/// Read a record's indexed fields only, for computing index deltas on
/// update without paying for a full record decode.
fn load_indexed_snapshot<T: ModelSchema>(
    backend: &dyn KvBackend,
    pk: i64,
) -> KvResult<HashMap<&'static str, Value>> {
    let mut out = HashMap::new();
    if T::SERIALIZE {
        if let Ok(instance) = load::<T>(backend, pk) {
            for f in T::schema_fields().iter().filter(|f| f.indexed) {
                out.insert(f.name, instance.get_field(f.name)?);
            }
        }
        return Ok(out);
    }
    for f in T::schema_fields().iter().filter(|f| f.indexed) {
        let key = field_key(T::MODEL_NAME, pk, f.name);
        if let Some(bytes) = backend.get(&key)? {
            out.insert(f.name, f.kind.decode(&bytes)?);
        }
    }
    Ok(out)
}

/// Persist `instance`. Assigns a primary key via the model's `id_seq` on
/// first save. Record body and every indexed field's delta are written as
/// one atomic batch.
#[instrument(skip(backend, instance), fields(model = T::MODEL_NAME))]
pub fn save<T: ModelSchema>(backend: &dyn KvBackend, instance: &mut T) -> KvResult<i64> {
    let model = T::MODEL_NAME;
    let prior = match instance.id() {
        Some(pk) => load_indexed_snapshot::<T>(backend, pk)?,
        None => HashMap::new(),
    };

    let pk = match instance.id() {
        Some(pk) => pk,
        None => {
            let seq_key = format!("id_seq:{model}");
            let pk = backend.increment(seq_key.as_bytes(), 1, 0)?;
            instance.set_id(pk);
            pk
        }
    };

    let mut ops = Vec::new();

    if T::SERIALIZE {
        let mut map = HashMap::new();
        for f in T::schema_fields() {
            map.insert(f.name.to_string(), instance.get_field(f.name)?);
        }
        let blob = bincode::serialize(&map)?;
        ops.push(BatchOp::Put(body_key(model, pk), blob));
    } else {
        for f in T::schema_fields() {
            let value = instance.get_field(f.name)?;
            let encoded = f.kind.encode(&value)?;
            ops.push(BatchOp::Put(field_key(model, pk, f.name), encoded));
        }
    }

    for f in T::schema_fields().iter().filter(|f| f.indexed) {
        let new_value = instance.get_field(f.name)?;
        let old_value = prior.get(f.name);
        if old_value == Some(&new_value) {
            continue;
        }
        let index = SecondaryIndex::new(model, f.name, f.kind);
        if let Some(old) = old_value {
            ops.extend(index.delete_ops(old, pk)?);
        }
        ops.extend(index.store_ops(&new_value, pk)?);
    }

    debug!(pk, ops = ops.len(), "saving record");
    backend.apply_batch(&ops)?;
    Ok(pk)
}

/// Load a record by primary key, constructing a populated instance.
#[instrument(skip(backend), fields(model = T::MODEL_NAME))]
pub fn load<T: ModelSchema>(backend: &dyn KvBackend, pk: i64) -> KvResult<T> {
    let model = T::MODEL_NAME;
    let mut instance = T::with_defaults();
    instance.set_id(pk);

    if T::SERIALIZE {
        let bytes = backend
            .get(&body_key(model, pk))?
            .ok_or(KvError::NotFound)?;
        let map: HashMap<String, Value> = bincode::deserialize(&bytes)?;
        for f in T::schema_fields() {
            if let Some(value) = map.get(f.name) {
                instance.set_field(f.name, value.clone())?;
            }
        }
        return Ok(instance);
    }

    let mut found_any = false;
    for f in T::schema_fields() {
        if let Some(bytes) = backend.get(&field_key(model, pk, f.name))? {
            found_any = true;
            instance.set_field(f.name, f.kind.decode(&bytes)?)?;
        }
    }
    if !found_any {
        return Err(KvError::NotFound);
    }
    Ok(instance)
}

/// Remove a record's body and every index entry derived from its current
/// field values, as one atomic batch.
#[instrument(skip(backend, instance), fields(model = T::MODEL_NAME))]
pub fn delete<T: ModelSchema>(backend: &dyn KvBackend, instance: &T) -> KvResult<()> {
    let model = T::MODEL_NAME;
    let pk = instance.id().ok_or(KvError::NotFound)?;
    let mut ops = Vec::new();

    if T::SERIALIZE {
        ops.push(BatchOp::Delete(body_key(model, pk)));
    } else {
        for f in T::schema_fields() {
            ops.push(BatchOp::Delete(field_key(model, pk, f.name)));
        }
    }

    for f in T::schema_fields().iter().filter(|f| f.indexed) {
        let value = instance.get_field(f.name)?;
        let index = SecondaryIndex::new(model, f.name, f.kind);
        ops.extend(index.delete_ops(&value, pk)?);
    }

    backend.apply_batch(&ops)
}

/// Compile `expr` against this model's indexes into a sorted-ascending set
/// of primary keys.
pub fn compile<T: ModelSchema>(backend: &dyn KvBackend, expr: &Expr) -> KvResult<BTreeSet<i64>> {
    match expr {
        Expr::Cmp(field_name, op, value) => {
            let index = index_for::<T>(field_name).ok_or_else(|| {
                KvError::Type(format!(
                    "model {:?} has no indexed field named {:?}",
                    T::MODEL_NAME,
                    field_name
                ))
            })?;
            Ok(index.query(backend, value, *op)?.into_iter().collect())
        }
        Expr::And(lhs, rhs) => {
            let left = compile::<T>(backend, lhs)?;
            let right = compile::<T>(backend, rhs)?;
            Ok(left.intersection(&right).copied().collect())
        }
        Expr::Or(lhs, rhs) => {
            let left = compile::<T>(backend, lhs)?;
            let right = compile::<T>(backend, rhs)?;
            Ok(left.union(&right).copied().collect())
        }
    }
}

/// Compile and load every matching record, in ascending primary-key order.
#[instrument(skip(backend, expr), fields(model = T::MODEL_NAME))]
pub fn query<T: ModelSchema>(backend: &dyn KvBackend, expr: &Expr) -> KvResult<Vec<T>> {
    let ids = compile::<T>(backend, expr)?;
    debug!(matched = ids.len(), "query compiled");
    ids.into_iter().map(|pk| load::<T>(backend, pk)).collect()
}

/// Compile and load the first matching record, if any.
pub fn get<T: ModelSchema>(backend: &dyn KvBackend, expr: &Expr) -> KvResult<Option<T>> {
    let ids = compile::<T>(backend, expr)?;
    match ids.into_iter().next() {
        Some(pk) => Ok(Some(load::<T>(backend, pk)?)),
        None => Ok(None),
    }
}
