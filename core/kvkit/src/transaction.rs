//! Scoped begin/commit/rollback, expressed the idiomatic Rust way: a
//! closure-taking [`with_transaction`] that commits on `Ok` and rolls back
//! (by simply discarding the buffer) on `Err` or panic, plus a manually
//! driven [`Transaction`] for callers who can't structure their writes as a
//! single closure.
//!
//! Writes are buffered locally and applied to the backend as one
//! [`KvBackend::apply_batch`] call on commit, so the only atomicity this
//! wrapper needs from the backend is whatever `apply_batch` itself
//! guarantees.

use crate::backend::{BatchOp, KvBackend};
use crate::error::KvResult;
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum BufferedOp {
    Put(Vec<u8>),
    Delete,
}

/// A manually-driven transaction. Buffers writes and provides
/// read-your-writes visibility against the backend's committed state.
/// Dropping an unfinished transaction rolls it back (the buffer is simply
/// discarded, since nothing was written to the backend yet).
pub struct Transaction<'a> {
    backend: &'a dyn KvBackend,
    buffer: HashMap<Vec<u8>, BufferedOp>,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub fn begin(backend: &'a dyn KvBackend) -> Self {
        Transaction {
            backend,
            buffer: HashMap::new(),
            finished: false,
        }
    }

    /// Read-your-writes: consult the local buffer first, fall back to the
    /// backend's committed state.
    pub fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        match self.buffer.get(key) {
            Some(BufferedOp::Put(v)) => Ok(Some(v.clone())),
            Some(BufferedOp::Delete) => Ok(None),
            None => self.backend.get(key),
        }
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        self.buffer
            .insert(key.to_vec(), BufferedOp::Put(value.to_vec()));
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.buffer.insert(key.to_vec(), BufferedOp::Delete);
    }

    /// Apply the buffered writes to the backend atomically.
    pub fn commit(mut self) -> KvResult<()> {
        let ops: Vec<BatchOp> = self
            .buffer
            .drain()
            .map(|(key, op)| match op {
                BufferedOp::Put(value) => BatchOp::Put(key, value),
                BufferedOp::Delete => BatchOp::Delete(key),
            })
            .collect();
        self.finished = true;
        self.backend.apply_batch(&ops)
    }

    /// Discard the buffer without touching the backend.
    pub fn rollback(mut self) {
        self.finished = true;
        self.buffer.clear();
    }
}

impl<'a> Drop for Transaction<'a> {
    fn drop(&mut self) {
        if !self.finished {
            self.buffer.clear();
        }
    }
}

/// Run `f` against a fresh transaction, committing its buffered writes if
/// `f` returns `Ok`, and leaving the backend untouched otherwise (including
/// if `f` panics, since nothing is written until `commit`).
pub fn with_transaction<'a, T>(
    backend: &'a dyn KvBackend,
    f: impl FnOnce(&mut Transaction<'a>) -> KvResult<T>,
) -> KvResult<T> {
    let mut tx = Transaction::begin(backend);
    let result = f(&mut tx)?;
    tx.commit()?;
    Ok(result)
}
