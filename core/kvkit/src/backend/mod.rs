//! The KV Backend Contract every storage adapter must satisfy.
//!
//! Every layer above this module (slices, cursors, the model/index layer,
//! the hexastore) is written against [`KvBackend`] alone, never against a
//! concrete backend. Two adapters ship with the crate: [`MemoryBackend`]
//! (always compiled in) and [`SledBackend`] (behind the `sled` feature).

mod memory;
#[cfg(feature = "sled")]
mod sled_backend;

pub use memory::MemoryBackend;
#[cfg(feature = "sled")]
pub use sled_backend::{SledBackend, SledOptions};

use crate::error::KvResult;
use std::collections::HashMap;

/// Capabilities a backend advertises. A backend that reports a capability
/// it cannot actually deliver is a bug in that backend, not a condition the
/// toolkit needs to detect at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub regex: bool,
    pub transactions: bool,
    pub atomic_increment: bool,
}

/// A single write within an atomic batch (see [`KvBackend::apply_batch`]).
#[derive(Debug, Clone)]
pub enum BatchOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// The ordered byte-keyed, byte-valued contract every kvkit backend
/// implements. Range semantics: both endpoints are inclusive when present;
/// `reverse` selects descending order. Implementations are `Send + Sync` so
/// they can be shared across threads behind an `Arc`.
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>>;

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()>;

    fn delete(&self, key: &[u8]) -> KvResult<()>;

    fn contains(&self, key: &[u8]) -> KvResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Number of entries. May be O(n) on some backends.
    fn len(&self) -> KvResult<u64>;

    fn is_empty(&self) -> KvResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Missing keys are omitted from the result, not reported as errors.
    fn bulk_get(&self, keys: &[Vec<u8>]) -> KvResult<HashMap<Vec<u8>, Vec<u8>>> {
        let mut out = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(key)? {
                out.insert(key.clone(), value);
            }
        }
        Ok(out)
    }

    fn bulk_put(&self, entries: &[(Vec<u8>, Vec<u8>)]) -> KvResult<usize> {
        let ops: Vec<BatchOp> = entries
            .iter()
            .map(|(k, v)| BatchOp::Put(k.clone(), v.clone()))
            .collect();
        self.apply_batch(&ops)?;
        Ok(ops.len())
    }

    fn bulk_delete(&self, keys: &[Vec<u8>]) -> KvResult<usize> {
        let ops: Vec<BatchOp> = keys.iter().map(|k| BatchOp::Delete(k.clone())).collect();
        self.apply_batch(&ops)?;
        Ok(ops.len())
    }

    /// Apply a mixed batch of puts/deletes as a single atomic unit. This is
    /// the primitive every bulk operation and the [`crate::transaction`]
    /// wrapper ultimately reduce to, so it is the one method every backend
    /// must provide a real (non-default) implementation of.
    fn apply_batch(&self, ops: &[BatchOp]) -> KvResult<()>;

    /// Backend primitive: yield `(key, value)` pairs with `lo <= hi` already
    /// guaranteed by the caller, both bounds inclusive when present.
    /// `reverse` only reverses iteration order, it does not reorder the
    /// bounds themselves. Callers with arbitrarily-ordered endpoints go
    /// through [`KvBackend::range`], not this method directly.
    fn range_raw<'a>(
        &'a self,
        lo: Option<&[u8]>,
        hi: Option<&[u8]>,
        reverse: bool,
    ) -> KvResult<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>>;

    /// The spec-facing range entry point. Canonicalizes `(start, stop,
    /// reverse)` through [`crate::slice::normalize`] before delegating to
    /// [`KvBackend::range_raw`], so an inverted request like
    /// `range(Some("cc2"), Some("aa0"), true)` resolves to the same
    /// `lo <= hi` scan `range_raw` requires, instead of reaching the
    /// backend mis-ordered.
    fn range<'a>(
        &'a self,
        start: Option<&[u8]>,
        stop: Option<&[u8]>,
        reverse: bool,
    ) -> KvResult<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>> {
        let step = if reverse { -1 } else { 1 };
        let slice = crate::slice::normalize(
            start.map(|s| s.to_vec()),
            stop.map(|s| s.to_vec()),
            step,
        )?;
        self.range_raw(slice.lo.as_deref(), slice.hi.as_deref(), slice.reverse)
    }

    /// Keys whose bytes begin with `prefix`, ascending, truncated to `limit`.
    fn prefix_match(&self, prefix: &[u8], limit: Option<usize>) -> KvResult<Vec<Vec<u8>>> {
        let upper = prefix_upper_bound(prefix);
        let iter = self.range(Some(prefix), upper.as_deref(), false)?;
        let mut out = Vec::new();
        for (k, _) in iter {
            if !k.starts_with(prefix) {
                continue;
            }
            out.push(k);
            if let Some(limit) = limit {
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
    }

    /// Optional capability; backends that cannot support it report
    /// [`crate::error::KvError::Backend`] and must advertise `regex: false`.
    fn regex_match(&self, _pattern: &str, _limit: Option<usize>) -> KvResult<Vec<Vec<u8>>> {
        Err(crate::error::KvError::Backend(
            "regex_match is not supported by this backend".to_string(),
        ))
    }

    /// Atomically add `delta` to the integer stored at `key` (initializing
    /// it to `initial` if absent) and return the new value.
    fn increment(&self, key: &[u8], delta: i64, initial: i64) -> KvResult<i64>;

    fn capabilities(&self) -> Capabilities;

    // -- cursor primitives, default-implemented on top of `range` --------

    fn first_entry(&self) -> KvResult<Option<(Vec<u8>, Vec<u8>)>> {
        Ok(self.range(None, None, false)?.next())
    }

    fn last_entry(&self) -> KvResult<Option<(Vec<u8>, Vec<u8>)>> {
        Ok(self.range(None, None, true)?.next())
    }

    /// Least key `>= key`.
    fn seek_ge(&self, key: &[u8]) -> KvResult<Option<(Vec<u8>, Vec<u8>)>> {
        Ok(self.range(Some(key), None, false)?.next())
    }

    /// Greatest key `<= key`.
    fn seek_le(&self, key: &[u8]) -> KvResult<Option<(Vec<u8>, Vec<u8>)>> {
        Ok(self.range(None, Some(key), true)?.next())
    }

    /// Least key strictly greater than `key`.
    fn next_after(&self, key: &[u8]) -> KvResult<Option<(Vec<u8>, Vec<u8>)>> {
        let mut iter = self.range(Some(key), None, false)?;
        match iter.next() {
            Some((k, _)) if k == key => Ok(iter.next()),
            other => Ok(other),
        }
    }

    /// Greatest key strictly less than `key`.
    fn prev_before(&self, key: &[u8]) -> KvResult<Option<(Vec<u8>, Vec<u8>)>> {
        let mut iter = self.range(None, Some(key), true)?;
        match iter.next() {
            Some((k, _)) if k == key => Ok(iter.next()),
            other => Ok(other),
        }
    }
}

/// Smallest byte string that sorts strictly after every string beginning
/// with `prefix`, or `None` if `prefix` is the all-0xFF string (no finite
/// upper bound exists, so callers must pass `None` through to `range`).
pub(crate) fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(&last) = upper.last() {
        if last == 0xFF {
            upper.pop();
        } else {
            *upper.last_mut().unwrap() += 1;
            return Some(upper);
        }
    }
    None
}
