//! In-process ordered map backend, always compiled in. The default for
//! tests and examples.

use super::{BatchOp, Capabilities, KvBackend};
use crate::error::{KvError, KvResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;

/// A lock-protected `BTreeMap<Vec<u8>, Vec<u8>>`. `apply_batch` holds the
/// write lock for the whole batch, which is what makes `bulk_put`/
/// `bulk_delete`/transactions atomic on this backend.
pub struct MemoryBackend {
    map: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            map: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn bounds(start: Option<&[u8]>, stop: Option<&[u8]>) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let lo = match start {
        Some(s) => Bound::Included(s.to_vec()),
        None => Bound::Unbounded,
    };
    let hi = match stop {
        Some(s) => Bound::Included(s.to_vec()),
        None => Bound::Unbounded,
    };
    (lo, hi)
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.map.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        self.map.write().remove(key);
        Ok(())
    }

    fn len(&self) -> KvResult<u64> {
        Ok(self.map.read().len() as u64)
    }

    fn apply_batch(&self, ops: &[BatchOp]) -> KvResult<()> {
        let mut map = self.map.write();
        for op in ops {
            match op {
                BatchOp::Put(k, v) => {
                    map.insert(k.clone(), v.clone());
                }
                BatchOp::Delete(k) => {
                    map.remove(k);
                }
            }
        }
        Ok(())
    }

    fn range_raw<'a>(
        &'a self,
        start: Option<&[u8]>,
        stop: Option<&[u8]>,
        reverse: bool,
    ) -> KvResult<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a>> {
        if let (Some(s), Some(e)) = (start, stop) {
            if s > e {
                return Err(KvError::Range(
                    "range_raw requires lo <= hi; callers with unordered endpoints should use range()".to_string(),
                ));
            }
        }
        let (lo, hi) = bounds(start, stop);
        let guard = self.map.read();
        let snapshot: Vec<(Vec<u8>, Vec<u8>)> = guard
            .range((lo, hi))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let iter: Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)>> = if reverse {
            Box::new(snapshot.into_iter().rev())
        } else {
            Box::new(snapshot.into_iter())
        };
        Ok(iter)
    }

    fn increment(&self, key: &[u8], delta: i64, initial: i64) -> KvResult<i64> {
        let mut map = self.map.write();
        let current = match map.get(key) {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    KvError::Type(format!("id sequence key is not an 8-byte integer: {key:?}"))
                })?;
                i64::from_be_bytes(arr)
            }
            None => initial,
        };
        let next = current + delta;
        map.insert(key.to_vec(), next.to_be_bytes().to_vec());
        Ok(next)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            regex: false,
            transactions: true,
            atomic_increment: true,
        }
    }
}
