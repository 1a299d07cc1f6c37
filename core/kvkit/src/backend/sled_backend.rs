//! Thin adapter over a `sled::Tree`, for persistence across process
//! restarts. Range scans, atomic increment and transactions are delegated
//! directly to `sled`; this module does not attempt to out-innovate it.

use super::{BatchOp, Capabilities, KvBackend};
use crate::error::KvResult;
use std::path::Path;

/// The handful of `sled::Config` knobs this toolkit's users plausibly want,
/// threaded through [`SledBackend::open`] as one typed struct rather than
/// scattered as bare parameters.
#[derive(Debug, Clone)]
pub struct SledOptions {
    /// Size, in bytes, of sled's in-memory page cache. Default: 1 GiB,
    /// matching `sled::Config`'s own default.
    pub cache_capacity: u64,
    /// How often sled flushes to disk, in milliseconds. `None` disables
    /// the background flush thread and relies on sled's own defaults.
    pub flush_every_ms: Option<i64>,
    /// Open the database in a temporary directory that is deleted when the
    /// returned `sled::Db` is dropped. Useful for tests.
    pub temporary: bool,
}

impl Default for SledOptions {
    fn default() -> Self {
        Self {
            cache_capacity: 1024 * 1024 * 1024,
            flush_every_ms: Some(500),
            temporary: false,
        }
    }
}

/// Persistent backend over a single `sled::Tree`.
pub struct SledBackend {
    tree: sled::Tree,
}

impl SledBackend {
    pub fn open(path: &Path, options: SledOptions) -> KvResult<Self> {
        let mut config = sled::Config::new()
            .path(path)
            .cache_capacity(options.cache_capacity)
            .temporary(options.temporary);
        if let Some(ms) = options.flush_every_ms {
            config = config.flush_every_ms(Some(ms));
        }
        let db = config.open()?;
        let tree = db.open_tree("kvkit")?;
        Ok(Self { tree })
    }

    /// Open a scratch database in a fresh temporary directory, deleted on
    /// drop. Intended for tests and examples.
    pub fn open_temporary() -> KvResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        let tree = db.open_tree("kvkit")?;
        Ok(Self { tree })
    }
}

impl KvBackend for SledBackend {
    fn get(&self, key: &[u8]) -> KvResult<Option<Vec<u8>>> {
        Ok(self.tree.get(key)?.map(|ivec| ivec.to_vec()))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> KvResult<()> {
        self.tree.insert(key, value)?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> KvResult<()> {
        self.tree.remove(key)?;
        Ok(())
    }

    fn len(&self) -> KvResult<u64> {
        Ok(self.tree.len() as u64)
    }

    fn apply_batch(&self, ops: &[BatchOp]) -> KvResult<()> {
        let mut batch = sled::Batch::default();
        for op in ops {
            match op {
                BatchOp::Put(k, v) => batch.insert(k.as_slice(), v.as_slice()),
                BatchOp::Delete(k) => batch.remove(k.as_slice()),
            }
        }
        self.tree.apply_batch(batch)?;
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
                return Err(crate::error::KvError::Range(
                    "range_raw requires lo <= hi; callers with unordered endpoints should use range()".to_string(),
                ));
            }
        }
        let iter: sled::Iter = match (start, stop) {
            (Some(s), Some(e)) => self.tree.range(s.to_vec()..=e.to_vec()),
            (Some(s), None) => self.tree.range(s.to_vec()..),
            (None, Some(e)) => self.tree.range(..=e.to_vec()),
            (None, None) => self.tree.iter(),
        };
        let mapped = iter.filter_map(|res| res.ok().map(|(k, v)| (k.to_vec(), v.to_vec())));
        let boxed: Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a> = if reverse {
            Box::new(mapped.collect::<Vec<_>>().into_iter().rev())
        } else {
            Box::new(mapped)
        };
        Ok(boxed)
    }

    fn increment(&self, key: &[u8], delta: i64, initial: i64) -> KvResult<i64> {
        let result = self
            .tree
            .update_and_fetch(key, |old| {
                let current = match old {
                    Some(bytes) if bytes.len() == 8 => {
                        i64::from_be_bytes(bytes.try_into().unwrap())
                    }
                    _ => initial,
                };
                Some((current + delta).to_be_bytes().to_vec())
            })?
            .expect("update_and_fetch closure always returns Some");
        let arr: [u8; 8] = result.as_ref().try_into().unwrap();
        Ok(i64::from_be_bytes(arr))
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            regex: false,
            transactions: true,
            atomic_increment: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_put_delete_roundtrip() {
        let backend = SledBackend::open_temporary().unwrap();
        backend.put(b"a", b"1").unwrap();
        assert_eq!(backend.get(b"a").unwrap(), Some(b"1".to_vec()));
        backend.delete(b"a").unwrap();
        assert_eq!(backend.get(b"a").unwrap(), None);
    }

    #[test]
    fn increment_defaults_and_accumulates() {
        let backend = SledBackend::open_temporary().unwrap();
        assert_eq!(backend.increment(b"seq", 1, 0).unwrap(), 1);
        assert_eq!(backend.increment(b"seq", 1, 0).unwrap(), 2);
    }

    #[test]
    fn range_reverse_descends() {
        let backend = SledBackend::open_temporary().unwrap();
        for k in ["aa", "bb", "cc", "dd"] {
            backend.put(k.as_bytes(), b"v").unwrap();
        }
        let got: Vec<Vec<u8>> = backend
            .range(Some(b"aa"), Some(b"dd"), true)
            .unwrap()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(
            got,
            vec![b"dd".to_vec(), b"cc".to_vec(), b"bb".to_vec(), b"aa".to_vec()]
        );
    }
}
