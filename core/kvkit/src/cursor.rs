//! Stateful bidirectional scan with bounded fetch, modeled on the source's
//! `Cursor` wrapper over a B+-tree cursor: `next`/`previous` are raw,
//! direction-agnostic single steps; the `Iterator` impl combines stepping
//! with the cursor's own orientation, matching the source's `__next__`.

use crate::backend::KvBackend;
use crate::error::KvResult;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Unpositioned,
    Positioned(Vec<u8>, Vec<u8>),
    Exhausted,
}

/// A scoped cursor over a backend. Acquisition positions at the first entry
/// (forward orientation) or the last entry (reverse orientation); there is
/// no explicit release step beyond letting the cursor drop, since it holds
/// no backend resource of its own (every step re-queries the backend).
pub struct Cursor<'a> {
    backend: &'a dyn KvBackend,
    reverse: bool,
    state: State,
}

impl<'a> Cursor<'a> {
    pub fn new(backend: &'a dyn KvBackend, reverse: bool) -> KvResult<Self> {
        let mut cursor = Cursor {
            backend,
            reverse,
            state: State::Unpositioned,
        };
        if reverse {
            cursor.last()?;
        } else {
            cursor.first()?;
        }
        Ok(cursor)
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    fn set_state(&mut self, entry: Option<(Vec<u8>, Vec<u8>)>) -> &mut Self {
        self.state = match entry {
            Some((k, v)) => State::Positioned(k, v),
            None => State::Exhausted,
        };
        self
    }

    pub fn first(&mut self) -> KvResult<()> {
        let entry = self.backend.first_entry()?;
        self.set_state(entry);
        Ok(())
    }

    pub fn last(&mut self) -> KvResult<()> {
        let entry = self.backend.last_entry()?;
        self.set_state(entry);
        Ok(())
    }

    /// Forward cursors resume at the least key >= `key`; reverse cursors
    /// resume at the greatest key <= `key`.
    pub fn seek(&mut self, key: &[u8]) -> KvResult<()> {
        let entry = if self.reverse {
            self.backend.seek_le(key)?
        } else {
            self.backend.seek_ge(key)?
        };
        self.set_state(entry);
        Ok(())
    }

    /// Raw forward step, independent of the cursor's orientation.
    pub fn next(&mut self) -> KvResult<()> {
        let entry = match &self.state {
            State::Positioned(k, _) => self.backend.next_after(k)?,
            State::Unpositioned => self.backend.first_entry()?,
            State::Exhausted => None,
        };
        self.set_state(entry);
        Ok(())
    }

    /// Raw backward step, independent of the cursor's orientation.
    pub fn previous(&mut self) -> KvResult<()> {
        let entry = match &self.state {
            State::Positioned(k, _) => self.backend.prev_before(k)?,
            State::Unpositioned => self.backend.last_entry()?,
            State::Exhausted => None,
        };
        self.set_state(entry);
        Ok(())
    }

    pub fn get(&self) -> Option<(&[u8], &[u8])> {
        match &self.state {
            State::Positioned(k, v) => Some((k.as_slice(), v.as_slice())),
            _ => None,
        }
    }

    /// Overwrite the value at the current position.
    pub fn set(&mut self, value: &[u8]) -> KvResult<()> {
        let key = match &self.state {
            State::Positioned(k, _) => k.clone(),
            _ => return Ok(()),
        };
        self.backend.put(&key, value)?;
        self.state = State::Positioned(key, value.to_vec());
        Ok(())
    }

    /// Delete the entry at the current position without moving the cursor.
    pub fn remove(&mut self) -> KvResult<()> {
        if let State::Positioned(k, _) = &self.state {
            self.backend.delete(k)?;
        }
        Ok(())
    }

    /// Remove the current entry and return it, advancing to the next
    /// logical entry in the cursor's scan direction.
    pub fn seize(&mut self) -> KvResult<Option<(Vec<u8>, Vec<u8>)>> {
        let current = match &self.state {
            State::Positioned(k, v) => Some((k.clone(), v.clone())),
            _ => None,
        };
        if let Some((k, _)) = &current {
            self.backend.delete(k)?;
            let next = if self.reverse {
                self.backend.prev_before(k)?
            } else {
                self.backend.next_after(k)?
            };
            self.set_state(next);
        }
        Ok(current)
    }

    /// Yield up to `n` entries, advancing in the cursor's scan direction.
    pub fn fetch_count(&mut self, n: usize) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            match self.advance_and_yield()? {
                Some(entry) => out.push(entry),
                None => break,
            }
        }
        Ok(out)
    }

    /// Yield entries while `current` is "before or equal" to `end` in the
    /// cursor's scan direction (`<=` forward, `>=` reverse), including the
    /// boundary entry if its key equals `end`, then stop.
    pub fn fetch_until(&mut self, end: &[u8]) -> KvResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        loop {
            let within_bound = match self.get() {
                Some((k, _)) => {
                    if self.reverse {
                        k >= end
                    } else {
                        k <= end
                    }
                }
                None => false,
            };
            if !within_bound {
                break;
            }
            let at_boundary = self.get().map(|(k, _)| k == end).unwrap_or(false);
            match self.advance_and_yield()? {
                Some(entry) => out.push(entry),
                None => break,
            }
            if at_boundary {
                break;
            }
        }
        Ok(out)
    }

    /// Combines `get` with a direction-aware step, matching the source's
    /// iterator protocol: forward cursors call `next`, reverse cursors call
    /// `previous`.
    fn advance_and_yield(&mut self) -> KvResult<Option<(Vec<u8>, Vec<u8>)>> {
        let current = match self.get() {
            Some((k, v)) => (k.to_vec(), v.to_vec()),
            None => return Ok(None),
        };
        if self.reverse {
            self.previous()?;
        } else {
            self.next()?;
        }
        Ok(Some(current))
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        self.advance_and_yield().ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn populated() -> MemoryBackend {
        let backend = MemoryBackend::new();
        for k in ["aa", "bb", "cc", "dd", "ee"] {
            backend.put(k.as_bytes(), k.as_bytes()).unwrap();
        }
        backend
    }

    #[test]
    fn forward_cursor_starts_at_first() {
        let backend = populated();
        let cursor = Cursor::new(&backend, false).unwrap();
        assert_eq!(cursor.get(), Some((&b"aa"[..], &b"aa"[..])));
    }

    #[test]
    fn reverse_cursor_starts_at_last() {
        let backend = populated();
        let cursor = Cursor::new(&backend, true).unwrap();
        assert_eq!(cursor.get(), Some((&b"ee"[..], &b"ee"[..])));
    }

    #[test]
    fn seek_forward_lands_on_least_key_ge_target() {
        let backend = populated();
        let mut cursor = Cursor::new(&backend, false).unwrap();
        cursor.seek(b"bz").unwrap();
        assert_eq!(cursor.get().map(|(k, _)| k.to_vec()), Some(b"cc".to_vec()));
    }

    #[test]
    fn seek_reverse_lands_on_greatest_key_le_target() {
        let backend = populated();
        let mut cursor = Cursor::new(&backend, true).unwrap();
        cursor.seek(b"bz").unwrap();
        assert_eq!(cursor.get().map(|(k, _)| k.to_vec()), Some(b"bb".to_vec()));
    }

    #[test]
    fn iterator_consumes_in_scan_direction() {
        let backend = populated();
        let cursor = Cursor::new(&backend, false).unwrap();
        let keys: Vec<Vec<u8>> = cursor.map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                b"aa".to_vec(),
                b"bb".to_vec(),
                b"cc".to_vec(),
                b"dd".to_vec(),
                b"ee".to_vec(),
            ]
        );
    }

    #[test]
    fn fetch_count_bounds_results() {
        let backend = populated();
        let mut cursor = Cursor::new(&backend, false).unwrap();
        let got = cursor.fetch_count(2).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].0, b"aa");
        assert_eq!(got[1].0, b"bb");
    }

    #[test]
    fn fetch_until_includes_boundary() {
        let backend = populated();
        let mut cursor = Cursor::new(&backend, false).unwrap();
        let got = cursor.fetch_until(b"cc").unwrap();
        let keys: Vec<Vec<u8>> = got.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"aa".to_vec(), b"bb".to_vec(), b"cc".to_vec()]);
    }

    #[test]
    fn remove_deletes_without_moving() {
        let backend = populated();
        let mut cursor = Cursor::new(&backend, false).unwrap();
        cursor.remove().unwrap();
        assert_eq!(backend.get(b"aa").unwrap(), None);
        assert_eq!(cursor.get().map(|(k, _)| k.to_vec()), Some(b"aa".to_vec()));
    }

    #[test]
    fn seize_removes_and_advances() {
        let backend = populated();
        let mut cursor = Cursor::new(&backend, false).unwrap();
        let popped = cursor.seize().unwrap();
        assert_eq!(popped, Some((b"aa".to_vec(), b"aa".to_vec())));
        assert_eq!(backend.get(b"aa").unwrap(), None);
        assert_eq!(cursor.get().map(|(k, _)| k.to_vec()), Some(b"bb".to_vec()));
    }
}
