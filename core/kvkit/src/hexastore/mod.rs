//! Hexastore: a triple store that indexes `(subject, predicate, object)`
//! facts across all six permutations and answers conjunctive pattern
//! queries with variables.

mod search;
mod triple;

pub use search::{cond, Condition, Term, Variable};
pub use triple::Triple;

use crate::backend::KvBackend;
use crate::error::KvResult;
use std::collections::{HashMap, HashSet};

/// A triple store layered over one backend, under an optional key prefix
/// (useful for namespacing several hexastores in one backend).
pub struct Hexastore<'a> {
    backend: &'a dyn KvBackend,
    prefix: String,
}

impl<'a> Hexastore<'a> {
    pub fn new(backend: &'a dyn KvBackend) -> Self {
        Hexastore {
            backend,
            prefix: String::new(),
        }
    }

    pub fn with_prefix(backend: &'a dyn KvBackend, prefix: impl Into<String>) -> Self {
        Hexastore {
            backend,
            prefix: prefix.into(),
        }
    }

    /// Build a named variable for use in [`Hexastore::search`] conditions.
    pub fn var(name: impl Into<String>) -> Variable {
        Variable::new(name)
    }

    /// Store one fact under all six permutation keys, in a single atomic
    /// batch.
    pub fn store(&self, s: impl Into<String>, p: impl Into<String>, o: impl Into<String>) -> KvResult<()> {
        let t = Triple::new(s, p, o);
        self.backend.apply_batch(&triple::store_ops(&self.prefix, &t)?)
    }

    /// Store many facts as one atomic batch.
    pub fn store_many(&self, items: impl IntoIterator<Item = Triple>) -> KvResult<()> {
        let mut ops = Vec::new();
        for item in items {
            ops.extend(triple::store_ops(&self.prefix, &item)?);
        }
        self.backend.apply_batch(&ops)
    }

    /// Remove all six permutation keys for a fact.
    pub fn delete(&self, s: &str, p: &str, o: &str) -> KvResult<()> {
        let t = Triple::new(s, p, o);
        self.backend.apply_batch(&triple::delete_ops(&self.prefix, &t))
    }

    /// Query by an optional `(s?, p?, o?)` pattern; at least one term must
    /// be bound.
    pub fn query(&self, s: Option<&str>, p: Option<&str>, o: Option<&str>) -> KvResult<Vec<Triple>> {
        triple::query(self.backend, &self.prefix, s, p, o)
    }

    /// Conjunctive search over a sequence of conditions, some of whose
    /// terms may be [`Variable`]s built via [`Hexastore::var`].
    pub fn search(&self, conditions: &[Condition]) -> KvResult<HashMap<String, HashSet<String>>> {
        search::search(self.backend, &self.prefix, conditions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[test]
    fn store_and_query_roundtrip() {
        let backend = MemoryBackend::new();
        let hx = Hexastore::new(&backend);
        hx.store("charlie", "likes", "huey").unwrap();
        let got = hx.query(Some("charlie"), Some("likes"), Some("huey")).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0], Triple::new("charlie", "likes", "huey"));
    }

    #[test]
    fn query_symmetry_across_bound_subsets() {
        let backend = MemoryBackend::new();
        let hx = Hexastore::new(&backend);
        hx.store("huey", "is", "cat").unwrap();

        assert_eq!(hx.query(Some("huey"), Some("is"), None).unwrap().len(), 1);
        assert_eq!(hx.query(Some("huey"), None, Some("cat")).unwrap().len(), 1);
        assert_eq!(hx.query(None, Some("is"), Some("cat")).unwrap().len(), 1);
        assert_eq!(hx.query(Some("huey"), None, None).unwrap().len(), 1);
        assert_eq!(hx.query(None, Some("is"), None).unwrap().len(), 1);
        assert_eq!(hx.query(None, None, Some("cat")).unwrap().len(), 1);
    }

    #[test]
    fn delete_removes_all_six_permutations() {
        let backend = MemoryBackend::new();
        let hx = Hexastore::new(&backend);
        hx.store("a", "b", "c").unwrap();
        hx.delete("a", "b", "c").unwrap();
        assert!(hx.query(Some("a"), Some("b"), Some("c")).unwrap().is_empty());
        assert_eq!(backend.len().unwrap(), 0);
    }

    #[test]
    fn search_delegates_to_conjunctive_resolver() {
        let backend = MemoryBackend::new();
        let hx = Hexastore::new(&backend);
        hx.store("charlie", "likes", "huey").unwrap();
        hx.store("huey", "is", "cat").unwrap();
        let x = Hexastore::var("X");
        let result = hx
            .search(&[cond("charlie", "likes", x.clone()), cond(x, "is", "cat")])
            .unwrap();
        assert_eq!(
            result.get("X").cloned().unwrap_or_default(),
            HashSet::from(["huey".to_string()])
        );
    }
}
