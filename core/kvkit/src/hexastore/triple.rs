//! Triple storage: fan each `(s, p, o)` fact into all six permutation keys
//! and answer pattern queries by picking the permutation whose leading
//! terms are exactly the bound ones.

use crate::backend::{BatchOp, KvBackend};
use crate::error::{KvError, KvResult};
use serde::{Deserialize, Serialize};

/// A stored fact. Every term is a non-empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    pub s: String,
    pub p: String,
    pub o: String,
}

impl Triple {
    pub fn new(s: impl Into<String>, p: impl Into<String>, o: impl Into<String>) -> Self {
        Triple {
            s: s.into(),
            p: p.into(),
            o: o.into(),
        }
    }
}

/// The six permutations of `{s, p, o}`, each paired with the field order
/// it indexes by.
const PERMUTATIONS: [(&str, [usize; 3]); 6] = [
    ("spo", [0, 1, 2]),
    ("sop", [0, 2, 1]),
    ("pso", [1, 0, 2]),
    ("pos", [1, 2, 0]),
    ("osp", [2, 0, 1]),
    ("ops", [2, 1, 0]),
];

fn permutation_key(prefix: &str, perm: &str, values: &[&str; 3]) -> Vec<u8> {
    format!("{prefix}::{perm}::{}::{}::{}", values[0], values[1], values[2]).into_bytes()
}

/// The six keys a triple occupies.
pub(super) fn keys_for_triple(prefix: &str, triple: &Triple) -> [Vec<u8>; 6] {
    let terms = [triple.s.as_str(), triple.p.as_str(), triple.o.as_str()];
    std::array::from_fn(|i| {
        let (perm, order) = PERMUTATIONS[i];
        let values = [terms[order[0]], terms[order[1]], terms[order[2]]];
        permutation_key(prefix, perm, &values)
    })
}

pub(super) fn store_ops(prefix: &str, triple: &Triple) -> KvResult<Vec<BatchOp>> {
    let payload = serde_json::to_vec(triple)?;
    Ok(keys_for_triple(prefix, triple)
        .into_iter()
        .map(|key| BatchOp::Put(key, payload.clone()))
        .collect())
}

pub(super) fn delete_ops(prefix: &str, triple: &Triple) -> Vec<BatchOp> {
    keys_for_triple(prefix, triple)
        .into_iter()
        .map(BatchOp::Delete)
        .collect()
}

/// Pick the permutation whose leading terms are exactly the bound ones,
/// priority: all three -> `spo` direct get; s+p -> `spo`; s+o -> `sop`;
/// p+o -> `pos`; s -> `spo`; p -> `pso`; o -> `osp`.
pub(super) fn query(
    backend: &dyn KvBackend,
    prefix: &str,
    s: Option<&str>,
    p: Option<&str>,
    o: Option<&str>,
) -> KvResult<Vec<Triple>> {
    let (perm, bound): (&str, Vec<&str>) = match (s, p, o) {
        (Some(s), Some(p), Some(o)) => {
            let key = permutation_key(prefix, "spo", &[s, p, o]);
            return match backend.get(&key)? {
                Some(bytes) => Ok(vec![serde_json::from_slice(&bytes)?]),
                None => Ok(Vec::new()),
            };
        }
        (Some(s), Some(p), None) => ("spo", vec![s, p]),
        (Some(s), None, Some(o)) => ("sop", vec![s, o]),
        (None, Some(p), Some(o)) => ("pos", vec![p, o]),
        (Some(s), None, None) => ("spo", vec![s]),
        (None, Some(p), None) => ("pso", vec![p]),
        (None, None, Some(o)) => ("osp", vec![o]),
        (None, None, None) => {
            return Err(KvError::Type(
                "hexastore query requires at least one bound term".to_string(),
            ));
        }
    };

    let mut lo = format!("{prefix}::{perm}::");
    for term in &bound {
        lo.push_str(term);
        lo.push_str("::");
    }
    let iter = backend.range(Some(lo.as_bytes()), None, false)?;
    let mut out = Vec::new();
    for (key, value) in iter {
        if !key.starts_with(lo.as_bytes()) {
            break;
        }
        out.push(serde_json::from_slice::<Triple>(&value)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[test]
    fn keys_for_triple_covers_all_six_permutations() {
        let triple = Triple::new("a", "b", "c");
        let keys = keys_for_triple("", &triple);
        let mut perms: Vec<&str> = keys
            .iter()
            .map(|k| std::str::from_utf8(k).unwrap().split("::").nth(1).unwrap())
            .collect();
        perms.sort();
        assert_eq!(perms, vec!["ops", "osp", "pos", "pso", "sop", "spo"]);
    }

    #[test]
    fn store_then_full_query_gets_single_fact() {
        let backend = MemoryBackend::new();
        let triple = Triple::new("charlie", "likes", "huey");
        backend.apply_batch(&store_ops("", &triple).unwrap()).unwrap();
        let got = query(&backend, "", Some("charlie"), Some("likes"), Some("huey")).unwrap();
        assert_eq!(got, vec![triple]);
    }

    #[test]
    fn partial_query_scans_matching_prefix() {
        let backend = MemoryBackend::new();
        for (s, p, o) in [
            ("charlie", "likes", "huey"),
            ("charlie", "likes", "mickey"),
            ("charlie", "likes", "zaizee"),
        ] {
            let triple = Triple::new(s, p, o);
            backend.apply_batch(&store_ops("", &triple).unwrap()).unwrap();
        }
        let got = query(&backend, "", Some("charlie"), Some("likes"), None).unwrap();
        assert_eq!(got.len(), 3);
    }
}
