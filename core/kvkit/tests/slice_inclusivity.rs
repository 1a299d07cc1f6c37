//! Property test for the universal "slice inclusivity" property from
//! SPEC_FULL.md §8: for any stored keys and any endpoints a <= b,
//! `range(a,b,false)` yields exactly `{k : a <= k <= b}` ascending, and
//! `range(b,a,true)` yields the same set descending.

use kvkit::{KvBackend, MemoryBackend};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn byte_key() -> impl Strategy<Value = u8> {
    any::<u8>()
}

proptest! {
    #[test]
    fn forward_and_reverse_ranges_agree_on_the_inclusive_set(
        keys in prop::collection::btree_set(byte_key(), 0..20),
        a in byte_key(),
        b in byte_key(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let backend = MemoryBackend::new();
        for k in &keys {
            backend.put(&[*k], b"v").unwrap();
        }

        let expected: Vec<u8> = keys.iter().copied().filter(|k| *k >= lo && *k <= hi).collect();

        let forward: Vec<u8> = backend
            .range(Some(&[lo]), Some(&[hi]), false)
            .unwrap()
            .map(|(k, _)| k[0])
            .collect();
        prop_assert_eq!(&forward, &expected);

        let reverse: Vec<u8> = backend
            .range(Some(&[lo]), Some(&[hi]), true)
            .unwrap()
            .map(|(k, _)| k[0])
            .collect();
        let expected_rev: Vec<u8> = expected.iter().rev().copied().collect();
        prop_assert_eq!(reverse, expected_rev);

        let as_set: BTreeSet<u8> = forward.iter().copied().collect();
        prop_assert_eq!(as_set.len(), forward.len());
    }
}
