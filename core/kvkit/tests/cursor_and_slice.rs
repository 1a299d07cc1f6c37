//! Scenario 4: reverse range scans over raw byte keys.

use kvkit::{Cursor, KvBackend, MemoryBackend};

fn populated() -> MemoryBackend {
    let backend = MemoryBackend::new();
    for key in ["aa", "aa1", "aa2", "bb", "cc", "dd", "ee", "ff"] {
        backend.put(key.as_bytes(), b"v").unwrap();
    }
    backend
}

#[test]
fn reverse_range_yields_descending_inclusive_bounds() {
    let backend = populated();
    let got: Vec<String> = backend
        .range(Some(b"aa0"), Some(b"cc2"), true)
        .unwrap()
        .map(|(k, _)| String::from_utf8(k).unwrap())
        .collect();
    assert_eq!(got, vec!["cc", "bb", "aa2", "aa1"]);
}

#[test]
fn reverse_cursor_fetch_until_matches_range_order() {
    let backend = populated();
    let mut cursor = Cursor::new(&backend, true).unwrap();
    cursor.seek(b"cc2").unwrap();
    let got = cursor.fetch_until(b"aa1").unwrap();
    let keys: Vec<String> = got
        .into_iter()
        .map(|(k, _)| String::from_utf8(k).unwrap())
        .collect();
    assert_eq!(keys, vec!["cc", "bb", "aa2", "aa1"]);
}

#[test]
fn reverse_range_accepts_endpoints_given_in_either_order() {
    let backend = populated();
    let got: Vec<String> = backend
        .range(Some(b"cc2"), Some(b"aa0"), true)
        .unwrap()
        .map(|(k, _)| String::from_utf8(k).unwrap())
        .collect();
    assert_eq!(got, vec!["cc", "bb", "aa2", "aa1"]);
}

#[test]
fn forward_range_is_inclusive_both_ends() {
    let backend = populated();
    let got: Vec<String> = backend
        .range(Some(b"aa1"), Some(b"cc"), false)
        .unwrap()
        .map(|(k, _)| String::from_utf8(k).unwrap())
        .collect();
    assert_eq!(got, vec!["aa1", "aa2", "bb", "cc"]);
}
