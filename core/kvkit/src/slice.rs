//! Canonicalize forward/reverse range requests before they reach a backend.
//!
//! [`KvBackend::range`](crate::backend::KvBackend::range) runs every
//! `(start, stop, reverse)` request through [`normalize`] before delegating
//! to a backend's `range_raw`, so backends only ever see a single canonical
//! `lo <= hi` shape regardless of how the caller ordered its endpoints.

use crate::error::{KvError, KvResult};

/// A normalized slice request: `lo <= hi` when both are present, plus the
/// scan direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub lo: Option<Vec<u8>>,
    pub hi: Option<Vec<u8>>,
    pub reverse: bool,
}

/// Produce a canonical `(lo, hi, reverse)` from a user-supplied
/// `(start, stop, step)` tuple, where `step < 0` requests reverse order the
/// way a Python slice's negative step would.
///
/// - If only one endpoint is given and `step` requests reverse, the single
///   endpoint becomes `hi` (scan descends from it); otherwise it becomes `lo`.
/// - If both endpoints are given and `start > stop`, reverse is inferred
///   regardless of `step`, and the pair is swapped so `lo <= hi`.
/// - If neither endpoint is given, the whole store is scanned in the
///   requested direction.
pub fn normalize(
    start: Option<Vec<u8>>,
    stop: Option<Vec<u8>>,
    step: i64,
) -> KvResult<Slice> {
    if step == 0 {
        return Err(KvError::Range("slice step must not be zero".to_string()));
    }
    let reverse_requested = step < 0;

    match (start, stop) {
        (Some(a), Some(b)) => {
            if a > b {
                Ok(Slice {
                    lo: Some(b),
                    hi: Some(a),
                    reverse: true,
                })
            } else {
                Ok(Slice {
                    lo: Some(a),
                    hi: Some(b),
                    reverse: reverse_requested,
                })
            }
        }
        (Some(a), None) => {
            if reverse_requested {
                Ok(Slice {
                    lo: None,
                    hi: Some(a),
                    reverse: true,
                })
            } else {
                Ok(Slice {
                    lo: Some(a),
                    hi: None,
                    reverse: false,
                })
            }
        }
        (None, Some(b)) => {
            if reverse_requested {
                Ok(Slice {
                    lo: Some(b),
                    hi: None,
                    reverse: true,
                })
            } else {
                Ok(Slice {
                    lo: None,
                    hi: Some(b),
                    reverse: false,
                })
            }
        }
        (None, None) => Ok(Slice {
            lo: None,
            hi: None,
            reverse: reverse_requested,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_endpoints_forward() {
        let s = normalize(Some(b"a".to_vec()), Some(b"z".to_vec()), 1).unwrap();
        assert_eq!(s.lo, Some(b"a".to_vec()));
        assert_eq!(s.hi, Some(b"z".to_vec()));
        assert!(!s.reverse);
    }

    #[test]
    fn inverted_endpoints_infer_reverse_regardless_of_step() {
        let s = normalize(Some(b"z".to_vec()), Some(b"a".to_vec()), 1).unwrap();
        assert_eq!(s.lo, Some(b"a".to_vec()));
        assert_eq!(s.hi, Some(b"z".to_vec()));
        assert!(s.reverse);
    }

    #[test]
    fn single_lower_endpoint_with_negative_step_becomes_upper_bound() {
        let s = normalize(Some(b"m".to_vec()), None, -1).unwrap();
        assert_eq!(s.lo, None);
        assert_eq!(s.hi, Some(b"m".to_vec()));
        assert!(s.reverse);
    }

    #[test]
    fn no_endpoints_scans_everything_in_requested_direction() {
        let s = normalize(None, None, -1).unwrap();
        assert_eq!(s.lo, None);
        assert_eq!(s.hi, None);
        assert!(s.reverse);
    }

    #[test]
    fn zero_step_is_rejected() {
        assert!(normalize(Some(b"a".to_vec()), None, 0).is_err());
    }
}
