//! Order-preserving byte encodings for typed field values.
//!
//! Every codec is a total function `value ⇌ bytes`. Encoding `null`/absent
//! always produces the empty byte string, which sorts before every
//! non-empty encoding, so missing values always come first in an ascending
//! index scan.
//!
//! Integers and floats use the standard sign-bit-flip bijection rather than
//! the source library's plain big-endian encoding, which is not
//! lexicographically monotonic for negative values (see DESIGN.md).

use crate::error::{KvError, KvResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A dynamically-typed field value, the common currency between the model
/// layer's typed accessors and the generic index/codec machinery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bytes(Vec<u8>),
    Long(i64),
    Float(f64),
    Date(String),
    DateTime(String),
}

/// The field types `#[derive(Model)]` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Long,
    Float,
    Date,
    DateTime,
}

impl FieldKind {
    pub fn encode(self, value: &Value) -> KvResult<Vec<u8>> {
        if matches!(value, Value::Null) {
            return Ok(Vec::new());
        }
        match (self, value) {
            (FieldKind::String, Value::Bytes(b)) => Ok(b.clone()),
            (FieldKind::Long, Value::Long(v)) => Ok(encode_long(*v)),
            (FieldKind::Float, Value::Float(v)) => Ok(encode_float(*v)),
            (FieldKind::Date, Value::Date(s)) => Ok(encode_date(s)?),
            (FieldKind::DateTime, Value::DateTime(s)) => Ok(encode_datetime(s)?),
            (kind, value) => Err(KvError::Type(format!(
                "cannot encode {value:?} as field kind {kind:?}"
            ))),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> KvResult<Value> {
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        match self {
            FieldKind::String => Ok(Value::Bytes(bytes.to_vec())),
            FieldKind::Long => Ok(Value::Long(decode_long(bytes)?)),
            FieldKind::Float => Ok(Value::Float(decode_float(bytes)?)),
            FieldKind::Date => Ok(Value::Date(decode_utf8(bytes)?)),
            FieldKind::DateTime => Ok(Value::DateTime(decode_utf8(bytes)?)),
        }
    }
}

/// Flip the sign bit so two's-complement ordering matches numeric ordering:
/// non-negative values get their high bit set, negative values get it
/// cleared, so `i64::MIN` sorts first and `i64::MAX` sorts last.
pub fn encode_long(v: i64) -> Vec<u8> {
    let flipped = (v as u64) ^ (1u64 << 63);
    flipped.to_be_bytes().to_vec()
}

pub fn decode_long(bytes: &[u8]) -> KvResult<i64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| KvError::Type(format!("Long field expects 8 bytes, got {}", bytes.len())))?;
    let flipped = u64::from_be_bytes(arr) ^ (1u64 << 63);
    Ok(flipped as i64)
}

/// IEEE-754 monotonic bit transform: flip the sign bit for non-negative
/// values, flip every bit for negative values. This makes unsigned
/// big-endian byte order match numeric order across the full domain
/// (NaN excluded, as in every other ordered-float scheme).
pub fn encode_float(v: f64) -> Vec<u8> {
    let bits = v.to_bits();
    let transformed = if bits & (1u64 << 63) == 0 {
        bits | (1u64 << 63)
    } else {
        !bits
    };
    transformed.to_be_bytes().to_vec()
}

pub fn decode_float(bytes: &[u8]) -> KvResult<f64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| KvError::Type(format!("Float field expects 8 bytes, got {}", bytes.len())))?;
    let transformed = u64::from_be_bytes(arr);
    let bits = if transformed & (1u64 << 63) != 0 {
        transformed & !(1u64 << 63)
    } else {
        !transformed
    };
    Ok(f64::from_bits(bits))
}

pub fn encode_date(s: &str) -> KvResult<Vec<u8>> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| KvError::Type(format!("invalid Date {s:?}: {e}")))?;
    Ok(s.as_bytes().to_vec())
}

pub fn encode_datetime(s: &str) -> KvResult<Vec<u8>> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| KvError::Type(format!("invalid DateTime {s:?}: {e}")))?;
    Ok(s.as_bytes().to_vec())
}

fn decode_utf8(bytes: &[u8]) -> KvResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| KvError::Type(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_roundtrip_preserves_order() {
        let values = [i64::MIN, -1000, -1, 0, 1, 1000, i64::MAX];
        let encoded: Vec<Vec<u8>> = values.iter().map(|v| encode_long(*v)).collect();
        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted, "byte order must match numeric order");
        for (v, enc) in values.iter().zip(&encoded) {
            assert_eq!(decode_long(enc).unwrap(), *v);
        }
    }

    #[test]
    fn float_roundtrip_preserves_order() {
        let values = [f64::MIN, -1.5, -0.0, 0.0, 1.5, f64::MAX];
        let encoded: Vec<Vec<u8>> = values.iter().map(|v| encode_float(*v)).collect();
        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
        for (v, enc) in values.iter().zip(&encoded) {
            assert_eq!(decode_float(enc).unwrap(), *v);
        }
    }

    #[test]
    fn null_encodes_to_empty_and_sorts_first() {
        assert_eq!(FieldKind::Long.encode(&Value::Null).unwrap(), Vec::<u8>::new());
        assert!(Vec::<u8>::new() < encode_long(i64::MIN));
    }

    #[test]
    fn date_rejects_malformed_input() {
        assert!(encode_date("not-a-date").is_err());
        assert!(encode_date("2024-01-15").is_ok());
    }

    #[test]
    fn string_codec_is_identity() {
        let v = Value::Bytes(b"hello".to_vec());
        let encoded = FieldKind::String.encode(&v).unwrap();
        assert_eq!(encoded, b"hello");
        assert_eq!(FieldKind::String.decode(&encoded).unwrap(), v);
    }

    proptest::proptest! {
        #[test]
        fn prop_long_roundtrip(v: i64) {
            let enc = encode_long(v);
            proptest::prop_assert_eq!(decode_long(&enc).unwrap(), v);
        }

        #[test]
        fn prop_float_roundtrip(v: f64) {
            let enc = encode_float(v);
            let back = decode_float(&enc).unwrap();
            if v.is_nan() {
                proptest::prop_assert!(back.is_nan());
            } else {
                proptest::prop_assert_eq!(back, v);
            }
        }

        #[test]
        fn prop_long_order_preserving(a: i64, b: i64) {
            let ea = encode_long(a);
            let eb = encode_long(b);
            proptest::prop_assert_eq!(a.cmp(&b), ea.cmp(&eb));
        }
    }
}
