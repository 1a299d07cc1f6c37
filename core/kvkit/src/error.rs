//! Error types for kvkit.
//!
//! All public APIs return `KvResult<T>` — no panics in library code.

use thiserror::Error;

/// Unified error type for all kvkit operations.
#[derive(Debug, Error)]
pub enum KvError {
    /// A point lookup against a missing key.
    #[error("key not found")]
    NotFound,

    /// A failure reported by the underlying backend (open, commit, sync, I/O).
    #[error("backend error: {0}")]
    Backend(String),

    /// sled-specific backend error, preserved so callers can match on it.
    #[cfg(feature = "sled")]
    #[error("sled error: {source}")]
    Sled {
        #[from]
        source: sled::Error,
    },

    /// A value could not be interpreted as the field type that was asked for,
    /// or an expression referenced a field the schema does not have.
    #[error("type error: {0}")]
    Type(String),

    /// Slice endpoints were inconsistent with the requested orientation.
    #[error("range error: {0}")]
    Range(String),

    /// A record's per-field keys or index entries were found in a partially
    /// present state that the invariants in §3 rule out.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// Record or index value serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for all kvkit operations.
pub type KvResult<T> = Result<T, KvError>;

impl From<bincode::Error> for KvError {
    fn from(err: bincode::Error) -> Self { KvError::Serialization(err.to_string()) }
}

impl From<serde_json::Error> for KvError {
    fn from(err: serde_json::Error) -> Self { KvError::Serialization(err.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_not_found() {
        assert_eq!(KvError::NotFound.to_string(), "key not found");
    }

    #[test]
    fn error_display_backend() {
        let err = KvError::Backend("disk full".to_string());
        assert_eq!(err.to_string(), "backend error: disk full");
    }

    #[test]
    fn error_display_type() {
        let err = KvError::Type("no such field 'nickname' on model 'person'".to_string());
        assert!(err.to_string().contains("nickname"));
    }

    #[test]
    fn kv_result_ok() {
        let result: KvResult<i32> = Ok(42);
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn kv_result_err() {
        let result: KvResult<i32> = Err(KvError::NotFound);
        assert!(result.is_err());
    }

    #[test]
    fn serialization_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: KvError = json_err.into();
        assert!(matches!(err, KvError::Serialization(_)));
    }
}
