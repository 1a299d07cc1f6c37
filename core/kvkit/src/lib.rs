//! # kvkit — a typed Model/Index/Hexastore toolkit over an ordered KV store
//!
//! kvkit turns a raw sorted byte-keyed map into three higher-level facilities:
//!
//! - a uniform KV abstraction with range slicing, bulk operations, atomic
//!   counters and transactions ([`backend`], [`slice`], [`cursor`]);
//! - a schema-ful record layer ("Model") with typed fields, auto-assigned
//!   primary keys, and secondary indexes supporting equality, range, prefix
//!   and Boolean-composed queries ([`model`]);
//! - a triple store ("Hexastore") that indexes `(subject, predicate, object)`
//!   facts across all six permutations and answers conjunctive pattern
//!   queries with variables ([`hexastore`]).
//!
//! ## Quick start
//!
//! ```rust
//! use kvkit::{MemoryBackend, KvBackend};
//!
//! # fn main() -> kvkit::KvResult<()> {
//! let backend = MemoryBackend::new();
//! backend.put(b"users:1", b"Alice")?;
//! assert_eq!(backend.get(b"users:1")?, Some(b"Alice".to_vec()));
//! backend.delete(b"users:1")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module structure
//! - [`backend`] — the `KvBackend` contract and the `MemoryBackend`/`SledBackend` adapters
//! - [`slice`] — range-request normalization shared by cursors and index scans
//! - [`cursor`] — stateful bidirectional scan with bounded fetch
//! - [`codec`] — order-preserving typed field encodings
//! - [`transaction`] — scoped begin/commit/rollback
//! - [`model`] — schema, records, secondary indexes, the query compiler
//! - [`hexastore`] — six-permutation triple store with conjunctive search

pub mod error;
pub mod logging;

pub mod backend;
pub mod codec;
pub mod cursor;
pub mod slice;
pub mod transaction;

pub mod hexastore;
pub mod model;

pub use backend::{Capabilities, KvBackend, MemoryBackend};
#[cfg(feature = "sled")]
pub use backend::{SledBackend, SledOptions};
pub use cursor::Cursor;
pub use error::{KvError, KvResult};
pub use hexastore::{cond, Condition, Hexastore, Term, Triple, Variable};
pub use model::{Expr, Model, ModelSchema};
pub use transaction::{Transaction, with_transaction};

#[cfg(feature = "derive")]
pub use kvkit_derive::Model;
