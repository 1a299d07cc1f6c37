//! Secondary index: encode, store and delete `(field value, primary key)`
//! entries, and answer range queries by operator.
//!
//! Keys live under the reserved prefix `idx:<model>:<field>\xFF…`. `\xFF`
//! separates the components because it sorts after every field-value
//! encoding that does not itself contain `\xFF` at that position — brittle
//! for arbitrary binary payloads, a limitation kept from the source rather
//! than inventing an escaping scheme (see DESIGN.md).

use crate::backend::{BatchOp, KvBackend};
use crate::codec::{FieldKind, Value};
use crate::error::{KvError, KvResult};
use crate::model::expr::Op;
use tracing::trace;

pub struct SecondaryIndex {
    model: &'static str,
    field: &'static str,
    kind: FieldKind,
}

impl SecondaryIndex {
    pub fn new(model: &'static str, field: &'static str, kind: FieldKind) -> Self {
        SecondaryIndex { model, field, kind }
    }

    fn name(&self) -> Vec<u8> {
        format!("idx:{}:{}", self.model, self.field).into_bytes()
    }

    /// `prefix\xFF` — the start of this index's whole keyspace.
    fn base(&self) -> Vec<u8> {
        let mut v = self.name();
        v.push(0xFF);
        v
    }

    /// `prefix\xFF\xFF\xFF` — the sentinel, a strictly-greater upper bound
    /// for every real entry.
    fn sentinel_key(&self) -> Vec<u8> {
        let mut v = self.name();
        v.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
        v
    }

    /// `prefix\xFF <enc-value> \xFF`
    fn match_prefix(&self, value_enc: &[u8]) -> Vec<u8> {
        let mut v = self.base();
        v.extend_from_slice(value_enc);
        v.push(0xFF);
        v
    }

    fn entry_key(&self, value_enc: &[u8], pk: i64) -> Vec<u8> {
        let mut v = self.match_prefix(value_enc);
        v.extend_from_slice(&crate::codec::encode_long(pk));
        v
    }

    /// Batch ops for writing this entry plus its sentinel, for callers
    /// (e.g. `model::record`) that fold several indexes' writes into one
    /// atomic batch alongside a record body.
    pub fn store_ops(&self, value: &Value, pk: i64) -> KvResult<Vec<BatchOp>> {
        if matches!(value, Value::Null) {
            return Ok(Vec::new());
        }
        let enc = self.kind.encode(value)?;
        let key = self.entry_key(&enc, pk);
        Ok(vec![
            BatchOp::Put(key, pk.to_string().into_bytes()),
            BatchOp::Put(self.sentinel_key(), Vec::new()),
        ])
    }

    /// Batch ops for removing this entry.
    pub fn delete_ops(&self, value: &Value, pk: i64) -> KvResult<Vec<BatchOp>> {
        if matches!(value, Value::Null) {
            return Ok(Vec::new());
        }
        let enc = self.kind.encode(value)?;
        let key = self.entry_key(&enc, pk);
        Ok(vec![BatchOp::Delete(key)])
    }

    pub fn store(&self, backend: &dyn KvBackend, value: &Value, pk: i64) -> KvResult<()> {
        backend.apply_batch(&self.store_ops(value, pk)?)
    }

    pub fn delete(&self, backend: &dyn KvBackend, value: &Value, pk: i64) -> KvResult<()> {
        backend.apply_batch(&self.delete_ops(value, pk)?)
    }

    pub fn query(&self, backend: &dyn KvBackend, value: &Value, op: Op) -> KvResult<Vec<i64>> {
        if matches!(op, Op::StartsWith) && !matches!(self.kind, FieldKind::String) {
            return Err(KvError::Type(format!(
                "startswith is only defined for String fields, field {:?} is {:?}",
                self.field, self.kind
            )));
        }
        let enc = self.kind.encode(value)?;
        let base = self.base();
        let sentinel = self.sentinel_key();
        let match_prefix = self.match_prefix(&enc);
        let mut value_upper = base.clone();
        value_upper.extend_from_slice(&enc);

        let (lo, lo_exclusive, hi, filter_out_prefix): (Vec<u8>, bool, Vec<u8>, Option<Vec<u8>>) =
            match op {
                Op::Eq => {
                    let mut hi = match_prefix.clone();
                    hi.push(0xFF);
                    (match_prefix.clone(), false, hi, None)
                }
                Op::Lt => (base.clone(), false, value_upper.clone(), None),
                Op::Le => {
                    let mut hi = value_upper.clone();
                    hi.extend_from_slice(&[0xFF, 0xFF, 0x00]);
                    (base.clone(), false, hi, None)
                }
                Op::Gt => {
                    let mut lo = value_upper.clone();
                    lo.extend_from_slice(&[0xFF, 0xFF]);
                    (lo, true, sentinel.clone(), None)
                }
                Op::Ge => (value_upper.clone(), false, sentinel.clone(), None),
                Op::Ne => (base.clone(), false, sentinel.clone(), Some(match_prefix.clone())),
                Op::StartsWith => {
                    let mut hi = value_upper.clone();
                    hi.extend_from_slice(&[0xFF, 0xFF]);
                    (value_upper.clone(), false, hi, None)
                }
            };

        let mut pks = Vec::new();
        for (key, value) in backend.range(Some(&lo), None, false)? {
            if key >= hi {
                break;
            }
            if lo_exclusive && key == lo {
                continue;
            }
            if let Some(skip_prefix) = &filter_out_prefix {
                if key.starts_with(skip_prefix.as_slice()) {
                    continue;
                }
            }
            if key == sentinel {
                continue;
            }
            let pk_text = String::from_utf8(value)
                .map_err(|e| KvError::Type(format!("index pk value is not utf-8: {e}")))?;
            let pk: i64 = pk_text
                .parse()
                .map_err(|e| KvError::Type(format!("index pk value {pk_text:?} is not an integer: {e}")))?;
            pks.push(pk);
        }
        trace!(model = self.model, field = self.field, ?op, hits = pks.len(), "index scan");
        Ok(pks)
    }
}
