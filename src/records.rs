//!
//! The Records module contains the record representation and the logic for extracting a
//! record's identity.  [Record], [RecordId] and [StoredRecord] are re-exported to the
//! public interface.
//!

use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// A schema-free record: a mapping from field name to dynamically typed [Value]
///
/// The only mandatory field is `id`, whose value must be convertible to a 64-bit
/// integer.  Everything else varies freely between records of the same dataset.
pub type Record = BTreeMap<String, Value>;

/// The caller-supplied identity of a record, unique within its dataset
#[derive(Copy, Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, derive_more::Display, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Returns the id as order-preserving big-endian key bytes, so that records iterate
    /// out of the database in ascending numeric id order
    ///
    /// The sign bit is flipped because two's-complement negatives sort after positives
    /// under an unsigned byte comparison.
    pub fn to_key_bytes(&self) -> [u8; 8] {
        ((self.0 as u64) ^ (1 << 63)).to_be_bytes()
    }

    /// Reconstructs a RecordId from the bytes produced by [to_key_bytes](Self::to_key_bytes)
    pub fn from_key_bytes(bytes: [u8; 8]) -> Self {
        RecordId((u64::from_be_bytes(bytes) ^ (1 << 63)) as i64)
    }
}

/// The persistence-facing projection of a record: its dataset addressing plus the
/// encoded body, with a surrogate storage id assigned by the store on save
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredRecord {
    pub storage_id: Option<u64>,
    pub dataset: String,
    pub record_id: RecordId,
    pub body: Vec<u8>,
}

impl StoredRecord {
    /// Creates a not-yet-persisted StoredRecord.  The storage id is assigned by the
    /// store when the record is saved.
    pub fn new(dataset: &str, record_id: RecordId, body: Vec<u8>) -> Self {
        Self {
            storage_id: None,
            dataset: dataset.to_string(),
            record_id,
            body,
        }
    }
}

/// Extracts and validates a record's `id` field
///
/// Numeric values truncate to an integer, string values parse as base-10 integers
/// (an optional leading sign is accepted).  Anything else, or a missing `id` field,
/// is an [InvalidArgument](Error::InvalidArgument) error.
pub fn extract_record_id(record: &Record) -> Result<RecordId> {
    let id_value = record.get("id")
        .ok_or_else(|| Error::invalid_argument("Record must contain an 'id' field"))?;

    match id_value {
        Value::Int(n) => Ok(RecordId(*n)),
        Value::Float(f) if f.is_finite() => Ok(RecordId(*f as i64)),
        Value::String(s) => s.parse::<i64>().map(RecordId).map_err(|_| {
            Error::invalid_argument(format!("Record 'id' must be a valid integer, got: '{s}'"))
        }),
        other => Err(Error::invalid_argument(format!(
            "Record 'id' must be a valid integer, got: {other}"
        ))),
    }
}
