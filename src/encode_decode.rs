//!
//! Contains wrappers around the logic to encode and decode record bodies into bytes,
//! abstracting away the wire format.
//!

use crate::error::{Error, Result};
use crate::records::Record;

/// Wraps an interface to an encode / decode format for record bodies
///
/// NOTE: It's unlikely you will want to implement this trait.  Instead use
/// [JsonCoder](crate::JsonCoder) (the default), or [MsgPackCoder](crate::MsgPackCoder)
/// with the `msgpack` feature enabled.
///
/// Decode failures surface as [Codec](Error::Codec) errors.  The engine is the only
/// writer of the encoded form, so a decode failure means the stored data is corrupt,
/// not that the caller did anything wrong.
pub trait Coder: Clone + Send + Sync + 'static {

    /// Create a new coder
    fn new() -> Self;

    /// Encodes a record to its storage body
    fn encode_record(&self, record: &Record) -> Result<Vec<u8>>;

    /// Decodes a storage body back into a record
    fn decode_record(&self, bytes: &[u8]) -> Result<Record>;
}

/// The coder used when no other is specified
pub type DefaultCoder = JsonCoder;

/// Encodes record bodies as JSON text
#[derive(Clone)]
pub struct JsonCoder;

impl Coder for JsonCoder {
    fn new() -> Self {
        Self
    }
    fn encode_record(&self, record: &Record) -> Result<Vec<u8>> {
        serde_json::to_vec(record).map_err(|e| Error::Codec(format!("Encode error: {e}")))
    }
    fn decode_record(&self, bytes: &[u8]) -> Result<Record> {
        serde_json::from_slice(bytes).map_err(|e| Error::Codec(format!("Decode error: {e}")))
    }
}

/// Encodes record bodies as MessagePack
#[cfg(feature = "msgpack")]
#[derive(Clone)]
pub struct MsgPackCoder;

#[cfg(feature = "msgpack")]
impl Coder for MsgPackCoder {
    fn new() -> Self {
        Self
    }
    fn encode_record(&self, record: &Record) -> Result<Vec<u8>> {
        rmp_serde::encode::to_vec(record).map_err(|e| Error::Codec(format!("Encode error: {e}")))
    }
    fn decode_record(&self, bytes: &[u8]) -> Result<Record> {
        rmp_serde::decode::from_slice(bytes).map_err(|e| Error::Codec(format!("Decode error: {e}")))
    }
}
