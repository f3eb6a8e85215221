//!
//! The Error module contains the crate-wide error taxonomy.  [Error] and [Result] are
//! re-exported to the public interface.
//!

use crate::records::RecordId;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// The error taxonomy for dataset operations
///
/// All validation errors are raised before any store mutation is attempted.  A
/// transport layer mapping these to HTTP would use 400 for `InvalidArgument` and
/// `InvalidQueryParameter`, 404 for `DatasetNotFound`, 409 for `DuplicateRecord`,
/// and 500 for the rest.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or missing required input: dataset name, record id, empty payloads
    #[error("{0}")]
    InvalidArgument(String),

    /// Malformed query-only input: field names, sort order
    #[error("{0}")]
    InvalidQueryParameter(String),

    /// A single insert hit the (dataset, record id) uniqueness constraint
    #[error("record with id {record_id} already exists in dataset '{dataset}'")]
    DuplicateRecord { dataset: String, record_id: RecordId },

    /// A query addressed a dataset with no stored records
    #[error("no records found for dataset '{0}'")]
    DatasetNotFound(String),

    /// Stored data failed to decode.  The engine is the sole writer of the encoded
    /// form, so this indicates corruption rather than a caller mistake.
    #[error("codec failure: {0}")]
    Codec(String),

    /// The storage backend reported a failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub(crate) fn invalid_query_parameter(msg: impl Into<String>) -> Self {
        Error::InvalidQueryParameter(msg.into())
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
