//! Error types for the Bondsync engine.

use thiserror::Error;

/// All possible errors from the Bondsync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Mapping errors
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("field '{field}' is not numeric: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field '{field}' is not a valid date: {value}")]
    InvalidDate { field: &'static str, value: String },

    // Snapshot assembly errors
    #[error("store reported more pages after page {page} but returned no page token")]
    MissingPageToken { page: usize },
}

impl Error {
    /// Whether this error came out of the field mapper.
    pub fn is_mapping(&self) -> bool {
        !matches!(self, Error::MissingPageToken { .. })
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
