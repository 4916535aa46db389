//! Error types for the catalog crate.
//!
//! Two families live here:
//! - [`DataLoadError`]: opening the store from the catalog files failed
//! - [`CatalogError`]: a read against an open (or missing) store failed
//!
//! Only the second one is seen by the recommendation engine, and none of its
//! variants are fatal for a request.

use thiserror::Error;

/// Errors that can occur while loading and indexing the catalog files
#[derive(Error, Debug)]
pub enum DataLoadError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Referenced entity doesn't exist (e.g., rating for non-existent movie)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: String },
}

/// Convenience type alias for loading results
pub type Result<T> = std::result::Result<T, DataLoadError>;

/// Errors raised by reads through the catalog accessor.
///
/// `StorageUnavailable` is the normal offline signal: callers switch to the
/// fallback chain and log it at debug level only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// No storage connection is open
    #[error("storage unavailable")]
    StorageUnavailable,

    /// The connection exists but this particular read failed
    #[error("query {query} failed: {reason}")]
    QueryFailed { query: &'static str, reason: String },

    /// A genre name outside the closed genre set was passed to a query
    #[error("unknown genre: {0}")]
    UnknownGenre(String),
}

impl CatalogError {
    /// Build a `QueryFailed` for the named query
    pub fn query_failed(query: &'static str, reason: impl Into<String>) -> Self {
        CatalogError::QueryFailed {
            query,
            reason: reason.into(),
        }
    }

    /// True for the expected "no connection" case
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CatalogError::StorageUnavailable)
    }
}

/// Result alias for catalog reads
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
