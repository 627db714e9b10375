//! Error types shared by the index, the ingestion pipeline and the query engine.

use std::time::Duration;
use thiserror::Error;

use crate::DocId;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Failures surfaced to callers of the search core.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Query text was empty or whitespace only
    #[error("search text is required")]
    InvalidQuery,

    /// A document id referenced by a posting has no stored body
    #[error("document {0} not found")]
    NotFound(DocId),

    /// Another rebuild currently holds the index
    #[error("a rebuild is already in progress")]
    Busy,

    /// The record source could not be opened or read
    #[error("record source unreadable: {0}")]
    Source(String),

    /// Rebuild exceeded its configured bound and was abandoned
    #[error("rebuild exceeded {0:?}; previous index kept")]
    RebuildTimedOut(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Row-level failure reported by a record source.
///
/// `Malformed` rows are skipped by the ingestion pipeline; `Unreadable` aborts the rebuild.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("malformed row: {0}")]
    Malformed(String),

    #[error("source failed mid-stream: {0}")]
    Unreadable(String),
}

/// Reason a structurally valid row cannot become a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowRejection {
    #[error("row has no name")]
    MissingName,

    #[error("unrecognized birthdate {0:?}")]
    InvalidBirthdate(String),
}
