pub mod analyzer;
pub mod config;
pub mod document;
pub mod error;
pub mod fuzzy;
pub mod index;
pub mod ingest;
pub mod persist;
pub mod query;
pub mod source;

pub use config::{EngineConfig, FieldWeights};
pub use document::*;
pub use error::{Result, RowError, RowRejection, SearchError};
pub use index::*;
pub use ingest::{IndexHandle, Ingestor, RebuildSummary};
pub use query::{Hit, QueryEngine};
pub use source::{FileSource, RecordSource, VecSource};
