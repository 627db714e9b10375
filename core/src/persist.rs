//! On-disk snapshots of the document store.
//!
//! A snapshot directory holds `docs.bin` (bincode, documents in id order) and `meta.json`.
//! Postings are never written; loading re-analyzes every document.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

use crate::error::{Result, SearchError};
use crate::{Document, InvertedIndex};

pub const SNAPSHOT_VERSION: u32 = 1;

const DOCS_FILE: &str = "docs.bin";
const META_FILE: &str = "meta.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

/// Write the documents of `index` under `dir`, creating it if needed.
pub fn save_snapshot(dir: &Path, index: &InvertedIndex) -> Result<SnapshotMeta> {
    fs::create_dir_all(dir)?;
    let docs: Vec<&Document> = index.documents().collect();
    fs::write(dir.join(DOCS_FILE), bincode::serialize(&docs)?)?;

    let meta = SnapshotMeta {
        num_docs: docs.len() as u32,
        created_at: OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
        version: SNAPSHOT_VERSION,
    };
    fs::write(dir.join(META_FILE), serde_json::to_vec_pretty(&meta)?)?;
    info!(dir = %dir.display(), num_docs = meta.num_docs, "snapshot saved");
    Ok(meta)
}

/// Read a snapshot written by [`save_snapshot`] and rebuild its postings.
///
/// A snapshot from another format version is refused with [`SearchError::Source`].
pub fn load_snapshot(dir: &Path) -> Result<(InvertedIndex, SnapshotMeta)> {
    let meta: SnapshotMeta = serde_json::from_slice(&fs::read(dir.join(META_FILE))?)?;
    if meta.version != SNAPSHOT_VERSION {
        return Err(SearchError::Source(format!(
            "{}: snapshot version {} is not {SNAPSHOT_VERSION}",
            dir.display(),
            meta.version
        )));
    }
    let docs: Vec<Document> = bincode::deserialize(&fs::read(dir.join(DOCS_FILE))?)?;
    let mut index = InvertedIndex::new();
    docs.into_iter().for_each(|doc| index.put(doc));
    info!(dir = %dir.display(), num_docs = index.len(), created_at = %meta.created_at, "snapshot loaded");
    Ok((index, meta))
}
