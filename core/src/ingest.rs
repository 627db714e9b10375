//! Full-rebuild ingestion with copy-and-swap publication.
//!
//! A rebuild stages a brand new [`InvertedIndex`] off to the side and publishes it with a
//! single pointer swap. Readers hold an `Arc` to whichever snapshot was current when they
//! started, so they never see a partially built index and never wait on a rebuild.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::error::{Result, RowError, SearchError};
use crate::source::RecordSource;
use crate::{DocId, Field, InvertedIndex, RawRecord};

struct Shared {
    current: RwLock<Arc<InvertedIndex>>,
    rebuild: Mutex<()>,
}

/// Shared handle to the published index snapshot. Cheap to clone.
#[derive(Clone)]
pub struct IndexHandle {
    inner: Arc<Shared>,
}

impl Default for IndexHandle {
    fn default() -> Self { Self::new() }
}

impl IndexHandle {
    pub fn new() -> Self { Self::from_index(InvertedIndex::new()) }

    pub fn from_index(index: InvertedIndex) -> Self {
        Self {
            inner: Arc::new(Shared { current: RwLock::new(Arc::new(index)), rebuild: Mutex::new(()) }),
        }
    }

    /// The currently published snapshot. The lock is held only for the pointer clone.
    pub fn snapshot(&self) -> Arc<InvertedIndex> {
        self.inner.current.read().clone()
    }

    fn publish(&self, index: InvertedIndex) {
        *self.inner.current.write() = Arc::new(index);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RebuildSummary {
    pub indexed: usize,
    pub skipped: usize,
    pub took_s: f64,
}

/// Writes into an [`IndexHandle`] by rebuilding it from a stream of records.
#[derive(Clone)]
pub struct Ingestor {
    handle: IndexHandle,
    max_duration: Option<Duration>,
}

impl Ingestor {
    pub fn new(handle: IndexHandle) -> Self {
        Self { handle, max_duration: None }
    }

    /// Abandon rebuilds that run longer than `limit`, keeping the previous snapshot.
    pub fn with_max_duration(mut self, limit: Option<Duration>) -> Self {
        self.max_duration = limit;
        self
    }

    /// Open `source` and rebuild from it. An unopenable source leaves the index untouched.
    pub fn rebuild_from(&self, source: &dyn RecordSource) -> Result<RebuildSummary> {
        let rows = source.rows()?;
        self.rebuild(rows)
    }

    /// Replace the published index with one built from `rows`.
    ///
    /// Malformed rows and rows failing validation are skipped and counted. A
    /// [`RowError::Unreadable`] aborts the rebuild with [`SearchError::Source`] and the
    /// previous snapshot stays published. Only one rebuild runs at a time; a concurrent
    /// call gets [`SearchError::Busy`].
    pub fn rebuild<I>(&self, rows: I) -> Result<RebuildSummary>
    where
        I: IntoIterator<Item = std::result::Result<RawRecord, RowError>>,
    {
        let _guard = self.handle.inner.rebuild.try_lock().ok_or(SearchError::Busy)?;
        let start = Instant::now();
        let mut staged = InvertedIndex::new();
        let mut next_doc_id: DocId = 0;
        let mut skipped = 0usize;

        for (i, row) in rows.into_iter().enumerate() {
            let row_number = i + 1;
            if let Some(limit) = self.max_duration {
                if start.elapsed() > limit {
                    warn!(row_number, ?limit, "rebuild exceeded its time bound; keeping previous index");
                    return Err(SearchError::RebuildTimedOut(limit));
                }
            }
            let raw = match row {
                Ok(raw) => raw,
                Err(RowError::Malformed(reason)) => {
                    warn!(row_number, %reason, "skipping malformed row");
                    skipped += 1;
                    continue;
                }
                Err(RowError::Unreadable(reason)) => {
                    error!(row_number, %reason, "record source failed; keeping previous index");
                    return Err(SearchError::Source(reason));
                }
            };
            match raw.into_document(next_doc_id) {
                Ok(document) => {
                    staged.put(document);
                    next_doc_id += 1;
                }
                Err(rejection) => {
                    warn!(row_number, %rejection, "skipping row");
                    skipped += 1;
                }
            }
        }

        if let Some(limit) = self.max_duration {
            if start.elapsed() > limit {
                warn!(?limit, indexed = staged.len(), "rebuild finished past its time bound; keeping previous index");
                return Err(SearchError::RebuildTimedOut(limit));
            }
        }

        let summary = RebuildSummary { indexed: staged.len(), skipped, took_s: start.elapsed().as_secs_f64() };
        info!(
            indexed = summary.indexed,
            skipped = summary.skipped,
            name_terms = staged.term_count(Field::Name),
            took_s = summary.took_s,
            "publishing rebuilt index"
        );
        self.handle.publish(staged);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::VecSource;

    fn ok_rows(names: &[&str]) -> Vec<std::result::Result<RawRecord, RowError>> {
        names.iter().map(|n| Ok(RawRecord::named(*n))).collect()
    }

    #[test]
    fn rebuild_assigns_sequential_ids_and_publishes() {
        let handle = IndexHandle::new();
        let ingestor = Ingestor::new(handle.clone());
        let summary = ingestor.rebuild(ok_rows(&["Alice", "Bob"])).unwrap();
        assert_eq!((summary.indexed, summary.skipped), (2, 0));
        let snap = handle.snapshot();
        assert_eq!(snap.get_document(0).unwrap().name, "Alice");
        assert_eq!(snap.get_document(1).unwrap().name, "Bob");
    }

    #[test]
    fn rebuild_drops_previous_contents() {
        let handle = IndexHandle::new();
        let ingestor = Ingestor::new(handle.clone());
        ingestor.rebuild(ok_rows(&["Zelda"])).unwrap();
        ingestor.rebuild(ok_rows(&["Mario"])).unwrap();
        let snap = handle.snapshot();
        assert_eq!(snap.len(), 1);
        assert!(snap.lookup("zel", Field::Name).is_empty());
    }

    #[test]
    fn malformed_and_invalid_rows_are_skipped() {
        let handle = IndexHandle::new();
        let rows = vec![
            Ok(RawRecord::named("Alice")),
            Err(RowError::Malformed("bad json".into())),
            Ok(RawRecord::default()),
            Ok(RawRecord { birthdate: Some("yesterday".into()), ..RawRecord::named("Carl") }),
            Ok(RawRecord::named("Dora")),
        ];
        let summary = Ingestor::new(handle.clone()).rebuild(rows).unwrap();
        assert_eq!((summary.indexed, summary.skipped), (2, 3));
        assert_eq!(handle.snapshot().get_document(1).unwrap().name, "Dora");
    }

    #[test]
    fn unreadable_source_keeps_previous_index() {
        let handle = IndexHandle::new();
        let ingestor = Ingestor::new(handle.clone());
        ingestor.rebuild(ok_rows(&["Alice"])).unwrap();
        let rows = vec![Ok(RawRecord::named("Bob")), Err(RowError::Unreadable("disk gone".into()))];
        let err = ingestor.rebuild(rows).unwrap_err();
        assert!(matches!(err, SearchError::Source(_)));
        let snap = handle.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get_document(0).unwrap().name, "Alice");
    }

    #[test]
    fn concurrent_rebuild_is_busy() {
        let handle = IndexHandle::new();
        let ingestor = Ingestor::new(handle.clone());
        let _held = handle.inner.rebuild.lock();
        assert!(matches!(ingestor.rebuild(ok_rows(&["Alice"])), Err(SearchError::Busy)));
        assert!(handle.snapshot().is_empty());
    }

    #[test]
    fn zero_time_bound_aborts_rebuild() {
        let handle = IndexHandle::new();
        let ingestor = Ingestor::new(handle.clone()).with_max_duration(Some(Duration::ZERO));
        let rows = ok_rows(&["Alice", "Bob"]).into_iter().inspect(|_| std::thread::sleep(Duration::from_millis(2)));
        assert!(matches!(ingestor.rebuild(rows), Err(SearchError::RebuildTimedOut(_))));
        assert!(handle.snapshot().is_empty());
    }

    #[test]
    fn slow_tail_of_source_still_aborts_rebuild() {
        let handle = IndexHandle::new();
        let ingestor = Ingestor::new(handle.clone()).with_max_duration(Some(Duration::from_millis(20)));
        let mut first = Some(Ok(RawRecord::named("Alice")));
        let rows = std::iter::from_fn(move || match first.take() {
            Some(row) => Some(row),
            None => {
                std::thread::sleep(Duration::from_millis(60));
                None
            }
        });
        assert!(matches!(ingestor.rebuild(rows), Err(SearchError::RebuildTimedOut(_))));
        assert!(handle.snapshot().is_empty());
    }

    #[test]
    fn rebuild_from_source() {
        let handle = IndexHandle::new();
        let source = VecSource::new(vec![RawRecord::named("Alice"), RawRecord::named("")]);
        let summary = Ingestor::new(handle).rebuild_from(&source).unwrap();
        assert_eq!((summary.indexed, summary.skipped), (1, 1));
    }
}
