//! Single-slot store for the current dataset snapshot

use super::snapshot::DatasetSnapshot;
use crate::error::{InsightsError, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};

/// Whether a dataset has been published yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreState {
    Empty,
    Ready,
}

impl StoreState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Ready => "Ready",
        }
    }
}

/// Holds at most one [`DatasetSnapshot`].
///
/// Readers clone the `Arc` out from under a read lock and never wait on an
/// ingestion in progress: the write lock is only taken for the pointer swap.
/// Writers first take the ingest gate with `try_lock`, so a second concurrent
/// ingestion is rejected with [`InsightsError::Busy`] instead of queueing.
#[derive(Debug, Default)]
pub struct DatasetStore {
    current: RwLock<Option<Arc<DatasetSnapshot>>>,
    ingest_gate: Mutex<()>,
}

/// Exclusive right to publish the next snapshot. Dropping it without
/// committing leaves the store untouched.
#[derive(Debug)]
pub struct IngestPermit<'a> {
    store: &'a DatasetStore,
    _gate: MutexGuard<'a, ()>,
}

impl IngestPermit<'_> {
    /// Publishes `snapshot`, replacing whatever was current.
    pub fn commit(self, snapshot: DatasetSnapshot) -> Arc<DatasetSnapshot> {
        let snapshot = Arc::new(snapshot);
        self.store.swap(Some(Arc::clone(&snapshot)));
        snapshot
    }

    /// Empties the store.
    pub fn clear(self) {
        self.store.swap(None);
    }
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the ingest gate for the duration of a build.
    ///
    /// # Errors
    ///
    /// Returns [`InsightsError::Busy`] if another ingestion holds the gate.
    pub fn begin_ingest(&self) -> Result<IngestPermit<'_>> {
        let gate = match self.ingest_gate.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(InsightsError::Busy),
            // A panicked ingestion never reached the swap; the slot is intact.
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };
        Ok(IngestPermit {
            store: self,
            _gate: gate,
        })
    }

    /// Atomically replaces the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`InsightsError::Busy`] if an ingestion is in progress.
    pub fn replace(&self, snapshot: DatasetSnapshot) -> Result<Arc<DatasetSnapshot>> {
        Ok(self.begin_ingest()?.commit(snapshot))
    }

    /// Returns the store to [`StoreState::Empty`].
    ///
    /// # Errors
    ///
    /// Returns [`InsightsError::Busy`] if an ingestion is in progress.
    pub fn clear(&self) -> Result<()> {
        self.begin_ingest()?.clear();
        Ok(())
    }

    /// The latest published snapshot, if any.
    pub fn current(&self) -> Option<Arc<DatasetSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Like [`DatasetStore::current`], for query paths.
    ///
    /// # Errors
    ///
    /// Returns [`InsightsError::NoDataset`] before the first successful ingestion.
    pub fn require(&self) -> Result<Arc<DatasetSnapshot>> {
        self.current().ok_or(InsightsError::NoDataset)
    }

    pub fn state(&self) -> StoreState {
        if self.current().is_some() {
            StoreState::Ready
        } else {
            StoreState::Empty
        }
    }

    pub fn is_ingesting(&self) -> bool {
        matches!(self.ingest_gate.try_lock(), Err(TryLockError::WouldBlock))
    }

    fn swap(&self, next: Option<Arc<DatasetSnapshot>>) {
        let mut slot = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::logic::{ChartSet, KpiSet, Summary, TableSchema, TypedTable};
    use chrono::Utc;
    use std::time::Duration;
    use uuid::Uuid;

    fn snapshot(rows: usize) -> DatasetSnapshot {
        DatasetSnapshot {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            source: None,
            processing_time: Duration::ZERO,
            table: TypedTable::default(),
            schema: TableSchema::default(),
            summary: Summary {
                row_count: rows,
                ..Summary::default()
            },
            kpis: KpiSet::default(),
            charts: ChartSet::default(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_empty_store() {
        let store = DatasetStore::new();
        assert_eq!(store.state(), StoreState::Empty);
        assert!(store.current().is_none());
        assert!(matches!(store.require(), Err(InsightsError::NoDataset)));
    }

    #[test]
    fn test_replace_and_clear() -> Result<()> {
        let store = DatasetStore::new();
        let first = store.replace(snapshot(1))?;
        assert_eq!(store.state(), StoreState::Ready);

        let second = store.replace(snapshot(2))?;
        let current = store.require()?;
        assert_eq!(current.id, second.id);
        // Earlier readers keep their snapshot
        assert_eq!(first.row_count(), 1);

        store.clear()?;
        assert_eq!(store.state(), StoreState::Empty);
        Ok(())
    }

    #[test]
    fn test_second_ingest_is_busy() -> Result<()> {
        let store = DatasetStore::new();
        let permit = store.begin_ingest()?;
        assert!(store.is_ingesting());
        assert!(matches!(store.begin_ingest(), Err(InsightsError::Busy)));
        assert!(matches!(store.replace(snapshot(1)), Err(InsightsError::Busy)));
        assert!(matches!(store.clear(), Err(InsightsError::Busy)));

        permit.commit(snapshot(3));
        assert!(!store.is_ingesting());
        assert_eq!(store.require()?.row_count(), 3);
        Ok(())
    }

    #[test]
    fn test_dropped_permit_leaves_store_unchanged() -> Result<()> {
        let store = DatasetStore::new();
        let kept = store.replace(snapshot(5))?;
        drop(store.begin_ingest()?);
        assert_eq!(store.require()?.id, kept.id);
        Ok(())
    }

    #[test]
    fn test_readers_not_blocked_by_ingestion() -> Result<()> {
        let store = DatasetStore::new();
        store.replace(snapshot(1))?;
        let permit = store.begin_ingest()?;

        std::thread::scope(|scope| {
            let readers: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| store.current().map(|s| s.row_count())))
                .collect();
            for reader in readers {
                assert_eq!(reader.join().ok().flatten(), Some(1));
            }
        });

        permit.commit(snapshot(2));
        assert_eq!(store.require()?.row_count(), 2);
        Ok(())
    }
}
