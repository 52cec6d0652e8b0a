//! Ingestion pipeline and the single-dataset lifecycle
//!
//! An upload runs through six stages:
//! - **Validate**: structural checks, header normalisation, optional duplicate row removal
//! - **Infer**: numeric vs categorical per column
//! - **Type**: raw cells reinterpreted per the inferred schema
//! - **Profile**: summary statistics
//! - **Aggregate**: KPIs and charts
//! - **Publish**: the finished snapshot replaces the current one
//!
//! ## Key Principles
//!
//! - **All or nothing**: a failed or cancelled ingestion publishes nothing and
//!   the previous snapshot stays current
//! - **Build once, read many**: queries clone an `Arc` to the current snapshot
//!   and never recompute
//! - **One upload at a time**: a second concurrent ingestion is rejected with
//!   [`InsightsError::Busy`](crate::error::InsightsError::Busy)
//!
//! ## Example Usage
//!
//! ```
//! use hr_insights::analyser::lifecycle::InsightsEngine;
//! use hr_insights::analyser::logic::RawTable;
//! use hr_insights::config::EngineConfig;
//!
//! # fn example() -> hr_insights::error::Result<()> {
//! let engine = InsightsEngine::new(EngineConfig::default())?;
//! assert!(engine.get_kpis().is_err_and(|e| e.is_no_dataset()));
//!
//! let raw = RawTable::new(
//!     vec!["Name".to_owned(), "Salary".to_owned(), "Attrition".to_owned()],
//!     vec![
//!         vec!["A".into(), "50000".into(), "No".into()],
//!         vec!["B".into(), "60000".into(), "Yes".into()],
//!     ],
//! );
//! let summary = engine.ingest(raw)?;
//! assert_eq!(summary.row_count, 2);
//!
//! let kpis = engine.get_kpis()?;
//! assert!((kpis.attrition_rate - 0.5).abs() < f64::EPSILON);
//! # Ok(())
//! # }
//! # example().expect("example runs");
//! ```

pub mod snapshot;
pub mod stages;
pub mod storage;

pub use snapshot::DatasetSnapshot;
pub use stages::{LifecycleStage, StageExecutor, StageOutcome, checkpoint};
pub use storage::{DatasetStore, IngestPermit, StoreState};

use crate::analyser::logic::{
    ChartSet, IngestWarning, KpiSet, RawTable, Summary, TypedTable, build_charts, compute_kpis,
    infer_schema, load_table_cancellable, summarise,
};
use crate::config::EngineConfig;
use crate::error::Result;
use stages::clean::CleanStageExecutor;
use stages::validate::ValidateStageExecutor;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

/// Turns a raw table into a [`DatasetSnapshot`]. Holds no state besides its
/// configuration, so one pipeline can serve any number of runs.
#[derive(Debug, Clone)]
pub struct IngestionPipeline {
    config: Arc<EngineConfig>,
}

impl IngestionPipeline {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs every stage. `cancel` is checked before each one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTable` for structural problems and `Aborted` when
    /// `cancel` is raised. Nothing is published either way; publishing is the
    /// caller's job.
    pub fn run(
        &self,
        mut raw: RawTable,
        source: Option<String>,
        cancel: &AtomicBool,
    ) -> Result<DatasetSnapshot> {
        let start = Instant::now();
        let config = &self.config;

        checkpoint(LifecycleStage::Validate, cancel)?;
        let validate = ValidateStageExecutor::default();
        let clean = CleanStageExecutor::new(&config.ingest);
        let executors: [&dyn StageExecutor; 2] = [&validate, &clean];
        let mut rows_removed = 0;
        for executor in executors {
            tracing::debug!(
                stage = executor.stage().as_str(),
                "{}",
                executor.description()
            );
            rows_removed += executor.execute(&mut raw)?.rows_removed;
        }

        checkpoint(LifecycleStage::Infer, cancel)?;
        let (schema, mut warnings) = infer_schema(&raw, &config.inference);

        checkpoint(LifecycleStage::Type, cancel)?;
        let table = TypedTable::from_raw(&raw, &schema, &config.inference)?;
        drop(raw);

        checkpoint(LifecycleStage::Profile, cancel)?;
        let mut summary = summarise(&table, &schema, config.summary.top_k)?;
        summary.duplicate_rows_removed = rows_removed;

        checkpoint(LifecycleStage::Aggregate, cancel)?;
        let kpis = compute_kpis(&table, &summary, &config.kpi, &mut warnings)?;
        let charts = build_charts(&table, &config.charts, &mut warnings)?;

        checkpoint(LifecycleStage::Publish, cancel)?;
        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        Ok(DatasetSnapshot {
            id: uuid::Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            source,
            processing_time: start.elapsed(),
            table,
            schema,
            summary,
            kpis,
            charts,
            warnings,
        })
    }
}

/// Upload and query entry point shared by every caller.
///
/// Cheap to share across threads: wrap it in an `Arc` or share the
/// [`DatasetStore`] between engines with [`InsightsEngine::with_store`].
#[derive(Debug)]
pub struct InsightsEngine {
    pipeline: IngestionPipeline,
    store: Arc<DatasetStore>,
}

impl InsightsEngine {
    /// # Errors
    ///
    /// Returns `Config` if the configuration fails validation.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_store(config, Arc::new(DatasetStore::new()))
    }

    /// # Errors
    ///
    /// Returns `Config` if the configuration fails validation.
    pub fn with_store(config: EngineConfig, store: Arc<DatasetStore>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pipeline: IngestionPipeline::new(Arc::new(config)),
            store,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        self.pipeline.config()
    }

    pub fn store(&self) -> &Arc<DatasetStore> {
        &self.store
    }

    pub fn state(&self) -> StoreState {
        self.store.state()
    }

    /// Processes `raw` and publishes it as the current dataset.
    ///
    /// # Errors
    ///
    /// Returns an ingestion failure (`InvalidTable`, `Busy`) and leaves the
    /// previous dataset current.
    pub fn ingest(&self, raw: RawTable) -> Result<Summary> {
        self.ingest_cancellable(raw, &AtomicBool::new(false))
    }

    /// Like [`InsightsEngine::ingest`], abandoning the run once `cancel` is raised.
    ///
    /// # Errors
    ///
    /// Returns `Aborted` when cancelled, otherwise as [`InsightsEngine::ingest`].
    pub fn ingest_cancellable(&self, raw: RawTable, cancel: &AtomicBool) -> Result<Summary> {
        let snapshot = self.publish(None, cancel, || Ok(raw))?;
        Ok(snapshot.summary.clone())
    }

    /// Loads a CSV, TSV or Excel file and ingests it, recording the file name
    /// as the source. Workbooks contribute their first worksheet.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for files that are unsupported, malformed or cannot be
    /// opened, otherwise as [`InsightsEngine::ingest`].
    pub fn ingest_file(&self, path: &Path) -> Result<Summary> {
        self.ingest_file_cancellable(path, &AtomicBool::new(false))
    }

    /// Like [`InsightsEngine::ingest_file`], abandoning the run once `cancel`
    /// is raised. Reading the file checks `cancel` as it goes.
    ///
    /// # Errors
    ///
    /// Returns `Aborted` when cancelled, otherwise as [`InsightsEngine::ingest_file`].
    pub fn ingest_file_cancellable(&self, path: &Path, cancel: &AtomicBool) -> Result<Summary> {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        let snapshot = self.publish(source, cancel, || load_table_cancellable(path, cancel))?;
        Ok(snapshot.summary.clone())
    }

    // Holds the ingest gate from loading until the swap.
    fn publish<F>(
        &self,
        source: Option<String>,
        cancel: &AtomicBool,
        load: F,
    ) -> Result<Arc<DatasetSnapshot>>
    where
        F: FnOnce() -> Result<RawTable>,
    {
        let permit = self.store.begin_ingest().inspect_err(|e| {
            tracing::warn!("Ingestion rejected: {e}");
        })?;

        let result = checkpoint(LifecycleStage::Validate, cancel)
            .and_then(|()| load())
            .and_then(|raw| self.pipeline.run(raw, source, cancel));

        match result {
            Ok(snapshot) => {
                let snapshot = permit.commit(snapshot);
                tracing::info!(
                    id = %snapshot.id,
                    rows = snapshot.summary.row_count,
                    columns = snapshot.summary.col_count,
                    warnings = snapshot.warnings.len(),
                    "Published {} in {:?}",
                    snapshot.display_name(),
                    snapshot.processing_time
                );
                Ok(snapshot)
            }
            Err(e) => {
                tracing::error!("Ingestion failed: {e}");
                Err(e)
            }
        }
    }

    /// # Errors
    ///
    /// Returns `NoDataset` before the first successful ingestion.
    pub fn get_kpis(&self) -> Result<KpiSet> {
        Ok(self.store.require()?.kpis.clone())
    }

    /// # Errors
    ///
    /// Returns `NoDataset` before the first successful ingestion.
    pub fn get_charts(&self) -> Result<ChartSet> {
        Ok(self.store.require()?.charts.clone())
    }

    /// # Errors
    ///
    /// Returns `NoDataset` before the first successful ingestion.
    pub fn get_summary(&self) -> Result<Summary> {
        Ok(self.store.require()?.summary.clone())
    }

    /// The whole current snapshot, shared rather than copied.
    ///
    /// # Errors
    ///
    /// Returns `NoDataset` before the first successful ingestion.
    pub fn snapshot(&self) -> Result<Arc<DatasetSnapshot>> {
        self.store.require()
    }

    /// # Errors
    ///
    /// Returns `NoDataset` before the first successful ingestion.
    pub fn warnings(&self) -> Result<Vec<IngestWarning>> {
        Ok(self.store.require()?.warnings.clone())
    }

    /// Forgets the current dataset.
    ///
    /// # Errors
    ///
    /// Returns `Busy` while an ingestion is in progress.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()?;
        tracing::info!("Dataset cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::logic::CellValue;
    use crate::error::InsightsError;
    use std::sync::atomic::Ordering;

    fn staff() -> RawTable {
        RawTable::new(
            vec!["Name".to_owned(), "Salary".to_owned(), "Attrition".to_owned()],
            vec![
                vec!["A".into(), 50000.0.into(), "No".into()],
                vec!["B".into(), 60000.0.into(), "Yes".into()],
                vec!["B".into(), 60000.0.into(), "Yes".into()],
            ],
        )
    }

    #[test]
    fn test_pipeline_builds_snapshot() -> Result<()> {
        let pipeline = IngestionPipeline::new(Arc::new(EngineConfig::default()));
        let snapshot = pipeline.run(staff(), Some("staff.csv".to_owned()), &AtomicBool::new(false))?;

        assert_eq!(snapshot.source.as_deref(), Some("staff.csv"));
        assert_eq!(snapshot.summary.row_count, 3);
        assert_eq!(snapshot.table.row_count(), 3);
        assert_eq!(snapshot.schema.len(), 3);
        assert_eq!(snapshot.kpis.attrition_count, 2);
        assert!(snapshot.charts.contains(ChartSet::SALARY_BUCKETS));
        Ok(())
    }

    #[test]
    fn test_duplicate_rows_removed_when_configured() -> Result<()> {
        let mut config = EngineConfig::default();
        config.ingest.drop_duplicate_rows = true;
        let engine = InsightsEngine::new(config)?;

        let summary = engine.ingest(staff())?;
        assert_eq!(summary.row_count, 2);
        assert_eq!(summary.duplicate_rows_removed, 1);
        Ok(())
    }

    #[test]
    fn test_cancelled_ingest_publishes_nothing() -> Result<()> {
        let engine = InsightsEngine::new(EngineConfig::default())?;
        let cancel = AtomicBool::new(true);
        let err = engine
            .ingest_cancellable(staff(), &cancel)
            .expect_err("cancelled run must fail");
        assert!(matches!(err, InsightsError::Aborted));
        assert_eq!(engine.state(), StoreState::Empty);

        cancel.store(false, Ordering::Release);
        engine.ingest_cancellable(staff(), &cancel)?;
        assert_eq!(engine.state(), StoreState::Ready);
        Ok(())
    }

    #[test]
    fn test_invalid_table_keeps_previous_snapshot() -> Result<()> {
        let engine = InsightsEngine::new(EngineConfig::default())?;
        engine.ingest(staff())?;
        let before = engine.snapshot()?;

        let ragged = RawTable::new(
            vec!["Name".to_owned(), "Salary".to_owned()],
            vec![vec!["A".into()], vec![CellValue::Empty, 1.0.into()]],
        );
        let err = engine.ingest(ragged).expect_err("ragged table");
        assert!(err.is_ingestion_failure());
        assert_eq!(engine.snapshot()?.id, before.id);
        Ok(())
    }

    #[test]
    fn test_cancelled_file_ingest_keeps_previous_dataset() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("staff.csv");
        std::fs::write(&path, "Name,Salary\nA,50000\nB,60000\n")?;

        let engine = InsightsEngine::new(EngineConfig::default())?;
        engine.ingest(staff())?;
        let before = engine.snapshot()?;

        let err = engine
            .ingest_file_cancellable(&path, &AtomicBool::new(true))
            .expect_err("cancelled file ingest must fail");
        assert!(matches!(err, InsightsError::Aborted));
        assert_eq!(engine.snapshot()?.id, before.id);

        let summary = engine.ingest_file_cancellable(&path, &AtomicBool::new(false))?;
        assert_eq!(summary.row_count, 2);
        assert_eq!(engine.snapshot()?.source.as_deref(), Some("staff.csv"));
        Ok(())
    }

    #[test]
    fn test_unopenable_file_is_ingestion_failure() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let engine = InsightsEngine::new(EngineConfig::default())?;
        let err = engine
            .ingest_file(&dir.path().join("absent.csv"))
            .expect_err("missing file");
        assert!(matches!(err, InsightsError::Parse(_)));
        assert!(err.is_ingestion_failure());
        assert_eq!(engine.state(), StoreState::Empty);
        Ok(())
    }

    #[test]
    fn test_busy_while_permit_held() -> Result<()> {
        let engine = InsightsEngine::new(EngineConfig::default())?;
        let permit = engine.store().begin_ingest()?;
        assert!(matches!(engine.ingest(staff()), Err(InsightsError::Busy)));
        drop(permit);
        engine.ingest(staff())?;
        Ok(())
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.charts.bucket_count = 0;
        assert!(matches!(
            InsightsEngine::new(config),
            Err(InsightsError::Config(_))
        ));
    }

    #[test]
    fn test_clear_returns_to_empty() -> Result<()> {
        let engine = InsightsEngine::new(EngineConfig::default())?;
        engine.ingest(staff())?;
        engine.clear()?;
        assert!(engine.get_charts().is_err_and(|e| e.is_no_dataset()));
        Ok(())
    }
}
