//! The processed result of one successful ingestion

use crate::analyser::logic::types::duration_serde;
use crate::analyser::logic::{ChartSet, IngestWarning, KpiSet, Summary, TableSchema, TypedTable};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Everything the query side needs, built once by the pipeline.
///
/// Snapshots are never mutated after construction; the store swaps whole
/// snapshots and hands readers an `Arc`.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSnapshot {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Where the data came from, e.g. the uploaded file name
    pub source: Option<String>,
    #[serde(with = "duration_serde")]
    pub processing_time: Duration,
    #[serde(skip)]
    pub table: TypedTable,
    pub schema: TableSchema,
    pub summary: Summary,
    pub kpis: KpiSet,
    pub charts: ChartSet,
    pub warnings: Vec<IngestWarning>,
}

impl DatasetSnapshot {
    pub fn row_count(&self) -> usize {
        self.summary.row_count
    }

    pub fn display_name(&self) -> String {
        self.source
            .clone()
            .unwrap_or_else(|| format!("dataset {}", self.id))
    }
}
