//! Stages of the ingestion pipeline

pub mod clean;
pub mod validate;

use crate::analyser::logic::RawTable;
use crate::error::{InsightsError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// Ingestion stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleStage {
    /// Structural checks on the raw table
    Validate,
    /// Column kind inference
    Infer,
    /// Raw cells reinterpreted per the inferred schema
    Type,
    /// Summary statistics
    Profile,
    /// KPIs and charts
    Aggregate,
    /// Snapshot handed to the store
    Publish,
}

impl LifecycleStage {
    pub const ALL: [Self; 6] = [
        Self::Validate,
        Self::Infer,
        Self::Type,
        Self::Profile,
        Self::Aggregate,
        Self::Publish,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validate => "Validate",
            Self::Infer => "Infer",
            Self::Type => "Type",
            Self::Profile => "Profile",
            Self::Aggregate => "Aggregate",
            Self::Publish => "Publish",
        }
    }

    pub fn parse_stage(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s))
    }

    /// Get the next stage in the pipeline
    pub fn next_stage(&self) -> Option<Self> {
        match self {
            Self::Validate => Some(Self::Infer),
            Self::Infer => Some(Self::Type),
            Self::Type => Some(Self::Profile),
            Self::Profile => Some(Self::Aggregate),
            Self::Aggregate => Some(Self::Publish),
            Self::Publish => None,
        }
    }
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What a preparation executor changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageOutcome {
    pub rows_removed: usize,
}

/// Trait for executors that check or prepare the raw table before inference
pub trait StageExecutor {
    /// Run against the raw table, possibly rewriting it
    fn execute(&self, table: &mut RawTable) -> Result<StageOutcome>;

    /// Get the stage this executor belongs to
    fn stage(&self) -> LifecycleStage;

    /// Get a description of what this executor does
    fn description(&self) -> String;
}

/// Fails with [`InsightsError::Aborted`] once the caller has raised `cancel`.
///
/// Called before each stage so no partial work outlives a cancellation.
pub fn checkpoint(stage: LifecycleStage, cancel: &AtomicBool) -> Result<()> {
    if cancel.load(Ordering::Acquire) {
        tracing::debug!(stage = stage.as_str(), "Ingestion cancelled");
        return Err(InsightsError::Aborted);
    }
    tracing::debug!(stage = stage.as_str(), "Entering stage");
    Ok(())
}
