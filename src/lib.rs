//! # HR Insights - data-processing engine for HR datasets
//!
//! Turns an uploaded table of employee records into three dashboard views:
//! an ETL summary (shape and per-column statistics), a KPI set (headcount,
//! attrition, per-column means) and chart-ready aggregates (a salary histogram
//! and value counts for every categorical column).
//!
//! ## Quick Start
//!
//! ```no_run
//! use hr_insights::analyser::lifecycle::InsightsEngine;
//! use hr_insights::config::EngineConfig;
//! use std::path::Path;
//!
//! # fn example() -> hr_insights::error::Result<()> {
//! let engine = InsightsEngine::new(EngineConfig::default())?;
//! engine.ingest_file(Path::new("staff.xlsx"))?;
//!
//! // Later, from any thread
//! let kpis = engine.get_kpis()?;
//! println!("Attrition: {:.1}%", kpis.attrition_rate * 100.0);
//! for point in engine.get_charts()?.get("salary_buckets").unwrap_or_default() {
//!     println!("{}: {}", point.label, point.value);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Modules
//!
//! - [`analyser`]: data processing
//!   - [`analyser::logic`]: type inference, statistics, KPIs, charts
//!   - [`analyser::lifecycle`]: ingestion pipeline and the current-dataset store
//! - [`config`]: engine configuration (JSON)
//! - [`error`]: error types and handling utilities
//! - [`logging`]: tracing subscriber setup
//! - [`utils`]: formatting helpers
//!
//! ## Key Concepts
//!
//! ### Two-phase typing
//!
//! Raw cells are first classified per column (numeric when enough non-empty
//! cells parse as numbers), then the whole table is reinterpreted in one pass.
//! Unparseable cells in a numeric column become missing values rather than
//! errors.
//!
//! ### One dataset, many readers
//!
//! Each successful upload builds an immutable snapshot that replaces the
//! previous one in a single pointer swap. Queries share the snapshot through an
//! `Arc` and never wait for an upload in progress.

#![warn(clippy::all, rust_2018_idioms)]

pub mod analyser;
pub mod config;
pub mod error;
pub mod logging;
pub mod utils;
