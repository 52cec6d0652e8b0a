//! Data processing for uploaded HR tables.
//!
//! - [`logic`]: pure components (inference, summaries, KPIs, charts)
//! - [`lifecycle`]: the ingestion pipeline and the current-dataset store

pub mod lifecycle;
pub mod logic;
