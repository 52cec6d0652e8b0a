//! Pure data-processing components.
//!
//! Everything in here is a function of its inputs: no locks, no logging, no
//! shared state. The [`lifecycle`](crate::analyser::lifecycle) module wires
//! these into the ingestion pipeline.
//!
//! ```
//! use hr_insights::analyser::logic::{RawTable, infer_schema, summarise, TypedTable};
//! use hr_insights::config::InferenceSettings;
//!
//! # fn example() -> hr_insights::error::Result<()> {
//! let raw = RawTable::new(
//!     vec!["Name".to_owned(), "Salary".to_owned()],
//!     vec![
//!         vec!["A".into(), "50000".into()],
//!         vec!["B".into(), "60000".into()],
//!     ],
//! );
//! let settings = InferenceSettings::default();
//! let (schema, _warnings) = infer_schema(&raw, &settings);
//! let typed = TypedTable::from_raw(&raw, &schema, &settings)?;
//! let summary = summarise(&typed, &schema, 10)?;
//! assert_eq!(summary.numeric_columns, vec!["Salary".to_owned()]);
//! # Ok(())
//! # }
//! # example().expect("example runs");
//! ```

pub mod charts;
pub mod inference;
pub mod io;
pub mod kpi;
pub mod naming;
pub mod profiling;
pub mod table;
pub mod types;

pub use charts::{Bucket, build_charts, histogram};
pub use inference::infer_schema;
pub use io::{load_table, load_table_cancellable, read_csv, read_workbook};
pub use kpi::compute_kpis;
pub use naming::{normalise_headers, resolve_column};
pub use profiling::{describe_numeric, summarise, top_k, value_counts};
pub use table::{CellValue, RawTable, TypedTable, column_kind, column_texts, parse_number};
pub use types::{
    ChartPoint, ChartSet, ColumnKind, ColumnRole, ColumnSchema, InferenceBasis, IngestWarning,
    KpiSet, NumericStats, Summary, TableSchema, ValueCount,
};
