//! Statistical summarisation of typed tables.
//!
//! Numeric columns get count, missing count, mean, median, min, max and the
//! population standard deviation, all ignoring missing cells. Categorical
//! columns get value frequencies ordered by descending count, ties broken by
//! the order in which values first appear.

use super::table::{TypedTable, column_kind};
use super::types::{ColumnKind, NumericStats, Summary, TableSchema, ValueCount};
use crate::error::Result;
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};

const VALUE_FIELD: &str = "value";
const COUNT_FIELD: &str = "count";

/// Descriptive statistics for one numeric column, or `None` when every cell
/// is missing.
pub fn describe_numeric(values: &Float64Chunked) -> Option<NumericStats> {
    let missing_count = values.null_count();
    let count = values.len() - missing_count;
    if count == 0 {
        return None;
    }

    let min = values.min()?;
    let max = values.max()?;
    // Summation error can push the mean a hair outside the observed range.
    let mean = values.mean()?.clamp(min, max);

    Some(NumericStats {
        count,
        missing_count,
        mean,
        median: values.median()?,
        min,
        max,
        std: values.std(0)?,
    })
}

/// Every distinct non-missing value with its count, by descending count.
/// Equal counts keep first-seen order.
///
/// # Errors
///
/// Returns an error if polars fails to group the values.
pub fn value_counts(values: &StringChunked) -> Result<Vec<ValueCount>> {
    if values.null_count() == values.len() {
        return Ok(Vec::new());
    }

    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (position, value) in values.into_iter().enumerate() {
        if let Some(value) = value {
            first_seen.entry(value).or_insert(position);
        }
    }

    let series = values.clone().into_series().with_name(VALUE_FIELD.into());
    let counted = series.value_counts(false, false, COUNT_FIELD.into(), false)?;
    let distinct = counted.column(VALUE_FIELD)?.as_materialized_series().str()?;
    let counts = counted
        .column(COUNT_FIELD)?
        .as_materialized_series()
        .cast(&DataType::UInt64)?;

    let mut ordered: Vec<(usize, ValueCount)> = distinct
        .into_iter()
        .zip(counts.u64()?)
        .filter_map(|(value, count)| {
            let value = value?;
            let count = usize::try_from(count?).ok()?;
            let first = first_seen.get(value).copied().unwrap_or(usize::MAX);
            Some((
                first,
                ValueCount {
                    value: value.to_owned(),
                    count,
                },
            ))
        })
        .collect();
    ordered.sort_by(|(a_first, a), (b_first, b)| {
        b.count.cmp(&a.count).then(a_first.cmp(b_first))
    });

    Ok(ordered.into_iter().map(|(_, vc)| vc).collect())
}

/// The `k` most frequent values.
///
/// # Errors
///
/// Returns an error if polars fails to group the values.
pub fn top_k(values: &StringChunked, k: usize) -> Result<Vec<ValueCount>> {
    let mut counts = value_counts(values)?;
    counts.truncate(k);
    Ok(counts)
}

/// Builds the ETL summary for a typed table.
///
/// `duplicate_rows_removed` is left at zero; the pipeline fills it in when
/// duplicate removal is enabled.
///
/// # Errors
///
/// Returns an error if a column's data does not match its kind.
pub fn summarise(table: &TypedTable, schema: &TableSchema, k: usize) -> Result<Summary> {
    let mut numeric_stats = BTreeMap::new();
    let mut categorical_top = BTreeMap::new();

    for series in table.series() {
        let name = series.name().to_string();
        match column_kind(series) {
            ColumnKind::Numeric => {
                numeric_stats.insert(name, describe_numeric(series.f64()?));
            }
            ColumnKind::Categorical => {
                categorical_top.insert(name, top_k(series.str()?, k)?);
            }
        }
    }

    Ok(Summary {
        row_count: table.row_count(),
        col_count: table.col_count(),
        numeric_columns: schema.names_of_kind(ColumnKind::Numeric),
        categorical_columns: schema.names_of_kind(ColumnKind::Categorical),
        numeric_stats,
        categorical_top,
        duplicate_rows_removed: 0,
    })
}
