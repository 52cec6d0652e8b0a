//! Chart-ready aggregates.
//!
//! - `salary_buckets`: equal-width histogram of the salary column
//! - `cat_<column>`: value counts for every categorical column, optionally
//!   capped with the tail folded into an "Other" point

use super::kpi::find_role;
use super::profiling::value_counts;
use super::table::{TypedTable, column_kind};
use super::types::{ChartPoint, ChartSet, ColumnKind, ColumnRole, IngestWarning, ValueCount};
use crate::config::ChartSettings;
use crate::error::Result;
use crate::utils::fmt_number_to;
use polars::prelude::*;

const MAX_LABEL_DECIMALS: usize = 12;

/// One histogram bucket. Every bucket covers `[low, high)` except the last,
/// which also includes `high`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub low: f64,
    pub high: f64,
    pub count: usize,
}

/// Partitions `[min, max]` of `values` into `bucket_count` equal-width buckets.
///
/// Missing values are ignored. Returns no buckets when nothing is present or
/// the bucket count is zero. When every value is the same a single `[v, v]`
/// bucket holds them all.
pub fn histogram(values: &Float64Chunked, bucket_count: usize) -> Vec<Bucket> {
    let (Some(min), Some(max)) = (values.min(), values.max()) else {
        return Vec::new();
    };
    if bucket_count == 0 {
        return Vec::new();
    }

    if (max - min).abs() < f64::EPSILON {
        return vec![Bucket {
            low: min,
            high: max,
            count: values.len() - values.null_count(),
        }];
    }

    let width = (max - min) / bucket_count as f64;
    let edge = |i: usize| {
        if i >= bucket_count {
            max
        } else {
            min + i as f64 * width
        }
    };

    let mut counts = vec![0_usize; bucket_count];
    for value in values.into_iter().flatten() {
        let mut index = (((value - min) / width).floor() as usize).min(bucket_count - 1);
        // Division rounding can disagree with the rendered edges by one bucket.
        if index > 0 && value < edge(index) {
            index -= 1;
        } else if index + 1 < bucket_count && value >= edge(index + 1) {
            index += 1;
        }
        if let Some(count) = counts.get_mut(index) {
            *count += 1;
        }
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bucket {
            low: edge(i),
            high: edge(i + 1),
            count,
        })
        .collect()
}

/// Renders buckets as chart points labelled `[low, high)`, the last one `[low, high]`.
///
/// Edges get as many decimals as the bucket width needs for neighbouring
/// edges to differ, and at least two.
pub fn bucket_points(buckets: &[Bucket]) -> Vec<ChartPoint> {
    let decimals = buckets
        .first()
        .map_or(2, |bucket| label_decimals(bucket.high - bucket.low));
    let last = buckets.len().saturating_sub(1);

    buckets
        .iter()
        .enumerate()
        .map(|(i, bucket)| {
            let close = if i == last { ']' } else { ')' };
            ChartPoint::new(
                format!(
                    "[{}, {}{close}",
                    fmt_number_to(bucket.low, decimals),
                    fmt_number_to(bucket.high, decimals)
                ),
                bucket.count,
            )
        })
        .collect()
}

fn label_decimals(width: f64) -> usize {
    if width <= 0.0 || !width.is_finite() {
        return 2;
    }
    let needed = (-width.log10()).ceil() + 1.0;
    if needed <= 2.0 {
        2
    } else {
        (needed as usize).min(MAX_LABEL_DECIMALS)
    }
}

/// Converts ordered value counts into chart points.
///
/// With a `cap`, the first `cap` values are kept and the rest are summed into
/// a single `other_label` point. If a kept value is already called
/// `other_label`, the tail is added to that point instead.
pub fn distribution(
    mut counts: Vec<ValueCount>,
    cap: Option<usize>,
    other_label: &str,
) -> Vec<ChartPoint> {
    let overflow = match cap {
        Some(cap) if counts.len() > cap => counts.split_off(cap),
        _ => Vec::new(),
    };

    let mut points: Vec<ChartPoint> = counts
        .into_iter()
        .map(|vc| ChartPoint::new(vc.value, vc.count))
        .collect();
    if !overflow.is_empty() {
        let folded: usize = overflow.iter().map(|vc| vc.count).sum();
        match points.iter_mut().find(|p| p.label == other_label) {
            Some(existing) => existing.value += folded,
            None => points.push(ChartPoint::new(other_label, folded)),
        }
    }
    points
}

/// Builds every chart for a typed table.
///
/// # Errors
///
/// Returns an error if a column's data does not match its kind.
pub fn build_charts(
    table: &TypedTable,
    settings: &ChartSettings,
    warnings: &mut Vec<IngestWarning>,
) -> Result<ChartSet> {
    let mut charts = ChartSet::default();

    if let Some(column) = find_role(table, ColumnRole::Salary, &settings.salary, warnings) {
        match column_kind(column) {
            ColumnKind::Numeric => {
                let buckets = histogram(column.f64()?, settings.bucket_count);
                if !buckets.is_empty() {
                    charts.insert(ChartSet::SALARY_BUCKETS, bucket_points(&buckets));
                }
            }
            ColumnKind::Categorical => warnings.push(IngestWarning::MissingColumn {
                role: ColumnRole::Salary,
                requested: Some(column.name().to_string()),
                reason: "column is not numeric".to_owned(),
            }),
        }
    }

    for series in table.series() {
        if column_kind(series) == ColumnKind::Categorical {
            charts.insert(
                ChartSet::categorical_key(series.name()),
                distribution(
                    value_counts(series.str()?)?,
                    settings.category_cap,
                    &settings.other_label,
                ),
            );
        }
    }

    Ok(charts)
}
