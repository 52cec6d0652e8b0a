//! Scalar business metrics.

use super::naming::resolve_column;
use super::profiling::value_counts;
use super::table::{TypedTable, column_kind, column_texts};
use super::types::{ChartPoint, ColumnKind, ColumnRole, IngestWarning, KpiSet, Summary};
use crate::config::{ColumnRoleConfig, KpiSettings};
use crate::error::Result;
use polars::prelude::*;

/// Computes the KPI set.
///
/// Numeric means come from `summary` so both views always agree. A role
/// column that cannot be found never fails the computation: the KPI falls back
/// to its documented default and a [`IngestWarning::MissingColumn`] is pushed.
///
/// # Errors
///
/// Returns an error if a column's data does not match its kind.
pub fn compute_kpis(
    table: &TypedTable,
    summary: &Summary,
    settings: &KpiSettings,
    warnings: &mut Vec<IngestWarning>,
) -> Result<KpiSet> {
    let total_rows = table.row_count();

    let identifier = find_role(table, ColumnRole::Identifier, &settings.identifier, warnings);
    let unique_employees = match identifier {
        Some(column) => column.drop_nulls().n_unique()?,
        None => total_rows,
    };

    let numeric_mean = summary
        .numeric_columns
        .iter()
        .map(|name| (name.clone(), summary.mean_of(name)))
        .collect();

    let attrition_count =
        match find_role(table, ColumnRole::Attrition, &settings.attrition, warnings) {
            Some(column) => count_positive(column, &settings.positive_values)?,
            None => 0,
        };
    let attrition_rate = if total_rows == 0 {
        0.0
    } else {
        attrition_count as f64 / total_rows as f64
    };

    let department_distribution =
        match find_role(table, ColumnRole::Department, &settings.department, warnings) {
            Some(column) if column_kind(column) == ColumnKind::Categorical => Some(
                value_counts(column.str()?)?
                    .into_iter()
                    .map(|vc| ChartPoint::new(vc.value, vc.count))
                    .collect(),
            ),
            Some(column) => {
                warnings.push(IngestWarning::MissingColumn {
                    role: ColumnRole::Department,
                    requested: Some(column.name().to_string()),
                    reason: "column is numeric, expected categorical".to_owned(),
                });
                None
            }
            None => None,
        };

    Ok(KpiSet {
        total_rows,
        unique_employees,
        numeric_mean,
        attrition_rate,
        attrition_count,
        department_distribution,
    })
}

/// Resolves a role column, recording a warning when a configured role finds nothing.
pub(crate) fn find_role<'t>(
    table: &'t TypedTable,
    role: ColumnRole,
    config: &ColumnRoleConfig,
    warnings: &mut Vec<IngestWarning>,
) -> Option<&'t Series> {
    let headers = table.column_names();
    let found = resolve_column(&headers, config).and_then(|name| table.column(name));

    if found.is_none() && (config.column.is_some() || !config.hints.is_empty()) {
        let reason = if config.column.is_some() {
            "configured column not present".to_owned()
        } else {
            format!("no header matches hints {:?}", config.hints)
        };
        warnings.push(IngestWarning::MissingColumn {
            role,
            requested: config.column.clone(),
            reason,
        });
    }
    found
}

fn count_positive(column: &Series, positive_values: &[String]) -> Result<usize> {
    let is_positive = |value: &str| {
        let value = value.trim();
        positive_values
            .iter()
            .any(|positive| positive.trim().eq_ignore_ascii_case(value))
    };
    Ok(column_texts(column)?
        .iter()
        .flatten()
        .filter(|value| is_positive(value))
        .count())
}
