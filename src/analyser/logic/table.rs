//! Raw and typed table representations.
//!
//! A [`RawTable`] is what the file-parsing collaborator hands over: ordered
//! headers plus rows of [`CellValue`]s, with no typing decisions made yet. Once
//! the inferencer has produced a [`TableSchema`], [`TypedTable::from_raw`]
//! reinterprets every column as either numbers or normalised strings and
//! loads the result into a polars [`DataFrame`].

use super::types::{ColumnKind, TableSchema};
use crate::config::InferenceSettings;
use crate::error::{InsightsError, Result};
use polars::prelude::*;
use std::collections::HashSet;

/// A single unprocessed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Empty cells, blank strings and configured null tokens carry no value.
    pub fn is_empty(&self, settings: &InferenceSettings) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => {
                let trimmed = s.trim();
                trimmed.is_empty() || settings.is_null_token(trimmed)
            }
            Self::Number(v) => !v.is_finite(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Empty => None,
            Self::Text(s) => parse_number(s),
            Self::Number(v) => v.is_finite().then_some(*v),
        }
    }

    /// Trimmed, case-preserved text for categorical use.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_owned())
            }
            Self::Number(v) => v.is_finite().then(|| canonical_number(*v)),
        }
    }

    // Identity used when removing duplicate rows.
    fn row_key(&self) -> String {
        match self {
            Self::Empty => "\u{0}".to_owned(),
            Self::Text(s) => format!("t{s}"),
            Self::Number(v) => format!("n{}", v.to_bits()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s.to_owned())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.is_empty() {
            Self::Empty
        } else {
            Self::Text(s)
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<Self>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Empty, Into::into)
    }
}

/// Renders a number the way a spreadsheet user typed it: `50000`, not `50000.0`.
pub fn canonical_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        v.to_string()
    }
}

/// Parses a cell as a number, accepting the formats HR exports commonly use.
///
/// Accepted: optional sign, currency symbol before or after (`$ € £ ¥`),
/// a trailing `%` (the bare number is returned), `,` thousands separators with
/// `.` decimals (`1,234.5`), `.` thousands separators with `,` decimals
/// (`1.234,5`) and a lone decimal comma (`3,5`). Non-finite results are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let mut s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let negative = if let Some(rest) = s.strip_prefix('-') {
        s = rest;
        true
    } else {
        if let Some(rest) = s.strip_prefix('+') {
            s = rest;
        }
        false
    };

    s = s.trim_start_matches(is_currency).trim_end_matches(is_currency);
    s = s.strip_suffix('%').unwrap_or(s).trim();
    if s.is_empty() || !s.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }

    let normalised = normalise_separators(s)?;
    let value: f64 = normalised.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

fn is_currency(c: char) -> bool {
    matches!(c, '$' | '€' | '£' | '¥') || c.is_whitespace()
}

fn normalise_separators(s: &str) -> Option<String> {
    let last_comma = s.rfind(',');
    let last_dot = s.rfind('.');

    match (last_comma, last_dot) {
        (None, _) => Some(s.to_owned()),
        (Some(comma), Some(dot)) if comma < dot => {
            // 1,234,567.89
            let (int_part, frac) = s.split_at(dot);
            valid_grouping(int_part, ',').then(|| format!("{}{frac}", int_part.replace(',', "")))
        }
        (Some(comma), Some(_)) => {
            // 1.234.567,89
            let (int_part, frac) = s.split_at(comma);
            let frac = frac.get(1..)?;
            valid_grouping(int_part, '.')
                .then(|| format!("{}.{frac}", int_part.replace('.', "")))
        }
        (Some(comma), None) => {
            let frac = s.get(comma + 1..)?;
            if valid_grouping(s, ',') {
                Some(s.replace(',', ""))
            } else if s.matches(',').count() == 1 && !frac.is_empty() {
                Some(s.replacen(',', ".", 1))
            } else {
                None
            }
        }
    }
}

// "1,234,567" style: a 1-3 digit head followed by 3 digit groups.
fn valid_grouping(s: &str, sep: char) -> bool {
    let mut groups = s.split(sep);
    let Some(head) = groups.next() else {
        return false;
    };
    if head.is_empty() || head.len() > 3 || !head.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    groups.all(|g| g.len() == 3 && g.chars().all(|c| c.is_ascii_digit()))
}

/// Unprocessed tabular data as produced by file parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Builds a table without validating it; structural checks run in the
    /// pipeline's validate stage.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.headers.len()
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
    }

    pub fn set_headers(&mut self, headers: Vec<String>) {
        self.headers = headers;
    }

    /// Cells of one column in row order. Rows too short for `index` are skipped,
    /// so callers should only use this on validated tables.
    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Removes exact duplicate rows, keeping the first occurrence.
    /// Returns how many rows were dropped.
    pub fn dedup_rows(&mut self) -> usize {
        let before = self.rows.len();
        let mut seen = HashSet::new();
        self.rows.retain(|row| {
            let key: Vec<String> = row.iter().map(CellValue::row_key).collect();
            seen.insert(key)
        });
        before - self.rows.len()
    }
}

/// Whether a typed column holds numbers (`Float64`) or text (`String`).
pub fn column_kind(series: &Series) -> ColumnKind {
    if series.dtype() == &DataType::Float64 {
        ColumnKind::Numeric
    } else {
        ColumnKind::Categorical
    }
}

/// Each row of a typed column rendered as text; numbers use [`canonical_number`].
///
/// # Errors
///
/// Returns an error if the column is neither `Float64` nor `String`.
pub fn column_texts(series: &Series) -> Result<Vec<Option<String>>> {
    Ok(match column_kind(series) {
        ColumnKind::Numeric => series
            .f64()?
            .into_iter()
            .map(|v| v.map(canonical_number))
            .collect(),
        ColumnKind::Categorical => series
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_owned))
            .collect(),
    })
}

/// A [`RawTable`] reinterpreted according to its [`TableSchema`].
///
/// Backed by a polars [`DataFrame`] whose columns are either `Float64`
/// (numeric) or `String` (categorical), with missing cells as nulls.
#[derive(Debug, Clone, Default)]
pub struct TypedTable {
    row_count: usize,
    frame: DataFrame,
}

impl TypedTable {
    /// # Errors
    ///
    /// Returns [`InsightsError::InvalidTable`] if the schema does not describe
    /// the table's headers in order, or a row is narrower than the header.
    pub fn from_raw(
        raw: &RawTable,
        schema: &TableSchema,
        settings: &InferenceSettings,
    ) -> Result<Self> {
        if schema.len() != raw.col_count() {
            return Err(InsightsError::InvalidTable(format!(
                "schema describes {} columns but the table has {}",
                schema.len(),
                raw.col_count()
            )));
        }

        let mut columns = Vec::with_capacity(raw.col_count());
        for (index, (header, column_schema)) in raw.headers().iter().zip(schema.iter()).enumerate() {
            if *header != column_schema.name {
                return Err(InsightsError::InvalidTable(format!(
                    "schema column '{}' does not match header '{header}'",
                    column_schema.name
                )));
            }

            let cells = raw
                .rows()
                .iter()
                .enumerate()
                .map(|(row_index, row)| {
                    row.get(index).ok_or_else(|| {
                        InsightsError::InvalidTable(format!(
                            "row {} has no cell for column '{header}'",
                            row_index + 1
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let series = match column_schema.kind {
                ColumnKind::Numeric => {
                    let values: Vec<Option<f64>> = cells
                        .iter()
                        .map(|cell| {
                            if cell.is_empty(settings) {
                                None
                            } else {
                                cell.as_number()
                            }
                        })
                        .collect();
                    Series::new(header.as_str().into(), values)
                }
                ColumnKind::Categorical => {
                    let values: Vec<Option<String>> = cells
                        .iter()
                        .map(|cell| {
                            if cell.is_empty(settings) {
                                None
                            } else {
                                cell.as_text()
                            }
                        })
                        .collect();
                    Series::new(header.as_str().into(), values)
                }
            };
            columns.push(Column::from(series));
        }

        let frame = DataFrame::new(columns)
            .map_err(|e| InsightsError::InvalidTable(e.to_string()))?;
        Ok(Self {
            row_count: raw.row_count(),
            frame,
        })
    }

    /// Wraps an existing frame.
    ///
    /// # Errors
    ///
    /// Returns [`InsightsError::InvalidTable`] if a column is neither `Float64`
    /// nor `String`.
    pub fn from_frame(frame: DataFrame) -> Result<Self> {
        if let Some(column) = frame
            .get_columns()
            .iter()
            .find(|c| !matches!(c.dtype(), DataType::Float64 | DataType::String))
        {
            return Err(InsightsError::InvalidTable(format!(
                "column '{}' has unsupported type {}",
                column.name(),
                column.dtype()
            )));
        }
        Ok(Self {
            row_count: frame.height(),
            frame,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn col_count(&self) -> usize {
        self.frame.width()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Columns in header order.
    pub fn series(&self) -> impl Iterator<Item = &Series> + '_ {
        self.frame
            .get_columns()
            .iter()
            .map(Column::as_materialized_series)
    }

    pub fn column(&self, name: &str) -> Option<&Series> {
        self.frame
            .column(name)
            .ok()
            .map(Column::as_materialized_series)
    }
}
