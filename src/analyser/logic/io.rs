//! Upload parsing: delimited text through `csv`, workbooks through `calamine`.

use super::table::{CellValue, RawTable, canonical_number};
use crate::error::{InsightsError, Result, ResultExt as _};
use calamine::{Data, Reader as _, open_workbook_auto};
use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

// Rows read between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 1024;

/// Reads delimited text into a [`RawTable`]. The first record is the header.
///
/// Rows are read flexibly: a row with the wrong number of cells is kept as-is
/// so the pipeline's validate stage can report it. Empty cells become
/// [`CellValue::Empty`], everything else stays text.
///
/// # Errors
///
/// Returns [`InsightsError::Parse`] on malformed input (bad quoting, invalid
/// UTF-8) or when there is no header record.
pub fn read_delimited<R: Read>(reader: R, delimiter: u8) -> Result<RawTable> {
    read_delimited_cancellable(reader, delimiter, &AtomicBool::new(false))
}

/// Like [`read_delimited`], giving up once `cancel` is raised.
///
/// # Errors
///
/// Returns [`InsightsError::Aborted`] when cancelled, otherwise as
/// [`read_delimited`].
pub fn read_delimited_cancellable<R: Read>(
    reader: R,
    delimiter: u8,
    cancel: &AtomicBool,
) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV headers")?
        .iter()
        .map(str::to_owned)
        .collect();
    if headers.is_empty() {
        return Err(InsightsError::Parse("file has no header row".to_owned()));
    }

    let mut table = RawTable::new(headers, Vec::new());
    for (index, result) in rdr.records().enumerate() {
        check_cancel(index, cancel)?;
        let record = result.with_context(|| format!("Failed to read record {}", index + 1))?;
        table.push_row(record.iter().map(CellValue::from).collect());
    }

    Ok(table)
}

pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    read_delimited(reader, b',')
}

/// Reads the first worksheet of a workbook. The first row is the header.
///
/// Numeric cells become [`CellValue::Number`], dates are rendered as text and
/// error cells (`#N/A`, `#DIV/0!`) count as empty.
///
/// # Errors
///
/// Returns [`InsightsError::Parse`] if the workbook cannot be opened or read,
/// or has no rows, and [`InsightsError::Aborted`] when cancelled.
pub fn read_workbook(path: &Path, cancel: &AtomicBool) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InsightsError::Parse("workbook has no worksheets".to_owned()))??;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| InsightsError::Parse("worksheet is empty".to_owned()))?
        .iter()
        .map(header_text)
        .collect();

    let mut table = RawTable::new(headers, Vec::new());
    for (index, row) in rows.enumerate() {
        check_cancel(index, cancel)?;
        table.push_row(row.iter().map(workbook_cell).collect());
    }

    Ok(table)
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(v) => canonical_number(*v),
        other => other.to_string(),
    }
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::from(*v),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or(CellValue::Number(dt.as_f64()), |d| CellValue::Text(d.to_string())),
        other => CellValue::Text(other.to_string()),
    }
}

fn check_cancel(row_index: usize, cancel: &AtomicBool) -> Result<()> {
    if row_index % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Acquire) {
        return Err(InsightsError::Aborted);
    }
    Ok(())
}

/// Loads an upload from disk, choosing the parser by extension.
///
/// `.csv` and `.tsv` are read as delimited text; `.xlsx`, `.xlsm`, `.xls` and
/// `.ods` through their first worksheet.
///
/// # Errors
///
/// Returns [`InsightsError::Parse`] if the file cannot be opened, has an
/// unsupported extension or is malformed.
pub fn load_table(path: &Path) -> Result<RawTable> {
    load_table_cancellable(path, &AtomicBool::new(false))
}

/// Like [`load_table`], giving up once `cancel` is raised.
///
/// # Errors
///
/// Returns [`InsightsError::Aborted`] when cancelled, otherwise as [`load_table`].
pub fn load_table_cancellable(path: &Path, cancel: &AtomicBool) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => read_text_file(path, b',', cancel),
        "tsv" => read_text_file(path, b'\t', cancel),
        "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path, cancel)
            .with_context(|| format!("Failed to parse {}", path.display())),
        _ => Err(InsightsError::Parse(format!(
            "Unsupported file extension: {ext}"
        ))),
    }
}

fn read_text_file(path: &Path, delimiter: u8, cancel: &AtomicBool) -> Result<RawTable> {
    let file = std::fs::File::open(path).map_err(|e| {
        InsightsError::Parse(format!("Failed to open {}: {e}", path.display()))
    })?;
    read_delimited_cancellable(std::io::BufReader::new(file), delimiter, cancel)
        .with_context(|| format!("Failed to parse {}", path.display()))
}
