//! Column type inference.
//!
//! Every cell of every column is examined; no sampling. A column is numeric
//! when at least [`InferenceSettings::numeric_threshold`] of its non-empty cells
//! parse with [`parse_number`](super::table::parse_number). Columns with no
//! non-empty cells (including every column of a zero-row table) are
//! categorical with [`InferenceBasis::NoEvidence`].

use super::table::RawTable;
use super::types::{ColumnKind, ColumnSchema, InferenceBasis, IngestWarning, TableSchema};
use crate::config::InferenceSettings;

/// Infers one [`ColumnSchema`] per header, in header order.
///
/// Returns the schema along with ambiguity warnings for columns whose numeric
/// fraction landed within `ambiguity_margin` of the threshold.
pub fn infer_schema(
    table: &RawTable,
    settings: &InferenceSettings,
) -> (TableSchema, Vec<IngestWarning>) {
    let mut columns = Vec::with_capacity(table.col_count());
    let mut warnings = Vec::new();

    for (index, name) in table.headers().iter().enumerate() {
        let column = infer_column(name, table, index, settings);

        if let Some(warning) = ambiguity(&column, settings) {
            warnings.push(warning);
        }
        columns.push(column);
    }

    (TableSchema::new(columns), warnings)
}

fn infer_column(
    name: &str,
    table: &RawTable,
    index: usize,
    settings: &InferenceSettings,
) -> ColumnSchema {
    let mut non_empty = 0_usize;
    let mut numeric_cells = 0_usize;

    for cell in table.column_cells(index) {
        if cell.is_empty(settings) {
            continue;
        }
        non_empty += 1;
        if cell.as_number().is_some() {
            numeric_cells += 1;
        }
    }

    let (kind, basis, numeric_fraction) = if non_empty == 0 {
        (ColumnKind::Categorical, InferenceBasis::NoEvidence, 0.0)
    } else {
        let fraction = numeric_cells as f64 / non_empty as f64;
        if fraction >= settings.numeric_threshold {
            (ColumnKind::Numeric, InferenceBasis::NumericEvidence, fraction)
        } else {
            (ColumnKind::Categorical, InferenceBasis::BelowThreshold, fraction)
        }
    };

    ColumnSchema {
        name: name.to_owned(),
        kind,
        basis,
        non_empty,
        numeric_cells,
        numeric_fraction,
    }
}

fn ambiguity(column: &ColumnSchema, settings: &InferenceSettings) -> Option<IngestWarning> {
    if column.basis == InferenceBasis::NoEvidence
        || column.numeric_cells == 0
        || column.numeric_cells == column.non_empty
    {
        return None;
    }

    let distance = (column.numeric_fraction - settings.numeric_threshold).abs();
    (distance <= settings.ambiguity_margin).then(|| IngestWarning::SchemaAmbiguity {
        column: column.name.clone(),
        numeric_fraction: column.numeric_fraction,
        threshold: settings.numeric_threshold,
        chosen: column.kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyser::logic::table::CellValue;

    fn single_column(cells: Vec<CellValue>) -> RawTable {
        RawTable::new(
            vec!["Value".to_owned()],
            cells.into_iter().map(|c| vec![c]).collect(),
        )
    }

    #[test]
    fn test_numeric_and_categorical() {
        let table = RawTable::new(
            vec!["Name".to_owned(), "Salary".to_owned()],
            vec![
                vec!["A".into(), "50,000".into()],
                vec!["B".into(), 60000.0.into()],
                vec!["C".into(), CellValue::Empty],
            ],
        );
        let (schema, warnings) = infer_schema(&table, &InferenceSettings::default());

        assert_eq!(schema.kind_of("Name"), Some(ColumnKind::Categorical));
        assert_eq!(schema.kind_of("Salary"), Some(ColumnKind::Numeric));
        let salary = schema.get("Salary").expect("salary column");
        assert_eq!(salary.non_empty, 2);
        assert_eq!(salary.basis, InferenceBasis::NumericEvidence);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_no_evidence_defaults_to_categorical() {
        let table = single_column(vec![CellValue::Empty, "NA".into(), "  ".into()]);
        let (schema, warnings) = infer_schema(&table, &InferenceSettings::default());
        let column = schema.get("Value").expect("column");
        assert_eq!(column.kind, ColumnKind::Categorical);
        assert_eq!(column.basis, InferenceBasis::NoEvidence);
        assert!(warnings.is_empty());

        let empty = RawTable::new(vec!["A".to_owned(), "B".to_owned()], Vec::new());
        let (schema, _) = infer_schema(&empty, &InferenceSettings::default());
        assert_eq!(schema.len(), 2);
        assert!(schema.iter().all(|c| c.kind == ColumnKind::Categorical));
    }

    #[test]
    fn test_zero_columns_gives_empty_schema() {
        let (schema, warnings) = infer_schema(&RawTable::default(), &InferenceSettings::default());
        assert!(schema.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_threshold_boundary_is_numeric_and_ambiguous() {
        // 9 of 10 non-empty cells are numbers: exactly at the default threshold
        let mut cells: Vec<CellValue> = (1..=9).map(|v| CellValue::from(f64::from(v))).collect();
        cells.push("unknown".into());
        let (schema, warnings) = infer_schema(&single_column(cells), &InferenceSettings::default());

        assert_eq!(schema.kind_of("Value"), Some(ColumnKind::Numeric));
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings.first(),
            Some(IngestWarning::SchemaAmbiguity { chosen: ColumnKind::Numeric, .. })
        ));
    }

    #[test]
    fn test_mostly_text_is_categorical_without_warning() {
        let cells = vec!["Eng".into(), "Sales".into(), "42".into(), "HR".into()];
        let (schema, warnings) = infer_schema(&single_column(cells), &InferenceSettings::default());
        let column = schema.get("Value").expect("column");
        assert_eq!(column.kind, ColumnKind::Categorical);
        assert_eq!(column.basis, InferenceBasis::BelowThreshold);
        assert!((column.numeric_fraction - 0.25).abs() < 1e-12);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_inference_is_deterministic() {
        let table = RawTable::new(
            vec!["Age".to_owned(), "Team".to_owned()],
            vec![
                vec!["41".into(), "Blue".into()],
                vec!["n/a".into(), "7".into()],
                vec!["38".into(), "Red".into()],
            ],
        );
        let settings = InferenceSettings::default();
        assert_eq!(infer_schema(&table, &settings), infer_schema(&table, &settings));
    }
}
