//! Clean stage - header normalisation and duplicate row removal

use super::{LifecycleStage, StageExecutor, StageOutcome};
use crate::analyser::logic::{RawTable, normalise_headers};
use crate::config::IngestSettings;
use crate::error::Result;

/// Clean stage executor
/// Runs after validation, so headers are known to be unique once trimmed:
/// - Header names trimmed, blank ones named `column_<n>`
/// - Exact duplicate rows dropped when enabled
pub struct CleanStageExecutor {
    pub drop_duplicate_rows: bool,
}

impl CleanStageExecutor {
    pub fn new(settings: &IngestSettings) -> Self {
        Self {
            drop_duplicate_rows: settings.drop_duplicate_rows,
        }
    }
}

impl StageExecutor for CleanStageExecutor {
    fn execute(&self, table: &mut RawTable) -> Result<StageOutcome> {
        let headers = normalise_headers(table.headers());
        table.set_headers(headers);

        let rows_removed = if self.drop_duplicate_rows {
            table.dedup_rows()
        } else {
            0
        };

        Ok(StageOutcome { rows_removed })
    }

    fn stage(&self) -> LifecycleStage {
        LifecycleStage::Validate
    }

    fn description(&self) -> String {
        if self.drop_duplicate_rows {
            "Normalise headers and drop duplicate rows".to_owned()
        } else {
            "Normalise headers".to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staff() -> RawTable {
        RawTable::new(
            vec![" Name".to_owned(), String::new()],
            vec![
                vec!["A".into(), "x".into()],
                vec!["A".into(), "x".into()],
                vec!["B".into(), "y".into()],
            ],
        )
    }

    #[test]
    fn test_headers_normalised_rows_kept_by_default() -> Result<()> {
        let mut table = staff();
        let outcome = CleanStageExecutor::new(&IngestSettings::default()).execute(&mut table)?;
        assert_eq!(outcome.rows_removed, 0);
        assert_eq!(table.headers(), ["Name", "column_2"]);
        assert_eq!(table.row_count(), 3);
        Ok(())
    }

    #[test]
    fn test_duplicate_rows_dropped_when_enabled() -> Result<()> {
        let mut table = staff();
        let executor = CleanStageExecutor {
            drop_duplicate_rows: true,
        };
        let outcome = executor.execute(&mut table)?;
        assert_eq!(outcome.rows_removed, 1);
        assert_eq!(table.row_count(), 2);
        assert_eq!(executor.stage(), LifecycleStage::Validate);
        Ok(())
    }
}
