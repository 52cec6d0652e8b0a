//! Validate stage - structural checks on the raw table

use super::{LifecycleStage, StageExecutor, StageOutcome};
use crate::analyser::logic::{RawTable, normalise_headers};
use crate::error::{InsightsError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ragged rows named in the error message before the rest are summarised
const MAX_REPORTED_ROWS: usize = 5;

/// Validation rule types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationRule {
    /// Header names are distinct once trimmed
    UniqueHeaders,
    /// Every row has exactly one cell per header
    RowWidth,
}

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub rule: ValidationRule,
    pub passed: bool,
    pub message: String,
}

/// Validate stage executor
/// Runs every rule, then fails with one [`InsightsError::InvalidTable`]
/// listing all failures. Never modifies the table.
pub struct ValidateStageExecutor {
    pub rules: Vec<ValidationRule>,
}

impl Default for ValidateStageExecutor {
    fn default() -> Self {
        Self::new(Self::default_rules())
    }
}

impl ValidateStageExecutor {
    pub fn new(rules: Vec<ValidationRule>) -> Self {
        Self { rules }
    }

    pub fn default_rules() -> Vec<ValidationRule> {
        vec![ValidationRule::UniqueHeaders, ValidationRule::RowWidth]
    }

    /// Evaluate every rule without failing
    pub fn validate(&self, table: &RawTable) -> Vec<ValidationResult> {
        self.rules
            .iter()
            .map(|rule| Self::validate_rule(*rule, table))
            .collect()
    }

    fn validate_rule(rule: ValidationRule, table: &RawTable) -> ValidationResult {
        let failure = match rule {
            ValidationRule::UniqueHeaders => duplicate_headers(table),
            ValidationRule::RowWidth => ragged_rows(table),
        };

        match failure {
            Some(message) => ValidationResult {
                rule,
                passed: false,
                message,
            },
            None => ValidationResult {
                rule,
                passed: true,
                message: format!("{rule:?} passed"),
            },
        }
    }
}

fn duplicate_headers(table: &RawTable) -> Option<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for name in normalise_headers(table.headers()) {
        if !seen.insert(name.clone()) && !duplicates.contains(&name) {
            duplicates.push(name);
        }
    }

    (!duplicates.is_empty()).then(|| format!("duplicate column names: {}", duplicates.join(", ")))
}

fn ragged_rows(table: &RawTable) -> Option<String> {
    let expected = table.col_count();
    let ragged: Vec<(usize, usize)> = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| row.len() != expected)
        .map(|(index, row)| (index + 1, row.len()))
        .collect();

    if ragged.is_empty() {
        return None;
    }

    let mut details: Vec<String> = ragged
        .iter()
        .take(MAX_REPORTED_ROWS)
        .map(|(row, width)| format!("row {row} has {width} cells"))
        .collect();
    if ragged.len() > MAX_REPORTED_ROWS {
        details.push(format!("{} more", ragged.len() - MAX_REPORTED_ROWS));
    }

    Some(format!(
        "expected {expected} cells per row: {}",
        details.join(", ")
    ))
}

impl StageExecutor for ValidateStageExecutor {
    fn execute(&self, table: &mut RawTable) -> Result<StageOutcome> {
        let failed: Vec<String> = self
            .validate(table)
            .into_iter()
            .filter(|r| !r.passed)
            .map(|r| r.message)
            .collect();

        if !failed.is_empty() {
            return Err(InsightsError::InvalidTable(failed.join("; ")));
        }

        Ok(StageOutcome::default())
    }

    fn stage(&self) -> LifecycleStage {
        LifecycleStage::Validate
    }

    fn description(&self) -> String {
        format!("Run {} structural validation rules", self.rules.len())
    }
}
