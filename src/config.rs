use crate::error::{InsightsError, Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a special-purpose column (identifier, attrition flag, salary, ...) is found.
///
/// An explicit `column` wins. Otherwise the first header equal to one of the
/// `hints` (case-insensitive) is used, then the first header with a word
/// starting with one.
/// An empty `hints` list with no `column` disables the role.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ColumnRoleConfig {
    pub column: Option<String>,
    pub hints: Vec<String>,
}

impl ColumnRoleConfig {
    pub fn named(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            hints: Vec::new(),
        }
    }

    pub fn hinted(hints: &[&str]) -> Self {
        Self {
            column: None,
            hints: hints.iter().map(|h| (*h).to_owned()).collect(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct InferenceSettings {
    /// Fraction of non-empty cells that must parse as numbers (default: 0.9)
    pub numeric_threshold: f64,
    /// Distance from the threshold that raises an ambiguity warning (default: 0.05)
    pub ambiguity_margin: f64,
    /// Cell texts treated as empty, compared case-insensitively
    pub null_tokens: Vec<String>,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            numeric_threshold: 0.9,
            ambiguity_margin: 0.05,
            null_tokens: ["NA", "N/A", "null", "NaN", "None"]
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

impl InferenceSettings {
    pub fn is_null_token(&self, text: &str) -> bool {
        self.null_tokens
            .iter()
            .any(|token| token.eq_ignore_ascii_case(text))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct SummarySettings {
    /// Number of most frequent values kept per categorical column (default: 10)
    pub top_k: usize,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self { top_k: 10 }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct KpiSettings {
    pub identifier: ColumnRoleConfig,
    pub attrition: ColumnRoleConfig,
    pub department: ColumnRoleConfig,
    /// Flag values counted as attrition, compared case-insensitively
    pub positive_values: Vec<String>,
}

impl Default for KpiSettings {
    fn default() -> Self {
        Self {
            identifier: ColumnRoleConfig::hinted(&["id"]),
            attrition: ColumnRoleConfig::hinted(&["attrit"]),
            department: ColumnRoleConfig::hinted(&["dept", "department"]),
            positive_values: ["yes", "y", "true", "1"]
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ChartSettings {
    pub salary: ColumnRoleConfig,
    /// Equal-width buckets in the salary histogram (default: 8)
    pub bucket_count: usize,
    /// Distinct values shown per categorical chart before collapsing into `other_label`
    pub category_cap: Option<usize>,
    pub other_label: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            salary: ColumnRoleConfig::hinted(&["salary", "income"]),
            bucket_count: 8,
            category_cap: Some(20),
            other_label: "Other".to_owned(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct IngestSettings {
    /// Remove exact duplicate rows before inference
    pub drop_duplicate_rows: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// Directory for rolling log files; console only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub inference: InferenceSettings,
    pub summary: SummarySettings,
    pub kpi: KpiSettings,
    pub charts: ChartSettings,
    pub ingest: IngestSettings,
    pub logging: LoggingSettings,
}

impl EngineConfig {
    /// Load a JSON config file. Missing sections and fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid JSON, or fails
    /// [`EngineConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns error if the parent directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`InsightsError::Config`] naming the first out-of-range setting.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.inference.numeric_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(InsightsError::Config(format!(
                "inference.numeric_threshold must be in (0, 1], got {threshold}"
            )));
        }
        let margin = self.inference.ambiguity_margin;
        if !(margin >= 0.0 && margin < 1.0) {
            return Err(InsightsError::Config(format!(
                "inference.ambiguity_margin must be in [0, 1), got {margin}"
            )));
        }
        if self.summary.top_k == 0 {
            return Err(InsightsError::Config(
                "summary.top_k must be at least 1".to_owned(),
            ));
        }
        if self.charts.bucket_count == 0 {
            return Err(InsightsError::Config(
                "charts.bucket_count must be at least 1".to_owned(),
            ));
        }
        if self.charts.category_cap == Some(0) {
            return Err(InsightsError::Config(
                "charts.category_cap must be at least 1 when set".to_owned(),
            ));
        }
        if self.kpi.positive_values.is_empty() {
            return Err(InsightsError::Config(
                "kpi.positive_values must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}
