use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Serializes a `Duration` as `{ secs, nanos }`.
pub mod duration_serde {
    use serde::{Deserialize as _, Deserializer, Serializer, ser::SerializeStruct as _};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Duration", 2)?;
        state.serialize_field("secs", &duration.as_secs())?;
        state.serialize_field("nanos", &duration.subsec_nanos())?;
        state.end()
    }

    #[derive(serde::Deserialize)]
    struct Parts {
        secs: u64,
        nanos: u32,
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parts = Parts::deserialize(deserializer)?;
        Ok(Duration::new(parts.secs, parts.nanos))
    }
}

#[derive(Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Debug, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
        }
    }
}

/// Why the inferencer chose a column's kind.
#[derive(Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum InferenceBasis {
    /// Enough non-empty cells parsed as numbers.
    NumericEvidence,
    /// Some cells were non-numeric; the numeric fraction missed the threshold.
    BelowThreshold,
    /// No non-empty cells at all. Defaults to categorical.
    NoEvidence,
}

#[derive(Clone, Deserialize, Serialize, PartialEq, Debug)]
pub struct ColumnSchema {
    pub name: String,
    pub kind: ColumnKind,
    pub basis: InferenceBasis,
    pub non_empty: usize,
    pub numeric_cells: usize,
    /// `numeric_cells / non_empty`, or 0.0 without evidence
    pub numeric_fraction: f64,
}

/// One [`ColumnSchema`] per column, in header order.
#[derive(Clone, Deserialize, Serialize, PartialEq, Debug, Default)]
#[serde(transparent)]
pub struct TableSchema(Vec<ColumnSchema>);

impl TableSchema {
    pub fn new(columns: Vec<ColumnSchema>) -> Self {
        Self(columns)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnSchema> {
        self.0.iter()
    }

    pub fn get(&self, name: &str) -> Option<&ColumnSchema> {
        self.0.iter().find(|c| c.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.get(name).map(|c| c.kind)
    }

    pub fn names_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.0
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    }
}

impl<'a> IntoIterator for &'a TableSchema {
    type Item = &'a ColumnSchema;
    type IntoIter = std::slice::Iter<'a, ColumnSchema>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Clone, Deserialize, Serialize, PartialEq, Debug)]
pub struct NumericStats {
    pub count: usize,
    pub missing_count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    /// Population standard deviation
    pub std: f64,
}

#[derive(Clone, Deserialize, Serialize, PartialEq, Eq, Debug)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// ETL summary: table shape plus per-column statistics.
#[derive(Clone, Deserialize, Serialize, PartialEq, Debug, Default)]
pub struct Summary {
    pub row_count: usize,
    pub col_count: usize,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    /// `None` for numeric columns without a single value
    pub numeric_stats: BTreeMap<String, Option<NumericStats>>,
    pub categorical_top: BTreeMap<String, Vec<ValueCount>>,
    #[serde(default)]
    pub duplicate_rows_removed: usize,
}

impl Summary {
    pub fn mean_of(&self, column: &str) -> Option<f64> {
        self.numeric_stats
            .get(column)
            .and_then(|stats| stats.as_ref())
            .map(|stats| stats.mean)
    }
}

#[derive(Clone, Deserialize, Serialize, PartialEq, Eq, Debug)]
pub struct ChartPoint {
    pub label: String,
    pub value: usize,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: usize) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Clone, Deserialize, Serialize, PartialEq, Debug, Default)]
pub struct KpiSet {
    #[serde(alias = "rows")]
    pub total_rows: usize,
    pub unique_employees: usize,
    /// Mean per numeric column, keyed by the header as written
    pub numeric_mean: BTreeMap<String, Option<f64>>,
    pub attrition_rate: f64,
    pub attrition_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_distribution: Option<Vec<ChartPoint>>,
}

/// Chart key (`salary_buckets`, `cat_<column>`) to its ordered series.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq, Debug, Default)]
#[serde(transparent)]
pub struct ChartSet(BTreeMap<String, Vec<ChartPoint>>);

impl ChartSet {
    pub const SALARY_BUCKETS: &'static str = "salary_buckets";

    pub fn categorical_key(column: &str) -> String {
        format!("cat_{column}")
    }

    pub fn insert(&mut self, key: impl Into<String>, series: Vec<ChartPoint>) {
        self.0.insert(key.into(), series);
    }

    pub fn get(&self, key: &str) -> Option<&[ChartPoint]> {
        self.0.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Special-purpose columns the KPI and chart aggregators look for.
#[derive(Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Debug)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Identifier,
    Attrition,
    Department,
    Salary,
}

impl ColumnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Attrition => "attrition",
            Self::Department => "department",
            Self::Salary => "salary",
        }
    }
}

/// Non-fatal findings recorded on the snapshot.
#[derive(Clone, Deserialize, Serialize, PartialEq, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestWarning {
    /// The numeric fraction sat close to the threshold, so the kind could
    /// easily have gone the other way.
    SchemaAmbiguity {
        column: String,
        numeric_fraction: f64,
        threshold: f64,
        chosen: ColumnKind,
    },
    /// A column role could not be served.
    MissingColumn {
        role: ColumnRole,
        requested: Option<String>,
        reason: String,
    },
}

impl fmt::Display for IngestWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaAmbiguity {
                column,
                numeric_fraction,
                threshold,
                chosen,
            } => write!(
                f,
                "column '{column}' is {:.1}% numeric against a {:.1}% threshold, treated as {chosen}",
                numeric_fraction * 100.0,
                threshold * 100.0
            ),
            Self::MissingColumn {
                role,
                requested: Some(name),
                reason,
            } => write!(f, "{} column '{name}' unavailable: {reason}", role.as_str()),
            Self::MissingColumn {
                role,
                requested: None,
                reason,
            } => write!(f, "{} column unavailable: {reason}", role.as_str()),
        }
    }
}
