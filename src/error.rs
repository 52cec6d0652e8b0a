//! Centralized error handling for the insights engine.
//!
//! Every fallible library operation returns [`Result<T>`], whose error type
//! [`InsightsError`] separates three audiences:
//!
//! - **Ingestion failures** (`Parse`, `InvalidTable`, `Aborted`, `Busy`): the
//!   upload did not produce a new snapshot and the store kept its prior state.
//! - **No dataset yet** (`NoDataset`): a query ran before any successful
//!   ingestion. Callers render "upload a file first" rather than an error page.
//! - **Everything else** (`Config`, `Io`, `Other`).
//!
//! ```
//! use hr_insights::error::InsightsError;
//!
//! fn describe(err: &InsightsError) -> &'static str {
//!     if err.is_no_dataset() {
//!         "upload a file first"
//!     } else if err.is_ingestion_failure() {
//!         "the upload could not be processed"
//!     } else {
//!         "something went wrong"
//!     }
//! }
//!
//! assert_eq!(describe(&InsightsError::NoDataset), "upload a file first");
//! ```
//!
//! The [`ResultExt`] trait adds `.context()` to any `Result` whose error
//! converts into [`InsightsError`]:
//!
//! ```no_run
//! use hr_insights::error::ResultExt as _;
//!
//! fn read(path: &str) -> hr_insights::error::Result<String> {
//!     std::fs::read_to_string(path).context("Failed to read upload")
//! }
//! ```

use std::fmt;

/// Main error type for engine operations.
#[derive(Debug)]
pub enum InsightsError {
    /// I/O errors (reading uploads, writing reports, config files)
    Io(std::io::Error),

    /// The file-parsing collaborator could not produce a raw table
    Parse(String),

    /// The raw table is structurally invalid (ragged rows, duplicate headers)
    InvalidTable(String),

    /// Query issued before any dataset was ingested
    NoDataset,

    /// Another ingestion currently holds the commit gate
    Busy,

    /// Ingestion was cancelled by the caller
    Aborted,

    /// Configuration errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl InsightsError {
    /// True for every error that means "this upload produced no snapshot".
    pub fn is_ingestion_failure(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::InvalidTable(_) | Self::Busy | Self::Aborted
        )
    }

    pub fn is_no_dataset(&self) -> bool {
        matches!(self, Self::NoDataset)
    }
}

impl fmt::Display for InsightsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
            Self::InvalidTable(msg) => write!(f, "Invalid table: {msg}"),
            Self::NoDataset => write!(f, "No dataset has been ingested yet"),
            Self::Busy => write!(f, "Another ingestion is in progress"),
            Self::Aborted => write!(f, "Ingestion aborted by caller"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for InsightsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for InsightsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for InsightsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for InsightsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<csv::Error> for InsightsError {
    fn from(err: csv::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<calamine::Error> for InsightsError {
    fn from(err: calamine::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<polars::prelude::PolarsError> for InsightsError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::Other(format!("Dataframe error: {err}"))
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, InsightsError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<InsightsError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(e.into(), msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

// Keeps the variant so callers can still tell ingestion failures apart.
fn wrap(err: InsightsError, msg: String) -> InsightsError {
    match err {
        InsightsError::Parse(inner) => InsightsError::Parse(format!("{msg}: {inner}")),
        InsightsError::InvalidTable(inner) => {
            InsightsError::InvalidTable(format!("{msg}: {inner}"))
        }
        InsightsError::Config(inner) => InsightsError::Config(format!("{msg}: {inner}")),
        InsightsError::NoDataset | InsightsError::Busy | InsightsError::Aborted => err,
        other => InsightsError::Other(format!("{msg}: {other}")),
    }
}
