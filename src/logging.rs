//! Logging setup for the engine and its command-line front end.
//!
//! Console output always goes to stderr so that JSON written to stdout by the
//! CLI stays machine-readable. When [`LoggingSettings::log_dir`] is set, two
//! daily-rotated files are written as well:
//!
//! - `hr-insights.<date>.log`: every enabled level
//! - `error.<date>.log`: warnings and errors only
//!
//! Both keep the ten most recent files.
//!
//! ```no_run
//! use hr_insights::{config::LoggingSettings, logging};
//!
//! logging::init(&LoggingSettings::default()).expect("Failed to initialize logging");
//! tracing::info!("engine ready");
//! ```

use crate::config::LoggingSettings;
use anyhow::{Context as _, Result};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

const MAX_LOG_FILES: usize = 10;

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides `settings.level` when present.
///
/// # Errors
///
/// Returns error if the filter is malformed, the log directory cannot be
/// created, or a global subscriber is already installed.
pub fn init(settings: &LoggingSettings) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .context("Failed to create env filter")?;

    let console_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    match &settings.log_dir {
        Some(log_dir) => {
            let all_logs_appender = build_appender(log_dir, "hr-insights")?;
            let error_logs_appender = build_appender(log_dir, "error")?;

            let all_logs_layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(all_logs_appender);

            let error_logs_layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_ansi(false)
                .with_writer(error_logs_appender)
                .with_filter(EnvFilter::new("warn"));

            registry
                .with(all_logs_layer)
                .with(error_logs_layer)
                .try_init()
                .context("Failed to install tracing subscriber")?;

            tracing::info!("Logging initialized, log directory: {}", log_dir.display());
        }
        None => {
            registry
                .try_init()
                .context("Failed to install tracing subscriber")?;
        }
    }

    Ok(())
}

fn build_appender(log_dir: &Path, prefix: &str) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .build(log_dir)
        .with_context(|| format!("Failed to create {prefix} file appender"))
}
