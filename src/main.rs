//! # HR Insights command-line entry point
//!
//! Ingests one file per invocation and prints the requested view as JSON on
//! stdout. Logs go to stderr (and to rolling files when `logging.log_dir` is
//! configured), so output can be piped straight into other tools:
//!
//! ```bash
//! hr-insights kpis staff.csv
//! hr-insights charts staff.csv --config engine.json | jq '.salary_buckets'
//! hr-insights report staff.csv --out reports/staff.json
//! hr-insights default-config --out engine.json
//! ```

#![expect(clippy::print_stdout)] // JSON output goes to stdout

mod cli;

use anyhow::Result;
use clap::Parser as _;

/// # Errors
///
/// Returns error if:
/// - the configuration file cannot be loaded or is invalid
/// - logging cannot be initialised
/// - the input file cannot be read, parsed or ingested
fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = cli::load_config(&cli)?;

    hr_insights::logging::init(&config.logging)?;
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting hr-insights");

    cli::run_command(cli.command, config)
}
