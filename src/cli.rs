use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use hr_insights::analyser::lifecycle::InsightsEngine;
use hr_insights::config::EngineConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "hr-insights",
    version,
    about = "Summaries, KPIs and chart data for HR spreadsheets"
)]
pub struct Cli {
    /// Path to a JSON engine configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. "debug", "hr_insights=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the ETL summary of a file
    Summary {
        /// CSV, TSV or Excel file to ingest
        file: PathBuf,
    },
    /// Print the KPI set of a file
    Kpis {
        /// CSV, TSV or Excel file to ingest
        file: PathBuf,
    },
    /// Print the chart aggregates of a file
    Charts {
        /// CSV, TSV or Excel file to ingest
        file: PathBuf,
    },
    /// Print or save the full processed snapshot (schema, summary, KPIs, charts, warnings)
    Report {
        /// CSV, TSV or Excel file to ingest
        file: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the default configuration
    DefaultConfig {
        /// Write the configuration here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Loads `--config` if given, otherwise the defaults, then applies `--log-level`.
pub fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    Ok(config)
}

pub fn run_command(command: Commands, config: EngineConfig) -> Result<()> {
    match command {
        Commands::Summary { file } => {
            let engine = ingest(config, &file)?;
            print_json(&engine.get_summary()?)
        }
        Commands::Kpis { file } => {
            let engine = ingest(config, &file)?;
            print_json(&engine.get_kpis()?)
        }
        Commands::Charts { file } => {
            let engine = ingest(config, &file)?;
            print_json(&engine.get_charts()?)
        }
        Commands::Report { file, out } => {
            let engine = ingest(config, &file)?;
            let snapshot = engine.snapshot()?;
            match out {
                Some(path) => write_json(&path, &*snapshot),
                None => print_json(&*snapshot),
            }
        }
        Commands::DefaultConfig { out } => match out {
            Some(path) => {
                EngineConfig::default().save(&path)?;
                tracing::info!("Default configuration written to {}", path.display());
                Ok(())
            }
            None => print_json(&EngineConfig::default()),
        },
    }
}

fn ingest(config: EngineConfig, file: &Path) -> Result<InsightsEngine> {
    let engine = InsightsEngine::new(config)?;
    engine
        .ingest_file(file)
        .with_context(|| format!("Failed to process {}", file.display()))?;

    for warning in engine.warnings()? {
        tracing::debug!("{warning}");
    }
    Ok(engine)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Report written to {}", path.display());
    Ok(())
}
