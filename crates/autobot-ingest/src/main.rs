//! Autobot Ingest - parse a feed dump without touching the store

use anyhow::{Context, Result};
use autobot_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use autobot_common::vehicle::RegCountry;
use autobot_ingest::{DataProvider, FileProvider, IngestPipeline, PipelineConfig};
use clap::Parser;
use std::io::Write;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "autobot-ingest")]
#[command(author, version, about = "Parse a vehicle registry dump into JSON lines")]
struct Cli {
    /// Feed file or directory of feed files
    path: String,

    /// Registration country of the feed
    #[arg(short, long, default_value = "DK")]
    country: RegCountry,

    /// Parse workers (0 = cpus - 1, at least 2)
    #[arg(short, long, default_value_t = 0)]
    workers: usize,

    /// Only report statistics, do not print records
    #[arg(long)]
    stats_only: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .output(LogOutput::Console)
        .log_file_prefix("autobot-ingest")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().with_env_overrides().unwrap_or(log_config);
    let _guard = init_logging(&log_config)?;

    let mut provider = FileProvider::new(&cli.path);
    provider.open().await?;
    let name = provider
        .check_for_latest("")
        .await?
        .with_context(|| format!("No feed file found at {}", cli.path))?;
    let stream = provider.provide(&name).await?;

    let pipeline = IngestPipeline::new(
        PipelineConfig::default()
            .with_country(cli.country)
            .with_workers(cli.workers),
    );
    let mut handle = pipeline.ingest(stream);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    while let Some(vehicle) = handle.records.recv().await {
        if !cli.stats_only {
            writeln!(out, "{}", vehicle.to_json()?)?;
        }
    }
    let stats = handle.done.await.context("Ingestion task vanished")??;
    provider.close().await?;

    info!(
        file = %name,
        excerpts = stats.excerpts,
        parsed = stats.parsed,
        skipped = stats.skipped,
        filtered = stats.filtered,
        "Ingestion complete"
    );
    Ok(())
}
