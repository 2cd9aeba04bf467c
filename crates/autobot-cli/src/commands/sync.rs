//! `autobot sync` command implementation
//!
//! Pulls the newest feed file of a provider into the store, either from the
//! provider's FTP server or from a local file or directory.

use crate::context::AppContext;
use crate::error::{CliError, Result};
use autobot_ingest::{DataProvider, FileProvider, FtpProvider};
use autobot_server::{SyncOrchestrator, SyncOutcome};
use std::path::PathBuf;
use tracing::info;

pub async fn run(
    ctx: &AppContext,
    provider_name: &str,
    source_file: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let provider_config = ctx
        .config
        .provider(provider_name)
        .ok_or_else(|| CliError::UnknownProvider(provider_name.to_string()))?;

    let mut provider: Box<dyn DataProvider> = match source_file {
        Some(path) => Box::new(FileProvider::new(path)),
        None => Box::new(FtpProvider::new(provider_config.ftp_config())),
    };
    info!(provider = %provider_name, kind = %provider.kind(), force, "Starting sync");

    let orchestrator = SyncOrchestrator::new(
        ctx.store.clone(),
        ctx.config.pipeline.pipeline_config(provider_config.country),
    );
    match orchestrator.run_once(provider.as_mut(), force).await? {
        SyncOutcome::UpToDate { known } => match known {
            Some(file) => println!("Already up to date with {}", file),
            None => println!("No feed file found"),
        },
        SyncOutcome::Synced {
            file,
            summary,
            stats,
            ..
        } => {
            println!("Synced {}", file);
            println!("{}", summary);
            if stats.skipped > 0 || stats.filtered > 0 {
                println!(
                    "Skipped {} records with invalid dates and {} of unsupported types",
                    stats.skipped, stats.filtered
                );
            }
        },
    }
    Ok(())
}
