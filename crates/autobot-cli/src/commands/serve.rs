//! `autobot serve` command implementation
//!
//! Runs the HTTP API and, unless disabled, the sync scheduler for one
//! provider. Ctrl+C stops both; a sync in progress is allowed to finish.

use crate::context::AppContext;
use crate::error::{CliError, Result};
use autobot_ingest::FtpProvider;
use autobot_server::api::{self, AppState};
use autobot_server::lookup::LookupRegistry;
use autobot_server::{Schedule, SyncOrchestrator, SyncScheduler};
use tracing::info;

pub async fn run(
    ctx: &AppContext,
    port: Option<u16>,
    no_sync: bool,
    provider_name: &str,
) -> Result<()> {
    let mut web = ctx.config.web_service.clone();
    if let Some(port) = port {
        web.port = port;
    }

    let lookups = LookupRegistry::from_config(&ctx.config);
    info!(services = lookups.len(), "Lookup services registered");
    let mut state = AppState::new(ctx.store.clone(), lookups);

    let scheduler = if no_sync {
        info!("Scheduled syncs disabled");
        None
    } else {
        let provider_config = ctx
            .config
            .provider(provider_name)
            .ok_or_else(|| CliError::UnknownProvider(provider_name.to_string()))?;
        let schedule =
            Schedule::parse(&web.schedule).map_err(|e| CliError::config(e.to_string()))?;
        let orchestrator = SyncOrchestrator::new(
            ctx.store.clone(),
            ctx.config.pipeline.pipeline_config(provider_config.country),
        );
        let provider = Box::new(FtpProvider::new(provider_config.ftp_config()));
        let handle = SyncScheduler::new(schedule, orchestrator, provider).start();
        state = state.with_scheduler(handle.subscribe());
        Some(handle)
    };

    let served = api::serve(&web, state).await;

    if let Some(handle) = scheduler {
        info!("Waiting for the sync scheduler to stop");
        handle.shutdown().await;
    }
    served.map_err(CliError::from)
}
