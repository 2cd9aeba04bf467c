//! One sync cycle, shared by the CLI and the scheduler
//!
//! Ask the provider for a feed file newer than the last-synced marker, run it
//! through the ingestion pipeline into the store and move the marker forward.

use crate::error::StoreResult;
use crate::store::{SyncOpId, VehicleStore};
use autobot_ingest::{DataProvider, IngestPipeline, IngestStats, PipelineConfig};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of [`SyncOrchestrator::run_once`].
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// Nothing newer than the marker.
    UpToDate { known: Option<String> },
    Synced {
        file: String,
        op: SyncOpId,
        summary: String,
        stats: IngestStats,
    },
}

pub struct SyncOrchestrator {
    store: Arc<VehicleStore>,
    pipeline: IngestPipeline,
}

impl SyncOrchestrator {
    pub fn new(store: Arc<VehicleStore>, pipeline: PipelineConfig) -> Self {
        Self {
            store,
            pipeline: IngestPipeline::new(pipeline),
        }
    }

    pub fn store(&self) -> &Arc<VehicleStore> {
        &self.store
    }

    /// Run one cycle. With `force`, the marker is ignored and the newest file
    /// is ingested regardless. The provider is always closed afterwards.
    pub async fn run_once(
        &self,
        provider: &mut dyn DataProvider,
        force: bool,
    ) -> StoreResult<SyncOutcome> {
        provider.open().await?;
        let outcome = self.sync_latest(provider, force).await;
        if let Err(e) = provider.close().await {
            warn!(provider = %provider.kind(), error = %e, "Failed to close data provider");
        }
        outcome
    }

    async fn sync_latest(
        &self,
        provider: &mut dyn DataProvider,
        force: bool,
    ) -> StoreResult<SyncOutcome> {
        let known = self.store.last_synced().await?;
        let hint = if force { "" } else { known.as_deref().unwrap_or("") };

        let Some(latest) = provider.check_for_latest(hint).await? else {
            info!(known = ?known, "No new feed file detected");
            return Ok(SyncOutcome::UpToDate { known });
        };
        if !force && known.as_deref() == Some(latest.as_str()) {
            info!(file = %latest, "Feed file already synced");
            return Ok(SyncOutcome::UpToDate { known });
        }

        info!(file = %latest, provider = %provider.kind(), "Synchronising feed file");
        let stream = provider.provide(&latest).await?;
        let op = self.store.new_sync_op(provider.kind().as_str());
        let handle = self.pipeline.ingest(stream);
        let stats = self.store.sync(op, handle).await?;

        self.store.set_last_synced(&latest).await?;
        let summary = self.store.status(op)?;
        Ok(SyncOutcome::Synced {
            file: latest,
            op,
            summary,
            stats,
        })
    }
}
