//! Autobot Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Vehicle store, sync scheduling and the HTTP API.
//!
//! # Overview
//!
//! - **Configuration**: TOML file overlaid by `AUTOBOT__*` environment variables
//! - **Store**: content-addressed records indexed by VIN and registration
//!   number, on Redis or in memory
//! - **Sync**: [`orchestrator::SyncOrchestrator`] feeds provider files through
//!   the ingestion pipeline into the store; [`scheduler::SyncScheduler`] runs it
//!   on a cron schedule
//! - **Lookup**: remote services consulted when the store has no match
//! - **API**: a small axum facade over all of the above
//!
//! # Example
//!
//! ```no_run
//! use autobot_server::config::AppConfig;
//! use autobot_server::store::{self, VehicleStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = AppConfig::load("config.toml")?;
//! let backend = store::connect(&config.store).await?;
//! let store = VehicleStore::new(backend, config.sync.clone());
//! println!("{} history entries", store.count_log().await?);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod lookup;
pub mod orchestrator;
pub mod scheduler;
pub mod store;

pub use config::AppConfig;
pub use error::{LookupError, ServerError, StoreError, StoreResult};
pub use orchestrator::{SyncOrchestrator, SyncOutcome};
pub use scheduler::{Schedule, SchedulerHandle, SchedulerState, SyncScheduler};
pub use store::VehicleStore;
