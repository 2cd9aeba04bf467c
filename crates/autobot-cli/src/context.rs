//! Shared setup for commands that talk to the store

use crate::error::{CliError, Result};
use autobot_server::config::AppConfig;
use autobot_server::store::{self, VehicleStore};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<VehicleStore>,
}

impl AppContext {
    /// Load the configuration at `path` and connect to the store it names.
    pub async fn bootstrap(path: &Path) -> Result<Self> {
        let config = load_config(path)?;
        let backend = store::connect(&config.store).await?;
        debug!(backend = backend.name(), "Connected to vehicle store");
        let store = Arc::new(VehicleStore::new(backend, config.sync.clone()));
        Ok(Self { config, store })
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.is_file() {
        return Err(CliError::ConfigNotFound(path.display().to_string()));
    }
    AppConfig::load(path).map_err(|e| CliError::config(format!("{:#}", e)))
}
