//! Configuration management
//!
//! Configuration is read from a TOML file and overlaid with environment
//! variables prefixed `AUTOBOT__`, using `__` as the nesting separator
//! (`AUTOBOT__STORE__HOST=redis.internal`). A `.env` file is honoured.

use crate::scheduler::Schedule;
use autobot_common::vehicle::{RegCountry, VehicleType};
use autobot_ingest::pipeline::{
    PipelineConfig, DEFAULT_END_MARKER, DEFAULT_QUEUE_CAPACITY, DEFAULT_RECORD_BUFFER,
    DEFAULT_START_MARKER,
};
use autobot_ingest::source::ftp::DEFAULT_FILE_PREFIX;
use autobot_ingest::FtpConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "AUTOBOT";

/// Default Redis host.
pub const DEFAULT_STORE_HOST: &str = "127.0.0.1";

/// Default Redis port.
pub const DEFAULT_STORE_PORT: u16 = 6379;

/// Default web service host binding.
pub const DEFAULT_WEB_HOST: &str = "0.0.0.0";

/// Default web service port.
pub const DEFAULT_WEB_PORT: u16 = 1826;

/// Default sync schedule: every Monday at 10:00.
pub const DEFAULT_SCHEDULE: &str = "0 10 * * MON";

/// Default number of record table entries fetched per scan batch.
pub const DEFAULT_SCAN_BATCH_SIZE: usize = 1000;

/// Default FTP port.
pub const DEFAULT_FTP_PORT: u16 = 21;

/// Default provider name.
pub const DEFAULT_PROVIDER: &str = "DMR";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub providers: BTreeMap<String, ProviderConfig>,
    pub store: StoreConfig,
    pub web_service: WebServiceConfig,
    pub sync: SyncConfig,
    pub pipeline: PipelineSettings,
}

/// One feed provider: where its dumps live and how to look up single vehicles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dir: String,
    pub file_prefix: String,
    /// Registration country of the records in this feed.
    pub country: RegCountry,
    pub lookup_supported: bool,
    pub lookup_secure: bool,
    pub lookup_host: String,
    pub lookup_path: String,
    pub lookup_key: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_FTP_PORT,
            user: String::new(),
            password: String::new(),
            dir: "/".to_string(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            country: RegCountry::DK,
            lookup_supported: false,
            lookup_secure: true,
            lookup_host: String::new(),
            lookup_path: String::new(),
            lookup_key: String::new(),
        }
    }
}

impl ProviderConfig {
    pub fn ftp_config(&self) -> FtpConfig {
        FtpConfig {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            dir: self.dir.clone(),
            file_prefix: self.file_prefix.clone(),
            ..FtpConfig::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Redis,
    Memory,
}

/// Vehicle store connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub host: String,
    pub port: u16,
    pub password: String,
    pub db: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Redis,
            host: DEFAULT_STORE_HOST.to_string(),
            port: DEFAULT_STORE_PORT,
            password: String::new(),
            db: 0,
        }
    }
}

/// Web service and sync scheduler
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebServiceConfig {
    /// Five-field cron expression: minute hour day-of-month month day-of-week.
    pub schedule: String,
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty or `*` allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for WebServiceConfig {
    fn default() -> Self {
        Self {
            schedule: DEFAULT_SCHEDULE.to_string(),
            host: DEFAULT_WEB_HOST.to_string(),
            port: DEFAULT_WEB_PORT,
            cors_origins: Vec::new(),
        }
    }
}

/// Key names and housekeeping options for the vehicle store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub synced_file_key: String,
    pub vehicle_map: String,
    pub vin_index: String,
    pub reg_nr_index: String,
    pub history_set: String,
    pub ops_list: String,
    /// Whether `clear` also removes history, finalized operations and the
    /// last-synced marker.
    pub clear_history: bool,
    pub scan_batch_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            synced_file_key: "autobot_synced".to_string(),
            vehicle_map: "autobot_vehicles".to_string(),
            vin_index: "autobot_vin_index".to_string(),
            reg_nr_index: "autobot_regnr_index".to_string(),
            history_set: "autobot_history".to_string(),
            ops_list: "autobot_ops".to_string(),
            clear_history: false,
            scan_batch_size: DEFAULT_SCAN_BATCH_SIZE,
        }
    }
}

/// Ingestion pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// 0 means `max(2, cpus - 1)`.
    pub workers: usize,
    pub queue_capacity: usize,
    pub record_buffer: usize,
    pub start_marker: String,
    pub end_marker: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            record_buffer: DEFAULT_RECORD_BUFFER,
            start_marker: DEFAULT_START_MARKER.to_string(),
            end_marker: DEFAULT_END_MARKER.to_string(),
        }
    }
}

impl PipelineSettings {
    pub fn pipeline_config(&self, country: RegCountry) -> PipelineConfig {
        PipelineConfig {
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            record_buffer: self.record_buffer,
            start_marker: self.start_marker.clone(),
            end_marker: self.end_marker.clone(),
            country,
            allowed_types: VehicleType::KNOWN.to_vec(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, overlaid with the environment.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let path = path.as_ref();
        if !path.is_file() {
            anyhow::bail!("No such file: {}", path.display());
        }

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Toml))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string, overlaid with the environment.
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .add_source(env_source())
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Provider by name, ignoring case.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, provider)| provider)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.backend == BackendKind::Redis {
            if self.store.host.is_empty() {
                anyhow::bail!("Store host cannot be empty");
            }
            if self.store.port == 0 {
                anyhow::bail!("Store port must be greater than 0");
            }
        }

        if self.web_service.port == 0 {
            anyhow::bail!("Web service port must be greater than 0");
        }

        Schedule::parse(&self.web_service.schedule)?;

        let keys = [
            ("synced_file_key", &self.sync.synced_file_key),
            ("vehicle_map", &self.sync.vehicle_map),
            ("vin_index", &self.sync.vin_index),
            ("reg_nr_index", &self.sync.reg_nr_index),
            ("history_set", &self.sync.history_set),
            ("ops_list", &self.sync.ops_list),
        ];
        for (name, value) in keys {
            if value.trim().is_empty() {
                anyhow::bail!("Sync key name '{}' cannot be empty", name);
            }
        }

        if self.sync.scan_batch_size == 0 {
            anyhow::bail!("Sync scan_batch_size must be greater than 0");
        }

        if self.pipeline.start_marker.is_empty() || self.pipeline.end_marker.is_empty() {
            anyhow::bail!("Pipeline excerpt markers cannot be empty");
        }

        for (name, provider) in &self.providers {
            if provider.lookup_supported && provider.lookup_host.is_empty() {
                anyhow::bail!("Provider '{}' enables lookups but has no lookup_host", name);
            }
        }

        Ok(())
    }
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
}

/// Commented configuration template written by `autobot init`.
pub const TEMPLATE: &str = r#"# Autobot configuration
#
# Every value can be overridden from the environment with the AUTOBOT__ prefix
# and "__" between section and key, e.g. AUTOBOT__STORE__HOST=10.0.0.5

[providers.DMR]
host = ""
port = 21
user = ""
password = ""
dir = "/"
file_prefix = "ESStatistikListeModtag-"
country = "DK"
# Direct lookups for cache misses
lookup_supported = false
lookup_secure = true
lookup_host = ""
lookup_path = ""
lookup_key = ""

[store]
# "redis" or "memory"
backend = "redis"
host = "127.0.0.1"
port = 6379
password = ""
db = 0

[web_service]
# Schedule follows the cron five-field syntax: "minute hour day-of-month month day-of-week".
# Example: "0 10 * * MON" runs the sync job every Monday at 10AM.
schedule = "0 10 * * MON"
host = "0.0.0.0"
port = 1826

[sync]
synced_file_key = "autobot_synced"
vehicle_map = "autobot_vehicles"
vin_index = "autobot_vin_index"
reg_nr_index = "autobot_regnr_index"
history_set = "autobot_history"
ops_list = "autobot_ops"
# Also remove history, finalized operations and the last synced file on clear
clear_history = false
scan_batch_size = 1000

[pipeline]
# 0 picks max(2, cpus - 1)
workers = 0
queue_capacity = 256
record_buffer = 1024
start_marker = "<ns:Statistik>"
end_marker = "</ns:Statistik>"
"#;

/// Write [`TEMPLATE`] to `path`, refusing to overwrite an existing file.
pub fn write_template(path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    if path.exists() {
        anyhow::bail!("File already exists: {}", path.display());
    }
    std::fs::write(path, TEMPLATE)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_template_round_trips() {
        let config = AppConfig::from_toml(TEMPLATE).unwrap();
        let dmr = config.provider("dmr").unwrap();
        assert_eq!(dmr.country, RegCountry::DK);
        assert_eq!(dmr.file_prefix, DEFAULT_FILE_PREFIX);
        assert_eq!(config.store.port, DEFAULT_STORE_PORT);
        assert_eq!(config.web_service.port, DEFAULT_WEB_PORT);
        assert_eq!(config.sync.vehicle_map, "autobot_vehicles");
        assert!(!config.sync.clear_history);
    }

    #[test]
    fn test_defaults_validate() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.sync.vin_index = " ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.web_service.schedule = "0 10 * *".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.store.port = 0;
        assert!(config.validate().is_err());
        config.store.backend = BackendKind::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_write_template_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        write_template(&path).unwrap();
        assert!(write_template(&path).is_err());
        assert!(AppConfig::load(&path).is_ok());
    }

    #[test]
    fn test_provider_settings() {
        let config = AppConfig::from_toml(
            r#"
            [providers.DMR]
            host = "ftp.example.dk"
            dir = "/pub"
            country = "DK"
            lookup_supported = true
            lookup_host = "api.example.dk"

            [store]
            backend = "memory"
            "#,
        )
        .unwrap();
        let dmr = config.provider("DMR").unwrap();
        let ftp = dmr.ftp_config();
        assert_eq!(ftp.host, "ftp.example.dk");
        assert_eq!(ftp.port, DEFAULT_FTP_PORT);
        assert_eq!(ftp.dir, "/pub");
        assert_eq!(config.store.backend, BackendKind::Memory);
        assert!(config.provider("unknown").is_none());
    }
}
