//! FTP feed source
//!
//! The registry publishes its dumps on an FTP server. suppaftp's client is
//! blocking, so every session runs on the blocking thread pool. Each operation
//! opens its own short session and is retried with a linearly growing delay.

use super::{filename, ByteStream, DataProvider, ProviderKind};
use crate::decompression::decode_payload;
use crate::error::{IngestError, Result};
use anyhow::Context;
use async_trait::async_trait;
use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::time::Duration;
use suppaftp::FtpStream;
use tracing::{debug, info, warn};

/// Maximum number of attempts for one FTP operation
pub const MAX_RETRIES: u32 = 3;

/// Delay unit between attempts; attempt `n` waits `n * RETRY_DELAY_SECS`.
pub const RETRY_DELAY_SECS: u64 = 5;

pub const DEFAULT_FILE_PREFIX: &str = "ESStatistikListeModtag-";

#[derive(Debug, Clone)]
pub struct FtpConfig {
    pub host: String,
    /// 0 means the standard port 21.
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Remote directory holding the feed files.
    pub dir: String,
    /// Only names starting with this prefix are considered.
    pub file_prefix: String,
    /// Delay unit between retries.
    pub retry_delay_secs: u64,
}

impl Default for FtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 21,
            user: "anonymous".to_string(),
            password: String::new(),
            dir: "/".to_string(),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            retry_delay_secs: RETRY_DELAY_SECS,
        }
    }
}

impl FtpConfig {
    fn address(&self) -> String {
        let port = if self.port == 0 { 21 } else { self.port };
        format!("{}:{}", self.host, port)
    }

    fn remote_path(&self, name: &str) -> String {
        if self.dir.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.dir.trim_end_matches('/'), name)
        }
    }
}

/// Parsed `LIST` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: Option<u64>,
}

impl FtpEntry {
    /// Parse a Unix-style `LIST` line:
    /// `-rw-r--r--   1 ftp ftp  1234 Jan 15 12:00 filename.zip`
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            return None;
        }
        Some(Self {
            name: parts.last()?.to_string(),
            is_directory: parts[0].starts_with('d'),
            size: parts.get(4).and_then(|s| s.parse().ok()),
        })
    }
}

pub struct FtpProvider {
    config: FtpConfig,
}

impl FtpProvider {
    pub fn new(config: FtpConfig) -> Self {
        Self { config }
    }

    /// File names in the configured directory that carry the configured prefix.
    pub async fn list_feed_files(&self) -> Result<Vec<String>> {
        let entries = self
            .with_retry("LIST", list_directory_sync)
            .await?;
        Ok(entries
            .into_iter()
            .filter(|e| !e.is_directory && e.name.starts_with(&self.config.file_prefix))
            .map(|e| e.name)
            .collect())
    }

    async fn with_retry<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: Fn(&FtpConfig) -> anyhow::Result<T> + Send + Sync + Clone + 'static,
    {
        let mut attempt = 1;
        loop {
            debug!(op, attempt, max = MAX_RETRIES, host = %self.config.host, "FTP attempt");
            let config = self.config.clone();
            let call = f.clone();
            let outcome = tokio::task::spawn_blocking(move || call(&config))
                .await
                .map_err(|e| IngestError::Task(format!("FTP {} task panicked: {}", op, e)))?;

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if attempt < MAX_RETRIES => {
                    let delay = self.config.retry_delay_secs * u64::from(attempt);
                    warn!(op, attempt, error = %e, delay_secs = delay, "FTP operation failed, retrying");
                    tokio::time::sleep(Duration::from_secs(delay)).await;
                    attempt += 1;
                },
                Err(e) => {
                    return Err(IngestError::Source(format!(
                        "FTP {} failed after {} attempts: {:#}",
                        op, MAX_RETRIES, e
                    )))
                },
            }
        }
    }
}

#[async_trait]
impl DataProvider for FtpProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ftp
    }

    async fn open(&mut self) -> Result<()> {
        info!(address = %self.config.address(), dir = %self.config.dir, "Connecting to FTP source");
        // Listing exercises both the login and the data channel.
        let files = self.list_feed_files().await?;
        debug!(files = files.len(), "FTP source reachable");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        debug!(host = %self.config.host, "FTP source closed");
        Ok(())
    }

    async fn check_for_latest(&mut self, known: &str) -> Result<Option<String>> {
        let files = self.list_feed_files().await?;
        if files.is_empty() {
            return Err(IngestError::NotFound(format!(
                "no files matching '{}*' in {}",
                self.config.file_prefix, self.config.dir
            )));
        }
        Ok(filename::latest_newer(files, known))
    }

    async fn provide(&mut self, name: &str) -> Result<ByteStream> {
        let path = self.config.remote_path(name);
        let fetch_path = path.clone();
        let raw = self
            .with_retry("RETR", move |config| download_sync(config, &fetch_path))
            .await?;

        let name = name.to_string();
        let decoded = tokio::task::spawn_blocking(move || decode_payload(&name, raw))
            .await
            .map_err(|e| IngestError::Task(e.to_string()))??;

        info!(path = %path, "Feed file downloaded");
        Ok(Box::new(tokio::fs::File::from_std(decoded)))
    }
}

fn connect(config: &FtpConfig) -> anyhow::Result<FtpStream> {
    let mut stream = FtpStream::connect(config.address())
        .with_context(|| format!("Failed to connect to {}", config.address()))?;
    stream.set_mode(suppaftp::Mode::ExtendedPassive);
    stream
        .login(&config.user, &config.password)
        .context("FTP login failed")?;
    Ok(stream)
}

fn list_directory_sync(config: &FtpConfig) -> anyhow::Result<Vec<FtpEntry>> {
    let mut stream = connect(config)?;
    let dir = (!config.dir.is_empty()).then_some(config.dir.as_str());
    let lines = stream
        .list(dir)
        .with_context(|| format!("Failed to list directory: {}", config.dir))?;

    if let Err(e) = stream.quit() {
        warn!("Failed to quit FTP session gracefully: {}", e);
    }
    Ok(lines.iter().filter_map(|l| FtpEntry::parse(l)).collect())
}

/// Download `path` into an anonymous temporary file.
fn download_sync(config: &FtpConfig, path: &str) -> anyhow::Result<File> {
    let mut stream = connect(config)?;
    stream
        .transfer_type(suppaftp::types::FileType::Binary)
        .context("Failed to set binary mode")?;

    let mut out = tempfile::tempfile().context("Failed to create spool file")?;
    let mut data = stream
        .retr_as_stream(path)
        .with_context(|| format!("Failed to download file: {}", path))?;
    let bytes = io::copy(&mut data, &mut out).context("Failed to read file data")?;
    stream
        .finalize_retr_stream(data)
        .context("Failed to finalize transfer")?;
    out.seek(SeekFrom::Start(0))?;

    debug!(path, bytes, "Downloaded feed file");
    if let Err(e) = stream.quit() {
        warn!("Failed to quit FTP session gracefully: {}", e);
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_line() {
        let entry =
            FtpEntry::parse("-rw-r--r--   1 ftp ftp  1234 Jan 15 12:00 X-20230101-000000.zip").unwrap();
        assert_eq!(entry.name, "X-20230101-000000.zip");
        assert!(!entry.is_directory);
        assert_eq!(entry.size, Some(1234));

        let dir = FtpEntry::parse("drwxr-xr-x   2 ftp ftp  4096 Jan 15 12:00 archive").unwrap();
        assert!(dir.is_directory);
        assert!(FtpEntry::parse("total 8").is_none());
    }

    #[test]
    fn test_remote_path_joins_dir() {
        let mut config = FtpConfig {
            dir: "/pub/dmr/".to_string(),
            ..FtpConfig::default()
        };
        assert_eq!(config.remote_path("a.zip"), "/pub/dmr/a.zip");
        config.dir.clear();
        assert_eq!(config.remote_path("a.zip"), "a.zip");
        config.port = 0;
        assert_eq!(config.address(), "localhost:21");
    }
}
