//! Local filesystem feed source
//!
//! Points at either a single feed file or a directory of feed files.

use super::{filename, ByteStream, DataProvider, ProviderKind};
use crate::decompression::decode_payload;
use crate::error::{IngestError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct FileProvider {
    path: PathBuf,
    is_dir: bool,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        if self.is_dir {
            return Ok(self.path.join(name));
        }
        match self.file_name() {
            Some(own) if own == name => Ok(self.path.clone()),
            _ => Err(IngestError::NotFound(name.to_string())),
        }
    }
}

#[async_trait]
impl DataProvider for FileProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Fs
    }

    async fn open(&mut self) -> Result<()> {
        let meta = tokio::fs::metadata(&self.path)
            .await
            .map_err(|_| IngestError::NotFound(self.path.display().to_string()))?;
        self.is_dir = meta.is_dir();
        debug!(path = %self.path.display(), is_dir = self.is_dir, "Opened file source");
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }

    async fn check_for_latest(&mut self, known: &str) -> Result<Option<String>> {
        if !self.is_dir {
            let name = self
                .file_name()
                .ok_or_else(|| IngestError::NotFound(self.path.display().to_string()))?;
            return Ok((name != known).then_some(name));
        }

        let mut names = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.path).await?;
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        Ok(filename::latest_newer(names, known))
    }

    async fn provide(&mut self, name: &str) -> Result<ByteStream> {
        let path = self.resolve(name)?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|_| IngestError::NotFound(path.display().to_string()))?
            .into_std()
            .await;

        let name = name.to_string();
        let decoded = tokio::task::spawn_blocking(move || decode_payload(&name, file))
            .await
            .map_err(|e| IngestError::Task(e.to_string()))??;

        info!(path = %path.display(), "Providing local feed file");
        Ok(Box::new(tokio::fs::File::from_std(decoded)))
    }
}
