//! Feed sources
//!
//! A [`DataProvider`] locates the newest feed file and hands out its
//! decompressed contents as an async byte stream.

pub mod filename;
pub mod fs;
pub mod ftp;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::io::AsyncRead;

pub use filename::{is_newer, latest_newer, FeedFileName};
pub use fs::FileProvider;
pub use ftp::{FtpConfig, FtpProvider};

/// Readable feed payload.
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Provider implementation, also used as the sync operation's source tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ftp,
    Fs,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Ftp => "ftp",
            ProviderKind::Fs => "fs",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ftp" => Ok(ProviderKind::Ftp),
            "fs" | "file" => Ok(ProviderKind::Fs),
            other => Err(format!("unknown provider kind '{}'", other)),
        }
    }
}

#[async_trait]
pub trait DataProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Verify the source is reachable.
    async fn open(&mut self) -> Result<()>;

    async fn close(&mut self) -> Result<()>;

    /// Name of the newest feed file strictly newer than `known`, or `None`.
    async fn check_for_latest(&mut self, known: &str) -> Result<Option<String>>;

    /// Decompressed contents of `name`.
    async fn provide(&mut self, name: &str) -> Result<ByteStream>;
}
