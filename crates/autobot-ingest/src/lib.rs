//! Autobot Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Turns the national vehicle registry's XML statistics dump into a stream of
//! normalized [`Vehicle`](autobot_common::vehicle::Vehicle) records.
//!
//! # Pieces
//!
//! - **source**: locate and fetch the newest feed file (FTP or local disk)
//! - **decompression**: `.zip` / `.gz` payloads spooled to temp files
//! - **pipeline**: excerpt reader, parallel parse workers, completion signal
//! - **parser**: one XML excerpt to one record
//!
//! # Example
//!
//! ```no_run
//! use autobot_ingest::pipeline::{IngestPipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let file = tokio::fs::File::open("dump.xml").await?;
//!     let mut handle = IngestPipeline::new(PipelineConfig::default()).ingest(file);
//!     while let Some(vehicle) = handle.records.recv().await {
//!         println!("{}", vehicle.hash_key());
//!     }
//!     let stats = handle.done.await??;
//!     println!("parsed {}", stats.parsed);
//!     Ok(())
//! }
//! ```

pub mod decompression;
pub mod error;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod source;

pub use error::{IngestError, Result};
pub use pipeline::{IngestHandle, IngestPipeline, IngestStats, PipelineConfig};
pub use source::{ByteStream, DataProvider, FileProvider, FtpConfig, FtpProvider, ProviderKind};
