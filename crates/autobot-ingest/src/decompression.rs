//! Payload decompression
//!
//! Feed files arrive either plain, as a single-member `.zip` or as `.gz`.
//! Decompressed data is spooled to an anonymous temporary file so that
//! multi-gigabyte dumps never sit in memory. All functions here block and
//! are meant to run on the blocking thread pool.

use crate::error::{IngestError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

/// Compression detected from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Zip,
    Gzip,
}

impl Compression {
    pub fn from_name(name: &str) -> Self {
        match Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("zip") => Compression::Zip,
            Some("gz") => Compression::Gzip,
            _ => Compression::None,
        }
    }
}

/// Return a readable file holding the decompressed payload of `name`.
pub fn decode_payload(name: &str, file: File) -> Result<File> {
    match Compression::from_name(name) {
        Compression::None => Ok(file),
        Compression::Zip => unzip_single(file),
        Compression::Gzip => gunzip(file),
    }
}

/// Extract the first member of a zip archive.
///
/// An archive without members is an error. Extra members are ignored.
pub fn unzip_single(archive: File) -> Result<File> {
    let mut archive = zip::ZipArchive::new(archive)
        .map_err(|e| IngestError::archive(format!("Failed to read zip archive: {}", e)))?;

    if archive.len() == 0 {
        return Err(IngestError::archive("zip archive contains no files"));
    }
    if archive.len() > 1 {
        warn!(members = archive.len(), "Zip archive has more than one member, using the first");
    }

    let mut member = archive
        .by_index(0)
        .map_err(|e| IngestError::archive(format!("Failed to open zip member: {}", e)))?;
    let name = member.name().to_string();

    let mut out = tempfile::tempfile()?;
    let written = io::copy(&mut member, &mut out)?;
    out.seek(SeekFrom::Start(0))?;

    debug!(member = %name, bytes = written, "Extracted zip member");
    Ok(out)
}

pub fn gunzip(compressed: File) -> Result<File> {
    let mut decoder = GzDecoder::new(compressed);
    let mut out = tempfile::tempfile()?;
    let written = io::copy(&mut decoder, &mut out)
        .map_err(|e| IngestError::archive(format!("Failed to decompress gzip data: {}", e)))?;
    out.seek(SeekFrom::Start(0))?;

    debug!(bytes = written, "Decompressed gzip payload");
    Ok(out)
}
