//! Sync operation bookkeeping

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Reference to a sync operation, assigned in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SyncOpId(pub usize);

impl fmt::Display for SyncOpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct SyncOp {
    pub id: SyncOpId,
    pub started: DateTime<Local>,
    /// Set exactly once, when the operation is finalized.
    pub duration: Option<Duration>,
    pub source: String,
    pub processed: u64,
    pub synced: u64,
}

impl SyncOp {
    pub fn new(id: SyncOpId, source: impl Into<String>) -> Self {
        Self {
            id,
            started: Local::now(),
            duration: None,
            source: source.into(),
            processed: 0,
            synced: 0,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.duration.is_some()
    }

    /// Record the duration. Returns false when already finalized.
    pub fn finish(&mut self) -> bool {
        if self.is_finalized() {
            return false;
        }
        let elapsed = Local::now().signed_duration_since(self.started);
        self.duration = Some(elapsed.to_std().unwrap_or_default());
        true
    }
}

impl fmt::Display for SyncOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sync status - began: {}, duration: {}. Summary: synced {} of {} vehicles",
            self.source.to_uppercase(),
            self.started.format("%Y-%m-%dT%H:%M:%S"),
            format_duration(self.duration.unwrap_or_default()),
            self.synced,
            self.processed
        )
    }
}

/// Whole seconds as `1h2m3s`, `4m0s` or `5s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h{}m{}s", h, m, s)
    } else if m > 0 {
        format!("{}m{}s", m, s)
    } else {
        format!("{}s", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(900)), "0s");
        assert_eq!(format_duration(Duration::from_secs(59)), "59s");
        assert_eq!(format_duration(Duration::from_secs(240)), "4m0s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h2m3s");
    }

    #[test]
    fn test_summary_and_single_finalize() {
        let mut op = SyncOp::new(SyncOpId(0), "ftp");
        op.processed = 3;
        op.synced = 2;
        assert!(op.finish());
        assert!(!op.finish());

        let summary = op.to_string();
        assert!(summary.starts_with("FTP sync status - began: "));
        assert!(summary.ends_with("Summary: synced 2 of 3 vehicles"));
        assert!(summary.contains("duration: 0s."));
    }
}
