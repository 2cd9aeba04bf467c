//! History log entries
//!
//! Entries are stored as sorted-set members of the form
//! `YYYYMMDDTHHMMSS.ffffff:message`. All members share score 0, so the
//! lexicographic order of the fixed-width timestamp prefix is the
//! chronological order. Members written without the fraction still parse.

use crate::error::{StoreError, StoreResult};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

const MEMBER_TIME_FORMAT: &str = "%Y%m%dT%H%M%S%.6f";
const LEGACY_MEMBER_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub logged_at: NaiveDateTime,
    pub message: String,
}

impl LogEntry {
    pub fn new(logged_at: NaiveDateTime, message: impl Into<String>) -> Self {
        Self {
            logged_at,
            message: message.into(),
        }
    }

    pub fn to_member(&self) -> String {
        format!("{}:{}", self.logged_at.format(MEMBER_TIME_FORMAT), self.message)
    }

    /// Split on the first colon; the message may contain further colons.
    pub fn parse_member(member: &str) -> StoreResult<Self> {
        let (stamp, message) = member
            .split_once(':')
            .ok_or_else(|| StoreError::MalformedLogEntry(member.to_string()))?;
        let logged_at = NaiveDateTime::parse_from_str(stamp, MEMBER_TIME_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(stamp, LEGACY_MEMBER_TIME_FORMAT))
            .map_err(|_| StoreError::MalformedLogEntry(member.to_string()))?;
        Ok(Self::new(logged_at, message))
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.logged_at.format("%Y-%m-%dT%H:%M:%S"), self.message)
    }
}
