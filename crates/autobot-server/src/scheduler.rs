//! Recurring sync scheduler
//!
//! Schedules use the five-field cron syntax
//! `minute hour day-of-month month day-of-week`, evaluated in local time.
//! Internally they are converted to the seconds-first syntax of the `cron`
//! crate, whose numeric days of the week run 1-7 starting on Sunday; the
//! usual 0-7 numbering (Sunday is 0 or 7) is translated.
//!
//! The scheduler alternates between two states. While idle it sleeps until
//! the next tick; on a tick it runs one sync cycle to completion and goes
//! back to idle. Cycles never overlap, and a failed cycle is logged and
//! retried on the next tick.

use crate::orchestrator::{SyncOrchestrator, SyncOutcome};
use autobot_ingest::DataProvider;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("invalid expression: '{0}', must be a five-field cron-styled time expression")]
    FieldCount(String),

    #[error("invalid day-of-week field '{0}'")]
    DayOfWeek(String),

    #[error("invalid schedule '{expr}': {message}")]
    Parse { expr: String, message: String },
}

/// A parsed five-field schedule.
#[derive(Debug, Clone)]
pub struct Schedule {
    expr: String,
    inner: cron::Schedule,
}

impl Schedule {
    pub fn parse(expr: &str) -> Result<Self, ScheduleError> {
        let fields: Vec<&str> = expr.split_whitespace().collect();
        let [minute, hour, dom, month, dow] = fields.as_slice() else {
            return Err(ScheduleError::FieldCount(expr.to_string()));
        };

        let translated = format!(
            "0 {} {} {} {} {}",
            minute,
            hour,
            dom,
            month,
            translate_day_of_week(dow)?
        );
        let inner = cron::Schedule::from_str(&translated).map_err(|e| ScheduleError::Parse {
            expr: expr.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            expr: expr.to_string(),
            inner,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expr
    }

    /// First tick strictly after `now`.
    pub fn next_after(&self, now: &DateTime<Local>) -> Option<DateTime<Local>> {
        self.inner.after(now).next()
    }
}

/// Rewrite numeric days from 0-7 (Sunday = 0 or 7) to 1-7 (Sunday = 1).
/// Names, `*` and `?` pass through. Numeric ranges with a step are expanded
/// into a list of days, since shifting their bounds changes which days the
/// step lands on.
fn translate_day_of_week(field: &str) -> Result<String, ScheduleError> {
    let bad = || ScheduleError::DayOfWeek(field.to_string());
    let numeric = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let day = |s: &str| -> Result<u8, ScheduleError> {
        match s.parse::<u8>() {
            Ok(n @ 0..=7) => Ok(n),
            _ => Err(bad()),
        }
    };
    // Sunday is 1 in the cron crate.
    let shift = |d: u8| d % 7 + 1;

    let mut items = Vec::new();
    for item in field.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => (range, Some(step)),
            None => (item, None),
        };

        let (start, end) = match range.split_once('-') {
            Some((start, end)) if numeric(start) && numeric(end) => (day(start)?, day(end)?),
            None if numeric(range) => {
                let d = day(range)?;
                // `N/step` runs from N to the end of the week
                (d, if step.is_some() { 7 } else { d })
            },
            _ => {
                items.push(item.to_string());
                continue;
            },
        };
        if start > end {
            return Err(bad());
        }

        match step {
            Some(step) => {
                let step = step
                    .parse::<usize>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(bad)?;
                let mut days: Vec<u8> = (start..=end).step_by(step).map(shift).collect();
                days.sort_unstable();
                days.dedup();
                if days.len() == 7 {
                    items.push("*".to_string());
                } else {
                    items.extend(days.iter().map(u8::to_string));
                }
            },
            None if start == end => items.push(shift(start).to_string()),
            None if start == 0 && end >= 6 => items.push("*".to_string()),
            // A range ending on Sunday-as-7 wraps once Sunday becomes 1.
            None if end == 7 => {
                if start < 6 {
                    items.push(format!("{}-7", shift(start)));
                } else {
                    items.push("7".to_string());
                }
                items.push("1".to_string());
            },
            None => items.push(format!("{}-{}", shift(start), shift(end))),
        }
    }

    if items.iter().any(|i| i == "*") {
        return Ok("*".to_string());
    }
    Ok(items.join(","))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
}

pub struct SyncScheduler {
    schedule: Schedule,
    orchestrator: SyncOrchestrator,
    provider: Box<dyn DataProvider>,
}

impl SyncScheduler {
    pub fn new(
        schedule: Schedule,
        orchestrator: SyncOrchestrator,
        provider: Box<dyn DataProvider>,
    ) -> Self {
        Self {
            schedule,
            orchestrator,
            provider,
        }
    }

    /// Spawn the scheduling loop.
    pub fn start(self) -> SchedulerHandle {
        let (state_tx, state_rx) = watch::channel(SchedulerState::Idle);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(state_tx, cancel.clone()));
        SchedulerHandle {
            state: state_rx,
            cancel,
            task,
        }
    }

    async fn run(mut self, state: watch::Sender<SchedulerState>, cancel: CancellationToken) {
        info!(schedule = %self.schedule.expression(), "Sync scheduler started");
        loop {
            let now = Local::now();
            let Some(next) = self.schedule.next_after(&now) else {
                warn!(schedule = %self.schedule.expression(), "Schedule has no upcoming ticks, stopping");
                break;
            };
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next = %next.format("%Y-%m-%d %H:%M:%S"), "Next sync scheduled");

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(wait) => {},
            }

            state.send_replace(SchedulerState::Running);
            self.tick().await;
            state.send_replace(SchedulerState::Idle);
        }
        info!("Sync scheduler stopped");
    }

    async fn tick(&mut self) {
        match self
            .orchestrator
            .run_once(self.provider.as_mut(), false)
            .await
        {
            Ok(SyncOutcome::UpToDate { .. }) => info!("Sync: no new feed file detected"),
            Ok(SyncOutcome::Synced { file, summary, .. }) => {
                info!(file = %file, "{}", summary)
            },
            Err(e) => error!(error = %e, "Sync failed, will retry on the next tick"),
        }
    }
}

/// Control handle for a running [`SyncScheduler`].
pub struct SchedulerHandle {
    state: watch::Receiver<SchedulerState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.clone()
    }

    /// Cancel the next tick and wait for the loop to exit. A sync already in
    /// progress runs to completion first.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "Sync scheduler task failed");
        }
    }
}
