//! Concurrent excerpt ingestion
//!
//! ```text
//!  byte stream ──► reader ──(bounded excerpt queue)──► N parse workers ──(bounded)──► records
//!                                                            │
//!                                           aggregator ◄─────┘ one terminal result per task
//!                                                │
//!                                                └──► done: Result<IngestStats, IngestError>
//! ```
//!
//! The reader suspends when the excerpt queue is full, so the read rate
//! follows parser throughput. Workers share the queue's receiving end. Each
//! worker returns exactly one terminal result; the aggregator waits for the
//! reader and all N workers before firing `done`. Since workers await every
//! record send, all records are already buffered in the record channel by
//! the time `done` fires.
//!
//! A malformed excerpt cancels the run: the reader stops reading, remaining
//! workers drain out and `done` carries the error.

use crate::error::{IngestError, Result};
use crate::parser::{ExcerptParser, ParseOutcome, SkipReason};
use autobot_common::vehicle::{RegCountry, Vehicle, VehicleType};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_START_MARKER: &str = "<ns:Statistik>";
pub const DEFAULT_END_MARKER: &str = "</ns:Statistik>";
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;
pub const DEFAULT_RECORD_BUFFER: usize = 1024;

/// `max(2, cpus - 1)`
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .saturating_sub(1)
        .max(2)
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parse workers; 0 means [`default_workers`].
    pub workers: usize,
    pub queue_capacity: usize,
    pub record_buffer: usize,
    pub start_marker: String,
    pub end_marker: String,
    pub country: RegCountry,
    pub allowed_types: Vec<VehicleType>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            record_buffer: DEFAULT_RECORD_BUFFER,
            start_marker: DEFAULT_START_MARKER.to_string(),
            end_marker: DEFAULT_END_MARKER.to_string(),
            country: RegCountry::DK,
            allowed_types: VehicleType::KNOWN.to_vec(),
        }
    }
}

impl PipelineConfig {
    pub fn with_country(mut self, country: RegCountry) -> Self {
        self.country = country;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            default_workers()
        } else {
            self.workers
        }
    }
}

/// Counters for one completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Excerpts handed to the workers.
    pub excerpts: u64,
    /// Records emitted.
    pub parsed: u64,
    /// Records dropped because of an invalid registration date.
    pub skipped: u64,
    /// Records dropped by the vehicle class allow-list.
    pub filtered: u64,
    pub workers: usize,
}

/// Output side of a running ingestion.
pub struct IngestHandle {
    pub records: mpsc::Receiver<Vehicle>,
    pub done: oneshot::Receiver<Result<IngestStats>>,
}

#[derive(Debug)]
struct Excerpt {
    index: u64,
    body: String,
}

#[derive(Debug, Default)]
struct WorkerTally {
    parsed: u64,
    skipped: u64,
    filtered: u64,
}

type SharedQueue = Arc<Mutex<mpsc::Receiver<Excerpt>>>;

pub struct IngestPipeline {
    config: PipelineConfig,
    parser: Arc<ExcerptParser>,
}

impl IngestPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let parser = Arc::new(ExcerptParser::new(
            config.country,
            config.allowed_types.clone(),
        ));
        Self { config, parser }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Start ingesting `reader`. Must be called inside a Tokio runtime.
    pub fn ingest<R>(&self, reader: R) -> IngestHandle
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let workers = self.config.effective_workers();
        let (excerpt_tx, excerpt_rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let (record_tx, record_rx) = mpsc::channel(self.config.record_buffer.max(1));
        let (done_tx, done_rx) = oneshot::channel();
        let cancel = CancellationToken::new();

        info!(
            workers,
            country = %self.config.country,
            "Starting ingestion pipeline"
        );

        let reader_task = tokio::spawn(read_excerpts(
            reader,
            self.config.start_marker.clone(),
            self.config.end_marker.clone(),
            excerpt_tx,
            cancel.clone(),
        ));

        let queue: SharedQueue = Arc::new(Mutex::new(excerpt_rx));
        let mut worker_set = JoinSet::new();
        for id in 0..workers {
            worker_set.spawn(parse_worker(
                id,
                Arc::clone(&self.parser),
                Arc::clone(&queue),
                record_tx.clone(),
                cancel.clone(),
            ));
        }
        drop(record_tx);

        tokio::spawn(async move {
            let result = aggregate(reader_task, worker_set, workers, cancel).await;
            match &result {
                Ok(stats) => info!(
                    excerpts = stats.excerpts,
                    parsed = stats.parsed,
                    skipped = stats.skipped,
                    filtered = stats.filtered,
                    "Ingestion pipeline finished"
                ),
                Err(e) => warn!(error = %e, "Ingestion pipeline aborted"),
            }
            if done_tx.send(result).is_err() {
                debug!("Ingestion result dropped, nobody is listening");
            }
        });

        IngestHandle {
            records: record_rx,
            done: done_rx,
        }
    }
}

async fn read_excerpts<R>(
    reader: R,
    start_marker: String,
    end_marker: String,
    queue: mpsc::Sender<Excerpt>,
    cancel: CancellationToken,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut current: Option<String> = None;
    let mut count = 0u64;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(count),
            next = lines.next_line() => next,
        };
        let line = match next {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                cancel.cancel();
                return Err(IngestError::Read(e));
            },
        };
        let line = line.trim();

        if current.is_none() && line.starts_with(start_marker.as_str()) {
            current = Some(String::new());
        }
        let Some(body) = current.as_mut() else {
            continue;
        };
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(line);

        if line.ends_with(end_marker.as_str()) {
            let excerpt = Excerpt {
                index: count,
                body: current.take().unwrap_or_default(),
            };
            count += 1;
            let sent = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(count),
                sent = queue.send(excerpt) => sent,
            };
            if sent.is_err() {
                debug!("All parse workers are gone, stopping reader");
                return Ok(count);
            }
        }
    }

    if current.is_some() {
        cancel.cancel();
        return Err(IngestError::malformed(
            count,
            "stream ended inside an unterminated excerpt",
        ));
    }

    debug!(excerpts = count, "Reader reached end of stream");
    Ok(count)
}

async fn parse_worker(
    id: usize,
    parser: Arc<ExcerptParser>,
    queue: SharedQueue,
    records: mpsc::Sender<Vehicle>,
    cancel: CancellationToken,
) -> Result<WorkerTally> {
    let mut tally = WorkerTally::default();
    let mut processed = 0u64;

    loop {
        let next = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = rx.recv() => next,
            }
        };
        let Some(excerpt) = next else {
            break;
        };
        processed += 1;

        match parser.parse(excerpt.index, &excerpt.body) {
            Ok(ParseOutcome::Parsed(vehicle)) => {
                let sent = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    sent = records.send(*vehicle) => sent,
                };
                if sent.is_err() {
                    warn!(worker = id, "Record consumer went away, cancelling ingestion");
                    cancel.cancel();
                    break;
                }
                tally.parsed += 1;
            },
            Ok(ParseOutcome::Skipped(SkipReason::InvalidDate { ident, raw })) => {
                warn!(worker = id, ident, date = %raw, "Skipping record with unparseable first registration date");
                tally.skipped += 1;
            },
            Ok(ParseOutcome::Skipped(SkipReason::FilteredType { .. })) => {
                tally.filtered += 1;
            },
            Err(e) => {
                cancel.cancel();
                return Err(e);
            },
        }
    }

    debug!(
        worker = id,
        processed,
        kept = tally.parsed,
        "Parse worker finished"
    );
    Ok(tally)
}

async fn aggregate(
    reader: JoinHandle<Result<u64>>,
    mut workers: JoinSet<Result<WorkerTally>>,
    worker_count: usize,
    cancel: CancellationToken,
) -> Result<IngestStats> {
    let mut stats = IngestStats {
        workers: worker_count,
        ..IngestStats::default()
    };
    let mut first_error: Option<IngestError> = None;

    match reader.await {
        Ok(Ok(count)) => stats.excerpts = count,
        Ok(Err(e)) => first_error = Some(e),
        Err(join) => {
            cancel.cancel();
            first_error = Some(IngestError::Task(join.to_string()));
        },
    }

    let mut finished = 0usize;
    while let Some(joined) = workers.join_next().await {
        finished += 1;
        match joined {
            Ok(Ok(tally)) => {
                stats.parsed += tally.parsed;
                stats.skipped += tally.skipped;
                stats.filtered += tally.filtered;
            },
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            },
            Err(join) => {
                cancel.cancel();
                first_error.get_or_insert(IngestError::Task(join.to_string()));
            },
        }
    }
    debug!(finished, expected = worker_count, "All parse workers reported");

    match first_error {
        Some(e) => Err(e),
        None if cancel.is_cancelled() => Err(IngestError::Cancelled),
        None => Ok(stats),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn excerpt(ident: u64, vin: &str, date: &str) -> String {
        format!(
            "<ns:Statistik>\n\
             <ns:KoeretoejIdent>{ident}</ns:KoeretoejIdent>\n\
             <ns:KoeretoejArtNummer>1</ns:KoeretoejArtNummer>\n\
             <ns:RegistreringNummerNummer>R{ident}</ns:RegistreringNummerNummer>\n\
             <ns:KoeretoejOplysningGrundStruktur>\n\
             <ns:KoeretoejOplysningStelNummer>{vin}</ns:KoeretoejOplysningStelNummer>\n\
             <ns:KoeretoejOplysningFoersteRegistreringDato>{date}</ns:KoeretoejOplysningFoersteRegistreringDato>\n\
             </ns:KoeretoejOplysningGrundStruktur>\n\
             </ns:Statistik>\n"
        )
    }

    fn feed(body: &str) -> Cursor<Vec<u8>> {
        Cursor::new(format!("<?xml version=\"1.0\"?>\n<ns:Root>\n{body}</ns:Root>\n").into_bytes())
    }

    async fn run(body: &str, workers: usize) -> (Vec<Vehicle>, Result<IngestStats>) {
        let pipeline = IngestPipeline::new(PipelineConfig::default().with_workers(workers));
        let IngestHandle { mut records, done } = pipeline.ingest(feed(body));
        let mut out = Vec::new();
        while let Some(v) = records.recv().await {
            out.push(v);
        }
        (out, done.await.unwrap())
    }

    #[tokio::test]
    async fn test_all_excerpts_arrive_before_done() {
        let body: String = (0..200)
            .map(|i| excerpt(i, &format!("VIN{i:05}"), "2019-01-01"))
            .collect();
        let (records, stats) = run(&body, 4).await;
        let stats = stats.unwrap();
        assert_eq!(records.len(), 200);
        assert_eq!(stats.excerpts, 200);
        assert_eq!(stats.parsed, 200);
        assert_eq!(stats.workers, 4);
    }

    #[tokio::test]
    async fn test_bad_date_is_skipped_not_fatal() {
        let body = format!(
            "{}{}",
            excerpt(1, "VIN1", "2019-01-01"),
            excerpt(2, "VIN2", "not a date")
        );
        let (records, stats) = run(&body, 2).await;
        let stats = stats.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(stats.skipped, 1);
    }

    #[tokio::test]
    async fn test_malformed_excerpt_fails_the_run() {
        let body = format!(
            "{}<ns:Statistik>\n<ns:KoeretoejIdent>oops</ns:KoeretoejIdent>\n</ns:Statistik>\n",
            excerpt(1, "VIN1", "2019-01-01")
        );
        let (_, result) = run(&body, 2).await;
        assert!(matches!(result, Err(IngestError::MalformedExcerpt { .. })));
    }

    #[tokio::test]
    async fn test_single_line_excerpt() {
        let line = excerpt(5, "VIN5", "2019-01-01").replace('\n', "");
        let (records, stats) = run(&format!("{line}\n"), 2).await;
        assert_eq!(stats.unwrap().excerpts, 1);
        assert_eq!(records[0].vin, "VIN5");
    }

    #[tokio::test]
    async fn test_truncated_stream_is_malformed() {
        let (_, result) = run("<ns:Statistik>\n<ns:KoeretoejIdent>1</ns:KoeretoejIdent>\n", 2).await;
        assert!(matches!(result, Err(IngestError::MalformedExcerpt { .. })));
    }

    #[test]
    fn test_default_workers_floor() {
        assert!(default_workers() >= 2);
    }
}
