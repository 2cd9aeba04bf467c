//! Indexed vehicle store
//!
//! Records live in one hash map keyed by the decimal identity hash, with the
//! JSON record as value. Two sorted sets index them by VIN and registration
//! number; their members are `COUNTRY:IDENT:hash` with score 0, so a lookup
//! is a lexicographic range scan over the `COUNTRY:IDENT:` prefix.
//!
//! Index entries whose hash no longer resolves are removed when a lookup
//! hits them. Nothing sweeps them proactively.
//!
//! Sync bookkeeping (the operations of this process) is kept in memory; only
//! the finalized summaries reach the backend, as a history entry and as the
//! head of the operations list.

pub mod backend;
pub mod history;
pub mod memory;
pub mod query;
pub mod redis_backend;
pub mod sync_op;

use crate::config::{BackendKind, StoreConfig, SyncConfig};
use crate::error::{StoreError, StoreResult};
use autobot_common::vehicle::{hash_key, RegCountry, Vehicle, EXPORT_HEADER};
use autobot_ingest::{IngestError, IngestHandle, IngestStats};
use chrono::{Local, NaiveDateTime, TimeDelta};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub use backend::{IndexedInsert, StoreBackend};
pub use history::LogEntry;
pub use memory::MemoryBackend;
pub use query::{PreparedQuery, Query};
pub use redis_backend::RedisBackend;
pub use sync_op::{SyncOp, SyncOpId};

/// Open the backend selected by `config`.
pub async fn connect(config: &StoreConfig) -> StoreResult<Arc<dyn StoreBackend>> {
    match config.backend {
        BackendKind::Redis => Ok(Arc::new(RedisBackend::connect(config).await?)),
        BackendKind::Memory => {
            warn!("Using the in-memory store backend, data is lost on exit");
            Ok(Arc::new(MemoryBackend::new()))
        },
    }
}

/// Which secondary index a lookup goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IndexKind {
    Vin,
    RegNr,
}

/// Snapshot of the durable history.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStatus {
    pub history_size: u64,
    pub last_entry: Option<LogEntry>,
}

pub struct VehicleStore {
    backend: Arc<dyn StoreBackend>,
    opts: SyncConfig,
    ops: Mutex<Vec<SyncOp>>,
    last_logged: Mutex<Option<NaiveDateTime>>,
}

impl VehicleStore {
    pub fn new(backend: Arc<dyn StoreBackend>, opts: SyncConfig) -> Self {
        Self {
            backend,
            opts,
            ops: Mutex::new(Vec::new()),
            last_logged: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> &Arc<dyn StoreBackend> {
        &self.backend
    }

    pub fn options(&self) -> &SyncConfig {
        &self.opts
    }

    // ------------------------------------------------------------------------
    // Sync operations
    // ------------------------------------------------------------------------

    /// Start tracking a new sync operation from `source`.
    pub fn new_sync_op(&self, source: &str) -> SyncOpId {
        let mut ops = self.lock_ops();
        let id = SyncOpId(ops.len());
        ops.push(SyncOp::new(id, source));
        debug!(op = %id, source, "Created sync operation");
        id
    }

    fn lock_ops(&self) -> MutexGuard<'_, Vec<SyncOp>> {
        // A poisoned lock only means a panic elsewhere; the counters are still usable.
        self.ops.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn with_op<T>(&self, id: SyncOpId, f: impl FnOnce(&mut SyncOp) -> T) -> StoreResult<T> {
        let mut ops = self.lock_ops();
        let op = ops
            .get_mut(id.0)
            .ok_or(StoreError::UnknownOperation(id))?;
        Ok(f(op))
    }

    /// Copy of the operation's current state.
    pub fn operation(&self, id: SyncOpId) -> StoreResult<SyncOp> {
        self.with_op(id, |op| op.clone())
    }

    /// Summary line of the operation.
    pub fn status(&self, id: SyncOpId) -> StoreResult<String> {
        self.with_op(id, |op| op.to_string())
    }

    /// Drain the pipeline output into the store.
    ///
    /// Every record counts as processed; only genuinely new records count as
    /// synced. When the pipeline completes, the operation is finalized and
    /// its summary written to the history log and the operations list. A
    /// backend error or a failed pipeline aborts the sync without
    /// finalizing.
    pub async fn sync(&self, id: SyncOpId, handle: IngestHandle) -> StoreResult<IngestStats> {
        // Fail fast on a bad id before consuming anything.
        self.with_op(id, |_| ())?;

        let IngestHandle { mut records, mut done } = handle;
        let outcome = loop {
            tokio::select! {
                biased;
                Some(vehicle) = records.recv() => {
                    self.sync_one(id, &vehicle).await?;
                },
                outcome = &mut done => break outcome,
            }
        };

        // Workers finish their sends before completion fires; pick up what
        // is still buffered.
        while let Ok(vehicle) = records.try_recv() {
            self.sync_one(id, &vehicle).await?;
        }

        let stats = outcome
            .map_err(|_| IngestError::Task("pipeline completion signal dropped".to_string()))??;

        let summary = self.finalize(id).await?;
        info!(op = %id, parsed = stats.parsed, skipped = stats.skipped, "{}", summary);
        Ok(stats)
    }

    async fn sync_one(&self, id: SyncOpId, vehicle: &Vehicle) -> StoreResult<()> {
        self.with_op(id, |op| op.processed += 1)?;
        if self.sync_vehicle(vehicle).await? {
            self.with_op(id, |op| op.synced += 1)?;
        }
        Ok(())
    }

    async fn finalize(&self, id: SyncOpId) -> StoreResult<String> {
        let (first, summary) = self.with_op(id, |op| (op.finish(), op.to_string()))?;
        if !first {
            return Ok(summary);
        }
        self.log(&summary).await?;
        self.backend
            .list_push_front(&self.opts.ops_list, &summary)
            .await?;
        Ok(summary)
    }

    /// Persist `vehicle` and its index entries unless its hash is already
    /// stored. Returns whether it was inserted.
    pub async fn sync_vehicle(&self, vehicle: &Vehicle) -> StoreResult<bool> {
        let hash = vehicle.hash_key();
        if self.backend.hash_exists(&self.opts.vehicle_map, &hash).await? {
            return Ok(false);
        }

        let value = vehicle.to_json()?;
        let country = vehicle.meta.country;
        let vin_member = index_member(country, &vehicle.vin, &hash);
        let reg_nr_member = index_member(country, &vehicle.reg_nr, &hash);

        let inserted = self
            .backend
            .insert_indexed(&IndexedInsert {
                map: &self.opts.vehicle_map,
                field: &hash,
                value: &value,
                vin_index: &self.opts.vin_index,
                vin_member: &vin_member,
                reg_nr_index: &self.opts.reg_nr_index,
                reg_nr_member: &reg_nr_member,
            })
            .await?;
        Ok(inserted)
    }

    // ------------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------------

    pub async fn lookup_by_vin(
        &self,
        country: RegCountry,
        vin: &str,
        include_disabled: bool,
    ) -> StoreResult<Option<Vehicle>> {
        self.lookup_indexed(IndexKind::Vin, country, vin, include_disabled)
            .await
    }

    pub async fn lookup_by_registration(
        &self,
        country: RegCountry,
        reg_nr: &str,
        include_disabled: bool,
    ) -> StoreResult<Option<Vehicle>> {
        self.lookup_indexed(IndexKind::RegNr, country, reg_nr, include_disabled)
            .await
    }

    /// Direct lookup; disabled records are returned and no index is touched.
    pub async fn lookup_by_hash(&self, hash: u64) -> StoreResult<Option<Vehicle>> {
        self.fetch(&hash_key(hash)).await
    }

    async fn fetch(&self, hash: &str) -> StoreResult<Option<Vehicle>> {
        match self.backend.hash_get(&self.opts.vehicle_map, hash).await? {
            Some(raw) => Ok(Some(Vehicle::from_json(&raw)?)),
            None => Ok(None),
        }
    }

    async fn lookup_indexed(
        &self,
        kind: IndexKind,
        country: RegCountry,
        ident: &str,
        include_disabled: bool,
    ) -> StoreResult<Option<Vehicle>> {
        let index = match kind {
            IndexKind::Vin => &self.opts.vin_index,
            IndexKind::RegNr => &self.opts.reg_nr_index,
        };
        let prefix = format!("{}:{}:", country, ident.trim().to_uppercase());

        // Ascending order; the lexicographically smallest member wins.
        // Members of longer idents containing ':' share the prefix and are
        // skipped, since their remainder is not a bare hash.
        let members = self.backend.sorted_range_by_prefix(index, &prefix).await?;
        let Some((member, hash)) = members.iter().find_map(|member| {
            let rest = member.strip_prefix(prefix.as_str())?;
            is_hash_key(rest).then_some((member, rest))
        }) else {
            return Ok(None);
        };

        match self.fetch(hash).await? {
            None => {
                warn!(index = %index, member = %member, "Removing dangling index entry");
                self.backend.sorted_remove(index, member).await?;
                Ok(None)
            },
            Some(vehicle) if vehicle.meta.disabled && !include_disabled => Ok(None),
            Some(vehicle) => Ok(Some(vehicle)),
        }
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    pub async fn enable(&self, hash: u64) -> StoreResult<()> {
        self.set_disabled(hash, false).await
    }

    pub async fn disable(&self, hash: u64) -> StoreResult<()> {
        self.set_disabled(hash, true).await
    }

    async fn set_disabled(&self, hash: u64, disabled: bool) -> StoreResult<()> {
        let key = hash_key(hash);
        let mut vehicle = self
            .fetch(&key)
            .await?
            .ok_or_else(|| StoreError::NoSuchVehicle(key.clone()))?;
        vehicle.meta.disabled = disabled;
        self.backend
            .hash_set(&self.opts.vehicle_map, &key, &vehicle.to_json()?)
            .await?;
        info!(hash = %key, disabled, "Updated vehicle state");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Housekeeping
    // ------------------------------------------------------------------------

    /// Remove all records and both indexes. History, finalized operations and
    /// the last-synced marker go too only when `clear_history` is set.
    pub async fn clear(&self) -> StoreResult<()> {
        let mut keys = vec![
            self.opts.vehicle_map.as_str(),
            self.opts.vin_index.as_str(),
            self.opts.reg_nr_index.as_str(),
        ];
        if self.opts.clear_history {
            keys.extend([
                self.opts.history_set.as_str(),
                self.opts.ops_list.as_str(),
                self.opts.synced_file_key.as_str(),
            ]);
        }
        self.backend.delete(&keys).await?;
        info!(keys = keys.len(), clear_history = self.opts.clear_history, "Cleared vehicle store");
        Ok(())
    }

    pub async fn last_synced(&self) -> StoreResult<Option<String>> {
        Ok(self
            .backend
            .string_get(&self.opts.synced_file_key)
            .await?
            .filter(|name| !name.is_empty()))
    }

    pub async fn set_last_synced(&self, name: &str) -> StoreResult<()> {
        self.backend
            .string_set(&self.opts.synced_file_key, name)
            .await
    }

    /// Append `message` to the history log, stamped with the local time.
    /// Stamps are strictly increasing, so identical messages logged within
    /// the same clock tick still get their own entries.
    pub async fn log(&self, message: &str) -> StoreResult<()> {
        let entry = LogEntry::new(self.next_log_stamp(), message);
        self.backend
            .sorted_add(&self.opts.history_set, &entry.to_member())
            .await
    }

    fn next_log_stamp(&self) -> NaiveDateTime {
        let mut last = self.last_logged.lock().unwrap_or_else(|e| e.into_inner());
        let now = Local::now().naive_local();
        let stamp = match *last {
            Some(prev) if now <= prev => prev + TimeDelta::microseconds(1),
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }

    pub async fn count_log(&self) -> StoreResult<u64> {
        self.backend.sorted_count(&self.opts.history_set).await
    }

    pub async fn last_log(&self) -> StoreResult<Option<LogEntry>> {
        match self.backend.sorted_last(&self.opts.history_set).await? {
            Some(member) => Ok(Some(LogEntry::parse_member(&member)?)),
            None => Ok(None),
        }
    }

    pub async fn store_status(&self) -> StoreResult<StoreStatus> {
        Ok(StoreStatus {
            history_size: self.count_log().await?,
            last_entry: self.last_log().await?,
        })
    }

    /// Most recent finalized operation summaries, newest first.
    pub async fn recent_operations(&self, limit: usize) -> StoreResult<Vec<String>> {
        self.backend.list_range(&self.opts.ops_list, limit).await
    }

    // ------------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------------

    /// Stream matching records to `sink` as CSV with every field quoted.
    ///
    /// The record table is scanned in batches of `scan_batch_size`, so memory
    /// use does not grow with the table. Returns the number of rows written.
    pub async fn query_to<W: Write>(&self, sink: W, query: &Query) -> StoreResult<u64> {
        let prepared = query.prepare();
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(sink);
        writer.write_record(EXPORT_HEADER)?;

        let mut written = 0u64;
        let mut cursor = 0u64;
        'scan: loop {
            let (next, batch) = self
                .backend
                .hash_scan(&self.opts.vehicle_map, cursor, self.opts.scan_batch_size)
                .await?;

            for (_, raw) in batch {
                if prepared.limit_reached(written) {
                    break 'scan;
                }
                let vehicle = Vehicle::from_json(&raw)?;
                if prepared.matches(&vehicle) {
                    writer.write_record(vehicle.export_row())?;
                    written += 1;
                }
            }

            if next == 0 || prepared.limit_reached(written) {
                break;
            }
            cursor = next;
        }

        writer.flush()?;
        debug!(rows = written, "Query export finished");
        Ok(written)
    }
}

fn is_hash_key(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn index_member(country: RegCountry, ident: &str, hash: &str) -> String {
    format!("{}:{}:{}", country, ident.trim().to_uppercase(), hash)
}
