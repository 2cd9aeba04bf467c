//! Ordered key-value backend abstraction
//!
//! The vehicle store needs four structures from its backend: a field/value
//! hash map for the record table, lexicographically ordered sets for the two
//! indexes and the history log, a list for finalized operations and plain
//! string keys for markers. Sorted-set members are always stored with score
//! 0, so ordering is purely lexicographic on the member bytes.

use crate::error::StoreResult;
use async_trait::async_trait;

/// A record write together with its two index entries.
#[derive(Debug, Clone)]
pub struct IndexedInsert<'a> {
    pub map: &'a str,
    pub field: &'a str,
    pub value: &'a str,
    pub vin_index: &'a str,
    pub vin_member: &'a str,
    pub reg_nr_index: &'a str,
    pub reg_nr_member: &'a str,
}

#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn ping(&self) -> StoreResult<()>;

    async fn hash_get(&self, key: &str, field: &str) -> StoreResult<Option<String>>;

    async fn hash_exists(&self, key: &str, field: &str) -> StoreResult<bool>;

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StoreResult<()>;

    /// One batch of a cursor scan over a hash map. Start with cursor 0; a
    /// returned cursor of 0 means the scan is complete. Batches may be
    /// larger or smaller than `count`.
    async fn hash_scan(
        &self,
        key: &str,
        cursor: u64,
        count: usize,
    ) -> StoreResult<(u64, Vec<(String, String)>)>;

    /// Write the record only if its field is absent and upsert both index
    /// members, as a single atomic unit. Returns whether the record was new.
    async fn insert_indexed(&self, insert: &IndexedInsert<'_>) -> StoreResult<bool>;

    async fn sorted_add(&self, key: &str, member: &str) -> StoreResult<()>;

    /// Members starting with `prefix`, in ascending lexicographic order.
    async fn sorted_range_by_prefix(&self, key: &str, prefix: &str) -> StoreResult<Vec<String>>;

    /// Returns whether the member existed.
    async fn sorted_remove(&self, key: &str, member: &str) -> StoreResult<bool>;

    async fn sorted_count(&self, key: &str) -> StoreResult<u64>;

    /// Lexicographically greatest member.
    async fn sorted_last(&self, key: &str) -> StoreResult<Option<String>>;

    async fn list_push_front(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Up to `limit` elements from the front of a list.
    async fn list_range(&self, key: &str, limit: usize) -> StoreResult<Vec<String>>;

    async fn string_get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn string_set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove whole keys of any type. Missing keys are ignored.
    async fn delete(&self, keys: &[&str]) -> StoreResult<()>;
}
