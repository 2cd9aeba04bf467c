//! In-process backend
//!
//! Ordered maps behind one async lock. Used for tests and for running
//! without a Redis server (`store.backend = "memory"`); nothing survives a
//! restart.

use super::backend::{IndexedInsert, StoreBackend};
use crate::error::StoreResult;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    hashes: HashMap<String, BTreeMap<String, String>>,
    sorted: HashMap<String, BTreeSet<String>>,
    lists: HashMap<String, VecDeque<String>>,
    strings: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        let state = self.state.read().await;
        Ok(state.hashes.get(key).and_then(|h| h.get(field)).cloned())
    }

    async fn hash_exists(&self, key: &str, field: &str) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state.hashes.get(key).is_some_and(|h| h.contains_key(field)))
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hash_scan(
        &self,
        key: &str,
        cursor: u64,
        count: usize,
    ) -> StoreResult<(u64, Vec<(String, String)>)> {
        let state = self.state.read().await;
        let Some(hash) = state.hashes.get(key) else {
            return Ok((0, Vec::new()));
        };

        // The cursor is the number of entries already returned.
        let skip = usize::try_from(cursor).unwrap_or(usize::MAX);
        let batch: Vec<(String, String)> = hash
            .iter()
            .skip(skip)
            .take(count.max(1))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let consumed = skip.saturating_add(batch.len());
        let next = if consumed >= hash.len() {
            0
        } else {
            consumed as u64
        };
        Ok((next, batch))
    }

    async fn insert_indexed(&self, insert: &IndexedInsert<'_>) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let map = state.hashes.entry(insert.map.to_string()).or_default();
        let inserted = if map.contains_key(insert.field) {
            false
        } else {
            map.insert(insert.field.to_string(), insert.value.to_string());
            true
        };
        state
            .sorted
            .entry(insert.vin_index.to_string())
            .or_default()
            .insert(insert.vin_member.to_string());
        state
            .sorted
            .entry(insert.reg_nr_index.to_string())
            .or_default()
            .insert(insert.reg_nr_member.to_string());
        Ok(inserted)
    }

    async fn sorted_add(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .sorted
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn sorted_range_by_prefix(&self, key: &str, prefix: &str) -> StoreResult<Vec<String>> {
        let state = self.state.read().await;
        let Some(set) = state.sorted.get(key) else {
            return Ok(Vec::new());
        };
        Ok(set
            .range(prefix.to_string()..)
            .take_while(|m| m.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn sorted_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        Ok(state
            .sorted
            .get_mut(key)
            .is_some_and(|set| set.remove(member)))
    }

    async fn sorted_count(&self, key: &str) -> StoreResult<u64> {
        let state = self.state.read().await;
        Ok(state.sorted.get(key).map_or(0, |s| s.len() as u64))
    }

    async fn sorted_last(&self, key: &str) -> StoreResult<Option<String>> {
        let state = self.state.read().await;
        Ok(state.sorted.get(key).and_then(|s| s.last()).cloned())
    }

    async fn list_push_front(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .lists
            .entry(key.to_string())
            .or_default()
            .push_front(value.to_string());
        Ok(())
    }

    async fn list_range(&self, key: &str, limit: usize) -> StoreResult<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .lists
            .get(key)
            .map(|l| l.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn string_get(&self, key: &str) -> StoreResult<Option<String>> {
        let state = self.state.read().await;
        Ok(state.strings.get(key).cloned())
    }

    async fn string_set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> StoreResult<()> {
        let mut state = self.state.write().await;
        for key in keys {
            state.hashes.remove(*key);
            state.sorted.remove(*key);
            state.lists.remove(*key);
            state.strings.remove(*key);
        }
        Ok(())
    }
}
