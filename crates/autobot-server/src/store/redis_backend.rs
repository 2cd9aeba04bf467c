//! Redis backend
//!
//! Uses a [`ConnectionManager`], which multiplexes one connection and
//! reconnects transparently; clones are cheap and share the connection.

use super::backend::{IndexedInsert, StoreBackend};
use crate::config::StoreConfig;
use crate::error::StoreResult;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::{debug, info};

#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    /// Connect and verify the server answers `PING`.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                db: config.db,
                password: (!config.password.is_empty()).then(|| config.password.clone()),
                ..Default::default()
            },
        };
        let client = redis::Client::open(info)?;
        let conn = ConnectionManager::new(client).await?;
        let backend = Self { conn };
        backend.ping().await?;

        info!(host = %config.host, port = config.port, db = config.db, "Connected to Redis");
        Ok(backend)
    }
}

/// Inclusive lexicographic bounds matching every member that starts with
/// `prefix`. The upper bound appends a raw 0xFF byte, which sorts after any
/// byte of a UTF-8 encoded member.
fn prefix_bounds(prefix: &str) -> (Vec<u8>, Vec<u8>) {
    let mut min = Vec::with_capacity(prefix.len() + 1);
    min.push(b'[');
    min.extend_from_slice(prefix.as_bytes());

    let mut max = min.clone();
    max.push(0xFF);
    (min, max)
}

#[async_trait]
impl StoreBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn hash_get(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.hget(key, field).await?;
        Ok(value)
    }

    async fn hash_exists(&self, key: &str, field: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.hexists(key, field).await?;
        Ok(exists)
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.hset(key, field, value).await?;
        Ok(())
    }

    async fn hash_scan(
        &self,
        key: &str,
        cursor: u64,
        count: usize,
    ) -> StoreResult<(u64, Vec<(String, String)>)> {
        let mut conn = self.conn.clone();
        let (next, flat): (String, Vec<String>) = redis::cmd("HSCAN")
            .arg(key)
            .arg(cursor)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;

        let next = next.parse().map_err(|_| {
            redis::RedisError::from((
                redis::ErrorKind::TypeError,
                "HSCAN returned a non-numeric cursor",
                next.clone(),
            ))
        })?;

        let mut pairs = Vec::with_capacity(flat.len() / 2);
        let mut it = flat.into_iter();
        while let (Some(field), Some(value)) = (it.next(), it.next()) {
            pairs.push((field, value));
        }
        debug!(key, cursor, next, entries = pairs.len(), "HSCAN batch");
        Ok((next, pairs))
    }

    async fn insert_indexed(&self, insert: &IndexedInsert<'_>) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let (inserted,): (bool,) = redis::pipe()
            .atomic()
            .hset_nx(insert.map, insert.field, insert.value)
            .zadd(insert.vin_index, insert.vin_member, 0)
            .ignore()
            .zadd(insert.reg_nr_index, insert.reg_nr_member, 0)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(inserted)
    }

    async fn sorted_add(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.zadd(key, member, 0).await?;
        Ok(())
    }

    async fn sorted_range_by_prefix(&self, key: &str, prefix: &str) -> StoreResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let (min, max) = prefix_bounds(prefix);
        let members: Vec<String> = redis::cmd("ZRANGEBYLEX")
            .arg(key)
            .arg(min)
            .arg(max)
            .query_async(&mut conn)
            .await?;
        Ok(members)
    }

    async fn sorted_remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.zrem(key, member).await?;
        Ok(removed > 0)
    }

    async fn sorted_count(&self, key: &str) -> StoreResult<u64> {
        let mut conn = self.conn.clone();
        let count: u64 = conn.zcard(key).await?;
        Ok(count)
    }

    async fn sorted_last(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let last: Vec<String> = conn.zrange(key, -1, -1).await?;
        Ok(last.into_iter().next())
    }

    async fn list_push_front(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.lpush(key, value).await?;
        Ok(())
    }

    async fn list_range(&self, key: &str, limit: usize) -> StoreResult<Vec<String>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let stop = isize::try_from(limit).unwrap_or(isize::MAX) - 1;
        let values: Vec<String> = conn.lrange(key, 0, stop).await?;
        Ok(values)
    }

    async fn string_get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn string_set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn delete(&self, keys: &[&str]) -> StoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(keys).await?;
        debug!(removed, "Deleted keys");
        Ok(())
    }
}
