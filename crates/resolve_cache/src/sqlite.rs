//! A single-table SQLite cache (spec.md §5, "SQLite-style cache").

use std::path::Path;
use std::sync::Mutex;

use resolve_core::cache::{CacheKey, CachePolicy};
use resolve_core::resolver::ResolverOutput;
use rusqlite::{params, Connection};

use crate::error::CacheResult;

/// A cache backed by a single SQLite table, `resolver_cache(key, value,
/// hit_count)`. `value` holds the JSON encoding of the cached
/// `Vec<ResolverOutput>`; `hit_count` is incremented on every [`Self::get`]
/// call that finds a row, and is exposed via [`Self::hit_count`] purely for
/// test observability.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Opens (creating if absent) a cache database at `path`.
    pub fn open(path: impl AsRef<Path>) -> CacheResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS resolver_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                hit_count INTEGER NOT NULL DEFAULT 0
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// An in-memory cache, for tests and short-lived processes that don't
    /// need the cache to outlive them.
    pub fn open_in_memory() -> CacheResult<Self> {
        Self::open(":memory:")
    }

    /// The number of times [`Self::get`] has returned a hit for `key`.
    /// Returns `0` for a key never seen.
    pub fn hit_count(&self, key: &CacheKey) -> CacheResult<u64> {
        let conn = self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let count: Option<i64> = conn
            .query_row(
                "SELECT hit_count FROM resolver_cache WHERE key = ?1",
                params![key.0],
                |row| row.get(0),
            )
            .ok();
        Ok(count.unwrap_or(0).max(0).unsigned_abs())
    }

    fn try_get(&self, key: &CacheKey) -> CacheResult<Option<Vec<ResolverOutput>>> {
        let conn = self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM resolver_cache WHERE key = ?1",
                params![key.0],
                |row| row.get(0),
            )
            .ok();

        let Some(value) = value else {
            return Ok(None);
        };

        conn.execute(
            "UPDATE resolver_cache SET hit_count = hit_count + 1 WHERE key = ?1",
            params![key.0],
        )?;

        let outputs: Vec<ResolverOutput> = serde_json::from_str(&value)?;
        Ok(Some(outputs))
    }

    fn try_put(&self, key: &CacheKey, outputs: &[ResolverOutput]) -> CacheResult<()> {
        let value = serde_json::to_string(outputs)?;
        let conn = self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        conn.execute(
            "INSERT INTO resolver_cache (key, value, hit_count) VALUES (?1, ?2, 0)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key.0, value],
        )?;
        Ok(())
    }
}

impl CachePolicy for SqliteCache {
    fn get(&self, key: &CacheKey) -> Option<Vec<ResolverOutput>> {
        match self.try_get(key) {
            Ok(outputs) => outputs,
            Err(e) => {
                tracing::warn!(error = %e, %key, "sqlite cache read failed, treating as a miss");
                None
            }
        }
    }

    fn put(&self, key: &CacheKey, outputs: &[ResolverOutput]) {
        if let Err(e) = self.try_put(key, outputs) {
            tracing::warn!(error = %e, %key, "sqlite cache write failed, dropping");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resolve_core::types::{FactId, FactValueData};

    fn sample_outputs() -> Vec<ResolverOutput> {
        vec![ResolverOutput::new(FactId::from("f"), FactValueData::from("v")).with_source("r")]
    }

    #[test]
    fn miss_then_hit_increments_hit_count() {
        let cache = SqliteCache::open_in_memory().unwrap();
        let key = CacheKey("r|a=1".to_owned());

        assert!(cache.get(&key).is_none());
        cache.put(&key, &sample_outputs());

        assert_eq!(cache.get(&key), Some(sample_outputs()));
        assert_eq!(cache.hit_count(&key).unwrap(), 1);

        assert_eq!(cache.get(&key), Some(sample_outputs()));
        assert_eq!(cache.hit_count(&key).unwrap(), 2);
    }

    #[test]
    fn different_keys_do_not_collide() {
        let cache = SqliteCache::open_in_memory().unwrap();
        let key_a = CacheKey("r|a=1".to_owned());
        let key_b = CacheKey("r|a=2".to_owned());

        cache.put(&key_a, &sample_outputs());

        assert!(cache.get(&key_b).is_none());
        assert!(cache.get(&key_a).is_some());
    }
}
