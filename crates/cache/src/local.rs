//! In-process upload cache backed by DashMap for lock-free concurrent access.
//! Lets the API skip re-parsing a file it has seen recently; analysis always
//! recomputes from the rows.

use cac_core::ParsedTable;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry {
    table: Arc<ParsedTable>,
    inserted_at: Instant,
}

/// Parsed uploads keyed by file name and size, expiring after a fixed TTL.
pub struct UploadCache {
    store: Arc<DashMap<String, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
}

impl UploadCache {
    pub fn new(ttl_secs: u64, max_entries: usize) -> Self {
        Self {
            store: Arc::new(DashMap::with_capacity(max_entries)),
            ttl: Duration::from_secs(ttl_secs),
            max_entries,
        }
    }

    pub fn key(filename: &str, size: usize) -> String {
        format!("{filename}:{size}")
    }

    /// Get a parsed upload, returns None if expired or missing.
    pub fn get(&self, filename: &str, size: usize) -> Option<Arc<ParsedTable>> {
        let key = Self::key(filename, size);
        let entry = self.store.get(&key)?;
        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.store.remove(&key);
            debug!(key = %key, "Upload cache entry expired");
            return None;
        }
        Some(entry.table.clone())
    }

    /// Insert or refresh a parsed upload.
    pub fn put(&self, filename: &str, size: usize, table: Arc<ParsedTable>) {
        let key = Self::key(filename, size);
        // At capacity: skip new keys, the periodic sweep frees space.
        if self.store.len() >= self.max_entries && !self.store.contains_key(&key) {
            debug!(key = %key, "Upload cache full, skipping insert");
            return;
        }
        self.store.insert(
            key,
            CacheEntry {
                table,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Remove expired entries. Call this periodically from a background task.
    pub fn evict_expired(&self) -> usize {
        let before = self.store.len();
        self.store
            .retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
        before - self.store.len()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
