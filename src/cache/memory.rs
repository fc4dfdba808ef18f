//! In-memory tag cache.
//!
//! Backed by a `DashMap`, which gives shard-level reader/writer exclusion:
//! concurrent readers proceed in parallel, inserts lock only the affected
//! shard. Unbounded; entries are replaced in place when a file's mtime
//! changes.

use std::time::SystemTime;

use dashmap::DashMap;

use super::TagCache;
use crate::types::Tag;

#[derive(Debug, Clone)]
struct CacheEntry {
    mtime: SystemTime,
    tags: Vec<Tag>,
}

/// Unbounded in-memory cache of extracted tags.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TagCache for MemoryCache {
    fn get(&self, fname: &str, mtime: SystemTime) -> Option<Vec<Tag>> {
        let entry = self.entries.get(fname)?;
        if entry.mtime == mtime {
            Some(entry.tags.clone())
        } else {
            None
        }
    }

    fn set(&self, fname: &str, mtime: SystemTime, tags: Vec<Tag>) {
        self.entries
            .insert(fname.to_string(), CacheEntry { mtime, tags });
    }
}
