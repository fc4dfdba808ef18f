//! Tag caching keyed by (path, modification time).
//!
//! A cache hit with a matching mtime skips parsing entirely. The interface
//! is pluggable so a persistent backend can be swapped in; the bundled
//! implementations are in-memory ([`MemoryCache`]) and disabled
//! ([`NoopCache`]).

mod memory;

pub use memory::MemoryCache;

use std::time::SystemTime;

use crate::types::Tag;

/// Memoizes extracted tag lists per absolute path.
///
/// Implementations must allow concurrent readers; writers take exclusive
/// access for the inserted entry. An entry is valid only while the stored
/// modification time equals the observed one.
pub trait TagCache: Send + Sync {
    /// Cached tags for `fname`, or `None` on miss or stale mtime.
    fn get(&self, fname: &str, mtime: SystemTime) -> Option<Vec<Tag>>;

    /// Store tags for `fname`, replacing any previous entry.
    fn set(&self, fname: &str, mtime: SystemTime, tags: Vec<Tag>);
}

/// Cache that never hits; every lookup re-extracts.
#[derive(Debug, Default)]
pub struct NoopCache;

impl TagCache for NoopCache {
    fn get(&self, _fname: &str, _mtime: SystemTime) -> Option<Vec<Tag>> {
        None
    }

    fn set(&self, _fname: &str, _mtime: SystemTime, _tags: Vec<Tag>) {}
}
