//! Bounded in-memory thumbnail cache.
//!
//! Rendering a thumbnail means a full decode plus a Lanczos3 resize, by far
//! the most expensive step of a scan. This module lets the scanner skip it
//! for files already seen in the session, while bounding how many encoded
//! thumbnails stay resident.
//!
//! # Design
//!
//! ## Cache keys
//!
//! The cache is **metadata-addressed**: a [`CacheKey`] is the file name, byte
//! size and last-modified timestamp. Hashing the content would require
//! reading every file before knowing whether it is cached, which defeats the
//! point. The key is collision-safe enough for one session; it is not
//! cryptographic.
//!
//! ## Eviction
//!
//! Entries are ordered by last access. [`ThumbnailCache::get`] promotes the
//! entry to most-recently-used; [`ThumbnailCache::put`] of a new key evicts
//! least-recently-used entries until there is room. The capacity is fixed at
//! construction.

use crate::types::Thumbnail;
use lru::LruCache;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Composite lookup key: name + byte size + last-modified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_file(name: &str, size: u64, last_modified: i64) -> Self {
        Self(format!("{name}_{size}_{last_modified}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// LRU cache of encoded thumbnails.
#[derive(Debug)]
pub struct ThumbnailCache {
    entries: LruCache<CacheKey, Arc<Thumbnail>>,
}

impl ThumbnailCache {
    /// Create an empty cache. A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains(key)
    }

    /// Look up a thumbnail, promoting it to most-recently-used on a hit.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<Thumbnail>> {
        self.entries.get(key).cloned()
    }

    /// Insert a thumbnail.
    ///
    /// Replacing an existing key promotes it without evicting anything.
    /// A new key at capacity evicts the least-recently-used entry.
    pub fn put(&mut self, key: CacheKey, thumbnail: Arc<Thumbnail>) {
        if self.entries.contains(&key) {
            self.entries.put(key, thumbnail);
            return;
        }
        if let Some((evicted, _)) = self.entries.push(key, thumbnail) {
            tracing::trace!(key = evicted.as_str(), "evicting thumbnail");
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Summary of cache performance for one scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} rendered ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} rendered", self.misses)
        }
    }
}
