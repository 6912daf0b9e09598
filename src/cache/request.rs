//! Exact-match request cache.
//!
//! Keys are [`CacheKey`] digests over chunk content, criterion and model, so a
//! hit is only possible for a byte-identical request.

use moka::sync::Cache;

use crate::hashing::CacheKey;
use crate::scoring::ScoreResult;
use crate::transcript::Chunk;

/// In-memory map from request fingerprint to its successful result.
///
/// Cloning is cheap and clones share the same entries.
#[derive(Clone)]
pub struct RequestCache {
    entries: Cache<CacheKey, ScoreResult>,
}

impl RequestCache {
    /// Creates an unbounded cache. Entries live for the life of the process.
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
        }
    }

    /// Creates a cache that evicts once `capacity` entries are held.
    #[inline]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Looks up the stored result for a request.
    #[inline]
    pub fn lookup(&self, chunk: &Chunk, criterion: &str, model: &str) -> Option<ScoreResult> {
        self.get(&CacheKey::derive(chunk, criterion, model))
    }

    /// Looks up by a precomputed key.
    #[inline]
    pub fn get(&self, key: &CacheKey) -> Option<ScoreResult> {
        self.entries.get(key)
    }

    /// Stores `result` under `key`. Failed results are never stored.
    ///
    /// Returns `true` when the result was stored.
    pub fn store(&self, key: CacheKey, result: &ScoreResult) -> bool {
        if result.failed {
            return false;
        }
        self.entries.insert(key, result.clone());
        true
    }

    #[inline]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn remove(&self, key: &CacheKey) -> Option<ScoreResult> {
        self.entries.remove(key)
    }

    /// Returns the number of cached entries.
    ///
    /// moka updates its counters lazily; call [`Self::run_pending_tasks`]
    /// first for an exact figure.
    #[inline]
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    #[inline]
    pub fn clear(&self) {
        self.entries.invalidate_all();
    }

    #[inline]
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}
