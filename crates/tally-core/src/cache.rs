// ── Time-based response cache ──
//
// Key → value store with per-entry expiry. Expired entries are evicted
// lazily, on read. There is no background sweep.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::model::{GroupingSelection, SortOrder};

/// Default entry lifetime: five minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    created_at: Instant,
}

/// Generic cache with a fixed time-to-live per entry.
///
/// Uses `tokio::time::Instant`, so a paused test clock drives expiry.
#[derive(Debug)]
pub struct TimeBasedCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    ttl: Duration,
}

impl<T: Clone> TimeBasedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store `value` stamped with the current time, replacing any prior entry.
    pub fn set(&mut self, key: impl Into<String>, value: T) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                value,
                created_at: Instant::now(),
            },
        );
    }

    /// Return the value while `now - created_at <= ttl`.
    ///
    /// An entry observed past its lifetime is removed.
    pub fn get(&mut self, key: &str) -> Option<T> {
        let entry = self.entries.get(key)?;
        if entry.created_at.elapsed() > self.ttl {
            self.entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    /// Same as `get(key).is_some()`, including the eviction side effect.
    pub fn has(&mut self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Entry count, stale-but-unread entries included.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        self.entries.remove(key).map(|e| e.value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> Default for TimeBasedCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

// ── Key generation ──────────────────────────────────────────────────

/// Composite key for one page of one grouping at one page size.
///
/// `<grouping>_page_<index>_size_<size>`, with `_sort_<column>,<dir>`
/// appended only when a sort is active.
pub fn page_key(
    grouping: &GroupingSelection,
    page_index: usize,
    page_size: usize,
    sort: Option<&SortOrder>,
) -> String {
    let base = format!("{}_page_{page_index}_size_{page_size}", grouping.cache_key());
    match sort {
        Some(sort) => format!("{base}_sort_{sort}"),
        None => base,
    }
}
