use std::collections::HashMap;

use lru::LruCache;
use mux_cells::Cell;

/// Read-through LRU cache of scrollback lines, keyed by absolute
/// scrollback offset (`0` = oldest). Lifetime is independent of the
/// emulator: entries are plain copies, and the cache is wiped wholesale
/// on resize or scrollback-limit rollover rather than tracking individual
/// staleness (spec §4.2).
///
/// Built on an unbounded `lru::LruCache` so the recency ordering is the
/// crate's, but grows up to `capacity` entries before batch-trimming down
/// to `trim_target` rather than evicting one-for-one on every insert — a
/// scrollback cache is refilled in bursts by the prefetch engine (§4.6),
/// so amortizing the trim over a whole prefetch reply avoids repeated
/// small evictions mid-batch.
pub struct ScrollbackCache {
    capacity: usize,
    trim_target: usize,
    inner: LruCache<usize, Vec<Cell>>,
}

impl ScrollbackCache {
    pub fn new(capacity: usize, trim_target: usize) -> Self {
        ScrollbackCache {
            capacity,
            trim_target,
            inner: LruCache::unbounded(),
        }
    }

    pub fn get(&mut self, offset: usize) -> Option<&[Cell]> {
        self.inner.get(&offset).map(|v| v.as_slice())
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.inner.contains(&offset)
    }

    pub fn insert(&mut self, offset: usize, row: Vec<Cell>) {
        self.inner.put(offset, row);
        if self.inner.len() > self.capacity {
            self.trim();
        }
    }

    fn trim(&mut self) {
        while self.inner.len() > self.trim_target {
            if self.inner.pop_lru().is_none() {
                break;
            }
        }
    }

    /// Wipes every entry. Called on resize and on scrollback-limit
    /// rollover — no cached offset may survive either event (invariant
    /// 4 in spec §8).
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Captures rows the instant they roll off the live viewport into
/// scrollback, so consumers can render them before the prefetch engine
/// has a chance to backfill the main `ScrollbackCache` (spec §3
/// Lifecycles). Keyed the same way, cleared on rollover or a negative
/// delta.
#[derive(Default)]
pub struct TransitionCache {
    entries: HashMap<usize, Vec<Cell>>,
}

impl TransitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `rows[i]` is the row that just left the viewport, destined for
    /// absolute scrollback offset `old_scrollback_length + i`.
    pub fn capture(&mut self, old_scrollback_length: usize, rows: &[Vec<Cell>]) {
        for (i, row) in rows.iter().enumerate() {
            self.entries.insert(old_scrollback_length + i, row.clone());
        }
    }

    pub fn get(&self, offset: usize) -> Option<&[Cell]> {
        self.entries.get(&offset).map(|v| v.as_slice())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
