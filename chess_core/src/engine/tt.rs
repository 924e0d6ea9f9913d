use crate::engine::Score;
use log::trace;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TTFlag {
    Exact,
    LowerBound, // Beta cutoff (fail-high)
    UpperBound, // Alpha cutoff (fail-low)
}

impl TTFlag {
    // Classifies a fail-soft result searched with the window `(alpha, beta)`.
    pub const fn from_window(score: Score, alpha: Score, beta: Score) -> Self {
        if score <= alpha {
            Self::UpperBound
        } else if score >= beta {
            Self::LowerBound
        } else {
            Self::Exact
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TTEntry {
    pub score: Score,
    pub depth: u8,
    pub flag: TTFlag,
}

impl TTEntry {
    // Whether the stored score can stand in for a search with window `(alpha, beta)`.
    pub const fn usable(&self, alpha: Score, beta: Score) -> bool {
        match self.flag {
            TTFlag::Exact => true,
            TTFlag::LowerBound => self.score >= beta,
            TTFlag::UpperBound => self.score <= alpha,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stores: u64,
    pub evictions: u64,
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    entry: TTEntry,
    last_used: u64,
}

// Canonical position key -> searched score. Owned by one engine; when a capacity is
// set, the least recently used quarter is dropped each time the table fills up.
pub struct TranspositionCache {
    entries: HashMap<String, Slot>,
    capacity: Option<usize>,
    clock: u64,
    stats: CacheStats,
}

impl Default for TranspositionCache {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl TranspositionCache {
    pub fn unbounded() -> Self {
        Self {
            entries: HashMap::new(),
            capacity: None,
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: HashMap::with_capacity(capacity.min(1 << 16)),
            capacity: Some(capacity),
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    // `0` means no bound.
    pub fn from_capacity_setting(capacity: usize) -> Self {
        if capacity == 0 {
            Self::unbounded()
        } else {
            Self::with_capacity(capacity)
        }
    }

    // Returns the entry for `key` if it was searched at least `min_depth` deep.
    pub fn lookup(&mut self, key: &str, min_depth: u8) -> Option<TTEntry> {
        self.clock += 1;
        match self.entries.get_mut(key) {
            Some(slot) if slot.entry.depth >= min_depth => {
                slot.last_used = self.clock;
                self.stats.hits += 1;
                Some(slot.entry)
            }
            _ => {
                self.stats.misses += 1;
                None
            }
        }
    }

    // Inserts or overwrites; the latest write wins even if it is shallower.
    pub fn store(&mut self, key: String, score: Score, depth: u8, flag: TTFlag) {
        self.clock += 1;
        self.stats.stores += 1;
        if let Some(capacity) = self.capacity {
            if self.entries.len() >= capacity && !self.entries.contains_key(&key) {
                self.evict(capacity);
            }
        }
        self.entries.insert(
            key,
            Slot {
                entry: TTEntry { score, depth, flag },
                last_used: self.clock,
            },
        );
    }

    fn evict(&mut self, capacity: usize) {
        let target = (capacity / 4).max(1);
        let mut stamps: Vec<u64> = self.entries.values().map(|s| s.last_used).collect();
        if stamps.len() < target {
            return;
        }
        let cutoff = *stamps.select_nth_unstable(target - 1).1;
        let before = self.entries.len();
        self.entries.retain(|_, slot| slot.last_used > cutoff);
        let evicted = before - self.entries.len();
        self.stats.evictions += evicted as u64;
        trace!("tt evicted {evicted} entries, {} remain", self.entries.len());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.clock = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub const fn stats(&self) -> CacheStats {
        self.stats
    }
}
