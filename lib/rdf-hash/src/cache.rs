//! Capacity-bounded object cache (spec §4.F): a variant of `Hash` with
//! hit-count tracking and histogram-based eviction, used above the intern
//! tables and the hashes storage backend to bound unbounded growth.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheFlags {
    /// Reserved for future eviction-policy variants; no flag bits are
    /// defined by the spec beyond the default behavior.
    pub bits: u32,
}

struct Entry {
    value: Vec<u8>,
    hits: u64,
    /// Monotonically increasing insertion sequence, used to break eviction
    /// ties in favor of evicting the older entry first (spec §4.F).
    inserted_at: u64,
}

/// A capacity-bounded multimap-like cache keyed by opaque bytes.
///
/// `capacity = 0` means unbounded (no eviction ever runs). For a bounded
/// cache, inserting into a full cache runs one eviction cycle: compute a
/// histogram of hit counts, evict the `capacity * flush_percent / 100`
/// entries with the lowest hit counts (oldest-inserted first on ties), then
/// subtract the largest evicted hit count from every survivor so recently
/// promoted entries can catch back up.
pub struct ObjectCache {
    capacity: usize,
    flush_percent: u32,
    entries: FxHashMap<Box<[u8]>, Entry>,
    next_seq: u64,
}

impl ObjectCache {
    #[must_use]
    pub fn new(capacity: usize, flush_percent: u32, _flags: CacheFlags) -> Self {
        let flush_percent = if flush_percent == 0 || flush_percent > 100 {
            20
        } else {
            flush_percent
        };
        Self {
            capacity,
            flush_percent,
            entries: FxHashMap::default(),
            next_seq: 0,
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    fn flush_count(&self) -> usize {
        (self.capacity * self.flush_percent as usize) / 100
    }

    fn evict_if_full(&mut self) {
        if self.capacity == 0 || self.entries.len() < self.capacity {
            return;
        }
        let flush_count = self.flush_count().max(1).min(self.entries.len());
        let mut by_hits: Vec<(Box<[u8]>, u64, u64)> = self
            .entries
            .iter()
            .map(|(k, e)| (k.clone(), e.hits, e.inserted_at))
            .collect();
        // Lowest hit count first; oldest insertion first among ties.
        by_hits.sort_by(|a, b| a.1.cmp(&b.1).then(a.2.cmp(&b.2)));
        let evicted = &by_hits[..flush_count];
        let largest_evicted_hits = evicted.iter().map(|(_, hits, _)| *hits).max().unwrap_or(0);
        for (key, _, _) in evicted {
            self.entries.remove(key);
        }
        for entry in self.entries.values_mut() {
            entry.hits = entry.hits.saturating_sub(largest_evicted_hits);
        }
    }

    /// Unconditional insert (overwrites an existing entry's value, keeps its
    /// hit count).
    pub fn set(&mut self, key: &[u8], value: &[u8]) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.value = value.to_vec();
            return;
        }
        self.evict_if_full();
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(
            key.into(),
            Entry {
                value: value.to_vec(),
                hits: 0,
                inserted_at: seq,
            },
        );
    }

    /// Insert-if-absent: a no-op (does not refresh the value) if `key`
    /// already has an entry.
    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        if self.entries.contains_key(key) {
            return;
        }
        self.set(key, value);
    }

    /// Looks up `key`, incrementing its hit counter on a hit.
    pub fn get(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let entry = self.entries.get_mut(key)?;
        entry.hits += 1;
        Some(entry.value.clone())
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_cache_never_evicts() {
        let mut cache = ObjectCache::new(0, 50, CacheFlags::default());
        for i in 0..1000u32 {
            cache.set(&i.to_le_bytes(), b"v");
        }
        assert_eq!(cache.size(), 1000);
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let mut cache = ObjectCache::new(5, 70, CacheFlags::default());
        for key in [b"a", b"b", b"c", b"d", b"e"] {
            cache.set(key, b"v");
        }
        assert_eq!(cache.size(), 5);
        cache.set(b"f", b"v");
        assert!(cache.size() <= 5);
    }

    #[test]
    fn eviction_scenario_s4() {
        // spec §8 S4: capacity 5, flush_percent 70; insert a..e; read a x4,
        // b x2; insert f. The eviction cycle (triggered by a..e filling the
        // cache) keeps only the highest-hit survivors (a, b) and drops the
        // untouched c, d, e; f is then inserted fresh.
        let mut cache = ObjectCache::new(5, 70, CacheFlags::default());
        for key in [b"a", b"b", b"c", b"d", b"e"] {
            cache.set(key, b"v");
        }
        for _ in 0..4 {
            cache.get(b"a");
        }
        for _ in 0..2 {
            cache.get(b"b");
        }
        cache.set(b"f", b"v");
        assert!(cache.size() <= 3);
        assert!(cache.contains(b"a"));
        assert!(cache.contains(b"b"));
        assert!(cache.contains(b"f"));
        assert!(!cache.contains(b"c"));
        assert!(!cache.contains(b"d"));
        assert!(!cache.contains(b"e"));
    }

    #[test]
    fn out_of_range_flush_percent_defaults_to_20() {
        let cache = ObjectCache::new(10, 0, CacheFlags::default());
        assert_eq!(cache.flush_percent, 20);
        let cache = ObjectCache::new(10, 150, CacheFlags::default());
        assert_eq!(cache.flush_percent, 20);
    }
}
