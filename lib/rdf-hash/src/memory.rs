//! In-process `Hash` implementation: a chained hash table sized by a load
//! factor (spec §4.E "Memory variant", default 750/1000).

use crate::cursor::{Cursor, Pair};
use crate::hash::{Hash, OpenOptions};
use rdf_model::Result;
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

const DEFAULT_BUCKETS: usize = 16;
const DEFAULT_LOAD_FACTOR_MILLI: u32 = 750;

type Chain = Vec<(Box<[u8]>, Vec<Box<[u8]>>)>;

/// A chained hash table: each bucket holds the chain of `(key, values)`
/// entries whose key hashes to that bucket. Entries within a key's `values`
/// vec keep insertion order, so a cursor walk of one key is stable across
/// calls as long as nothing mutates between them (§4.E).
pub struct MemoryHash {
    buckets: Vec<Chain>,
    pair_count: usize,
    load_factor_milli: u32,
    seed0: u64,
    seed1: u64,
}

impl MemoryHash {
    #[must_use]
    pub fn new() -> Self {
        Self::with_load_factor(DEFAULT_LOAD_FACTOR_MILLI)
    }

    #[must_use]
    pub fn with_load_factor(load_factor_milli: u32) -> Self {
        Self {
            buckets: (0..DEFAULT_BUCKETS).map(|_| Vec::new()).collect(),
            pair_count: 0,
            load_factor_milli,
            seed0: 0x5bd1_e995_27a1_75b3,
            seed1: 0x2554_f9c8_1ce1_d9f1,
        }
    }

    fn bucket_index(&self, key: &[u8]) -> usize {
        let mut hasher = SipHasher13::new_with_keys(self.seed0, self.seed1);
        hasher.write(key);
        (hasher.finish() as usize) % self.buckets.len()
    }

    fn maybe_grow(&mut self) {
        let threshold = (self.buckets.len() as u64 * u64::from(self.load_factor_milli)) / 1000;
        if (self.pair_count as u64) <= threshold {
            return;
        }
        let old_buckets = std::mem::replace(
            &mut self.buckets,
            (0..self.buckets.len() * 2).map(|_| Vec::new()).collect(),
        );
        for chain in old_buckets {
            for (key, values) in chain {
                let idx = self.bucket_index(&key);
                self.buckets[idx].push((key, values));
            }
        }
    }

    fn find_chain_entry(&self, key: &[u8]) -> Option<&(Box<[u8]>, Vec<Box<[u8]>>)> {
        let idx = self.bucket_index(key);
        self.buckets[idx].iter().find(|(k, _)| k.as_ref() == key)
    }

    fn find_chain_entry_mut(&mut self, key: &[u8]) -> Option<&mut (Box<[u8]>, Vec<Box<[u8]>>)> {
        let idx = self.bucket_index(key);
        self.buckets[idx].iter_mut().find(|(k, _)| k.as_ref() == key)
    }

    /// Flattened snapshot of every `(key, value)` pair, grouped by key, used
    /// to build a [`MemoryCursor`]. Taken eagerly so the cursor is immune to
    /// concurrent mutation of `self` (§4.E design note: backends may hand
    /// back owned bytes; this one always does).
    fn snapshot(&self) -> Vec<(Box<[u8]>, Vec<Box<[u8]>>)> {
        self.buckets
            .iter()
            .flat_map(|chain| chain.iter().cloned())
            .collect()
    }
}

impl Default for MemoryHash {
    fn default() -> Self {
        Self::new()
    }
}

impl Hash for MemoryHash {
    fn open(&mut self, _identifier: &str, options: &OpenOptions) -> Result<()> {
        if options.create_new {
            *self = Self::with_load_factor(self.load_factor_milli);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn values_count(&self, key: &[u8]) -> Result<usize> {
        Ok(self.find_chain_entry(key).map_or(0, |(_, v)| v.len()))
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some((_, values)) = self.find_chain_entry_mut(key) {
            if !values.iter().any(|v| v.as_ref() == value) {
                values.push(value.into());
                self.pair_count += 1;
            }
            return Ok(());
        }
        let idx = self.bucket_index(key);
        self.buckets[idx].push((key.into(), vec![value.into()]));
        self.pair_count += 1;
        self.maybe_grow();
        Ok(())
    }

    fn get_one(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self
            .find_chain_entry(key)
            .and_then(|(_, v)| v.first())
            .map(|v| v.to_vec()))
    }

    fn get_all(&self, key: &[u8]) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .find_chain_entry(key)
            .map(|(_, v)| v.iter().map(|b| b.to_vec()).collect())
            .unwrap_or_default())
    }

    fn keys(&self) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .buckets
            .iter()
            .flat_map(|chain| chain.iter().map(|(k, _)| k.to_vec()))
            .collect())
    }

    fn contains(&self, key: &[u8], value: Option<&[u8]>) -> Result<bool> {
        let Some((_, values)) = self.find_chain_entry(key) else {
            return Ok(false);
        };
        Ok(match value {
            Some(v) => values.iter().any(|x| x.as_ref() == v),
            None => !values.is_empty(),
        })
    }

    fn delete_key(&mut self, key: &[u8]) -> Result<()> {
        let idx = self.bucket_index(key);
        if let Some(pos) = self.buckets[idx].iter().position(|(k, _)| k.as_ref() == key) {
            let (_, values) = self.buckets[idx].remove(pos);
            self.pair_count -= values.len();
        }
        Ok(())
    }

    fn delete_key_value(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some((_, values)) = self.find_chain_entry_mut(key) {
            if let Some(pos) = values.iter().position(|v| v.as_ref() == value) {
                values.remove(pos);
                self.pair_count -= 1;
            }
            if values.is_empty() {
                self.delete_key(key)?;
            }
        }
        Ok(())
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Pair>> {
        let mut out = Vec::new();
        for chain in &self.buckets {
            for (key, values) in chain {
                if key.starts_with(prefix) {
                    for value in values {
                        out.push((key.to_vec(), value.to_vec()));
                    }
                }
            }
        }
        Ok(out)
    }

    fn cursor(&self) -> Box<dyn Cursor + '_> {
        Box::new(MemoryCursor {
            entries: self.snapshot(),
            outer: None,
            inner: 0,
        })
    }
}

/// A cursor over a [`MemoryHash`] snapshot taken at construction time.
struct MemoryCursor {
    entries: Vec<(Box<[u8]>, Vec<Box<[u8]>>)>,
    outer: Option<usize>,
    inner: usize,
}

impl MemoryCursor {
    fn pair_at(&self, outer: usize, inner: usize) -> Option<Pair> {
        let (key, values) = self.entries.get(outer)?;
        let value = values.get(inner)?;
        Some((key.to_vec(), value.to_vec()))
    }
}

impl Cursor for MemoryCursor {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Option<Pair> {
        for (outer, (k, values)) in self.entries.iter().enumerate() {
            if k.as_ref() != key {
                continue;
            }
            if let Some(inner) = values.iter().position(|v| v.as_ref() == value) {
                self.outer = Some(outer);
                self.inner = inner;
                return self.pair_at(outer, inner);
            }
            return None;
        }
        None
    }

    fn set_key(&mut self, key: &[u8]) -> Option<Pair> {
        let outer = self.entries.iter().position(|(k, _)| k.as_ref() == key)?;
        if self.entries[outer].1.is_empty() {
            return None;
        }
        self.outer = Some(outer);
        self.inner = 0;
        self.pair_at(outer, 0)
    }

    fn first_key(&mut self) -> Option<Pair> {
        for (outer, (_, values)) in self.entries.iter().enumerate() {
            if !values.is_empty() {
                self.outer = Some(outer);
                self.inner = 0;
                return self.pair_at(outer, 0);
            }
        }
        self.outer = None;
        None
    }

    fn next_key(&mut self) -> Option<Pair> {
        let start = self.outer.map_or(0, |o| o + 1);
        for outer in start..self.entries.len() {
            if !self.entries[outer].1.is_empty() {
                self.outer = Some(outer);
                self.inner = 0;
                return self.pair_at(outer, 0);
            }
        }
        self.outer = None;
        None
    }

    fn next_value(&mut self) -> Option<Pair> {
        let outer = self.outer?;
        let next_inner = self.inner + 1;
        let pair = self.pair_at(outer, next_inner)?;
        self.inner = next_inner;
        Some(pair)
    }

    fn current(&self) -> Option<Pair> {
        self.pair_at(self.outer?, self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_is_idempotent() {
        let mut h = MemoryHash::new();
        h.put(b"k", b"v").unwrap();
        h.put(b"k", b"v").unwrap();
        assert_eq!(h.values_count(b"k").unwrap(), 1);
    }

    #[test]
    fn delete_key_value_then_key_removes_empty_chain() {
        let mut h = MemoryHash::new();
        h.put(b"k", b"v1").unwrap();
        h.put(b"k", b"v2").unwrap();
        h.delete_key_value(b"k", b"v1").unwrap();
        assert_eq!(h.get_all(b"k").unwrap(), vec![b"v2".to_vec()]);
        h.delete_key_value(b"k", b"v2").unwrap();
        assert!(h.get_all(b"k").unwrap().is_empty());
        assert!(!h.contains(b"k", None).unwrap());
    }

    #[test]
    fn cursor_walks_key_then_next_key() {
        let mut h = MemoryHash::new();
        h.put(b"a", b"1").unwrap();
        h.put(b"a", b"2").unwrap();
        h.put(b"b", b"3").unwrap();
        let mut cursor = h.cursor();
        let first = cursor.first_key().unwrap();
        let mut seen = vec![first];
        while let Some(p) = cursor.next_value() {
            seen.push(p);
        }
        while let Some(p) = cursor.next_key() {
            seen.push(p);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn grows_past_load_factor() {
        let mut h = MemoryHash::with_load_factor(750);
        for i in 0..1000u32 {
            h.put(&i.to_le_bytes(), b"v").unwrap();
        }
        assert!(h.buckets.len() > DEFAULT_BUCKETS);
        assert_eq!(h.pair_count, 1000);
    }

    #[test]
    fn scan_prefix_finds_matching_keys() {
        let mut h = MemoryHash::new();
        h.put(b"spo-a", b"1").unwrap();
        h.put(b"spo-b", b"2").unwrap();
        h.put(b"other", b"3").unwrap();
        let mut matches = h.scan_prefix(b"spo-").unwrap();
        matches.sort();
        assert_eq!(matches.len(), 2);
    }
}
