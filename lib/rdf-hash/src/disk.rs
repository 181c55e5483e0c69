//! Persistent `Hash` implementation backed by RocksDB (spec §4.E "Disk
//! variant"), built on the published `rocksdb` crate rather than a vendored
//! `-sys` binding (see `DESIGN.md` for why this departs from the teacher's
//! own `oxrocksdb-sys`).
//!
//! Each `(key, value)` pair is stored as a single row whose row-key is
//! `len_be32(key) ‖ key ‖ value` and whose row-value is empty; RocksDB's
//! byte-lexicographic ordering then gives every key's values back in sorted
//! order, and the length prefix stops one key being mistaken for a prefix
//! of another when scanning (spec §4.E: "same semantics" as the memory
//! variant, B-tree-ish ordered organization).

use crate::cursor::{Cursor, Pair};
use crate::hash::{Hash, OpenOptions};
use rdf_model::{Error, Result};
use rocksdb::{DBRawIterator, IteratorMode, Options, DB};
use std::path::PathBuf;

fn row_key(key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + key.len());
    out.extend_from_slice(&(key.len() as u32).to_be_bytes());
    out.extend_from_slice(key);
    out
}

/// Splits a stored row key back into its logical `(key, value)`.
fn decode_row(row_key: &[u8]) -> Option<Pair> {
    if row_key.len() < 4 {
        return None;
    }
    let len = u32::from_be_bytes(row_key[..4].try_into().ok()?) as usize;
    let (key, value) = row_key[4..].split_at_checked(len)?;
    Some((key.to_vec(), value.to_vec()))
}

pub struct RocksHash {
    db: Option<DB>,
    path: Option<PathBuf>,
}

impl RocksHash {
    #[must_use]
    pub fn new() -> Self {
        Self {
            db: None,
            path: None,
        }
    }

    fn db(&self) -> Result<&DB> {
        self.db
            .as_ref()
            .ok_or_else(|| Error::backend_failure("hash is not open"))
    }
}

impl Default for RocksHash {
    fn default() -> Self {
        Self::new()
    }
}

impl Hash for RocksHash {
    fn open(&mut self, identifier: &str, options: &OpenOptions) -> Result<()> {
        let dir = options
            .dir
            .clone()
            .ok_or_else(|| Error::invalid_argument("disk hash requires a `dir` option"))?;
        let path = PathBuf::from(dir).join(identifier);
        if options.create_new && path.exists() {
            std::fs::remove_dir_all(&path)
                .map_err(|e| Error::backend_failure(format!("removing old hash file: {e}")))?;
        }
        let mut rocks_options = Options::default();
        rocks_options.create_if_missing(true);
        let db = if options.writable {
            DB::open(&rocks_options, &path)
        } else {
            DB::open_for_read_only(&rocks_options, &path, false)
        }
        .map_err(|e| Error::backend_failure(format!("opening hash file {path:?}: {e}")))?;
        self.db = Some(db);
        self.path = Some(path);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.db = None;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.db()?
            .flush()
            .map_err(|e| Error::backend_failure(format!("flushing hash file: {e}")))
    }

    fn values_count(&self, key: &[u8]) -> Result<usize> {
        Ok(self.scan_prefix(key)?.len())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let row = row_key(key)
            .into_iter()
            .chain(value.iter().copied())
            .collect::<Vec<u8>>();
        self.db()?
            .put(row, [])
            .map_err(|e| Error::backend_failure(format!("writing hash row: {e}")))
    }

    fn get_one(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.scan_prefix(key)?.into_iter().next().map(|(_, v)| v))
    }

    fn get_all(&self, key: &[u8]) -> Result<Vec<Vec<u8>>> {
        Ok(self.scan_prefix(key)?.into_iter().map(|(_, v)| v).collect())
    }

    fn keys(&self) -> Result<Vec<Vec<u8>>> {
        let mut out = Vec::new();
        let mut last_key: Option<Vec<u8>> = None;
        let iter = self.db()?.iterator(IteratorMode::Start);
        for item in iter {
            let (row, _) = item.map_err(|e| Error::backend_failure(format!("scanning keys: {e}")))?;
            let Some((key, _)) = decode_row(&row) else {
                continue;
            };
            if last_key.as_deref() != Some(key.as_slice()) {
                out.push(key.clone());
                last_key = Some(key);
            }
        }
        Ok(out)
    }

    fn contains(&self, key: &[u8], value: Option<&[u8]>) -> Result<bool> {
        match value {
            Some(v) => {
                let row = row_key(key).into_iter().chain(v.iter().copied()).collect::<Vec<u8>>();
                Ok(self
                    .db()?
                    .get(row)
                    .map_err(|e| Error::backend_failure(format!("probing hash row: {e}")))?
                    .is_some())
            }
            None => Ok(!self.scan_prefix(key)?.is_empty()),
        }
    }

    fn delete_key(&mut self, key: &[u8]) -> Result<()> {
        for (k, v) in self.scan_prefix(key)? {
            let row = row_key(&k).into_iter().chain(v).collect::<Vec<u8>>();
            self.db()?
                .delete(row)
                .map_err(|e| Error::backend_failure(format!("deleting hash row: {e}")))?;
        }
        Ok(())
    }

    fn delete_key_value(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let row = row_key(key).into_iter().chain(value.iter().copied()).collect::<Vec<u8>>();
        self.db()?
            .delete(row)
            .map_err(|e| Error::backend_failure(format!("deleting hash row: {e}")))
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Pair>> {
        let db = self.db()?;
        let mut raw = db.raw_iterator();
        let prefix_row = row_key(prefix);
        raw.seek(&prefix_row);
        let mut out = Vec::new();
        while raw.valid() {
            let Some(row) = raw.key() else { break };
            if !row_matches_key_prefix(row, prefix) {
                break;
            }
            if let Some(pair) = decode_row(row) {
                out.push(pair);
            }
            raw.next();
        }
        Ok(out)
    }

    fn cursor(&self) -> Box<dyn Cursor + '_> {
        Box::new(RocksCursor {
            db: self.db.as_ref(),
            raw: None,
        })
    }
}

/// True if `row`'s embedded key equals `prefix` or is length-prefixed by it
/// unambiguously (only possible when `row` encodes exactly `prefix`'s
/// bytes as a leading slice of its own key, i.e. this is a genuine prefix
/// match rather than an accidental byte coincidence across the 4-byte
/// length header).
fn row_matches_key_prefix(row: &[u8], prefix: &[u8]) -> bool {
    if row.len() < 4 {
        return false;
    }
    let len = u32::from_be_bytes([row[0], row[1], row[2], row[3]]) as usize;
    if len < prefix.len() {
        return false;
    }
    row.get(4..4 + prefix.len()) == Some(prefix)
}

struct RocksCursor<'a> {
    db: Option<&'a DB>,
    raw: Option<DBRawIterator<'a>>,
}

impl<'a> RocksCursor<'a> {
    fn db(&self) -> Option<&'a DB> {
        self.db
    }

    fn current_pair(&self) -> Option<Pair> {
        let raw = self.raw.as_ref()?;
        if !raw.valid() {
            return None;
        }
        decode_row(raw.key()?)
    }

    /// `row_key(current key)`, the byte prefix shared by every row of the
    /// key the cursor currently sits on.
    fn current_key_prefix(&self) -> Option<Vec<u8>> {
        let raw = self.raw.as_ref()?;
        let (key, _) = decode_row(raw.key()?)?;
        Some(row_key(&key))
    }
}

impl Cursor for RocksCursor<'_> {
    fn set(&mut self, key: &[u8], value: &[u8]) -> Option<Pair> {
        let db = self.db()?;
        let row = row_key(key).into_iter().chain(value.iter().copied()).collect::<Vec<u8>>();
        let mut raw = db.raw_iterator();
        raw.seek(&row);
        if raw.valid() && raw.key() == Some(row.as_slice()) {
            let pair = decode_row(raw.key()?);
            self.raw = Some(raw);
            pair
        } else {
            None
        }
    }

    fn set_key(&mut self, key: &[u8]) -> Option<Pair> {
        let db = self.db()?;
        let prefix_row = row_key(key);
        let mut raw = db.raw_iterator();
        raw.seek(&prefix_row);
        if raw.valid() && row_matches_key_prefix(raw.key()?, key) {
            let pair = decode_row(raw.key()?);
            self.raw = Some(raw);
            pair
        } else {
            None
        }
    }

    fn first_key(&mut self) -> Option<Pair> {
        let db = self.db()?;
        let mut raw = db.raw_iterator();
        raw.seek_to_first();
        if raw.valid() {
            let pair = decode_row(raw.key()?);
            self.raw = Some(raw);
            pair
        } else {
            None
        }
    }

    fn next_key(&mut self) -> Option<Pair> {
        let prefix = self.current_key_prefix()?;
        let raw = self.raw.as_mut()?;
        loop {
            raw.next();
            if !raw.valid() {
                return None;
            }
            let row = raw.key()?;
            if !row.starts_with(prefix.as_slice()) {
                return decode_row(row);
            }
        }
    }

    fn next_value(&mut self) -> Option<Pair> {
        let prefix = self.current_key_prefix()?;
        let raw = self.raw.as_mut()?;
        raw.next();
        if !raw.valid() {
            return None;
        }
        let row = raw.key()?;
        if row.starts_with(prefix.as_slice()) {
            decode_row(row)
        } else {
            None
        }
    }

    fn current(&self) -> Option<Pair> {
        self.current_pair()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn opened(dir: &std::path::Path) -> RocksHash {
        let mut h = RocksHash::new();
        h.open(
            "t",
            &OpenOptions {
                dir: Some(dir.to_string_lossy().into_owned()),
                writable: true,
                create_new: true,
            },
        )
        .unwrap();
        h
    }

    #[test]
    fn put_get_round_trips() {
        let dir = tempdir().unwrap();
        let mut h = opened(dir.path());
        h.put(b"k", b"v1").unwrap();
        h.put(b"k", b"v2").unwrap();
        h.put(b"k", b"v1").unwrap();
        let mut values = h.get_all(b"k").unwrap();
        values.sort();
        assert_eq!(values, vec![b"v1".to_vec(), b"v2".to_vec()]);
    }

    #[test]
    fn scan_prefix_does_not_leak_across_keys_of_different_length() {
        let dir = tempdir().unwrap();
        let mut h = opened(dir.path());
        h.put(b"ab", b"1").unwrap();
        h.put(b"abc", b"2").unwrap();
        let matches = h.scan_prefix(b"ab").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0, b"ab");
    }

    #[test]
    fn reopen_after_close_preserves_data() {
        let dir = tempdir().unwrap();
        {
            let mut h = opened(dir.path());
            h.put(b"k", b"v").unwrap();
            h.sync().unwrap();
            h.close().unwrap();
        }
        let mut h = RocksHash::new();
        h.open(
            "t",
            &OpenOptions {
                dir: Some(dir.path().to_string_lossy().into_owned()),
                writable: true,
                create_new: false,
            },
        )
        .unwrap();
        assert_eq!(h.get_all(b"k").unwrap(), vec![b"v".to_vec()]);
    }
}
