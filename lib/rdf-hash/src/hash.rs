//! The `Hash` trait itself (spec §4.E): a pluggable ordered multimap from
//! opaque byte keys to multisets of opaque byte values.

use crate::cursor::{Cursor, Pair};
use rdf_model::Result;

/// How a `Hash` should be attached to its underlying resource (spec §4.E
/// `open`, §4.I "Storage options").
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Directory the backend may create files under. Ignored by
    /// [`crate::memory::MemoryHash`].
    pub dir: Option<String>,
    pub writable: bool,
    pub create_new: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            dir: None,
            writable: true,
            create_new: false,
        }
    }
}

/// A pluggable ordered-multimap: key → {values}, duplicate `(key, value)`
/// pairs disallowed (a second `put` of the same pair silently merges).
///
/// Implementations: [`crate::memory::MemoryHash`] (in-process) and, behind
/// the `rocksdb-backend` feature, [`crate::disk::RocksHash`] (persistent).
/// Both expose the same [`Cursor`] contract so callers above this layer
/// (the hashes storage backend, the URI/node intern tables) never need to
/// know which one they are talking to.
pub trait Hash: Send + Sync {
    /// Attaches this hash to its underlying resource. `identifier` names the
    /// resource (a file stem for disk backends, ignored for memory).
    fn open(&mut self, identifier: &str, options: &OpenOptions) -> Result<()>;

    fn close(&mut self) -> Result<()>;

    /// Forces any buffered state to durable storage. A no-op for the memory
    /// backend.
    fn sync(&mut self) -> Result<()>;

    fn values_count(&self, key: &[u8]) -> Result<usize>;

    /// Inserts `(key, value)`. Duplicate pairs are silently merged (no
    /// error, no second entry).
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Any one value for `key`, first by cursor order.
    fn get_one(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn get_all(&self, key: &[u8]) -> Result<Vec<Vec<u8>>>;

    /// Every distinct key currently stored, in unspecified global order.
    fn keys(&self) -> Result<Vec<Vec<u8>>>;

    fn contains(&self, key: &[u8], value: Option<&[u8]>) -> Result<bool>;

    fn delete_key(&mut self, key: &[u8]) -> Result<()>;

    fn delete_key_value(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// A fresh cursor over this hash's current contents.
    fn cursor(&self) -> Box<dyn Cursor + '_>;

    /// Every `(key, value)` pair whose key starts with `prefix`, used by the
    /// hashes storage backend (§4.I) to answer partially-bound access
    /// patterns without a full scan. The default walks `keys()` and filters;
    /// backends with a natively ordered key space (disk) override this with
    /// a real range scan.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<Pair>> {
        let mut out = Vec::new();
        for key in self.keys()? {
            if key.starts_with(prefix) {
                for value in self.get_all(&key)? {
                    out.push((key.clone(), value));
                }
            }
        }
        Ok(out)
    }

    /// Advisory-locking handle, exposed only so external tooling can flock
    /// the backing file (§4.E). `None` for backends with no single fd.
    fn fd(&self) -> Option<i32> {
        None
    }
}
