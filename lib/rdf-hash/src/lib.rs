//! Pluggable ordered-multimap abstraction (spec §4.E) with a cursor
//! protocol, plus the capacity-bounded object cache (spec §4.F).
//!
//! Two `Hash` implementations are provided: [`memory::MemoryHash`] (a
//! chained hash table) and, behind the `rocksdb-backend` feature,
//! [`disk::RocksHash`] (a single on-disk file per store, per spec §6). Both
//! are pure bytes-in, bytes-out: node semantics live in `rdf-model` and
//! `rdf-store`, not here.

pub mod cache;
pub mod cursor;
pub mod hash;
pub mod memory;
#[cfg(feature = "rocksdb-backend")]
pub mod disk;

pub use cache::ObjectCache;
pub use cursor::{Cursor, Pair};
pub use hash::{Hash, OpenOptions};
pub use memory::MemoryHash;
#[cfg(feature = "rocksdb-backend")]
pub use disk::RocksHash;
