//! The process-wide context (spec §4.A).
//!
//! `World` owns: the factory registries (one per pluggable kind: hash,
//! storage, parser, serializer, query, digest), the per-kind interned-node
//! caches, the blank-node identifier counter, and the log sink. It is
//! created explicitly and freed once; there is no implicit global singleton.
//!
//! Three mutexes are mandated by §5 with a fixed acquisition order
//! (identifier < nodes < uris) to preclude deadlock. None of the sections
//! guarded by these mutexes invoke user-provided callbacks.

use crate::error::{Error, Result};
use crate::log::{Facility, LogHandler, LogMessage, LogSink, Severity};
use rustc_hash::FxHashMap;
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) struct UriData {
    pub(crate) bytes: Box<[u8]>,
    pub(crate) world: Weak<WorldInner>,
}

pub(crate) struct BlankData {
    pub(crate) id: Box<[u8]>,
    pub(crate) world: Weak<WorldInner>,
}

#[derive(PartialEq, Eq, Hash, Clone)]
pub(crate) struct LiteralKey {
    pub(crate) bytes: Box<[u8]>,
    pub(crate) language: Option<Box<str>>,
    pub(crate) datatype: Option<Box<[u8]>>,
}

pub(crate) struct LiteralData {
    pub(crate) key: LiteralKey,
    pub(crate) world: Weak<WorldInner>,
}

/// A content-addressed intern table: `Arc<T>` handles keyed by their content,
/// so that two equal values obtained from the same table are the same
/// allocation (pointer equality implies value equality). Modeled, per the
/// design notes, on a side table from content hash to the live handle; this
/// is the same chained/bucketed strategy the memory `Hash` implementation
/// uses, specialized here to own live reference-counted handles instead of
/// opaque bytes.
pub(crate) struct InternTable<K: Eq + std::hash::Hash, T> {
    by_content: FxHashMap<K, Weak<T>>,
}

impl<K: Eq + std::hash::Hash, T> Default for InternTable<K, T> {
    fn default() -> Self {
        Self {
            by_content: FxHashMap::default(),
        }
    }
}

impl<K: Eq + std::hash::Hash + Clone, T> InternTable<K, T> {
    fn get_or_insert_with(&mut self, key: K, make: impl FnOnce() -> Arc<T>) -> Arc<T> {
        if let Some(weak) = self.by_content.get(&key) {
            if let Some(existing) = weak.upgrade() {
                return existing;
            }
        }
        let created = make();
        self.by_content.insert(key, Arc::downgrade(&created));
        created
    }

    fn remove(&mut self, key: &K) {
        self.by_content.remove(key);
    }

    fn len(&self) -> usize {
        self.by_content.len()
    }
}

pub(crate) struct WorldInner {
    pub(crate) uris: Mutex<InternTable<Box<[u8]>, UriData>>,
    pub(crate) blanks: Mutex<InternTable<Box<[u8]>, BlankData>>,
    pub(crate) literals: Mutex<InternTable<LiteralKey, LiteralData>>,
    counter: AtomicU64,
    start_epoch: u64,
    registries: Mutex<FxHashMap<&'static str, FxHashMap<String, Arc<dyn Any + Send + Sync>>>>,
    log: Mutex<LogSink>,
    opened: Mutex<bool>,
    init_hooks: Mutex<Vec<Arc<dyn Fn(&World) + Send + Sync>>>,
}

/// Process-wide context. See module docs.
///
/// Cloning a `World` is cheap (it is a reference-counted handle over the
/// shared context); every clone observes the same intern caches, factory
/// registries and counter.
#[derive(Clone)]
pub struct World {
    pub(crate) inner: Arc<WorldInner>,
}

impl World {
    /// Construct a new, unopened `World`.
    #[must_use]
    pub fn new() -> Self {
        let start_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            inner: Arc::new(WorldInner {
                uris: Mutex::new(InternTable::default()),
                blanks: Mutex::new(InternTable::default()),
                literals: Mutex::new(InternTable::default()),
                counter: AtomicU64::new(0),
                start_epoch,
                registries: Mutex::new(FxHashMap::default()),
                log: Mutex::new(LogSink::default()),
                opened: Mutex::new(false),
                init_hooks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Register a callback to run (in registration order) the first time
    /// [`World::open`] is called. Higher-level crates (hash, storage,
    /// parser, serializer, query factories) use this to hook into the
    /// digest → hash → uri → node → statement → model → storage → parser →
    /// serializer → query init order described in §4.A: as long as each
    /// layer is constructed from the layer below it, registration order
    /// matches that fixed order naturally.
    pub fn register_init_hook(&self, hook: Arc<dyn Fn(&World) + Send + Sync>) {
        self.inner.init_hooks.lock().unwrap().push(hook);
    }

    /// Initializes all registered factories. Idempotent: calling it again
    /// is a no-op.
    pub fn open(&self) {
        let mut opened = self.inner.opened.lock().unwrap();
        if *opened {
            return;
        }
        *opened = true;
        drop(opened);
        let hooks = self.inner.init_hooks.lock().unwrap().clone();
        for hook in hooks {
            hook(self);
        }
    }

    pub fn is_open(&self) -> bool {
        *self.inner.opened.lock().unwrap()
    }

    pub fn set_log_handler(&self, handler: Arc<dyn LogHandler>) {
        self.inner.log.lock().unwrap().set_handler(handler);
    }

    pub fn log(&self, message: LogMessage) {
        self.inner.log.lock().unwrap().emit(message);
    }

    pub fn log_warn(&self, facility: Facility, code: i32, message: impl Into<String>) {
        self.inner.log.lock().unwrap().warn(facility, code, message);
    }

    pub fn log_error(&self, facility: Facility, code: i32, message: impl Into<String>) {
        self.inner.log.lock().unwrap().error(facility, code, message);
    }

    /// Mint a fresh blank-node identifier of the form `r{start_epoch}r{n}`,
    /// guaranteed unique within this `World` instance (§4.A).
    #[must_use]
    pub fn mint_identifier(&self) -> String {
        let n = self.inner.counter.fetch_add(1, Ordering::Relaxed);
        format!("r{}r{}", self.inner.start_epoch, n)
    }

    /// Register a factory of the given `kind` (e.g. `"hash"`, `"storage"`,
    /// `"parser"`, `"serializer"`, `"query"`, `"digest"`) under `name`.
    /// Factory tables are append-only during a `World`'s lifetime: a second
    /// registration under the same `(kind, name)` fails with `Conflict`.
    pub fn register_factory<T: Send + Sync + 'static>(
        &self,
        kind: &'static str,
        name: impl Into<String>,
        factory: Arc<T>,
    ) -> Result<()> {
        let name = name.into();
        let mut registries = self.inner.registries.lock().unwrap();
        let by_kind = registries.entry(kind).or_default();
        if by_kind.contains_key(&name) {
            return Err(Error::Conflict(format!(
                "a {kind} factory named '{name}' is already registered"
            )));
        }
        by_kind.insert(name, factory);
        Ok(())
    }

    /// Look up a previously registered factory by kind and name.
    #[must_use]
    pub fn factory<T: Send + Sync + 'static>(&self, kind: &str, name: &str) -> Option<Arc<T>> {
        let registries = self.inner.registries.lock().unwrap();
        registries
            .get(kind)
            .and_then(|by_name| by_name.get(name))
            .and_then(|factory| Arc::clone(factory).downcast::<T>().ok())
    }

    /// Names of every factory registered under `kind`, in no particular
    /// order (lookups never mutate the registry, so this is safe to call
    /// freely).
    #[must_use]
    pub fn factory_names(&self, kind: &str) -> Vec<String> {
        let registries = self.inner.registries.lock().unwrap();
        registries
            .get(kind)
            .map(|by_name| by_name.keys().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub(crate) fn downgrade(&self) -> Weak<WorldInner> {
        Arc::downgrade(&self.inner)
    }

    /// Count of distinct interned URIs currently live. Exposed mainly for
    /// tests of §8 property 1 (intern uniqueness).
    #[must_use]
    pub fn interned_uri_count(&self) -> usize {
        self.inner.uris.lock().unwrap().len()
    }

    #[must_use]
    pub fn interned_blank_count(&self) -> usize {
        self.inner.blanks.lock().unwrap().len()
    }

    #[must_use]
    pub fn interned_literal_count(&self) -> usize {
        self.inner.literals.lock().unwrap().len()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for World {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for World {}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("uris", &self.interned_uri_count())
            .field("blanks", &self.interned_blank_count())
            .field("literals", &self.interned_literal_count())
            .field("opened", &self.is_open())
            .finish()
    }
}

pub(crate) fn intern_uri(world: &World, bytes: &[u8]) -> Arc<UriData> {
    let mut uris = world.inner.uris.lock().unwrap();
    uris.get_or_insert_with(bytes.into(), || {
        Arc::new(UriData {
            bytes: bytes.into(),
            world: world.downgrade(),
        })
    })
}

pub(crate) fn intern_blank(world: &World, id: &[u8]) -> Arc<BlankData> {
    let mut blanks = world.inner.blanks.lock().unwrap();
    blanks.get_or_insert_with(id.into(), || {
        Arc::new(BlankData {
            id: id.into(),
            world: world.downgrade(),
        })
    })
}

pub(crate) fn intern_literal(world: &World, key: LiteralKey) -> Arc<LiteralData> {
    let mut literals = world.inner.literals.lock().unwrap();
    literals.get_or_insert_with(key.clone(), || {
        Arc::new(LiteralData {
            key,
            world: world.downgrade(),
        })
    })
}

impl Drop for UriData {
    fn drop(&mut self) {
        if let Some(world) = self.world.upgrade() {
            let mut uris = world.uris.lock().unwrap();
            uris.remove(&self.bytes);
        }
    }
}

impl Drop for BlankData {
    fn drop(&mut self) {
        if let Some(world) = self.world.upgrade() {
            let mut blanks = world.blanks.lock().unwrap();
            blanks.remove(&self.id);
        }
    }
}

impl Drop for LiteralData {
    fn drop(&mut self) {
        if let Some(world) = self.world.upgrade() {
            let mut literals = world.literals.lock().unwrap();
            literals.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_identifier_is_unique() {
        let world = World::new();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(world.mint_identifier()));
        }
    }

    #[test]
    fn factory_registration_is_append_only() {
        let world = World::new();
        world.register_factory("hash", "memory", Arc::new(42u32)).unwrap();
        let err = world
            .register_factory("hash", "memory", Arc::new(7u32))
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        let value: Arc<u32> = world.factory("hash", "memory").unwrap();
        assert_eq!(*value, 42);
    }

    #[test]
    fn open_is_idempotent_and_runs_hooks_once() {
        let world = World::new();
        let calls = Arc::new(AtomicU64::new(0));
        let calls2 = Arc::clone(&calls);
        world.register_init_hook(Arc::new(move |_: &World| {
            calls2.fetch_add(1, Ordering::SeqCst);
        }));
        world.open();
        world.open();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
