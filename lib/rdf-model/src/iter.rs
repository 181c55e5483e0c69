//! Iterator (spec §4.G): a lazy, single-pass, finite sequence of opaque
//! items, with a chain of filter-map transforms applied lazily on each read
//! and three projections available at every position (object/value,
//! context, key).
//!
//! [`crate::stream`] builds the statement-specialized `Stream` contract on
//! top of the same machinery.

/// What a pulled item is paired with: the per-position projections the spec
/// requires beyond the item itself. `key` is populated only by sources
/// backed by a `Hash` cursor; `context` is populated by sources that know
/// which named graph an item came from.
#[derive(Debug, Clone)]
pub struct Item<T> {
    pub value: T,
    pub context: Option<crate::node::Node>,
    pub key: Option<Vec<u8>>,
}

impl<T> Item<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            context: None,
            key: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: crate::node::Node) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn with_key(mut self, key: Vec<u8>) -> Self {
        self.key = Some(key);
        self
    }
}

/// The four projections an iterator position supports. `Value` and `Object`
/// name the same projection (the pulled item itself); the spec uses
/// "value" for a generic opaque-item iterator and "object" for node-typed
/// iteration, so both are kept as distinct variants for API fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Key,
    Value,
    Object,
    Context,
}

/// The pull side of an iterator: something that can hand back one more item
/// or signal exhaustion, and that must be told when the iterator is done
/// with it (so it can release any resources, e.g. a `Hash` cursor).
pub trait Source<T> {
    fn advance(&mut self) -> Option<Item<T>>;

    fn finish(&mut self) {}
}

type MapFn<T> = Box<dyn FnMut(Item<T>) -> Option<Item<T>> + Send>;
type ReleaseFn = Box<dyn FnMut() + Send>;

struct Map<T> {
    func: MapFn<T>,
    release: ReleaseFn,
}

/// A lazy, single-pass, finite iterator over opaque items of type `T`.
pub struct Iter<T> {
    source: Box<dyn Source<T> + Send>,
    maps: Vec<Map<T>>,
    current: Option<Item<T>>,
    primed: bool,
}

impl<T> Iter<T> {
    pub fn new(source: Box<dyn Source<T> + Send>) -> Self {
        Self {
            source,
            maps: Vec::new(),
            current: None,
            primed: false,
        }
    }

    /// Registers a map applied after all previously registered maps, in
    /// registration order. `release` runs once, when the iterator is
    /// dropped or exhausted — whichever comes first in a single pass it is
    /// invoked only by `Drop`, since a map may still be asked to run again
    /// on the next pulled item until the source is exhausted.
    pub fn add_map(
        &mut self,
        func: impl FnMut(Item<T>) -> Option<Item<T>> + Send + 'static,
        release: impl FnMut() + Send + 'static,
    ) {
        self.maps.push(Map {
            func: Box::new(func),
            release: Box::new(release),
        });
    }

    fn prime(&mut self) {
        if self.primed {
            return;
        }
        self.primed = true;
        self.current = self.pull();
    }

    fn pull(&mut self) -> Option<Item<T>> {
        loop {
            let mut item = self.source.advance()?;
            let mut rejected = false;
            for map in &mut self.maps {
                match (map.func)(item) {
                    Some(next) => item = next,
                    None => {
                        rejected = true;
                        break;
                    }
                }
            }
            if !rejected {
                return Some(item);
            }
        }
    }

    /// True once the source is exhausted (or every remaining source item has
    /// been rejected by the map chain).
    pub fn end(&mut self) -> bool {
        self.prime();
        self.current.is_none()
    }

    /// Advances to the next accepted item. Returns `false` if the iterator
    /// is now at end.
    pub fn next(&mut self) -> bool {
        self.prime();
        if self.current.is_none() {
            return false;
        }
        self.current = self.pull();
        self.current.is_some()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Item<T>> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn get_value(&self) -> Option<&T> {
        self.current.as_ref().map(|item| &item.value)
    }

    #[must_use]
    pub fn get_context(&self) -> Option<&crate::node::Node> {
        self.current.as_ref().and_then(|item| item.context.as_ref())
    }

    #[must_use]
    pub fn get_key(&self) -> Option<&[u8]> {
        self.current.as_ref().and_then(|item| item.key.as_deref())
    }
}

impl<T> Drop for Iter<T> {
    fn drop(&mut self) {
        for map in &mut self.maps {
            (map.release)();
        }
        self.source.finish();
    }
}

/// Adapts a plain Rust iterator of `T` into a `Source`, for tests and for
/// in-memory sources that need no extra projections.
pub struct VecSource<T> {
    items: std::vec::IntoIter<T>,
}

impl<T> VecSource<T> {
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }
}

impl<T> Source<T> for VecSource<T> {
    fn advance(&mut self) -> Option<Item<T>> {
        self.items.next().map(Item::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_map_preserves_sequence() {
        let mut plain = Iter::new(Box::new(VecSource::new(vec![1, 2, 3])));
        let mut mapped = Iter::new(Box::new(VecSource::new(vec![1, 2, 3])));
        mapped.add_map(Some, || {});

        let mut plain_values = Vec::new();
        while !plain.end() {
            plain_values.push(*plain.get_value().unwrap());
            plain.next();
        }
        let mut mapped_values = Vec::new();
        while !mapped.end() {
            mapped_values.push(*mapped.get_value().unwrap());
            mapped.next();
        }
        assert_eq!(plain_values, mapped_values);
    }

    #[test]
    fn filter_map_skips_rejected_items() {
        let mut iter = Iter::new(Box::new(VecSource::new(vec![1, 2, 3, 4, 5, 6])));
        iter.add_map(
            |item| if item.value % 2 == 0 { Some(item) } else { None },
            || {},
        );
        let mut values = Vec::new();
        while !iter.end() {
            values.push(*iter.get_value().unwrap());
            iter.next();
        }
        assert_eq!(values, vec![2, 4, 6]);
    }

    #[test]
    fn drop_runs_release_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let released = Arc::new(AtomicUsize::new(0));
        let released2 = Arc::clone(&released);
        {
            let mut iter = Iter::new(Box::new(VecSource::new(vec![1, 2, 3])));
            iter.add_map(Some, move || {
                released2.fetch_add(1, Ordering::SeqCst);
            });
            assert!(!iter.end());
            iter.next();
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }
}
