//! URI (spec §4.B): an opaque handle wrapping an immutable UTF-8 byte
//! sequence, interned per-`World` so that two handles obtained from the same
//! `World` with the same bytes are the same handle.

use crate::error::{Error, Result};
use crate::world::{intern_uri, UriData, World};
use std::fmt;
use std::sync::Arc;

/// An interned, reference-counted URI. Cloning bumps the reference count
/// (`Arc::clone`); there is no explicit `release` call in this API, the
/// handle's `Drop` plays that role and frees the intern-table slot once the
/// last clone goes away.
#[derive(Clone)]
pub struct Uri {
    pub(crate) data: Arc<UriData>,
}

impl Uri {
    /// Interns `bytes` against `world`. Fails with `InvalidArgument` if
    /// `bytes` is empty or not valid UTF-8.
    pub fn new(world: &World, bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::invalid_argument("empty URI string"));
        }
        std::str::from_utf8(bytes)
            .map_err(|_| Error::invalid_argument("URI is not valid UTF-8"))?;
        Ok(Self {
            data: intern_uri(world, bytes),
        })
    }

    pub fn new_from_str(world: &World, s: &str) -> Result<Self> {
        Self::new(world, s.as_bytes())
    }

    /// Clone of `other`'s value, interned in `other`'s own world (mirrors
    /// librdf's `librdf_new_uri_from_uri`, which always copies within the
    /// same world since a `Uri` never moves between worlds implicitly).
    #[must_use]
    pub fn new_from_uri(other: &Self) -> Self {
        other.clone()
    }

    /// Resolve `rel` against `base`, per §4.B's deliberately partial RFC
    /// 3986 subset:
    /// - empty `rel` clones `base`;
    /// - `rel` starting with `#` truncates `base` at its first `#` and
    ///   appends `rel`;
    /// - `rel` matching `^[A-Za-z0-9]+:` is treated as already absolute;
    /// - otherwise `base` is truncated at its last `/` or `:` and `rel` is
    ///   appended.
    pub fn new_relative_to_base(world: &World, base: &Self, rel: &str) -> Result<Self> {
        if rel.is_empty() {
            return Ok(base.clone());
        }
        if let Some(rest) = rel.strip_prefix('#') {
            let base_str = base.as_str();
            let truncated = match base_str.find('#') {
                Some(idx) => &base_str[..idx],
                None => base_str,
            };
            return Self::new_from_str(world, &format!("{truncated}#{rest}"));
        }
        if looks_absolute(rel) {
            return Self::new_from_str(world, rel);
        }
        let base_str = base.as_str();
        let cut = base_str.rfind(['/', ':']).map_or(base_str.len(), |i| i + 1);
        Self::new_from_str(world, &format!("{}{}", &base_str[..cut], rel))
    }

    /// Rewrite `string` from one base to another: if it starts with
    /// `source_base`'s bytes, replace that prefix with `target_base`'s; if
    /// it starts with `#` it is a fragment appended to `target_base`;
    /// otherwise a fresh `Uri` is built from `string` unchanged.
    pub fn new_normalized_to_base(
        world: &World,
        string: &str,
        source_base: &Self,
        target_base: &Self,
    ) -> Result<Self> {
        let source = source_base.as_str();
        if let Some(rest) = string.strip_prefix(source) {
            return Self::new_from_str(world, &format!("{}{rest}", target_base.as_str()));
        }
        if let Some(fragment) = string.strip_prefix('#') {
            return Self::new_from_str(world, &format!("{}#{fragment}", target_base.as_str()));
        }
        Self::new_from_str(world, string)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // Safety of this unwrap: bytes are validated as UTF-8 at construction.
        std::str::from_utf8(&self.data.bytes).unwrap_or_default()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.bytes.is_empty()
    }

    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data) || self.data.bytes == other.data.bytes
    }

    /// Total count of live handles sharing this URI's intern-table slot.
    #[must_use]
    pub fn use_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    /// A `file://` URI from a local filesystem path, following
    /// `librdf_uri_from_filename` (`original_source/librdf/rdf_uri.c`).
    pub fn from_file_path(world: &World, path: &str) -> Result<Self> {
        let absolute = if path.starts_with('/') {
            path.to_owned()
        } else {
            format!("/{path}")
        };
        Self::new_from_str(world, &format!("file://{absolute}"))
    }

    /// The filesystem path encoded by a `file://` URI, or `None` if this is
    /// not a `file:` URI.
    #[must_use]
    pub fn to_file_path(&self) -> Option<String> {
        self.as_str().strip_prefix("file://").map(ToOwned::to_owned)
    }
}

fn looks_absolute(rel: &str) -> bool {
    let Some(colon) = rel.find(':') else {
        return false;
    };
    colon > 0 && rel[..colon].chars().all(|c| c.is_ascii_alphanumeric())
}

impl PartialEq for Uri {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for Uri {}

impl PartialOrd for Uri {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Uri {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.data.bytes.cmp(&other.data.bytes)
    }
}

impl std::hash::Hash for Uri {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.data.bytes.hash(state);
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Debug for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uri({:?})", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_pointer_stable() {
        let world = World::new();
        let a = Uri::new_from_str(&world, "http://example.com/a").unwrap();
        let b = Uri::new_from_str(&world, "http://example.com/a").unwrap();
        assert!(Arc::ptr_eq(&a.data, &b.data));
        assert_eq!(a.use_count(), 2);
    }

    #[test]
    fn relative_resolution_cases() {
        let world = World::new();
        let base = Uri::new_from_str(&world, "http://x/dir/").unwrap();
        let r = Uri::new_relative_to_base(&world, &base, "#frag").unwrap();
        assert_eq!(r.as_str(), "http://x/dir/#frag");

        let base = Uri::new_from_str(&world, "http://x/dir/a").unwrap();
        let r = Uri::new_relative_to_base(&world, &base, "b").unwrap();
        assert_eq!(r.as_str(), "http://x/dir/b");

        let base = Uri::new_from_str(&world, "http://x/").unwrap();
        let r = Uri::new_relative_to_base(&world, &base, "http://y/z").unwrap();
        assert_eq!(r.as_str(), "http://y/z");
    }

    #[test]
    fn empty_relative_clones_base() {
        let world = World::new();
        let base = Uri::new_from_str(&world, "http://x/dir/").unwrap();
        let r = Uri::new_relative_to_base(&world, &base, "").unwrap();
        assert!(r.equals(&base));
    }

    #[test]
    fn release_frees_intern_slot() {
        let world = World::new();
        {
            let _a = Uri::new_from_str(&world, "http://example.com/tmp").unwrap();
            assert_eq!(world.interned_uri_count(), 1);
        }
        assert_eq!(world.interned_uri_count(), 0);
    }
}
