//! Node / Term (spec §4.C): a tagged union of IRI, Literal and Blank,
//! interned per-kind against a [`World`] so that two equal nodes obtained
//! from the same world are the same handle.

use crate::encoding::{check_version, read_len_prefixed, write_len_prefixed, SCHEMA_VERSION};
use crate::error::{Error, Result};
use crate::uri::Uri;
use crate::world::{intern_blank, intern_literal, BlankData, LiteralData, LiteralKey, World};
use std::fmt;
use std::sync::Arc;

const TAG_IRI: u8 = 0;
const TAG_LITERAL: u8 = 1;
const TAG_BLANK: u8 = 2;

/// An interned RDF literal: bytes plus an optional language tag and an
/// optional datatype URI. The "well-formed XML literal" bit from the
/// original model is represented, as specified, as the datatype URI
/// `rdf:XMLLiteral` rather than as a distinct variant.
#[derive(Clone)]
pub struct Literal {
    pub(crate) data: Arc<LiteralData>,
}

impl Literal {
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.data.key.bytes
    }

    #[must_use]
    pub fn value_str(&self) -> &str {
        std::str::from_utf8(self.value()).unwrap_or_default()
    }

    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.data.key.language.as_deref()
    }

    #[must_use]
    pub fn datatype(&self) -> Option<&[u8]> {
        self.data.key.datatype.as_deref()
    }

    #[must_use]
    pub fn is_plain(&self) -> bool {
        self.data.key.datatype.is_none()
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Literal")
            .field("value", &self.value_str())
            .field("language", &self.language())
            .field("datatype", &self.datatype().map(String::from_utf8_lossy))
            .finish()
    }
}

/// An interned blank-node local identifier, unique within one `World`.
#[derive(Clone)]
pub struct Blank {
    pub(crate) data: Arc<BlankData>,
}

impl Blank {
    #[must_use]
    pub fn identifier(&self) -> &[u8] {
        &self.data.id
    }

    #[must_use]
    pub fn identifier_str(&self) -> &str {
        std::str::from_utf8(self.identifier()).unwrap_or_default()
    }
}

impl fmt::Debug for Blank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Blank({:?})", self.identifier_str())
    }
}

/// A tagged union of {IRI, Literal, Blank} (spec §4.C).
#[derive(Clone)]
pub enum Node {
    Iri(Uri),
    Literal(Literal),
    Blank(Blank),
}

impl Node {
    pub fn iri(world: &World, bytes: &[u8]) -> Result<Self> {
        Ok(Self::Iri(Uri::new(world, bytes)?))
    }

    pub fn iri_str(world: &World, s: &str) -> Result<Self> {
        Ok(Self::Iri(Uri::new_from_str(world, s)?))
    }

    /// An IRI built by concatenating a base URI with a local name, a common
    /// convenience form for vocabulary terms (e.g. `ex:` + `a` -> `ex:a`).
    pub fn iri_from_uri_local_name(world: &World, base: &Uri, local_name: &str) -> Result<Self> {
        let mut s = String::with_capacity(base.len() + local_name.len());
        s.push_str(base.as_str());
        s.push_str(local_name);
        Self::iri_str(world, &s)
    }

    /// Builds a literal, canonicalizing per §4.C: language present and
    /// datatype absent stays a plain literal with language; datatype
    /// present drops any language (canonicalized to absent).
    pub fn literal(
        world: &World,
        bytes: &[u8],
        language: Option<&str>,
        datatype: Option<&[u8]>,
    ) -> Result<Self> {
        let (language, datatype) = match datatype {
            Some(dt) => (None, Some(dt)),
            None => (language, None),
        };
        if let Some(lang) = language {
            if lang.is_empty() {
                return Err(Error::invalid_argument("language tag must not be empty"));
            }
        }
        let key = LiteralKey {
            bytes: bytes.into(),
            language: language.map(|l| l.to_ascii_lowercase().into_boxed_str()),
            datatype: datatype.map(Into::into),
        };
        Ok(Self::Literal(Literal {
            data: intern_literal(world, key),
        }))
    }

    pub fn plain_literal(world: &World, value: &str) -> Result<Self> {
        Self::literal(world, value.as_bytes(), None, None)
    }

    pub fn language_literal(world: &World, value: &str, language: &str) -> Result<Self> {
        Self::literal(world, value.as_bytes(), Some(language), None)
    }

    pub fn typed_literal(world: &World, value: &str, datatype: &Uri) -> Result<Self> {
        Self::literal(world, value.as_bytes(), None, Some(datatype.as_bytes()))
    }

    pub fn blank(world: &World, identifier: &[u8]) -> Result<Self> {
        if identifier.is_empty() {
            return Err(Error::invalid_argument("blank node identifier is empty"));
        }
        Ok(Self::Blank(Blank {
            data: intern_blank(world, identifier),
        }))
    }

    pub fn blank_str(world: &World, identifier: &str) -> Result<Self> {
        Self::blank(world, identifier.as_bytes())
    }

    /// A fresh blank node with a world-minted identifier.
    pub fn fresh_blank(world: &World) -> Result<Self> {
        let id = world.mint_identifier();
        Self::blank_str(world, &id)
    }

    #[must_use]
    pub fn is_iri(&self) -> bool {
        matches!(self, Self::Iri(_))
    }

    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank(_))
    }

    #[must_use]
    pub fn as_iri(&self) -> Option<&Uri> {
        match self {
            Self::Iri(u) => Some(u),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(l) => Some(l),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blank(&self) -> Option<&Blank> {
        match self {
            Self::Blank(b) => Some(b),
            _ => None,
        }
    }

    /// Encodes this node into a self-delimiting, versioned byte string
    /// (spec §4.C, §6). `decode` is the exact inverse.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(SCHEMA_VERSION);
        match self {
            Self::Iri(uri) => {
                out.push(TAG_IRI);
                write_len_prefixed(&mut out, uri.as_bytes());
            }
            Self::Literal(literal) => {
                out.push(TAG_LITERAL);
                write_len_prefixed(&mut out, literal.value());
                write_len_prefixed(
                    &mut out,
                    literal.language().map(str::as_bytes).unwrap_or(&[]),
                );
                write_len_prefixed(&mut out, literal.datatype().unwrap_or(&[]));
            }
            Self::Blank(blank) => {
                out.push(TAG_BLANK);
                write_len_prefixed(&mut out, blank.identifier());
            }
        }
        out
    }

    /// Decodes a byte string produced by [`Node::encode`], interning the
    /// result against `world`. Fails with `InvalidEncoding` on a corrupt or
    /// truncated leading tag. Trailing bytes beyond the encoded node are
    /// ignored; use [`Node::decode_prefix`] when that matters (e.g.
    /// splitting a storage index key back into its component nodes).
    pub fn decode(world: &World, input: &[u8]) -> Result<Self> {
        Self::decode_prefix(world, input).map(|(node, _)| node)
    }

    /// Like [`Node::decode`], but also returns how many leading bytes of
    /// `input` were consumed. The hashes storage backend (§4.I) concatenates
    /// several node encodings into one composite index key (`S‖P`, `P‖O`,
    /// `O‖S`); this is how it splits such a key back into its parts, since
    /// each encoding is self-delimiting but not separately length-prefixed
    /// at the point of concatenation.
    pub fn decode_prefix(world: &World, input: &[u8]) -> Result<(Self, usize)> {
        let mut pos = 0;
        check_version(input, &mut pos)?;
        let tag = *input
            .get(pos)
            .ok_or_else(|| Error::invalid_encoding("missing node kind tag"))?;
        pos += 1;
        let node = match tag {
            TAG_IRI => {
                let bytes = read_len_prefixed(input, &mut pos)?;
                Self::iri(world, bytes)?
            }
            TAG_LITERAL => {
                let bytes = read_len_prefixed(input, &mut pos)?.to_vec();
                let lang = read_len_prefixed(input, &mut pos)?.to_vec();
                let datatype = read_len_prefixed(input, &mut pos)?.to_vec();
                let language = if lang.is_empty() {
                    None
                } else {
                    Some(
                        String::from_utf8(lang)
                            .map_err(|_| Error::invalid_encoding("language tag is not UTF-8"))?,
                    )
                };
                let datatype = if datatype.is_empty() {
                    None
                } else {
                    Some(datatype)
                };
                Self::literal(world, &bytes, language.as_deref(), datatype.as_deref())?
            }
            TAG_BLANK => {
                let id = read_len_prefixed(input, &mut pos)?;
                Self::blank(world, id)?
            }
            other => {
                return Err(Error::invalid_encoding(format!(
                    "unknown node kind tag {other}"
                )))
            }
        };
        Ok((node, pos))
    }

    #[must_use]
    pub fn use_count(&self) -> usize {
        match self {
            Self::Iri(u) => u.use_count(),
            Self::Literal(l) => Arc::strong_count(&l.data),
            Self::Blank(b) => Arc::strong_count(&b.data),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Iri(a), Self::Iri(b)) => a.equals(b),
            (Self::Literal(a), Self::Literal(b)) => Arc::ptr_eq(&a.data, &b.data) || a.data.key == b.data.key,
            (Self::Blank(a), Self::Blank(b)) => {
                Arc::ptr_eq(&a.data, &b.data) || a.data.id == b.data.id
            }
            _ => false,
        }
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(u) => write!(f, "Iri({:?})", u.as_str()),
            Self::Literal(l) => l.fmt(f),
            Self::Blank(b) => b.fmt(f),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(u) => write!(f, "<{u}>"),
            Self::Literal(l) => {
                write!(f, "\"{}\"", l.value_str())?;
                if let Some(lang) = l.language() {
                    write!(f, "@{lang}")?;
                } else if let Some(dt) = l.datatype() {
                    write!(f, "^^<{}>", String::from_utf8_lossy(dt))?;
                }
                Ok(())
            }
            Self::Blank(b) => write!(f, "_:{}", b.identifier_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip_iri() {
        let world = World::new();
        let n = Node::iri_str(&world, "http://example.com/a").unwrap();
        let decoded = Node::decode(&world, &n.encode()).unwrap();
        assert_eq!(n, decoded);
    }

    #[test]
    fn encode_decode_round_trip_literal_with_language() {
        let world = World::new();
        let n = Node::language_literal(&world, "héllo", "en").unwrap();
        let encoded = n.encode();
        let decoded = Node::decode(&world, &encoded).unwrap();
        assert_eq!(n, decoded);
        assert_eq!(decoded.as_literal().unwrap().value_str(), "héllo");
        assert_eq!(decoded.as_literal().unwrap().language(), Some("en"));
    }

    #[test]
    fn encode_decode_round_trip_blank() {
        let world = World::new();
        let n = Node::blank_str(&world, "b1").unwrap();
        let decoded = Node::decode(&world, &n.encode()).unwrap();
        assert_eq!(n, decoded);
    }

    #[test]
    fn typed_literal_drops_language() {
        let world = World::new();
        let dt = Uri::new_from_str(&world, "http://www.w3.org/2001/XMLSchema#integer").unwrap();
        let n = Node::literal(&world, b"42", Some("en"), Some(dt.as_bytes())).unwrap();
        let lit = n.as_literal().unwrap();
        assert_eq!(lit.language(), None);
        assert!(lit.datatype().is_some());
    }

    #[test]
    fn literal_language_is_case_insensitive() {
        let world = World::new();
        let a = Node::language_literal(&world, "hi", "EN").unwrap();
        let b = Node::language_literal(&world, "hi", "en").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cross_kind_nodes_are_never_equal() {
        let world = World::new();
        let iri = Node::iri_str(&world, "http://example.com/x").unwrap();
        let blank = Node::blank_str(&world, "x").unwrap();
        assert_ne!(iri, blank);
    }

    #[test]
    fn decode_rejects_bad_version() {
        let world = World::new();
        let mut bytes = Node::iri_str(&world, "http://example.com/a").unwrap().encode();
        bytes[0] = 99;
        assert!(Node::decode(&world, &bytes).is_err());
    }
}
