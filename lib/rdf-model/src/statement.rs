//! Statement (spec §4.D): a 3-tuple of nodes plus an optional graph
//! (context) node. The same struct doubles as a "partial statement" match
//! pattern, following `librdf_statement` (`original_source/librdf/rdf_statement.h`):
//! any field may be absent to mean "wildcard" when matching, or "not yet
//! set" while a statement is being built.

use crate::encoding::{check_version, SCHEMA_VERSION};
use crate::error::{Error, Result};
use crate::node::Node;
use crate::world::World;
use std::fmt;

const MAGIC: u8 = b'x';
const FLAG_SUBJECT: u8 = b's';
const FLAG_PREDICATE: u8 = b'p';
const FLAG_OBJECT: u8 = b'o';
const FLAG_CONTEXT: u8 = b'c';

/// A triple (or quad, with `graph` set) of nodes, any of which may be a
/// wildcard (`None`) when the statement is used as a match pattern.
#[derive(Clone, Default)]
pub struct Statement {
    subject: Option<Node>,
    predicate: Option<Node>,
    object: Option<Node>,
    graph: Option<Node>,
}

impl Statement {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a complete statement from three nodes, validating the kind
    /// constraints from §3: subject must be IRI or Blank, predicate must be
    /// IRI, object may be any kind.
    pub fn from_nodes(subject: Node, predicate: Node, object: Node) -> Result<Self> {
        check_subject_kind(&subject)?;
        check_predicate_kind(&predicate)?;
        Ok(Self {
            subject: Some(subject),
            predicate: Some(predicate),
            object: Some(object),
            graph: None,
        })
    }

    pub fn with_graph(mut self, graph: Node) -> Result<Self> {
        check_graph_kind(&graph)?;
        self.graph = Some(graph);
        Ok(self)
    }

    #[must_use]
    pub fn subject(&self) -> Option<&Node> {
        self.subject.as_ref()
    }

    #[must_use]
    pub fn predicate(&self) -> Option<&Node> {
        self.predicate.as_ref()
    }

    #[must_use]
    pub fn object(&self) -> Option<&Node> {
        self.object.as_ref()
    }

    #[must_use]
    pub fn graph(&self) -> Option<&Node> {
        self.graph.as_ref()
    }

    pub fn set_subject(&mut self, subject: Node) -> Result<()> {
        check_subject_kind(&subject)?;
        self.subject = Some(subject);
        Ok(())
    }

    pub fn set_predicate(&mut self, predicate: Node) -> Result<()> {
        check_predicate_kind(&predicate)?;
        self.predicate = Some(predicate);
        Ok(())
    }

    pub fn set_object(&mut self, object: Node) {
        self.object = Some(object);
    }

    pub fn set_graph(&mut self, graph: Option<Node>) -> Result<()> {
        if let Some(g) = &graph {
            check_graph_kind(g)?;
        }
        self.graph = graph;
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.subject.is_some() && self.predicate.is_some() && self.object.is_some()
    }

    /// True iff every field present in `self` (a concrete statement) equals
    /// the corresponding field in `pattern` where `pattern` has a value; a
    /// `None` field in `pattern` matches anything (§3, §8 property 4).
    #[must_use]
    pub fn matches(&self, pattern: &Self) -> bool {
        field_matches(&self.subject, &pattern.subject)
            && field_matches(&self.predicate, &pattern.predicate)
            && field_matches(&self.object, &pattern.object)
            && field_matches(&self.graph, &pattern.graph)
    }

    /// Encodes the present fields, prefixed by the magic byte `x`, the
    /// schema version, and one flag byte per present field (`s`/`p`/`o`/`c`)
    /// (§4.D).
    #[must_use]
    pub fn encode_parts(&self) -> Vec<u8> {
        let mut out = vec![MAGIC, SCHEMA_VERSION];
        let mut flags = Vec::new();
        let mut payload = Vec::new();
        if let Some(n) = &self.subject {
            flags.push(FLAG_SUBJECT);
            payload.push(n.encode());
        }
        if let Some(n) = &self.predicate {
            flags.push(FLAG_PREDICATE);
            payload.push(n.encode());
        }
        if let Some(n) = &self.object {
            flags.push(FLAG_OBJECT);
            payload.push(n.encode());
        }
        if let Some(n) = &self.graph {
            flags.push(FLAG_CONTEXT);
            payload.push(n.encode());
        }
        out.push(flags.len() as u8);
        out.extend_from_slice(&flags);
        for part in payload {
            crate::encoding::write_len_prefixed(&mut out, &part);
        }
        out
    }

    pub fn decode_parts(world: &World, input: &[u8]) -> Result<Self> {
        let mut pos = 0;
        let magic = *input
            .first()
            .ok_or_else(|| Error::invalid_encoding("empty statement encoding"))?;
        if magic != MAGIC {
            return Err(Error::invalid_encoding("bad statement magic byte"));
        }
        pos += 1;
        check_version(input, &mut pos)?;
        let count = *input
            .get(pos)
            .ok_or_else(|| Error::invalid_encoding("truncated statement flags"))?
            as usize;
        pos += 1;
        let flags = input
            .get(pos..pos + count)
            .ok_or_else(|| Error::invalid_encoding("truncated statement flags"))?
            .to_vec();
        pos += count;
        let mut statement = Self::new();
        for flag in flags {
            let part = crate::encoding::read_len_prefixed(input, &mut pos)?;
            let node = Node::decode(world, part)?;
            match flag {
                FLAG_SUBJECT => statement.subject = Some(node),
                FLAG_PREDICATE => statement.predicate = Some(node),
                FLAG_OBJECT => statement.object = Some(node),
                FLAG_CONTEXT => statement.graph = Some(node),
                other => {
                    return Err(Error::invalid_encoding(format!(
                        "unknown statement field flag {other}"
                    )))
                }
            }
        }
        Ok(statement)
    }
}

fn field_matches(value: &Option<Node>, pattern: &Option<Node>) -> bool {
    match pattern {
        None => true,
        Some(p) => value.as_ref().is_some_and(|v| v == p),
    }
}

fn check_subject_kind(node: &Node) -> Result<()> {
    if node.is_iri() || node.is_blank() {
        Ok(())
    } else {
        Err(Error::invalid_argument("subject must be an IRI or blank node"))
    }
}

fn check_predicate_kind(node: &Node) -> Result<()> {
    if node.is_iri() {
        Ok(())
    } else {
        Err(Error::invalid_argument("predicate must be an IRI"))
    }
}

fn check_graph_kind(node: &Node) -> Result<()> {
    if node.is_iri() || node.is_blank() {
        Ok(())
    } else {
        Err(Error::invalid_argument("graph must be an IRI or blank node"))
    }
}

impl PartialEq for Statement {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject
            && self.predicate == other.predicate
            && self.object == other.object
            && self.graph == other.graph
    }
}

impl Eq for Statement {}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show(node: &Option<Node>) -> String {
            node.as_ref().map_or_else(|| "_".to_owned(), ToString::to_string)
        }
        write!(
            f,
            "{} {} {}",
            show(&self.subject),
            show(&self.predicate),
            show(&self.object)
        )?;
        if let Some(g) = &self.graph {
            write!(f, " [{g}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_triple() -> (World, Statement) {
        let world = World::new();
        let s = Node::iri_str(&world, "http://ex/a").unwrap();
        let p = Node::iri_str(&world, "http://ex/p").unwrap();
        let o = Node::plain_literal(&world, "1").unwrap();
        (world.clone(), Statement::from_nodes(s, p, o).unwrap())
    }

    #[test]
    fn matches_wildcard_pattern() {
        let (world, stmt) = world_with_triple();
        let p = Node::iri_str(&world, "http://ex/p").unwrap();
        let mut pattern = Statement::new();
        pattern.set_predicate(p).unwrap();
        assert!(stmt.matches(&pattern));
    }

    #[test]
    fn rejects_bad_subject_kind() {
        let world = World::new();
        let lit = Node::plain_literal(&world, "not a subject").unwrap();
        let p = Node::iri_str(&world, "http://ex/p").unwrap();
        let o = Node::plain_literal(&world, "1").unwrap();
        assert!(Statement::from_nodes(lit, p, o).is_err());
    }

    #[test]
    fn encode_decode_parts_round_trip() {
        let (world, stmt) = world_with_triple();
        let encoded = stmt.encode_parts();
        let decoded = Statement::decode_parts(&world, &encoded).unwrap();
        assert_eq!(stmt, decoded);
    }

    #[test]
    fn encode_decode_partial_pattern() {
        let world = World::new();
        let mut pattern = Statement::new();
        pattern
            .set_predicate(Node::iri_str(&world, "http://ex/p").unwrap())
            .unwrap();
        let encoded = pattern.encode_parts();
        let decoded = Statement::decode_parts(&world, &encoded).unwrap();
        assert_eq!(pattern, decoded);
        assert!(decoded.subject().is_none());
    }
}
