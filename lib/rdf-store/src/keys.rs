//! Composite index-key encoding for the hashes storage backend (spec §4.I).
//!
//! Every index key is the concatenation of two node encodings (`S‖P`,
//! `P‖O`, `O‖S`); every contexts-index value is three (`S‖P‖O`). Each
//! `Node::encode` is self-delimiting, so concatenation needs no extra
//! framing, and [`rdf_model::Node::decode_prefix`] is how a composite key is
//! split back into its parts.

use rdf_model::{Node, Result, Statement, World};

pub fn concat2(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

pub fn concat3(a: &[u8], b: &[u8], c: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len() + b.len() + c.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out.extend_from_slice(c);
    out
}

/// Splits a two-node composite key/value back into its parts.
pub fn decode2(world: &World, bytes: &[u8]) -> Result<(Node, Node)> {
    let (a, len) = Node::decode_prefix(world, bytes)?;
    let b = Node::decode(world, &bytes[len..])?;
    Ok((a, b))
}

/// Splits a three-node composite value back into its parts.
pub fn decode3(world: &World, bytes: &[u8]) -> Result<(Node, Node, Node)> {
    let (a, len1) = Node::decode_prefix(world, bytes)?;
    let (b, len2) = Node::decode_prefix(world, &bytes[len1..])?;
    let c = Node::decode(world, &bytes[len1 + len2..])?;
    Ok((a, b, c))
}

/// Rebuilds a full statement from an `SPO` row: key is `S‖P`, value is `O`.
pub fn statement_from_spo(world: &World, key: &[u8], value: &[u8]) -> Result<Statement> {
    let (s, p) = decode2(world, key)?;
    let o = Node::decode(world, value)?;
    Statement::from_nodes(s, p, o)
}

/// Rebuilds a full statement from a `POS` row: key is `P‖O`, value is `S`.
pub fn statement_from_pos(world: &World, key: &[u8], value: &[u8]) -> Result<Statement> {
    let (p, o) = decode2(world, key)?;
    let s = Node::decode(world, value)?;
    Statement::from_nodes(s, p, o)
}

/// Rebuilds a full statement from an `OSP` row: key is `O‖S`, value is `P`.
pub fn statement_from_osp(world: &World, key: &[u8], value: &[u8]) -> Result<Statement> {
    let (o, s) = decode2(world, key)?;
    let p = Node::decode(world, value)?;
    Statement::from_nodes(s, p, o)
}

/// Rebuilds a full statement from a contexts-index value: `S‖P‖O`.
pub fn statement_from_spo_bytes(world: &World, value: &[u8]) -> Result<Statement> {
    let (s, p, o) = decode3(world, value)?;
    Statement::from_nodes(s, p, o)
}
