//! Conversions between `rdf_model::Node`/`Statement` and `oxrdf`'s term
//! types, the seam every parser/serializer in this crate crosses.
//!
//! Parsing goes through the owned types (`Subject`/`Term`/`GraphName`)
//! oxttl/oxrdfxml hand back; serializing borrows straight from `Node`'s own
//! interned bytes via the `*Ref` types, since a `Node` is already known
//! well-formed and needs no revalidation.

use oxrdf::{
    BlankNodeRef, GraphName, GraphNameRef, LiteralRef, NamedNodeRef, Subject, SubjectRef, Term,
    TermRef,
};
use rdf_model::{Error, Node, Result, Uri, World};

pub fn subject_to_node(world: &World, subject: Subject) -> Result<Node> {
    match subject {
        Subject::NamedNode(n) => Node::iri_str(world, n.as_str()),
        Subject::BlankNode(b) => Node::blank_str(world, b.as_str()),
        #[allow(unreachable_patterns)]
        _ => Err(Error::invalid_argument(
            "RDF-star quoted-triple subjects are not supported",
        )),
    }
}

pub fn named_node_to_node(world: &World, predicate: NamedNodeRef<'_>) -> Result<Node> {
    Node::iri_str(world, predicate.as_str())
}

pub fn term_to_node(world: &World, term: Term) -> Result<Node> {
    match term {
        Term::NamedNode(n) => Node::iri_str(world, n.as_str()),
        Term::BlankNode(b) => Node::blank_str(world, b.as_str()),
        Term::Literal(l) => {
            let datatype = l.datatype();
            let xsd_string = "http://www.w3.org/2001/XMLSchema#string";
            if let Some(language) = l.language() {
                Node::language_literal(world, l.value(), language)
            } else if datatype.as_str() == xsd_string {
                Node::plain_literal(world, l.value())
            } else {
                Node::literal(world, l.value().as_bytes(), None, Some(datatype.as_str().as_bytes()))
            }
        }
        #[allow(unreachable_patterns)]
        _ => Err(Error::invalid_argument(
            "RDF-star quoted triples are not supported",
        )),
    }
}

pub fn graph_name_to_node(world: &World, graph: GraphName) -> Result<Option<Node>> {
    match graph {
        GraphName::DefaultGraph => Ok(None),
        GraphName::NamedNode(n) => Ok(Some(Node::iri_str(world, n.as_str())?)),
        GraphName::BlankNode(b) => Ok(Some(Node::blank_str(world, b.as_str())?)),
    }
}

pub fn node_to_subject_ref(node: &Node) -> Result<SubjectRef<'_>> {
    match node {
        Node::Iri(uri) => Ok(SubjectRef::NamedNode(NamedNodeRef::new_unchecked(uri.as_str()))),
        Node::Blank(blank) => Ok(SubjectRef::BlankNode(BlankNodeRef::new_unchecked(
            blank.identifier_str(),
        ))),
        Node::Literal(_) => Err(Error::invalid_argument("a literal cannot be a subject")),
    }
}

pub fn node_to_predicate_ref(node: &Node) -> Result<NamedNodeRef<'_>> {
    match node {
        Node::Iri(uri) => Ok(NamedNodeRef::new_unchecked(uri.as_str())),
        _ => Err(Error::invalid_argument("predicate must be an IRI")),
    }
}

pub fn node_to_term_ref(node: &Node) -> Result<TermRef<'_>> {
    match node {
        Node::Iri(uri) => Ok(TermRef::NamedNode(NamedNodeRef::new_unchecked(uri.as_str()))),
        Node::Blank(blank) => Ok(TermRef::BlankNode(BlankNodeRef::new_unchecked(
            blank.identifier_str(),
        ))),
        Node::Literal(literal) => {
            let value = literal.value_str();
            if let Some(language) = literal.language() {
                Ok(TermRef::Literal(LiteralRef::new_language_tagged_literal_unchecked(
                    value, language,
                )))
            } else if let Some(datatype) = literal.datatype() {
                let datatype = std::str::from_utf8(datatype)
                    .map_err(|e| Error::invalid_encoding(e.to_string()))?;
                Ok(TermRef::Literal(LiteralRef::new_typed_literal(
                    value,
                    NamedNodeRef::new_unchecked(datatype),
                )))
            } else {
                Ok(TermRef::Literal(LiteralRef::new_simple_literal(value)))
            }
        }
    }
}

pub fn node_to_graph_name_ref(node: Option<&Node>) -> Result<GraphNameRef<'_>> {
    match node {
        None => Ok(GraphNameRef::DefaultGraph),
        Some(Node::Iri(uri)) => Ok(GraphNameRef::NamedNode(NamedNodeRef::new_unchecked(uri.as_str()))),
        Some(Node::Blank(blank)) => Ok(GraphNameRef::BlankNode(BlankNodeRef::new_unchecked(
            blank.identifier_str(),
        ))),
        Some(Node::Literal(_)) => Err(Error::invalid_argument("a literal cannot be a graph name")),
    }
}

pub fn base_as_str(base: Option<&Uri>) -> Option<&str> {
    base.map(Uri::as_str)
}
