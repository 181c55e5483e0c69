//! Renders a bindings result to one of the SPARQL results syntaxes (spec
//! §4.M "a formatter that renders rows to one of several syntaxes"), via
//! `sparesults`.

use oxrdf::{BlankNode, Literal as OxLiteral, NamedNode, Term, TermRef, Variable as OxVariable, VariableRef};
use rdf_model::{Error, Node, Result};
use rdf_store::Binding;
use sparesults::{QueryResultsFormat, QueryResultsSerializer};

/// Serializes a bindings table to bytes in the requested SPARQL results
/// format (JSON/XML/CSV/TSV).
pub fn format_bindings(format: QueryResultsFormat, variables: &[String], rows: &[Binding]) -> Result<Vec<u8>> {
    let var_refs: Vec<OxVariable> = variables
        .iter()
        .map(|name| OxVariable::new(name.clone()).map_err(|e| Error::query_error(e.to_string())))
        .collect::<Result<_>>()?;

    let serializer = QueryResultsSerializer::from_format(format);
    let mut writer = serializer
        .serialize_solutions_to_writer(Vec::new(), var_refs)
        .map_err(|e| Error::query_error(e.to_string()))?;

    for row in rows {
        let mut solution = Vec::new();
        for (name, node) in row {
            if let Some(node) = node {
                let term = node_to_term(node)?;
                solution.push((VariableRef::new_unchecked(name.as_str()), TermRef::from(&term)));
            }
        }
        writer.write(solution).map_err(|e| Error::query_error(e.to_string()))?;
    }
    writer.finish().map_err(|e| Error::query_error(e.to_string()))
}

/// Serializes an ASK query's boolean result.
pub fn format_boolean(format: QueryResultsFormat, value: bool) -> Result<Vec<u8>> {
    let serializer = QueryResultsSerializer::from_format(format);
    serializer
        .serialize_boolean_to_writer(Vec::new(), value)
        .map_err(|e| Error::query_error(e.to_string()))
}

fn node_to_term(node: &Node) -> Result<Term> {
    match node {
        Node::Iri(uri) => Ok(Term::NamedNode(
            NamedNode::new(uri.as_str()).map_err(|e| Error::invalid_encoding(e.to_string()))?,
        )),
        Node::Blank(blank) => Ok(Term::BlankNode(BlankNode::new(blank.identifier_str())
            .map_err(|e| Error::invalid_encoding(e.to_string()))?)),
        Node::Literal(literal) => {
            let value = literal.value_str();
            let term = if let Some(language) = literal.language() {
                OxLiteral::new_language_tagged_literal(value, language)
                    .map_err(|e| Error::invalid_encoding(e.to_string()))?
            } else if let Some(datatype) = literal.datatype() {
                let datatype = std::str::from_utf8(datatype).map_err(|e| Error::invalid_encoding(e.to_string()))?;
                OxLiteral::new_typed_literal(
                    value,
                    NamedNode::new(datatype).map_err(|e| Error::invalid_encoding(e.to_string()))?,
                )
            } else {
                OxLiteral::new_simple_literal(value)
            };
            Ok(Term::Literal(term))
        }
    }
}
