//! RDF/XML parser/serializer collaborator, wrapping `oxrdfxml`. Grounded on
//! `oxrdfxml`'s `RdfXmlSerializer` API
//! (`examples/other_examples/.../oxrdfxml-src-serializer.rs`).

use crate::convert::{
    named_node_to_node, node_to_predicate_ref, node_to_subject_ref, node_to_term_ref,
    subject_to_node, term_to_node,
};
use oxrdf::TripleRef;
use oxrdfxml::{RdfXmlParser, RdfXmlSerializer};
use rdf_model::log::{Facility, LogMessage, Severity};
use rdf_model::stream::VecStatementSource;
use rdf_model::{Error, Result, Statement, Stream, Uri, World};
use rdf_store::{Model, ParserFactory, SerializerFactory};

/// Wraps a parser error, also forwarding it through the world's log sink
/// with a best-effort locator (spec §4.L "forward warning/error lines").
fn wrap_parse_error(world: &World, err: impl std::fmt::Display) -> Error {
    let message = err.to_string();
    world.log(LogMessage {
        severity: Severity::Error,
        facility: Facility::Parser,
        code: 0,
        message: message.clone(),
        locator: None,
    });
    Error::parse_error(message)
}

fn wrap_serialize_error(err: impl std::fmt::Display) -> Error {
    Error::SerializeError(err.to_string())
}

pub struct RdfXmlFactory;

impl ParserFactory for RdfXmlFactory {
    fn syntax_name(&self) -> &'static str {
        "rdfxml"
    }

    fn mime_types(&self) -> &[&'static str] {
        &["application/rdf+xml", "rdf"]
    }

    fn parse_uri_into_model(&self, _world: &World, _uri: &Uri, _base: Option<&Uri>, _model: &mut Model) -> Result<()> {
        Err(Error::invalid_argument(
            "loading directly from a URI is not supported in this workspace; fetch the resource and call parse_string_into_model",
        ))
    }

    fn parse_string_into_model(&self, world: &World, data: &str, base: Option<&Uri>, model: &mut Model) -> Result<()> {
        for triple in with_base(RdfXmlParser::new(), base)?.for_slice(data.as_bytes()) {
            let triple = triple.map_err(|e| wrap_parse_error(world, e))?;
            let subject = subject_to_node(world, triple.subject)?;
            let predicate = named_node_to_node(world, triple.predicate.as_ref())?;
            let object = term_to_node(world, triple.object)?;
            model.add_statement(&Statement::from_nodes(subject, predicate, object)?)?;
        }
        Ok(())
    }

    fn parse_string_as_stream(&self, world: &World, data: &str, base: Option<&Uri>) -> Result<Stream> {
        let mut items = Vec::new();
        for triple in with_base(RdfXmlParser::new(), base)?.for_slice(data.as_bytes()) {
            let triple = triple.map_err(|e| wrap_parse_error(world, e))?;
            let subject = subject_to_node(world, triple.subject)?;
            let predicate = named_node_to_node(world, triple.predicate.as_ref())?;
            let object = term_to_node(world, triple.object)?;
            items.push((Statement::from_nodes(subject, predicate, object)?, None));
        }
        Ok(Stream::new(Box::new(VecStatementSource::new(items))))
    }
}

fn with_base(parser: RdfXmlParser, base: Option<&Uri>) -> Result<RdfXmlParser> {
    match base {
        Some(base) => parser
            .with_base_iri(base.as_str())
            .map_err(|e| Error::invalid_argument(e.to_string())),
        None => Ok(parser),
    }
}

impl SerializerFactory for RdfXmlFactory {
    fn syntax_name(&self) -> &'static str {
        "rdfxml"
    }

    fn serialize_model_to_string(&self, _world: &World, model: &Model, _base: Option<&Uri>) -> Result<String> {
        let mut writer = RdfXmlSerializer::new().for_writer(Vec::new());
        for statement in model.find_statements(&Statement::new())?.collect() {
            let subject = node_to_subject_ref(statement.subject().expect("complete statement"))?;
            let predicate = node_to_predicate_ref(statement.predicate().expect("complete statement"))?;
            let object = node_to_term_ref(statement.object().expect("complete statement"))?;
            writer
                .serialize_triple(TripleRef::new(subject, predicate, object))
                .map_err(wrap_serialize_error)?;
        }
        let bytes = writer.finish().map_err(wrap_serialize_error)?;
        String::from_utf8(bytes).map_err(wrap_serialize_error)
    }

    fn set_namespace(&self, _prefix: &str, _uri: &Uri) -> Result<()> {
        // RDF/XML prefixes are fixed at serializer-construction time in
        // `oxrdfxml`; this shim has no live builder to extend after
        // `RdfXmlSerializer::new()`, so a late `set_namespace` is a no-op.
        Ok(())
    }
}
