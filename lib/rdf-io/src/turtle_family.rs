//! N-Triples, Turtle and TriG parser/serializer collaborators, wrapping
//! `oxttl`. Grounded on `oxttl`'s `TurtleParser`/`TurtleSerializer` API
//! (`examples/other_examples/.../oxttl-src-turtle.rs`).

use crate::convert::{
    graph_name_to_node, named_node_to_node, node_to_predicate_ref, node_to_subject_ref,
    node_to_term_ref, subject_to_node, term_to_node,
};
use oxrdf::{QuadRef, TripleRef};
use oxttl::{NTriplesParser, NTriplesSerializer, TriGParser, TriGSerializer, TurtleParser, TurtleSerializer};
use rdf_model::log::{Facility, LogMessage, Severity};
use rdf_model::{Error, Statement, Stream};
use rdf_model::stream::VecStatementSource;
use rdf_model::{Result, Uri, World};
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

fn not_loadable_by_uri() -> Error {
    Error::invalid_argument(
        "loading directly from a URI is not supported in this workspace; fetch the resource and call parse_string_into_model",
    )
}

pub struct NTriplesFactory;

impl ParserFactory for NTriplesFactory {
    fn syntax_name(&self) -> &'static str {
        "ntriples"
    }

    fn mime_types(&self) -> &[&'static str] {
        &["application/n-triples", "nt"]
    }

    fn parse_uri_into_model(&self, _world: &World, _uri: &Uri, _base: Option<&Uri>, _model: &mut Model) -> Result<()> {
        Err(not_loadable_by_uri())
    }

    fn parse_string_into_model(&self, world: &World, data: &str, _base: Option<&Uri>, model: &mut Model) -> Result<()> {
        for triple in NTriplesParser::new().for_slice(data.as_bytes()) {
            let triple = triple.map_err(|e| wrap_parse_error(world, e))?;
            let subject = subject_to_node(world, triple.subject)?;
            let predicate = named_node_to_node(world, triple.predicate.as_ref())?;
            let object = term_to_node(world, triple.object)?;
            model.add_statement(&Statement::from_nodes(subject, predicate, object)?)?;
        }
        Ok(())
    }

    fn parse_string_as_stream(&self, world: &World, data: &str, _base: Option<&Uri>) -> Result<Stream> {
        let mut items = Vec::new();
        for triple in NTriplesParser::new().for_slice(data.as_bytes()) {
            let triple = triple.map_err(|e| wrap_parse_error(world, e))?;
            let subject = subject_to_node(world, triple.subject)?;
            let predicate = named_node_to_node(world, triple.predicate.as_ref())?;
            let object = term_to_node(world, triple.object)?;
            items.push((Statement::from_nodes(subject, predicate, object)?, None));
        }
        Ok(Stream::new(Box::new(VecStatementSource::new(items))))
    }
}

impl SerializerFactory for NTriplesFactory {
    fn syntax_name(&self) -> &'static str {
        "ntriples"
    }

    fn serialize_model_to_string(&self, _world: &World, model: &Model, _base: Option<&Uri>) -> Result<String> {
        let mut writer = NTriplesSerializer::new().for_writer(Vec::new());
        for statement in model.find_statements(&Statement::new())?.collect() {
            serialize_triple(&mut writer, &statement)?;
        }
        let bytes = writer.finish().map_err(wrap_serialize_error)?;
        String::from_utf8(bytes).map_err(wrap_serialize_error)
    }

    fn set_namespace(&self, _prefix: &str, _uri: &Uri) -> Result<()> {
        Ok(())
    }
}

fn serialize_triple(
    writer: &mut oxttl::n_triples::WriterNTriplesSerializer<Vec<u8>>,
    statement: &Statement,
) -> Result<()> {
    let subject = node_to_subject_ref(statement.subject().expect("complete statement"))?;
    let predicate = node_to_predicate_ref(statement.predicate().expect("complete statement"))?;
    let object = node_to_term_ref(statement.object().expect("complete statement"))?;
    writer
        .serialize_triple(TripleRef::new(subject, predicate, object))
        .map_err(wrap_serialize_error)
}

pub struct TurtleFactory;

impl ParserFactory for TurtleFactory {
    fn syntax_name(&self) -> &'static str {
        "turtle"
    }

    fn mime_types(&self) -> &[&'static str] {
        &["text/turtle", "ttl"]
    }

    fn parse_uri_into_model(&self, _world: &World, _uri: &Uri, _base: Option<&Uri>, _model: &mut Model) -> Result<()> {
        Err(not_loadable_by_uri())
    }

    fn parse_string_into_model(&self, world: &World, data: &str, base: Option<&Uri>, model: &mut Model) -> Result<()> {
        for triple in with_base(TurtleParser::new(), base)?.for_slice(data.as_bytes()) {
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
        for triple in with_base(TurtleParser::new(), base)?.for_slice(data.as_bytes()) {
            let triple = triple.map_err(|e| wrap_parse_error(world, e))?;
            let subject = subject_to_node(world, triple.subject)?;
            let predicate = named_node_to_node(world, triple.predicate.as_ref())?;
            let object = term_to_node(world, triple.object)?;
            items.push((Statement::from_nodes(subject, predicate, object)?, None));
        }
        Ok(Stream::new(Box::new(VecStatementSource::new(items))))
    }
}

impl SerializerFactory for TurtleFactory {
    fn syntax_name(&self) -> &'static str {
        "turtle"
    }

    fn serialize_model_to_string(&self, _world: &World, model: &Model, _base: Option<&Uri>) -> Result<String> {
        let mut writer = TurtleSerializer::new().for_writer(Vec::new());
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
        Ok(())
    }
}

fn with_base(parser: TurtleParser, base: Option<&Uri>) -> Result<TurtleParser> {
    match base {
        Some(base) => parser
            .with_base_iri(base.as_str())
            .map_err(|e| Error::invalid_argument(e.to_string())),
        None => Ok(parser),
    }
}

/// TriG: Turtle's named-graph superset, handled separately because it
/// yields quads, not triples (spec §4.L "syntaxes with named-graph
/// support").
pub struct TriGFactory;

impl ParserFactory for TriGFactory {
    fn syntax_name(&self) -> &'static str {
        "trig"
    }

    fn mime_types(&self) -> &[&'static str] {
        &["application/trig", "trig"]
    }

    fn parse_uri_into_model(&self, _world: &World, _uri: &Uri, _base: Option<&Uri>, _model: &mut Model) -> Result<()> {
        Err(not_loadable_by_uri())
    }

    fn parse_string_into_model(&self, world: &World, data: &str, base: Option<&Uri>, model: &mut Model) -> Result<()> {
        for quad in with_trig_base(TriGParser::new(), base)?.for_slice(data.as_bytes()) {
            let quad = quad.map_err(|e| wrap_parse_error(world, e))?;
            let subject = subject_to_node(world, quad.subject)?;
            let predicate = named_node_to_node(world, quad.predicate.as_ref())?;
            let object = term_to_node(world, quad.object)?;
            let graph = graph_name_to_node(world, quad.graph_name)?;
            let mut statement = Statement::from_nodes(subject, predicate, object)?;
            if let Some(graph) = graph {
                statement = statement.with_graph(graph)?;
            }
            model.add_statement(&statement)?;
        }
        Ok(())
    }

    fn parse_string_as_stream(&self, world: &World, data: &str, base: Option<&Uri>) -> Result<Stream> {
        let mut items = Vec::new();
        for quad in with_trig_base(TriGParser::new(), base)?.for_slice(data.as_bytes()) {
            let quad = quad.map_err(|e| wrap_parse_error(world, e))?;
            let subject = subject_to_node(world, quad.subject)?;
            let predicate = named_node_to_node(world, quad.predicate.as_ref())?;
            let object = term_to_node(world, quad.object)?;
            let graph = graph_name_to_node(world, quad.graph_name)?;
            let mut statement = Statement::from_nodes(subject, predicate, object)?;
            if let Some(graph) = graph.clone() {
                statement = statement.with_graph(graph)?;
            }
            items.push((statement, graph));
        }
        Ok(Stream::new(Box::new(VecStatementSource::new(items))))
    }
}

fn with_trig_base(parser: TriGParser, base: Option<&Uri>) -> Result<TriGParser> {
    match base {
        Some(base) => parser
            .with_base_iri(base.as_str())
            .map_err(|e| Error::invalid_argument(e.to_string())),
        None => Ok(parser),
    }
}

impl SerializerFactory for TriGFactory {
    fn syntax_name(&self) -> &'static str {
        "trig"
    }

    fn serialize_model_to_string(&self, _world: &World, model: &Model, _base: Option<&Uri>) -> Result<String> {
        let mut writer = TriGSerializer::new().for_writer(Vec::new());
        for graph in model.contexts()? {
            let graph_ref = crate::convert::node_to_graph_name_ref(Some(&graph))?;
            for statement in model.serialize_context(&graph)?.collect() {
                let subject = node_to_subject_ref(statement.subject().expect("complete statement"))?;
                let predicate = node_to_predicate_ref(statement.predicate().expect("complete statement"))?;
                let object = node_to_term_ref(statement.object().expect("complete statement"))?;
                writer
                    .serialize_quad(QuadRef::new(subject, predicate, object, graph_ref))
                    .map_err(wrap_serialize_error)?;
            }
        }
        let bytes = writer.finish().map_err(wrap_serialize_error)?;
        String::from_utf8(bytes).map_err(wrap_serialize_error)
    }

    fn set_namespace(&self, _prefix: &str, _uri: &Uri) -> Result<()> {
        Ok(())
    }
}
