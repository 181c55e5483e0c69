//! Collaborator contracts for the parser, serializer and query shims
//! (spec §4.L, §4.M): the interfaces `Model` calls through, and the
//! name-keyed registries that back `World`'s factory lookup. Concrete
//! implementations live above this crate (`rdf-io`, `rdf-query`), which
//! register themselves here at construction time — kept in this crate,
//! not theirs, because `Model` needs to call through them without a
//! dependency cycle.

use crate::model::Model;
use rdf_model::{Error, Node, Result, Stream, Uri, World};
use std::io::Write;
use std::sync::{Arc, Mutex};

/// A registered syntax parser (spec §4.L). `rdf-io` implements this for
/// N-Triples/Turtle/TriG (via `oxttl`) and RDF/XML (via `oxrdfxml`).
pub trait ParserFactory: Send + Sync {
    fn syntax_name(&self) -> &'static str;

    /// MIME types and file extensions this parser should be guessed for.
    fn mime_types(&self) -> &[&'static str] {
        &[]
    }

    fn parse_uri_into_model(
        &self,
        world: &World,
        uri: &Uri,
        base: Option<&Uri>,
        model: &mut Model,
    ) -> Result<()>;

    fn parse_string_into_model(
        &self,
        world: &World,
        data: &str,
        base: Option<&Uri>,
        model: &mut Model,
    ) -> Result<()>;

    fn parse_string_as_stream(&self, world: &World, data: &str, base: Option<&Uri>) -> Result<Stream>;

    /// Parses from a URI straight into a `Stream`, without a sink model
    /// (spec §4.L "parse-URI-as-stream"). None of the syntax collaborators
    /// this workspace ships fetch URIs themselves (out of scope per §1), so
    /// the default reports that and points the caller at
    /// `parse_string_as_stream`; a collaborator with real URI-fetching
    /// support overrides this.
    fn parse_uri_as_stream(&self, _world: &World, _uri: &Uri, _base: Option<&Uri>) -> Result<Stream> {
        Err(Error::invalid_argument(
            "loading directly from a URI is not supported in this workspace; fetch the resource and call parse_string_as_stream",
        ))
    }
}

#[derive(Default)]
pub struct ParserRegistry {
    entries: Mutex<Vec<(String, Arc<dyn ParserFactory>)>>,
}

impl ParserRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, parser: Arc<dyn ParserFactory>) {
        let mut entries = self.entries.lock().unwrap();
        entries.push((parser.syntax_name().to_owned(), Arc::clone(&parser)));
        for mime in parser.mime_types() {
            entries.push(((*mime).to_owned(), Arc::clone(&parser)));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ParserFactory>> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, p)| Arc::clone(p))
    }

    /// Picks a registered parser from a URI or MIME hint, falling back to
    /// the file extension (spec §4.L "guess parser").
    #[must_use]
    pub fn guess(&self, uri_or_mime: &str) -> Option<Arc<dyn ParserFactory>> {
        if let Some(p) = self.get(uri_or_mime) {
            return Some(p);
        }
        let ext = uri_or_mime.rsplit('.').next()?;
        self.get(ext)
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }
}

/// A registered syntax serializer (spec §4.M): serialize-model-to-{file-
/// handle, counted-string, byte-stream}, serialize-stream-to-{same}, plus
/// namespace-prefix registration and per-feature get/set (feature keys are
/// URIs). Only `serialize_model_to_string` (the "counted-string" form — a
/// Rust `String` already carries its own length) and `set_namespace` vary
/// per concrete syntax; the other forms have a sensible default built on
/// top of it, so `rdf-io`'s N-Triples/Turtle/TriG/RDF-XML collaborators
/// need not repeat them.
pub trait SerializerFactory: Send + Sync {
    fn syntax_name(&self) -> &'static str;

    fn serialize_model_to_string(
        &self,
        world: &World,
        model: &Model,
        base: Option<&Uri>,
    ) -> Result<String>;

    /// Serialize-model-to-byte-stream.
    fn serialize_model_to_bytes(
        &self,
        world: &World,
        model: &Model,
        base: Option<&Uri>,
    ) -> Result<Vec<u8>> {
        Ok(self.serialize_model_to_string(world, model, base)?.into_bytes())
    }

    /// Serialize-model-to-file-handle: writes into any `Write` sink (an
    /// open file, a socket, an in-memory buffer).
    fn serialize_model_to_writer(
        &self,
        world: &World,
        model: &Model,
        base: Option<&Uri>,
        writer: &mut dyn Write,
    ) -> Result<()> {
        let bytes = self.serialize_model_to_bytes(world, model, base)?;
        writer
            .write_all(&bytes)
            .map_err(|e| Error::serialize_error(e.to_string()))
    }

    /// Serializes an already-materialized statement stream rather than a
    /// whole model (spec §4.M "serialize-stream-to-*"). The default drains
    /// `stream` into a scratch in-memory model (merging each item's stream
    /// context into its statement's own graph field when the statement
    /// didn't already carry one) and delegates to
    /// `serialize_model_to_string`.
    fn serialize_stream_to_string(
        &self,
        world: &World,
        stream: Stream,
        base: Option<&Uri>,
    ) -> Result<String> {
        let model = model_from_stream(world, stream)?;
        self.serialize_model_to_string(world, &model, base)
    }

    fn serialize_stream_to_bytes(
        &self,
        world: &World,
        stream: Stream,
        base: Option<&Uri>,
    ) -> Result<Vec<u8>> {
        Ok(self
            .serialize_stream_to_string(world, stream, base)?
            .into_bytes())
    }

    fn serialize_stream_to_writer(
        &self,
        world: &World,
        stream: Stream,
        base: Option<&Uri>,
        writer: &mut dyn Write,
    ) -> Result<()> {
        let bytes = self.serialize_stream_to_bytes(world, stream, base)?;
        writer
            .write_all(&bytes)
            .map_err(|e| Error::serialize_error(e.to_string()))
    }

    fn set_namespace(&self, prefix: &str, uri: &Uri) -> Result<()>;

    /// Reads a serializer feature, keyed by a feature URI (spec §4.M). The
    /// default has no features: `None` unconditionally.
    fn get_feature(&self, _feature: &Uri) -> Option<String> {
        None
    }

    /// Sets a serializer feature, keyed by a feature URI (spec §4.M). The
    /// default silently accepts and ignores every feature, matching
    /// `set_namespace`'s no-op posture in collaborators with no live
    /// builder to reconfigure after construction.
    fn set_feature(&self, _feature: &Uri, _value: &str) -> Result<()> {
        Ok(())
    }
}

/// Drains `stream` into a scratch `MemoryStorage`-backed model, used by the
/// default `serialize_stream_to_string` (spec §4.M).
fn model_from_stream(world: &World, mut stream: Stream) -> Result<Model> {
    let mut model = Model::new(world.clone(), Box::new(crate::memory::MemoryStorage::new()));
    while !stream.end() {
        if let Some(statement) = stream.current().cloned() {
            let statement = match (statement.graph(), stream.current_context()) {
                (None, Some(context)) => statement.with_graph(context.clone())?,
                _ => statement,
            };
            model.add_statement(&statement)?;
        }
        stream.next();
    }
    Ok(model)
}

#[derive(Default)]
pub struct SerializerRegistry {
    entries: Mutex<Vec<(String, Arc<dyn SerializerFactory>)>>,
}

impl SerializerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, serializer: Arc<dyn SerializerFactory>) {
        self.entries
            .lock()
            .unwrap()
            .push((serializer.syntax_name().to_owned(), serializer));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn SerializerFactory>> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, s)| Arc::clone(s))
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }
}

/// A parsed query, ready to execute against a `Model` (spec §4.M).
#[derive(Debug, Clone)]
pub struct Query {
    pub language: String,
    pub text: String,
    pub base_uri: Option<Uri>,
}

/// One solution row of a bindings-shaped query result.
pub type Binding = Vec<(String, Option<Node>)>;

/// The shape a query's results take (spec §4.M): a bindings table, a
/// boolean (ASK), or a graph (CONSTRUCT/DESCRIBE).
pub enum Results {
    Bindings {
        variables: Vec<String>,
        rows: Vec<Binding>,
    },
    Boolean(bool),
    Graph(Stream),
}

impl Results {
    /// Applies LIMIT/OFFSET to a bindings result (a no-op on the other
    /// shapes), per spec §4.M.
    #[must_use]
    pub fn with_limit_offset(self, limit: Option<usize>, offset: usize) -> Self {
        match self {
            Self::Bindings { variables, rows } => {
                let rows = rows.into_iter().skip(offset);
                let rows = match limit {
                    Some(limit) => rows.take(limit).collect(),
                    None => rows.collect(),
                };
                Self::Bindings { variables, rows }
            }
            other => other,
        }
    }
}

/// A registered query language (spec §4.M).
pub trait QueryFactory: Send + Sync {
    fn language_name(&self) -> &'static str;

    fn parse(&self, text: &str, base_uri: Option<&Uri>) -> Result<Query>;

    fn execute(&self, world: &World, model: &Model, query: &Query) -> Result<Results>;
}

#[derive(Default)]
pub struct QueryRegistry {
    entries: Mutex<Vec<(String, Arc<dyn QueryFactory>)>>,
}

impl QueryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, query: Arc<dyn QueryFactory>) {
        self.entries
            .lock()
            .unwrap()
            .push((query.language_name().to_owned(), query));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn QueryFactory>> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, q)| Arc::clone(q))
    }
}

/// Fetches the singleton registry of kind `T` from `world`, creating and
/// registering it on first use. Factory registration is append-only and
/// rejects a second registration under the same name (spec §4.A); this
/// tolerates that race by falling back to whatever the winner registered.
pub(crate) fn registry<T: Default + Send + Sync + 'static>(world: &World, name: &'static str) -> Arc<T> {
    if let Some(existing) = world.factory::<T>("registry", name) {
        return existing;
    }
    let created = Arc::new(T::default());
    match world.register_factory("registry", name, Arc::clone(&created)) {
        Ok(()) => created,
        Err(_) => world
            .factory::<T>("registry", name)
            .unwrap_or(created),
    }
}

pub fn parser_registry(world: &World) -> Arc<ParserRegistry> {
    registry(world, "parser")
}

pub fn serializer_registry(world: &World) -> Arc<SerializerRegistry> {
    registry(world, "serializer")
}

pub fn query_registry(world: &World) -> Arc<QueryRegistry> {
    registry(world, "query")
}

pub(crate) fn not_found(kind: &str, name: &str) -> Error {
    Error::not_found(format!("no {kind} factory named '{name}' is registered"))
}
