//! Model (spec §4.K): the statement-level API above a `Storage`, with
//! submodel chaining for read-only composition and delegation out to the
//! parser/serializer/query collaborators. Grounded on `librdf_model`
//! (`original_source/librdf/rdf_model.c`), whose "co_context" sub-model
//! chain this mirrors.

use crate::shims::{
    parser_registry, query_registry, serializer_registry, ParserRegistry, Query, QueryFactory,
    Results, SerializerRegistry,
};
use rdf_model::{Error, List, Node, Result, Statement, Stream, Uri, World};

use crate::storage::Storage;

/// The statement-level API above a pluggable `Storage`. Writes always go
/// to this model's own storage, never to a submodel; reads (find,
/// has-arc, contexts) merge this model's storage with every submodel's, in
/// registration order, this model first (spec §4.K).
pub struct Model {
    world: World,
    storage: Box<dyn Storage>,
    submodels: List<Model>,
}

impl Model {
    #[must_use]
    pub fn new(world: World, storage: Box<dyn Storage>) -> Self {
        Self {
            world,
            storage,
            submodels: List::new(),
        }
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Adds a read-only submodel consulted by find/has-arc/contexts after
    /// this model's own storage. Removing a statement that exists only in
    /// a submodel is a no-op reported via the return value, not an error
    /// (spec §4.K), since writes never reach submodels.
    pub fn add_submodel(&mut self, submodel: Model) {
        self.submodels.push_back(submodel);
    }

    pub fn add_statement(&mut self, statement: &Statement) -> Result<bool> {
        if !statement.is_complete() {
            return Err(Error::invalid_argument(
                "add-statement requires subject, predicate and object to be set",
            ));
        }
        self.storage.add_statement(statement)
    }

    pub fn remove_statement(&mut self, statement: &Statement) -> Result<bool> {
        self.storage.remove_statement(statement)
    }

    /// A plain-literal-object convenience constructor (spec §4.K
    /// "typed-literal convenience constructors").
    pub fn add_plain_literal_statement(
        &mut self,
        subject: Node,
        predicate: Node,
        value: &str,
    ) -> Result<bool> {
        let object = Node::plain_literal(&self.world, value)?;
        self.add_statement(&Statement::from_nodes(subject, predicate, object)?)
    }

    pub fn add_typed_literal_statement(
        &mut self,
        subject: Node,
        predicate: Node,
        value: &str,
        datatype: &Uri,
    ) -> Result<bool> {
        let object = Node::typed_literal(&self.world, value, datatype)?;
        self.add_statement(&Statement::from_nodes(subject, predicate, object)?)
    }

    pub fn add_language_literal_statement(
        &mut self,
        subject: Node,
        predicate: Node,
        value: &str,
        language: &str,
    ) -> Result<bool> {
        let object = Node::language_literal(&self.world, value, language)?;
        self.add_statement(&Statement::from_nodes(subject, predicate, object)?)
    }

    pub fn add_iri_statement(
        &mut self,
        subject: Node,
        predicate: Node,
        object_uri: &str,
    ) -> Result<bool> {
        let object = Node::iri_str(&self.world, object_uri)?;
        self.add_statement(&Statement::from_nodes(subject, predicate, object)?)
    }

    /// Merged find-statements: this model's own matches, followed by each
    /// submodel's, in registration order (spec §4.K).
    pub fn find_statements(&self, pattern: &Statement) -> Result<Stream> {
        let mut merged: Vec<(Statement, Option<Node>)> = Vec::new();
        collect_stream(self.storage.find_statements(&self.world, pattern)?, &mut merged);
        for submodel in self.submodels.iter() {
            collect_stream(submodel.find_statements(pattern)?, &mut merged);
        }
        Ok(Stream::new(Box::new(
            rdf_model::stream::VecStatementSource::new(merged),
        )))
    }

    pub fn has_arc_out(&self, subject: &Node, property: &Node) -> Result<bool> {
        if self.storage.has_arc_out(&self.world, subject, property)? {
            return Ok(true);
        }
        for submodel in self.submodels.iter() {
            if submodel.has_arc_out(subject, property)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn has_arc_in(&self, object: &Node, property: &Node) -> Result<bool> {
        if self.storage.has_arc_in(&self.world, object, property)? {
            return Ok(true);
        }
        for submodel in self.submodels.iter() {
            if submodel.has_arc_in(object, property)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn contexts(&self) -> Result<Vec<Node>> {
        let mut out = self.storage.contexts(&self.world)?;
        for submodel in self.submodels.iter() {
            for graph in submodel.contexts()? {
                if !out.contains(&graph) {
                    out.push(graph);
                }
            }
        }
        Ok(out)
    }

    pub fn serialize_context(&self, graph: &Node) -> Result<Stream> {
        self.storage.serialize_context(&self.world, graph)
    }

    pub fn remove_context(&mut self, graph: &Node) -> Result<usize> {
        self.storage.remove_context(&self.world, graph)
    }

    /// This model's own statement count (submodels are not merged into it,
    /// matching `librdf_model_size`'s documented "own storage only"
    /// behavior when submodels are attached).
    pub fn size(&self) -> Result<usize> {
        self.storage.size()
    }

    pub fn sync(&mut self) -> Result<()> {
        self.storage.sync()
    }

    /// Delegates to the parser collaborator registered under `syntax_name`
    /// (spec §4.K "load-from-URI"), with this model as the sink.
    pub fn load_from_uri(&mut self, syntax_name: &str, uri: &Uri, base: Option<&Uri>) -> Result<()> {
        let registry = parser_registry(&self.world);
        let parser = registry
            .get(syntax_name)
            .ok_or_else(|| crate::shims::not_found("parser", syntax_name))?;
        let world = self.world.clone();
        parser.parse_uri_into_model(&world, uri, base, self)
    }

    pub fn load_from_string(&mut self, syntax_name: &str, data: &str, base: Option<&Uri>) -> Result<()> {
        let registry = parser_registry(&self.world);
        let parser = registry
            .get(syntax_name)
            .ok_or_else(|| crate::shims::not_found("parser", syntax_name))?;
        let world = self.world.clone();
        parser.parse_string_into_model(&world, data, base, self)
    }

    /// Delegates to the serializer collaborator registered under
    /// `syntax_name` (spec §4.K "to-string delegation").
    pub fn to_string_as(&self, syntax_name: &str, base: Option<&Uri>) -> Result<String> {
        let registry = serializer_registry(&self.world);
        let serializer = registry
            .get(syntax_name)
            .ok_or_else(|| crate::shims::not_found("serializer", syntax_name))?;
        serializer.serialize_model_to_string(&self.world, self, base)
    }

    /// Delegates to the query collaborator registered under `language`
    /// (spec §4.K "query execute delegation").
    pub fn query_execute(&self, language: &str, text: &str, base: Option<&Uri>) -> Result<Results> {
        let registry = query_registry(&self.world);
        let factory = registry
            .get(language)
            .ok_or_else(|| crate::shims::not_found("query", language))?;
        let query = factory.parse(text, base)?;
        factory.execute(&self.world, self, &query)
    }

    #[must_use]
    pub fn parser_names(&self) -> Vec<String> {
        parser_registry(&self.world).names()
    }

    #[must_use]
    pub fn serializer_names(&self) -> Vec<String> {
        serializer_registry(&self.world).names()
    }
}

fn collect_stream(mut stream: Stream, out: &mut Vec<(Statement, Option<Node>)>) {
    while !stream.end() {
        if let Some(statement) = stream.current() {
            out.push((statement.clone(), stream.current_context().cloned()));
        }
        stream.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashes::HashesStorage;
    use crate::memory::MemoryStorage;
    use crate::options::StorageOptions;

    fn triple(world: &World, s: &str, p: &str, o: &str) -> Statement {
        let subject = Node::iri_str(world, s).unwrap();
        let predicate = Node::iri_str(world, p).unwrap();
        let object = Node::plain_literal(world, o).unwrap();
        Statement::from_nodes(subject, predicate, object).unwrap()
    }

    #[test]
    fn add_and_find_round_trip() {
        let world = World::new();
        let mut model = Model::new(
            world.clone(),
            Box::new(HashesStorage::open("t", &StorageOptions::memory()).unwrap()),
        );
        let t = triple(&world, "http://ex/a", "http://ex/p", "1");
        assert!(model.add_statement(&t).unwrap());
        assert_eq!(model.size().unwrap(), 1);
        assert_eq!(model.find_statements(&Statement::new()).unwrap().collect(), vec![t]);
    }

    #[test]
    fn submodel_reads_are_merged_but_writes_are_not() {
        let world = World::new();
        let mut parent = Model::new(world.clone(), Box::new(MemoryStorage::new()));
        let mut child = Model::new(world.clone(), Box::new(MemoryStorage::new()));
        let t_parent = triple(&world, "http://ex/a", "http://ex/p", "1");
        let t_child = triple(&world, "http://ex/b", "http://ex/p", "2");
        parent.add_statement(&t_parent).unwrap();
        child.add_statement(&t_child).unwrap();
        parent.add_submodel(child);

        let found = parent.find_statements(&Statement::new()).unwrap().collect();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&t_parent));
        assert!(found.contains(&t_child));

        // Removing a statement that only lives in the submodel is a no-op,
        // not an error.
        assert!(!parent.remove_statement(&t_child).unwrap());
        assert_eq!(parent.size().unwrap(), 1);
    }

    #[test]
    fn missing_collaborator_is_not_found() {
        let world = World::new();
        let mut model = Model::new(world.clone(), Box::new(MemoryStorage::new()));
        let err = model
            .load_from_string("turtle", "<a> <b> <c> .", None)
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
