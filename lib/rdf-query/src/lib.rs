//! SPARQL query shim (spec §4.M): a `QueryFactory` registered under the
//! name `"sparql"`, wrapping `spargebra` for parsing and a small bundled
//! evaluator for execution, plus a `sparesults`-backed row formatter.
//!
//! Per spec §1, the query *engine* is out of scope for this core — it is
//! "consumed via a query-language factory interface returning a result
//! object." The evaluator in [`eval`] is the minimal default this
//! workspace ships so the factory has something real behind it rather
//! than a stub; it covers basic graph patterns (BGP joins, UNION,
//! FILTER, GRAPH, ORDER BY, DISTINCT/REDUCED, LIMIT/OFFSET, SELECT
//! projection, plus CONSTRUCT/DESCRIBE/ASK) and returns `QueryError` for
//! algebra it does not implement (property paths, aggregation, MINUS,
//! SERVICE, VALUES) rather than guessing at a result.

mod eval;
pub mod format;

use std::sync::Arc;

use rdf_model::{Error, Result, Uri, World};
use rdf_store::{query_registry, Model, Query, QueryFactory, Results};

/// Registers [`SparqlFactory`] against `world`'s query registry.
pub fn register_all(world: &World) {
    query_registry(world).register(Arc::new(SparqlFactory));
}

/// Registers the `"sparql"` query factory described above.
pub struct SparqlFactory;

impl QueryFactory for SparqlFactory {
    fn language_name(&self) -> &'static str {
        "sparql"
    }

    fn parse(&self, text: &str, base_uri: Option<&Uri>) -> Result<Query> {
        let base = base_uri.map(Uri::as_str);
        spargebra::Query::parse(text, base).map_err(|e| Error::query_error(e.to_string()))?;
        Ok(Query {
            language: self.language_name().to_owned(),
            text: text.to_owned(),
            base_uri: base_uri.cloned(),
        })
    }

    fn execute(&self, world: &World, model: &Model, query: &Query) -> Result<Results> {
        let base = query.base_uri.as_ref().map(Uri::as_str);
        let parsed =
            spargebra::Query::parse(&query.text, base).map_err(|e| Error::query_error(e.to_string()))?;
        eval::execute(world, model, &parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_model::{Node, Statement};

    fn world_with_two_triples() -> (World, Model) {
        let world = World::new();
        let mut model = Model::new(world.clone(), Box::new(rdf_store::MemoryStorage::new()));
        let a = Node::iri_str(&world, "http://ex/a").unwrap();
        let b = Node::iri_str(&world, "http://ex/b").unwrap();
        let p = Node::iri_str(&world, "http://ex/p").unwrap();
        model
            .add_statement(&Statement::from_nodes(a, p.clone(), Node::plain_literal(&world, "1").unwrap()).unwrap())
            .unwrap();
        model
            .add_statement(&Statement::from_nodes(b, p, Node::plain_literal(&world, "2").unwrap()).unwrap())
            .unwrap();
        (world, model)
    }

    #[test]
    fn select_star_bgp_returns_all_bindings() {
        let (world, model) = world_with_two_triples();
        let factory = SparqlFactory;
        let query = factory
            .parse("SELECT * WHERE { ?s <http://ex/p> ?o }", None)
            .unwrap();
        let results = factory.execute(&world, &model, &query).unwrap();
        match results {
            Results::Bindings { variables, rows } => {
                assert_eq!(variables.len(), 2);
                assert_eq!(rows.len(), 2);
            }
            _ => panic!("expected bindings"),
        }
    }

    #[test]
    fn ask_reports_existence() {
        let (world, model) = world_with_two_triples();
        let factory = SparqlFactory;
        let query = factory
            .parse("ASK { ?s <http://ex/p> \"1\" }", None)
            .unwrap();
        match factory.execute(&world, &model, &query).unwrap() {
            Results::Boolean(found) => assert!(found),
            _ => panic!("expected boolean"),
        }
    }

    #[test]
    fn unsupported_algebra_is_a_query_error() {
        let (world, model) = world_with_two_triples();
        let factory = SparqlFactory;
        let query = factory
            .parse("SELECT ?s WHERE { ?s <http://ex/p>* ?o }", None)
            .unwrap();
        assert!(factory.execute(&world, &model, &query).is_err());
    }
}
