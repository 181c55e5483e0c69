//! The plain in-memory `Storage` backend (spec §4.J): an unindexed
//! append-only list of statements, searched by linear scan. Grounded on
//! `librdf_storage_list` (`original_source/librdf/rdf_storage_list.c`),
//! the simplest of the original storage modules — no indexes, used for
//! small graphs or as a scratch model.

use crate::storage::Storage;
use rdf_model::stream::VecStatementSource;
use rdf_model::{Node, Result, Statement, Stream, World};

#[derive(Default)]
pub struct MemoryStorage {
    rows: Vec<Statement>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn add_statement(&mut self, statement: &Statement) -> Result<bool> {
        if self.rows.iter().any(|row| row == statement) {
            return Ok(false);
        }
        self.rows.push(statement.clone());
        Ok(true)
    }

    fn remove_statement(&mut self, statement: &Statement) -> Result<bool> {
        if let Some(pos) = self.rows.iter().position(|row| row == statement) {
            self.rows.remove(pos);
            return Ok(true);
        }
        Ok(false)
    }

    fn find_statements(&self, _world: &World, pattern: &Statement) -> Result<Stream> {
        let items = self
            .rows
            .iter()
            .filter(|row| row.matches(pattern))
            .map(|row| (row.clone(), row.graph().cloned()))
            .collect();
        Ok(Stream::new(Box::new(VecStatementSource::new(items))))
    }

    fn has_arc_out(&self, _world: &World, subject: &Node, property: &Node) -> Result<bool> {
        Ok(self
            .rows
            .iter()
            .any(|row| row.subject() == Some(subject) && row.predicate() == Some(property)))
    }

    fn has_arc_in(&self, _world: &World, object: &Node, property: &Node) -> Result<bool> {
        Ok(self
            .rows
            .iter()
            .any(|row| row.object() == Some(object) && row.predicate() == Some(property)))
    }

    fn contexts(&self, _world: &World) -> Result<Vec<Node>> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if let Some(graph) = row.graph() {
                if !seen.contains(graph) {
                    seen.push(graph.clone());
                }
            }
        }
        Ok(seen)
    }

    fn serialize_context(&self, _world: &World, graph: &Node) -> Result<Stream> {
        let items = self
            .rows
            .iter()
            .filter(|row| row.graph() == Some(graph))
            .map(|row| (row.clone(), Some(graph.clone())))
            .collect();
        Ok(Stream::new(Box::new(VecStatementSource::new(items))))
    }

    fn remove_context(&mut self, _world: &World, graph: &Node) -> Result<usize> {
        let before = self.rows.len();
        self.rows.retain(|row| row.graph() != Some(graph));
        Ok(before - self.rows.len())
    }

    fn size(&self) -> Result<usize> {
        Ok(self.rows.len())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_model::World;

    fn triple(world: &World, s: &str, p: &str, o: &str) -> Statement {
        let subject = Node::iri_str(world, s).unwrap();
        let predicate = Node::iri_str(world, p).unwrap();
        let object = Node::plain_literal(world, o).unwrap();
        Statement::from_nodes(subject, predicate, object).unwrap()
    }

    #[test]
    fn add_is_idempotent() {
        let mut storage = MemoryStorage::new();
        let world = World::new();
        let t = triple(&world, "http://ex/a", "http://ex/p", "1");
        assert!(storage.add_statement(&t).unwrap());
        assert!(!storage.add_statement(&t).unwrap());
        assert_eq!(storage.size().unwrap(), 1);
    }

    #[test]
    fn find_statements_filters_by_pattern() {
        let mut storage = MemoryStorage::new();
        let world = World::new();
        let t1 = triple(&world, "http://ex/a", "http://ex/p", "1");
        let t2 = triple(&world, "http://ex/b", "http://ex/p", "2");
        storage.add_statement(&t1).unwrap();
        storage.add_statement(&t2).unwrap();
        let mut pattern = Statement::new();
        pattern
            .set_subject(Node::iri_str(&world, "http://ex/a").unwrap())
            .unwrap();
        let found = storage.find_statements(&world, &pattern).unwrap().collect();
        assert_eq!(found, vec![t1]);
    }

    #[test]
    fn context_operations() {
        let mut storage = MemoryStorage::new();
        let world = World::new();
        let g = Node::iri_str(&world, "http://ex/g").unwrap();
        let t = triple(&world, "http://ex/a", "http://ex/p", "1")
            .with_graph(g.clone())
            .unwrap();
        storage.add_statement(&t).unwrap();
        assert_eq!(storage.contexts(&world).unwrap(), vec![g.clone()]);
        assert_eq!(
            storage.serialize_context(&world, &g).unwrap().collect(),
            vec![t]
        );
        assert_eq!(storage.remove_context(&world, &g).unwrap(), 1);
        assert!(storage.contexts(&world).unwrap().is_empty());
    }
}
