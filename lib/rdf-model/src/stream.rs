//! Stream (spec §4.H): the `Iterator` contract specialized to `Statement`,
//! with the current graph context exposed alongside the current statement.

use crate::iter::{Item, Iter, Source};
use crate::node::Node;
use crate::statement::Statement;

/// A lazy, single-pass, finite sequence of statements. Not restartable.
pub struct Stream {
    inner: Iter<Statement>,
}

impl Stream {
    #[must_use]
    pub fn new(source: Box<dyn Source<Statement> + Send>) -> Self {
        Self {
            inner: Iter::new(source),
        }
    }

    pub fn add_map(
        &mut self,
        func: impl FnMut(Item<Statement>) -> Option<Item<Statement>> + Send + 'static,
        release: impl FnMut() + Send + 'static,
    ) {
        self.inner.add_map(func, release);
    }

    pub fn end(&mut self) -> bool {
        self.inner.end()
    }

    pub fn next(&mut self) -> bool {
        self.inner.next()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Statement> {
        self.inner.get_value()
    }

    /// The named graph the current statement came from, if the source knows
    /// it (distinct from the statement's own `graph` field, which is the
    /// statement's *content*; a memory-backed scan of a single context, for
    /// instance, knows the context even for statements whose own `graph`
    /// field was left unset).
    #[must_use]
    pub fn current_context(&self) -> Option<&Node> {
        self.inner.get_context()
    }

    /// Drains the remaining statements into a `Vec`, consuming the stream.
    pub fn collect(mut self) -> Vec<Statement> {
        let mut out = Vec::new();
        while !self.end() {
            if let Some(statement) = self.current() {
                out.push(statement.clone());
            }
            self.next();
        }
        out
    }
}

/// Adapts an owned `Vec<Statement>` (optionally paired with per-item
/// contexts) into a `Stream` source, used by the memory storage backend and
/// by tests.
pub struct VecStatementSource {
    items: std::vec::IntoIter<(Statement, Option<Node>)>,
}

impl VecStatementSource {
    #[must_use]
    pub fn new(items: Vec<(Statement, Option<Node>)>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }
}

impl Source<Statement> for VecStatementSource {
    fn advance(&mut self) -> Option<Item<Statement>> {
        self.items.next().map(|(statement, context)| {
            let mut item = Item::new(statement);
            if let Some(context) = context {
                item = item.with_context(context);
            }
            item
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::World;

    #[test]
    fn drains_statements_in_order() {
        let world = World::new();
        let s = crate::node::Node::iri_str(&world, "http://ex/a").unwrap();
        let p = crate::node::Node::iri_str(&world, "http://ex/p").unwrap();
        let o1 = crate::node::Node::plain_literal(&world, "1").unwrap();
        let o2 = crate::node::Node::plain_literal(&world, "2").unwrap();
        let t1 = Statement::from_nodes(s.clone(), p.clone(), o1).unwrap();
        let t2 = Statement::from_nodes(s, p, o2).unwrap();
        let stream = Stream::new(Box::new(VecStatementSource::new(vec![
            (t1.clone(), None),
            (t2.clone(), None),
        ])));
        assert_eq!(stream.collect(), vec![t1, t2]);
    }
}
