//! The `Storage` contract (spec §4.I/§4.J): the common surface both the
//! hashes-indexed backend and the plain in-memory backend implement, so
//! `Model` (§4.K) can be generic over which one backs it.

use rdf_model::{Node, Result, Statement, Stream, World};

/// Storage-level operations a `Model` drives. `find_statements` and the
/// `has_arc_*` queries are graph-agnostic: they answer "does this triple
/// exist in the store at all", not "in this context" (context-scoped
/// questions go through `contexts`/`serialize_context`/`remove_context`).
pub trait Storage: Send + Sync {
    /// Inserts `statement`. Returns `true` if this was a genuinely new row
    /// (idempotent: re-adding an existing statement returns `false` and
    /// changes nothing).
    fn add_statement(&mut self, statement: &Statement) -> Result<bool>;

    /// Removes `statement`. Returns `true` if it was present.
    fn remove_statement(&mut self, statement: &Statement) -> Result<bool>;

    /// Every stored statement matching `pattern` (any unset field is a
    /// wildcard), via the narrowest index the backend can use for the given
    /// combination of bound fields.
    fn find_statements(&self, world: &World, pattern: &Statement) -> Result<Stream>;

    /// Is there a statement `(subject, property, *)`?
    fn has_arc_out(&self, world: &World, subject: &Node, property: &Node) -> Result<bool>;

    /// Is there a statement `(*, property, object)`?
    fn has_arc_in(&self, world: &World, object: &Node, property: &Node) -> Result<bool>;

    /// Every distinct graph name with at least one statement recorded
    /// against it. Empty if contexts are not tracked by this backend.
    fn contexts(&self, world: &World) -> Result<Vec<Node>>;

    /// Every statement recorded against `graph`.
    fn serialize_context(&self, world: &World, graph: &Node) -> Result<Stream>;

    /// Removes every statement recorded against `graph`. Returns the count
    /// removed. Only the contexts index is touched (the plain SPO/POS/OSP
    /// triple may still be reachable via another graph, or with no graph at
    /// all — see `DESIGN.md`).
    fn remove_context(&mut self, world: &World, graph: &Node) -> Result<usize>;

    /// Running count of statements added (a statement carrying a graph is
    /// counted per distinct `(graph, S, P, O)`; one with no graph is
    /// counted per distinct `(S, P, O)` — spec §8 S2).
    fn size(&self) -> Result<usize>;

    fn sync(&mut self) -> Result<()>;
}
