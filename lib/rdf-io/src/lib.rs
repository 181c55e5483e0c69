//! Parser/serializer collaborators (spec §4.L): N-Triples, Turtle, TriG
//! (via `oxttl`) and RDF/XML (via `oxrdfxml`), registered against a
//! `World`'s parser and serializer factory registries (`rdf_store::shims`).

mod convert;
mod rdfxml;
mod turtle_family;

pub use rdfxml::RdfXmlFactory;
pub use turtle_family::{NTriplesFactory, TriGFactory, TurtleFactory};

use rdf_model::World;
use rdf_store::{parser_registry, serializer_registry};
use std::sync::Arc;

/// Registers every syntax this crate implements against `world`'s parser
/// and serializer registries (spec §4.L "guess parser by URI or MIME
/// type" needs a populated registry to guess from). Idempotent: calling it
/// twice on the same world is harmless, the registries simply gain
/// duplicate name entries resolved by first match.
pub fn register_all(world: &World) {
    let parsers = parser_registry(world);
    let serializers = serializer_registry(world);

    let ntriples = Arc::new(NTriplesFactory);
    parsers.register(ntriples.clone());
    serializers.register(ntriples);

    let turtle = Arc::new(TurtleFactory);
    parsers.register(turtle.clone());
    serializers.register(turtle);

    let trig = Arc::new(TriGFactory);
    parsers.register(trig.clone());
    serializers.register(trig);

    let rdfxml = Arc::new(RdfXmlFactory);
    parsers.register(rdfxml.clone());
    serializers.register(rdfxml);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_all_populates_both_registries() {
        let world = World::new();
        register_all(&world);
        let parsers = parser_registry(&world);
        let serializers = serializer_registry(&world);
        assert!(parsers.get("turtle").is_some());
        assert!(serializers.get("turtle").is_some());
        assert!(parsers.get("ttl").is_some(), "mime/extension alias should resolve too");
        assert!(parsers.get("rdfxml").is_some());
        assert!(serializers.get("ntriples").is_some());
    }
}
