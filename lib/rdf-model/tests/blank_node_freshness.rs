//! S3: 10000 sequential fresh blank nodes never collide.

use rdf_model::{Node, World};
use std::collections::HashSet;

#[test]
fn ten_thousand_fresh_blanks_are_pairwise_distinct() {
    let world = World::new();
    let mut seen = HashSet::with_capacity(10_000);
    for _ in 0..10_000 {
        let node = Node::fresh_blank(&world).unwrap();
        let id = node.as_blank().unwrap().identifier_str().to_owned();
        assert!(seen.insert(id), "minted a duplicate blank-node identifier");
    }
}
