//! Disk-backed storage across a close/reopen cycle, the part of S1 the
//! in-crate unit tests (which stay in-memory) don't exercise: data really
//! has to survive hitting the filesystem.

use rdf_model::{Node, Statement, World};
use rdf_store::{HashesStorage, Model, StorageOptions};

fn triple(world: &World, s: &str, p: &str, o: &str) -> Statement {
    let subject = Node::iri_str(world, s).unwrap();
    let predicate = Node::iri_str(world, p).unwrap();
    let object = Node::plain_literal(world, o).unwrap();
    Statement::from_nodes(subject, predicate, object).unwrap()
}

#[test]
fn statements_survive_close_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let options = StorageOptions::disk(dir.path().to_string_lossy().into_owned()).with_contexts(true);

    let world = World::new();
    {
        let mut model = Model::new(
            world.clone(),
            Box::new(HashesStorage::open("t1", &options).unwrap()),
        );
        model
            .add_statement(&triple(&world, "ex:a", "ex:p", "1"))
            .unwrap();
        model
            .add_statement(&triple(&world, "ex:a", "ex:q", "2"))
            .unwrap();
        model
            .add_statement(&triple(&world, "ex:b", "ex:p", "2"))
            .unwrap();
        assert_eq!(model.size().unwrap(), 3);
        model.sync().unwrap();
    }

    let reopened = Model::new(
        world.clone(),
        Box::new(HashesStorage::open("t1", &options).unwrap()),
    );
    assert_eq!(reopened.size().unwrap(), 3);

    let p = Node::iri_str(&world, "ex:p").unwrap();
    let mut pattern = Statement::new();
    pattern.set_predicate(p).unwrap();
    let found = reopened.find_statements(&pattern).unwrap().collect();
    assert_eq!(found.len(), 2);
}

#[test]
fn contexts_track_and_remove_independently() {
    let dir = tempfile::tempdir().unwrap();
    let options = StorageOptions::disk(dir.path().to_string_lossy().into_owned()).with_contexts(true);
    let world = World::new();
    let mut model = Model::new(
        world.clone(),
        Box::new(HashesStorage::open("t2", &options).unwrap()),
    );

    let gx = Node::iri_str(&world, "g:x").unwrap();
    let gy = Node::iri_str(&world, "g:y").unwrap();
    model
        .add_statement(
            &triple(&world, "ex:a", "ex:p", "1")
                .with_graph(gx.clone())
                .unwrap(),
        )
        .unwrap();
    model
        .add_statement(
            &triple(&world, "ex:a", "ex:p", "1")
                .with_graph(gy.clone())
                .unwrap(),
        )
        .unwrap();
    assert_eq!(model.size().unwrap(), 2);

    assert_eq!(model.remove_context(&gx).unwrap(), 1);
    assert_eq!(model.size().unwrap(), 1);

    let remaining = model.contexts().unwrap();
    assert_eq!(remaining, vec![gy]);
}
