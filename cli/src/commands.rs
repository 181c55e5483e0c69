//! One function per subcommand, kept free of `clap` so they can be unit
//! tested directly.

use anyhow::{Context, Result};
use rdf_model::{Node, Statement, World};
use rdf_store::{HashesStorage, Model, StorageOptions};
use std::fs;
use std::io::Write as _;
use std::path::Path;

fn new_world() -> World {
    let world = World::new();
    world.open();
    rdf_io::register_all(&world);
    rdf_query::register_all(&world);
    world
}

fn open_model(store_dir: &Path, name: &str, contexts: bool, write: bool, new: bool) -> Result<Model> {
    let world = new_world();
    let mut options = StorageOptions::disk(store_dir.to_string_lossy().into_owned())
        .with_contexts(contexts)
        .with_new(new);
    options.write = write;
    let storage = HashesStorage::open(name, &options)
        .with_context(|| format!("opening store '{name}' under {}", store_dir.display()))?;
    Ok(Model::new(world, Box::new(storage)))
}

pub fn load(
    store_dir: &Path,
    name: &str,
    syntax: &str,
    input: &Path,
    base: Option<&str>,
    contexts: bool,
    new: bool,
) -> Result<()> {
    let mut model = open_model(store_dir, name, contexts, true, new)?;
    let data = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let base_uri = base
        .map(|b| rdf_model::Uri::new_from_str(model.world(), b))
        .transpose()?;
    model
        .load_from_string(syntax, &data, base_uri.as_ref())
        .with_context(|| format!("parsing {} as {syntax}", input.display()))?;
    model.sync()?;
    tracing::info!(count = model.size()?, "loaded statements");
    Ok(())
}

pub fn dump(store_dir: &Path, name: &str, syntax: &str, contexts: bool, output: Option<&Path>) -> Result<()> {
    let model = open_model(store_dir, name, contexts, false, false)?;
    let text = model.to_string_as(syntax, None)?;
    match output {
        Some(path) => fs::write(path, text).with_context(|| format!("writing {}", path.display()))?,
        None => std::io::stdout().write_all(text.as_bytes())?,
    }
    Ok(())
}

pub fn tree(store_dir: &Path, name: &str, contexts: bool) -> Result<()> {
    let model = open_model(store_dir, name, contexts, false, false)?;
    if contexts {
        for graph in model.contexts()? {
            println!("{graph}");
            print_spo_tree(&model.serialize_context(&graph)?.collect());
        }
    } else {
        print_spo_tree(&model.find_statements(&Statement::new())?.collect());
    }
    Ok(())
}

fn print_spo_tree(statements: &[Statement]) {
    let mut by_subject: Vec<&Node> = Vec::new();
    for s in statements {
        if let Some(subject) = s.subject() {
            if !by_subject.iter().any(|n| node_eq(n, subject)) {
                by_subject.push(subject);
            }
        }
    }
    for subject in by_subject {
        println!("  {subject}");
        let mut by_predicate: Vec<&Node> = Vec::new();
        for s in statements {
            if s.subject().is_some_and(|n| node_eq(n, subject)) {
                if let Some(predicate) = s.predicate() {
                    if !by_predicate.iter().any(|n| node_eq(n, predicate)) {
                        by_predicate.push(predicate);
                    }
                }
            }
        }
        for predicate in by_predicate {
            println!("    {predicate}");
            for s in statements {
                if s.subject().is_some_and(|n| node_eq(n, subject))
                    && s.predicate().is_some_and(|n| node_eq(n, predicate))
                {
                    if let Some(object) = s.object() {
                        println!("      {object}");
                    }
                }
            }
        }
    }
}

fn node_eq(a: &Node, b: &Node) -> bool {
    a.to_string() == b.to_string()
}

pub fn db_upgrade(store_dir: &Path, name: &str, contexts: bool) -> Result<()> {
    let old = open_model(store_dir, name, contexts, false, false)?;
    let statements: Vec<(Statement, Option<Node>)> = {
        let mut stream = old.find_statements(&Statement::new())?;
        let mut out = Vec::new();
        while !stream.end() {
            if let Some(statement) = stream.current() {
                out.push((statement.clone(), stream.current_context().cloned()));
            }
            stream.next();
        }
        out
    };
    drop(old);

    let scratch = tempfile::tempdir().context("creating scratch directory for db-upgrade")?;
    let scratch_name = format!("{name}-upgrade");
    let mut new_model = open_model(scratch.path(), &scratch_name, contexts, true, true)?;
    for (statement, graph) in statements {
        let statement = match graph {
            Some(graph) if statement.graph().is_none() => statement.with_graph(graph)?,
            _ => statement,
        };
        new_model.add_statement(&statement)?;
    }
    new_model.sync()?;
    drop(new_model);

    for suffix in ["sp2o", "po2s", "os2p", "contexts"] {
        let old_file = store_dir.join(format!("{name}-{suffix}.hdb"));
        let new_file = scratch.path().join(format!("{scratch_name}-{suffix}.hdb"));
        if new_file.exists() {
            fs::rename(&new_file, &old_file)
                .with_context(|| format!("replacing {}", old_file.display()))?;
        } else if old_file.exists() {
            fs::remove_file(&old_file)?;
        }
    }
    tracing::info!(store = %store_dir.display(), "db-upgrade complete");
    Ok(())
}

pub fn digest(algorithm: &str, value: &str) -> Result<()> {
    let digest = rdf_digest::by_name(algorithm).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    println!("{}", digest.digest_hex(value.as_bytes()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_then_dump_round_trips_through_turtle() {
        let store_dir = tempfile::tempdir().unwrap();
        let input = tempfile::NamedTempFile::new().unwrap();
        fs::write(input.path(), "<http://ex/a> <http://ex/p> \"1\" .\n").unwrap();

        load(store_dir.path(), "t", "turtle", input.path(), None, false, true).unwrap();

        let model = open_model(store_dir.path(), "t", false, false, false).unwrap();
        assert_eq!(model.size().unwrap(), 1);

        let text = model.to_string_as("turtle", None).unwrap();
        assert!(text.contains("http://ex/a"));
    }

    #[test]
    fn db_upgrade_preserves_statement_count() {
        let store_dir = tempfile::tempdir().unwrap();
        let input = tempfile::NamedTempFile::new().unwrap();
        fs::write(
            input.path(),
            "<http://ex/a> <http://ex/p> \"1\" .\n<http://ex/b> <http://ex/p> \"2\" .\n",
        )
        .unwrap();
        load(store_dir.path(), "t", "turtle", input.path(), None, false, true).unwrap();

        db_upgrade(store_dir.path(), "t", false).unwrap();

        let model = open_model(store_dir.path(), "t", false, false, false).unwrap();
        assert_eq!(model.size().unwrap(), 2);
    }

    #[test]
    fn digest_matches_known_vector() {
        let d = rdf_digest::by_name("SHA1").unwrap();
        assert_eq!(d.digest_hex(b""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }
}
