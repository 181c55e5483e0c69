//! Programmatic counterparts of the `redland-load`/`redland-dump`/
//! `redland-tree`/`redland-db-upgrade`/`redland-digest` CLI utilities
//! (spec §6): these are collaborators, not part of the core, so this binary
//! is a thin driver over `rdf-store`/`rdf-io`/`rdf-query`/`rdf-digest`.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rdf-core", version, about = "Load, dump, inspect and digest RDF hashes-backed stores")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a file into a hashes-backed store (`redland-load` counterpart).
    Load {
        /// Directory the store's `.hdb` files live under.
        #[arg(long)]
        store_dir: PathBuf,
        /// Common file-stem for the store's index files.
        #[arg(long)]
        name: String,
        /// Syntax name registered with `rdf-io` (turtle, ntriples, trig, rdfxml).
        #[arg(long)]
        syntax: String,
        /// File to parse.
        input: PathBuf,
        /// Base URI for relative-reference resolution.
        #[arg(long)]
        base: Option<String>,
        /// Maintain the contexts (named-graph) index.
        #[arg(long)]
        contexts: bool,
        /// Start from an empty store, discarding any existing one at `store_dir`/`name`.
        #[arg(long)]
        new: bool,
    },
    /// Serialize a hashes-backed store to a syntax (`redland-dump` counterpart).
    Dump {
        #[arg(long)]
        store_dir: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        syntax: String,
        #[arg(long)]
        contexts: bool,
        /// File to write; stdout if omitted.
        output: Option<PathBuf>,
    },
    /// Walk a store's contexts and print graph → subject → predicate → object
    /// (`redland-tree` counterpart).
    Tree {
        #[arg(long)]
        store_dir: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        contexts: bool,
    },
    /// Re-encode every record of a store under the current schema version
    /// (`redland-db-upgrade` counterpart).
    DbUpgrade {
        #[arg(long)]
        store_dir: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        contexts: bool,
    },
    /// Fingerprint a string with a registered digest (`redland-digest` counterpart).
    Digest {
        /// "MD5" or "SHA1".
        #[arg(long, default_value = "SHA1")]
        algorithm: String,
        value: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Load {
            store_dir,
            name,
            syntax,
            input,
            base,
            contexts,
            new,
        } => commands::load(&store_dir, &name, &syntax, &input, base.as_deref(), contexts, new),
        Command::Dump {
            store_dir,
            name,
            syntax,
            contexts,
            output,
        } => commands::dump(&store_dir, &name, &syntax, contexts, output.as_deref()),
        Command::Tree {
            store_dir,
            name,
            contexts,
        } => commands::tree(&store_dir, &name, contexts),
        Command::DbUpgrade { store_dir, name, contexts } => commands::db_upgrade(&store_dir, &name, contexts),
        Command::Digest { algorithm, value } => commands::digest(&algorithm, &value),
    }
}
