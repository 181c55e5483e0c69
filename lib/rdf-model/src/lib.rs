//! World-scoped term/statement model and lazy streaming protocols.
//!
//! This crate is the foundation leaf of the workspace: `World`, `Uri`,
//! `Node`, `Statement`, `List`, `Iter` and `Stream`. Everything else in the
//! workspace (`rdf-hash`, `rdf-store`, `rdf-io`, `rdf-query`) builds on top
//! of these types; this crate depends on nothing else in the workspace.

pub mod encoding;
pub mod error;
pub mod iter;
pub mod list;
pub mod log;
pub mod node;
pub mod statement;
pub mod stream;
pub mod uri;
pub mod world;

pub use error::{Error, Locator, Result};
pub use iter::{Item, Iter, Projection, Source};
pub use list::List;
pub use log::{Facility, LogHandler, LogMessage, LogSink, Severity};
pub use node::{Blank, Literal, Node};
pub use statement::Statement;
pub use stream::Stream;
pub use uri::Uri;
pub use world::World;
