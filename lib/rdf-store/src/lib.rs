//! Indexed triple storage (spec §4.I/§4.J) and the `Model` layer above it
//! (spec §4.K), plus the collaborator contracts the parser, serializer and
//! query shims register against (spec §4.L/§4.M).
//!
//! Two `Storage` implementations are provided: [`hashes::HashesStorage`], a
//! `rdf-hash`-backed SPO/POS/OSP(+Contexts) indexed store, and
//! [`memory::MemoryStorage`], an unindexed linear-scan store. `Model` is
//! generic over either via the [`storage::Storage`] trait.

pub mod hashes;
mod keys;
pub mod memory;
pub mod model;
pub mod options;
pub mod shims;
pub mod storage;

pub use hashes::HashesStorage;
pub use memory::MemoryStorage;
pub use model::Model;
pub use options::{HashType, StorageOptions};
pub use shims::{
    parser_registry, query_registry, serializer_registry, Binding, ParserFactory, ParserRegistry,
    Query, QueryFactory, QueryRegistry, Results, SerializerFactory, SerializerRegistry,
};
pub use storage::Storage;
