//! The hashes-indexed `Storage` backend (spec §4.I): three node-pair
//! indexes (SPO, POS, OSP) plus an optional contexts index, each a
//! `rdf_hash::Hash`. Grounded on `librdf_storage_hashes`
//! (`original_source/librdf/rdf_storage_hashes.c`), reworked onto the
//! `rdf-hash` trait built for this workspace rather than BerkeleyDB.

use crate::keys::{
    concat2, concat3, statement_from_osp, statement_from_pos, statement_from_spo,
    statement_from_spo_bytes,
};
use crate::options::{HashType, StorageOptions};
use crate::storage::Storage;
use rdf_hash::{Hash, MemoryHash, OpenOptions};
#[cfg(feature = "rocksdb-backend")]
use rdf_hash::RocksHash;
use rdf_model::stream::VecStatementSource;
use rdf_model::{Error, Node, Result, Statement, Stream, World};

/// Reserved index key (no valid node encoding starts with byte `0`, since
/// every encoding leads with the schema-version byte `1`) under which the
/// running size counter is persisted in the SPO index, so a disk-backed
/// store recovers its `size()` without a full scan on reopen.
const SIZE_META_KEY: &[u8] = &[0u8];

fn new_hash(hash_type: HashType) -> Result<Box<dyn Hash>> {
    match hash_type {
        HashType::Memory => Ok(Box::new(MemoryHash::new())),
        HashType::Disk => {
            #[cfg(feature = "rocksdb-backend")]
            {
                Ok(Box::new(RocksHash::new()))
            }
            #[cfg(not(feature = "rocksdb-backend"))]
            {
                Err(Error::invalid_argument(
                    "disk hash-type requires the rocksdb-backend feature",
                ))
            }
        }
    }
}

fn open_hash(hash: &mut dyn Hash, name_suffix: &str, options: &StorageOptions) -> Result<()> {
    let identifier = format!("{name_suffix}.hdb");
    hash.open(
        &identifier,
        &OpenOptions {
            dir: options.dir.clone(),
            writable: options.write,
            create_new: options.new,
        },
    )
}

/// The indexed triple store: SPO, POS, OSP, and an optional contexts index,
/// each a pluggable `Hash`.
pub struct HashesStorage {
    spo: Box<dyn Hash>,
    pos: Box<dyn Hash>,
    osp: Box<dyn Hash>,
    contexts: Option<Box<dyn Hash>>,
    size: usize,
}

impl HashesStorage {
    /// Opens a hashes storage named `name` (used as a common file stem for
    /// the disk backend) per `options`.
    pub fn open(name: &str, options: &StorageOptions) -> Result<Self> {
        let mut spo = new_hash(options.hash_type)?;
        let mut pos = new_hash(options.hash_type)?;
        let mut osp = new_hash(options.hash_type)?;
        open_hash(spo.as_mut(), &format!("{name}-sp2o"), options)?;
        open_hash(pos.as_mut(), &format!("{name}-po2s"), options)?;
        open_hash(osp.as_mut(), &format!("{name}-os2p"), options)?;
        let contexts = if options.contexts {
            let mut c = new_hash(options.hash_type)?;
            open_hash(c.as_mut(), &format!("{name}-contexts"), options)?;
            Some(c)
        } else {
            None
        };
        let size = spo
            .get_one(SIZE_META_KEY)?
            .map(|bytes| decode_size(&bytes))
            .unwrap_or(0);
        Ok(Self {
            spo,
            pos,
            osp,
            contexts,
            size,
        })
    }

    fn persist_size(&mut self) -> Result<()> {
        if self.spo.contains(SIZE_META_KEY, None)? {
            self.spo.delete_key(SIZE_META_KEY)?;
        }
        self.spo.put(SIZE_META_KEY, &encode_size(self.size))
    }
}

fn encode_size(n: usize) -> Vec<u8> {
    (n as u64).to_be_bytes().to_vec()
}

fn decode_size(bytes: &[u8]) -> usize {
    let mut buf = [0u8; 8];
    let len = bytes.len().min(8);
    buf[8 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    u64::from_be_bytes(buf) as usize
}

impl Storage for HashesStorage {
    fn add_statement(&mut self, statement: &Statement) -> Result<bool> {
        let s = statement
            .subject()
            .ok_or_else(|| Error::invalid_argument("add-statement requires a subject"))?
            .encode();
        let p = statement
            .predicate()
            .ok_or_else(|| Error::invalid_argument("add-statement requires a predicate"))?
            .encode();
        let o = statement
            .object()
            .ok_or_else(|| Error::invalid_argument("add-statement requires an object"))?
            .encode();
        let spo_key = concat2(&s, &p);
        let pos_key = concat2(&p, &o);
        let osp_key = concat2(&o, &s);

        let is_new = match (statement.graph(), &self.contexts) {
            (Some(graph), Some(contexts)) => {
                let graph_key = graph.encode();
                let value = concat3(&s, &p, &o);
                !contexts.contains(&graph_key, Some(&value))?
            }
            _ => !self.spo.contains(&spo_key, Some(&o))?,
        };

        self.spo.put(&spo_key, &o)?;
        self.pos.put(&pos_key, &s)?;
        self.osp.put(&osp_key, &p)?;
        if let (Some(graph), Some(contexts)) = (statement.graph(), &mut self.contexts) {
            let graph_key = graph.encode();
            let value = concat3(&s, &p, &o);
            contexts.put(&graph_key, &value)?;
        }
        if is_new {
            self.size += 1;
            self.persist_size()?;
        }
        Ok(is_new)
    }

    fn remove_statement(&mut self, statement: &Statement) -> Result<bool> {
        let s = statement
            .subject()
            .ok_or_else(|| Error::invalid_argument("remove-statement requires a subject"))?
            .encode();
        let p = statement
            .predicate()
            .ok_or_else(|| Error::invalid_argument("remove-statement requires a predicate"))?
            .encode();
        let o = statement
            .object()
            .ok_or_else(|| Error::invalid_argument("remove-statement requires an object"))?
            .encode();

        if let (Some(graph), Some(contexts)) = (statement.graph(), &mut self.contexts) {
            let graph_key = graph.encode();
            let value = concat3(&s, &p, &o);
            let was_present = contexts.contains(&graph_key, Some(&value))?;
            contexts.delete_key_value(&graph_key, &value)?;
            // The SPO/POS/OSP indexes track (S,P,O) irrespective of graph,
            // so this triple must only drop out of them once no other
            // context still references it (index-consistency invariant,
            // spec §3/§8 property 3). Computed here, before any call that
            // needs the whole `self`, since `contexts` borrows `self.contexts`.
            let still_referenced = was_present
                && contexts
                    .keys()?
                    .into_iter()
                    .any(|key| contexts.contains(&key, Some(&value)).unwrap_or(false));
            if was_present {
                self.size -= 1;
                self.persist_size()?;
                if !still_referenced {
                    let spo_key = concat2(&s, &p);
                    let pos_key = concat2(&p, &o);
                    let osp_key = concat2(&o, &s);
                    self.spo.delete_key_value(&spo_key, &o)?;
                    self.pos.delete_key_value(&pos_key, &s)?;
                    self.osp.delete_key_value(&osp_key, &p)?;
                }
            }
            return Ok(was_present);
        }

        let spo_key = concat2(&s, &p);
        let pos_key = concat2(&p, &o);
        let osp_key = concat2(&o, &s);
        let was_present = self.spo.contains(&spo_key, Some(&o))?;
        if was_present {
            self.spo.delete_key_value(&spo_key, &o)?;
            self.pos.delete_key_value(&pos_key, &s)?;
            self.osp.delete_key_value(&osp_key, &p)?;
            if let Some(contexts) = &mut self.contexts {
                let value = concat3(&s, &p, &o);
                for key in contexts.keys()? {
                    contexts.delete_key_value(&key, &value)?;
                }
            }
            self.size -= 1;
            self.persist_size()?;
        }
        Ok(was_present)
    }

    fn find_statements(&self, world: &World, pattern: &Statement) -> Result<Stream> {
        let s = pattern.subject().map(Node::encode);
        let p = pattern.predicate().map(Node::encode);
        let o = pattern.object().map(Node::encode);

        let mut statements = Vec::new();
        match (s.as_deref(), p.as_deref(), o.as_deref()) {
            (Some(s), Some(p), _) => {
                let key = concat2(s, p);
                for value in self.spo.get_all(&key)? {
                    statements.push(statement_from_spo(world, &key, &value)?);
                }
            }
            (None, Some(p), Some(o)) => {
                let key = concat2(p, o);
                for value in self.pos.get_all(&key)? {
                    statements.push(statement_from_pos(world, &key, &value)?);
                }
            }
            (Some(s), None, Some(o)) => {
                // S and O bound, P not: the OSP index's key is exactly
                // `O‖S`, an exact (not prefix) lookup — the natural third
                // use of that index alongside "O bound" prefix scans,
                // filling a combination the access-pattern list leaves
                // implicit (see `DESIGN.md`).
                let key = concat2(o, s);
                for value in self.osp.get_all(&key)? {
                    statements.push(statement_from_osp(world, &key, &value)?);
                }
            }
            (Some(s), None, None) => {
                for (key, value) in self.spo.scan_prefix(s)? {
                    statements.push(statement_from_spo(world, &key, &value)?);
                }
            }
            (None, Some(p), None) => {
                for (key, value) in self.pos.scan_prefix(p)? {
                    statements.push(statement_from_pos(world, &key, &value)?);
                }
            }
            (None, None, Some(o)) => {
                for (key, value) in self.osp.scan_prefix(o)? {
                    statements.push(statement_from_osp(world, &key, &value)?);
                }
            }
            (None, None, None) => {
                for (key, value) in self.spo.scan_prefix(&[])? {
                    if key == SIZE_META_KEY {
                        continue;
                    }
                    statements.push(statement_from_spo(world, &key, &value)?);
                }
            }
        }
        statements.retain(|candidate| candidate.matches(pattern));
        let items = statements.into_iter().map(|s| (s, None)).collect();
        Ok(Stream::new(Box::new(VecStatementSource::new(items))))
    }

    fn has_arc_out(&self, _world: &World, subject: &Node, property: &Node) -> Result<bool> {
        let key = concat2(&subject.encode(), &property.encode());
        self.spo.contains(&key, None)
    }

    fn has_arc_in(&self, _world: &World, object: &Node, property: &Node) -> Result<bool> {
        let key = concat2(&property.encode(), &object.encode());
        self.pos.contains(&key, None)
    }

    fn contexts(&self, world: &World) -> Result<Vec<Node>> {
        let Some(contexts) = &self.contexts else {
            return Ok(Vec::new());
        };
        contexts
            .keys()?
            .into_iter()
            .map(|key| Node::decode(world, &key))
            .collect()
    }

    fn serialize_context(&self, world: &World, graph: &Node) -> Result<Stream> {
        let Some(contexts) = &self.contexts else {
            return Ok(Stream::new(Box::new(VecStatementSource::new(Vec::new()))));
        };
        let graph_key = graph.encode();
        let mut items = Vec::new();
        for value in contexts.get_all(&graph_key)? {
            let statement = statement_from_spo_bytes(world, &value)?;
            items.push((statement, Some(graph.clone())));
        }
        Ok(Stream::new(Box::new(VecStatementSource::new(items))))
    }

    fn remove_context(&mut self, world: &World, graph: &Node) -> Result<usize> {
        let Some(contexts) = &mut self.contexts else {
            return Ok(0);
        };
        let graph_key = graph.encode();
        let values = contexts.get_all(&graph_key)?;
        let removed = values.len();
        contexts.delete_key(&graph_key)?;
        for value in &values {
            let still_referenced = contexts
                .keys()?
                .into_iter()
                .any(|key| contexts.contains(&key, Some(value)).unwrap_or(false));
            if !still_referenced {
                let (s, p, o) = crate::keys::decode3(world, value)?;
                let (s, p, o) = (s.encode(), p.encode(), o.encode());
                self.spo.delete_key_value(&concat2(&s, &p), &o)?;
                self.pos.delete_key_value(&concat2(&p, &o), &s)?;
                self.osp.delete_key_value(&concat2(&o, &s), &p)?;
            }
        }
        if removed > 0 {
            self.size = self.size.saturating_sub(removed);
            self.persist_size()?;
        }
        Ok(removed)
    }

    fn size(&self) -> Result<usize> {
        Ok(self.size)
    }

    fn sync(&mut self) -> Result<()> {
        self.spo.sync()?;
        self.pos.sync()?;
        self.osp.sync()?;
        if let Some(contexts) = &mut self.contexts {
            contexts.sync()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_model::{Node, World};

    fn triple(world: &World, s: &str, p: &str, o: &str) -> Statement {
        let subject = Node::iri_str(world, s).unwrap();
        let predicate = Node::iri_str(world, p).unwrap();
        let object = Node::plain_literal(world, o).unwrap();
        Statement::from_nodes(subject, predicate, object).unwrap()
    }

    #[test]
    fn add_is_idempotent_and_size_tracks_it() {
        let mut storage = HashesStorage::open("t", &StorageOptions::memory()).unwrap();
        let world = World::new();
        let t = triple(&world, "http://ex/a", "http://ex/p", "1");
        assert!(storage.add_statement(&t).unwrap());
        assert!(!storage.add_statement(&t).unwrap());
        assert_eq!(storage.size().unwrap(), 1);
    }

    #[test]
    fn find_statements_s1_scenario() {
        let mut storage = HashesStorage::open("t", &StorageOptions::memory()).unwrap();
        let world = World::new();
        let t1 = triple(&world, "http://ex/a", "http://ex/p", "1");
        let t2 = triple(&world, "http://ex/a", "http://ex/q", "2");
        let t3 = triple(&world, "http://ex/b", "http://ex/p", "3");
        storage.add_statement(&t1).unwrap();
        storage.add_statement(&t2).unwrap();
        storage.add_statement(&t3).unwrap();
        assert_eq!(storage.size().unwrap(), 3);

        let mut pattern = Statement::new();
        pattern
            .set_predicate(Node::iri_str(&world, "http://ex/p").unwrap())
            .unwrap();
        let found = storage.find_statements(&world, &pattern).unwrap().collect();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&t1));
        assert!(found.contains(&t3));
    }

    #[test]
    fn find_statements_s_and_o_bound_uses_osp() {
        let mut storage = HashesStorage::open("t", &StorageOptions::memory()).unwrap();
        let world = World::new();
        let t = triple(&world, "http://ex/a", "http://ex/p", "1");
        storage.add_statement(&t).unwrap();
        let mut pattern = Statement::new();
        pattern.set_subject(Node::iri_str(&world, "http://ex/a").unwrap()).unwrap();
        pattern.set_object(Node::plain_literal(&world, "1").unwrap());
        let found = storage.find_statements(&world, &pattern).unwrap().collect();
        assert_eq!(found, vec![t]);
    }

    #[test]
    fn remove_statement_is_symmetric() {
        let mut storage = HashesStorage::open("t", &StorageOptions::memory()).unwrap();
        let world = World::new();
        let t = triple(&world, "http://ex/a", "http://ex/p", "1");
        storage.add_statement(&t).unwrap();
        assert!(storage.remove_statement(&t).unwrap());
        assert_eq!(storage.size().unwrap(), 0);
        assert!(!storage.remove_statement(&t).unwrap());
        assert!(storage
            .find_statements(&world, &Statement::new())
            .unwrap()
            .collect()
            .is_empty());
    }

    #[test]
    fn distinct_contexts_yield_distinct_rows_s2_scenario() {
        let mut storage = HashesStorage::open(
            "t",
            &StorageOptions::memory().with_contexts(true),
        )
        .unwrap();
        let world = World::new();
        let t = triple(&world, "http://ex/a", "http://ex/p", "1");
        let gx = Node::iri_str(&world, "http://ex/gx").unwrap();
        let gy = Node::iri_str(&world, "http://ex/gy").unwrap();
        storage
            .add_statement(&t.clone().with_graph(gx.clone()).unwrap())
            .unwrap();
        storage
            .add_statement(&t.clone().with_graph(gy.clone()).unwrap())
            .unwrap();
        assert_eq!(storage.size().unwrap(), 2);

        let removed = storage.remove_context(&world, &gx).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(storage.size().unwrap(), 1);

        let remaining = storage.contexts(&world).unwrap();
        assert_eq!(remaining, vec![gy]);
    }

    #[test]
    fn remove_context_drops_spo_entry_once_unreferenced() {
        let mut storage =
            HashesStorage::open("t", &StorageOptions::memory().with_contexts(true)).unwrap();
        let world = World::new();
        let t = triple(&world, "http://ex/a", "http://ex/p", "1");
        let gx = Node::iri_str(&world, "http://ex/gx").unwrap();
        storage
            .add_statement(&t.clone().with_graph(gx.clone()).unwrap())
            .unwrap();
        storage.remove_context(&world, &gx).unwrap();
        assert_eq!(storage.size().unwrap(), 0);
        // The SPO/POS/OSP indexes must not retain a ghost entry once the
        // only context referencing this triple is gone.
        assert!(storage
            .find_statements(&world, &Statement::new())
            .unwrap()
            .collect()
            .is_empty());
    }

    #[test]
    fn remove_statement_with_graph_keeps_triple_alive_in_other_context() {
        let mut storage =
            HashesStorage::open("t", &StorageOptions::memory().with_contexts(true)).unwrap();
        let world = World::new();
        let t = triple(&world, "http://ex/a", "http://ex/p", "1");
        let gx = Node::iri_str(&world, "http://ex/gx").unwrap();
        let gy = Node::iri_str(&world, "http://ex/gy").unwrap();
        storage
            .add_statement(&t.clone().with_graph(gx.clone()).unwrap())
            .unwrap();
        storage
            .add_statement(&t.clone().with_graph(gy.clone()).unwrap())
            .unwrap();
        assert!(storage
            .remove_statement(&t.clone().with_graph(gx).unwrap())
            .unwrap());
        assert_eq!(storage.size().unwrap(), 1);
        // Still findable via the S,P,? access pattern since gy's copy lives on.
        let mut pattern = Statement::new();
        pattern
            .set_subject(Node::iri_str(&world, "http://ex/a").unwrap())
            .unwrap();
        pattern
            .set_predicate(Node::iri_str(&world, "http://ex/p").unwrap())
            .unwrap();
        let found = storage.find_statements(&world, &pattern).unwrap().collect();
        assert_eq!(found, vec![t]);
    }

    #[test]
    fn remove_statement_with_graph_drops_spo_when_last_reference_gone() {
        let mut storage =
            HashesStorage::open("t", &StorageOptions::memory().with_contexts(true)).unwrap();
        let world = World::new();
        let t = triple(&world, "http://ex/a", "http://ex/p", "1");
        let gx = Node::iri_str(&world, "http://ex/gx").unwrap();
        storage
            .add_statement(&t.clone().with_graph(gx.clone()).unwrap())
            .unwrap();
        assert!(storage
            .remove_statement(&t.clone().with_graph(gx).unwrap())
            .unwrap());
        assert_eq!(storage.size().unwrap(), 0);
        assert!(storage
            .find_statements(&world, &Statement::new())
            .unwrap()
            .collect()
            .is_empty());
    }

    #[test]
    fn has_arc_queries() {
        let mut storage = HashesStorage::open("t", &StorageOptions::memory()).unwrap();
        let world = World::new();
        let t = triple(&world, "http://ex/a", "http://ex/p", "1");
        storage.add_statement(&t).unwrap();
        let a = Node::iri_str(&world, "http://ex/a").unwrap();
        let p = Node::iri_str(&world, "http://ex/p").unwrap();
        let lit = Node::plain_literal(&world, "1").unwrap();
        assert!(storage.has_arc_out(&world, &a, &p).unwrap());
        assert!(storage.has_arc_in(&world, &lit, &p).unwrap());
        let b = Node::iri_str(&world, "http://ex/b").unwrap();
        assert!(!storage.has_arc_out(&world, &b, &p).unwrap());
    }
}
