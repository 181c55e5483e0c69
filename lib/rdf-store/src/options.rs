//! Storage options (spec §4.I): both a typed builder and a recognized
//! shell-like option string (`key='value',key='value'`, spec §6) are
//! accepted, matching `librdf_hash_from_string` (`original_source/librdf/rdf_hash.c`).

use rdf_model::{Error, Result};
use std::str::FromStr;

/// Which `rdf_hash::Hash` implementation backs a hashes-storage's indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashType {
    Memory,
    Disk,
}

#[derive(Debug, Clone)]
pub struct StorageOptions {
    /// Start from an empty store, deleting any existing one at `dir`.
    pub new: bool,
    /// Directory the disk backend creates its hash files under. Required
    /// when `hash_type` is `Disk`.
    pub dir: Option<String>,
    pub hash_type: HashType,
    /// Maintain the fourth (contexts) index for named-graph operations.
    pub contexts: bool,
    pub write: bool,
    /// Maintain an additional index keyed purely by predicate (unused by
    /// the core find-statements dispatch, kept for API parity with
    /// `librdf_storage_hashes` — see `DESIGN.md`).
    pub index_predicates: bool,
    /// Permit merging a statement that already exists under a different
    /// context rather than treating it as a fresh row.
    pub merge: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            new: false,
            dir: None,
            hash_type: HashType::Memory,
            contexts: false,
            write: true,
            index_predicates: false,
            merge: false,
        }
    }
}

impl StorageOptions {
    #[must_use]
    pub fn memory() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn disk(dir: impl Into<String>) -> Self {
        Self {
            dir: Some(dir.into()),
            hash_type: HashType::Disk,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_contexts(mut self, contexts: bool) -> Self {
        self.contexts = contexts;
        self
    }

    #[must_use]
    pub fn with_new(mut self, new: bool) -> Self {
        self.new = new;
        self
    }
}

impl FromStr for StorageOptions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut options = Self::default();
        for entry in s.split(',') {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (key, value) = parse_entry(entry)?;
            match key.as_str() {
                "new" => options.new = parse_bool(&value)?,
                "dir" => options.dir = Some(value),
                "hash-type" => {
                    options.hash_type = match value.as_str() {
                        "memory" => HashType::Memory,
                        "bdb-like" | "disk" | "rocksdb" => HashType::Disk,
                        other => {
                            return Err(Error::invalid_argument(format!(
                                "unknown hash-type '{other}'"
                            )))
                        }
                    }
                }
                "contexts" => options.contexts = parse_bool(&value)?,
                "write" => options.write = parse_bool(&value)?,
                "index-predicates" => options.index_predicates = parse_bool(&value)?,
                "merge" => options.merge = parse_bool(&value)?,
                other => tracing::warn!(option = other, "unrecognized storage option ignored"),
            }
        }
        Ok(options)
    }
}

fn parse_entry(entry: &str) -> Result<(String, String)> {
    let eq = entry
        .find('=')
        .ok_or_else(|| Error::invalid_argument(format!("malformed option '{entry}'")))?;
    let key = entry[..eq].trim().to_owned();
    let mut value = entry[eq + 1..].trim();
    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        value = &value[1..value.len() - 1];
    }
    Ok((key, value.to_owned()))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(Error::invalid_argument(format!(
            "expected a boolean option value, got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_option_string() {
        let opts: StorageOptions = "new='yes',hash-type='bdb-like',dir='/tmp/x',contexts='yes'"
            .parse()
            .unwrap();
        assert!(opts.new);
        assert_eq!(opts.hash_type, HashType::Disk);
        assert_eq!(opts.dir.as_deref(), Some("/tmp/x"));
        assert!(opts.contexts);
    }

    #[test]
    fn unrecognized_key_is_ignored_not_an_error() {
        let opts: StorageOptions = "frobnicate='true'".parse().unwrap();
        assert!(!opts.new);
    }

    #[test]
    fn malformed_entry_is_an_error() {
        assert!("not-a-key-value".parse::<StorageOptions>().is_err());
    }
}
