//! The digest collaborator (spec §1 "out of scope, fixed interface only"):
//! a pluggable message-digest used to fingerprint URIs for the storage key
//! space. Two real algorithms are wired up (MD5, SHA-1) behind one
//! `Digest` factory interface, named by `World`'s registered "digest" kind.

use hex::ToHex;
use md5::Md5;
use rdf_model::{Error, Result};
use sha1::Sha1;
use sha1::Digest as _;

/// One selectable digest algorithm.
pub trait Digest: Send + Sync {
    fn name(&self) -> &'static str;
    fn digest(&self, input: &[u8]) -> Vec<u8>;

    fn digest_hex(&self, input: &[u8]) -> String {
        self.digest(input).encode_hex()
    }
}

pub struct Md5Digest;

impl Digest for Md5Digest {
    fn name(&self) -> &'static str {
        "MD5"
    }

    fn digest(&self, input: &[u8]) -> Vec<u8> {
        Md5::digest(input).to_vec()
    }
}

pub struct Sha1Digest;

impl Digest for Sha1Digest {
    fn name(&self) -> &'static str {
        "SHA1"
    }

    fn digest(&self, input: &[u8]) -> Vec<u8> {
        Sha1::digest(input).to_vec()
    }
}

/// Resolves a digest by name (`"MD5"` / `"SHA1"`, case-insensitive). This is
/// the default factory; `World::register_factory("digest", name, ...)` can
/// add others, per §4.A's factory registry design.
pub fn by_name(name: &str) -> Result<Box<dyn Digest>> {
    match name.to_ascii_uppercase().as_str() {
        "MD5" => Ok(Box::new(Md5Digest)),
        "SHA1" | "SHA-1" => Ok(Box::new(Sha1Digest)),
        other => Err(Error::not_found(format!("unknown digest '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_known_vector() {
        let d = by_name("md5").unwrap();
        assert_eq!(d.digest_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn sha1_known_vector() {
        let d = by_name("SHA1").unwrap();
        assert_eq!(d.digest_hex(b""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn unknown_digest_is_not_found() {
        assert!(by_name("sha256").is_err());
    }
}
