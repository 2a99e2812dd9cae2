//! Named digest functions used by key derivation, MACs and signatures.

use hmac::{
    digest::{Digest, KeyInit},
    Hmac, Mac,
};
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use core::fmt;

/// Digest function together with its name and output length.
///
/// Used by content encryption (`A*CBC-HS*`), key agreement (Concat KDF),
/// RSA key encryption (OAEP) and the `HS*` / `RS*` / `PS*` signature families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum HashAlgorithm {
    /// SHA-1. Only used by `RSA-OAEP`.
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

fn compute_digest<D: Digest>(parts: &[&[u8]]) -> Vec<u8> {
    let mut digest = D::new();
    for part in parts {
        digest.update(part);
    }
    digest.finalize().to_vec()
}

fn keyed_mac<M: Mac + KeyInit>(key: &[u8], parts: &[&[u8]]) -> M {
    let mut mac = <M as KeyInit>::new_from_slice(key).expect("HMACs work with any key size");
    for part in parts {
        mac.update(part);
    }
    mac
}

impl HashAlgorithm {
    /// Returns the conventional lowercase name of this function, e.g. `sha256`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Returns the digest output length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Hashes the `message`.
    pub fn digest(self, message: &[u8]) -> Vec<u8> {
        self.digest_parts(&[message])
    }

    /// Hashes the concatenation of `parts`.
    pub fn digest_parts(self, parts: &[&[u8]]) -> Vec<u8> {
        match self {
            Self::Sha1 => compute_digest::<Sha1>(parts),
            Self::Sha256 => compute_digest::<Sha256>(parts),
            Self::Sha384 => compute_digest::<Sha384>(parts),
            Self::Sha512 => compute_digest::<Sha512>(parts),
        }
    }

    /// Computes HMAC over the concatenation of `parts`.
    pub fn hmac(self, key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
        match self {
            Self::Sha1 => keyed_mac::<Hmac<Sha1>>(key, parts).finalize().into_bytes().to_vec(),
            Self::Sha256 => keyed_mac::<Hmac<Sha256>>(key, parts)
                .finalize()
                .into_bytes()
                .to_vec(),
            Self::Sha384 => keyed_mac::<Hmac<Sha384>>(key, parts)
                .finalize()
                .into_bytes()
                .to_vec(),
            Self::Sha512 => keyed_mac::<Hmac<Sha512>>(key, parts)
                .finalize()
                .into_bytes()
                .to_vec(),
        }
    }

    /// Checks in constant time that `tag` is the full HMAC of `parts`.
    pub fn verify_hmac(self, key: &[u8], parts: &[&[u8]], tag: &[u8]) -> bool {
        match self {
            Self::Sha1 => keyed_mac::<Hmac<Sha1>>(key, parts).verify_slice(tag).is_ok(),
            Self::Sha256 => keyed_mac::<Hmac<Sha256>>(key, parts).verify_slice(tag).is_ok(),
            Self::Sha384 => keyed_mac::<Hmac<Sha384>>(key, parts).verify_slice(tag).is_ok(),
            Self::Sha512 => keyed_mac::<Hmac<Sha512>>(key, parts).verify_slice(tag).is_ok(),
        }
    }

    /// Checks in constant time that `tag` equals the leftmost bytes of the HMAC of `parts`.
    /// An empty `tag` never verifies.
    pub fn verify_hmac_truncated(self, key: &[u8], parts: &[&[u8]], tag: &[u8]) -> bool {
        if tag.is_empty() {
            return false;
        }
        match self {
            Self::Sha1 => keyed_mac::<Hmac<Sha1>>(key, parts)
                .verify_truncated_left(tag)
                .is_ok(),
            Self::Sha256 => keyed_mac::<Hmac<Sha256>>(key, parts)
                .verify_truncated_left(tag)
                .is_ok(),
            Self::Sha384 => keyed_mac::<Hmac<Sha384>>(key, parts)
                .verify_truncated_left(tag)
                .is_ok(),
            Self::Sha512 => keyed_mac::<Hmac<Sha512>>(key, parts)
                .verify_truncated_left(tag)
                .is_ok(),
        }
    }
}
