//! Key compatibility checks guarding against algorithm confusion.
//!
//! All checks are advisory: the pipelines treat a failed check as "this key does not fit"
//! and move on to the next key.

use core::fmt;

use crate::{
    jwk::{Jwk, KeyType},
    KeyError,
};

/// Operation attempted with a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyOperation {
    /// Encrypting content or wrapping a CEK.
    Encryption,
    /// Decrypting content or unwrapping a CEK.
    Decryption,
    /// Creating a signature.
    Signing,
    /// Verifying a signature.
    Verification,
}

impl fmt::Display for KeyOperation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Encryption => "encryption",
            Self::Decryption => "decryption",
            Self::Signing => "signing",
            Self::Verification => "verification",
        })
    }
}

impl KeyOperation {
    /// Value of the `use` parameter compatible with this operation.
    pub fn key_use(self) -> &'static str {
        match self {
            Self::Encryption | Self::Decryption => "enc",
            Self::Signing | Self::Verification => "sig",
        }
    }

    /// Values of the `key_ops` parameter, any of which permits this operation.
    fn key_ops(self) -> &'static [&'static str] {
        match self {
            Self::Encryption => &["encrypt", "wrapKey"],
            Self::Decryption => &["decrypt", "unwrapKey"],
            Self::Signing => &["sign"],
            Self::Verification => &["verify"],
        }
    }
}

/// Checks that the key's `use` and `key_ops` parameters, if present, permit `operation`.
/// Absent parameters allow any operation.
pub fn check_key_usage(jwk: &Jwk, operation: KeyOperation) -> Result<(), KeyError> {
    if let Some(key_use) = jwk.key_use() {
        let expected = operation.key_use();
        if key_use != expected {
            return Err(KeyError::UnexpectedUsage {
                expected,
                actual: key_use.to_owned(),
            });
        }
    }

    if let Some(key_ops) = jwk.key_ops() {
        let allowed = operation.key_ops();
        if !key_ops.iter().any(|op| allowed.contains(&op.as_str())) {
            return Err(KeyError::UnexpectedOperation {
                operation: allowed[0],
            });
        }
    }
    Ok(())
}

/// Checks that the key's `alg` parameter, if present, equals `algorithm`.
///
/// For JWE decryption with `dir`, `algorithm` is the content encryption algorithm,
/// since the key itself is the CEK.
pub fn check_key_algorithm(jwk: &Jwk, algorithm: &str) -> Result<(), KeyError> {
    match jwk.algorithm() {
        Some(declared) if declared != algorithm => Err(KeyError::AlgorithmMismatch {
            expected: algorithm.to_owned(),
            actual: declared.to_owned(),
        }),
        _ => Ok(()),
    }
}

/// Checks that the key type is in the algorithm's allow-list.
pub fn check_key_type(jwk: &Jwk, algorithm: &str, allowed: &[KeyType]) -> Result<(), KeyError> {
    let actual = jwk.key_type();
    if allowed.contains(&actual) {
        Ok(())
    } else {
        Err(KeyError::UnexpectedKeyType {
            algorithm: algorithm.to_owned(),
            actual,
        })
    }
}
