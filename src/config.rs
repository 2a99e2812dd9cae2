//! Policy describing which algorithms are allowed, and construction of pipelines from it.

use serde::{Deserialize, Serialize};

use crate::{
    compression::{CompressionRegistry, DEFAULT_MAX_PAYLOAD_LEN},
    registry::AlgorithmRegistry,
    Error, JweDecrypter, JwsVerifier,
};

/// Allow-lists of algorithm names per category.
///
/// Registries are only ever built from an explicit policy; nothing is registered implicitly.
/// The policy is usually deserialized from the application configuration.
///
/// # Examples
///
/// ```
/// # use jwx_compact::config::Policy;
/// # fn main() -> anyhow::Result<()> {
/// let policy: Policy = serde_json::from_str(r#"{
///     "key_encryption": ["RSA-OAEP-256", "ECDH-ES+A256KW", "A256GCMKW"],
///     "content_encryption": ["A256GCM"],
///     "compression": ["DEF"],
///     "signature": ["ES256", "EdDSA"]
/// }"#)?;
/// let decrypter = policy.decrypter()?;
/// assert!(decrypter.key_encryption_registry().has("A256GCMKW"));
/// let verifier = policy.verifier()?;
/// assert!(!verifier.signature_registry().has("HS256"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Policy {
    /// Allowed key management algorithms (`alg` of JWE recipients).
    #[serde(default)]
    pub key_encryption: Vec<String>,
    /// Allowed content encryption algorithms (`enc`).
    #[serde(default)]
    pub content_encryption: Vec<String>,
    /// Allowed compression methods (`zip`).
    #[serde(default)]
    pub compression: Vec<String>,
    /// Allowed signature algorithms (`alg` of JWS signatures).
    #[serde(default)]
    pub signature: Vec<String>,
    /// Maximum length of a decompressed JWE payload in bytes. If not set,
    /// [`DEFAULT_MAX_PAYLOAD_LEN`] is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload_len: Option<usize>,
}

impl Policy {
    /// Builds a JWE decrypter.
    ///
    /// # Errors
    ///
    /// Fails if a name is unknown. Names of a wrong category (e.g., `HS256` among key
    /// management algorithms) are accepted here, but are rejected on use.
    pub fn decrypter(&self) -> Result<JweDecrypter, Error> {
        Ok(JweDecrypter::new(
            AlgorithmRegistry::new(&self.key_encryption)?,
            AlgorithmRegistry::new(&self.content_encryption)?,
            CompressionRegistry::new(&self.compression)?
                .with_max_payload_len(self.max_payload_len.unwrap_or(DEFAULT_MAX_PAYLOAD_LEN)),
        ))
    }

    /// Builds a JWS verifier.
    ///
    /// # Errors
    ///
    /// Fails if a signature algorithm name is unknown.
    pub fn verifier(&self) -> Result<JwsVerifier, Error> {
        Ok(JwsVerifier::new(AlgorithmRegistry::new(&self.signature)?))
    }
}
