//! Closed set of JWS signature algorithms addressable by name.

use std::fmt;

#[cfg(feature = "ed25519")]
use super::Ed25519;
#[cfg(feature = "rsa")]
use super::Rsa;
use super::{Es256, Es384, Hs256, Hs384, Hs512};
use crate::{
    jwk::{JsonWebKey, KeyType},
    AlgorithmExt, KeyError,
};

/// JWS signature algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum SignatureAlgorithm {
    /// `HS256`
    Hs256,
    /// `HS384`
    Hs384,
    /// `HS512`
    Hs512,
    /// One of `RS256`, `RS384`, `RS512`, `PS256`, `PS384`, `PS512`.
    #[cfg(feature = "rsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
    Rsa(Rsa),
    /// `ES256`
    Es256,
    /// `ES384`
    Es384,
    /// `EdDSA` with the Ed25519 curve.
    #[cfg(feature = "ed25519")]
    #[cfg_attr(docsrs, doc(cfg(feature = "ed25519")))]
    EdDsa,
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl SignatureAlgorithm {
    /// Iterates over all signature algorithms enabled by crate features.
    pub fn all() -> impl Iterator<Item = Self> {
        let hmacs = [Self::Hs256, Self::Hs384, Self::Hs512];
        #[cfg(feature = "rsa")]
        let rsa = Rsa::ALL.map(Self::Rsa);
        #[cfg(not(feature = "rsa"))]
        let rsa: [Self; 0] = [];
        #[cfg(feature = "ed25519")]
        let eddsa = [Self::EdDsa];
        #[cfg(not(feature = "ed25519"))]
        let eddsa: [Self; 0] = [];

        hmacs
            .into_iter()
            .chain(rsa)
            .chain([Self::Es256, Self::Es384])
            .chain(eddsa)
    }

    /// Returns the algorithm name, as mentioned in the `alg` header parameter.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
            #[cfg(feature = "rsa")]
            Self::Rsa(rsa) => rsa.alg_name(),
            Self::Es256 => "ES256",
            Self::Es384 => "ES384",
            #[cfg(feature = "ed25519")]
            Self::EdDsa => "EdDSA",
        }
    }

    /// Key types this algorithm can be used with.
    pub fn allowed_key_types(self) -> &'static [KeyType] {
        match self {
            Self::Hs256 | Self::Hs384 | Self::Hs512 => &[KeyType::Symmetric],
            #[cfg(feature = "rsa")]
            Self::Rsa(_) => &[KeyType::Rsa],
            Self::Es256 | Self::Es384 => &[KeyType::EllipticCurve],
            #[cfg(feature = "ed25519")]
            Self::EdDsa => &[KeyType::KeyPair],
        }
    }

    /// Verifies a raw `signature` over `signing_input`. Returns `Ok(false)` if the signature
    /// does not verify and an error if `jwk` cannot be used with this algorithm.
    pub fn verify(
        self,
        jwk: &JsonWebKey<'_>,
        signing_input: &[u8],
        signature: &[u8],
    ) -> Result<bool, KeyError> {
        match self {
            Self::Hs256 => Hs256.verify_with_jwk(jwk, signing_input, signature),
            Self::Hs384 => Hs384.verify_with_jwk(jwk, signing_input, signature),
            Self::Hs512 => Hs512.verify_with_jwk(jwk, signing_input, signature),
            #[cfg(feature = "rsa")]
            Self::Rsa(rsa) => rsa.verify_with_jwk(jwk, signing_input, signature),
            Self::Es256 => Es256.verify_with_jwk(jwk, signing_input, signature),
            Self::Es384 => Es384.verify_with_jwk(jwk, signing_input, signature),
            #[cfg(feature = "ed25519")]
            Self::EdDsa => Ed25519.verify_with_jwk(jwk, signing_input, signature),
        }
    }

    /// Signs `signing_input` with the private key in `jwk`.
    pub fn sign(self, jwk: &JsonWebKey<'_>, signing_input: &[u8]) -> Result<Vec<u8>, KeyError> {
        match self {
            Self::Hs256 => Hs256.sign_with_jwk(jwk, signing_input),
            Self::Hs384 => Hs384.sign_with_jwk(jwk, signing_input),
            Self::Hs512 => Hs512.sign_with_jwk(jwk, signing_input),
            #[cfg(feature = "rsa")]
            Self::Rsa(rsa) => rsa.sign_with_jwk(jwk, signing_input),
            Self::Es256 => Es256.sign_with_jwk(jwk, signing_input),
            Self::Es384 => Es384.sign_with_jwk(jwk, signing_input),
            #[cfg(feature = "ed25519")]
            Self::EdDsa => Ed25519.sign_with_jwk(jwk, signing_input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut names: Vec<_> = SignatureAlgorithm::all().map(SignatureAlgorithm::name).collect();
        let len = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), len);
        assert!(names.contains(&"ES384"));
    }

    #[test]
    fn key_type_allow_lists() {
        assert_eq!(
            SignatureAlgorithm::Hs512.allowed_key_types(),
            [KeyType::Symmetric]
        );
        assert_eq!(
            SignatureAlgorithm::Es256.allowed_key_types(),
            [KeyType::EllipticCurve]
        );
    }
}
