//! `EdDSA` algorithm on the Ed25519 curve, using the `ed25519-dalek` crate.

use anyhow::anyhow;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

use std::{borrow::Cow, num::NonZeroUsize};

use crate::{
    jwk::{JsonWebKey, JwkError, KeyType, SecretBytes},
    Algorithm, AlgorithmSignature,
};

const CURVE: &str = "Ed25519";

impl AlgorithmSignature for Signature {
    const LENGTH: Option<NonZeroUsize> = NonZeroUsize::new(Signature::BYTE_SIZE);

    fn try_from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        Self::from_slice(bytes).map_err(|err| anyhow!(err))
    }

    fn as_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.to_bytes().to_vec())
    }
}

/// `EdDSA` signature algorithm using the Ed25519 elliptic curve.
///
/// Verification is strict, i.e., rejects weak public keys and malleable signatures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(docsrs, doc(cfg(feature = "ed25519")))]
pub struct Ed25519;

impl Algorithm for Ed25519 {
    type SigningKey = SigningKey;
    type VerifyingKey = VerifyingKey;
    type Signature = Signature;

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed("EdDSA")
    }

    fn sign(&self, signing_key: &Self::SigningKey, message: &[u8]) -> Self::Signature {
        signing_key.sign(message)
    }

    fn verify_signature(
        &self,
        signature: &Self::Signature,
        verifying_key: &Self::VerifyingKey,
        message: &[u8],
    ) -> bool {
        verifying_key.verify_strict(message, signature).is_ok()
    }
}

fn okp_field<'a>(jwk: &'a JsonWebKey<'_>) -> Result<(&'a [u8], Option<&'a [u8]>), JwkError> {
    let JsonWebKey::KeyPair { curve, x, secret } = jwk else {
        return Err(JwkError::key_type(jwk, KeyType::KeyPair));
    };
    JsonWebKey::ensure_curve(curve, CURVE)?;
    JsonWebKey::ensure_len("x", x, 32)?;
    Ok((x, secret.as_deref()))
}

impl From<&VerifyingKey> for JsonWebKey<'static> {
    fn from(key: &VerifyingKey) -> JsonWebKey<'static> {
        JsonWebKey::KeyPair {
            curve: Cow::Borrowed(CURVE),
            x: Cow::Owned(key.to_bytes().to_vec()),
            secret: None,
        }
    }
}

impl From<&SigningKey> for JsonWebKey<'static> {
    fn from(key: &SigningKey) -> JsonWebKey<'static> {
        JsonWebKey::KeyPair {
            curve: Cow::Borrowed(CURVE),
            x: Cow::Owned(key.verifying_key().to_bytes().to_vec()),
            secret: Some(SecretBytes::owned(key.to_bytes().to_vec())),
        }
    }
}

impl TryFrom<&JsonWebKey<'_>> for VerifyingKey {
    type Error = JwkError;

    fn try_from(jwk: &JsonWebKey<'_>) -> Result<Self, Self::Error> {
        let (x, _) = okp_field(jwk)?;
        let mut bytes = [0_u8; 32];
        bytes.copy_from_slice(x);
        Self::from_bytes(&bytes).map_err(|err| JwkError::malformed("x", anyhow!(err)))
    }
}

impl TryFrom<&JsonWebKey<'_>> for SigningKey {
    type Error = JwkError;

    fn try_from(jwk: &JsonWebKey<'_>) -> Result<Self, Self::Error> {
        let (x, seed) = okp_field(jwk)?;
        let seed = seed.ok_or_else(|| JwkError::NoField("d".into()))?;
        JsonWebKey::ensure_len("d", seed, 32)?;

        let mut seed_bytes = [0_u8; 32];
        seed_bytes.copy_from_slice(seed);
        let signing_key = Self::from_bytes(&seed_bytes);
        zeroize::Zeroize::zeroize(&mut seed_bytes);

        if signing_key.verifying_key().as_bytes()[..] == *x {
            Ok(signing_key)
        } else {
            Err(JwkError::custom(anyhow!(
                "Private key does not match the public key"
            )))
        }
    }
}
