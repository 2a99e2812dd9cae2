//! Traits implemented by signature algorithms.

use std::{borrow::Cow, num::NonZeroUsize};

use crate::{
    jwk::{JsonWebKey, JwkError},
    KeyError,
};

/// Signature for a certain signing [`Algorithm`].
///
/// We require that signature can be restored from a byte slice,
/// and can be represented as a byte slice.
pub trait AlgorithmSignature: Sized {
    /// Constant byte length of signatures supported by the [`Algorithm`], or `None` if
    /// the signature length is variable.
    ///
    /// If this value is `Some(_)`, signatures with other lengths are rejected before
    /// [`Self::try_from_slice()`] is called.
    const LENGTH: Option<NonZeroUsize> = None;

    /// Attempts to restore a signature from a byte slice. This method may fail
    /// if the slice is malformed.
    fn try_from_slice(slice: &[u8]) -> anyhow::Result<Self>;

    /// Represents this signature as bytes.
    fn as_bytes(&self) -> Cow<'_, [u8]>;
}

/// JWS signing algorithm.
pub trait Algorithm {
    /// Key used when signing.
    type SigningKey;
    /// Key used when verifying signatures. May coincide with [`Self::SigningKey`] for symmetric
    /// algorithms (e.g., `HS*`).
    type VerifyingKey;
    /// Signature produced by the algorithm.
    type Signature: AlgorithmSignature;

    /// Returns the name of this algorithm, as mentioned in the `alg` header parameter.
    fn name(&self) -> Cow<'static, str>;

    /// Signs a `message` with the `signing_key`.
    fn sign(&self, signing_key: &Self::SigningKey, message: &[u8]) -> Self::Signature;

    /// Verifies the `message` against the `signature` and `verifying_key`.
    fn verify_signature(
        &self,
        signature: &Self::Signature,
        verifying_key: &Self::VerifyingKey,
        message: &[u8],
    ) -> bool;
}

/// Automatically implemented extensions of the [`Algorithm`] trait for algorithms
/// whose keys can be restored from a [`JsonWebKey`].
pub trait AlgorithmExt: Algorithm {
    /// Verifies a raw `signature` over `message` with the verifying key restored from `jwk`.
    ///
    /// A malformed signature (e.g., one with an unexpected length) is reported as `Ok(false)`;
    /// a key that cannot be used with the algorithm is reported as an error.
    fn verify_with_jwk(
        &self,
        jwk: &JsonWebKey<'_>,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, KeyError>;

    /// Signs `message` with the signing key restored from `jwk`.
    fn sign_with_jwk(&self, jwk: &JsonWebKey<'_>, message: &[u8]) -> Result<Vec<u8>, KeyError>;
}

impl<A> AlgorithmExt for A
where
    A: Algorithm,
    A::SigningKey: for<'a> TryFrom<&'a JsonWebKey<'a>, Error = JwkError>,
    A::VerifyingKey: for<'a> TryFrom<&'a JsonWebKey<'a>, Error = JwkError>,
{
    fn verify_with_jwk(
        &self,
        jwk: &JsonWebKey<'_>,
        message: &[u8],
        signature: &[u8],
    ) -> Result<bool, KeyError> {
        let verifying_key = A::VerifyingKey::try_from(jwk)?;

        if let Some(expected_len) = A::Signature::LENGTH {
            if signature.len() != expected_len.get() {
                return Ok(false);
            }
        }
        let Ok(signature) = A::Signature::try_from_slice(signature) else {
            return Ok(false);
        };
        Ok(self.verify_signature(&signature, &verifying_key, message))
    }

    fn sign_with_jwk(&self, jwk: &JsonWebKey<'_>, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        let signing_key = A::SigningKey::try_from(jwk)?;
        Ok(self.sign(&signing_key, message).as_bytes().into_owned())
    }
}
