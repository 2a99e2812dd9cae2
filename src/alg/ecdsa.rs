//! ECDSA signatures on NIST curves: `ES256` (P-256 with SHA-256) and `ES384`
//! (P-384 with SHA-384).

use anyhow::anyhow;
use sha2::{Digest, Sha256, Sha384};

use std::{borrow::Cow, num::NonZeroUsize};

use crate::{
    jwk::{JsonWebKey, JwkError, KeyType, SecretBytes},
    Algorithm, AlgorithmSignature,
};

macro_rules! define_ecdsa {
    (
        $(#[$($attr:meta)+])*
        struct $name:ident($curve:ident, $digest:ident, $alg_name:expr, $crv:expr, $field_len:expr);
    ) => {
        impl AlgorithmSignature for $curve::ecdsa::Signature {
            const LENGTH: Option<NonZeroUsize> = NonZeroUsize::new(2 * $field_len);

            fn try_from_slice(slice: &[u8]) -> anyhow::Result<Self> {
                Self::try_from(slice).map_err(|err| anyhow!(err))
            }

            fn as_bytes(&self) -> Cow<'_, [u8]> {
                Cow::Owned(self.to_bytes().to_vec())
            }
        }

        $(#[$($attr)+])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name;

        impl Algorithm for $name {
            type SigningKey = $curve::ecdsa::SigningKey;
            type VerifyingKey = $curve::ecdsa::VerifyingKey;
            type Signature = $curve::ecdsa::Signature;

            fn name(&self) -> Cow<'static, str> {
                Cow::Borrowed($alg_name)
            }

            fn sign(&self, signing_key: &Self::SigningKey, message: &[u8]) -> Self::Signature {
                use $curve::ecdsa::signature::DigestSigner;

                let mut digest = $digest::default();
                digest.update(message);
                signing_key.sign_digest(digest)
            }

            fn verify_signature(
                &self,
                signature: &Self::Signature,
                verifying_key: &Self::VerifyingKey,
                message: &[u8],
            ) -> bool {
                use $curve::ecdsa::signature::DigestVerifier;

                let mut digest = $digest::default();
                digest.update(message);
                verifying_key.verify_digest(digest, signature).is_ok()
            }
        }

        impl From<&$curve::ecdsa::VerifyingKey> for JsonWebKey<'static> {
            fn from(key: &$curve::ecdsa::VerifyingKey) -> JsonWebKey<'static> {
                let point = key.to_encoded_point(false);
                JsonWebKey::EllipticCurve {
                    curve: Cow::Borrowed($crv),
                    x: Cow::Owned(point.x().map(|x| x.to_vec()).unwrap_or_default()),
                    y: Cow::Owned(point.y().map(|y| y.to_vec()).unwrap_or_default()),
                    secret: None,
                }
            }
        }

        impl From<&$curve::ecdsa::SigningKey> for JsonWebKey<'static> {
            fn from(key: &$curve::ecdsa::SigningKey) -> JsonWebKey<'static> {
                let mut jwk = JsonWebKey::from(key.verifying_key());
                if let JsonWebKey::EllipticCurve { secret, .. } = &mut jwk {
                    *secret = Some(SecretBytes::owned(key.to_bytes().to_vec()));
                }
                jwk
            }
        }

        impl TryFrom<&JsonWebKey<'_>> for $curve::ecdsa::VerifyingKey {
            type Error = JwkError;

            fn try_from(jwk: &JsonWebKey<'_>) -> Result<Self, Self::Error> {
                let JsonWebKey::EllipticCurve { curve, x, y, .. } = jwk else {
                    return Err(JwkError::key_type(jwk, KeyType::EllipticCurve));
                };
                JsonWebKey::ensure_curve(curve, $crv)?;
                JsonWebKey::ensure_len("x", x, $field_len)?;
                JsonWebKey::ensure_len("y", y, $field_len)?;

                let mut key_bytes = [0_u8; 2 * $field_len + 1];
                key_bytes[0] = 4; // uncompressed key marker
                key_bytes[1..=$field_len].copy_from_slice(x);
                key_bytes[(1 + $field_len)..].copy_from_slice(y);
                Self::from_sec1_bytes(&key_bytes[..]).map_err(|err| JwkError::malformed("x", err))
            }
        }

        impl TryFrom<&JsonWebKey<'_>> for $curve::ecdsa::SigningKey {
            type Error = JwkError;

            fn try_from(jwk: &JsonWebKey<'_>) -> Result<Self, Self::Error> {
                let JsonWebKey::EllipticCurve { secret, .. } = jwk else {
                    return Err(JwkError::key_type(jwk, KeyType::EllipticCurve));
                };
                let verifying_key = $curve::ecdsa::VerifyingKey::try_from(jwk)?;
                let sk_bytes = secret.as_deref();
                let sk_bytes = sk_bytes.ok_or_else(|| JwkError::NoField("d".into()))?;
                JsonWebKey::ensure_len("d", sk_bytes, $field_len)?;

                let signing_key =
                    Self::from_slice(sk_bytes).map_err(|err| JwkError::malformed("d", err))?;
                if *signing_key.verifying_key() == verifying_key {
                    Ok(signing_key)
                } else {
                    Err(JwkError::custom(anyhow!(
                        "Private key does not match the public point"
                    )))
                }
            }
        }
    };
}

define_ecdsa! {
    /// `ES256` signing algorithm. Implements elliptic curve digital signatures (ECDSA)
    /// on the secp256r1 curve (aka P-256).
    struct Es256(p256, Sha256, "ES256", "P-256", 32);
}

define_ecdsa! {
    /// `ES384` signing algorithm. Implements elliptic curve digital signatures (ECDSA)
    /// on the secp384r1 curve (aka P-384).
    struct Es384(p384, Sha384, "ES384", "P-384", 48);
}
