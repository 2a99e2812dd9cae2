//! JWS algorithms based on HMACs: `HS256`, `HS384` and `HS512`.

use anyhow::ensure;
use hmac::{
    digest::{generic_array::GenericArray, CtOutput, KeyInit},
    Hmac, Mac,
};
use rand_core::{CryptoRng, RngCore};
use sha2::{Sha256, Sha384, Sha512};
use zeroize::{Zeroize, ZeroizeOnDrop};

use std::{borrow::Cow, fmt, num::NonZeroUsize};

use crate::{
    jwk::{JsonWebKey, JwkError, KeyType, SecretBytes},
    Algorithm, AlgorithmSignature,
};

macro_rules! define_hmac_signature {
    (
        $(#[$($attr:meta)+])*
        struct $name:ident<$digest:ident>($len:expr);
    ) => {
        $(#[$($attr)+])*
        #[derive(Clone, PartialEq, Eq)]
        pub struct $name(CtOutput<Hmac<$digest>>);

        impl fmt::Debug for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.debug_tuple(stringify!($name)).field(&"_").finish()
            }
        }

        impl AlgorithmSignature for $name {
            const LENGTH: Option<NonZeroUsize> = NonZeroUsize::new($len);

            fn try_from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
                ensure!(bytes.len() == $len, "Invalid signature length");
                let bytes = GenericArray::clone_from_slice(bytes);
                Ok(Self(CtOutput::new(bytes)))
            }

            fn as_bytes(&self) -> Cow<'_, [u8]> {
                Cow::Owned(self.0.clone().into_bytes().to_vec())
            }
        }
    };
}

define_hmac_signature!(
    /// Signature produced by the [`Hs256`] algorithm.
    struct Hs256Signature<Sha256>(32);
);
define_hmac_signature!(
    /// Signature produced by the [`Hs384`] algorithm.
    struct Hs384Signature<Sha384>(48);
);
define_hmac_signature!(
    /// Signature produced by the [`Hs512`] algorithm.
    struct Hs512Signature<Sha512>(64);
);

macro_rules! define_hmac_key {
    (
        $(#[$($attr:meta)+])*
        struct $name:ident<$digest:ident>(block_size = $block_size:expr);
    ) => {
        $(#[$($attr)+])*
        #[derive(Clone, Zeroize, ZeroizeOnDrop)]
        pub struct $name(Vec<u8>);

        impl fmt::Debug for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.debug_tuple(stringify!($name)).field(&"_").finish()
            }
        }

        impl $name {
            /// Generates a random key with the length of the hash block
            /// using a cryptographically secure RNG.
            pub fn generate<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
                let mut key = $name(vec![0; $block_size]);
                rng.fill_bytes(&mut key.0);
                key
            }

            /// Creates a key from the specified `bytes`.
            pub fn new(bytes: impl AsRef<[u8]>) -> Self {
                Self(bytes.as_ref().to_vec())
            }

            /// Computes HMAC with this key and the specified `message`.
            fn hmac(&self, message: impl AsRef<[u8]>) -> CtOutput<Hmac<$digest>> {
                let mut hmac = <Hmac<$digest> as KeyInit>::new_from_slice(&self.0)
                    .expect("HMACs work with any key size");
                hmac.update(message.as_ref());
                hmac.finalize()
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl From<&$name> for JsonWebKey<'static> {
            fn from(key: &$name) -> JsonWebKey<'static> {
                JsonWebKey::Symmetric {
                    secret: SecretBytes::owned(key.0.clone()),
                }
            }
        }

        impl TryFrom<&JsonWebKey<'_>> for $name {
            type Error = JwkError;

            fn try_from(jwk: &JsonWebKey<'_>) -> Result<Self, Self::Error> {
                match jwk {
                    JsonWebKey::Symmetric { secret } => Ok(Self::new(secret)),
                    _ => Err(JwkError::key_type(jwk, KeyType::Symmetric)),
                }
            }
        }
    };
}

define_hmac_key! {
    /// Signing / verifying key for `HS256` algorithm. Zeroed on drop.
    struct Hs256Key<Sha256>(block_size = 64);
}
define_hmac_key! {
    /// Signing / verifying key for `HS384` algorithm. Zeroed on drop.
    struct Hs384Key<Sha384>(block_size = 128);
}
define_hmac_key! {
    /// Signing / verifying key for `HS512` algorithm. Zeroed on drop.
    struct Hs512Key<Sha512>(block_size = 128);
}

macro_rules! define_hmac_algorithm {
    (
        $(#[$($attr:meta)+])*
        struct $name:ident($key:ident, $signature:ident, $alg_name:expr);
    ) => {
        $(#[$($attr)+])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name;

        impl Algorithm for $name {
            type SigningKey = $key;
            type VerifyingKey = $key;
            type Signature = $signature;

            fn name(&self) -> Cow<'static, str> {
                Cow::Borrowed($alg_name)
            }

            fn sign(&self, signing_key: &Self::SigningKey, message: &[u8]) -> Self::Signature {
                $signature(signing_key.hmac(message))
            }

            fn verify_signature(
                &self,
                signature: &Self::Signature,
                verifying_key: &Self::VerifyingKey,
                message: &[u8],
            ) -> bool {
                // `CtOutput` comparison is constant-time.
                verifying_key.hmac(message) == signature.0
            }
        }
    };
}

define_hmac_algorithm! {
    /// `HS256` signing algorithm.
    ///
    /// See [RFC 7518] for details.
    ///
    /// [RFC 7518]: https://tools.ietf.org/html/rfc7518#section-3.2
    struct Hs256(Hs256Key, Hs256Signature, "HS256");
}
define_hmac_algorithm! {
    /// `HS384` signing algorithm.
    ///
    /// See [RFC 7518] for details.
    ///
    /// [RFC 7518]: https://tools.ietf.org/html/rfc7518#section-3.2
    struct Hs384(Hs384Key, Hs384Signature, "HS384");
}
define_hmac_algorithm! {
    /// `HS512` signing algorithm.
    ///
    /// See [RFC 7518] for details.
    ///
    /// [RFC 7518]: https://tools.ietf.org/html/rfc7518#section-3.2
    struct Hs512(Hs512Key, Hs512Signature, "HS512");
}
