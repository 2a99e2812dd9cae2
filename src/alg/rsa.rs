//! RSA-based JWS algorithms (`RS*` and `PS*`) and conversions between RSA keys and JWKs.

pub use rsa::{RsaPrivateKey, RsaPublicKey};

use rand_core::{CryptoRng, RngCore};
use rsa::{
    traits::{PrivateKeyParts, PublicKeyParts},
    BigUint, Pkcs1v15Sign, Pss,
};
use sha2::{Sha256, Sha384, Sha512};

use std::{borrow::Cow, fmt};

use crate::{
    jwk::{JsonWebKey, JwkError, KeyType, RsaPrivateParts, SecretBytes},
    Algorithm, AlgorithmSignature, HashAlgorithm,
};

/// RSA signature.
#[derive(Debug)]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
pub struct RsaSignature(Vec<u8>);

impl AlgorithmSignature for RsaSignature {
    fn try_from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        match bytes.len() {
            256 | 384 | 512 => Ok(RsaSignature(bytes.to_vec())),
            _ => Err(anyhow::anyhow!("Unsupported signature length")),
        }
    }

    fn as_bytes(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.0)
    }
}

/// RSA hash algorithm.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
enum HashAlg {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlg {
    fn hash(self) -> HashAlgorithm {
        match self {
            Self::Sha256 => HashAlgorithm::Sha256,
            Self::Sha384 => HashAlgorithm::Sha384,
            Self::Sha512 => HashAlgorithm::Sha512,
        }
    }
}

/// RSA padding algorithm.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
enum Padding {
    Pkcs1v15,
    Pss,
}

/// Runs `$body` with `$scheme` bound to the padding scheme of the RSA algorithm.
macro_rules! with_scheme {
    ($rsa:expr, $scheme:ident => $body:expr) => {
        // The PSS salt length is the size of the hash function output, per RFC 7518, section 3.5.
        match ($rsa.padding_alg, $rsa.hash_alg) {
            (Padding::Pkcs1v15, HashAlg::Sha256) => {
                let $scheme = Pkcs1v15Sign::new::<Sha256>();
                $body
            }
            (Padding::Pkcs1v15, HashAlg::Sha384) => {
                let $scheme = Pkcs1v15Sign::new::<Sha384>();
                $body
            }
            (Padding::Pkcs1v15, HashAlg::Sha512) => {
                let $scheme = Pkcs1v15Sign::new::<Sha512>();
                $body
            }
            (Padding::Pss, HashAlg::Sha256) => {
                let $scheme = Pss::new::<Sha256>();
                $body
            }
            (Padding::Pss, HashAlg::Sha384) => {
                let $scheme = Pss::new::<Sha384>();
                $body
            }
            (Padding::Pss, HashAlg::Sha512) => {
                let $scheme = Pss::new::<Sha512>();
                $body
            }
        }
    };
}

/// Bit length of an RSA key modulus (aka RSA key length).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[non_exhaustive]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
pub enum ModulusBits {
    /// 2048 bits. This is the minimum recommended key length as of 2020.
    TwoKibibytes,
    /// 3072 bits.
    ThreeKibibytes,
    /// 4096 bits.
    FourKibibytes,
}

impl ModulusBits {
    /// Converts this length to the numeric value.
    pub fn bits(self) -> usize {
        match self {
            Self::TwoKibibytes => 2_048,
            Self::ThreeKibibytes => 3_072,
            Self::FourKibibytes => 4_096,
        }
    }
}

/// Integrity algorithm using [RSA] digital signatures.
///
/// Depending on the variation, the algorithm employs PKCS#1 v1.5 or PSS padding and
/// one of the hash functions from the SHA-2 family: SHA-256, SHA-384, or SHA-512.
/// See [RFC 7518] for more details. Depending on the chosen parameters,
/// the name of the algorithm is one of `RS256`, `RS384`, `RS512`, `PS256`, `PS384`, `PS512`:
///
/// - `R` / `P` denote the padding scheme: PKCS#1 v1.5 for `R`, PSS for `P`
/// - `256` / `384` / `512` denote the hash function
///
/// [RSA]: https://en.wikipedia.org/wiki/RSA_(cryptosystem)
/// [RFC 7518]: https://www.rfc-editor.org/rfc/rfc7518.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
pub struct Rsa {
    hash_alg: HashAlg,
    padding_alg: Padding,
}

impl Algorithm for Rsa {
    type SigningKey = RsaPrivateKey;
    type VerifyingKey = RsaPublicKey;
    type Signature = RsaSignature;

    fn name(&self) -> Cow<'static, str> {
        Cow::Borrowed(self.alg_name())
    }

    fn sign(&self, signing_key: &Self::SigningKey, message: &[u8]) -> Self::Signature {
        let digest = self.hash_alg.hash().digest(message);
        let signature = with_scheme!(self, scheme => {
            signing_key.sign_with_rng(&mut rand_core::OsRng, scheme, &digest)
        });
        RsaSignature(signature.expect("Unexpected RSA signature failure"))
    }

    fn verify_signature(
        &self,
        signature: &Self::Signature,
        verifying_key: &Self::VerifyingKey,
        message: &[u8],
    ) -> bool {
        let digest = self.hash_alg.hash().digest(message);
        with_scheme!(self, scheme => {
            verifying_key.verify(scheme, &digest, &signature.0).is_ok()
        })
    }
}

impl Rsa {
    const fn new(hash_alg: HashAlg, padding_alg: Padding) -> Self {
        Rsa {
            hash_alg,
            padding_alg,
        }
    }

    /// RSA with SHA-256 and PKCS#1 v1.5 padding.
    pub const fn rs256() -> Rsa {
        Rsa::new(HashAlg::Sha256, Padding::Pkcs1v15)
    }

    /// RSA with SHA-384 and PKCS#1 v1.5 padding.
    pub const fn rs384() -> Rsa {
        Rsa::new(HashAlg::Sha384, Padding::Pkcs1v15)
    }

    /// RSA with SHA-512 and PKCS#1 v1.5 padding.
    pub const fn rs512() -> Rsa {
        Rsa::new(HashAlg::Sha512, Padding::Pkcs1v15)
    }

    /// RSA with SHA-256 and PSS padding.
    pub const fn ps256() -> Rsa {
        Rsa::new(HashAlg::Sha256, Padding::Pss)
    }

    /// RSA with SHA-384 and PSS padding.
    pub const fn ps384() -> Rsa {
        Rsa::new(HashAlg::Sha384, Padding::Pss)
    }

    /// RSA with SHA-512 and PSS padding.
    pub const fn ps512() -> Rsa {
        Rsa::new(HashAlg::Sha512, Padding::Pss)
    }

    pub(crate) const ALL: [Self; 6] = [
        Self::rs256(),
        Self::rs384(),
        Self::rs512(),
        Self::ps256(),
        Self::ps384(),
        Self::ps512(),
    ];

    /// RSA based on the specified algorithm name, or `None` if the name is not one of
    /// the six RSA-based JWS algorithms.
    pub fn with_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rsa| rsa.alg_name() == name)
    }

    /// Returns the algorithm name, such as `PS384`.
    pub fn alg_name(self) -> &'static str {
        match (self.padding_alg, self.hash_alg) {
            (Padding::Pkcs1v15, HashAlg::Sha256) => "RS256",
            (Padding::Pkcs1v15, HashAlg::Sha384) => "RS384",
            (Padding::Pkcs1v15, HashAlg::Sha512) => "RS512",
            (Padding::Pss, HashAlg::Sha256) => "PS256",
            (Padding::Pss, HashAlg::Sha384) => "PS384",
            (Padding::Pss, HashAlg::Sha512) => "PS512",
        }
    }

    /// Generates a new key pair with the specified modulus bit length (aka key length).
    pub fn generate<R: CryptoRng + RngCore>(
        rng: &mut R,
        modulus_bits: ModulusBits,
    ) -> rsa::errors::Result<(RsaPrivateKey, RsaPublicKey)> {
        let signing_key = RsaPrivateKey::new(rng, modulus_bits.bits())?;
        let verifying_key = signing_key.to_public_key();
        Ok((signing_key, verifying_key))
    }
}

impl fmt::Display for Rsa {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.alg_name())
    }
}

fn secret_uint(value: &BigUint) -> SecretBytes<'static> {
    SecretBytes::owned(value.to_bytes_be())
}

impl From<&RsaPublicKey> for JsonWebKey<'static> {
    fn from(key: &RsaPublicKey) -> JsonWebKey<'static> {
        JsonWebKey::Rsa {
            modulus: Cow::Owned(key.n().to_bytes_be()),
            public_exponent: Cow::Owned(key.e().to_bytes_be()),
            private_parts: None,
        }
    }
}

impl From<&RsaPrivateKey> for JsonWebKey<'static> {
    fn from(key: &RsaPrivateKey) -> JsonWebKey<'static> {
        let primes = key.primes();
        JsonWebKey::Rsa {
            modulus: Cow::Owned(key.n().to_bytes_be()),
            public_exponent: Cow::Owned(key.e().to_bytes_be()),
            private_parts: Some(RsaPrivateParts {
                private_exponent: secret_uint(key.d()),
                prime_factor_p: secret_uint(&primes[0]),
                prime_factor_q: secret_uint(&primes[1]),
                p_crt_exponent: key.dp().map(secret_uint),
                q_crt_exponent: key.dq().map(secret_uint),
                q_crt_coefficient: key.crt_coefficient().as_ref().map(secret_uint),
            }),
        }
    }
}

impl TryFrom<&JsonWebKey<'_>> for RsaPublicKey {
    type Error = JwkError;

    fn try_from(jwk: &JsonWebKey<'_>) -> Result<Self, Self::Error> {
        let JsonWebKey::Rsa {
            modulus,
            public_exponent,
            ..
        } = jwk
        else {
            return Err(JwkError::key_type(jwk, KeyType::Rsa));
        };

        let e = BigUint::from_bytes_be(public_exponent);
        let n = BigUint::from_bytes_be(modulus);
        Self::new(n, e).map_err(|err| JwkError::custom(anyhow::anyhow!(err)))
    }
}

impl TryFrom<&JsonWebKey<'_>> for RsaPrivateKey {
    type Error = JwkError;

    fn try_from(jwk: &JsonWebKey<'_>) -> Result<Self, Self::Error> {
        let JsonWebKey::Rsa {
            modulus,
            public_exponent,
            private_parts,
        } = jwk
        else {
            return Err(JwkError::key_type(jwk, KeyType::Rsa));
        };

        let RsaPrivateParts {
            private_exponent: d,
            prime_factor_p,
            prime_factor_q,
            ..
        } = private_parts
            .as_ref()
            .ok_or_else(|| JwkError::NoField("d".into()))?;

        let e = BigUint::from_bytes_be(public_exponent);
        let n = BigUint::from_bytes_be(modulus);
        let d = BigUint::from_bytes_be(d);
        let primes = vec![
            BigUint::from_bytes_be(prime_factor_p),
            BigUint::from_bytes_be(prime_factor_q),
        ];

        let key = Self::from_components(n, e, d, primes)
            .map_err(|err| JwkError::custom(anyhow::anyhow!(err)))?;
        key.validate()
            .map_err(|err| JwkError::custom(anyhow::anyhow!(err)))?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AlgorithmExt;

    use assert_matches::assert_matches;
    use rand::thread_rng;

    #[test]
    fn names_are_consistent() {
        for rsa in Rsa::ALL {
            assert_eq!(Rsa::with_name(rsa.alg_name()), Some(rsa));
            assert_eq!(rsa.name(), rsa.alg_name());
        }
        assert_eq!(Rsa::with_name("RS1"), None);
    }

    #[test]
    fn key_conversions() {
        let (private_key, public_key) =
            Rsa::generate(&mut thread_rng(), ModulusBits::TwoKibibytes).unwrap();

        let jwk = JsonWebKey::from(&private_key);
        assert_matches!(&jwk, JsonWebKey::Rsa { private_parts: Some(_), .. });
        let restored = RsaPrivateKey::try_from(&jwk).unwrap();
        assert_eq!(restored, private_key);
        assert_eq!(RsaPublicKey::try_from(&jwk).unwrap(), public_key);

        let public_jwk = JsonWebKey::from(&public_key);
        assert_eq!(public_jwk, jwk.to_public());
        assert_matches!(
            RsaPrivateKey::try_from(&public_jwk),
            Err(JwkError::NoField(field)) if field == "d"
        );
    }

    #[test]
    fn signatures_with_jwk() {
        let (private_key, _) =
            Rsa::generate(&mut thread_rng(), ModulusBits::TwoKibibytes).unwrap();
        let jwk = JsonWebKey::from(&private_key);

        for rsa in [Rsa::rs256(), Rsa::ps512()] {
            let signature = rsa.sign_with_jwk(&jwk, b"message").unwrap();
            assert_eq!(signature.len(), 256);
            assert!(rsa.verify_with_jwk(&jwk.to_public(), b"message", &signature).unwrap());
            assert!(!rsa.verify_with_jwk(&jwk, b"other", &signature).unwrap());
        }

        // Signatures are not interchangeable among paddings.
        let signature = Rsa::rs256().sign_with_jwk(&jwk, b"message").unwrap();
        assert!(!Rsa::ps256().verify_with_jwk(&jwk, b"message", &signature).unwrap());
    }
}
