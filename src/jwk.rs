//! [JSON Web Keys](https://tools.ietf.org/html/rfc7517.html) (JWK) and key sets as consumed
//! by the decryption and verification pipelines.
//!
//! A [`Jwk`] consists of the key material ([`JsonWebKey`]) and the common [`KeyParams`]
//! (`use`, `key_ops`, `alg`, `kid`) that restrict how the key may be used.
//! Keys can be (de)serialized using [`serde`] infrastructure.
//!
//! [`serde`]: https://crates.io/crates/serde
//!
//! # Examples
//!
//! ```
//! use jwx_compact::jwk::{Jwk, JwkSet, KeyType};
//!
//! # fn main() -> anyhow::Result<()> {
//! let json_str = r#"{
//!     "kty": "oct",
//!     "k": "qC57l_uxcm7Nm3K-ct4GFjx8tM1U8CZ0NLBvdQstiS8",
//!     "alg": "A256GCMKW",
//!     "use": "enc"
//! }"#;
//! let jwk: Jwk = serde_json::from_str(json_str)?;
//! assert_eq!(jwk.key_type(), KeyType::Symmetric);
//! assert_eq!(jwk.algorithm(), Some("A256GCMKW"));
//!
//! let key_set = JwkSet::from(jwk);
//! assert_eq!(key_set.len(), 1);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use std::{borrow::Cow, fmt, ops};

/// Type of a [`JsonWebKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyType {
    /// Public or private RSA key. Maps to the `RSA` value of the `kty` field for JWKs.
    Rsa,
    /// Public or private key on an elliptic curve. Maps to the `EC` value
    /// of the `kty` field for JWKs.
    EllipticCurve,
    /// Symmetric key. Maps to the `oct` value of the `kty` field for JWKs.
    Symmetric,
    /// Octet key pair, e.g. for Ed25519. Maps to the `OKP` value of the `kty` field for JWKs.
    KeyPair,
}

impl fmt::Display for KeyType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Rsa => "RSA",
            Self::EllipticCurve => "EC",
            Self::Symmetric => "oct",
            Self::KeyPair => "OKP",
        })
    }
}

/// Errors that can occur when transforming a [`JsonWebKey`] into the presentation specific for
/// a crypto backend.
#[derive(Debug)]
#[non_exhaustive]
pub enum JwkError {
    /// Required field is absent from JWK.
    NoField(String),
    /// Key type (the `kty` field) is not as expected.
    UnexpectedKeyType {
        /// Expected key type.
        expected: KeyType,
        /// Actual key type.
        actual: KeyType,
    },
    /// JWK field has an unexpected value.
    UnexpectedValue {
        /// Field name.
        field: String,
        /// Expected value of the field.
        expected: String,
        /// Actual value of the field.
        actual: String,
    },
    /// JWK field has an unexpected byte length.
    UnexpectedLen {
        /// Field name.
        field: String,
        /// Expected byte length of the field.
        expected: usize,
        /// Actual byte length of the field.
        actual: usize,
    },
    /// JWK field has the expected shape, but its value is rejected by the crypto backend
    /// (e.g., coordinates do not describe a curve point).
    MalformedField {
        /// Field name.
        field: String,
        /// Error reported by the backend.
        reason: anyhow::Error,
    },
    /// Custom error specific to a crypto backend.
    Custom(anyhow::Error),
}

impl fmt::Display for JwkError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedKeyType { expected, actual } => {
                write!(
                    formatter,
                    "Unexpected key type: {actual} (expected {expected})"
                )
            }
            Self::NoField(field) => write!(formatter, "field `{field}` is absent from JWK"),
            Self::UnexpectedValue {
                field,
                expected,
                actual,
            } => {
                write!(
                    formatter,
                    "field `{field}` has unexpected value (expected: {expected}, got: {actual})"
                )
            }
            Self::UnexpectedLen {
                field,
                expected,
                actual,
            } => {
                write!(
                    formatter,
                    "field `{field}` has unexpected length (expected: {expected}, got: {actual})"
                )
            }
            Self::MalformedField { field, reason } => {
                write!(formatter, "field `{field}` is malformed: {reason}")
            }
            Self::Custom(err) => fmt::Display::fmt(err, formatter),
        }
    }
}

impl std::error::Error for JwkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedField { reason: err, .. } | Self::Custom(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl JwkError {
    /// Creates a `Custom` error variant.
    pub fn custom(err: impl Into<anyhow::Error>) -> Self {
        Self::Custom(err.into())
    }

    pub(crate) fn malformed(field: &str, reason: impl Into<anyhow::Error>) -> Self {
        Self::MalformedField {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn key_type(jwk: &JsonWebKey<'_>, expected: KeyType) -> Self {
        let actual = jwk.key_type();
        debug_assert_ne!(actual, expected);
        Self::UnexpectedKeyType { expected, actual }
    }
}

/// Generic container for secret bytes, which can be either owned or borrowed.
/// If owned, bytes are zeroized on drop.
///
/// Comparisons on `SecretBytes` are constant-time, but other operations (e.g., deserialization)
/// may be var-time.
///
/// Represented in JSON as a base64-url encoded string with no padding.
#[derive(Clone)]
pub struct SecretBytes<'a>(Cow<'a, [u8]>);

impl<'a> SecretBytes<'a> {
    /// Creates secret bytes from a borrowed slice.
    pub fn borrowed(bytes: &'a [u8]) -> Self {
        Self(Cow::Borrowed(bytes))
    }

    /// Creates secret bytes from an owned `Vec`.
    pub fn owned(bytes: Vec<u8>) -> Self {
        Self(Cow::Owned(bytes))
    }
}

impl fmt::Debug for SecretBytes<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SecretBytes")
            .field("len", &self.0.len())
            .finish()
    }
}

impl Drop for SecretBytes<'_> {
    fn drop(&mut self) {
        // if bytes are borrowed, we don't need to perform any special cleaning.
        if let Cow::Owned(bytes) = &mut self.0 {
            Zeroize::zeroize(bytes);
        }
    }
}

impl ops::Deref for SecretBytes<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for SecretBytes<'_> {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl PartialEq for SecretBytes<'_> {
    fn eq(&self, other: &Self) -> bool {
        subtle::ConstantTimeEq::ct_eq(self.as_ref(), other.as_ref()).into()
    }
}

impl Serialize for SecretBytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        base64url::serialize(self.as_ref(), serializer)
    }
}

impl<'de> Deserialize<'de> for SecretBytes<'_> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        base64url::deserialize(deserializer).map(SecretBytes)
    }
}

/// Key material of a JWK.
///
/// See [RFC 7518] for the details about key presentation.
///
/// [RFC 7518]: https://tools.ietf.org/html/rfc7518#section-6
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kty")]
#[non_exhaustive]
pub enum JsonWebKey<'a> {
    /// Public or private RSA key. Has `kty` field set to `RSA`.
    #[serde(rename = "RSA")]
    Rsa {
        /// Key modulus (`n`). Serialized in the base64-url encoding using
        /// the big endian presentation with the minimum necessary number of bytes.
        #[serde(rename = "n", with = "base64url")]
        modulus: Cow<'a, [u8]>,
        /// Public exponent (`e`). Serialized in the base64-url encoding using
        /// the big endian presentation with the minimum necessary number of bytes.
        #[serde(rename = "e", with = "base64url")]
        public_exponent: Cow<'a, [u8]>,
        /// Private RSA parameters. Only present for private keys.
        #[serde(flatten)]
        private_parts: Option<RsaPrivateParts<'a>>,
    },
    /// Public or private key on an elliptic curve. Has `kty` field set to `EC`.
    #[serde(rename = "EC")]
    EllipticCurve {
        /// Curve name (`crv`), such as `P-256`.
        #[serde(rename = "crv")]
        curve: Cow<'a, str>,
        /// `x` coordinate of the curve point. Serialized in the base64-url encoding.
        #[serde(with = "base64url")]
        x: Cow<'a, [u8]>,
        /// `y` coordinate of the curve point. Serialized in the base64-url encoding.
        #[serde(with = "base64url")]
        y: Cow<'a, [u8]>,
        /// Secret scalar (not present for public keys). Serialized in the base64-url encoding.
        #[serde(rename = "d", default, skip_serializing_if = "Option::is_none")]
        secret: Option<SecretBytes<'a>>,
    },
    /// Generic symmetric key, e.g. for `HS256` or `A128KW` algorithms.
    /// Has `kty` field set to `oct`.
    #[serde(rename = "oct")]
    Symmetric {
        /// Bytes representing this key. Serialized in the base64-url encoding.
        #[serde(rename = "k")]
        secret: SecretBytes<'a>,
    },
    /// Generic asymmetric key. This key type is used, for example for Ed25519 keys.
    #[serde(rename = "OKP")]
    KeyPair {
        /// Curve name (`crv`), such as `Ed25519`.
        #[serde(rename = "crv")]
        curve: Cow<'a, str>,
        /// Public key. Serialized in the base64-url encoding.
        #[serde(with = "base64url")]
        x: Cow<'a, [u8]>,
        /// Secret key (not present for public keys). Serialized in the base64-url encoding.
        /// For Ed25519, this is the *seed*.
        #[serde(rename = "d", default, skip_serializing_if = "Option::is_none")]
        secret: Option<SecretBytes<'a>>,
    },
}

impl JsonWebKey<'_> {
    /// Gets the type of this key.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Rsa { .. } => KeyType::Rsa,
            Self::EllipticCurve { .. } => KeyType::EllipticCurve,
            Self::Symmetric { .. } => KeyType::Symmetric,
            Self::KeyPair { .. } => KeyType::KeyPair,
        }
    }

    /// Returns a copy of this key with private parts removed. Symmetric keys are copied as is.
    pub fn to_public(&self) -> JsonWebKey<'static> {
        match self {
            Self::Rsa {
                modulus,
                public_exponent,
                ..
            } => JsonWebKey::Rsa {
                modulus: Cow::Owned(modulus.to_vec()),
                public_exponent: Cow::Owned(public_exponent.to_vec()),
                private_parts: None,
            },

            Self::EllipticCurve { curve, x, y, .. } => JsonWebKey::EllipticCurve {
                curve: Cow::Owned(curve.to_string()),
                x: Cow::Owned(x.to_vec()),
                y: Cow::Owned(y.to_vec()),
                secret: None,
            },

            Self::Symmetric { secret } => JsonWebKey::Symmetric {
                secret: SecretBytes::owned(secret.to_vec()),
            },

            Self::KeyPair { curve, x, .. } => JsonWebKey::KeyPair {
                curve: Cow::Owned(curve.to_string()),
                x: Cow::Owned(x.to_vec()),
                secret: None,
            },
        }
    }

    /// Returns the symmetric secret of an `oct` key.
    pub fn symmetric_secret(&self) -> Result<&[u8], JwkError> {
        match self {
            Self::Symmetric { secret } => Ok(secret),
            _ => Err(JwkError::key_type(self, KeyType::Symmetric)),
        }
    }

    pub(crate) fn ensure_curve(curve: &str, expected: &str) -> Result<(), JwkError> {
        if curve == expected {
            Ok(())
        } else {
            Err(JwkError::UnexpectedValue {
                field: "crv".to_owned(),
                expected: expected.to_owned(),
                actual: curve.to_owned(),
            })
        }
    }

    pub(crate) fn ensure_len(
        field: &str,
        bytes: &[u8],
        expected_len: usize,
    ) -> Result<(), JwkError> {
        if bytes.len() == expected_len {
            Ok(())
        } else {
            Err(JwkError::UnexpectedLen {
                field: field.to_owned(),
                expected: expected_len,
                actual: bytes.len(),
            })
        }
    }
}

/// Parts of [`JsonWebKey::Rsa`] that are specific to private keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsaPrivateParts<'a> {
    /// Private exponent (`d`). Serialized in the base64-url encoding using
    /// the big endian presentation with the minimum necessary number of bytes.
    #[serde(rename = "d")]
    pub private_exponent: SecretBytes<'a>,
    /// First prime factor (`p`).
    #[serde(rename = "p")]
    pub prime_factor_p: SecretBytes<'a>,
    /// Second prime factor (`q`).
    #[serde(rename = "q")]
    pub prime_factor_q: SecretBytes<'a>,
    /// First factor CRT exponent (`dp`).
    #[serde(rename = "dp", default, skip_serializing_if = "Option::is_none")]
    pub p_crt_exponent: Option<SecretBytes<'a>>,
    /// Second factor CRT exponent (`dq`).
    #[serde(rename = "dq", default, skip_serializing_if = "Option::is_none")]
    pub q_crt_exponent: Option<SecretBytes<'a>>,
    /// CRT coefficient of the second factor (`qi`).
    #[serde(rename = "qi", default, skip_serializing_if = "Option::is_none")]
    pub q_crt_coefficient: Option<SecretBytes<'a>>,
}

/// Common JWK parameters restricting the use of a key ([RFC 7517, section 4]).
///
/// [RFC 7517, section 4]: https://tools.ietf.org/html/rfc7517#section-4
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyParams {
    /// Intended use of the key (`use`), e.g. `sig` or `enc`.
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// Operations the key is intended for (`key_ops`), e.g. `verify` or `unwrapKey`.
    #[serde(rename = "key_ops", default, skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<String>>,
    /// Algorithm the key is bound to (`alg`).
    #[serde(rename = "alg", default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    /// Key identifier (`kid`).
    #[serde(rename = "kid", default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,
}

/// JSON Web Key: key material together with [`KeyParams`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key material.
    #[serde(flatten)]
    pub key: JsonWebKey<'static>,
    /// Common parameters.
    #[serde(flatten)]
    pub params: KeyParams,
}

impl From<JsonWebKey<'static>> for Jwk {
    fn from(key: JsonWebKey<'static>) -> Self {
        Self {
            key,
            params: KeyParams::default(),
        }
    }
}

impl Jwk {
    /// Creates a symmetric (`oct`) key with the specified secret.
    pub fn symmetric(secret: impl AsRef<[u8]>) -> Self {
        Self::from(JsonWebKey::Symmetric {
            secret: SecretBytes::owned(secret.as_ref().to_vec()),
        })
    }

    /// Sets the `use` parameter.
    #[must_use]
    pub fn with_usage(mut self, key_use: impl Into<String>) -> Self {
        self.params.key_use = Some(key_use.into());
        self
    }

    /// Sets the `key_ops` parameter.
    #[must_use]
    pub fn with_operations<S: Into<String>>(mut self, ops: impl IntoIterator<Item = S>) -> Self {
        self.params.key_ops = Some(ops.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the `alg` parameter.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.params.algorithm = Some(algorithm.into());
        self
    }

    /// Sets the `kid` parameter.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.params.key_id = Some(key_id.into());
        self
    }

    /// Gets the type of this key.
    pub fn key_type(&self) -> KeyType {
        self.key.key_type()
    }

    /// Returns the `use` parameter, if any.
    pub fn key_use(&self) -> Option<&str> {
        self.params.key_use.as_deref()
    }

    /// Returns the `key_ops` parameter, if any.
    pub fn key_ops(&self) -> Option<&[String]> {
        self.params.key_ops.as_deref()
    }

    /// Returns the `alg` parameter, if any.
    pub fn algorithm(&self) -> Option<&str> {
        self.params.algorithm.as_deref()
    }

    /// Returns the `kid` parameter, if any.
    pub fn key_id(&self) -> Option<&str> {
        self.params.key_id.as_deref()
    }

    /// Returns a copy of this key with private parts removed.
    pub fn to_public(&self) -> Self {
        Self {
            key: self.key.to_public(),
            params: self.params.clone(),
        }
    }
}

/// Ordered collection of [`Jwk`]s. The order is the trial order used by the pipelines;
/// duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwkSet {
    keys: Vec<Jwk>,
}

impl JwkSet {
    /// Creates an empty key set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a key to the end of this set.
    pub fn push(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// Returns the number of keys in this set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Checks whether this set is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates over keys in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Jwk> + '_ {
        self.keys.iter()
    }

    /// Gets a key by its index.
    pub fn get(&self, index: usize) -> Option<&Jwk> {
        self.keys.get(index)
    }
}

impl From<Jwk> for JwkSet {
    fn from(key: Jwk) -> Self {
        Self { keys: vec![key] }
    }
}

impl FromIterator<Jwk> for JwkSet {
    fn from_iter<I: IntoIterator<Item = Jwk>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a JwkSet {
    type Item = &'a Jwk;
    type IntoIter = std::slice::Iter<'a, Jwk>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}

pub(crate) mod base64url {
    use base64ct::{Base64UrlUnpadded, Encoding};
    use serde::{
        de::{Error as DeError, Unexpected, Visitor},
        Deserializer, Serializer,
    };

    use std::{borrow::Cow, fmt};

    pub fn serialize<S>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&Base64UrlUnpadded::encode_string(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Cow<'static, [u8]>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Base64Visitor;

        impl Visitor<'_> for Base64Visitor {
            type Value = Vec<u8>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "base64url-encoded data")
            }

            fn visit_str<E: DeError>(self, value: &str) -> Result<Self::Value, E> {
                Base64UrlUnpadded::decode_vec(value)
                    .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_str(Base64Visitor).map(Cow::Owned)
    }
}
