//! NIST elliptic curves shared by ECDH-ES and ECDSA.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::{CryptoRng, RngCore};

use std::{borrow::Cow, fmt};

use crate::jwk::{JsonWebKey, JwkError, KeyType, SecretBytes};

/// Elliptic curve of an `EC` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Curve {
    /// NIST P-256 (aka secp256r1).
    P256,
    /// NIST P-384 (aka secp384r1).
    P384,
}

impl fmt::Display for Curve {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl Curve {
    /// Returns the curve name as used in the `crv` JWK field.
    pub fn name(self) -> &'static str {
        match self {
            Self::P256 => "P-256",
            Self::P384 => "P-384",
        }
    }

    /// Returns the byte length of a coordinate / scalar.
    pub fn field_len(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
        }
    }

    fn from_name(name: &str) -> Result<Self, JwkError> {
        match name {
            "P-256" => Ok(Self::P256),
            "P-384" => Ok(Self::P384),
            _ => Err(JwkError::UnexpectedValue {
                field: "crv".to_owned(),
                expected: "P-256 or P-384".to_owned(),
                actual: name.to_owned(),
            }),
        }
    }
}

/// Parsed `EC` key.
pub(crate) struct EcKey<'a> {
    pub curve: Curve,
    /// Uncompressed SEC1 encoding of the public point.
    pub public_point: Vec<u8>,
    pub secret: Option<&'a [u8]>,
}

impl<'a> EcKey<'a> {
    pub fn new(jwk: &'a JsonWebKey<'_>) -> Result<Self, JwkError> {
        let JsonWebKey::EllipticCurve {
            curve,
            x,
            y,
            secret,
        } = jwk
        else {
            return Err(JwkError::key_type(jwk, KeyType::EllipticCurve));
        };

        let curve = Curve::from_name(curve)?;
        JsonWebKey::ensure_len("x", x, curve.field_len())?;
        JsonWebKey::ensure_len("y", y, curve.field_len())?;
        if let Some(secret) = secret {
            JsonWebKey::ensure_len("d", secret, curve.field_len())?;
        }

        let mut public_point = Vec::with_capacity(1 + 2 * curve.field_len());
        public_point.push(4);
        public_point.extend_from_slice(x);
        public_point.extend_from_slice(y);
        Ok(Self {
            curve,
            public_point,
            secret: secret.as_deref(),
        })
    }

    pub fn secret(&self) -> Result<&'a [u8], JwkError> {
        self.secret.ok_or_else(|| JwkError::NoField("d".to_owned()))
    }
}

fn public_jwk(curve: Curve, x: &[u8], y: &[u8]) -> JsonWebKey<'static> {
    JsonWebKey::EllipticCurve {
        curve: Cow::Borrowed(curve.name()),
        x: Cow::Owned(x.to_vec()),
        y: Cow::Owned(y.to_vec()),
        secret: None,
    }
}

macro_rules! static_diffie_hellman {
    ($curve:ident, $secret:expr, $public_point:expr) => {{
        let secret = $curve::SecretKey::from_slice($secret)
            .map_err(|err| JwkError::malformed("d", err))?;
        let public = $curve::PublicKey::from_sec1_bytes($public_point)
            .map_err(|err| JwkError::malformed("x", err))?;
        let shared = $curve::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
        SecretBytes::owned(shared.raw_secret_bytes().to_vec())
    }};
}

macro_rules! ephemeral_diffie_hellman {
    ($curve:ident, $curve_id:expr, $public_point:expr, $rng:expr) => {{
        let public = $curve::PublicKey::from_sec1_bytes($public_point)
            .map_err(|err| JwkError::malformed("x", err))?;
        let ephemeral = $curve::ecdh::EphemeralSecret::random($rng);
        let shared = ephemeral.diffie_hellman(&public);
        let point = ephemeral.public_key().to_encoded_point(false);
        let (Some(x), Some(y)) = (point.x(), point.y()) else {
            return Err(JwkError::custom(anyhow::anyhow!("ephemeral point is the identity")));
        };
        let epk = public_jwk($curve_id, x, y);
        (SecretBytes::owned(shared.raw_secret_bytes().to_vec()), epk)
    }};
}

/// Computes the shared secret `Z` between a private key and a public key on the same curve.
pub(crate) fn diffie_hellman(
    private_key: &EcKey<'_>,
    public_key: &EcKey<'_>,
) -> Result<SecretBytes<'static>, JwkError> {
    if private_key.curve != public_key.curve {
        return Err(JwkError::UnexpectedValue {
            field: "crv".to_owned(),
            expected: private_key.curve.name().to_owned(),
            actual: public_key.curve.name().to_owned(),
        });
    }
    let secret = private_key.secret()?;
    Ok(match private_key.curve {
        Curve::P256 => static_diffie_hellman!(p256, secret, &public_key.public_point),
        Curve::P384 => static_diffie_hellman!(p384, secret, &public_key.public_point),
    })
}

/// Generates an ephemeral key on the curve of `public_key` and computes the shared secret
/// with it. Returns the secret and the public part of the ephemeral key.
pub(crate) fn ephemeral_diffie_hellman<R: CryptoRng + RngCore>(
    public_key: &EcKey<'_>,
    rng: &mut R,
) -> Result<(SecretBytes<'static>, JsonWebKey<'static>), JwkError> {
    let point = &public_key.public_point;
    Ok(match public_key.curve {
        Curve::P256 => ephemeral_diffie_hellman!(p256, Curve::P256, point, rng),
        Curve::P384 => ephemeral_diffie_hellman!(p384, Curve::P384, point, rng),
    })
}

/// Generates a random key pair on `curve`, in the JWK presentation.
pub fn generate_key<R: CryptoRng + RngCore>(curve: Curve, rng: &mut R) -> JsonWebKey<'static> {
    macro_rules! generate {
        ($curve:ident) => {{
            let secret = $curve::SecretKey::random(rng);
            let point = secret.public_key().to_encoded_point(false);
            let x = point.x().map(|x| x.to_vec()).unwrap_or_default();
            let y = point.y().map(|y| y.to_vec()).unwrap_or_default();
            JsonWebKey::EllipticCurve {
                curve: Cow::Borrowed(curve.name()),
                x: Cow::Owned(x),
                y: Cow::Owned(y),
                secret: Some(SecretBytes::owned(secret.to_bytes().to_vec())),
            }
        }};
    }

    match curve {
        Curve::P256 => generate!(p256),
        Curve::P384 => generate!(p384),
    }
}
