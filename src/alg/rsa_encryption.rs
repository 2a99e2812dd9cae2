//! RSA key encryption: `RSA1_5`, `RSA-OAEP` and `RSA-OAEP-256`.

use rand_core::{CryptoRng, RngCore};
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::Sha256;

use core::fmt;

use crate::{
    jwk::{JsonWebKey, SecretBytes},
    KeyError,
};

/// Asymmetric encryption of the CEK with the recipient's RSA key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
pub enum RsaKeyEncryption {
    /// `RSA1_5`: RSAES-PKCS1-v1_5.
    Rsa1_5,
    /// `RSA-OAEP`: RSAES OAEP with SHA-1 and MGF1 with SHA-1.
    RsaOaep,
    /// `RSA-OAEP-256`: RSAES OAEP with SHA-256 and MGF1 with SHA-256.
    RsaOaep256,
}

impl fmt::Display for RsaKeyEncryption {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl RsaKeyEncryption {
    pub(crate) const ALL: [Self; 3] = [Self::Rsa1_5, Self::RsaOaep, Self::RsaOaep256];

    /// Returns the algorithm name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Rsa1_5 => "RSA1_5",
            Self::RsaOaep => "RSA-OAEP",
            Self::RsaOaep256 => "RSA-OAEP-256",
        }
    }

    /// Decrypts `encrypted_key` with the private RSA key. Padding errors are indistinguishable
    /// from other failures.
    pub fn decrypt_key(
        self,
        jwk: &JsonWebKey<'_>,
        encrypted_key: &[u8],
    ) -> Result<SecretBytes<'static>, KeyError> {
        let private_key = RsaPrivateKey::try_from(jwk)?;
        let cek = match self {
            Self::Rsa1_5 => private_key.decrypt(Pkcs1v15Encrypt, encrypted_key),
            Self::RsaOaep => private_key.decrypt(Oaep::new::<Sha1>(), encrypted_key),
            Self::RsaOaep256 => private_key.decrypt(Oaep::new::<Sha256>(), encrypted_key),
        };
        cek.map(SecretBytes::owned).map_err(KeyError::recovery)
    }

    /// Encrypts `cek` with the public RSA key.
    pub fn encrypt_key<R: CryptoRng + RngCore>(
        self,
        jwk: &JsonWebKey<'_>,
        cek: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>, KeyError> {
        let public_key = RsaPublicKey::try_from(jwk)?;
        let encrypted_key = match self {
            Self::Rsa1_5 => public_key.encrypt(rng, Pkcs1v15Encrypt, cek),
            Self::RsaOaep => public_key.encrypt(rng, Oaep::new::<Sha1>(), cek),
            Self::RsaOaep256 => public_key.encrypt(rng, Oaep::new::<Sha256>(), cek),
        };
        encrypted_key.map_err(KeyError::recovery)
    }
}
