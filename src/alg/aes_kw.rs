//! Symmetric key wrapping: `A*KW` (RFC 3394) and `A*GCMKW`.

use aes_kw::{KekAes128, KekAes192, KekAes256};
use anyhow::anyhow;
use base64ct::{Base64UrlUnpadded, Encoding};
use rand_core::{CryptoRng, RngCore};
use serde_json::Value;

use core::fmt;

use super::aes_gcm;
use crate::{
    jwk::{JsonWebKey, SecretBytes},
    CompleteHeader, Header, KeyError,
};

/// Unwraps a CEK with AES Key Wrap. The AES variant is selected by the KEK length.
pub(crate) fn aes_unwrap(kek: &[u8], wrapped: &[u8]) -> anyhow::Result<SecretBytes<'static>> {
    let unwrapped = match kek.len() {
        16 => KekAes128::try_from(kek)?.unwrap_vec(wrapped)?,
        24 => KekAes192::try_from(kek)?.unwrap_vec(wrapped)?,
        32 => KekAes256::try_from(kek)?.unwrap_vec(wrapped)?,
        len => return Err(anyhow!("invalid AES-KW key length: {len}")),
    };
    Ok(SecretBytes::owned(unwrapped))
}

/// Wraps a CEK with AES Key Wrap.
pub(crate) fn aes_wrap(kek: &[u8], cek: &[u8]) -> anyhow::Result<Vec<u8>> {
    Ok(match kek.len() {
        16 => KekAes128::try_from(kek)?.wrap_vec(cek)?,
        24 => KekAes192::try_from(kek)?.wrap_vec(cek)?,
        32 => KekAes256::try_from(kek)?.wrap_vec(cek)?,
        len => return Err(anyhow!("invalid AES-KW key length: {len}")),
    })
}

/// Symmetric key wrapping algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyWrapping {
    /// `A128KW`
    A128Kw,
    /// `A192KW`
    A192Kw,
    /// `A256KW`
    A256Kw,
    /// `A128GCMKW`; the IV and tag are carried in the `iv` / `tag` header parameters.
    A128GcmKw,
    /// `A192GCMKW`
    A192GcmKw,
    /// `A256GCMKW`
    A256GcmKw,
}

impl fmt::Display for KeyWrapping {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl KeyWrapping {
    pub(crate) const ALL: [Self; 6] = [
        Self::A128Kw,
        Self::A192Kw,
        Self::A256Kw,
        Self::A128GcmKw,
        Self::A192GcmKw,
        Self::A256GcmKw,
    ];

    /// Returns the algorithm name.
    pub fn name(self) -> &'static str {
        match self {
            Self::A128Kw => "A128KW",
            Self::A192Kw => "A192KW",
            Self::A256Kw => "A256KW",
            Self::A128GcmKw => "A128GCMKW",
            Self::A192GcmKw => "A192GCMKW",
            Self::A256GcmKw => "A256GCMKW",
        }
    }

    /// Returns the byte length of the key encryption key.
    pub fn key_len(self) -> usize {
        match self {
            Self::A128Kw | Self::A128GcmKw => 16,
            Self::A192Kw | Self::A192GcmKw => 24,
            Self::A256Kw | Self::A256GcmKw => 32,
        }
    }

    fn is_gcm(self) -> bool {
        matches!(self, Self::A128GcmKw | Self::A192GcmKw | Self::A256GcmKw)
    }

    fn kek<'a>(self, jwk: &'a JsonWebKey<'_>) -> Result<&'a [u8], KeyError> {
        let kek = jwk.symmetric_secret()?;
        JsonWebKey::ensure_len("k", kek, self.key_len())?;
        Ok(kek)
    }

    /// Recovers the CEK from `encrypted_key`.
    pub fn unwrap_key(
        self,
        jwk: &JsonWebKey<'_>,
        encrypted_key: &[u8],
        header: &CompleteHeader,
    ) -> Result<SecretBytes<'static>, KeyError> {
        let kek = self.kek(jwk)?;
        if self.is_gcm() {
            let iv = header.required_bytes("iv").map_err(KeyError::KeyRecovery)?;
            let tag = header.required_bytes("tag").map_err(KeyError::KeyRecovery)?;
            let cek = aes_gcm::open(kek, &iv, &[], encrypted_key, &tag)
                .map_err(KeyError::KeyRecovery)?;
            Ok(SecretBytes::owned(cek))
        } else {
            aes_unwrap(kek, encrypted_key).map_err(KeyError::KeyRecovery)
        }
    }

    /// Wraps `cek`, returning the encrypted key and header parameters to add
    /// to the recipient header (`iv` and `tag` for `A*GCMKW`).
    pub fn wrap_key<R: CryptoRng + RngCore>(
        self,
        jwk: &JsonWebKey<'_>,
        cek: &[u8],
        rng: &mut R,
    ) -> Result<(Vec<u8>, Header), KeyError> {
        let kek = self.kek(jwk)?;
        let mut header = Header::new();
        let encrypted_key = if self.is_gcm() {
            let mut iv = [0_u8; aes_gcm::IV_LEN];
            rng.fill_bytes(&mut iv);
            let (encrypted_key, tag) =
                aes_gcm::seal(kek, &iv, &[], cek).map_err(KeyError::KeyRecovery)?;
            header.insert("iv".into(), Value::from(Base64UrlUnpadded::encode_string(&iv)));
            header.insert("tag".into(), Value::from(Base64UrlUnpadded::encode_string(&tag)));
            encrypted_key
        } else {
            aes_wrap(kek, cek).map_err(KeyError::KeyRecovery)?
        };
        Ok((encrypted_key, header))
    }
}
