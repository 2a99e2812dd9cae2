//! Key management algorithms, selected by the `alg` header parameter of a JWE recipient.

use anyhow::anyhow;
use rand_core::{CryptoRng, RngCore};

use core::fmt;

#[cfg(feature = "rsa")]
use super::RsaKeyEncryption;
use super::{ContentEncryptionAlgorithm, EcdhEs, EcdhEsKeyWrap, KeyWrapping};
use crate::{
    jwk::{JsonWebKey, SecretBytes},
    CompleteHeader, Header, KeyError,
};

/// `dir`: the shared symmetric key is used directly as the CEK.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DirectEncryption;

impl DirectEncryption {
    /// Returns the algorithm name.
    pub fn name(self) -> &'static str {
        "dir"
    }

    /// Returns the key material of an `oct` key as the CEK.
    pub fn cek(self, jwk: &JsonWebKey<'_>) -> Result<SecretBytes<'static>, KeyError> {
        let secret = jwk.symmetric_secret()?;
        Ok(SecretBytes::owned(secret.to_vec()))
    }
}

/// Key management algorithm: one of five mutually exclusive ways to produce or recover a CEK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyManagementAlgorithm {
    /// The key is used directly as the CEK.
    Direct(DirectEncryption),
    /// The CEK is derived from a key agreement.
    KeyAgreement(EcdhEs),
    /// A key agreement derives a key encryption key, which unwraps the CEK.
    KeyAgreementWithKeyWrapping(EcdhEsKeyWrap),
    /// The CEK is decrypted with the recipient's private key.
    #[cfg(feature = "rsa")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
    KeyEncryption(RsaKeyEncryption),
    /// The CEK is unwrapped with a shared symmetric key.
    KeyWrapping(KeyWrapping),
}

impl fmt::Display for KeyManagementAlgorithm {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

/// CEK together with its per-recipient presentation, produced on the sender side.
#[derive(Debug)]
pub struct EncryptedCek {
    /// Content encryption key.
    pub cek: SecretBytes<'static>,
    /// Value of the recipient's `encrypted_key` (empty for `dir` and `ECDH-ES`).
    pub encrypted_key: Vec<u8>,
    /// Parameters to add to the recipient header, such as `epk`, `iv` or `tag`.
    pub header: Header,
}

impl KeyManagementAlgorithm {
    /// Iterates over all key management algorithms enabled by crate features.
    pub fn all() -> impl Iterator<Item = Self> {
        let direct = [
            Self::Direct(DirectEncryption),
            Self::KeyAgreement(EcdhEs),
        ];
        #[cfg(feature = "rsa")]
        let rsa = RsaKeyEncryption::ALL.map(Self::KeyEncryption);
        #[cfg(not(feature = "rsa"))]
        let rsa: [Self; 0] = [];

        direct
            .into_iter()
            .chain(EcdhEsKeyWrap::ALL.map(Self::KeyAgreementWithKeyWrapping))
            .chain(rsa)
            .chain(KeyWrapping::ALL.map(Self::KeyWrapping))
    }

    /// Returns the algorithm name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Direct(alg) => alg.name(),
            Self::KeyAgreement(alg) => alg.name(),
            Self::KeyAgreementWithKeyWrapping(alg) => alg.name(),
            #[cfg(feature = "rsa")]
            Self::KeyEncryption(alg) => alg.name(),
            Self::KeyWrapping(alg) => alg.name(),
        }
    }

    /// Checks whether this is the `dir` algorithm.
    pub fn is_direct(self) -> bool {
        matches!(self, Self::Direct(_))
    }

    /// Recovers the CEK for a recipient.
    ///
    /// `dir` and `ECDH-ES` do not produce an encrypted key, so a recipient carrying
    /// a non-empty `encrypted_key` with them is rejected.
    pub fn recover_cek(
        self,
        jwk: &JsonWebKey<'_>,
        encrypted_key: &[u8],
        content_encryption: ContentEncryptionAlgorithm,
        header: &CompleteHeader,
    ) -> Result<SecretBytes<'static>, KeyError> {
        match self {
            Self::Direct(alg) => {
                ensure_no_encrypted_key(encrypted_key)?;
                alg.cek(jwk)
            }
            Self::KeyAgreement(alg) => {
                ensure_no_encrypted_key(encrypted_key)?;
                alg.agreement_key(
                    jwk,
                    content_encryption.cek_size(),
                    content_encryption.name(),
                    header,
                )
            }
            Self::KeyAgreementWithKeyWrapping(alg) => alg.unwrap_agreement_key(
                jwk,
                encrypted_key,
                content_encryption.cek_size(),
                header,
            ),
            #[cfg(feature = "rsa")]
            Self::KeyEncryption(alg) => alg.decrypt_key(jwk, encrypted_key),
            Self::KeyWrapping(alg) => alg.unwrap_key(jwk, encrypted_key, header),
        }
    }

    /// Produces a CEK for a recipient on the sender side.
    ///
    /// `header` is the complete header known so far; it supplies `apu` / `apv` for
    /// key agreement.
    pub fn encrypt_cek<R: CryptoRng + RngCore>(
        self,
        recipient_key: &JsonWebKey<'_>,
        content_encryption: ContentEncryptionAlgorithm,
        header: &CompleteHeader,
        rng: &mut R,
    ) -> Result<EncryptedCek, KeyError> {
        let (cek, encrypted_key, header) = match self {
            Self::Direct(alg) => (alg.cek(recipient_key)?, vec![], Header::new()),
            Self::KeyAgreement(alg) => {
                let (cek, header) = alg.sender_agreement_key(
                    recipient_key,
                    content_encryption.cek_size(),
                    content_encryption.name(),
                    header,
                    rng,
                )?;
                (cek, vec![], header)
            }
            _ => {
                let cek = content_encryption.generate_cek(rng);
                let (encrypted_key, header) = self.wrap_cek(recipient_key, &cek, header, rng)?;
                (cek, encrypted_key, header)
            }
        };

        Ok(EncryptedCek {
            cek,
            encrypted_key,
            header,
        })
    }

    /// Wraps an existing CEK for a recipient, returning the encrypted key and the parameters
    /// to add to the recipient header. This allows to share a single CEK among several
    /// recipients.
    ///
    /// Fails for `dir` and `ECDH-ES`, which determine the CEK themselves.
    pub fn wrap_cek<R: CryptoRng + RngCore>(
        self,
        recipient_key: &JsonWebKey<'_>,
        cek: &[u8],
        header: &CompleteHeader,
        rng: &mut R,
    ) -> Result<(Vec<u8>, Header), KeyError> {
        match self {
            Self::Direct(_) | Self::KeyAgreement(_) => Err(KeyError::recovery(anyhow!(
                "{self} cannot wrap an externally provided CEK"
            ))),
            Self::KeyAgreementWithKeyWrapping(alg) => {
                alg.wrap_agreement_key(recipient_key, cek, header, rng)
            }
            #[cfg(feature = "rsa")]
            Self::KeyEncryption(alg) => {
                let encrypted_key = alg.encrypt_key(recipient_key, cek, rng)?;
                Ok((encrypted_key, Header::new()))
            }
            Self::KeyWrapping(alg) => alg.wrap_key(recipient_key, cek, rng),
        }
    }
}

fn ensure_no_encrypted_key(encrypted_key: &[u8]) -> Result<(), KeyError> {
    if encrypted_key.is_empty() {
        Ok(())
    } else {
        Err(KeyError::recovery(anyhow!(
            "encrypted key must be empty for this algorithm"
        )))
    }
}
