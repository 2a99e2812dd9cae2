//! Key agreement: `ECDH-ES` and `ECDH-ES+A*KW` ([RFC 7518, section 4.6]).
//!
//! [RFC 7518, section 4.6]: https://tools.ietf.org/html/rfc7518#section-4.6

use anyhow::anyhow;
use rand_core::{CryptoRng, RngCore};
use zeroize::Zeroize;

use core::fmt;

use super::{
    aes_kw::{aes_unwrap, aes_wrap},
    ec::{self, EcKey},
};
use crate::{
    jwk::{JsonWebKey, SecretBytes},
    CompleteHeader, HashAlgorithm, Header, KeyError,
};

/// Concat KDF from NIST SP 800-56A as profiled by RFC 7518, section 4.6.2, with SHA-256.
///
/// `algorithm_id` is the `enc` value for `ECDH-ES` and the `alg` value for the
/// key wrapping variants. `apu` / `apv` are the decoded party info values
/// (empty if absent).
pub fn concat_kdf(
    shared_secret: &[u8],
    algorithm_id: &str,
    apu: &[u8],
    apv: &[u8],
    key_len: usize,
) -> SecretBytes<'static> {
    const HASH: HashAlgorithm = HashAlgorithm::Sha256;

    let mut other_info = Vec::new();
    for field in [algorithm_id.as_bytes(), apu, apv] {
        other_info.extend_from_slice(&(field.len() as u32).to_be_bytes());
        other_info.extend_from_slice(field);
    }
    other_info.extend_from_slice(&((key_len * 8) as u32).to_be_bytes());

    let rounds = (key_len + HASH.output_len() - 1) / HASH.output_len();
    let mut derived = Vec::with_capacity(rounds * HASH.output_len());
    for counter in 1..=rounds {
        let counter = (counter as u32).to_be_bytes();
        let mut block = HASH.digest_parts(&[&counter, shared_secret, &other_info]);
        derived.extend_from_slice(&block);
        block.zeroize();
    }
    derived.truncate(key_len);
    SecretBytes::owned(derived)
}

fn party_info(header: &CompleteHeader) -> Result<(Vec<u8>, Vec<u8>), KeyError> {
    let apu = header.bytes_param("apu").map_err(KeyError::KeyRecovery)?;
    let apv = header.bytes_param("apv").map_err(KeyError::KeyRecovery)?;
    Ok((apu.unwrap_or_default(), apv.unwrap_or_default()))
}

fn ephemeral_public_key(header: &CompleteHeader) -> Result<JsonWebKey<'static>, KeyError> {
    let epk = header
        .get("epk")
        .ok_or_else(|| KeyError::recovery(anyhow!("header parameter `epk` is missing")))?;
    serde_json::from_value(epk.clone())
        .map_err(|err| KeyError::recovery(anyhow!(err).context("malformed `epk`")))
}

/// Computes `Z` on the recipient side from the recipient's private key and the `epk`
/// header parameter.
fn recipient_shared_secret(
    jwk: &JsonWebKey<'_>,
    header: &CompleteHeader,
) -> Result<SecretBytes<'static>, KeyError> {
    let private_key = EcKey::new(jwk)?;
    let epk = ephemeral_public_key(header)?;
    let epk = EcKey::new(&epk)?;
    Ok(ec::diffie_hellman(&private_key, &epk)?)
}

/// `ECDH-ES`: the agreed key is used directly as the CEK.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EcdhEs;

impl EcdhEs {
    /// Returns the algorithm name.
    pub fn name(self) -> &'static str {
        "ECDH-ES"
    }

    /// Derives the CEK on the recipient side.
    pub fn agreement_key(
        self,
        jwk: &JsonWebKey<'_>,
        cek_size: usize,
        content_encryption: &str,
        header: &CompleteHeader,
    ) -> Result<SecretBytes<'static>, KeyError> {
        let shared_secret = recipient_shared_secret(jwk, header)?;
        let (apu, apv) = party_info(header)?;
        Ok(concat_kdf(
            &shared_secret,
            content_encryption,
            &apu,
            &apv,
            cek_size,
        ))
    }

    /// Derives the CEK on the sender side, returning the header parameters
    /// (`epk`) to add to the recipient header.
    pub fn sender_agreement_key<R: CryptoRng + RngCore>(
        self,
        recipient_key: &JsonWebKey<'_>,
        cek_size: usize,
        content_encryption: &str,
        header: &CompleteHeader,
        rng: &mut R,
    ) -> Result<(SecretBytes<'static>, Header), KeyError> {
        let recipient_key = EcKey::new(recipient_key)?;
        let (shared_secret, epk) = ec::ephemeral_diffie_hellman(&recipient_key, rng)?;
        let (apu, apv) = party_info(header)?;
        let cek = concat_kdf(&shared_secret, content_encryption, &apu, &apv, cek_size);
        Ok((cek, epk_header(&epk)?))
    }
}

fn epk_header(epk: &JsonWebKey<'_>) -> Result<Header, KeyError> {
    let value = serde_json::to_value(epk).map_err(KeyError::recovery)?;
    let mut header = Header::new();
    header.insert("epk".into(), value);
    Ok(header)
}

/// `ECDH-ES+A*KW`: the agreed key wraps the CEK with AES Key Wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EcdhEsKeyWrap {
    /// `ECDH-ES+A128KW`
    A128Kw,
    /// `ECDH-ES+A192KW`
    A192Kw,
    /// `ECDH-ES+A256KW`
    A256Kw,
}

impl fmt::Display for EcdhEsKeyWrap {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl EcdhEsKeyWrap {
    pub(crate) const ALL: [Self; 3] = [Self::A128Kw, Self::A192Kw, Self::A256Kw];

    /// Returns the algorithm name.
    pub fn name(self) -> &'static str {
        match self {
            Self::A128Kw => "ECDH-ES+A128KW",
            Self::A192Kw => "ECDH-ES+A192KW",
            Self::A256Kw => "ECDH-ES+A256KW",
        }
    }

    /// Returns the byte length of the derived key encryption key.
    pub fn key_len(self) -> usize {
        match self {
            Self::A128Kw => 16,
            Self::A192Kw => 24,
            Self::A256Kw => 32,
        }
    }

    /// Derives the key encryption key on the recipient side and unwraps the CEK.
    /// The unwrapped CEK must have `cek_size` bytes.
    pub fn unwrap_agreement_key(
        self,
        jwk: &JsonWebKey<'_>,
        encrypted_key: &[u8],
        cek_size: usize,
        header: &CompleteHeader,
    ) -> Result<SecretBytes<'static>, KeyError> {
        let shared_secret = recipient_shared_secret(jwk, header)?;
        let (apu, apv) = party_info(header)?;
        let kek = concat_kdf(&shared_secret, self.name(), &apu, &apv, self.key_len());

        let cek = aes_unwrap(&kek, encrypted_key).map_err(KeyError::KeyRecovery)?;
        if cek.len() == cek_size {
            Ok(cek)
        } else {
            Err(KeyError::recovery(anyhow!(
                "unwrapped CEK has unexpected length"
            )))
        }
    }

    /// Wraps `cek` on the sender side, returning the encrypted key and the header
    /// parameters (`epk`) to add to the recipient header.
    pub fn wrap_agreement_key<R: CryptoRng + RngCore>(
        self,
        recipient_key: &JsonWebKey<'_>,
        cek: &[u8],
        header: &CompleteHeader,
        rng: &mut R,
    ) -> Result<(Vec<u8>, Header), KeyError> {
        let recipient_key = EcKey::new(recipient_key)?;
        let (shared_secret, epk) = ec::ephemeral_diffie_hellman(&recipient_key, rng)?;
        let (apu, apv) = party_info(header)?;
        let kek = concat_kdf(&shared_secret, self.name(), &apu, &apv, self.key_len());
        let encrypted_key = aes_wrap(&kek, cek).map_err(KeyError::KeyRecovery)?;
        Ok((encrypted_key, epk_header(&epk)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alg::ec::{generate_key, Curve};

    use assert_matches::assert_matches;
    use base64ct::{Base64UrlUnpadded, Encoding};
    use rand::thread_rng;
    use serde_json::json;

    #[test]
    fn concat_kdf_reference() {
        // RFC 7518, appendix C.
        let z = [
            158, 86, 217, 29, 129, 113, 53, 211, 114, 131, 66, 131, 191, 132, 38, 156, 251, 49,
            110, 163, 218, 128, 106, 72, 246, 218, 167, 121, 140, 254, 144, 196,
        ];
        let key = concat_kdf(&z, "A128GCM", b"Alice", b"Bob", 16);
        assert_eq!(
            Base64UrlUnpadded::encode_string(&key),
            "VqqN6vgjbSBcIijNcacQGg"
        );
    }

    #[test]
    fn concat_kdf_output_spans_several_rounds() {
        let key = concat_kdf(&[1; 32], "A256CBC-HS512", b"", b"", 64);
        assert_eq!(key.len(), 64);
        let prefix = concat_kdf(&[1; 32], "A256CBC-HS512", b"", b"", 32);
        // Key length is part of the KDF input, so outputs are unrelated.
        assert_ne!(key[..32], prefix[..]);
    }

    fn header(value: serde_json::Value) -> CompleteHeader {
        let header: Header = serde_json::from_value(value).unwrap();
        CompleteHeader::merge([&header])
    }

    #[test]
    fn direct_key_agreement_round_trip() {
        let recipient = generate_key(Curve::P384, &mut thread_rng());
        let sender_header = header(json!({ "apu": "QWxpY2U", "apv": "Qm9i" }));
        let (sender_cek, params) = EcdhEs
            .sender_agreement_key(
                &recipient.to_public(),
                32,
                "A256GCM",
                &sender_header,
                &mut thread_rng(),
            )
            .unwrap();

        let mut recipient_header = sender_header.as_map().clone();
        recipient_header.extend(params);
        let recipient_header = CompleteHeader::merge([&recipient_header]);
        let cek = EcdhEs
            .agreement_key(&recipient, 32, "A256GCM", &recipient_header)
            .unwrap();
        assert_eq!(cek, sender_cek);

        // Party info is bound into the derived key.
        let other_header = CompleteHeader::merge([&recipient_header.as_map().clone(), &{
            let mut apv = Header::new();
            apv.insert("apv".into(), json!("RXZl"));
            apv
        }]);
        let other_cek = EcdhEs
            .agreement_key(&recipient, 32, "A256GCM", &other_header)
            .unwrap();
        assert_ne!(other_cek, sender_cek);
    }

    #[test]
    fn key_agreement_with_wrapping_round_trip() {
        let recipient = generate_key(Curve::P256, &mut thread_rng());
        let cek = [42_u8; 32];
        let (encrypted_key, params) = EcdhEsKeyWrap::A128Kw
            .wrap_agreement_key(
                &recipient.to_public(),
                &cek,
                &CompleteHeader::default(),
                &mut thread_rng(),
            )
            .unwrap();

        let header = CompleteHeader::merge([&params]);
        let unwrapped = EcdhEsKeyWrap::A128Kw
            .unwrap_agreement_key(&recipient, &encrypted_key, 32, &header)
            .unwrap();
        assert_eq!(*unwrapped, cek);

        assert_matches!(
            EcdhEsKeyWrap::A128Kw.unwrap_agreement_key(&recipient, &encrypted_key, 16, &header),
            Err(KeyError::KeyRecovery(_))
        );
        // The algorithm name is the KDF algorithm ID, so variants do not interoperate.
        assert!(EcdhEsKeyWrap::A256Kw
            .unwrap_agreement_key(&recipient, &encrypted_key, 32, &header)
            .is_err());
    }

    #[test]
    fn missing_ephemeral_key() {
        let recipient = generate_key(Curve::P256, &mut thread_rng());
        let err = EcdhEs
            .agreement_key(&recipient, 16, "A128GCM", &CompleteHeader::default())
            .unwrap_err();
        assert_matches!(err, KeyError::KeyRecovery(_));
    }
}
