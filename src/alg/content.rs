//! Content encryption algorithms: `A*CBC-HS*` (RFC 7518, section 5.2) and `A*GCM`.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand_core::{CryptoRng, RngCore};

use core::fmt;

use super::aes_gcm;
use crate::{jwk::SecretBytes, HashAlgorithm, KeyError};

/// Builds the additional authenticated data passed to the cipher: the ASCII bytes
/// of the encoded protected header, followed by `.` and the encoded AAD if present.
pub fn authenticated_data(encoded_protected_header: &str, encoded_aad: Option<&str>) -> Vec<u8> {
    let mut data = encoded_protected_header.as_bytes().to_vec();
    if let Some(aad) = encoded_aad {
        data.push(b'.');
        data.extend_from_slice(aad.as_bytes());
    }
    data
}

fn cbc_decrypt<C: BlockDecryptMut + KeyIvInit>(
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Option<Vec<u8>> {
    let cipher = C::new_from_slices(key, iv).ok()?;
    cipher.decrypt_padded_vec_mut::<Pkcs7>(ciphertext).ok()
}

fn cbc_encrypt<C: BlockEncryptMut + KeyIvInit>(
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
) -> Option<Vec<u8>> {
    let cipher = C::new_from_slices(key, iv).ok()?;
    Some(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Content encryption algorithm, selected by the `enc` header parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ContentEncryptionAlgorithm {
    /// `A128CBC-HS256`
    A128CbcHs256,
    /// `A192CBC-HS384`
    A192CbcHs384,
    /// `A256CBC-HS512`
    A256CbcHs512,
    /// `A128GCM`
    A128Gcm,
    /// `A192GCM`
    A192Gcm,
    /// `A256GCM`
    A256Gcm,
}

impl fmt::Display for ContentEncryptionAlgorithm {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl ContentEncryptionAlgorithm {
    /// All content encryption algorithms.
    pub const ALL: [Self; 6] = [
        Self::A128CbcHs256,
        Self::A192CbcHs384,
        Self::A256CbcHs512,
        Self::A128Gcm,
        Self::A192Gcm,
        Self::A256Gcm,
    ];

    /// Returns the algorithm name.
    pub fn name(self) -> &'static str {
        match self {
            Self::A128CbcHs256 => "A128CBC-HS256",
            Self::A192CbcHs384 => "A192CBC-HS384",
            Self::A256CbcHs512 => "A256CBC-HS512",
            Self::A128Gcm => "A128GCM",
            Self::A192Gcm => "A192GCM",
            Self::A256Gcm => "A256GCM",
        }
    }

    /// Returns the required CEK length in bytes. For CBC-HMAC algorithms, the CEK
    /// is the concatenation of the MAC key and the encryption key.
    pub fn cek_size(self) -> usize {
        match self {
            Self::A128Gcm => 16,
            Self::A192Gcm => 24,
            Self::A128CbcHs256 | Self::A256Gcm => 32,
            Self::A192CbcHs384 => 48,
            Self::A256CbcHs512 => 64,
        }
    }

    /// Returns the IV length in bytes.
    pub fn iv_len(self) -> usize {
        match self {
            Self::A128CbcHs256 | Self::A192CbcHs384 | Self::A256CbcHs512 => 16,
            Self::A128Gcm | Self::A192Gcm | Self::A256Gcm => aes_gcm::IV_LEN,
        }
    }

    fn mac_hash(self) -> Option<HashAlgorithm> {
        match self {
            Self::A128CbcHs256 => Some(HashAlgorithm::Sha256),
            Self::A192CbcHs384 => Some(HashAlgorithm::Sha384),
            Self::A256CbcHs512 => Some(HashAlgorithm::Sha512),
            Self::A128Gcm | Self::A192Gcm | Self::A256Gcm => None,
        }
    }

    /// Generates a random CEK of the required size.
    pub fn generate_cek<R: CryptoRng + RngCore>(self, rng: &mut R) -> SecretBytes<'static> {
        let mut cek = vec![0_u8; self.cek_size()];
        rng.fill_bytes(&mut cek);
        SecretBytes::owned(cek)
    }

    /// Generates a random IV of the required size.
    pub fn generate_iv<R: CryptoRng + RngCore>(self, rng: &mut R) -> Vec<u8> {
        let mut iv = vec![0_u8; self.iv_len()];
        rng.fill_bytes(&mut iv);
        iv
    }

    fn cbc_decrypt(self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Option<Vec<u8>> {
        match self {
            Self::A128CbcHs256 => cbc_decrypt::<cbc::Decryptor<Aes128>>(key, iv, ciphertext),
            Self::A192CbcHs384 => cbc_decrypt::<cbc::Decryptor<Aes192>>(key, iv, ciphertext),
            Self::A256CbcHs512 => cbc_decrypt::<cbc::Decryptor<Aes256>>(key, iv, ciphertext),
            _ => None,
        }
    }

    fn cbc_encrypt(self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> Option<Vec<u8>> {
        match self {
            Self::A128CbcHs256 => cbc_encrypt::<cbc::Encryptor<Aes128>>(key, iv, plaintext),
            Self::A192CbcHs384 => cbc_encrypt::<cbc::Encryptor<Aes192>>(key, iv, plaintext),
            Self::A256CbcHs512 => cbc_encrypt::<cbc::Encryptor<Aes256>>(key, iv, plaintext),
            _ => None,
        }
    }

    /// Decrypts and authenticates `ciphertext`.
    ///
    /// `encoded_aad` is the base64url-encoded AAD of the JWE, if any. All failures
    /// (wrong CEK length, tag mismatch, bad padding) are reported as
    /// [`KeyError::Authentication`].
    pub fn decrypt(
        self,
        ciphertext: &[u8],
        cek: &[u8],
        iv: &[u8],
        encoded_aad: Option<&str>,
        encoded_protected_header: &str,
        tag: &[u8],
    ) -> Result<Vec<u8>, KeyError> {
        if cek.len() != self.cek_size() {
            return Err(KeyError::Authentication);
        }
        let aad = authenticated_data(encoded_protected_header, encoded_aad);

        if let Some(hash) = self.mac_hash() {
            let (mac_key, enc_key) = cek.split_at(cek.len() / 2);
            let aad_bits = (aad.len() as u64 * 8).to_be_bytes();
            let parts: [&[u8]; 4] = [&aad, iv, ciphertext, &aad_bits];
            // The tag is the first half of the HMAC output, which has the same length as the MAC key.
            if tag.len() != mac_key.len() || !hash.verify_hmac_truncated(mac_key, &parts, tag) {
                return Err(KeyError::Authentication);
            }
            self.cbc_decrypt(enc_key, iv, ciphertext)
                .ok_or(KeyError::Authentication)
        } else {
            aes_gcm::open(cek, iv, &aad, ciphertext, tag).map_err(|_| KeyError::Authentication)
        }
    }

    /// Encrypts `plaintext`, returning the ciphertext and the authentication tag.
    pub fn encrypt(
        self,
        plaintext: &[u8],
        cek: &[u8],
        iv: &[u8],
        encoded_aad: Option<&str>,
        encoded_protected_header: &str,
    ) -> Result<(Vec<u8>, Vec<u8>), KeyError> {
        if cek.len() != self.cek_size() {
            return Err(KeyError::recovery(anyhow::anyhow!(
                "CEK for {self} must have {} bytes",
                self.cek_size()
            )));
        }
        let aad = authenticated_data(encoded_protected_header, encoded_aad);

        if let Some(hash) = self.mac_hash() {
            let (mac_key, enc_key) = cek.split_at(cek.len() / 2);
            let ciphertext = self
                .cbc_encrypt(enc_key, iv, plaintext)
                .ok_or_else(|| KeyError::recovery(anyhow::anyhow!("invalid CBC key or IV")))?;
            let aad_bits = (aad.len() as u64 * 8).to_be_bytes();
            let mut tag = hash.hmac(mac_key, &[&aad, iv, &ciphertext, &aad_bits]);
            tag.truncate(mac_key.len());
            Ok((ciphertext, tag))
        } else {
            aes_gcm::seal(cek, iv, &aad, plaintext).map_err(KeyError::KeyRecovery)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use base64ct::{Base64UrlUnpadded, Encoding};
    use rand::thread_rng;

    #[test]
    fn authenticated_data_framing() {
        assert_eq!(authenticated_data("eyJ9", None), b"eyJ9");
        assert_eq!(authenticated_data("eyJ9", Some("QUFE")), b"eyJ9.QUFE");
        assert_eq!(authenticated_data("", Some("QUFE")), b".QUFE");
    }

    #[test]
    fn rfc7516_cbc_hmac_reference() {
        // RFC 7516, appendix A.3: A128KW + A128CBC-HS256.
        let cek: [u8; 32] = [
            4, 211, 31, 197, 84, 157, 252, 254, 11, 100, 157, 250, 63, 170, 106, 206, 107, 124,
            212, 45, 111, 107, 9, 219, 200, 177, 0, 240, 143, 156, 44, 207,
        ];
        let iv = Base64UrlUnpadded::decode_vec("AxY8DCtDaGlsbGljb3RoZQ").unwrap();
        let ciphertext = Base64UrlUnpadded::decode_vec("KDlTtXchhZTGufMYmOYGS4HffxPSUrfmqCHXaI9wOGY")
            .unwrap();
        let tag = Base64UrlUnpadded::decode_vec("U0m_YmjN04DJvceFICbCVQ").unwrap();
        let header = "eyJhbGciOiJBMTI4S1ciLCJlbmMiOiJBMTI4Q0JDLUhTMjU2In0";

        let plaintext = ContentEncryptionAlgorithm::A128CbcHs256
            .decrypt(&ciphertext, &cek, &iv, None, header, &tag)
            .unwrap();
        assert_eq!(plaintext, b"Live long and prosper.");

        let mut bogus_tag = tag.clone();
        bogus_tag[0] ^= 1;
        assert_matches!(
            ContentEncryptionAlgorithm::A128CbcHs256.decrypt(
                &ciphertext,
                &cek,
                &iv,
                None,
                header,
                &bogus_tag
            ),
            Err(KeyError::Authentication)
        );
        assert_matches!(
            ContentEncryptionAlgorithm::A128CbcHs256.decrypt(
                &ciphertext,
                &cek,
                &iv,
                None,
                header,
                &tag[..8]
            ),
            Err(KeyError::Authentication)
        );
    }

    #[test]
    fn round_trip_for_all_algorithms() {
        let mut rng = thread_rng();
        for alg in ContentEncryptionAlgorithm::ALL {
            let cek = alg.generate_cek(&mut rng);
            let iv = alg.generate_iv(&mut rng);
            let (ciphertext, tag) = alg
                .encrypt(b"Hello, world!", &cek, &iv, Some("YWFk"), "e30")
                .unwrap();

            let plaintext = alg
                .decrypt(&ciphertext, &cek, &iv, Some("YWFk"), "e30", &tag)
                .unwrap();
            assert_eq!(plaintext, b"Hello, world!", "{alg}");

            // AAD is authenticated.
            assert_matches!(
                alg.decrypt(&ciphertext, &cek, &iv, None, "e30", &tag),
                Err(KeyError::Authentication)
            );
        }
    }

    #[test]
    fn cek_size_mismatch_is_an_authentication_failure() {
        let alg = ContentEncryptionAlgorithm::A256Gcm;
        let err = alg
            .decrypt(b"", &[0; 16], &[0; 12], None, "", &[0; 16])
            .unwrap_err();
        assert_matches!(err, KeyError::Authentication);
    }
}
