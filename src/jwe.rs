//! JWE data entities and the multi-recipient decryption pipeline.

use base64ct::{Base64UrlUnpadded, Encoding};

use crate::{
    alg::{ContentEncryptionAlgorithm, KeyManagementAlgorithm},
    checker::{check_key_algorithm, check_key_usage, KeyOperation},
    compression::CompressionRegistry,
    error::ParseError,
    header::decode_protected_header,
    jwk::{Jwk, JwkSet},
    registry::AlgorithmRegistry,
    CompleteHeader, Error, Header, KeyError,
};

/// JWE recipient: its own header fragment and the encrypted key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recipient {
    header: Header,
    encrypted_key: Vec<u8>,
}

impl Recipient {
    /// Creates a recipient. `encrypted_key` is empty for `dir` and `ECDH-ES`.
    pub fn new(header: Header, encrypted_key: impl Into<Vec<u8>>) -> Self {
        Self {
            header,
            encrypted_key: encrypted_key.into(),
        }
    }

    /// Returns the per-recipient header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the encrypted key.
    pub fn encrypted_key(&self) -> &[u8] {
        &self.encrypted_key
    }
}

/// Parsed JSON Web Encryption ([RFC 7516]).
///
/// The payload is absent until a successful decryption, after which it is set exactly once.
///
/// [RFC 7516]: https://tools.ietf.org/html/rfc7516
#[derive(Debug, Clone, PartialEq)]
pub struct Jwe {
    encoded_protected_header: String,
    protected_header: Header,
    unprotected_header: Header,
    recipients: Vec<Recipient>,
    ciphertext: Vec<u8>,
    iv: Vec<u8>,
    tag: Vec<u8>,
    aad: Option<Vec<u8>>,
    payload: Option<Vec<u8>>,
}

impl Jwe {
    /// Creates a JWE from its shared parts. The encoded protected header is decoded and
    /// retained verbatim, since it is a part of the authenticated data.
    pub fn new(
        encoded_protected_header: impl Into<String>,
        ciphertext: impl Into<Vec<u8>>,
        iv: impl Into<Vec<u8>>,
        tag: impl Into<Vec<u8>>,
    ) -> Result<Self, ParseError> {
        let encoded_protected_header = encoded_protected_header.into();
        let protected_header = decode_protected_header(&encoded_protected_header)?;
        Ok(Self {
            encoded_protected_header,
            protected_header,
            unprotected_header: Header::new(),
            recipients: vec![],
            ciphertext: ciphertext.into(),
            iv: iv.into(),
            tag: tag.into(),
            aad: None,
            payload: None,
        })
    }

    /// Sets the shared unprotected header.
    #[must_use]
    pub fn with_unprotected_header(mut self, header: Header) -> Self {
        self.unprotected_header = header;
        self
    }

    /// Sets the additional authenticated data (in its raw, decoded form).
    #[must_use]
    pub fn with_aad(mut self, aad: impl Into<Vec<u8>>) -> Self {
        self.aad = Some(aad.into());
        self
    }

    /// Adds a recipient.
    #[must_use]
    pub fn with_recipient(mut self, recipient: Recipient) -> Self {
        self.recipients.push(recipient);
        self
    }

    /// Returns the protected header as it was encoded.
    pub fn encoded_protected_header(&self) -> &str {
        &self.encoded_protected_header
    }

    /// Returns the decoded protected header.
    pub fn protected_header(&self) -> &Header {
        &self.protected_header
    }

    /// Returns the shared unprotected header.
    pub fn unprotected_header(&self) -> &Header {
        &self.unprotected_header
    }

    /// Returns all recipients in their original order.
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Returns the recipient with the specified index.
    pub fn recipient(&self, index: usize) -> Option<&Recipient> {
        self.recipients.get(index)
    }

    /// Returns the number of recipients.
    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    /// Returns the ciphertext.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// Returns the initialization vector.
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// Returns the authentication tag.
    pub fn tag(&self) -> &[u8] {
        &self.tag
    }

    /// Returns the additional authenticated data, if any.
    pub fn aad(&self) -> Option<&[u8]> {
        self.aad.as_deref()
    }

    /// Returns the decrypted payload, or `None` if the JWE is not decrypted yet.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Returns the complete header for the recipient with the specified index.
    pub fn complete_header(&self, recipient: usize) -> Option<CompleteHeader> {
        let recipient = self.recipients.get(recipient)?;
        Some(CompleteHeader::merge([
            &self.protected_header,
            &self.unprotected_header,
            &recipient.header,
        ]))
    }

    fn encoded_aad(&self) -> Option<String> {
        self.aad.as_deref().map(Base64UrlUnpadded::encode_string)
    }
}

/// Decryption pipeline for [`Jwe`]s.
///
/// The decrypter holds the registries of allowed algorithms; it is immutable and can be
/// shared among threads.
#[derive(Debug, Clone)]
pub struct JweDecrypter {
    key_encryption: AlgorithmRegistry,
    content_encryption: AlgorithmRegistry,
    compression: CompressionRegistry,
}

impl JweDecrypter {
    /// Creates a decrypter with the specified registries.
    pub fn new(
        key_encryption: AlgorithmRegistry,
        content_encryption: AlgorithmRegistry,
        compression: CompressionRegistry,
    ) -> Self {
        Self {
            key_encryption,
            content_encryption,
            compression,
        }
    }

    /// Returns the registry of allowed key management algorithms.
    pub fn key_encryption_registry(&self) -> &AlgorithmRegistry {
        &self.key_encryption
    }

    /// Returns the registry of allowed content encryption algorithms.
    pub fn content_encryption_registry(&self) -> &AlgorithmRegistry {
        &self.content_encryption
    }

    /// Returns the registry of allowed compression methods.
    pub fn compression_registry(&self) -> &CompressionRegistry {
        &self.compression
    }

    /// Decrypts the JWE for the specified recipient with a single key.
    ///
    /// See [`Self::decrypt_using_key_set()`] for the semantics of the return value.
    pub fn decrypt_using_key(
        &self,
        jwe: &mut Jwe,
        jwk: &Jwk,
        recipient: usize,
    ) -> Result<bool, Error> {
        let key_set = JwkSet::from(jwk.clone());
        self.decrypt_using_key_set(jwe, &key_set, recipient)
    }

    /// Decrypts the JWE for the specified recipient, trying keys from `key_set` in order.
    ///
    /// On success, the plaintext is recorded in `jwe` and `Ok(true)` is returned.
    /// If no key fits, returns `Ok(false)`; the reason why a specific key did not fit
    /// is not reported.
    ///
    /// # Errors
    ///
    /// Returns an error for structural issues: an empty key set, an already decrypted JWE,
    /// a JWE without recipients or with a recipient index out of range, missing `alg` / `enc`
    /// header parameters, algorithms not allowed by the registries, or a failure
    /// to decompress the authenticated plaintext.
    pub fn decrypt_using_key_set(
        &self,
        jwe: &mut Jwe,
        key_set: &JwkSet,
        recipient: usize,
    ) -> Result<bool, Error> {
        if key_set.is_empty() {
            return Err(Error::EmptyKeySet);
        }
        if jwe.payload.is_some() {
            return Err(Error::AlreadyDecrypted);
        }
        if jwe.recipients.is_empty() {
            return Err(Error::NoRecipients);
        }
        let header = jwe.complete_header(recipient).ok_or(Error::RecipientIndex {
            index: recipient,
            len: jwe.recipients.len(),
        })?;

        let enc = header.required_str("enc")?;
        let alg = header.required_str("alg")?;
        let key_management = self.key_encryption.key_management(alg)?;
        let content_encryption = self.content_encryption.content_encryption(enc)?;
        tracing::debug!(
            recipient,
            alg,
            enc,
            keys = key_set.len(),
            "started JWE decryption"
        );

        let encoded_aad = jwe.encoded_aad();
        let trial = TrialContext {
            jwe: &*jwe,
            encrypted_key: jwe.recipients[recipient].encrypted_key(),
            encoded_aad: encoded_aad.as_deref(),
            header: &header,
            key_management,
            content_encryption,
        };
        let plaintext = key_set
            .iter()
            .enumerate()
            .find_map(|(index, jwk)| match trial.try_key(jwk) {
                Ok(plaintext) => Some(plaintext),
                Err(err) => {
                    tracing::debug!(key = index, stage = err.stage().as_str(), "skipped key");
                    None
                }
            });

        let Some(plaintext) = plaintext else {
            tracing::debug!(recipient, "no key decrypts JWE");
            return Ok(false);
        };
        let plaintext = if header.contains("zip") {
            self.compression
                .uncompress(header.required_str("zip")?, &plaintext)?
        } else {
            plaintext
        };

        jwe.payload = Some(plaintext);
        tracing::debug!(recipient, "finished JWE decryption");
        Ok(true)
    }
}

/// Everything a single key trial needs, resolved once per pipeline run.
struct TrialContext<'a> {
    jwe: &'a Jwe,
    encrypted_key: &'a [u8],
    encoded_aad: Option<&'a str>,
    header: &'a CompleteHeader,
    key_management: KeyManagementAlgorithm,
    content_encryption: ContentEncryptionAlgorithm,
}

impl TrialContext<'_> {
    fn try_key(&self, jwk: &Jwk) -> Result<Vec<u8>, KeyError> {
        check_key_usage(jwk, KeyOperation::Decryption)?;
        // With `dir`, the key is the CEK itself, so it is bound to the content encryption.
        let bound_algorithm = if self.key_management.is_direct() {
            self.content_encryption.name()
        } else {
            self.key_management.name()
        };
        check_key_algorithm(jwk, bound_algorithm)?;

        let cek = self.key_management.recover_cek(
            &jwk.key,
            self.encrypted_key,
            self.content_encryption,
            self.header,
        )?;
        self.content_encryption.decrypt(
            &self.jwe.ciphertext,
            &cek,
            &self.jwe.iv,
            self.encoded_aad,
            &self.jwe.encoded_protected_header,
            &self.jwe.tag,
        )
    }
}
