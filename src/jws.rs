//! JWS data entities and the multi-key signature verification pipeline.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::Value;

use crate::{
    alg::SignatureAlgorithm,
    checker::{check_key_algorithm, check_key_type, check_key_usage, KeyOperation},
    error::{ParseError, TrialStage},
    header::decode_protected_header,
    jwk::{Jwk, JwkSet},
    registry::AlgorithmRegistry,
    CompleteHeader, Error, Header,
};

/// Single signature of a [`Jws`] together with its headers.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    encoded_protected_header: String,
    protected_header: Header,
    unprotected_header: Header,
    signature: Vec<u8>,
}

impl Signature {
    /// Creates a signature. The encoded protected header is decoded and retained verbatim,
    /// since it is a part of the signing input. It may be empty if the signature has
    /// no protected header.
    pub fn new(
        encoded_protected_header: impl Into<String>,
        signature: impl Into<Vec<u8>>,
    ) -> Result<Self, ParseError> {
        let encoded_protected_header = encoded_protected_header.into();
        let protected_header = decode_protected_header(&encoded_protected_header)?;
        Ok(Self {
            encoded_protected_header,
            protected_header,
            unprotected_header: Header::new(),
            signature: signature.into(),
        })
    }

    /// Sets the unprotected header.
    #[must_use]
    pub fn with_unprotected_header(mut self, header: Header) -> Self {
        self.unprotected_header = header;
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

    /// Returns the unprotected header.
    pub fn unprotected_header(&self) -> &Header {
        &self.unprotected_header
    }

    /// Returns raw signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Returns the union of protected and unprotected headers.
    pub fn complete_header(&self) -> CompleteHeader {
        CompleteHeader::merge([&self.protected_header, &self.unprotected_header])
    }

    /// Checks whether the payload is base64url-encoded in the signing input. This is governed
    /// by the `b64` parameter ([RFC 7797]), which is only honored in the protected header.
    ///
    /// [RFC 7797]: https://tools.ietf.org/html/rfc7797
    pub fn is_payload_encoded(&self) -> bool {
        match self.protected_header.get("b64") {
            None => true,
            Some(value) => *value == Value::Bool(true),
        }
    }
}

/// Parsed JSON Web Signature ([RFC 7515]) with one or more signatures.
///
/// [RFC 7515]: https://tools.ietf.org/html/rfc7515
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Jws {
    payload: Option<Vec<u8>>,
    encoded_payload: Option<String>,
    signatures: Vec<Signature>,
}

impl Jws {
    /// Creates a JWS with an embedded payload.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: Some(payload.into()),
            ..Self::default()
        }
    }

    /// Creates a JWS with a detached payload, which must be supplied on verification.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Creates a JWS from the encoded payload as it appears in the serialized form.
    /// The payload is base64url-decoded; the encoded form is retained verbatim.
    pub fn from_encoded_payload(encoded_payload: impl Into<String>) -> Result<Self, ParseError> {
        let encoded_payload = encoded_payload.into();
        let payload = Base64UrlUnpadded::decode_vec(&encoded_payload)?;
        Ok(Self {
            payload: Some(payload),
            encoded_payload: Some(encoded_payload),
            signatures: vec![],
        })
    }

    /// Adds a signature.
    #[must_use]
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    /// Returns the embedded payload, or `None` if the payload is detached.
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Returns the encoded payload if the JWS was created from one.
    pub fn encoded_payload(&self) -> Option<&str> {
        self.encoded_payload.as_deref()
    }

    /// Returns all signatures in their original order.
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Returns the signature with the specified index.
    pub fn signature(&self, index: usize) -> Option<&Signature> {
        self.signatures.get(index)
    }

    /// Returns the number of signatures.
    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    /// Computes the input covered by `signature`.
    fn signing_input(&self, signature: &Signature, payload: &[u8]) -> Vec<u8> {
        let mut input = signature.encoded_protected_header.as_bytes().to_vec();
        input.push(b'.');
        if signature.is_payload_encoded() {
            if let Some(encoded) = &self.encoded_payload {
                input.extend_from_slice(encoded.as_bytes());
            } else {
                input.extend_from_slice(Base64UrlUnpadded::encode_string(payload).as_bytes());
            }
        } else {
            input.extend_from_slice(payload);
        }
        input
    }
}

/// Verification pipeline for [`Jws`]s.
///
/// # Examples
///
/// ```
/// # use jwx_compact::{jwk::Jwk, registry::AlgorithmRegistry, Jws, JwsVerifier, Signature};
/// # use base64ct::{Base64UrlUnpadded, Encoding};
/// # fn main() -> anyhow::Result<()> {
/// // Vector from RFC 7515, appendix A.1.
/// let key = Base64UrlUnpadded::decode_vec(
///     "AyM1SysPpbyDfgZld3umj1qzKObwVMkoqQ-EstJQLr_T-1qS0gZH75aKtMN3Yj0iPS4hcgUuTwjAzZr1Z9CAow",
/// )?;
/// let key = Jwk::symmetric(key).with_usage("sig");
/// let signature = Base64UrlUnpadded::decode_vec("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk")?;
/// let jws = Jws::from_encoded_payload(
///     "eyJpc3MiOiJqb2UiLA0KICJleHAiOjEzMDA4MTkzODAsDQogImh0dHA6Ly9leGFtcGxlLmNvbS9pc19yb290Ijp0cnVlfQ",
/// )?
/// .with_signature(Signature::new("eyJ0eXAiOiJKV1QiLA0KICJhbGciOiJIUzI1NiJ9", signature)?);
///
/// let verifier = JwsVerifier::new(AlgorithmRegistry::new(["HS256"])?);
/// assert!(verifier.verify_with_key(&jws, &key, 0, None)?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JwsVerifier {
    signature_registry: AlgorithmRegistry,
}

impl JwsVerifier {
    /// Creates a verifier with the specified registry of signature algorithms.
    pub fn new(signature_registry: AlgorithmRegistry) -> Self {
        Self { signature_registry }
    }

    /// Returns the registry of allowed signature algorithms.
    pub fn signature_registry(&self) -> &AlgorithmRegistry {
        &self.signature_registry
    }

    /// Verifies a signature with a single key.
    pub fn verify_with_key(
        &self,
        jws: &Jws,
        jwk: &Jwk,
        signature: usize,
        detached_payload: Option<&[u8]>,
    ) -> Result<bool, Error> {
        let key_set = JwkSet::from(jwk.clone());
        self.verify_with_key_set(jws, &key_set, signature, detached_payload)
    }

    /// Verifies the signature with the specified index, trying keys from `key_set` in order.
    ///
    /// Exactly one of the embedded payload and `detached_payload` must be present.
    /// Returns `Ok(false)` if no key verifies the signature.
    ///
    /// # Errors
    ///
    /// Returns an error for structural issues: an empty key set, a JWS without signatures,
    /// a conflicting or missing payload, an index out of range, or an `alg` header parameter
    /// that is missing or not an allowed signature algorithm.
    pub fn verify_with_key_set(
        &self,
        jws: &Jws,
        key_set: &JwkSet,
        signature: usize,
        detached_payload: Option<&[u8]>,
    ) -> Result<bool, Error> {
        if key_set.is_empty() {
            return Err(Error::EmptyKeySet);
        }
        if jws.signatures.is_empty() {
            return Err(Error::NoSignatures);
        }
        let payload = match (&jws.payload, detached_payload) {
            (Some(_), Some(_)) => return Err(Error::DetachedPayloadConflict),
            (None, None) => return Err(Error::MissingPayload),
            (Some(payload), None) => payload.as_slice(),
            (None, Some(payload)) => payload,
        };
        let target = jws.signature(signature).ok_or(Error::SignatureIndex {
            index: signature,
            len: jws.signatures.len(),
        })?;

        let header = target.complete_header();
        let alg = header.required_str("alg")?;
        let algorithm = self.signature_registry.signature(alg)?;
        tracing::debug!(
            signature,
            alg,
            keys = key_set.len(),
            "started JWS verification"
        );

        let input = jws.signing_input(target, payload);
        for (index, jwk) in key_set.iter().enumerate() {
            match try_key(algorithm, jwk, &input, target.signature()) {
                Ok(()) => {
                    tracing::debug!(signature, key = index, "verified JWS signature");
                    return Ok(true);
                }
                Err(stage) => {
                    tracing::debug!(key = index, stage = stage.as_str(), "skipped key");
                }
            }
        }
        tracing::debug!(signature, "no key verifies JWS signature");
        Ok(false)
    }
}

fn try_key(
    algorithm: SignatureAlgorithm,
    jwk: &Jwk,
    input: &[u8],
    signature: &[u8],
) -> Result<(), TrialStage> {
    let name = algorithm.name();
    check_key_usage(jwk, KeyOperation::Verification)
        .and_then(|()| check_key_algorithm(jwk, name))
        .and_then(|()| check_key_type(jwk, name, algorithm.allowed_key_types()))
        .map_err(|err| err.stage())?;

    match algorithm.verify(&jwk.key, input, signature) {
        Ok(true) => Ok(()),
        Ok(false) | Err(_) => Err(TrialStage::Content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn signing_input_variants() {
        // {"alg":"HS256"}
        let signature = Signature::new("eyJhbGciOiJIUzI1NiJ9", vec![]).unwrap();
        assert!(signature.is_payload_encoded());

        let jws = Jws::new(b"$.02".to_vec());
        let input = jws.signing_input(&signature, b"$.02");
        assert_eq!(input, b"eyJhbGciOiJIUzI1NiJ9.JC4wMg");

        let jws = Jws::from_encoded_payload("JC4wMg").unwrap();
        assert_eq!(jws.payload(), Some(b"$.02".as_slice()));
        let input = jws.signing_input(&signature, b"ignored");
        assert_eq!(input, b"eyJhbGciOiJIUzI1NiJ9.JC4wMg");

        // {"alg":"HS256","b64":false,"crit":["b64"]}
        let unencoded =
            Signature::new("eyJhbGciOiJIUzI1NiIsImI2NCI6ZmFsc2UsImNyaXQiOlsiYjY0Il19", vec![])
                .unwrap();
        assert!(!unencoded.is_payload_encoded());
        let input = Jws::detached().signing_input(&unencoded, b"$.02");
        assert_eq!(
            input,
            b"eyJhbGciOiJIUzI1NiIsImI2NCI6ZmFsc2UsImNyaXQiOlsiYjY0Il19.$.02"
        );
    }

    #[test]
    fn b64_is_only_read_from_protected_header() {
        let signature = Signature::new("", vec![])
            .unwrap()
            .with_unprotected_header(serde_json::from_value(json!({ "b64": false })).unwrap());
        assert!(signature.is_payload_encoded());
        assert_eq!(signature.complete_header().get("b64"), Some(&json!(false)));
    }

    #[test]
    fn payload_sources_are_exclusive() {
        let verifier = JwsVerifier::new(AlgorithmRegistry::new(["HS256"]).unwrap());
        let key = Jwk::symmetric([0; 32]);
        let signature = Signature::new("eyJhbGciOiJIUzI1NiJ9", vec![0; 32]).unwrap();

        let jws = Jws::new(b"payload".to_vec()).with_signature(signature.clone());
        assert_matches!(
            verifier.verify_with_key(&jws, &key, 0, Some(b"other")),
            Err(Error::DetachedPayloadConflict)
        );
        let jws = Jws::detached().with_signature(signature);
        assert_matches!(
            verifier.verify_with_key(&jws, &key, 0, None),
            Err(Error::MissingPayload)
        );
        assert_matches!(
            verifier.verify_with_key(&jws, &key, 1, Some(b"payload")),
            Err(Error::SignatureIndex { index: 1, len: 1 })
        );
        assert!(!verifier.verify_with_key(&jws, &key, 0, Some(b"payload")).unwrap());
    }

    #[test]
    fn empty_payload_counts_as_present() {
        let verifier = JwsVerifier::new(AlgorithmRegistry::new(["HS256"]).unwrap());
        let jws = Jws::new(vec![])
            .with_signature(Signature::new("eyJhbGciOiJIUzI1NiJ9", vec![]).unwrap());
        assert_matches!(
            verifier.verify_with_key(&jws, &Jwk::symmetric([1; 32]), 0, Some(b"")),
            Err(Error::DetachedPayloadConflict)
        );
    }
}
