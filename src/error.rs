//! Error handling.

use core::fmt;

use crate::jwk::{JwkError, KeyType};

/// Errors that may occur when constructing a [`Jwe`](crate::Jwe) or [`Jws`](crate::Jws)
/// from encoded parts.
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// Cannot decode base64.
    Base64(base64ct::Error),
    /// Protected header cannot be parsed.
    MalformedHeader(serde_json::Error),
    /// Protected header is valid JSON, but not a JSON object.
    HeaderNotObject,
}

impl fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64(e) => write!(formatter, "base64 decoding error: {e}"),
            Self::MalformedHeader(e) => write!(formatter, "Malformed protected header: {e}"),
            Self::HeaderNotObject => formatter.write_str("Protected header is not a JSON object"),
        }
    }
}

impl From<base64ct::Error> for ParseError {
    fn from(error: base64ct::Error) -> Self {
        Self::Base64(error)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Base64(e) => Some(e),
            Self::MalformedHeader(e) => Some(e),
            Self::HeaderNotObject => None,
        }
    }
}

/// Category of a registered algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AlgorithmKind {
    /// Key management algorithm (the `alg` field of a JWE header).
    KeyManagement,
    /// Content encryption algorithm (the `enc` field of a JWE header).
    ContentEncryption,
    /// Signature algorithm (the `alg` field of a JWS header).
    Signature,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::KeyManagement => "key management",
            Self::ContentEncryption => "content encryption",
            Self::Signature => "signature",
        })
    }
}

/// Structural and policy errors returned by [`JweDecrypter`](crate::JweDecrypter)
/// and [`JwsVerifier`](crate::JwsVerifier).
///
/// These errors signal malformed input or misconfiguration; they are never produced
/// because a particular key did not fit. A key that does not fit results in `Ok(false)`
/// from the pipelines instead.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The supplied key set contains no keys.
    EmptyKeySet,
    /// The JWE has no recipients.
    NoRecipients,
    /// The JWS has no signatures.
    NoSignatures,
    /// The JWE already carries a decrypted payload.
    AlreadyDecrypted,
    /// Recipient index is out of bounds.
    RecipientIndex {
        /// Requested index.
        index: usize,
        /// Number of recipients in the JWE.
        len: usize,
    },
    /// Signature index is out of bounds.
    SignatureIndex {
        /// Requested index.
        index: usize,
        /// Number of signatures in the JWS.
        len: usize,
    },
    /// A detached payload is supplied, but the JWS already embeds a payload.
    DetachedPayloadConflict,
    /// The JWS payload is detached, but no detached payload was supplied.
    MissingPayload,
    /// Required header parameter is absent from the complete header.
    MissingHeaderParameter(&'static str),
    /// Header parameter is present, but has an unexpected shape.
    MalformedHeaderParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the problem.
        reason: anyhow::Error,
    },
    /// Algorithm is not registered.
    UnsupportedAlgorithm(String),
    /// Algorithm is registered, but belongs to a different category.
    AlgorithmCategory {
        /// Algorithm name.
        name: String,
        /// Expected category.
        expected: AlgorithmKind,
    },
    /// Compression method is not registered.
    UnsupportedCompression(String),
    /// Plaintext was authenticated, but could not be decompressed.
    DecompressionFailure(anyhow::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyKeySet => formatter.write_str("There is no key in the key set"),
            Self::NoRecipients => formatter.write_str("The JWE does not contain any recipient"),
            Self::NoSignatures => formatter.write_str("The JWS does not contain any signature"),
            Self::AlreadyDecrypted => formatter.write_str("The JWE is already decrypted"),
            Self::RecipientIndex { index, len } => write!(
                formatter,
                "Recipient index {index} is out of bounds (the JWE has {len} recipient(s))"
            ),
            Self::SignatureIndex { index, len } => write!(
                formatter,
                "Signature index {index} is out of bounds (the JWS has {len} signature(s))"
            ),
            Self::DetachedPayloadConflict => {
                formatter.write_str("A detached payload is set, but the JWS already has a payload")
            }
            Self::MissingPayload => {
                formatter.write_str("The JWS has a detached payload, but no payload is provided")
            }
            Self::MissingHeaderParameter(name) => {
                write!(formatter, "Parameter `{name}` is missing from the header")
            }
            Self::MalformedHeaderParameter { name, reason } => {
                write!(formatter, "Header parameter `{name}` is malformed: {reason}")
            }
            Self::UnsupportedAlgorithm(name) => {
                write!(formatter, "Algorithm `{name}` is not supported")
            }
            Self::AlgorithmCategory { name, expected } => {
                write!(formatter, "Algorithm `{name}` is not a {expected} algorithm")
            }
            Self::UnsupportedCompression(name) => {
                write!(formatter, "Compression method `{name}` is not supported")
            }
            Self::DecompressionFailure(err) => {
                write!(formatter, "Decompression of the authenticated plaintext failed: {err}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedHeaderParameter { reason, .. } => Some(reason.as_ref()),
            Self::DecompressionFailure(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Stage of a per-key trial at which a key was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrialStage {
    /// Key usage, operations, type or algorithm binding.
    Checker,
    /// Content encryption key recovery.
    Cek,
    /// Content decryption or signature verification.
    Content,
}

impl TrialStage {
    /// Returns a short label for this stage, used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checker => "checker",
            Self::Cek => "cek",
            Self::Content => "content",
        }
    }
}

/// Errors that make a particular key unfit for an operation.
///
/// The pipelines swallow these errors and advance to the next key; they are only
/// observable when invoking the [checker](crate::checker) or algorithms directly.
#[derive(Debug)]
#[non_exhaustive]
pub enum KeyError {
    /// Key `use` parameter does not allow the operation.
    UnexpectedUsage {
        /// Required usage.
        expected: &'static str,
        /// Declared usage.
        actual: String,
    },
    /// Key `key_ops` parameter does not list the operation.
    UnexpectedOperation {
        /// Operation being attempted.
        operation: &'static str,
    },
    /// Key `alg` parameter is bound to another algorithm.
    AlgorithmMismatch {
        /// Algorithm being used.
        expected: String,
        /// Algorithm declared by the key.
        actual: String,
    },
    /// Key type is not allowed by the algorithm.
    UnexpectedKeyType {
        /// Algorithm name.
        algorithm: String,
        /// Actual key type.
        actual: KeyType,
    },
    /// Key material cannot be used with the algorithm.
    Jwk(JwkError),
    /// Content encryption key could not be recovered.
    KeyRecovery(anyhow::Error),
    /// Authentication tag or signature does not verify, or the CEK has a wrong length.
    Authentication,
}

impl KeyError {
    /// Returns the trial stage this error belongs to.
    pub fn stage(&self) -> TrialStage {
        match self {
            Self::UnexpectedUsage { .. }
            | Self::UnexpectedOperation { .. }
            | Self::AlgorithmMismatch { .. }
            | Self::UnexpectedKeyType { .. } => TrialStage::Checker,
            Self::Jwk(_) | Self::KeyRecovery(_) => TrialStage::Cek,
            Self::Authentication => TrialStage::Content,
        }
    }

    pub(crate) fn recovery(err: impl Into<anyhow::Error>) -> Self {
        Self::KeyRecovery(err.into())
    }
}

impl fmt::Display for KeyError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedUsage { expected, actual } => write!(
                formatter,
                "Key cannot be used for this operation (expected use: {expected}, got: {actual})"
            ),
            Self::UnexpectedOperation { operation } => {
                write!(formatter, "Key operations do not include `{operation}`")
            }
            Self::AlgorithmMismatch { expected, actual } => write!(
                formatter,
                "Key is only allowed for algorithm {actual} (expected {expected})"
            ),
            Self::UnexpectedKeyType { algorithm, actual } => write!(
                formatter,
                "Key type {actual} is not allowed for algorithm {algorithm}"
            ),
            Self::Jwk(err) => write!(formatter, "Unsuitable key: {err}"),
            Self::KeyRecovery(err) => write!(formatter, "Cannot recover CEK: {err}"),
            Self::Authentication => formatter.write_str("Authentication has failed"),
        }
    }
}

impl From<JwkError> for KeyError {
    fn from(err: JwkError) -> Self {
        Self::Jwk(err)
    }
}

impl std::error::Error for KeyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Jwk(err) => Some(err),
            Self::KeyRecovery(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
