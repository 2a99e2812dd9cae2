//! Multi-recipient [JWE] decryption and multi-key [JWS] verification with focus on type safety
//! and secure cryptographic primitives.
//!
//! # Design choices
//!
//! - Algorithms are never registered implicitly. [`JweDecrypter`] and [`JwsVerifier`] are built
//!   from explicit allow-lists (see [`Policy`] and [`AlgorithmRegistry`]), so an algorithm
//!   declared in a token header is only used if the application opted into it.
//! - Key management algorithms form a closed enum ([`KeyManagementAlgorithm`]) dispatched
//!   by pattern matching. The same goes for content encryption and signature algorithms.
//! - Decryption and verification try keys from a [`JwkSet`] in order. A key that does not fit
//!   (wrong `use` / `key_ops`, a different `alg`, failed CEK recovery or tag check) is silently
//!   skipped; the aggregate outcome is a `bool`. The reason why a key was skipped is never
//!   reported, not even in logs, so that the pipelines do not become a decryption oracle.
//! - Structural issues (missing `alg` / `enc`, empty key set, already decrypted JWE, etc.)
//!   are reported as [`Error`]s.
//! - Header merging produces a fresh [`CompleteHeader`]; the source headers are never mutated.
//!
//! Parsing of serialized tokens, token creation and key storage are out of scope; the data
//! entities ([`Jwe`], [`Jws`], [`Jwk`]) are assembled by the caller.
//!
//! ## Supported algorithms
//!
//! | Algorithm(s) | Feature | Description |
//! |--------------|---------|-------------|
//! | `dir` | - | Shared symmetric key used as the CEK |
//! | `ECDH-ES`, `ECDH-ES+A*KW` | - | P-256 and P-384 via [`p256`] and [`p384`] |
//! | `RSA1_5`, `RSA-OAEP`, `RSA-OAEP-256` | `rsa` | Uses pure Rust [`rsa`] crate with blinding |
//! | `A*KW`, `A*GCMKW` | - | Uses [`aes-kw`] and [`aes-gcm`] |
//! | `A*CBC-HS*`, `A*GCM` | - | Content encryption via [`cbc`], [`hmac`] and [`aes-gcm`] |
//! | `HS256`, `HS384`, `HS512` | - | Uses pure Rust [`sha2`] crate |
//! | `RS*`, `PS*` (RSA) | `rsa` | Uses pure Rust [`rsa`] crate with blinding |
//! | `ES256`, `ES384` | - | Uses [`p256`] and [`p384`] |
//! | `EdDSA` (Ed25519) | `ed25519` | Uses [`ed25519-dalek`] |
//! | `DEF` compression | `deflate` | Raw DEFLATE via [`flate2`] |
//!
//! All features are enabled by default. `PBES2-*` and `none` are not supported.
//!
//! # Logging
//!
//! The crate emits [`tracing`] events: `debug` when a pipeline starts and finishes and when
//! a key is skipped (with the key index and the trial stage only), and `trace` when registries
//! are created.
//!
//! [JWE]: https://tools.ietf.org/html/rfc7516
//! [JWS]: https://tools.ietf.org/html/rfc7515
//! [`p256`]: https://docs.rs/p256/
//! [`p384`]: https://docs.rs/p384/
//! [`rsa`]: https://docs.rs/rsa/
//! [`aes-kw`]: https://docs.rs/aes-kw/
//! [`aes-gcm`]: https://docs.rs/aes-gcm/
//! [`cbc`]: https://docs.rs/cbc/
//! [`hmac`]: https://docs.rs/hmac/
//! [`sha2`]: https://docs.rs/sha2/
//! [`ed25519-dalek`]: https://docs.rs/ed25519-dalek/
//! [`flate2`]: https://docs.rs/flate2/
//! [`tracing`]: https://docs.rs/tracing/
//!
//! # Examples
//!
//! Decrypting a JWE for one of its recipients:
//!
//! ```
//! use jwx_compact::{
//!     alg::{ContentEncryptionAlgorithm, KeyManagementAlgorithm, KeyWrapping},
//!     jwk::{Jwk, JwkSet},
//!     CompleteHeader, Header, Jwe, Policy, Recipient,
//! };
//! use base64ct::{Base64UrlUnpadded, Encoding};
//! use rand::thread_rng;
//!
//! # fn main() -> anyhow::Result<()> {
//! let policy = Policy {
//!     key_encryption: vec!["A128KW".to_owned()],
//!     content_encryption: vec!["A128GCM".to_owned()],
//!     ..Policy::default()
//! };
//! let decrypter = policy.decrypter()?;
//!
//! // Encrypt a message for a recipient holding an AES key.
//! let key = Jwk::symmetric([42; 16]).with_key_id("alice");
//! let enc = ContentEncryptionAlgorithm::A128Gcm;
//! let alg = KeyManagementAlgorithm::KeyWrapping(KeyWrapping::A128Kw);
//! let encoded_header = Base64UrlUnpadded::encode_string(br#"{"enc":"A128GCM"}"#);
//! let produced = alg.encrypt_cek(&key.key, enc, &CompleteHeader::default(), &mut thread_rng())?;
//! let iv = enc.generate_iv(&mut thread_rng());
//! let (ciphertext, tag) = enc.encrypt(b"Hello", &produced.cek, &iv, None, &encoded_header)?;
//!
//! let mut recipient_header = Header::new();
//! recipient_header.insert("alg".into(), "A128KW".into());
//! let mut jwe = Jwe::new(encoded_header, ciphertext, iv, tag)?
//!     .with_recipient(Recipient::new(recipient_header, produced.encrypted_key));
//!
//! let keys: JwkSet = [Jwk::symmetric([1; 16]), key].into_iter().collect();
//! assert!(decrypter.decrypt_using_key_set(&mut jwe, &keys, 0)?);
//! assert_eq!(jwe.payload(), Some(b"Hello".as_slice()));
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

pub mod alg;
pub mod checker;
pub mod compression;
pub mod config;
mod error;
mod hash;
mod header;
mod jwe;
pub mod jwk;
mod jws;
pub mod registry;
mod traits;

pub use crate::{
    alg::{ContentEncryptionAlgorithm, KeyManagementAlgorithm, SignatureAlgorithm},
    config::Policy,
    error::{AlgorithmKind, Error, KeyError, ParseError, TrialStage},
    hash::HashAlgorithm,
    header::{CompleteHeader, Header},
    jwe::{Jwe, JweDecrypter, Recipient},
    jwk::{Jwk, JwkSet},
    jws::{Jws, JwsVerifier, Signature},
    registry::AlgorithmRegistry,
    traits::{Algorithm, AlgorithmExt, AlgorithmSignature},
};
