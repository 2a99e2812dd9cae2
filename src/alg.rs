//! Implementations of JWA algorithms: key management, content encryption and signatures.
//!
//! Each category is a closed enum ([`KeyManagementAlgorithm`], [`ContentEncryptionAlgorithm`],
//! [`SignatureAlgorithm`]) dispatched by pattern matching. Signature algorithms additionally
//! implement the [`Algorithm`](crate::Algorithm) trait on typed keys.

mod aes_gcm;
mod aes_kw;
mod content;
pub(crate) mod ec;
mod ecdh;
mod ecdsa;
// EdDSA implementation.
#[cfg(feature = "ed25519")]
mod eddsa;
mod hmacs;
mod key_management;
// RSA implementations.
#[cfg(feature = "rsa")]
mod rsa;
#[cfg(feature = "rsa")]
mod rsa_encryption;
mod signature;

pub use self::aes_kw::KeyWrapping;
pub use self::content::{authenticated_data, ContentEncryptionAlgorithm};
pub use self::ec::{generate_key as generate_ec_key, Curve};
pub use self::ecdh::{concat_kdf, EcdhEs, EcdhEsKeyWrap};
pub use self::ecdsa::{Es256, Es384};
#[cfg(feature = "ed25519")]
#[cfg_attr(docsrs, doc(cfg(feature = "ed25519")))]
pub use self::eddsa::Ed25519;
pub use self::hmacs::*;
pub use self::key_management::{DirectEncryption, EncryptedCek, KeyManagementAlgorithm};
#[cfg(feature = "rsa")]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
pub use self::rsa::{ModulusBits, Rsa, RsaPrivateKey, RsaPublicKey, RsaSignature};
#[cfg(feature = "rsa")]
#[cfg_attr(docsrs, doc(cfg(feature = "rsa")))]
pub use self::rsa_encryption::RsaKeyEncryption;
pub use self::signature::SignatureAlgorithm;
