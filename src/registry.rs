//! Name-keyed algorithm registries built from an explicit allow-list.

use std::{collections::BTreeMap, fmt};

use crate::{
    alg::{ContentEncryptionAlgorithm, KeyManagementAlgorithm, SignatureAlgorithm},
    error::AlgorithmKind,
    Error,
};

/// Any algorithm known to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum JwaAlgorithm {
    /// Key management algorithm.
    KeyManagement(KeyManagementAlgorithm),
    /// Content encryption algorithm.
    ContentEncryption(ContentEncryptionAlgorithm),
    /// Signature algorithm.
    Signature(SignatureAlgorithm),
}

impl fmt::Display for JwaAlgorithm {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl JwaAlgorithm {
    fn all() -> impl Iterator<Item = Self> {
        KeyManagementAlgorithm::all()
            .map(Self::KeyManagement)
            .chain(ContentEncryptionAlgorithm::ALL.map(Self::ContentEncryption))
            .chain(SignatureAlgorithm::all().map(Self::Signature))
    }

    /// Looks up an algorithm by its name. Returns `None` for unknown names, including
    /// `none` and the `PBES2-*` family.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().find(|alg| alg.name() == name)
    }

    /// Returns the algorithm name.
    pub fn name(self) -> &'static str {
        match self {
            Self::KeyManagement(alg) => alg.name(),
            Self::ContentEncryption(alg) => alg.name(),
            Self::Signature(alg) => alg.name(),
        }
    }

    /// Returns the algorithm category.
    pub fn kind(self) -> AlgorithmKind {
        match self {
            Self::KeyManagement(_) => AlgorithmKind::KeyManagement,
            Self::ContentEncryption(_) => AlgorithmKind::ContentEncryption,
            Self::Signature(_) => AlgorithmKind::Signature,
        }
    }
}

impl From<KeyManagementAlgorithm> for JwaAlgorithm {
    fn from(alg: KeyManagementAlgorithm) -> Self {
        Self::KeyManagement(alg)
    }
}

impl From<ContentEncryptionAlgorithm> for JwaAlgorithm {
    fn from(alg: ContentEncryptionAlgorithm) -> Self {
        Self::ContentEncryption(alg)
    }
}

impl From<SignatureAlgorithm> for JwaAlgorithm {
    fn from(alg: SignatureAlgorithm) -> Self {
        Self::Signature(alg)
    }
}

/// Immutable lookup of allowed algorithms by name.
///
/// A registry is built once from a policy allow-list and then only read, so it can be shared
/// among threads without synchronization.
///
/// # Examples
///
/// ```
/// # use jwx_compact::{registry::AlgorithmRegistry, Error};
/// # fn main() -> Result<(), Error> {
/// let registry = AlgorithmRegistry::new(["A256KW", "ECDH-ES"])?;
/// assert!(registry.has("A256KW"));
/// assert!(!registry.has("RSA1_5"));
/// assert!(registry.get("RSA1_5").is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AlgorithmRegistry {
    algorithms: BTreeMap<&'static str, JwaAlgorithm>,
}

impl AlgorithmRegistry {
    /// Creates a registry with the specified algorithm names. Unknown names fail
    /// with [`Error::UnsupportedAlgorithm`].
    pub fn new<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Result<Self, Error> {
        names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                JwaAlgorithm::from_name(name)
                    .ok_or_else(|| Error::UnsupportedAlgorithm(name.to_owned()))
            })
            .collect()
    }

    /// Creates a registry with all algorithms of the specified kind supported by this crate.
    pub fn with_all(kind: AlgorithmKind) -> Self {
        JwaAlgorithm::all().filter(|alg| alg.kind() == kind).collect()
    }

    /// Returns the number of registered algorithms.
    pub fn len(&self) -> usize {
        self.algorithms.len()
    }

    /// Checks whether this registry is empty.
    pub fn is_empty(&self) -> bool {
        self.algorithms.is_empty()
    }

    /// Checks whether an algorithm with the specified name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.algorithms.contains_key(name)
    }

    /// Iterates over the registered algorithm names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.algorithms.keys().copied()
    }

    /// Resolves an algorithm by its name.
    pub fn get(&self, name: &str) -> Result<JwaAlgorithm, Error> {
        self.algorithms
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnsupportedAlgorithm(name.to_owned()))
    }

    fn wrong_category(name: &str, expected: AlgorithmKind) -> Error {
        Error::AlgorithmCategory {
            name: name.to_owned(),
            expected,
        }
    }

    pub(crate) fn key_management(&self, name: &str) -> Result<KeyManagementAlgorithm, Error> {
        match self.get(name)? {
            JwaAlgorithm::KeyManagement(alg) => Ok(alg),
            _ => Err(Self::wrong_category(name, AlgorithmKind::KeyManagement)),
        }
    }

    pub(crate) fn content_encryption(
        &self,
        name: &str,
    ) -> Result<ContentEncryptionAlgorithm, Error> {
        match self.get(name)? {
            JwaAlgorithm::ContentEncryption(alg) => Ok(alg),
            _ => Err(Self::wrong_category(name, AlgorithmKind::ContentEncryption)),
        }
    }

    pub(crate) fn signature(&self, name: &str) -> Result<SignatureAlgorithm, Error> {
        match self.get(name)? {
            JwaAlgorithm::Signature(alg) => Ok(alg),
            _ => Err(Self::wrong_category(name, AlgorithmKind::Signature)),
        }
    }
}

impl<A: Into<JwaAlgorithm>> FromIterator<A> for AlgorithmRegistry {
    fn from_iter<I: IntoIterator<Item = A>>(iter: I) -> Self {
        let algorithms: BTreeMap<_, _> = iter
            .into_iter()
            .map(|alg| {
                let alg = alg.into();
                (alg.name(), alg)
            })
            .collect();
        tracing::trace!(
            algorithms = ?algorithms.keys().collect::<Vec<_>>(),
            "created algorithm registry"
        );
        Self { algorithms }
    }
}
