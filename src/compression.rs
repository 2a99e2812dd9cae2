//! Payload compression (the `zip` header parameter).

#[cfg(feature = "deflate")]
use flate2::{read::DeflateDecoder, write::DeflateEncoder, Compression};

use std::{collections::BTreeMap, fmt};
#[cfg(feature = "deflate")]
use std::io::{Read, Write};

use crate::Error;

/// Default upper bound on the length of a decompressed payload (1 MiB).
pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 1 << 20;

/// Compression method applied to the plaintext before encryption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CompressionMethod {
    /// `DEF`: raw DEFLATE ([RFC 1951](https://tools.ietf.org/html/rfc1951)).
    #[cfg(feature = "deflate")]
    #[cfg_attr(docsrs, doc(cfg(feature = "deflate")))]
    Deflate,
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name())
    }
}

impl CompressionMethod {
    const ALL: &'static [Self] = &[
        #[cfg(feature = "deflate")]
        Self::Deflate,
    ];

    /// Looks up a method by its `zip` value.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|method| method.name() == name)
    }

    /// Returns the `zip` value of this method.
    pub fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "deflate")]
            Self::Deflate => "DEF",
        }
    }

    /// Compresses `data`.
    pub fn compress(self, data: &[u8]) -> anyhow::Result<Vec<u8>> {
        match self {
            #[cfg(feature = "deflate")]
            Self::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
        }
    }

    /// Decompresses `data`. Fails if the decompressed data is longer than `max_len` bytes;
    /// the decompression stops as soon as the limit is exceeded.
    pub fn uncompress(self, data: &[u8], max_len: usize) -> anyhow::Result<Vec<u8>> {
        match self {
            #[cfg(feature = "deflate")]
            Self::Deflate => {
                let limit = u64::try_from(max_len).map_or(u64::MAX, |len| len.saturating_add(1));
                let mut decompressed = Vec::new();
                DeflateDecoder::new(data)
                    .take(limit)
                    .read_to_end(&mut decompressed)?;
                anyhow::ensure!(
                    decompressed.len() <= max_len,
                    "decompressed payload exceeds {max_len} bytes"
                );
                Ok(decompressed)
            }
        }
    }
}

/// Immutable lookup of allowed compression methods by their `zip` value.
///
/// The registry also bounds the length of decompressed payloads, which is
/// [`DEFAULT_MAX_PAYLOAD_LEN`] unless set with [`Self::with_max_payload_len()`].
#[derive(Debug, Clone)]
pub struct CompressionRegistry {
    methods: BTreeMap<&'static str, CompressionMethod>,
    max_payload_len: usize,
}

impl Default for CompressionRegistry {
    fn default() -> Self {
        Self {
            methods: BTreeMap::new(),
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
        }
    }
}

impl CompressionRegistry {
    /// Creates a registry with the specified method names. Unknown names fail with
    /// [`Error::UnsupportedCompression`].
    pub fn new<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Result<Self, Error> {
        names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                CompressionMethod::from_name(name)
                    .ok_or_else(|| Error::UnsupportedCompression(name.to_owned()))
            })
            .collect()
    }

    /// Checks whether a method with the specified name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Resolves a method by its name.
    pub fn get(&self, name: &str) -> Result<CompressionMethod, Error> {
        self.methods
            .get(name)
            .copied()
            .ok_or_else(|| Error::UnsupportedCompression(name.to_owned()))
    }

    /// Sets the maximum length of a decompressed payload in bytes.
    #[must_use]
    pub fn with_max_payload_len(mut self, max_len: usize) -> Self {
        self.max_payload_len = max_len;
        self
    }

    /// Returns the maximum length of a decompressed payload in bytes.
    pub fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }

    /// Decompresses `data` with the method registered under `name`, honoring
    /// the payload length limit.
    pub(crate) fn uncompress(&self, name: &str, data: &[u8]) -> Result<Vec<u8>, Error> {
        self.get(name)?
            .uncompress(data, self.max_payload_len)
            .map_err(Error::DecompressionFailure)
    }
}

impl FromIterator<CompressionMethod> for CompressionRegistry {
    fn from_iter<I: IntoIterator<Item = CompressionMethod>>(iter: I) -> Self {
        let methods: BTreeMap<_, _> = iter
            .into_iter()
            .map(|method| (method.name(), method))
            .collect();
        tracing::trace!(
            methods = ?methods.keys().collect::<Vec<_>>(),
            "created compression registry"
        );
        Self {
            methods,
            ..Self::default()
        }
    }
}

#[cfg(all(test, feature = "deflate"))]
mod tests {
    use super::*;

    use assert_matches::assert_matches;

    #[test]
    fn deflate_round_trip() {
        let data = b"You can trust us to stick with you through thick and thin".repeat(10);
        let compressed = CompressionMethod::Deflate.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        let restored = CompressionMethod::Deflate
            .uncompress(&compressed, data.len())
            .unwrap();
        assert_eq!(restored, data);

        let err = CompressionMethod::Deflate
            .uncompress(&compressed, data.len() - 1)
            .unwrap_err();
        assert!(err.to_string().contains("exceeds"), "{err}");
    }

    #[test]
    fn deflate_is_raw() {
        // A zlib stream starts with a header that is not a valid raw DEFLATE block.
        let zlib_stream = [0x78, 0x9c, 0xff, 0xff, 0xff, 0xff];
        assert!(CompressionMethod::Deflate
            .uncompress(&zlib_stream, DEFAULT_MAX_PAYLOAD_LEN)
            .is_err());
    }

    #[test]
    fn registry_lookup() {
        let registry = CompressionRegistry::new(["DEF"]).unwrap();
        assert_eq!(registry.max_payload_len(), DEFAULT_MAX_PAYLOAD_LEN);
        assert!(registry.has("DEF"));
        assert_eq!(registry.get("DEF").unwrap(), CompressionMethod::Deflate);
        assert_matches!(
            registry.get("GZIP"),
            Err(Error::UnsupportedCompression(name)) if name == "GZIP"
        );
        assert_matches!(
            CompressionRegistry::new(["ZLIB"]),
            Err(Error::UnsupportedCompression(_))
        );
    }

    #[test]
    fn registry_bounds_decompressed_length() {
        let data = vec![0_u8; 1 << 16];
        let compressed = CompressionMethod::Deflate.compress(&data).unwrap();

        let registry = CompressionRegistry::new(["DEF"])
            .unwrap()
            .with_max_payload_len(1 << 10);
        assert_matches!(
            registry.uncompress("DEF", &compressed),
            Err(Error::DecompressionFailure(_))
        );

        let registry = registry.with_max_payload_len(data.len());
        assert_eq!(registry.uncompress("DEF", &compressed).unwrap(), data);
    }
}
