//! JOSE headers and their merging.

use anyhow::{anyhow, Context as _};
use base64ct::{Base64UrlUnpadded, Encoding};
use serde_json::Value;

use crate::{error::ParseError, Error};

/// Header parameters: a JSON object mapping parameter names to values.
pub type Header = serde_json::Map<String, Value>;

/// Decodes an encoded protected header. An empty string corresponds to an empty header.
pub(crate) fn decode_protected_header(encoded: &str) -> Result<Header, ParseError> {
    if encoded.is_empty() {
        return Ok(Header::new());
    }
    let bytes = Base64UrlUnpadded::decode_vec(encoded)?;
    match serde_json::from_slice(&bytes).map_err(ParseError::MalformedHeader)? {
        Value::Object(header) => Ok(header),
        _ => Err(ParseError::HeaderNotObject),
    }
}

/// Complete header for a single recipient or signature: the union of the shared protected
/// header, the shared unprotected header and the per-entity header.
///
/// Merging is last-write-wins by scope: parameters of later scopes override those
/// of earlier scopes. The source headers are never modified.
///
/// # Examples
///
/// ```
/// # use jwx_compact::{CompleteHeader, Header};
/// # use serde_json::json;
/// let protected: Header = serde_json::from_value(json!({ "enc": "A128GCM" })).unwrap();
/// let recipient: Header = serde_json::from_value(json!({ "alg": "A128KW" })).unwrap();
/// let header = CompleteHeader::merge([&protected, &Header::new(), &recipient]);
/// assert_eq!(header.str_param("enc"), Some("A128GCM"));
/// assert_eq!(header.str_param("alg"), Some("A128KW"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompleteHeader {
    params: Header,
}

impl CompleteHeader {
    /// Merges `scopes` in order; later scopes take precedence on key collision.
    pub fn merge<'a>(scopes: impl IntoIterator<Item = &'a Header>) -> Self {
        let mut params = Header::new();
        for scope in scopes {
            for (name, value) in scope {
                params.insert(name.clone(), value.clone());
            }
        }
        Self { params }
    }

    /// Returns the merged parameters.
    pub fn as_map(&self) -> &Header {
        &self.params
    }

    /// Gets a parameter by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// Checks whether the parameter is present.
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Gets a string parameter. Returns `None` if the parameter is absent or is not a string.
    pub fn str_param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }

    /// Gets a required string parameter, failing hard if it is absent or not a string.
    pub(crate) fn required_str(&self, name: &'static str) -> Result<&str, Error> {
        match self.params.get(name) {
            None => Err(Error::MissingHeaderParameter(name)),
            Some(Value::String(value)) => Ok(value),
            Some(_) => Err(Error::MalformedHeaderParameter {
                name,
                reason: anyhow!("expected a string"),
            }),
        }
    }

    /// Gets a base64url-encoded binary parameter, such as `apu` or `iv`.
    pub(crate) fn bytes_param(&self, name: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let Some(value) = self.params.get(name) else {
            return Ok(None);
        };
        let encoded = value
            .as_str()
            .ok_or_else(|| anyhow!("header parameter `{name}` is not a string"))?;
        let bytes = Base64UrlUnpadded::decode_vec(encoded)
            .map_err(|err| anyhow!(err))
            .with_context(|| format!("header parameter `{name}` is not valid base64url"))?;
        Ok(Some(bytes))
    }

    /// Gets a required binary parameter.
    pub(crate) fn required_bytes(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        self.bytes_param(name)?
            .ok_or_else(|| anyhow!("header parameter `{name}` is missing"))
    }
}
