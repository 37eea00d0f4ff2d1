//! The `{"keys": [...]}` JWKS document.

use std::str::FromStr;

use error_stack::{Report, ResultExt};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::JwksError;
use crate::key::Key;

/// A JWK Set. Key order is preserved and duplicate key ids are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub keys: Vec<Key>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Key>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Key>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Response {
    #[must_use]
    pub fn new(keys: Vec<Key>) -> Self {
        Self { keys }
    }

    /// Parses a JWKS document.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::MalformedBody`] if the bytes are not a JSON object
    /// with an optional `keys` array of key objects.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Report<JwksError>> {
        serde_json::from_slice(bytes).change_context(JwksError::MalformedBody {
            message: "Failed to parse JWKS document".into(),
        })
    }

    /// Serializes the document as compact JSON. An empty set is `{"keys":[]}`.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::MalformedBody`] if serialization fails.
    pub fn to_vec(&self) -> Result<Vec<u8>, Report<JwksError>> {
        serde_json::to_vec(self).change_context(JwksError::MalformedBody {
            message: "Failed to serialize JWKS document".into(),
        })
    }

    /// Returns the first key whose `kid` equals `kid`.
    #[must_use]
    pub fn find(&self, kid: &str) -> Option<&Key> {
        self.keys
            .iter()
            .find(|key| key.key_id.as_deref() == Some(kid))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Key> {
        self.keys.iter()
    }
}

impl FromStr for Response {
    type Err = Report<JwksError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_slice(s.as_bytes())
    }
}

impl<'a> IntoIterator for &'a Response {
    type Item = &'a Key;
    type IntoIter = std::slice::Iter<'a, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
