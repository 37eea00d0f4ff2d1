//! Error types for JWKS parsing, key conversion and resolution.

use derive_more::{Display, Error};

use crate::resolver::ACCEPTED_CONTENT_TYPES;

/// Errors raised by the key conversion engine and the resolvers.
///
/// Fallible functions in this crate return `Report<JwksError>` so the
/// underlying cause (`serde_json`, `der`, `ureq`, ...) stays attached.
#[derive(Debug, Display, Error)]
pub enum JwksError {
    /// The certificate or key record carries a key type this crate does not convert.
    #[display("Unsupported key type: {kty}")]
    UnsupportedKeyType { kty: String },

    /// The named curve is not in the curve registry.
    #[display("Unsupported curve: {name}")]
    UnsupportedCurve { name: String },

    /// A field is not valid base64url.
    #[display("Failed to decode '{field}': {message}")]
    Decode { field: String, message: String },

    /// A field required for the conversion is absent.
    #[display("Missing key parameter '{field}'")]
    MissingParameter { field: String },

    /// The decoded key material was rejected by the crypto backend.
    #[display("Invalid key material: {message}")]
    InvalidKey { message: String },

    /// The certificate could not be encoded or its public key could not be read.
    #[display("Certificate error: {message}")]
    Certificate { message: String },

    /// The location could not be reached or read.
    #[display("Transport error: {message}")]
    Transport { message: String },

    /// The server answered with a status other than 200 OK.
    #[display("Could not fetch JWKS, status code was {status}, expected 200 OK")]
    UnexpectedStatus { status: u16 },

    /// The server answered with a content type that is not a JWK(S) JSON type.
    #[display(
        "Invalid content type '{content_type}', expected one of: {}",
        ACCEPTED_CONTENT_TYPES.join(", ")
    )]
    UnexpectedContentType { content_type: String },

    /// The body is empty or not a JWKS document.
    #[display("Malformed JWKS body: {message}")]
    MalformedBody { message: String },

    /// Settings could not be loaded or are out of range.
    #[display("Configuration error: {message}")]
    Configuration { message: String },
}

impl JwksError {
    pub(crate) fn decode(field: &str, message: impl Into<String>) -> Self {
        Self::Decode {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn missing(field: &str) -> Self {
        Self::MissingParameter {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }
}
