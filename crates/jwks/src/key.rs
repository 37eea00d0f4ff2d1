//! JSON Web Key record.
//!
//! [`Key`] mirrors the RFC 7517/7518 wire object field for field. Every member
//! is optional and numeric members stay base64url strings, so a parsed key
//! re-serializes to the same values it was read from. Use [`Key::material`]
//! for a view of the members that matter for the key's `kty`.

use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use x509_cert::{der::Decode, Certificate};

use crate::encoding;
use crate::error::JwksError;

pub const KEY_TYPE_RSA: &str = "RSA";
pub const KEY_TYPE_EC: &str = "EC";
pub const KEY_TYPE_OCT: &str = "oct";

pub const USE_SIGNATURE: &str = "sig";

/// One JWK entry of a JWKS document.
///
/// `key_ops` and `x5c` distinguish an absent member from an empty array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    #[serde(rename = "alg", default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    #[serde(rename = "kty", default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
    #[serde(rename = "key_ops", default, skip_serializing_if = "Option::is_none")]
    pub key_operations: Option<Vec<String>>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(rename = "kid", default, skip_serializing_if = "Option::is_none")]
    pub key_id: Option<String>,

    /// SHA-1 digest of the leaf certificate, hex encoded.
    #[serde(rename = "x5t", default, skip_serializing_if = "Option::is_none")]
    pub x509_thumbprint: Option<String>,
    /// SHA-256 digest of the leaf certificate, hex encoded.
    #[serde(rename = "x5t#S256", default, skip_serializing_if = "Option::is_none")]
    pub x509_thumbprint_sha256: Option<String>,
    /// DER certificates, leaf first.
    #[serde(rename = "x5c", default, skip_serializing_if = "Option::is_none")]
    pub x509_chain: Option<Vec<String>>,
    #[serde(rename = "x5u", default, skip_serializing_if = "Option::is_none")]
    pub x509_url: Option<String>,

    #[serde(rename = "crv", default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,

    /// RSA modulus.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// Symmetric key bytes. Never converted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,

    // Private parameters are carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,

    /// Vendor "bring your own key" member.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

/// The members of a [`Key`] that carry meaning for its `kty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMaterial<'a> {
    Rsa {
        n: Option<&'a str>,
        e: Option<&'a str>,
    },
    Ec {
        crv: Option<&'a str>,
        x: Option<&'a str>,
        y: Option<&'a str>,
    },
    Symmetric {
        k: Option<&'a str>,
    },
    /// Any other `kty`, including a missing one (empty string).
    Other(&'a str),
}

impl Key {
    /// Returns the `kty` member, or an empty string when absent.
    #[must_use]
    pub fn kty(&self) -> &str {
        self.key_type.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn material(&self) -> KeyMaterial<'_> {
        match self.kty() {
            KEY_TYPE_RSA => KeyMaterial::Rsa {
                n: self.n.as_deref(),
                e: self.e.as_deref(),
            },
            KEY_TYPE_EC => KeyMaterial::Ec {
                crv: self.curve.as_deref(),
                x: self.x.as_deref(),
                y: self.y.as_deref(),
            },
            KEY_TYPE_OCT => KeyMaterial::Symmetric {
                k: self.k.as_deref(),
            },
            other => KeyMaterial::Other(other),
        }
    }

    /// Whether any private-key member (`d`, `p`, `q`, `dp`, `dq`, `qi`) is set.
    #[must_use]
    pub fn has_private_parameters(&self) -> bool {
        [&self.d, &self.p, &self.q, &self.dp, &self.dq, &self.qi]
            .iter()
            .any(|member| member.is_some())
    }

    /// The `x5c` entries, empty when the member is absent.
    #[must_use]
    pub fn chain(&self) -> &[String] {
        self.x509_chain.as_deref().unwrap_or_default()
    }

    /// Decodes the `x5c` chain into certificates, leaf first.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::Decode`] for an entry that is not base64, or
    /// [`JwksError::Certificate`] for one that is not a DER certificate.
    pub fn certificates(&self) -> Result<Vec<Certificate>, Report<JwksError>> {
        self.chain()
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let der = encoding::decode_certificate(entry)
                    .attach(format!("while decoding x5c[{}]", index))?;
                Certificate::from_der(&der).map_err(|e| {
                    Report::new(JwksError::Certificate {
                        message: format!("x5c[{}] is not a DER certificate: {}", index, e),
                    })
                })
            })
            .collect()
    }
}

impl TryFrom<&jose_jwk::Jwk> for Key {
    type Error = Report<JwksError>;

    fn try_from(jwk: &jose_jwk::Jwk) -> Result<Self, Self::Error> {
        let value = serde_json::to_value(jwk).change_context(JwksError::InvalidKey {
            message: "Failed to serialize JWK".into(),
        })?;
        serde_json::from_value(value).change_context(JwksError::InvalidKey {
            message: "JWK does not map onto a key record".into(),
        })
    }
}
