//! JSON Web Key Sets.
//!
//! This crate parses and writes JWKS documents (RFC 7517), converts between
//! JWK records, X.509 certificates and RSA/EC public keys, and fetches JWKS
//! documents from files or HTTP endpoints.
//!
//! # Modules
//!
//! - [`convert`]: Certificate to JWK and JWK to public key conversion
//! - [`curve`]: Named curve registry (`P-224`, `P-256`, `P-384`, `P-521`)
//! - [`encoding`]: Base64url big-integer encoding rules
//! - [`error`]: Error types
//! - [`key`]: The JWK record and its per-type view
//! - [`resolver`]: The `Resolver` trait with file and HTTP implementations
//! - [`response`]: The `{"keys": [...]}` document
//! - [`settings`]: Resolver and conversion settings
//! - [`test_support`]: Shared test fixtures

pub mod convert;
pub mod curve;
pub mod encoding;
pub mod error;
pub mod key;
pub mod resolver;
pub mod response;
pub mod settings;

pub use convert::{
    certificate_to_key, certificate_to_key_with, key_to_public_key, EcPublicKey, PublicKey,
};
pub use curve::{resolve_curve, NamedCurve};
pub use error::JwksError;
pub use key::{Key, KeyMaterial};
#[cfg(feature = "http")]
pub use resolver::{HttpResolver, RejectedResponse};
pub use resolver::{FileResolver, ResolvedJwks, Resolver};
pub use response::Response;
pub use settings::Settings;
