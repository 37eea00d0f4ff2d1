//! Fetching JWKS documents.
//!
//! A [`Resolver`] turns a location into a parsed [`Response`] together with the
//! exact bytes it was parsed from. [`FileResolver`] reads from the filesystem;
//! [`HttpResolver`] (feature `http`) performs a blocking GET.

use std::path::Path;

use error_stack::{Report, ResultExt};

use crate::error::JwksError;
use crate::response::Response;

/// Media types accepted for a JWKS body, without parameters.
pub const ACCEPTED_CONTENT_TYPES: [&str; 3] = [
    "application/json",
    "application/jwk-set+json",
    "application/jwk+json",
];

/// A successfully resolved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedJwks {
    pub response: Response,
    /// The body exactly as received.
    pub raw: Vec<u8>,
}

/// Source of JWKS documents.
pub trait Resolver {
    /// Fetches and parses the document at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::Transport`] if the location cannot be read, and
    /// [`JwksError::MalformedBody`] if the body is empty or not a JWKS
    /// document. Implementations may add their own rejections.
    fn get(&self, location: &str) -> Result<ResolvedJwks, Report<JwksError>>;
}

/// Whether a `Content-Type` value names a JWK(S) JSON media type.
///
/// Parameters after `;` are ignored and the comparison is case-insensitive.
#[must_use]
pub fn is_accepted_content_type(content_type: &str) -> bool {
    let media_type = content_type.split(';').next().unwrap_or_default().trim();
    ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(media_type))
}

/// Parses a fetched body, keeping the raw bytes on success.
///
/// # Errors
///
/// Returns [`JwksError::MalformedBody`] if `raw` is empty or not a JWKS document.
pub fn parse_body(raw: Vec<u8>) -> Result<ResolvedJwks, Report<JwksError>> {
    let response = parse_document(&raw)?;
    Ok(ResolvedJwks { response, raw })
}

fn parse_document(raw: &[u8]) -> Result<Response, Report<JwksError>> {
    if raw.is_empty() {
        return Err(Report::new(JwksError::MalformedBody {
            message: "body is empty".into(),
        }));
    }
    Response::from_slice(raw)
}

/// Reads JWKS documents from local files. The location is a path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileResolver;

impl Resolver for FileResolver {
    fn get(&self, location: &str) -> Result<ResolvedJwks, Report<JwksError>> {
        let path = Path::new(location);
        log::debug!("Reading JWKS from {}", path.display());

        let raw = std::fs::read(path).change_context(JwksError::Transport {
            message: format!("Failed to read {}", path.display()),
        })?;

        parse_body(raw).inspect_err(|_| {
            log::warn!("Rejected JWKS file {}: malformed body", path.display());
        })
    }
}

#[cfg(feature = "http")]
pub use self::http_resolver::{HttpResolver, RejectedResponse};

#[cfg(feature = "http")]
mod http_resolver {
    use std::fmt;
    use std::time::Duration;

    use error_stack::{Report, ResultExt};
    use http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
    use url::Url;

    use super::{is_accepted_content_type, parse_document, ResolvedJwks, Resolver};
    use crate::error::JwksError;
    use crate::settings::ResolverSettings;

    /// Fetches JWKS documents over HTTP(S) with a blocking agent.
    ///
    /// Only `200 OK` responses with a JSON content type are accepted. The body
    /// is capped at [`ResolverSettings::max_body_bytes`].
    #[derive(Clone)]
    pub struct HttpResolver {
        agent: ureq::Agent,
        max_body_bytes: u64,
    }

    /// A response the server sent but the resolver did not accept.
    ///
    /// Attached to the report of every rejection that happens after the
    /// server answered; read it back with
    /// `report.downcast_ref::<RejectedResponse>()`. `body` holds what was read
    /// within the body limit and is empty when the body could not be read.
    #[derive(Debug, Clone)]
    pub struct RejectedResponse {
        pub status: u16,
        pub headers: HeaderMap,
        pub body: Vec<u8>,
    }

    impl RejectedResponse {
        fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
            Self {
                status: status.as_u16(),
                headers,
                body,
            }
        }
    }

    impl fmt::Display for RejectedResponse {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "HTTP {} response with {} body bytes",
                self.status,
                self.body.len()
            )
        }
    }

    impl HttpResolver {
        /// Resolver with the default timeout and body limit.
        #[must_use]
        pub fn new() -> Self {
            Self::from_settings(&ResolverSettings::default())
        }

        #[must_use]
        pub fn from_settings(settings: &ResolverSettings) -> Self {
            let agent: ureq::Agent = ureq::Agent::config_builder()
                .timeout_global(Some(Duration::from_secs(settings.timeout_secs)))
                .http_status_as_error(false)
                .build()
                .into();
            Self {
                agent,
                max_body_bytes: settings.max_body_bytes,
            }
        }

        fn parse_location(location: &str) -> Result<Url, Report<JwksError>> {
            let url = Url::parse(location).change_context(JwksError::Transport {
                message: format!("Invalid JWKS location '{}'", location),
            })?;
            match url.scheme() {
                "http" | "https" => Ok(url),
                scheme => Err(Report::new(JwksError::Transport {
                    message: format!("Unsupported scheme '{}' in JWKS location", scheme),
                })),
            }
        }
    }

    impl Default for HttpResolver {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Resolver for HttpResolver {
        fn get(&self, location: &str) -> Result<ResolvedJwks, Report<JwksError>> {
            let url = Self::parse_location(location)?;
            log::info!("Fetching JWKS from {}", url);

            let mut response = self
                .agent
                .get(url.as_str())
                .call()
                .change_context(JwksError::Transport {
                    message: format!("Failed to send request to {}", url),
                })?;

            let status = response.status();
            let headers = response.headers().clone();
            let body = response
                .body_mut()
                .with_config()
                .limit(self.max_body_bytes)
                .read_to_vec()
                .change_context(JwksError::Transport {
                    message: format!("Failed to read response body from {}", url),
                });

            if status != StatusCode::OK {
                log::warn!("Rejected JWKS from {}: status {}", url, status.as_u16());
                let rejected = RejectedResponse::new(status, headers, body.unwrap_or_default());
                let report = Report::new(JwksError::UnexpectedStatus {
                    status: status.as_u16(),
                });
                return Err(report.attach(rejected));
            }

            let content_type = headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or_default()
                .to_string();
            if !is_accepted_content_type(&content_type) {
                log::warn!(
                    "Rejected JWKS from {}: content type '{}'",
                    url, content_type
                );
                let rejected = RejectedResponse::new(status, headers, body.unwrap_or_default());
                let report = Report::new(JwksError::UnexpectedContentType { content_type });
                return Err(report.attach(rejected));
            }

            let raw = match body {
                Ok(raw) => raw,
                Err(report) => {
                    log::warn!("Rejected JWKS from {}: unreadable body", url);
                    let rejected = RejectedResponse::new(status, headers, Vec::new());
                    return Err(report.attach(rejected));
                }
            };

            match parse_document(&raw) {
                Ok(response) => Ok(ResolvedJwks { response, raw }),
                Err(report) => {
                    log::warn!("Rejected JWKS from {}: malformed body", url);
                    Err(report.attach(RejectedResponse::new(status, headers, raw)))
                }
            }
        }
    }

}
