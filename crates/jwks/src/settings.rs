//! Resolver and conversion settings.
//!
//! Settings are read from TOML and can be overridden from the environment
//! with the `JWKS` prefix and `__` separator, e.g.
//! `JWKS__RESOLVER__TIMEOUT_SECS=5`. Every value has a default.

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::Deserialize;

use crate::encoding::ExponentEncoding;
use crate::error::JwksError;

pub const ENVIRONMENT_PREFIX: &str = "JWKS";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_BODY_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Upper bound on one fetch, connect through body read.
    pub timeout_secs: u64,
    /// Responses with a larger body are rejected.
    pub max_body_bytes: u64,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConversionSettings {
    /// Encoding of `e` when a key is derived from a certificate.
    pub exponent_encoding: ExponentEncoding,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub resolver: ResolverSettings,
    pub conversion: ConversionSettings,
}

impl Settings {
    /// Loads settings from a TOML document, then applies `JWKS__*` overrides.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::Configuration`] if the TOML is invalid, a value has
    /// the wrong type, or a limit is zero.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<JwksError>> {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_PREFIX)
            .separator("__")
            .try_parsing(true);

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(JwksError::Configuration {
                message: "Failed to load settings".into(),
            })?;

        let settings: Self = config
            .try_deserialize()
            .change_context(JwksError::Configuration {
                message: "Failed to deserialize settings".into(),
            })?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), Report<JwksError>> {
        if self.resolver.timeout_secs == 0 {
            return Err(Report::new(JwksError::Configuration {
                message: "resolver.timeout_secs must be greater than zero".into(),
            }));
        }
        if self.resolver.max_body_bytes == 0 {
            return Err(Report::new(JwksError::Configuration {
                message: "resolver.max_body_bytes must be greater than zero".into(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERRIDES: [&str; 3] = [
        "JWKS__RESOLVER__TIMEOUT_SECS",
        "JWKS__RESOLVER__MAX_BODY_BYTES",
        "JWKS__CONVERSION__EXPONENT_ENCODING",
    ];

    fn load(toml_str: &str) -> Result<Settings, Report<JwksError>> {
        temp_env::with_vars_unset(OVERRIDES, || Settings::from_toml(toml_str))
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let settings = load("").expect("should load empty settings");

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.resolver.timeout_secs, 10);
        assert_eq!(settings.resolver.max_body_bytes, 1024 * 1024);
        assert_eq!(
            settings.conversion.exponent_encoding,
            ExponentEncoding::Fixed
        );
    }

    #[test]
    fn test_settings_from_valid_toml() {
        let toml_str = r#"
            [resolver]
            timeout_secs = 3
            max_body_bytes = 4096

            [conversion]
            exponent_encoding = "minimal"
            "#;

        let settings = load(toml_str).expect("should load settings");

        assert_eq!(settings.resolver.timeout_secs, 3);
        assert_eq!(settings.resolver.max_body_bytes, 4096);
        assert_eq!(
            settings.conversion.exponent_encoding,
            ExponentEncoding::Minimal
        );
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let settings = load("[resolver]\ntimeout_secs = 30\n").expect("should load settings");

        assert_eq!(settings.resolver.timeout_secs, 30);
        assert_eq!(settings.resolver.max_body_bytes, 1024 * 1024);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for toml_str in [
            "[resolver]\ntimeout_secs = 0\n",
            "[resolver]\nmax_body_bytes = 0\n",
            "[resolver]\ntimeout_secs = \"soon\"\n",
            "[conversion]\nexponent_encoding = \"compact\"\n",
            "[resolver\n",
        ] {
            let err = load(toml_str).expect_err("should reject settings");
            assert!(
                matches!(err.current_context(), JwksError::Configuration { .. }),
                "unexpected error for {:?}",
                toml_str
            );
        }
    }

    #[test]
    fn test_environment_overrides_toml() {
        temp_env::with_vars(
            [
                ("JWKS__RESOLVER__TIMEOUT_SECS", Some("42")),
                ("JWKS__CONVERSION__EXPONENT_ENCODING", Some("minimal")),
            ],
            || {
                let settings = Settings::from_toml("[resolver]\ntimeout_secs = 3\n")
                    .expect("should load settings");

                assert_eq!(settings.resolver.timeout_secs, 42);
                assert_eq!(
                    settings.conversion.exponent_encoding,
                    ExponentEncoding::Minimal
                );
            },
        );
    }
}
