//! Named elliptic curve registry.
//!
//! Maps the RFC 7518 section 6.2.1.1 curve names to the NIST curves this
//! crate can build public keys for. Matching is exact and case-sensitive.

use std::fmt;

use const_oid::ObjectIdentifier;

/// A NIST curve supported by the conversion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedCurve {
    P224,
    P256,
    P384,
    P521,
}

const SECP224R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.33");
const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

impl NamedCurve {
    pub const ALL: [NamedCurve; 4] = [
        NamedCurve::P224,
        NamedCurve::P256,
        NamedCurve::P384,
        NamedCurve::P521,
    ];

    /// The canonical JWK `crv` value.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            NamedCurve::P224 => "P-224",
            NamedCurve::P256 => "P-256",
            NamedCurve::P384 => "P-384",
            NamedCurve::P521 => "P-521",
        }
    }

    /// Size in bytes of one affine coordinate.
    #[must_use]
    pub fn coordinate_len(self) -> usize {
        match self {
            NamedCurve::P224 => 28,
            NamedCurve::P256 => 32,
            NamedCurve::P384 => 48,
            NamedCurve::P521 => 66,
        }
    }

    /// The `namedCurve` object identifier used in X.509 `SubjectPublicKeyInfo`.
    #[must_use]
    pub fn oid(self) -> ObjectIdentifier {
        match self {
            NamedCurve::P224 => SECP224R1,
            NamedCurve::P256 => SECP256R1,
            NamedCurve::P384 => SECP384R1,
            NamedCurve::P521 => SECP521R1,
        }
    }

    #[must_use]
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        Self::ALL.into_iter().find(|curve| curve.oid() == *oid)
    }
}

impl fmt::Display for NamedCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolves a JWK `crv` value to a supported curve.
///
/// Returns `None` for unknown or empty names; whether that is fatal is up to
/// the caller. There is no aliasing, so `"p-256"` and `"P256"` are unknown.
#[must_use]
pub fn resolve_curve(name: &str) -> Option<NamedCurve> {
    NamedCurve::ALL
        .into_iter()
        .find(|curve| curve.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_canonical_names() {
        assert_eq!(resolve_curve("P-224"), Some(NamedCurve::P224));
        assert_eq!(resolve_curve("P-256"), Some(NamedCurve::P256));
        assert_eq!(resolve_curve("P-384"), Some(NamedCurve::P384));
        assert_eq!(resolve_curve("P-521"), Some(NamedCurve::P521));
    }

    #[test]
    fn test_rejects_non_exact_names() {
        for name in [
            "",
            "p-256",
            "P256",
            "P-256 ",
            " P-256",
            "secp256r1",
            "P-512",
            "Ed25519",
        ] {
            assert_eq!(resolve_curve(name), None, "'{}' should not resolve", name);
        }
    }

    #[test]
    fn test_name_round_trips_through_registry() {
        for curve in NamedCurve::ALL {
            assert_eq!(resolve_curve(curve.name()), Some(curve));
            assert_eq!(curve.to_string(), curve.name());
        }
    }

    #[test]
    fn test_oid_lookup() {
        assert_eq!(
            NamedCurve::from_oid(&ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7")),
            Some(NamedCurve::P256)
        );
        assert_eq!(
            NamedCurve::from_oid(&ObjectIdentifier::new_unwrap("1.3.132.0.10")),
            None
        );
    }
}
