//! Base64url big-integer encoding rules for JWK fields.
//!
//! `n`, `x` and `y` are written as minimal big-endian unsigned octets. The RSA
//! exponent is written through a fixed 4-byte big-endian container by default,
//! which keeps a leading zero byte for common exponents (65537 becomes
//! `AAEAAQ`). [`ExponentEncoding::Minimal`] selects the RFC 7518 form (`AQAB`).

use base64::{
    alphabet,
    engine::{general_purpose, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::error::JwksError;

/// URL-safe alphabet, unpadded output, padding tolerated on input.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Width of the exponent container used by [`ExponentEncoding::Fixed`].
const FIXED_EXPONENT_LEN: usize = 4;

/// How the RSA public exponent is serialized into `e`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExponentEncoding {
    /// Four big-endian bytes, leading zeros kept.
    #[default]
    Fixed,
    /// Minimal big-endian octets, no leading zero bytes.
    Minimal,
}

/// Encodes bytes as unpadded base64url.
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Encodes a big-endian unsigned integer using its minimal representation.
///
/// Zero has no octets and encodes to the empty string.
#[must_use]
pub fn encode_uint(be_bytes: &[u8]) -> String {
    encode(strip_leading_zeros(be_bytes))
}

/// Encodes an RSA public exponent.
///
/// # Errors
///
/// Returns [`JwksError::InvalidKey`] when `Fixed` is requested and the exponent
/// does not fit in four bytes.
pub fn encode_exponent(
    be_bytes: &[u8],
    encoding: ExponentEncoding,
) -> Result<String, Report<JwksError>> {
    match encoding {
        ExponentEncoding::Minimal => Ok(encode_uint(be_bytes)),
        ExponentEncoding::Fixed => {
            let exponent = strip_leading_zeros(be_bytes);
            let fixed = left_pad(exponent, FIXED_EXPONENT_LEN).ok_or_else(|| {
                Report::new(JwksError::invalid_key(
                    "RSA exponent does not fit in a 4-byte container",
                ))
            })?;
            Ok(encode(&fixed))
        }
    }
}

/// Decodes a base64url field into big-endian bytes.
///
/// # Errors
///
/// Returns [`JwksError::Decode`] naming `field` when `value` is not base64url.
pub fn decode_field(field: &str, value: &str) -> Result<Vec<u8>, Report<JwksError>> {
    URL_SAFE_LENIENT
        .decode(value)
        .map_err(|e| Report::new(JwksError::decode(field, e.to_string())))
}

/// Decodes one `x5c` entry.
///
/// Accepts base64url as well as standard base64, which several providers
/// publish despite RFC 7517 section 4.7.
///
/// # Errors
///
/// Returns [`JwksError::Decode`] when neither alphabet accepts the value.
pub fn decode_certificate(value: &str) -> Result<Vec<u8>, Report<JwksError>> {
    URL_SAFE_LENIENT
        .decode(value)
        .or_else(|_| general_purpose::STANDARD.decode(value))
        .map_err(|e| Report::new(JwksError::decode("x5c", e.to_string())))
}

#[must_use]
pub fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

/// Left-pads `bytes` with zeros to exactly `len` bytes.
///
/// Returns `None` if `bytes` is already longer than `len`.
#[must_use]
pub fn left_pad(bytes: &[u8], len: usize) -> Option<Vec<u8>> {
    let padding = len.checked_sub(bytes.len())?;
    let mut out = vec![0u8; padding];
    out.extend_from_slice(bytes);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uint_is_minimal() {
        assert_eq!(encode_uint(&[0x00, 0x00, 0x01, 0x00, 0x01]), "AQAB");
        assert_eq!(encode_uint(&[0x01, 0x00, 0x01]), "AQAB");
        assert_eq!(encode_uint(&[0x00]), "");
        assert_eq!(encode_uint(&[]), "");
    }

    #[test]
    fn test_fixed_exponent_keeps_leading_zero() {
        let e = encode_exponent(&[0x01, 0x00, 0x01], ExponentEncoding::Fixed)
            .expect("should encode 65537");
        assert_eq!(e, "AAEAAQ");

        let three = encode_exponent(&[0x03], ExponentEncoding::Fixed)
            .expect("should encode a single byte exponent");
        let decoded = decode_field("e", &three).expect("should decode");
        assert_eq!(decoded, vec![0, 0, 0, 3]);
    }

    #[test]
    fn test_minimal_exponent() {
        let e = encode_exponent(&[0x00, 0x01, 0x00, 0x01], ExponentEncoding::Minimal)
            .expect("should encode 65537");
        assert_eq!(e, "AQAB");
    }

    #[test]
    fn test_fixed_exponent_rejects_wide_values() {
        let wide = [0x01, 0x00, 0x00, 0x00, 0x01];
        let err = encode_exponent(&wide, ExponentEncoding::Fixed)
            .expect_err("five significant bytes should not fit");
        assert!(matches!(err.current_context(), JwksError::InvalidKey { .. }));

        // Leading zeros do not count against the container.
        let padded = [0x00, 0x00, 0x01, 0x00, 0x01];
        assert!(encode_exponent(&padded, ExponentEncoding::Fixed).is_ok());
    }

    #[test]
    fn test_decode_field_accepts_padding() {
        let unpadded = decode_field("x", "AQ").expect("should decode unpadded");
        let padded = decode_field("x", "AQ==").expect("should decode padded");

        assert_eq!(unpadded, vec![1]);
        assert_eq!(padded, unpadded);
        assert_eq!(decode_field("e", "AQAB").ok(), Some(vec![1, 0, 1]));
    }

    #[test]
    fn test_decode_field_rejects_non_base64url() {
        for value in ["not base64!", "AQ+B", "AQ/B", "A"] {
            let err = decode_field("n", value).expect_err("should reject");
            assert!(
                matches!(err.current_context(), JwksError::Decode { field, .. } if field == "n"),
                "unexpected error for '{}': {:?}",
                value,
                err
            );
        }
    }

    #[test]
    fn test_decode_certificate_accepts_both_alphabets() {
        assert_eq!(decode_certificate("-_8").ok(), Some(vec![0xfb, 0xff]));
        assert_eq!(decode_certificate("+/8=").ok(), Some(vec![0xfb, 0xff]));
        assert!(decode_certificate("***").is_err());
    }

    #[test]
    fn test_left_pad() {
        assert_eq!(left_pad(&[1, 2], 4), Some(vec![0, 0, 1, 2]));
        assert_eq!(left_pad(&[1, 2], 2), Some(vec![1, 2]));
        assert_eq!(left_pad(&[1, 2, 3], 2), None);
    }
}
