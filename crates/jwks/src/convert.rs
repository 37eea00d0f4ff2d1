//! Conversion between JWK records, X.509 certificates and public keys.
//!
//! [`certificate_to_key`] derives a signature-verification [`Key`] from a
//! certificate's RSA or EC public key. [`key_to_public_key`] goes the other
//! way and builds a usable [`PublicKey`] from a parsed record. Private members
//! of a record are never read.

use const_oid::ObjectIdentifier;
use error_stack::{Report, ResultExt};
use p256::elliptic_curve::{
    sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint},
    AffinePoint, CurveArithmetic, FieldBytesSize,
};
use rsa::{pkcs1::RsaPublicKey as Pkcs1PublicKey, BigUint, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use x509_cert::{
    der::{referenced::OwnedToRef, Decode, Encode},
    Certificate,
};

use crate::curve::{resolve_curve, NamedCurve};
use crate::encoding::{self, decode_field, encode_exponent, encode_uint, strip_leading_zeros};
use crate::error::JwksError;
use crate::key::{Key, KeyMaterial, KEY_TYPE_EC, KEY_TYPE_RSA, USE_SIGNATURE};
use crate::settings::ConversionSettings;

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// Largest RSA modulus accepted from a key record.
pub const MAX_RSA_MODULUS_BITS: usize = 8192;

/// Operations granted to keys derived from certificates.
pub const CERTIFICATE_KEY_OPERATIONS: [&str; 2] = ["sign", "verify"];

/// A public key built from a JWK record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    Ec(EcPublicKey),
}

impl PublicKey {
    /// The JWK `kty` this key converts from.
    #[must_use]
    pub fn key_type(&self) -> &'static str {
        match self {
            PublicKey::Rsa(_) => KEY_TYPE_RSA,
            PublicKey::Ec(_) => KEY_TYPE_EC,
        }
    }

    #[must_use]
    pub fn as_rsa(&self) -> Option<&RsaPublicKey> {
        match self {
            PublicKey::Rsa(key) => Some(key),
            PublicKey::Ec(_) => None,
        }
    }

    #[must_use]
    pub fn as_ec(&self) -> Option<&EcPublicKey> {
        match self {
            PublicKey::Ec(key) => Some(key),
            PublicKey::Rsa(_) => None,
        }
    }
}

/// An elliptic-curve public key on one of the registry curves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcPublicKey {
    P224(p224::PublicKey),
    P256(p256::PublicKey),
    P384(p384::PublicKey),
    P521(p521::PublicKey),
}

impl EcPublicKey {
    #[must_use]
    pub fn curve(&self) -> NamedCurve {
        match self {
            EcPublicKey::P224(_) => NamedCurve::P224,
            EcPublicKey::P256(_) => NamedCurve::P256,
            EcPublicKey::P384(_) => NamedCurve::P384,
            EcPublicKey::P521(_) => NamedCurve::P521,
        }
    }

    /// Affine `(x, y)` coordinates as fixed-width big-endian bytes.
    #[must_use]
    pub fn coordinates(&self) -> (Vec<u8>, Vec<u8>) {
        match self {
            EcPublicKey::P224(key) => affine_coordinates(key),
            EcPublicKey::P256(key) => affine_coordinates(key),
            EcPublicKey::P384(key) => affine_coordinates(key),
            EcPublicKey::P521(key) => affine_coordinates(key),
        }
    }

    /// Parses a SEC1 encoded point (compressed or uncompressed).
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::InvalidKey`] if the bytes are not a point on `curve`.
    pub fn from_sec1(curve: NamedCurve, bytes: &[u8]) -> Result<Self, Report<JwksError>> {
        let key = match curve {
            NamedCurve::P224 => parse_sec1(bytes).map(EcPublicKey::P224),
            NamedCurve::P256 => parse_sec1(bytes).map(EcPublicKey::P256),
            NamedCurve::P384 => parse_sec1(bytes).map(EcPublicKey::P384),
            NamedCurve::P521 => parse_sec1(bytes).map(EcPublicKey::P521),
        };
        key.attach(format!("while reading a {} point", curve))
    }

    /// Builds a key from big-endian affine coordinates of any length up to the
    /// curve's field size. Shorter values are left-padded with zeros.
    ///
    /// # Errors
    ///
    /// Returns [`JwksError::InvalidKey`] if a coordinate is wider than the
    /// field or the point is not on the curve.
    pub fn from_coordinates(
        curve: NamedCurve,
        x: &[u8],
        y: &[u8],
    ) -> Result<Self, Report<JwksError>> {
        let len = curve.coordinate_len();
        let mut sec1 = Vec::with_capacity(1 + 2 * len);
        sec1.push(0x04);
        for (name, coordinate) in [("x", x), ("y", y)] {
            let stripped = strip_leading_zeros(coordinate);
            let Some(padded) = encoding::left_pad(stripped, len) else {
                return Err(Report::new(JwksError::invalid_key(format!(
                    "coordinate '{}' is wider than {} bytes for {}",
                    name, len, curve
                ))));
            };
            sec1.extend_from_slice(&padded);
        }
        Self::from_sec1(curve, &sec1)
    }
}

fn parse_sec1<C>(bytes: &[u8]) -> Result<p256::elliptic_curve::PublicKey<C>, Report<JwksError>>
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    p256::elliptic_curve::PublicKey::<C>::from_sec1_bytes(bytes)
        .map_err(|_| Report::new(JwksError::invalid_key("point is not on the curve")))
}

fn affine_coordinates<C>(key: &p256::elliptic_curve::PublicKey<C>) -> (Vec<u8>, Vec<u8>)
where
    C: CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    // A public key is never the identity, so both coordinates are present.
    let point = key.to_encoded_point(false);
    let x = point.x().map(|x| x.to_vec()).unwrap_or_default();
    let y = point.y().map(|y| y.to_vec()).unwrap_or_default();
    (x, y)
}

/// Derives a JWK record from a certificate using the default settings.
///
/// See [`certificate_to_key_with`].
///
/// # Errors
///
/// Same as [`certificate_to_key_with`].
pub fn certificate_to_key(
    key_id: Option<&str>,
    certificate: &Certificate,
    chain: &[Certificate],
) -> Result<Key, Report<JwksError>> {
    certificate_to_key_with(&ConversionSettings::default(), key_id, certificate, chain)
}

/// Derives a signature-verification JWK record from a certificate.
///
/// `x5t` and `x5t#S256` are the hex SHA-1 and SHA-256 digests of the
/// certificate's DER encoding. Without a (non-empty) `key_id` the SHA-1 digest
/// becomes the `kid`. `chain` is base64url-encoded into `x5c` in the order given.
///
/// # Errors
///
/// Returns [`JwksError::UnsupportedKeyType`] if the public key is neither RSA
/// nor EC, [`JwksError::UnsupportedCurve`] for an EC key outside the registry,
/// and [`JwksError::Certificate`] if the certificate cannot be encoded or its
/// public key cannot be read.
pub fn certificate_to_key_with(
    settings: &ConversionSettings,
    key_id: Option<&str>,
    certificate: &Certificate,
    chain: &[Certificate],
) -> Result<Key, Report<JwksError>> {
    let der = encode_certificate(certificate)?;
    let thumbprint = hex::encode(Sha1::digest(&der));
    let thumbprint_sha256 = hex::encode(Sha256::digest(&der));

    let key_id = match key_id {
        Some(kid) if !kid.is_empty() => kid.to_string(),
        _ => thumbprint.clone(),
    };

    let x509_chain = chain
        .iter()
        .enumerate()
        .map(|(index, cert)| {
            encode_certificate(cert)
                .map(|der| encoding::encode(&der))
                .attach(format!("while encoding chain certificate {}", index))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut key = Key {
        key_operations: Some(Vec::from(CERTIFICATE_KEY_OPERATIONS.map(String::from))),
        key_use: Some(USE_SIGNATURE.to_string()),
        key_id: Some(key_id),
        x509_thumbprint: Some(thumbprint),
        x509_thumbprint_sha256: Some(thumbprint_sha256),
        x509_chain: (!x509_chain.is_empty()).then_some(x509_chain),
        ..Default::default()
    };

    let spki = certificate
        .tbs_certificate
        .subject_public_key_info
        .owned_to_ref();
    let algorithm = spki.algorithm.oid;

    if algorithm == RSA_ENCRYPTION {
        let rsa = Pkcs1PublicKey::from_der(spki.subject_public_key.raw_bytes()).map_err(|e| {
            Report::new(JwksError::Certificate {
                message: format!("Failed to read RSA public key: {}", e),
            })
        })?;
        key.key_type = Some(KEY_TYPE_RSA.to_string());
        let exponent = rsa.public_exponent.as_bytes();
        key.n = Some(encode_uint(rsa.modulus.as_bytes()));
        key.e = Some(encode_exponent(exponent, settings.exponent_encoding)?);
    } else if algorithm == ID_EC_PUBLIC_KEY {
        let curve_oid = spki.algorithm.parameters_oid().map_err(|e| {
            Report::new(JwksError::Certificate {
                message: format!("EC public key has no named curve: {}", e),
            })
        })?;
        let curve = NamedCurve::from_oid(&curve_oid).ok_or_else(|| {
            Report::new(JwksError::UnsupportedCurve {
                name: curve_oid.to_string(),
            })
        })?;
        let ec = EcPublicKey::from_sec1(curve, spki.subject_public_key.raw_bytes())?;
        let (x, y) = ec.coordinates();
        key.key_type = Some(KEY_TYPE_EC.to_string());
        key.curve = Some(curve.name().to_string());
        key.x = Some(encode_uint(&x));
        key.y = Some(encode_uint(&y));
    } else {
        return Err(Report::new(JwksError::UnsupportedKeyType {
            kty: algorithm.to_string(),
        }));
    }

    log::debug!(
        "Derived {} key '{}' from certificate",
        key.kty(),
        key.key_id.as_deref().unwrap_or_default()
    );
    Ok(key)
}

fn encode_certificate(certificate: &Certificate) -> Result<Vec<u8>, Report<JwksError>> {
    certificate.to_der().map_err(|e| {
        Report::new(JwksError::Certificate {
            message: format!("Failed to encode certificate: {}", e),
        })
    })
}

/// Builds the public key described by a JWK record.
///
/// Dispatches on `kty`: `RSA` reads `n`/`e`, `EC` reads `crv`/`x`/`y`. Every
/// other type, including `oct`, is rejected.
///
/// # Errors
///
/// Returns [`JwksError::UnsupportedKeyType`] for other key types,
/// [`JwksError::MissingParameter`] when a required member is absent,
/// [`JwksError::Decode`] when a member is not base64url,
/// [`JwksError::UnsupportedCurve`] when `crv` is not in the registry, and
/// [`JwksError::InvalidKey`] when the material does not form a valid key.
pub fn key_to_public_key(key: &Key) -> Result<PublicKey, Report<JwksError>> {
    let key_id = key.key_id.as_deref().unwrap_or_default();
    let public_key = match key.material() {
        KeyMaterial::Rsa { n, e } => rsa_public_key(n, e).map(PublicKey::Rsa),
        KeyMaterial::Ec { crv, x, y } => ec_public_key(crv, x, y).map(PublicKey::Ec),
        KeyMaterial::Symmetric { .. } | KeyMaterial::Other(_) => {
            Err(Report::new(JwksError::UnsupportedKeyType {
                kty: key.kty().to_string(),
            }))
        }
    };
    let public_key = public_key.attach(format!("while converting key '{}'", key_id))?;

    log::debug!(
        "Converted key '{}' to {} public key",
        key_id,
        public_key.key_type()
    );
    Ok(public_key)
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, Report<JwksError>> {
    value.ok_or_else(|| Report::new(JwksError::missing(field)))
}

fn rsa_public_key(n: Option<&str>, e: Option<&str>) -> Result<RsaPublicKey, Report<JwksError>> {
    let n = decode_field("n", required("n", n)?)?;
    let e = decode_field("e", required("e", e)?)?;

    let modulus = strip_leading_zeros(&n);
    if modulus.is_empty() {
        return Err(Report::new(JwksError::invalid_key("RSA modulus is zero")));
    }

    // The exponent must fit a signed 63-bit integer.
    let exponent = strip_leading_zeros(&e);
    if exponent.len() > 8 || (exponent.len() == 8 && exponent[0] & 0x80 != 0) {
        return Err(Report::new(JwksError::invalid_key(
            "RSA exponent does not fit in a signed 64-bit integer",
        )));
    }

    RsaPublicKey::new_with_max_size(
        BigUint::from_bytes_be(modulus),
        BigUint::from_bytes_be(exponent),
        MAX_RSA_MODULUS_BITS,
    )
    .map_err(|err| Report::new(JwksError::invalid_key(err.to_string())))
}

fn ec_public_key(
    crv: Option<&str>,
    x: Option<&str>,
    y: Option<&str>,
) -> Result<EcPublicKey, Report<JwksError>> {
    let x = decode_field("x", required("x", x)?)?;
    let y = decode_field("y", required("y", y)?)?;

    let name = required("crv", crv)?;
    let curve = resolve_curve(name).ok_or_else(|| {
        Report::new(JwksError::UnsupportedCurve {
            name: name.to_string(),
        })
    })?;

    EcPublicKey::from_coordinates(curve, &x, &y)
}
