//! Public key text handling
//!
//! KMS hands public keys back as PEM (Google) or bare base64 DER (AWS). Both
//! are stored as a single base64 line; optionally the raw secp256k1 point is
//! pulled out of the SubjectPublicKeyInfo.

use base64::prelude::*;

use crate::error::{KmsError, Result};

const PEM_BEGIN: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_END: &str = "-----END PUBLIC KEY-----";

/// id-ecPublicKey (1.2.840.10045.2.1)
const OID_EC_PUBLIC_KEY: asn1::ObjectIdentifier = asn1::oid!(1, 2, 840, 10045, 2, 1);
/// secp256k1 (1.3.132.0.10)
const OID_SECP256K1: asn1::ObjectIdentifier = asn1::oid!(1, 3, 132, 0, 10);

/// Strip PEM delimiters and line breaks, leaving one base64 line.
///
/// Already-normalized input comes back unchanged.
pub fn normalize_public_key(pem: &str) -> String {
    let mut body = pem.trim();
    if let Some(rest) = body.strip_prefix(PEM_BEGIN) {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix(PEM_END) {
        body = rest;
    }
    body.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

/// Hex SEC1 point from a base64 SubjectPublicKeyInfo for a secp256k1 key
pub fn secp256k1_point_hex(spki_base64: &str) -> Result<String> {
    let der = BASE64_STANDARD
        .decode(spki_base64.trim())
        .map_err(|e| KmsError::InvalidPublicKey(format!("not base64: {e}")))?;
    let point = parse_spki_point(&der)?;
    Ok(hex::encode(point))
}

/// Walk SEQUENCE { SEQUENCE { OID, OID }, BIT STRING } as strict DER
fn parse_spki_point(der: &[u8]) -> Result<&[u8]> {
    let (key_type, curve, bits) = asn1::parse(der, |p| {
        p.read_element::<asn1::Sequence<'_>>()?.parse(|p| {
            let (key_type, curve) = p.read_element::<asn1::Sequence<'_>>()?.parse(|p| {
                let key_type = p.read_element::<asn1::ObjectIdentifier>()?;
                let curve = p.read_element::<asn1::ObjectIdentifier>()?;
                Ok::<_, asn1::ParseError>((key_type, curve))
            })?;
            let bits = p.read_element::<asn1::BitString<'_>>()?;
            Ok::<_, asn1::ParseError>((key_type, curve, bits))
        })
    })
    .map_err(|e| invalid(&format!("malformed SubjectPublicKeyInfo: {e:?}")))?;

    if key_type != OID_EC_PUBLIC_KEY {
        return Err(invalid("not an EC public key"));
    }
    if curve != OID_SECP256K1 {
        return Err(invalid("curve is not secp256k1"));
    }
    if bits.padding_bits() != 0 {
        return Err(invalid("BIT STRING has unused bits"));
    }

    let point = bits.as_bytes();
    match (point.len(), point.first()) {
        (65, Some(0x04)) | (33, Some(0x02 | 0x03)) => Ok(point),
        _ => Err(invalid("malformed SEC1 point")),
    }
}

fn invalid(reason: &str) -> KmsError {
    KmsError::InvalidPublicKey(reason.to_string())
}
