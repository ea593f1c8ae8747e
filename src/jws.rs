//! Detached JWS with unencoded payload (RFC 7515 + RFC 7797)
//!
//! Signatures have the shape `<protected-header>..<signature>`: the payload
//! segment is elided and the signing input is the ASCII header followed by
//! `.` and the raw payload bytes, as the `b64: false` profile requires.
//!
//! Verification is strict about the header: it must be exactly
//! `{"alg":<key alg>,"b64":false,"crit":["b64"]}`. A header that fails this
//! check is an error; a signature that simply does not verify is `Ok(false)`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::JwsError;
use crate::jwk::Algorithm;
use crate::key_pair::KeyPair;

/// Separator between protected header and signature (the payload is elided)
pub const DETACHED_SEPARATOR: &str = "..";

/// The only critical header extension this profile understands
const B64_PARAM: &str = "b64";

/// Protected header members, in serialization order
const HEADER_MEMBERS: [&str; 3] = ["alg", "b64", "crit"];

#[derive(Serialize)]
struct ProtectedHeader<'a> {
    alg: &'a str,
    b64: bool,
    crit: [&'a str; 1],
}

/// A detached JWS split into its two encoded segments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetachedJws<'a> {
    /// base64url protected header
    pub protected: &'a str,
    /// base64url signature
    pub signature: &'a str,
}

impl<'a> DetachedJws<'a> {
    /// Split `<header>..<signature>`; anything else is malformed
    pub fn parse(jws: &'a str) -> Result<Self, JwsError> {
        let mut parts = jws.split(DETACHED_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(protected), Some(signature), None) => Ok(Self {
                protected,
                signature,
            }),
            _ => Err(JwsError::MalformedSignature),
        }
    }
}

/// Encode the protected header for `alg`
///
/// Produces `base64url({"alg":<alg>,"b64":false,"crit":["b64"]})`.
pub fn encode_protected_header(alg: Algorithm) -> Result<String, JwsError> {
    let header = ProtectedHeader {
        alg: alg.as_str(),
        b64: false,
        crit: [B64_PARAM],
    };
    Ok(URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?))
}

/// Decode a protected header segment into its JSON object
pub fn decode_protected_header(encoded: &str) -> Result<Map<String, Value>, JwsError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| JwsError::InvalidHeader("header is not base64url".to_string()))?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(header)) => Ok(header),
        Ok(_) => Err(JwsError::InvalidHeader(
            "header is not a JSON object".to_string(),
        )),
        Err(e) => Err(JwsError::InvalidHeader(format!(
            "could not parse JWS header; {}",
            e
        ))),
    }
}

/// Check the header is exactly `{alg, b64: false, crit: ["b64"]}` for `alg`
pub fn validate_header(header: &Map<String, Value>, alg: Algorithm) -> Result<(), JwsError> {
    let header_alg = header
        .get("alg")
        .and_then(Value::as_str)
        .ok_or_else(|| JwsError::InvalidHeader("missing alg".to_string()))?;

    if header_alg != alg.as_str() {
        return Err(JwsError::AlgorithmMismatch {
            expected: alg.to_string(),
            actual: header_alg.to_string(),
        });
    }

    if header.get("b64") != Some(&Value::Bool(false)) {
        return Err(JwsError::InvalidHeader("b64 must be false".to_string()));
    }

    let crit_is_b64 = match header.get("crit") {
        Some(Value::Array(crit)) => crit.len() == 1 && crit[0] == B64_PARAM,
        _ => false,
    };
    if !crit_is_b64 {
        return Err(JwsError::InvalidHeader(
            "crit must be [\"b64\"]".to_string(),
        ));
    }

    if let Some(extra) = header
        .keys()
        .find(|name| !HEADER_MEMBERS.contains(&name.as_str()))
    {
        return Err(JwsError::InvalidHeader(format!(
            "unexpected header parameter {}",
            extra
        )));
    }

    Ok(())
}

/// `ASCII(protected) || "." || payload`
fn signing_input(protected: &str, payload: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(protected.len() + 1 + payload.len());
    input.extend_from_slice(protected.as_bytes());
    input.push(b'.');
    input.extend_from_slice(payload);
    input
}

/// Sign `payload` with the key pair's private JWK
///
/// # Returns
///
/// `<protected-header>..<signature>`, both segments base64url without padding.
pub fn sign_detached(key: &KeyPair, payload: &[u8]) -> Result<String, JwsError> {
    let private_jwk = key.private_key().ok_or(JwsError::NoPrivateKey)?;
    let alg = key.algorithm();

    let protected = encode_protected_header(alg)?;
    let signature = key
        .backend()
        .sign(private_jwk, alg, &signing_input(&protected, payload))?;

    Ok(format!(
        "{}{}{}",
        protected,
        DETACHED_SEPARATOR,
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Verify a detached JWS over `payload` with the key pair's public JWK
///
/// Malformed signature strings and headers that are not exactly the
/// expected shape are errors. A signature segment that does not decode,
/// or that the backend rejects, gives `Ok(false)`.
pub fn verify_detached(key: &KeyPair, payload: &[u8], jws: &str) -> Result<bool, JwsError> {
    let detached = DetachedJws::parse(jws)?;
    let alg = key.algorithm();

    let header = decode_protected_header(detached.protected)?;
    validate_header(&header, alg)?;

    let signature = match URL_SAFE_NO_PAD.decode(detached.signature) {
        Ok(signature) => signature,
        Err(_) => {
            tracing::debug!(kid = %key.id(), "JWS signature segment is not base64url");
            return Ok(false);
        }
    };

    let input = signing_input(detached.protected, payload);
    match key
        .backend()
        .verify(key.public_key(), alg, &input, &signature)
    {
        Ok(()) => Ok(true),
        Err(error) => {
            tracing::debug!(kid = %key.id(), %alg, %error, "JWS signature did not verify");
            Ok(false)
        }
    }
}
