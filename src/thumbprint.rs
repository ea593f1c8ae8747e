//! JWK Thumbprint computation (RFC 7638)

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use subtle::ConstantTimeEq;

use crate::error::KeyError;
use crate::jwk::{Jwk, JwkThumbprint};

/// Compute the JWK thumbprint per RFC 7638
///
/// Only the required members for the key's `kty` are hashed, so `kid`,
/// `use`, `alg` and private members never influence the result. For an
/// Ed25519 key the hashed JSON is `{"crv":"Ed25519","kty":"OKP","x":"..."}`.
pub fn compute_thumbprint(jwk: &Jwk) -> Result<JwkThumbprint, KeyError> {
    let canonical = canonical_json(jwk)?;
    let hash = Sha256::digest(canonical.as_bytes());
    Ok(JwkThumbprint::new(URL_SAFE_NO_PAD.encode(hash)))
}

/// The canonical JSON that [`compute_thumbprint`] hashes
pub fn canonical_json(jwk: &Jwk) -> Result<String, KeyError> {
    let kind = jwk.kind()?;

    // RFC 7638: Members MUST be in lexicographic order, no whitespace.
    // BTreeMap orders by UTF-8 bytes, which matches code point order.
    let mut members = BTreeMap::new();
    for &member in kind.thumbprint_members() {
        let value = jwk.get_str(member).ok_or_else(|| {
            KeyError::InvalidKeyMaterial(format!("{} key is missing member {}", kind, member))
        })?;
        if value.is_empty() {
            return Err(KeyError::InvalidKeyMaterial(format!(
                "{} key has an empty {} member",
                kind, member
            )));
        }
        members.insert(member, value);
    }

    serde_json::to_string(&members).map_err(|e| KeyError::InvalidKeyMaterial(e.to_string()))
}

/// Constant-time string comparison for cryptographic values
pub(crate) fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
