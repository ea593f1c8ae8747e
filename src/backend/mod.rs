//! Cryptographic backends for key generation, signing and verification
//!
//! This module provides:
//! - The [`KeyBackend`] trait the key pair and JWS codec call into
//! - [`SoftwareBackend`], an in-memory implementation on RustCrypto

mod software;

pub use software::{SoftwareBackend, DEFAULT_RSA_BITS};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{Map, Value};

use crate::error::BackendError;
use crate::jwk::{Algorithm, Jwk, KeyKind};

/// Trait for the asymmetric primitives behind a key pair
///
/// This abstraction allows for different key storage backends:
/// - SoftwareBackend: JWK key material held in memory
/// - Test doubles returning fixed signatures
/// - Hardware tokens or remote signers
///
/// Implementations receive JWKs and raw bytes only; JWS framing and
/// thumbprints stay in this crate.
pub trait KeyBackend: Send + Sync {
    /// Generate a fresh private JWK (including its public members)
    fn generate(&self, kind: KeyKind) -> Result<Jwk, BackendError>;

    /// Sign `data` with a private JWK
    fn sign(&self, private_jwk: &Jwk, alg: Algorithm, data: &[u8])
        -> Result<Vec<u8>, BackendError>;

    /// Verify `signature` over `data` with a public JWK
    fn verify(
        &self,
        public_jwk: &Jwk,
        alg: Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), BackendError>;
}

/// Resolve the JWK's kind and check that `alg` is the one it maps to
pub(crate) fn kind_for(jwk: &Jwk, alg: Algorithm) -> Result<KeyKind, BackendError> {
    let kind = jwk
        .kind()
        .map_err(|e| BackendError::InvalidKey(e.to_string()))?;
    if kind.algorithm() != alg {
        return Err(BackendError::AlgorithmKeyMismatch {
            alg: alg.to_string(),
            kind: kind.to_string(),
        });
    }
    Ok(kind)
}

/// Decode a base64url JWK member
pub(crate) fn decode_member(jwk: &Jwk, member: &str) -> Result<Vec<u8>, BackendError> {
    let encoded = jwk
        .get_str(member)
        .ok_or_else(|| BackendError::InvalidKey(format!("missing member {}", member)))?;
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| BackendError::InvalidKey(format!("member {} is not base64url", member)))
}

/// Decode a base64url JWK member that must be exactly `N` bytes
pub(crate) fn decode_array<const N: usize>(
    jwk: &Jwk,
    member: &str,
) -> Result<[u8; N], BackendError> {
    let bytes = decode_member(jwk, member)?;
    <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
        BackendError::InvalidKey(format!(
            "member {} must be {} bytes, got {}",
            member,
            N,
            bytes.len()
        ))
    })
}

/// Build a JWK from string members, base64url values already encoded
pub(crate) fn jwk_from_members(members: &[(&str, String)]) -> Jwk {
    let mut map = Map::new();
    for (name, value) in members {
        map.insert((*name).to_string(), Value::String(value.clone()));
    }
    Jwk::from_map(map)
}

/// base64url without padding
pub(crate) fn encode(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}
