//! Error types for key pair construction and detached JWS operations

use thiserror::Error;

/// Errors raised while building a key pair or deriving its identifiers
#[derive(Debug, Error)]
pub enum KeyError {
    /// JWK members missing, malformed, or an unsupported kty/crv combination
    #[error("Invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Neither a public nor a private JWK was supplied
    #[error("No public key material supplied or derivable")]
    NoPublicKey,

    /// Caller tried to configure `alg` explicitly
    #[error("alg is no longer configurable; it is derived from the key type and curve")]
    DeprecatedConfiguration,

    /// Key generation failed in the backend
    #[error("Key backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Errors raised while producing or checking a detached JWS
///
/// A signature that simply does not verify is not an error; see
/// [`crate::jws::verify_detached`].
#[derive(Debug, Error)]
pub enum JwsError {
    /// Signing attempted with a verify-only key pair
    #[error("No private key to sign with")]
    NoPrivateKey,

    /// Signature string is not `<header>..<signature>`
    #[error("Malformed detached JWS (expected <header>..<signature>)")]
    MalformedSignature,

    /// Protected header failed to decode, parse or pass the shape check
    #[error("Invalid JWS header: {0}")]
    InvalidHeader(String),

    /// Header `alg` disagrees with the key's algorithm
    #[error("Invalid JWS header, alg mismatch (expected={expected}, actual={actual})")]
    AlgorithmMismatch {
        /// Algorithm derived from the key pair
        expected: String,
        /// Algorithm found in the protected header
        actual: String,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Signing failed in the backend
    #[error("Key backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Errors reported by a [`crate::backend::KeyBackend`]
#[derive(Debug, Error)]
pub enum BackendError {
    /// JWK could not be turned into usable key material
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Algorithm cannot be used with the given key
    #[error("Algorithm {alg} is not usable with {kind} keys")]
    AlgorithmKeyMismatch {
        /// Requested algorithm
        alg: String,
        /// Key kind the JWK describes
        kind: String,
    },

    /// Signature bytes have the wrong shape for the algorithm
    #[error("Invalid signature encoding")]
    InvalidSignatureEncoding,

    /// Signature did not verify
    #[error("Invalid signature")]
    InvalidSignature,

    /// Key generation or signing failed
    #[error("Crypto error: {0}")]
    Crypto(String),
}
