//! # JsonWebKey2020 key pairs with detached JWS
//!
//! This crate implements the `JsonWebKey2020` verification method used by
//! linked-data proofs: an asymmetric key pair described by JWKs, identified
//! by its [RFC 7638](https://datatracker.ietf.org/doc/html/rfc7638)
//! thumbprint, and able to sign and verify arbitrary bytes as a detached
//! JWS with an unencoded payload
//! ([RFC 7797](https://datatracker.ietf.org/doc/html/rfc7797)).
//!
//! ## Quick Start
//!
//! ```rust
//! use jws2020_keypair::{KeyPair, KeyPairOptions};
//!
//! // Generate an Ed25519 key pair controlled by a DID
//! let key = KeyPair::generate(
//!     "OKP",
//!     Some("Ed25519"),
//!     KeyPairOptions {
//!         controller: Some("did:example:123".to_string()),
//!         ..Default::default()
//!     },
//! )?;
//!
//! // The identifier is controller#thumbprint
//! assert_eq!(key.id(), format!("did:example:123#{}", key.fingerprint()));
//!
//! // Sign and verify a payload
//! let jws = key.signer().sign(b"hello")?;
//! assert!(key.verifier().verify(b"hello", &jws)?);
//! assert!(!key.verifier().verify(b"hellO", &jws)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Algorithm Support
//!
//! The algorithm is never configured; it follows from the key:
//! - **EdDSA**: `OKP` / `Ed25519`
//! - **ES256**: `EC` / `P-256`
//! - **ES384**: `EC` / `P-384`
//! - **ES256K**: `EC` / `secp256k1`
//! - **PS256**: `RSA`
//!
//! ## Security Considerations
//!
//! - **Strict Header**: verification only accepts the exact protected header
//!   `{"alg":<key alg>,"b64":false,"crit":["b64"]}`.
//! - **Thumbprints**: always recomputed from key material; an embedded `kid`
//!   is ignored.
//! - **Constant-Time Comparison**: fingerprint checks use `subtle`.
//! - **Redaction**: private JWK members never appear in `Debug` output.

pub mod backend;
mod config;
mod error;
mod jwk;
pub mod jws;
mod key_pair;
mod thumbprint;

pub use backend::{KeyBackend, SoftwareBackend};
pub use config::{ConfigError, KeyPairOptions};
pub use error::{BackendError, JwsError, KeyError};
pub use jwk::{Algorithm, EcCurve, Jwk, JwkThumbprint, KeyKind, OkpCurve};
pub use jws::{sign_detached, verify_detached, DetachedJws};
pub use key_pair::{
    DetachedSigner, DetachedVerifier, FingerprintVerification, KeyPair, PublicKeyNode,
    JSON_WEB_KEY_2020,
};
pub use thumbprint::{canonical_json, compute_thumbprint};
