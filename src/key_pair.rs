//! JsonWebKey2020 key pairs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::backend::{KeyBackend, SoftwareBackend};
use crate::config::KeyPairOptions;
use crate::error::{JwsError, KeyError};
use crate::jwk::{Algorithm, Jwk, JwkThumbprint, KeyKind};
use crate::jws;
use crate::thumbprint::{compute_thumbprint, constant_time_eq};

/// Verification method type used when none is configured
pub const JSON_WEB_KEY_2020: &str = "JsonWebKey2020";

/// An asymmetric key pair bound to a linked-data verification method
///
/// The pair is immutable once built. The algorithm is always derived from
/// the public key's `kty`/`crv`, and the identifier defaults to
/// `controller#thumbprint`.
///
/// # Example
///
/// ```rust
/// use jws2020_keypair::{KeyPair, KeyPairOptions};
///
/// let key = KeyPair::generate(
///     "OKP",
///     Some("Ed25519"),
///     KeyPairOptions {
///         controller: Some("did:example:123".to_string()),
///         ..Default::default()
///     },
/// )?;
///
/// let jws = key.signer().sign(b"hello")?;
/// assert!(key.verifier().verify(b"hello", &jws)?);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct KeyPair {
    id: String,
    key_type: String,
    controller: Option<String>,
    public_key_jwk: Jwk,
    private_key_jwk: Option<Jwk>,
    algorithm: Algorithm,
    thumbprint: JwkThumbprint,
    backend: Arc<dyn KeyBackend>,
}

impl KeyPair {
    /// Build a key pair backed by [`SoftwareBackend`]
    pub fn new(options: KeyPairOptions) -> Result<Self, KeyError> {
        Self::with_backend(options, Arc::new(SoftwareBackend::new()))
    }

    /// Build a key pair from a deserialized options document
    pub fn from_options(options: KeyPairOptions) -> Result<Self, KeyError> {
        Self::new(options)
    }

    /// Build a key pair that signs and verifies through `backend`
    ///
    /// Any `alg` in `options` is rejected, including an empty string.
    pub fn with_backend(
        options: KeyPairOptions,
        backend: Arc<dyn KeyBackend>,
    ) -> Result<Self, KeyError> {
        if options.alg.is_some() {
            return Err(KeyError::DeprecatedConfiguration);
        }

        let public_key_jwk = match (options.public_key_jwk, &options.private_key_jwk) {
            (Some(public), _) => public,
            (None, Some(private)) => private.to_public(),
            (None, None) => return Err(KeyError::NoPublicKey),
        };
        if public_key_jwk.is_empty() {
            return Err(KeyError::NoPublicKey);
        }
        if public_key_jwk.is_private() {
            return Err(KeyError::InvalidKeyMaterial(
                "public key material contains private members".to_string(),
            ));
        }

        let kind = public_key_jwk.kind()?;
        let thumbprint = compute_thumbprint(&public_key_jwk)?;

        if let Some(private) = &options.private_key_jwk {
            check_private_matches(private, kind, &thumbprint)?;
        }

        let id = options.id.unwrap_or_else(|| {
            format!(
                "{}#{}",
                options.controller.as_deref().unwrap_or(""),
                thumbprint
            )
        });

        let key = Self {
            id,
            key_type: options
                .key_type
                .unwrap_or_else(|| JSON_WEB_KEY_2020.to_string()),
            controller: options.controller,
            public_key_jwk,
            private_key_jwk: options.private_key_jwk,
            algorithm: kind.algorithm(),
            thumbprint,
            backend,
        };

        tracing::debug!(
            kid = %key.id,
            alg = %key.algorithm,
            verify_only = key.private_key_jwk.is_none(),
            "Constructed key pair"
        );

        Ok(key)
    }

    /// Generate a fresh key pair with [`SoftwareBackend`]
    ///
    /// `kty` and `crv` select the key kind (`crv` is ignored for RSA).
    pub fn generate(
        kty: &str,
        crv: Option<&str>,
        options: KeyPairOptions,
    ) -> Result<Self, KeyError> {
        Self::generate_with_backend(Arc::new(SoftwareBackend::new()), kty, crv, options)
    }

    /// Generate a fresh key pair through `backend`
    ///
    /// Generated material replaces any key material present in `options`;
    /// identifier, type and controller are taken from `options` as usual.
    pub fn generate_with_backend(
        backend: Arc<dyn KeyBackend>,
        kty: &str,
        crv: Option<&str>,
        mut options: KeyPairOptions,
    ) -> Result<Self, KeyError> {
        let kind = KeyKind::from_parts(kty, crv)?;

        if options.public_key_jwk.is_some() || options.private_key_jwk.is_some() {
            tracing::warn!(%kind, "Ignoring supplied key material while generating a key pair");
        }

        let private = backend.generate(kind)?;
        options.public_key_jwk = Some(private.to_public());
        options.private_key_jwk = Some(private);

        Self::with_backend(options, backend)
    }

    /// Key identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Verification method type
    pub fn key_type(&self) -> &str {
        &self.key_type
    }

    /// Entity controlling the key
    pub fn controller(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    /// The JWK encoded public key
    pub fn public_key(&self) -> &Jwk {
        &self.public_key_jwk
    }

    /// The JWK encoded private key, if this pair can sign
    pub fn private_key(&self) -> Option<&Jwk> {
        self.private_key_jwk.as_ref()
    }

    /// JWS algorithm derived from the public key
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The backend signing and verification are delegated to
    pub fn backend(&self) -> &dyn KeyBackend {
        self.backend.as_ref()
    }

    /// RFC 7638 thumbprint of the public key
    pub fn fingerprint(&self) -> &JwkThumbprint {
        &self.thumbprint
    }

    /// RFC 7638 thumbprint of an arbitrary public JWK
    ///
    /// Any `kid` on the JWK is ignored; the thumbprint is always recomputed
    /// from the key material.
    pub fn fingerprint_from_public_key(public_key_jwk: &Jwk) -> Result<JwkThumbprint, KeyError> {
        compute_thumbprint(public_key_jwk)
    }

    /// Check whether `fingerprint` was derived from this key pair's public key
    ///
    /// Uses constant-time comparison. Never fails; the outcome and any
    /// reason for rejection are carried in the returned value.
    pub fn verify_fingerprint(&self, fingerprint: &str) -> FingerprintVerification {
        if fingerprint.is_empty() {
            return FingerprintVerification::invalid("fingerprint is empty");
        }
        if !constant_time_eq(fingerprint, self.thumbprint.as_str()) {
            return FingerprintVerification::invalid(
                "fingerprint does not match the public key",
            );
        }
        FingerprintVerification {
            valid: true,
            error: None,
        }
    }

    /// A signer bound to this key pair
    ///
    /// A verify-only pair still yields a signer; its `sign` fails with
    /// [`JwsError::NoPrivateKey`].
    pub fn signer(&self) -> DetachedSigner<'_> {
        DetachedSigner { key: self }
    }

    /// A verifier bound to this key pair
    pub fn verifier(&self) -> DetachedVerifier<'_> {
        DetachedVerifier { key: self }
    }

    /// Attach this key's `publicKeyJwk` to a public key node
    pub fn add_encoded_public_key(&self, mut node: Map<String, Value>) -> Map<String, Value> {
        node.insert(
            "publicKeyJwk".to_string(),
            Value::from(self.public_key_jwk.clone()),
        );
        node
    }

    /// The public key node used in verification methods
    pub fn public_node(&self) -> PublicKeyNode {
        self.build_public_node(self.controller.clone())
    }

    /// The public key node, naming `controller` instead of the pair's own
    pub fn public_node_for(&self, controller: &str) -> PublicKeyNode {
        self.build_public_node(Some(controller.to_string()))
    }

    fn build_public_node(&self, controller: Option<String>) -> PublicKeyNode {
        PublicKeyNode {
            id: self.id.clone(),
            key_type: self.key_type.clone(),
            controller: controller.filter(|c| !c.is_empty()),
            public_key_jwk: self.public_key_jwk.clone(),
        }
    }
}

/// Ensure the private JWK is the same key as the public JWK
fn check_private_matches(
    private: &Jwk,
    kind: KeyKind,
    thumbprint: &JwkThumbprint,
) -> Result<(), KeyError> {
    if !private.is_private() {
        return Err(KeyError::InvalidKeyMaterial(
            "private key material has no private members".to_string(),
        ));
    }
    if private.kind()? != kind {
        return Err(KeyError::InvalidKeyMaterial(
            "private and public key types differ".to_string(),
        ));
    }
    if compute_thumbprint(private)? != *thumbprint {
        return Err(KeyError::InvalidKeyMaterial(
            "private and public key material do not match".to_string(),
        ));
    }
    Ok(())
}

impl TryFrom<KeyPairOptions> for KeyPair {
    type Error = KeyError;

    fn try_from(options: KeyPairOptions) -> Result<Self, Self::Error> {
        Self::from_options(options)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("id", &self.id)
            .field("key_type", &self.key_type)
            .field("controller", &self.controller)
            .field("public_key_jwk", &self.public_key_jwk)
            .field("has_private_key", &self.private_key_jwk.is_some())
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

/// Signs payloads with a key pair's private JWK
#[derive(Debug, Clone, Copy)]
pub struct DetachedSigner<'a> {
    key: &'a KeyPair,
}

impl DetachedSigner<'_> {
    /// Produce `<protected-header>..<signature>` over `data`
    pub fn sign(&self, data: &[u8]) -> Result<String, JwsError> {
        jws::sign_detached(self.key, data)
    }

    /// Algorithm written to the protected header
    pub fn algorithm(&self) -> Algorithm {
        self.key.algorithm()
    }
}

/// Verifies detached signatures with a key pair's public JWK
#[derive(Debug, Clone, Copy)]
pub struct DetachedVerifier<'a> {
    key: &'a KeyPair,
}

impl DetachedVerifier<'_> {
    /// Verify `signature` over `data`; see [`jws::verify_detached`]
    pub fn verify(&self, data: &[u8], signature: &str) -> Result<bool, JwsError> {
        jws::verify_detached(self.key, data, signature)
    }

    /// Algorithm a valid protected header must name
    pub fn algorithm(&self) -> Algorithm {
        self.key.algorithm()
    }
}

/// Public key node consumed by linked-data tooling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyNode {
    /// Key identifier
    pub id: String,
    /// Verification method type
    #[serde(rename = "type")]
    pub key_type: String,
    /// Controller, omitted when unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    /// Public key
    pub public_key_jwk: Jwk,
}

/// Outcome of [`KeyPair::verify_fingerprint`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintVerification {
    /// Whether the fingerprint belongs to the key pair
    pub valid: bool,
    /// Why the fingerprint was rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FingerprintVerification {
    fn invalid(reason: &str) -> Self {
        Self {
            valid: false,
            error: Some(reason.to_string()),
        }
    }
}
