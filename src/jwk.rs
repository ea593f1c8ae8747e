//! JSON Web Key (JWK) types and the key-kind to algorithm table

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::KeyError;

/// Members that only ever appear in private JWKs (RFC 7518 Section 6)
const PRIVATE_MEMBERS: &[&str] = &["d", "p", "q", "dp", "dq", "qi", "oth", "k"];

/// A JSON Web Key as a JSON object
///
/// The object is kept as supplied so that members such as `kid` or `use`
/// survive serialization; canonical members are read through [`Jwk::kind`]
/// and [`crate::thumbprint::compute_thumbprint`].
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Jwk(Map<String, Value>);

impl Jwk {
    /// Wrap an existing JSON object
    pub fn from_map(members: Map<String, Value>) -> Self {
        Self(members)
    }

    /// Get a member as a string slice, if present and a string
    pub fn get_str(&self, member: &str) -> Option<&str> {
        self.0.get(member).and_then(Value::as_str)
    }

    /// Get a member as a raw JSON value
    pub fn get(&self, member: &str) -> Option<&Value> {
        self.0.get(member)
    }

    /// Whether the JWK has no members at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the JWK carries any private key member
    pub fn is_private(&self) -> bool {
        PRIVATE_MEMBERS.iter().any(|m| self.0.contains_key(*m))
    }

    /// The public half of this JWK (all private members removed)
    pub fn to_public(&self) -> Jwk {
        let mut members = self.0.clone();
        for member in PRIVATE_MEMBERS {
            members.remove(*member);
        }
        Jwk(members)
    }

    /// Resolve the supported key kind from `kty` and `crv`
    pub fn kind(&self) -> Result<KeyKind, KeyError> {
        let kty = self
            .get_str("kty")
            .ok_or_else(|| KeyError::InvalidKeyMaterial("missing kty".to_string()))?;
        KeyKind::from_parts(kty, self.get_str("crv"))
    }

    /// Consume the wrapper and return the JSON object
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl fmt::Debug for Jwk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.0 {
            if PRIVATE_MEMBERS.contains(&name.as_str()) {
                map.entry(name, &"<redacted>");
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

impl TryFrom<Value> for Jwk {
    type Error = KeyError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(members) => Ok(Self(members)),
            _ => Err(KeyError::InvalidKeyMaterial(
                "JWK must be a JSON object".to_string(),
            )),
        }
    }
}

impl From<Jwk> for Value {
    fn from(jwk: Jwk) -> Self {
        Value::Object(jwk.0)
    }
}

/// Elliptic curves usable with `kty: "EC"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EcCurve {
    /// NIST P-256
    P256,
    /// NIST P-384
    P384,
    /// SEC secp256k1
    Secp256k1,
}

impl EcCurve {
    /// JWK `crv` name
    pub fn name(self) -> &'static str {
        match self {
            EcCurve::P256 => "P-256",
            EcCurve::P384 => "P-384",
            EcCurve::Secp256k1 => "secp256k1",
        }
    }
}

/// Octet key pair curves usable with `kty: "OKP"` (RFC 8037)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OkpCurve {
    /// Ed25519 signing keys
    Ed25519,
}

impl OkpCurve {
    /// JWK `crv` name
    pub fn name(self) -> &'static str {
        match self {
            OkpCurve::Ed25519 => "Ed25519",
        }
    }
}

/// Every key shape this crate can sign and verify with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// `kty: "EC"`
    Ec(EcCurve),
    /// `kty: "OKP"`
    Okp(OkpCurve),
    /// `kty: "RSA"`
    Rsa,
}

impl KeyKind {
    /// Resolve a kind from JWK `kty` and optional `crv` values
    pub fn from_parts(kty: &str, crv: Option<&str>) -> Result<Self, KeyError> {
        match (kty, crv) {
            ("EC", Some("P-256")) => Ok(KeyKind::Ec(EcCurve::P256)),
            ("EC", Some("P-384")) => Ok(KeyKind::Ec(EcCurve::P384)),
            ("EC", Some("secp256k1")) => Ok(KeyKind::Ec(EcCurve::Secp256k1)),
            ("OKP", Some("Ed25519")) => Ok(KeyKind::Okp(OkpCurve::Ed25519)),
            ("RSA", _) => Ok(KeyKind::Rsa),
            (kty, crv) => Err(KeyError::InvalidKeyMaterial(format!(
                "unsupported key (kty={}, crv={})",
                kty,
                crv.unwrap_or("<none>")
            ))),
        }
    }

    /// JWK `kty` value
    pub fn kty(self) -> &'static str {
        match self {
            KeyKind::Ec(_) => "EC",
            KeyKind::Okp(_) => "OKP",
            KeyKind::Rsa => "RSA",
        }
    }

    /// JWK `crv` value, if the kind has one
    pub fn crv(self) -> Option<&'static str> {
        match self {
            KeyKind::Ec(curve) => Some(curve.name()),
            KeyKind::Okp(curve) => Some(curve.name()),
            KeyKind::Rsa => None,
        }
    }

    /// The single JWS algorithm used with this kind of key
    pub fn algorithm(self) -> Algorithm {
        match self {
            KeyKind::Okp(OkpCurve::Ed25519) => Algorithm::EdDsa,
            KeyKind::Ec(EcCurve::P256) => Algorithm::Es256,
            KeyKind::Ec(EcCurve::P384) => Algorithm::Es384,
            KeyKind::Ec(EcCurve::Secp256k1) => Algorithm::Es256K,
            KeyKind::Rsa => Algorithm::Ps256,
        }
    }

    /// Members hashed for the RFC 7638 thumbprint, already in lexicographic order
    pub fn thumbprint_members(self) -> &'static [&'static str] {
        match self {
            KeyKind::Ec(_) => &["crv", "kty", "x", "y"],
            KeyKind::Okp(_) => &["crv", "kty", "x"],
            KeyKind::Rsa => &["e", "kty", "n"],
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.crv() {
            Some(crv) => write!(f, "{}/{}", self.kty(), crv),
            None => f.write_str(self.kty()),
        }
    }
}

/// JWS `alg` values produced by [`KeyKind::algorithm`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Ed25519 (RFC 8037)
    EdDsa,
    /// ECDSA P-256 with SHA-256
    Es256,
    /// ECDSA P-384 with SHA-384
    Es384,
    /// ECDSA secp256k1 with SHA-256 (RFC 8812)
    Es256K,
    /// RSASSA-PSS with SHA-256 and MGF1 with SHA-256
    Ps256,
}

impl Algorithm {
    /// The `alg` header value
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::EdDsa => "EdDSA",
            Algorithm::Es256 => "ES256",
            Algorithm::Es384 => "ES384",
            Algorithm::Es256K => "ES256K",
            Algorithm::Ps256 => "PS256",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EdDSA" => Ok(Algorithm::EdDsa),
            "ES256" => Ok(Algorithm::Es256),
            "ES384" => Ok(Algorithm::Es384),
            "ES256K" => Ok(Algorithm::Es256K),
            "PS256" => Ok(Algorithm::Ps256),
            other => Err(KeyError::InvalidKeyMaterial(format!(
                "unsupported alg {}",
                other
            ))),
        }
    }
}

/// JWK Thumbprint (RFC 7638)
///
/// A thumbprint is a SHA-256 hash of the canonical JSON representation
/// of a JWK, providing a unique identifier for the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JwkThumbprint(String);

impl JwkThumbprint {
    /// Create a new thumbprint from a base64url-encoded string
    pub fn new(thumbprint: String) -> Self {
        Self(thumbprint)
    }

    /// Get the thumbprint as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JwkThumbprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JwkThumbprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jwk(value: Value) -> Jwk {
        Jwk::try_from(value).unwrap()
    }

    #[test]
    fn test_algorithm_table() {
        let cases = [
            ("OKP", Some("Ed25519"), "EdDSA"),
            ("EC", Some("P-256"), "ES256"),
            ("EC", Some("P-384"), "ES384"),
            ("EC", Some("secp256k1"), "ES256K"),
            ("RSA", None, "PS256"),
        ];

        for (kty, crv, alg) in cases {
            let kind = KeyKind::from_parts(kty, crv).unwrap();
            assert_eq!(kind.algorithm().as_str(), alg);
            assert_eq!(kind.kty(), kty);
            assert_eq!(kind.crv(), crv);
            assert_eq!(alg.parse::<Algorithm>().unwrap(), kind.algorithm());
        }
    }

    #[test]
    fn test_unknown_combinations_rejected() {
        for (kty, crv) in [
            ("OKP", Some("X25519")),
            ("OKP", None),
            ("EC", Some("P-521")),
            ("EC", None),
            ("oct", None),
        ] {
            assert!(matches!(
                KeyKind::from_parts(kty, crv),
                Err(KeyError::InvalidKeyMaterial(_))
            ));
        }
    }

    #[test]
    fn test_thumbprint_members_are_sorted() {
        for kind in [
            KeyKind::Ec(EcCurve::P256),
            KeyKind::Okp(OkpCurve::Ed25519),
            KeyKind::Rsa,
        ] {
            let members = kind.thumbprint_members();
            let mut sorted = members.to_vec();
            sorted.sort_unstable();
            assert_eq!(members, sorted.as_slice());
        }
    }

    #[test]
    fn test_to_public_strips_private_members() {
        let private = jwk(json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo",
            "d": "nWGxne_9WmC6hEr0kuwsxERJxWl7MmkZcDusAxyuf2A",
            "kid": "abc"
        }));
        assert!(private.is_private());

        let public = private.to_public();
        assert!(!public.is_private());
        assert!(public.get("d").is_none());
        assert_eq!(public.get_str("kid"), Some("abc"));
        assert_eq!(public.get_str("x"), private.get_str("x"));
    }

    #[test]
    fn test_debug_redacts_private_members() {
        let private = jwk(json!({
            "kty": "EC",
            "crv": "P-256",
            "x": "x",
            "y": "y",
            "d": "super-secret"
        }));
        let rendered = format!("{:?}", private);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(Jwk::try_from(json!("not a key")).is_err());
        assert!(Jwk::try_from(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_kind_requires_kty() {
        let no_kty = jwk(json!({"crv": "Ed25519", "x": "abc"}));
        assert!(matches!(
            no_kty.kind(),
            Err(KeyError::InvalidKeyMaterial(_))
        ));
    }
}
