//! Software backend holding JWK key material in memory

use rand_core::OsRng;

use super::{decode_array, decode_member, encode, jwk_from_members, kind_for, KeyBackend};
use crate::error::BackendError;
use crate::jwk::{Algorithm, EcCurve, Jwk, KeyKind, OkpCurve};

/// Modulus size used when generating RSA keys
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Software-based backend using the RustCrypto implementations
///
/// Supports Ed25519, P-256, P-384, secp256k1 and RSA (PS256).
#[derive(Debug, Clone)]
pub struct SoftwareBackend {
    rsa_bits: usize,
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self {
            rsa_bits: DEFAULT_RSA_BITS,
        }
    }
}

impl SoftwareBackend {
    /// Create a backend with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend generating RSA keys of the given modulus size
    pub fn with_rsa_bits(rsa_bits: usize) -> Self {
        Self { rsa_bits }
    }
}

impl KeyBackend for SoftwareBackend {
    fn generate(&self, kind: KeyKind) -> Result<Jwk, BackendError> {
        match kind {
            KeyKind::Okp(OkpCurve::Ed25519) => ed25519::generate(),
            KeyKind::Ec(EcCurve::P256) => ec_p256::generate(),
            KeyKind::Ec(EcCurve::P384) => ec_p384::generate(),
            KeyKind::Ec(EcCurve::Secp256k1) => ec_k256::generate(),
            KeyKind::Rsa => rsa_pss::generate(self.rsa_bits),
        }
    }

    fn sign(
        &self,
        private_jwk: &Jwk,
        alg: Algorithm,
        data: &[u8],
    ) -> Result<Vec<u8>, BackendError> {
        match kind_for(private_jwk, alg)? {
            KeyKind::Okp(OkpCurve::Ed25519) => ed25519::sign(private_jwk, data),
            KeyKind::Ec(EcCurve::P256) => ec_p256::sign(private_jwk, data),
            KeyKind::Ec(EcCurve::P384) => ec_p384::sign(private_jwk, data),
            KeyKind::Ec(EcCurve::Secp256k1) => ec_k256::sign(private_jwk, data),
            KeyKind::Rsa => rsa_pss::sign(private_jwk, data),
        }
    }

    fn verify(
        &self,
        public_jwk: &Jwk,
        alg: Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), BackendError> {
        match kind_for(public_jwk, alg)? {
            KeyKind::Okp(OkpCurve::Ed25519) => ed25519::verify(public_jwk, data, signature),
            KeyKind::Ec(EcCurve::P256) => ec_p256::verify(public_jwk, data, signature),
            KeyKind::Ec(EcCurve::P384) => ec_p384::verify(public_jwk, data, signature),
            KeyKind::Ec(EcCurve::Secp256k1) => ec_k256::verify(public_jwk, data, signature),
            KeyKind::Rsa => rsa_pss::verify(public_jwk, data, signature),
        }
    }
}

mod ed25519 {
    use super::*;
    use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};

    const KEY_LEN: usize = 32;

    pub(super) fn generate() -> Result<Jwk, BackendError> {
        let signing_key = SigningKey::generate(&mut OsRng);
        Ok(jwk_from_members(&[
            ("kty", "OKP".to_string()),
            ("crv", OkpCurve::Ed25519.name().to_string()),
            ("x", encode(signing_key.verifying_key().to_bytes())),
            ("d", encode(signing_key.to_bytes())),
        ]))
    }

    pub(super) fn sign(jwk: &Jwk, data: &[u8]) -> Result<Vec<u8>, BackendError> {
        let d = decode_array::<KEY_LEN>(jwk, "d")?;
        let signing_key = SigningKey::from_bytes(&d);

        if let Some(x) = jwk.get_str("x") {
            if x != encode(signing_key.verifying_key().to_bytes()) {
                return Err(BackendError::InvalidKey(
                    "x does not match the private scalar".to_string(),
                ));
            }
        }

        Ok(signing_key.sign(data).to_bytes().to_vec())
    }

    pub(super) fn verify(jwk: &Jwk, data: &[u8], signature: &[u8]) -> Result<(), BackendError> {
        let x = decode_array::<KEY_LEN>(jwk, "x")?;
        let verifying_key = VerifyingKey::from_bytes(&x)
            .map_err(|_| BackendError::InvalidKey("x is not a valid Ed25519 point".to_string()))?;

        let signature =
            Signature::from_slice(signature).map_err(|_| BackendError::InvalidSignatureEncoding)?;

        verifying_key
            .verify_strict(data, &signature)
            .map_err(|_| BackendError::InvalidSignature)
    }
}

/// ECDSA over one short-Weierstrass curve; signatures are fixed-size `r || s`
macro_rules! ecdsa_curve {
    ($module:ident, $krate:ident, $curve:expr, $len:literal) => {
        mod $module {
            use super::*;
            use $krate::ecdsa::signature::{Signer, Verifier};
            use $krate::ecdsa::{Signature, SigningKey, VerifyingKey};

            fn public_members(
                verifying_key: &VerifyingKey,
            ) -> Result<(String, String), BackendError> {
                let point = verifying_key.to_encoded_point(false);
                let x = point
                    .x()
                    .ok_or_else(|| BackendError::Crypto("point has no x coordinate".to_string()))?;
                let y = point
                    .y()
                    .ok_or_else(|| BackendError::Crypto("point has no y coordinate".to_string()))?;
                Ok((encode(x), encode(y)))
            }

            pub(super) fn generate() -> Result<Jwk, BackendError> {
                let signing_key = SigningKey::random(&mut OsRng);
                let (x, y) = public_members(signing_key.verifying_key())?;
                Ok(jwk_from_members(&[
                    ("kty", "EC".to_string()),
                    ("crv", $curve.name().to_string()),
                    ("x", x),
                    ("y", y),
                    ("d", encode(signing_key.to_bytes())),
                ]))
            }

            pub(super) fn sign(jwk: &Jwk, data: &[u8]) -> Result<Vec<u8>, BackendError> {
                let d = decode_array::<$len>(jwk, "d")?;
                let signing_key = SigningKey::from_slice(&d)
                    .map_err(|_| BackendError::InvalidKey("d is not a valid scalar".to_string()))?;

                let (x, y) = public_members(signing_key.verifying_key())?;
                let x_differs = jwk.get_str("x").map_or(false, |v| v != x);
                let y_differs = jwk.get_str("y").map_or(false, |v| v != y);
                if x_differs || y_differs {
                    return Err(BackendError::InvalidKey(
                        "x/y do not match the private scalar".to_string(),
                    ));
                }

                let signature: Signature = signing_key.sign(data);
                Ok(signature.to_bytes().to_vec())
            }

            pub(super) fn verify(
                jwk: &Jwk,
                data: &[u8],
                signature: &[u8],
            ) -> Result<(), BackendError> {
                let x = decode_array::<$len>(jwk, "x")?;
                let y = decode_array::<$len>(jwk, "y")?;

                // Build uncompressed point: 0x04 || x || y
                let mut point_bytes = Vec::with_capacity(1 + 2 * $len);
                point_bytes.push(0x04);
                point_bytes.extend_from_slice(&x);
                point_bytes.extend_from_slice(&y);

                let verifying_key = VerifyingKey::from_sec1_bytes(&point_bytes).map_err(|_| {
                    BackendError::InvalidKey("x/y is not a point on the curve".to_string())
                })?;

                let signature = Signature::from_slice(signature)
                    .map_err(|_| BackendError::InvalidSignatureEncoding)?;
                // (r, n - s) is as valid as (r, s); k256 only accepts low-S
                let signature = signature.normalize_s().unwrap_or(signature);

                verifying_key
                    .verify(data, &signature)
                    .map_err(|_| BackendError::InvalidSignature)
            }
        }
    };
}

ecdsa_curve!(ec_p256, p256, EcCurve::P256, 32);
ecdsa_curve!(ec_p384, p384, EcCurve::P384, 48);
ecdsa_curve!(ec_k256, k256, EcCurve::Secp256k1, 32);

mod rsa_pss {
    use super::*;
    use rsa::pss::{Signature, SigningKey, VerifyingKey};
    use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
    use rsa::traits::{PrivateKeyParts, PublicKeyParts};
    use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
    use sha2::Sha256;

    fn big_uint(jwk: &Jwk, member: &str) -> Result<BigUint, BackendError> {
        Ok(BigUint::from_bytes_be(&decode_member(jwk, member)?))
    }

    pub(super) fn generate(bits: usize) -> Result<Jwk, BackendError> {
        let key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| BackendError::Crypto(e.to_string()))?;

        let mut members = vec![
            ("kty", "RSA".to_string()),
            ("n", encode(key.n().to_bytes_be())),
            ("e", encode(key.e().to_bytes_be())),
            ("d", encode(key.d().to_bytes_be())),
        ];
        if let [p, q] = key.primes() {
            members.push(("p", encode(p.to_bytes_be())));
            members.push(("q", encode(q.to_bytes_be())));
        }
        if let Some(dp) = key.dp() {
            members.push(("dp", encode(dp.to_bytes_be())));
        }
        if let Some(dq) = key.dq() {
            members.push(("dq", encode(dq.to_bytes_be())));
        }
        if let Some(qi) = key.qinv() {
            members.push(("qi", encode(qi.to_bytes_be().1)));
        }

        Ok(jwk_from_members(&members))
    }

    pub(super) fn sign(jwk: &Jwk, data: &[u8]) -> Result<Vec<u8>, BackendError> {
        let private_key = RsaPrivateKey::from_components(
            big_uint(jwk, "n")?,
            big_uint(jwk, "e")?,
            big_uint(jwk, "d")?,
            vec![big_uint(jwk, "p")?, big_uint(jwk, "q")?],
        )
        .map_err(|e| BackendError::InvalidKey(e.to_string()))?;

        let signing_key = SigningKey::<Sha256>::new(private_key);
        let signature = signing_key
            .try_sign_with_rng(&mut OsRng, data)
            .map_err(|e| BackendError::Crypto(e.to_string()))?;
        Ok(signature.to_vec())
    }

    pub(super) fn verify(jwk: &Jwk, data: &[u8], signature: &[u8]) -> Result<(), BackendError> {
        let public_key = RsaPublicKey::new(big_uint(jwk, "n")?, big_uint(jwk, "e")?)
            .map_err(|e| BackendError::InvalidKey(e.to_string()))?;
        let verifying_key = VerifyingKey::<Sha256>::new(public_key);

        let signature =
            Signature::try_from(signature).map_err(|_| BackendError::InvalidSignatureEncoding)?;

        verifying_key
            .verify(data, &signature)
            .map_err(|_| BackendError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATA: &[u8] = &[0xde, 0xad, 0xbe, 0xef];

    fn round_trip(backend: &SoftwareBackend, kind: KeyKind) {
        let private = backend.generate(kind).unwrap();
        assert_eq!(private.kind().unwrap(), kind);
        assert!(private.is_private());

        let public = private.to_public();
        let alg = kind.algorithm();
        let signature = backend.sign(&private, alg, DATA).unwrap();

        backend.verify(&public, alg, DATA, &signature).unwrap();
        assert!(matches!(
            backend.verify(&public, alg, b"other data", &signature),
            Err(BackendError::InvalidSignature)
        ));
    }

    #[test]
    fn test_ed25519_sign_and_verify() {
        let backend = SoftwareBackend::new();
        round_trip(&backend, KeyKind::Okp(OkpCurve::Ed25519));
    }

    #[test]
    fn test_ec_sign_and_verify() {
        let backend = SoftwareBackend::new();
        round_trip(&backend, KeyKind::Ec(EcCurve::P256));
        round_trip(&backend, KeyKind::Ec(EcCurve::P384));
        round_trip(&backend, KeyKind::Ec(EcCurve::Secp256k1));
    }

    #[test]
    fn test_rsa_sign_and_verify() {
        let backend = SoftwareBackend::with_rsa_bits(1024);
        round_trip(&backend, KeyKind::Rsa);
    }

    #[test]
    fn test_signature_lengths() {
        let backend = SoftwareBackend::new();
        for (kind, len) in [
            (KeyKind::Okp(OkpCurve::Ed25519), 64),
            (KeyKind::Ec(EcCurve::P256), 64),
            (KeyKind::Ec(EcCurve::P384), 96),
            (KeyKind::Ec(EcCurve::Secp256k1), 64),
        ] {
            let private = backend.generate(kind).unwrap();
            let signature = backend.sign(&private, kind.algorithm(), DATA).unwrap();
            assert_eq!(signature.len(), len, "{}", kind);
        }
    }

    #[test]
    fn test_algorithm_must_match_key() {
        let backend = SoftwareBackend::new();
        let private = backend.generate(KeyKind::Ec(EcCurve::P256)).unwrap();

        assert!(matches!(
            backend.sign(&private, Algorithm::EdDsa, DATA),
            Err(BackendError::AlgorithmKeyMismatch { .. })
        ));
    }

    #[test]
    fn test_reject_wrong_coordinate_length() {
        let backend = SoftwareBackend::new();
        let private = backend.generate(KeyKind::Ec(EcCurve::P256)).unwrap();
        let signature = backend.sign(&private, Algorithm::Es256, DATA).unwrap();

        let mut members = private.to_public().into_map();
        members.insert("x".to_string(), encode([0u8; 31]).into());
        let short = Jwk::from_map(members);

        assert!(matches!(
            backend.verify(&short, Algorithm::Es256, DATA, &signature),
            Err(BackendError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_reject_mismatched_private_and_public_members() {
        let backend = SoftwareBackend::new();
        let first = backend.generate(KeyKind::Okp(OkpCurve::Ed25519)).unwrap();
        let second = backend.generate(KeyKind::Okp(OkpCurve::Ed25519)).unwrap();

        let mut members = first.into_map();
        members.insert("x".to_string(), second.get("x").unwrap().clone());
        let mismatched = Jwk::from_map(members);

        assert!(matches!(
            backend.sign(&mismatched, Algorithm::EdDsa, DATA),
            Err(BackendError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_truncated_signature_is_encoding_error() {
        let backend = SoftwareBackend::new();
        let private = backend.generate(KeyKind::Okp(OkpCurve::Ed25519)).unwrap();
        let signature = backend.sign(&private, Algorithm::EdDsa, DATA).unwrap();

        assert!(matches!(
            backend.verify(&private.to_public(), Algorithm::EdDsa, DATA, &signature[..63]),
            Err(BackendError::InvalidSignatureEncoding)
        ));
    }

    #[test]
    fn test_secp256k1_accepts_high_s() {
        use k256::ecdsa::Signature;

        let backend = SoftwareBackend::new();
        let kind = KeyKind::Ec(EcCurve::Secp256k1);
        let private = backend.generate(kind).unwrap();
        let public = private.to_public();

        let low_s = backend.sign(&private, Algorithm::Es256K, b"hello").unwrap();
        let (r, s) = Signature::from_slice(&low_s).unwrap().split_scalars();
        let high_s = Signature::from_scalars(r, -s).unwrap();
        assert!(high_s.normalize_s().is_some());

        backend
            .verify(&public, Algorithm::Es256K, b"hello", &low_s)
            .unwrap();
        backend
            .verify(&public, Algorithm::Es256K, b"hello", &high_s.to_bytes())
            .unwrap();
        assert!(matches!(
            backend.verify(&public, Algorithm::Es256K, b"hellp", &high_s.to_bytes()),
            Err(BackendError::InvalidSignature)
        ));
    }

    #[test]
    fn test_backend_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SoftwareBackend>();
    }
}
