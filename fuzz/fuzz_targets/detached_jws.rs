//! Fuzz target for detached JWS verification
//!
//! Verification consumes attacker-supplied strings; it must never panic
//! whatever the header or signature segments contain.

#![no_main]

use arbitrary::Arbitrary;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

use jws2020_keypair::{Jwk, KeyPair, KeyPairOptions};

#[derive(Arbitrary, Debug)]
struct FuzzJwsInput {
    /// Raw detached JWS string
    jws: String,
    /// Protected header bytes, encoded before verification
    header: Vec<u8>,
    /// Signature bytes, encoded before verification
    signature: Vec<u8>,
    /// Payload the signature is checked against
    payload: Vec<u8>,
}

fn key() -> &'static KeyPair {
    static KEY: OnceLock<KeyPair> = OnceLock::new();
    KEY.get_or_init(|| {
        let public = serde_json::json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
        });
        KeyPair::new(KeyPairOptions {
            public_key_jwk: Jwk::try_from(public).ok(),
            ..Default::default()
        })
        .expect("fixed key is valid")
    })
}

fuzz_target!(|input: FuzzJwsInput| {
    let verifier = key().verifier();

    // Arbitrary strings exercise segment splitting
    let _ = verifier.verify(&input.payload, &input.jws);

    // Well-formed segments reach header validation and the backend
    let jws = format!(
        "{}..{}",
        URL_SAFE_NO_PAD.encode(&input.header),
        URL_SAFE_NO_PAD.encode(&input.signature)
    );
    let _ = verifier.verify(&input.payload, &jws);
});
