//! Fuzz target for key pair construction from untrusted documents
//!
//! Options documents and JWKs come from DID documents; parsing and
//! construction must fail cleanly rather than panic.

#![no_main]

use libfuzzer_sys::fuzz_target;

use jws2020_keypair::{compute_thumbprint, Jwk, KeyPair, KeyPairOptions};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(options) = KeyPairOptions::from_json(text) {
        if let Ok(key) = KeyPair::new(options) {
            let _ = key.verify_fingerprint(key.fingerprint().as_str());
            let _ = key.public_node();
        }
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        if let Ok(jwk) = Jwk::try_from(value) {
            let _ = compute_thumbprint(&jwk);
        }
    }
});
