//! Key pair construction options and loading them from files

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::jwk::Jwk;

/// Options for building a [`crate::KeyPair`]
///
/// Field names follow the JSON-LD key representation (`type`,
/// `publicKeyJwk`, `privateKeyJwk`), so an exported key document can be
/// deserialized directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPairOptions {
    /// Key identifier; derived as `controller#thumbprint` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Verification method type (defaults to `JsonWebKey2020`)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,

    /// Entity controlling the key, usually a DID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,

    /// Public key; derived from the private key when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,

    /// Private key; absent for verify-only key pairs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_jwk: Option<Jwk>,

    /// No longer accepted; construction fails if set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
}

impl KeyPairOptions {
    /// Parse options from a JSON document
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Parse options from a YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load options from a file
    ///
    /// Files ending in `.json` or `.jsonld` are parsed as JSON, anything
    /// else as YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") | Some("jsonld") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_options_from_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("key.json");

        std::fs::write(
            &path,
            r#"{
  "id": "did:example:123#key-0",
  "type": "JsonWebKey2020",
  "controller": "did:example:123",
  "publicKeyJwk": {
    "kty": "OKP",
    "crv": "Ed25519",
    "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
  }
}"#,
        )
        .unwrap();

        let options = KeyPairOptions::from_file(&path).unwrap();

        assert_eq!(options.id.as_deref(), Some("did:example:123#key-0"));
        assert_eq!(options.key_type.as_deref(), Some("JsonWebKey2020"));
        assert_eq!(options.controller.as_deref(), Some("did:example:123"));
        let public = options.public_key_jwk.unwrap();
        assert_eq!(public.get_str("crv"), Some("Ed25519"));
        assert!(options.private_key_jwk.is_none());
        assert!(options.alg.is_none());
    }

    #[test]
    fn test_options_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("key.yaml");

        std::fs::write(
            &path,
            r#"
controller: did:example:456
privateKeyJwk:
  kty: EC
  crv: P-256
  x: abc
  y: def
  d: ghi
"#,
        )
        .unwrap();

        let options = KeyPairOptions::from_file(&path).unwrap();

        assert_eq!(options.controller.as_deref(), Some("did:example:456"));
        assert!(options.id.is_none());
        assert!(options.public_key_jwk.is_none());
        assert!(options.private_key_jwk.unwrap().is_private());
    }

    #[test]
    fn test_alg_is_deserialized() {
        let options = KeyPairOptions::from_json(r#"{"alg": "ES256"}"#).unwrap();
        assert_eq!(options.alg.as_deref(), Some("ES256"));
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = KeyPairOptions::from_file(&temp_dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            KeyPairOptions::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
