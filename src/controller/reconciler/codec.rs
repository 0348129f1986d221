//! # Value Codec
//!
//! Converts a secret value-set to and from the payload stored in AWS Secrets Manager.
//!
//! - `kv`: flat JSON object of strings (`SecretString`)
//! - `json`: JSON object whose values may be nested JSON (`SecretString`)
//! - `binary`: the single value's raw bytes (`SecretBinary`)

use crate::crd::DataSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Key used for a binary payload when the ASecret declares no key
pub const DEFAULT_BINARY_KEY: &str = "binaryData";

/// Secret values keyed by name, as raw bytes
pub type SecretValues = BTreeMap<String, Vec<u8>>;

/// Payload encoding in AWS Secrets Manager
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Flat key/value JSON object
    #[default]
    Kv,
    /// JSON object, values re-parsed as JSON where possible
    Json,
    /// Single raw binary blob
    Binary,
}

impl ValueType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Kv => "kv",
            ValueType::Json => "json",
            ValueType::Binary => "binary",
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw secret payload as stored in the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultPayload {
    /// `SecretString`
    Text(String),
    /// `SecretBinary`
    Binary(Vec<u8>),
}

impl VaultPayload {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            VaultPayload::Text(text) => text.as_bytes(),
            VaultPayload::Binary(bytes) => bytes,
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("binary value type supports at most one key, got {0}")]
    BinaryCardinality(usize),
    #[error("binary value type requires at most one non-import-only declared key, got {0}")]
    BinaryDeclaredKeys(usize),
    #[error("secret payload is empty")]
    MissingPayload,
    #[error("secret payload is not valid JSON for value type {value_type}: {source}")]
    Json {
        value_type: ValueType,
        #[source]
        source: serde_json::Error,
    },
    #[error("secret payload for value type {0} must be a JSON object")]
    NotAnObject(ValueType),
}

impl CodecError {
    /// Errors caused by the ASecret itself rather than by the stored payload
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CodecError::BinaryCardinality(_) | CodecError::BinaryDeclaredKeys(_)
        )
    }
}

/// Encode a value-set for the vault
///
/// Returns `Ok(None)` for a binary value type with nothing to store.
pub fn encode(values: &SecretValues, value_type: ValueType) -> Result<Option<VaultPayload>, CodecError> {
    match value_type {
        ValueType::Kv => {
            let flat: BTreeMap<&str, String> = values
                .iter()
                .map(|(k, v)| (k.as_str(), String::from_utf8_lossy(v).into_owned()))
                .collect();
            let text = serde_json::to_string(&flat).map_err(|source| CodecError::Json {
                value_type,
                source,
            })?;
            Ok(Some(VaultPayload::Text(text)))
        }
        ValueType::Json => {
            let object: serde_json::Map<String, serde_json::Value> = values
                .iter()
                .map(|(k, v)| {
                    let value = serde_json::from_slice::<serde_json::Value>(v).unwrap_or_else(
                        |_| serde_json::Value::String(String::from_utf8_lossy(v).into_owned()),
                    );
                    (k.clone(), value)
                })
                .collect();
            let text = serde_json::to_string(&object).map_err(|source| CodecError::Json {
                value_type,
                source,
            })?;
            Ok(Some(VaultPayload::Text(text)))
        }
        ValueType::Binary => match values.len() {
            0 => Ok(None),
            1 => Ok(values
                .values()
                .next()
                .map(|bytes| VaultPayload::Binary(bytes.clone()))),
            n => Err(CodecError::BinaryCardinality(n)),
        },
    }
}

/// Decode a vault payload into a value-set
///
/// `declared` is the ASecret's `data` map; it names the key of a binary payload.
pub fn decode(
    payload: Option<&VaultPayload>,
    value_type: ValueType,
    declared: &BTreeMap<String, DataSource>,
) -> Result<SecretValues, CodecError> {
    match value_type {
        ValueType::Kv => {
            let payload = payload.ok_or(CodecError::MissingPayload)?;
            let flat: BTreeMap<String, String> = serde_json::from_slice(payload.as_bytes())
                .map_err(|source| CodecError::Json { value_type, source })?;
            Ok(flat
                .into_iter()
                .map(|(k, v)| (k, v.into_bytes()))
                .collect())
        }
        ValueType::Json => {
            let payload = payload.ok_or(CodecError::MissingPayload)?;
            let parsed: serde_json::Value = serde_json::from_slice(payload.as_bytes())
                .map_err(|source| CodecError::Json { value_type, source })?;
            let serde_json::Value::Object(object) = parsed else {
                return Err(CodecError::NotAnObject(value_type));
            };
            object
                .into_iter()
                .map(|(k, v)| {
                    let text = match v {
                        serde_json::Value::String(s) => s,
                        other => serde_json::to_string(&other)
                            .map_err(|source| CodecError::Json { value_type, source })?,
                    };
                    Ok((k, text.into_bytes()))
                })
                .collect()
        }
        ValueType::Binary => {
            let key = binary_key(declared)?;
            let payload = payload.ok_or(CodecError::MissingPayload)?;
            Ok(BTreeMap::from([(key, payload.as_bytes().to_vec())]))
        }
    }
}

/// Key under which a binary payload is exposed
///
/// Import-only keys never name the blob.
fn binary_key(declared: &BTreeMap<String, DataSource>) -> Result<String, CodecError> {
    let owned: Vec<&String> = declared
        .iter()
        .filter(|(_, source)| !source.import_only())
        .map(|(key, _)| key)
        .collect();
    match owned.as_slice() {
        [] => Ok(DEFAULT_BINARY_KEY.to_string()),
        [key] => Ok((*key).clone()),
        keys => Err(CodecError::BinaryDeclaredKeys(keys.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> SecretValues {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    fn text(payload: Option<VaultPayload>) -> String {
        match payload {
            Some(VaultPayload::Text(t)) => t,
            other => panic!("expected text payload, got {other:?}"),
        }
    }

    #[test]
    fn test_kv_encode_is_flat_string_object() {
        let encoded = encode(&values(&[("user", "admin"), ("port", "5432")]), ValueType::Kv).unwrap();
        assert_eq!(text(encoded), r#"{"port":"5432","user":"admin"}"#);
    }

    #[test]
    fn test_kv_decode_rejects_nested_values() {
        let payload = VaultPayload::Text(r#"{"a":{"b":1}}"#.to_string());
        let err = decode(Some(&payload), ValueType::Kv, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, CodecError::Json { .. }));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_json_encode_embeds_valid_json_values() {
        let encoded = encode(
            &values(&[("config", r#"{"debug":true}"#), ("name", "plain text"), ("count", "3")]),
            ValueType::Json,
        )
        .unwrap();
        assert_eq!(
            text(encoded),
            r#"{"config":{"debug":true},"count":3,"name":"plain text"}"#
        );
    }

    #[test]
    fn test_json_decode_reserializes_non_strings() {
        let payload =
            VaultPayload::Text(r#"{"name":"svc","config":{"debug": true},"count":3,"on":false}"#.to_string());
        let decoded = decode(Some(&payload), ValueType::Json, &BTreeMap::new()).unwrap();
        assert_eq!(decoded["name"], b"svc");
        assert_eq!(decoded["config"], br#"{"debug":true}"#);
        assert_eq!(decoded["count"], b"3");
        assert_eq!(decoded["on"], b"false");
    }

    #[test]
    fn test_json_round_trip_is_canonical() {
        let original = values(&[("config", r#"{ "a": [1, 2],  "b": 1 }"#), ("user", "admin")]);
        let encoded = encode(&original, ValueType::Json).unwrap().unwrap();
        let decoded = decode(Some(&encoded), ValueType::Json, &BTreeMap::new()).unwrap();
        assert_eq!(decoded["user"], b"admin");
        assert_eq!(decoded["config"], br#"{"a":[1,2],"b":1}"#);
    }

    #[test]
    fn test_json_decode_rejects_non_object() {
        let payload = VaultPayload::Text("[1,2]".to_string());
        let err = decode(Some(&payload), ValueType::Json, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, CodecError::NotAnObject(ValueType::Json)));
    }

    #[test]
    fn test_binary_encode_raw_bytes() {
        let mut set = SecretValues::new();
        set.insert("tls.crt".to_string(), vec![0x30, 0x82, 0xff]);
        let encoded = encode(&set, ValueType::Binary).unwrap();
        assert_eq!(encoded, Some(VaultPayload::Binary(vec![0x30, 0x82, 0xff])));
    }

    #[test]
    fn test_binary_encode_empty_writes_nothing() {
        assert_eq!(encode(&SecretValues::new(), ValueType::Binary).unwrap(), None);
    }

    #[test]
    fn test_binary_encode_rejects_multiple_keys() {
        let err = encode(&values(&[("a", "1"), ("b", "2")]), ValueType::Binary).unwrap_err();
        assert!(matches!(err, CodecError::BinaryCardinality(2)));
        assert!(err.is_validation());
    }

    #[test]
    fn test_binary_decode_uses_declared_key() {
        let declared = BTreeMap::from([(
            "tls.crt".to_string(),
            DataSource {
                value: Some("placeholder".to_string()),
                ..DataSource::default()
            },
        )]);
        let payload = VaultPayload::Binary(b"certificate-data-here".to_vec());
        let decoded = decode(Some(&payload), ValueType::Binary, &declared).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded["tls.crt"], b"certificate-data-here");
    }

    #[test]
    fn test_binary_decode_skips_import_only_keys() {
        let import_only = DataSource {
            only_import_remote: Some(true),
            ..DataSource::default()
        };
        let payload = VaultPayload::Binary(b"blob".to_vec());

        let only_import = BTreeMap::from([("keystore".to_string(), import_only.clone())]);
        let decoded = decode(Some(&payload), ValueType::Binary, &only_import).unwrap();
        assert_eq!(decoded.keys().collect::<Vec<_>>(), vec![DEFAULT_BINARY_KEY]);

        let mixed = BTreeMap::from([
            ("cert".to_string(), DataSource::default()),
            ("legacy".to_string(), import_only),
        ]);
        let decoded = decode(Some(&payload), ValueType::Binary, &mixed).unwrap();
        assert_eq!(decoded.keys().collect::<Vec<_>>(), vec!["cert"]);
    }

    #[test]
    fn test_binary_decode_defaults_key() {
        let payload = VaultPayload::Binary(b"blob".to_vec());
        let decoded = decode(Some(&payload), ValueType::Binary, &BTreeMap::new()).unwrap();
        assert_eq!(decoded[DEFAULT_BINARY_KEY], b"blob");
    }

    #[test]
    fn test_binary_decode_rejects_multiple_declared_keys() {
        let declared = BTreeMap::from([
            ("tls.crt".to_string(), DataSource::default()),
            ("tls.key".to_string(), DataSource::default()),
        ]);
        let payload = VaultPayload::Binary(b"blob".to_vec());
        let err = decode(Some(&payload), ValueType::Binary, &declared).unwrap_err();
        assert!(matches!(err, CodecError::BinaryDeclaredKeys(2)));
    }

    #[test]
    fn test_binary_decode_requires_payload() {
        let err = decode(None, ValueType::Binary, &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, CodecError::MissingPayload));
    }

    #[test]
    fn test_value_type_serde() {
        assert_eq!(serde_json::to_string(&ValueType::Binary).unwrap(), r#""binary""#);
        let parsed: ValueType = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(parsed, ValueType::Json);
        assert_eq!(ValueType::default(), ValueType::Kv);
    }
}
