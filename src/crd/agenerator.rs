//! # AGenerator Spec
//!
//! Cluster-scoped configuration for generating random secret values.

use serde::{Deserialize, Serialize};

/// Special characters used when `specialChars` is not set
pub const DEFAULT_SPECIAL_CHARS: &str = "!@#$%^&*()-_=+[]{}|;:,.<>?/";

/// AGenerator Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: yet-another-secrets.io/v1alpha1
/// kind: AGenerator
/// metadata:
///   name: strong-password
/// spec:
///   length: 32
///   includeSpecialChars: false
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "AGenerator",
    group = "yet-another-secrets.io",
    version = "v1alpha1",
    status = "crate::crd::AGeneratorStatus",
    shortname = "agen",
    printcolumn = r#"{"name":"Length", "type":"integer", "jsonPath":".spec.length"}"#,
    printcolumn = r#"{"name":"Valid", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Valid\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AGeneratorSpec {
    /// Length of the generated value
    #[serde(default = "default_length")]
    #[schemars(range(min = 1))]
    pub length: u32,
    #[serde(default = "default_true")]
    pub include_uppercase: bool,
    #[serde(default = "default_true")]
    pub include_lowercase: bool,
    #[serde(default = "default_true")]
    pub include_numbers: bool,
    #[serde(default = "default_true")]
    pub include_special_chars: bool,
    /// Character set used when `includeSpecialChars` is true
    #[serde(default = "default_special_chars")]
    pub special_chars: String,
}

impl Default for AGeneratorSpec {
    fn default() -> Self {
        Self {
            length: default_length(),
            include_uppercase: true,
            include_lowercase: true,
            include_numbers: true,
            include_special_chars: true,
            special_chars: default_special_chars(),
        }
    }
}

/// Default generated value length
pub fn default_length() -> u32 {
    16
}

/// Default value for boolean true
pub fn default_true() -> bool {
    true
}

/// Default special character set
pub fn default_special_chars() -> String {
    DEFAULT_SPECIAL_CHARS.to_string()
}
