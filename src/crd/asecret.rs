//! # ASecret Spec
//!
//! Declares one secret value-set kept in sync between AWS Secrets Manager and a
//! Kubernetes Secret.

use crate::controller::reconciler::codec::ValueType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ASecret Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: yet-another-secrets.io/v1alpha1
/// kind: ASecret
/// metadata:
///   name: db-credentials
///   namespace: default
/// spec:
///   targetSecretName: db-credentials
///   awsSecretPath: /prod/db/credentials
///   refreshInterval: 10m
///   data:
///     username:
///       value: admin
///     password:
///       generatorRef:
///         name: strong-password
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "ASecret",
    group = "yet-another-secrets.io",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::ASecretStatus",
    shortname = "asec",
    printcolumn = r#"{"name":"Target", "type":"string", "jsonPath":".spec.targetSecretName"}"#,
    printcolumn = r#"{"name":"Path", "type":"string", "jsonPath":".spec.awsSecretPath"}"#,
    printcolumn = r#"{"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#,
    printcolumn = r#"{"name":"Last Sync", "type":"string", "jsonPath":".status.lastSyncTime"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ASecretSpec {
    /// Name of the Kubernetes Secret to create/manage in the ASecret's namespace
    pub target_secret_name: String,
    /// Secret name (path) in AWS Secrets Manager
    pub aws_secret_path: String,
    /// KMS key ID or ARN used when the AWS secret is created
    /// Falls back to the controller default key, then to the AWS managed key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    /// Secret keys and how to resolve them when neither store has a value
    #[serde(default)]
    pub data: BTreeMap<String, DataSource>,
    /// Tags applied to the AWS secret on top of the controller default tags
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Import every value from AWS only; never create or update the AWS secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_import_remote: Option<bool>,
    /// Payload encoding in AWS Secrets Manager: kv, json or binary
    #[serde(default)]
    pub value_type: ValueType,
    /// How long to wait between reconciliations (e.g. "10m", "1h30m")
    /// Default: 1h
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<String>,
    /// Metadata applied to the managed Kubernetes Secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_secret_template: Option<SecretTemplate>,
}

impl ASecretSpec {
    /// True when the whole ASecret only imports from AWS
    #[must_use]
    pub fn import_only(&self) -> bool {
        self.only_import_remote.unwrap_or(false)
    }

    /// True when the key is declared with `onlyImportRemote: true`
    #[must_use]
    pub fn is_import_only_key(&self, key: &str) -> bool {
        self.data.get(key).is_some_and(DataSource::import_only)
    }
}

/// Resolution rule for one declared key
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    /// Static value used when the key exists in neither store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Generator used when the key exists in neither store and no value is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator_ref: Option<GeneratorReference>,
    /// Only read this key from AWS; never create it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_import_remote: Option<bool>,
}

impl DataSource {
    #[must_use]
    pub fn import_only(&self) -> bool {
        self.only_import_remote.unwrap_or(false)
    }
}

/// Reference to a cluster-scoped AGenerator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorReference {
    /// Name of the AGenerator
    pub name: String,
}

/// Template for the managed Kubernetes Secret
///
/// Labels and annotations are merged onto the existing Secret; template entries win.
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
    /// Secret type (e.g. "kubernetes.io/tls"); defaults to Opaque
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
}
