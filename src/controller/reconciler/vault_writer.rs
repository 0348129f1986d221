//! # Vault Writer
//!
//! Creates or updates the AWS secret for one ASecret.
//!
//! - KMS key: `spec.kmsKeyId`, else the controller default key, else the AWS managed key
//! - Tags: controller default tags with `spec.tags` applied on top (spec wins)
//! - Existing secrets get a value update followed by a separate tag call

use crate::controller::reconciler::codec::{encode, CodecError, SecretValues};
use crate::crd::ASecretSpec;
use crate::provider::SecretVault;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Controller-wide defaults for AWS secret writes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultDefaults {
    pub kms_key_id: Option<String>,
    pub tags: BTreeMap<String, String>,
}

/// What the writer did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultWrite {
    Created,
    Updated,
    /// Nothing to store (empty binary value-set)
    Skipped,
}

impl VaultWrite {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            VaultWrite::Created => "create",
            VaultWrite::Updated => "update",
            VaultWrite::Skipped => "skip",
        }
    }
}

#[derive(Debug, Error)]
pub enum VaultWriteError {
    #[error(transparent)]
    Encode(#[from] CodecError),
    #[error("{0:#}")]
    Write(anyhow::Error),
    /// The value was written but tagging failed
    #[error("{0:#}")]
    Tag(anyhow::Error),
}

pub struct VaultWriter {
    vault: Arc<dyn SecretVault>,
    defaults: VaultDefaults,
}

impl std::fmt::Debug for VaultWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultWriter")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl VaultWriter {
    pub fn new(vault: Arc<dyn SecretVault>, defaults: VaultDefaults) -> Self {
        Self { vault, defaults }
    }

    /// Write the target value-set to the AWS secret at `spec.awsSecretPath`
    ///
    /// When `vault_exists` is false the secret is probed first; a not-found
    /// answer routes to create.
    pub async fn write(
        &self,
        spec: &ASecretSpec,
        target: &SecretValues,
        vault_exists: bool,
    ) -> Result<VaultWrite, VaultWriteError> {
        let path = spec.aws_secret_path.as_str();

        let Some(payload) = encode(target, spec.value_type)? else {
            debug!(path, "Empty binary value-set, nothing to write");
            return Ok(VaultWrite::Skipped);
        };

        let exists = if vault_exists {
            true
        } else {
            self.vault
                .describe_secret(path)
                .await
                .map_err(VaultWriteError::Write)?
        };

        let tags = resolve_tags(&self.defaults, spec);

        if !exists {
            let kms_key_id = resolve_kms_key(&self.defaults, spec);
            match kms_key_id {
                Some(kms_key_id) => debug!(path, kms_key_id, "Creating AWS secret with KMS key"),
                None => debug!(path, "Creating AWS secret with default encryption"),
            }
            self.vault
                .create_secret(path, &payload, &tags, kms_key_id)
                .await
                .map_err(VaultWriteError::Write)?;
            info!(path, keys = target.len(), "Created AWS secret");
            return Ok(VaultWrite::Created);
        }

        self.vault
            .update_secret_value(path, &payload)
            .await
            .map_err(VaultWriteError::Write)?;

        if !tags.is_empty() {
            self.vault
                .tag_secret(path, &tags)
                .await
                .map_err(VaultWriteError::Tag)?;
        }

        info!(path, keys = target.len(), "Updated AWS secret");
        Ok(VaultWrite::Updated)
    }
}

/// KMS key for a new AWS secret, `None` for the AWS managed key
#[must_use]
pub fn resolve_kms_key<'a>(defaults: &'a VaultDefaults, spec: &'a ASecretSpec) -> Option<&'a str> {
    spec.kms_key_id
        .as_deref()
        .filter(|k| !k.is_empty())
        .or_else(|| defaults.kms_key_id.as_deref().filter(|k| !k.is_empty()))
}

/// Default tags overlaid with the ASecret's tags
#[must_use]
pub fn resolve_tags(defaults: &VaultDefaults, spec: &ASecretSpec) -> BTreeMap<String, String> {
    let mut tags = defaults.tags.clone();
    tags.extend(spec.tags.iter().map(|(k, v)| (k.clone(), v.clone())));
    tags
}
