//! # Provider Modules
//!
//! The secret vault interface consumed by the reconciler and its AWS Secrets
//! Manager implementation.

use crate::controller::reconciler::codec::VaultPayload;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Managed secret vault holding the first-priority copy of secret values
#[async_trait]
pub trait SecretVault: Send + Sync {
    /// Get the current payload, `None` when the secret does not exist
    async fn get_secret(&self, path: &str) -> Result<Option<VaultPayload>>;

    /// Returns false when the secret does not exist
    async fn describe_secret(&self, path: &str) -> Result<bool>;

    /// Create a new secret
    ///
    /// # Arguments
    /// * `path` - Secret name
    /// * `payload` - Initial value
    /// * `tags` - Tags attached to the secret
    /// * `kms_key_id` - Encryption key, `None` for the vault's default key
    async fn create_secret(
        &self,
        path: &str,
        payload: &VaultPayload,
        tags: &BTreeMap<String, String>,
        kms_key_id: Option<&str>,
    ) -> Result<()>;

    /// Store a new value for an existing secret
    async fn update_secret_value(&self, path: &str, payload: &VaultPayload) -> Result<()>;

    /// Add or overwrite tags on an existing secret
    async fn tag_secret(&self, path: &str, tags: &BTreeMap<String, String>) -> Result<()>;
}

pub mod aws;
