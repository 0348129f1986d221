//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::controller::reconciler::kube_store::KubeStore;
use crate::controller::reconciler::sync::SecretSyncer;
use crate::provider::SecretVault;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// The resource is invalid until edited
    #[error("Invalid resource: {0}")]
    Validation(String),
    #[error("Generator resolution failed: {0}")]
    Generator(String),
    #[error("Failed to read AWS secret {path}: {source:#}")]
    VaultRead {
        path: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Failed to write AWS secret {path}: {message}")]
    VaultWrite { path: String, message: String },
    /// The value was written but the tag update failed
    #[error("AWS secret {path} updated but tagging failed: {source:#}")]
    VaultTag {
        path: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Failed to sync Kubernetes Secret {name}: {source:#}")]
    ClusterSecret {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("Failed to update status: {0:#}")]
    Status(#[source] anyhow::Error),
}

impl ReconcilerError {
    /// Short label for metrics and logs
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcilerError::Validation(_) => "validation",
            ReconcilerError::Generator(_) => "generator",
            ReconcilerError::VaultRead { .. } => "vault-read",
            ReconcilerError::VaultWrite { .. } => "vault-write",
            ReconcilerError::VaultTag { .. } => "vault-tag",
            ReconcilerError::ClusterSecret { .. } => "cluster-secret",
            ReconcilerError::Status(_) => "status",
        }
    }

    /// Validation errors wait for the normal cycle; everything else is retried sooner
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ReconcilerError::Validation(_))
    }
}

/// Trigger source for the next reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// Periodic refresh after a successful sync
    TimerBased,
    /// Fixed short retry after an AWS read failure
    VaultReadRetry,
    /// Retry after any other error
    RetryAfterError,
    /// Invalid resource, checked again on the normal cycle
    InvalidResource,
}

impl TriggerSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerSource::TimerBased => "timer-based",
            TriggerSource::VaultReadRetry => "vault-read-retry",
            TriggerSource::RetryAfterError => "retry-after-error",
            TriggerSource::InvalidResource => "invalid-resource",
        }
    }
}

/// Shared context handed to every reconciliation
pub struct Reconciler {
    pub syncer: SecretSyncer,
    pub store: Arc<dyn KubeStore>,
    pub error_requeue: Duration,
    pub vault_read_error_requeue: Duration,
    pub secret_versions: SecretVersions,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("error_requeue", &self.error_requeue)
            .field("vault_read_error_requeue", &self.vault_read_error_requeue)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        vault: Arc<dyn SecretVault>,
        store: Arc<dyn KubeStore>,
        config: &ControllerConfig,
    ) -> Self {
        Self {
            syncer: SecretSyncer::new(
                vault,
                store.clone(),
                config.merge_policy(),
                config.vault_defaults(),
            ),
            store,
            error_requeue: config.reconciliation_error_requeue_duration(),
            vault_read_error_requeue: config.vault_read_error_requeue_duration(),
            secret_versions: SecretVersions::default(),
        }
    }
}

/// `resourceVersion` of each managed Secret as last written, keyed by ASecret
///
/// Entries are dropped when the ASecret leaves the controller cache.
#[derive(Debug, Default)]
pub struct SecretVersions {
    versions: Mutex<HashMap<String, String>>,
}

impl SecretVersions {
    #[must_use]
    pub fn key(namespace: &str, name: &str) -> String {
        format!("{namespace}/{name}")
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match self.versions.lock() {
            Ok(versions) => versions.get(key).cloned(),
            Err(e) => {
                warn!("Failed to lock secret versions: {}", e);
                None
            }
        }
    }

    /// Record the version written by a sync; `None` forgets the entry
    pub fn record(&self, key: String, version: Option<String>) {
        match version {
            Some(version) => match self.versions.lock() {
                Ok(mut versions) => {
                    versions.insert(key, version);
                }
                Err(e) => warn!("Failed to lock secret versions: {}", e),
            },
            None => self.forget(&key),
        }
    }

    pub fn forget(&self, key: &str) {
        match self.versions.lock() {
            Ok(mut versions) => {
                versions.remove(key);
            }
            Err(e) => warn!("Failed to lock secret versions: {}", e),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.lock().map_or(0, |versions| versions.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_validation_is_not_retryable() {
        assert!(!ReconcilerError::Validation("bad".to_string()).is_retryable());
        assert!(ReconcilerError::Generator("missing".to_string()).is_retryable());
        assert!(ReconcilerError::VaultRead {
            path: "/p".to_string(),
            source: anyhow::anyhow!("timeout"),
        }
        .is_retryable());
    }

    #[test]
    fn test_error_messages_include_context() {
        let err = ReconcilerError::VaultTag {
            path: "/prod/db".to_string(),
            source: anyhow::anyhow!("AccessDenied"),
        };
        assert_eq!(
            err.to_string(),
            "AWS secret /prod/db updated but tagging failed: AccessDenied"
        );
        assert_eq!(err.reason(), "vault-tag");
    }

    #[test]
    fn test_secret_versions_record_and_forget() {
        let versions = SecretVersions::default();
        let key = SecretVersions::key("apps", "db");
        assert_eq!(key, "apps/db");

        versions.record(key.clone(), Some("7".to_string()));
        assert_eq!(versions.get(&key).as_deref(), Some("7"));

        versions.record(key.clone(), Some("8".to_string()));
        assert_eq!(versions.get(&key).as_deref(), Some("8"));
        assert_eq!(versions.len(), 1);

        versions.record(key.clone(), None);
        assert!(versions.get(&key).is_none());

        versions.record(key.clone(), Some("9".to_string()));
        versions.forget(&key);
        assert!(versions.is_empty());
    }
}
