//! # Secret Sync
//!
//! Runs one sync cycle for an ASecret:
//!
//! 1. Validate the spec
//! 2. Read the AWS secret (not found is not an error)
//! 3. Read the Kubernetes Secret
//! 4. Merge
//! 5. Write the Kubernetes Secret
//! 6. Write the AWS secret when its key set differs
//! 7. Record the `Synced` condition
//!
//! Every store is read fresh each cycle. Nothing is written when the merge fails.

use crate::controller::reconciler::change::needs_vault_update;
use crate::controller::reconciler::cluster_writer::{ClusterSecretWrite, ClusterSecretWriter};
use crate::controller::reconciler::codec::{decode, SecretValues};
use crate::controller::reconciler::kube_store::KubeStore;
use crate::controller::reconciler::merge::{
    merge, ClusterSecretState, MergeError, MergePolicy, VaultSecretState,
};
use crate::controller::reconciler::status::synced_status;
use crate::controller::reconciler::types::ReconcilerError;
use crate::controller::reconciler::validation::{refresh_interval, validate_asecret_spec};
use crate::controller::reconciler::vault_writer::{
    VaultDefaults, VaultWrite, VaultWriteError, VaultWriter,
};
use crate::crd::{ASecret, ASecretSpec};
use crate::observability::metrics;
use crate::provider::SecretVault;
use chrono::Utc;
use kube::ResourceExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Result of a successful sync cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Delay until the next scheduled sync
    pub next_delay: Duration,
    /// AWS write performed, `None` when the AWS secret was left alone
    pub vault_write: Option<VaultWrite>,
    pub cluster_write: ClusterSecretWrite,
    /// `resourceVersion` of the Kubernetes Secret after the write
    pub secret_version: Option<String>,
    /// Keys of the synced value-set
    pub keys: Vec<String>,
}

impl SyncOutcome {
    #[must_use]
    pub fn vault_written(&self) -> bool {
        matches!(
            self.vault_write,
            Some(VaultWrite::Created | VaultWrite::Updated)
        )
    }

    #[must_use]
    pub fn cluster_created(&self) -> bool {
        self.cluster_write == ClusterSecretWrite::Created
    }
}

pub struct SecretSyncer {
    vault: Arc<dyn SecretVault>,
    store: Arc<dyn KubeStore>,
    vault_writer: VaultWriter,
    cluster_writer: ClusterSecretWriter,
    policy: MergePolicy,
}

impl std::fmt::Debug for SecretSyncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretSyncer")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl SecretSyncer {
    pub fn new(
        vault: Arc<dyn SecretVault>,
        store: Arc<dyn KubeStore>,
        policy: MergePolicy,
        defaults: VaultDefaults,
    ) -> Self {
        Self {
            vault_writer: VaultWriter::new(vault.clone(), defaults),
            cluster_writer: ClusterSecretWriter::new(store.clone()),
            vault,
            store,
            policy,
        }
    }

    /// Sync one ASecret
    pub async fn sync(&self, asecret: &ASecret) -> Result<SyncOutcome, ReconcilerError> {
        let spec = &asecret.spec;
        let name = asecret.name_any();
        let namespace = asecret
            .namespace()
            .ok_or_else(|| ReconcilerError::Validation("ASecret has no namespace".to_string()))?;

        let next_delay = refresh_interval(spec).map_err(|e| {
            metrics::increment_duration_parsing_errors();
            ReconcilerError::Validation(format!("{e:#}"))
        })?;
        validate_asecret_spec(spec).map_err(|e| ReconcilerError::Validation(format!("{e:#}")))?;

        let vault = self.read_vault(spec).await?;

        let existing = self
            .store
            .get_secret(&namespace, &spec.target_secret_name)
            .await
            .map_err(|source| ReconcilerError::ClusterSecret {
                name: spec.target_secret_name.clone(),
                source,
            })?;
        let cluster = ClusterSecretState::from_secret(existing.as_ref());

        let target = merge(spec, &vault, &cluster, self.policy, self.store.as_ref())
            .await
            .map_err(merge_error)?;

        let (cluster_write, stored) = self
            .cluster_writer
            .write(asecret, &target, existing.as_ref())
            .await
            .map_err(|source| ReconcilerError::ClusterSecret {
                name: spec.target_secret_name.clone(),
                source,
            })?;

        let vault_write = self.write_vault(spec, &target, &vault).await?;

        let status = synced_status(
            asecret.status.as_ref(),
            asecret.metadata.generation,
            next_delay,
            Utc::now(),
        );
        self.store
            .patch_asecret_status(&namespace, &name, &status)
            .await
            .map_err(ReconcilerError::Status)?;

        Ok(SyncOutcome {
            next_delay,
            vault_write,
            cluster_write,
            secret_version: stored.metadata.resource_version,
            keys: target.keys().cloned().collect(),
        })
    }

    async fn read_vault(&self, spec: &ASecretSpec) -> Result<VaultSecretState, ReconcilerError> {
        let path = &spec.aws_secret_path;
        let payload = self
            .vault
            .get_secret(path)
            .await
            .map_err(|source| ReconcilerError::VaultRead {
                path: path.clone(),
                source,
            })?;

        let Some(payload) = payload else {
            info!(path = %path, "AWS secret not found");
            return Ok(VaultSecretState::missing());
        };

        let values = decode(Some(&payload), spec.value_type, &spec.data).map_err(|e| {
            if e.is_validation() {
                ReconcilerError::Validation(e.to_string())
            } else {
                ReconcilerError::VaultRead {
                    path: path.clone(),
                    source: e.into(),
                }
            }
        })?;

        debug!(path = %path, keys = values.len(), "Read AWS secret");
        Ok(VaultSecretState::found(values))
    }

    async fn write_vault(
        &self,
        spec: &ASecretSpec,
        target: &SecretValues,
        vault: &VaultSecretState,
    ) -> Result<Option<VaultWrite>, ReconcilerError> {
        if spec.import_only() {
            debug!(path = %spec.aws_secret_path, "onlyImportRemote set, AWS secret left unchanged");
            return Ok(None);
        }

        if !needs_vault_update(spec, target, vault) {
            debug!(path = %spec.aws_secret_path, "AWS secret key set unchanged");
            return Ok(None);
        }

        let path = spec.aws_secret_path.clone();
        match self.vault_writer.write(spec, target, vault.exists).await {
            Ok(write) => Ok(Some(write)),
            Err(VaultWriteError::Encode(e)) if e.is_validation() => {
                Err(ReconcilerError::Validation(e.to_string()))
            }
            Err(VaultWriteError::Tag(source)) => Err(ReconcilerError::VaultTag { path, source }),
            Err(e) => Err(ReconcilerError::VaultWrite {
                path,
                message: e.to_string(),
            }),
        }
    }
}

fn merge_error(e: MergeError) -> ReconcilerError {
    if e.is_validation() {
        ReconcilerError::Validation(e.to_string())
    } else {
        ReconcilerError::Generator(e.to_string())
    }
}
