//! # Merge Engine
//!
//! Computes the target value-set for one ASecret from the AWS secret, the
//! existing Kubernetes Secret and the declared keys.
//!
//! ## Priority
//!
//! AWS Secrets Manager > Kubernetes Secret > declared value/generator.
//! Declared values only fill keys that neither store has; import-only keys
//! are never created.

use crate::controller::generator::{generate_random_string, GeneratorError, GeneratorLookup};
use crate::controller::reconciler::codec::{SecretValues, ValueType};
use crate::crd::ASecretSpec;
use crate::observability::metrics;
use k8s_openapi::api::core::v1::Secret;
use thiserror::Error;
use tracing::debug;

/// Values read from AWS Secrets Manager in this cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VaultSecretState {
    pub exists: bool,
    pub values: SecretValues,
}

impl VaultSecretState {
    #[must_use]
    pub fn missing() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn found(values: SecretValues) -> Self {
        Self {
            exists: true,
            values,
        }
    }
}

/// Values of the managed Kubernetes Secret in this cycle
///
/// Secret metadata is carried over by the cluster writer, not merged here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterSecretState {
    pub exists: bool,
    pub values: SecretValues,
}

impl ClusterSecretState {
    #[must_use]
    pub fn from_secret(secret: Option<&Secret>) -> Self {
        let Some(secret) = secret else {
            return Self::default();
        };

        Self {
            exists: true,
            values: secret
                .data
                .as_ref()
                .map(|data| {
                    data.iter()
                        .map(|(k, v)| (k.clone(), v.0.clone()))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// Controller-wide merge settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergePolicy {
    /// Drop keys that are not declared in `spec.data`
    pub remove_remote_keys: bool,
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("generator '{generator}' referenced by key '{key}' not found")]
    GeneratorNotFound { key: String, generator: String },
    #[error("failed to get generator '{generator}' for key '{key}': {source:#}")]
    GeneratorLookup {
        key: String,
        generator: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("generator '{generator}' for key '{key}' is invalid: {source}")]
    InvalidGenerator {
        key: String,
        generator: String,
        #[source]
        source: GeneratorError,
    },
    #[error("binary value type supports at most one key, got {0}")]
    BinaryCardinality(usize),
}

impl MergeError {
    /// Errors the ASecret or AGenerator author has to fix
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MergeError::InvalidGenerator { .. } | MergeError::BinaryCardinality(_)
        )
    }
}

/// Compute the target value-set
///
/// All-or-nothing: nothing is returned unless every referenced generator resolves.
pub async fn merge<G>(
    spec: &ASecretSpec,
    vault: &VaultSecretState,
    cluster: &ClusterSecretState,
    policy: MergePolicy,
    generators: &G,
) -> Result<SecretValues, MergeError>
where
    G: GeneratorLookup + ?Sized,
{
    if spec.import_only() {
        let target = if vault.exists {
            vault.values.clone()
        } else {
            SecretValues::new()
        };
        check_binary_cardinality(&target, spec.value_type)?;
        return Ok(target);
    }

    let mut target = if cluster.exists {
        cluster.values.clone()
    } else {
        SecretValues::new()
    };

    if vault.exists {
        target.extend(vault.values.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    if policy.remove_remote_keys {
        prune_undeclared_keys(spec, &mut target);
    }

    for (key, source) in &spec.data {
        if source.import_only() || target.contains_key(key) {
            continue;
        }

        if let Some(value) = source.value.as_deref().filter(|v| !v.is_empty()) {
            target.insert(key.clone(), value.as_bytes().to_vec());
            continue;
        }

        if let Some(reference) = &source.generator_ref {
            let generated = resolve_generated_value(key, &reference.name, generators).await?;
            target.insert(key.clone(), generated.into_bytes());
        }
    }

    check_binary_cardinality(&target, spec.value_type)?;
    Ok(target)
}

/// Remove every key that is not declared in `spec.data`
fn prune_undeclared_keys(spec: &ASecretSpec, target: &mut SecretValues) {
    let before = target.len();
    target.retain(|key, _| spec.data.contains_key(key));
    let pruned = before - target.len();
    if pruned > 0 {
        debug!(pruned, "Pruned undeclared keys");
        metrics::increment_pruned_keys(pruned as u64);
    }
}

async fn resolve_generated_value<G>(
    key: &str,
    generator: &str,
    generators: &G,
) -> Result<String, MergeError>
where
    G: GeneratorLookup + ?Sized,
{
    let spec = generators
        .get_generator(generator)
        .await
        .map_err(|source| MergeError::GeneratorLookup {
            key: key.to_string(),
            generator: generator.to_string(),
            source,
        })?
        .ok_or_else(|| MergeError::GeneratorNotFound {
            key: key.to_string(),
            generator: generator.to_string(),
        })?;

    let value = generate_random_string(&spec).map_err(|source| MergeError::InvalidGenerator {
        key: key.to_string(),
        generator: generator.to_string(),
        source,
    })?;

    debug!(key, generator, "Generated value");
    metrics::increment_generated_values();
    Ok(value)
}

fn check_binary_cardinality(target: &SecretValues, value_type: ValueType) -> Result<(), MergeError> {
    if value_type == ValueType::Binary && target.len() > 1 {
        return Err(MergeError::BinaryCardinality(target.len()));
    }
    Ok(())
}
