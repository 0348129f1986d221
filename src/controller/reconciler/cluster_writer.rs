//! # Cluster Secret Writer
//!
//! Creates or updates the Kubernetes Secret managed by an ASecret.

use crate::controller::reconciler::codec::SecretValues;
use crate::controller::reconciler::kube_store::KubeStore;
use crate::crd::ASecret;
use crate::observability::metrics;
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::{Resource, ResourceExt};
use std::sync::Arc;
use tracing::info;

const OPAQUE: &str = "Opaque";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterSecretWrite {
    Created,
    Updated,
}

impl ClusterSecretWrite {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterSecretWrite::Created => "create",
            ClusterSecretWrite::Updated => "update",
        }
    }
}

/// Build the desired Secret from the target value-set
///
/// A new Secret is owned by the ASecret. An existing one keeps its metadata
/// (including `resourceVersion`) with template labels and annotations merged on top.
pub fn build_cluster_secret(
    asecret: &ASecret,
    target: &SecretValues,
    existing: Option<&Secret>,
) -> Secret {
    let template = asecret.spec.target_secret_template.as_ref();

    let mut secret = match existing {
        Some(existing) => existing.clone(),
        None => Secret {
            metadata: ObjectMeta {
                name: Some(asecret.spec.target_secret_name.clone()),
                namespace: asecret.namespace(),
                owner_references: asecret.controller_owner_ref(&()).map(|owner| vec![owner]),
                ..ObjectMeta::default()
            },
            type_: Some(OPAQUE.to_string()),
            ..Secret::default()
        },
    };

    secret.data = Some(
        target
            .iter()
            .map(|(k, v)| (k.clone(), ByteString(v.clone())))
            .collect(),
    );
    secret.string_data = None;

    if let Some(template) = template {
        if let Some(labels) = &template.labels {
            secret
                .metadata
                .labels
                .get_or_insert_with(Default::default)
                .extend(labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(annotations) = &template.annotations {
            secret
                .metadata
                .annotations
                .get_or_insert_with(Default::default)
                .extend(annotations.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        secret.type_ = Some(template.r#type.clone().unwrap_or_else(|| OPAQUE.to_string()));
    }

    secret
}

pub struct ClusterSecretWriter {
    store: Arc<dyn KubeStore>,
}

impl std::fmt::Debug for ClusterSecretWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterSecretWriter").finish_non_exhaustive()
    }
}

impl ClusterSecretWriter {
    pub fn new(store: Arc<dyn KubeStore>) -> Self {
        Self { store }
    }

    /// Create or replace the managed Secret, returning the stored object
    pub async fn write(
        &self,
        asecret: &ASecret,
        target: &SecretValues,
        existing: Option<&Secret>,
    ) -> Result<(ClusterSecretWrite, Secret)> {
        let namespace = asecret
            .namespace()
            .context("ASecret has no namespace")?;
        let secret = build_cluster_secret(asecret, target, existing);
        let name = &asecret.spec.target_secret_name;

        let (write, stored) = if existing.is_some() {
            let stored = self.store.replace_secret(&namespace, &secret).await?;
            (ClusterSecretWrite::Updated, stored)
        } else {
            let stored = self.store.create_secret(&namespace, &secret).await?;
            (ClusterSecretWrite::Created, stored)
        };

        metrics::increment_cluster_secret_writes(write.as_str());
        info!(
            secret = %name,
            namespace = %namespace,
            keys = target.len(),
            operation = write.as_str(),
            "Wrote Kubernetes Secret"
        );
        Ok((write, stored))
    }
}
