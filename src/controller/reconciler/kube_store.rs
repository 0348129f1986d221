//! # Kubernetes Store
//!
//! Kubernetes API surface used by the reconciler.
//!
//! The trait keeps the sync driver independent of a live API server.

use crate::constants::FIELD_MANAGER;
use crate::controller::generator::GeneratorLookup;
use crate::crd::{AGenerator, AGeneratorSpec, AGeneratorStatus, ASecret, ASecretStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::Client;
use serde_json::json;

#[async_trait]
pub trait KubeStore: GeneratorLookup {
    /// Get a Secret, `None` when it does not exist
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>>;

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret>;

    /// Replace a Secret; the object's `resourceVersion` guards against concurrent writers
    async fn replace_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret>;

    async fn patch_asecret_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ASecretStatus,
    ) -> Result<()>;

    async fn patch_agenerator_status(&self, name: &str, status: &AGeneratorStatus) -> Result<()>;
}

/// `KubeStore` backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeApiStore {
    client: Client,
}

impl std::fmt::Debug for KubeApiStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeApiStore").finish_non_exhaustive()
    }
}

impl KubeApiStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GeneratorLookup for KubeApiStore {
    async fn get_generator(&self, name: &str) -> Result<Option<AGeneratorSpec>> {
        let api: Api<AGenerator> = Api::all(self.client.clone());
        let generator = api
            .get_opt(name)
            .await
            .with_context(|| format!("Failed to get AGenerator {name}"))?;
        Ok(generator.map(|g| g.spec))
    }
}

#[async_trait]
impl KubeStore for KubeApiStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name)
            .await
            .with_context(|| format!("Failed to get Secret {namespace}/{name}"))
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), secret)
            .await
            .with_context(|| {
                format!(
                    "Failed to create Secret {namespace}/{}",
                    secret.metadata.name.as_deref().unwrap_or_default()
                )
            })
    }

    async fn replace_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret> {
        let name = secret
            .metadata
            .name
            .as_deref()
            .context("Secret has no name")?;
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.replace(name, &PostParams::default(), secret)
            .await
            .with_context(|| format!("Failed to update Secret {namespace}/{name}"))
    }

    async fn patch_asecret_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ASecretStatus,
    ) -> Result<()> {
        let api: Api<ASecret> = Api::namespaced(self.client.clone(), namespace);
        api.patch_status(
            name,
            &PatchParams::apply(FIELD_MANAGER),
            &Patch::Merge(json!({ "status": status })),
        )
        .await
        .with_context(|| format!("Failed to update status of ASecret {namespace}/{name}"))?;
        Ok(())
    }

    async fn patch_agenerator_status(&self, name: &str, status: &AGeneratorStatus) -> Result<()> {
        let api: Api<AGenerator> = Api::all(self.client.clone());
        api.patch_status(
            name,
            &PatchParams::apply(FIELD_MANAGER),
            &Patch::Merge(json!({ "status": status })),
        )
        .await
        .with_context(|| format!("Failed to update status of AGenerator {name}"))?;
        Ok(())
    }
}
