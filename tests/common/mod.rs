//! Common test utilities for sync tests
//!
//! In-memory `SecretVault` and `KubeStore` implementations that record every
//! call, plus builders for ASecret fixtures.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use secret_sync_controller::controller::generator::GeneratorLookup;
use secret_sync_controller::controller::reconciler::codec::{ValueType, VaultPayload};
use secret_sync_controller::controller::reconciler::merge::MergePolicy;
use secret_sync_controller::controller::reconciler::vault_writer::VaultDefaults;
use secret_sync_controller::controller::reconciler::{KubeStore, SecretSyncer};
use secret_sync_controller::crd::{
    AGeneratorSpec, AGeneratorStatus, ASecret, ASecretSpec, ASecretStatus, DataSource,
    GeneratorReference,
};
use secret_sync_controller::provider::SecretVault;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

pub const NAMESPACE: &str = "apps";

/// One recorded vault call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultCall {
    Get(String),
    Describe(String),
    Create {
        path: String,
        tags: BTreeMap<String, String>,
        kms_key_id: Option<String>,
    },
    Update(String),
    Tag {
        path: String,
        tags: BTreeMap<String, String>,
    },
}

impl VaultCall {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            VaultCall::Create { .. } | VaultCall::Update(_) | VaultCall::Tag { .. }
        )
    }
}

/// In-memory AWS Secrets Manager
#[derive(Debug, Default)]
pub struct FakeVault {
    pub secrets: Mutex<BTreeMap<String, VaultPayload>>,
    pub calls: Mutex<Vec<VaultCall>>,
    pub fail_get: Mutex<Option<String>>,
    pub fail_tag: Mutex<Option<String>>,
}

impl FakeVault {
    pub fn with_text(path: &str, json: &str) -> Self {
        let vault = Self::default();
        vault
            .secrets
            .lock()
            .unwrap()
            .insert(path.to_string(), VaultPayload::Text(json.to_string()));
        vault
    }

    pub fn calls(&self) -> Vec<VaultCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<VaultCall> {
        self.calls().into_iter().filter(VaultCall::is_write).collect()
    }

    /// Stored payload decoded as a flat JSON object
    pub fn stored_json(&self, path: &str) -> BTreeMap<String, String> {
        match self.secrets.lock().unwrap().get(path) {
            Some(VaultPayload::Text(text)) => serde_json::from_str(text).unwrap(),
            other => panic!("expected a text payload at {path}, got {other:?}"),
        }
    }

    fn record(&self, call: VaultCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SecretVault for FakeVault {
    async fn get_secret(&self, path: &str) -> Result<Option<VaultPayload>> {
        self.record(VaultCall::Get(path.to_string()));
        if let Some(message) = self.fail_get.lock().unwrap().clone() {
            bail!(message);
        }
        Ok(self.secrets.lock().unwrap().get(path).cloned())
    }

    async fn describe_secret(&self, path: &str) -> Result<bool> {
        self.record(VaultCall::Describe(path.to_string()));
        Ok(self.secrets.lock().unwrap().contains_key(path))
    }

    async fn create_secret(
        &self,
        path: &str,
        payload: &VaultPayload,
        tags: &BTreeMap<String, String>,
        kms_key_id: Option<&str>,
    ) -> Result<()> {
        self.record(VaultCall::Create {
            path: path.to_string(),
            tags: tags.clone(),
            kms_key_id: kms_key_id.map(ToString::to_string),
        });
        let mut secrets = self.secrets.lock().unwrap();
        if secrets.contains_key(path) {
            bail!("ResourceExistsException: {path}");
        }
        secrets.insert(path.to_string(), payload.clone());
        Ok(())
    }

    async fn update_secret_value(&self, path: &str, payload: &VaultPayload) -> Result<()> {
        self.record(VaultCall::Update(path.to_string()));
        let mut secrets = self.secrets.lock().unwrap();
        let Some(slot) = secrets.get_mut(path) else {
            bail!("ResourceNotFoundException: {path}");
        };
        *slot = payload.clone();
        Ok(())
    }

    async fn tag_secret(&self, path: &str, tags: &BTreeMap<String, String>) -> Result<()> {
        self.record(VaultCall::Tag {
            path: path.to_string(),
            tags: tags.clone(),
        });
        if let Some(message) = self.fail_tag.lock().unwrap().clone() {
            bail!(message);
        }
        Ok(())
    }
}

/// In-memory Kubernetes API
#[derive(Debug, Default)]
pub struct FakeKube {
    pub secrets: Mutex<BTreeMap<(String, String), Secret>>,
    pub generators: Mutex<BTreeMap<String, AGeneratorSpec>>,
    pub asecret_statuses: Mutex<Vec<(String, String, ASecretStatus)>>,
    pub agenerator_statuses: Mutex<Vec<(String, AGeneratorStatus)>>,
    pub secret_writes: Mutex<usize>,
    /// Another writer bumps the Secret right after it is read
    pub edit_after_read: Mutex<bool>,
}

impl FakeKube {
    pub fn with_generator(self, name: &str, spec: AGeneratorSpec) -> Self {
        self.generators
            .lock()
            .unwrap()
            .insert(name.to_string(), spec);
        self
    }

    /// Seed a Secret in `NAMESPACE`
    pub fn with_secret(self, name: &str, data: &[(&str, &str)]) -> Self {
        let mut secret = Secret::default();
        secret.metadata.name = Some(name.to_string());
        secret.metadata.namespace = Some(NAMESPACE.to_string());
        secret.metadata.resource_version = Some("1".to_string());
        secret.data = Some(
            data.iter()
                .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
                .collect(),
        );
        self.secrets
            .lock()
            .unwrap()
            .insert((NAMESPACE.to_string(), name.to_string()), secret);
        self
    }

    pub fn secret(&self, name: &str) -> Option<Secret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(NAMESPACE.to_string(), name.to_string()))
            .cloned()
    }

    /// Data of a stored Secret as UTF-8 strings
    pub fn secret_data(&self, name: &str) -> BTreeMap<String, String> {
        self.secret(name)
            .and_then(|s| s.data)
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, String::from_utf8(v.0).unwrap()))
            .collect()
    }

    pub fn secret_write_count(&self) -> usize {
        *self.secret_writes.lock().unwrap()
    }

    pub fn last_status(&self) -> Option<ASecretStatus> {
        self.asecret_statuses
            .lock()
            .unwrap()
            .last()
            .map(|(_, _, status)| status.clone())
    }
}

fn key(namespace: &str, secret: &Secret) -> Result<(String, String)> {
    let name = secret
        .metadata
        .name
        .clone()
        .ok_or_else(|| anyhow!("Secret has no name"))?;
    Ok((namespace.to_string(), name))
}

#[async_trait]
impl GeneratorLookup for FakeKube {
    async fn get_generator(&self, name: &str) -> Result<Option<AGeneratorSpec>> {
        Ok(self.generators.lock().unwrap().get(name).cloned())
    }
}

#[async_trait]
impl KubeStore for FakeKube {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>> {
        let mut secrets = self.secrets.lock().unwrap();
        let Some(stored) = secrets.get_mut(&(namespace.to_string(), name.to_string())) else {
            return Ok(None);
        };
        let read = stored.clone();
        if *self.edit_after_read.lock().unwrap() {
            let next = stored
                .metadata
                .resource_version
                .as_deref()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
                + 1;
            stored.metadata.resource_version = Some(next.to_string());
        }
        Ok(Some(read))
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret> {
        let key = key(namespace, secret)?;
        let mut secrets = self.secrets.lock().unwrap();
        if secrets.contains_key(&key) {
            bail!("secrets \"{}\" already exists", key.1);
        }
        let mut stored = secret.clone();
        stored.metadata.resource_version = Some("1".to_string());
        secrets.insert(key, stored.clone());
        *self.secret_writes.lock().unwrap() += 1;
        Ok(stored)
    }

    async fn replace_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret> {
        let key = key(namespace, secret)?;
        let mut secrets = self.secrets.lock().unwrap();
        let Some(current) = secrets.get(&key) else {
            bail!("secrets \"{}\" not found", key.1);
        };
        if current.metadata.resource_version != secret.metadata.resource_version {
            bail!("the object has been modified; please apply your changes to the latest version");
        }
        let next = current
            .metadata
            .resource_version
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            + 1;
        let mut stored = secret.clone();
        stored.metadata.resource_version = Some(next.to_string());
        secrets.insert(key, stored.clone());
        *self.secret_writes.lock().unwrap() += 1;
        Ok(stored)
    }

    async fn patch_asecret_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ASecretStatus,
    ) -> Result<()> {
        self.asecret_statuses.lock().unwrap().push((
            namespace.to_string(),
            name.to_string(),
            status.clone(),
        ));
        Ok(())
    }

    async fn patch_agenerator_status(&self, name: &str, status: &AGeneratorStatus) -> Result<()> {
        self.agenerator_statuses
            .lock()
            .unwrap()
            .push((name.to_string(), status.clone()));
        Ok(())
    }
}

pub fn default_tags() -> BTreeMap<String, String> {
    BTreeMap::from([("managed-by".to_string(), "yaso".to_string())])
}

pub fn syncer(vault: &Arc<FakeVault>, kube: &Arc<FakeKube>, remove_remote_keys: bool) -> SecretSyncer {
    let vault: Arc<dyn SecretVault> = vault.clone();
    let kube: Arc<dyn KubeStore> = kube.clone();
    SecretSyncer::new(
        vault,
        kube,
        MergePolicy { remove_remote_keys },
        VaultDefaults {
            kms_key_id: None,
            tags: default_tags(),
        },
    )
}

pub fn literal(value: &str) -> DataSource {
    DataSource {
        value: Some(value.to_string()),
        ..DataSource::default()
    }
}

pub fn generated(generator: &str) -> DataSource {
    DataSource {
        generator_ref: Some(GeneratorReference {
            name: generator.to_string(),
        }),
        ..DataSource::default()
    }
}

pub fn import_only() -> DataSource {
    DataSource {
        only_import_remote: Some(true),
        ..DataSource::default()
    }
}

pub fn spec(path: &str, data: Vec<(&str, DataSource)>) -> ASecretSpec {
    ASecretSpec {
        target_secret_name: "app-secret".to_string(),
        aws_secret_path: path.to_string(),
        kms_key_id: None,
        data: data
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
        tags: BTreeMap::new(),
        only_import_remote: None,
        value_type: ValueType::Kv,
        refresh_interval: None,
        target_secret_template: None,
    }
}

pub fn asecret(spec: ASecretSpec) -> ASecret {
    let mut asecret = ASecret::new("app", spec);
    asecret.metadata.namespace = Some(NAMESPACE.to_string());
    asecret.metadata.uid = Some("5b0d2c5e-app".to_string());
    asecret.metadata.generation = Some(1);
    asecret
}

pub fn generator(length: u32) -> AGeneratorSpec {
    AGeneratorSpec {
        length,
        ..AGeneratorSpec::default()
    }
}
