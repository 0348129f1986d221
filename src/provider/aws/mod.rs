//! # AWS Secrets Manager Client
//!
//! `SecretVault` implementation backed by AWS Secrets Manager.
//!
//! Credentials come from the SDK's default chain (IRSA, environment, profile).
//! Region, custom endpoint and retry attempts come from `ControllerConfig`.

use crate::config::ControllerConfig;
use crate::controller::reconciler::codec::VaultPayload;
use crate::observability::metrics;
use crate::provider::SecretVault;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::primitives::Blob;
use aws_sdk_secretsmanager::types::Tag;
use aws_sdk_secretsmanager::Client as SecretsManagerClient;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// AWS Secrets Manager provider implementation
pub struct AwsSecretsManager {
    client: SecretsManagerClient,
    region: String,
}

impl std::fmt::Debug for AwsSecretsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsManager")
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl AwsSecretsManager {
    /// Create a new AWS Secrets Manager client
    #[allow(
        clippy::missing_errors_doc,
        reason = "Error documentation is provided in doc comments"
    )]
    pub async fn new(config: &ControllerConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::standard().with_max_attempts(config.aws_max_retries.max(1)));

        if let Some(region) = &config.aws_region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }

        if let Some(endpoint) = &config.aws_endpoint_url {
            info!("Using custom AWS endpoint: {}", endpoint);
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let region = sdk_config
            .region()
            .map(ToString::to_string)
            .context("AWS region not configured: set --aws-region, AWS_REGION or AWS_DEFAULT_REGION")?;

        info!(region = %region, "AWS Secrets Manager client configured");

        Ok(Self {
            client: SecretsManagerClient::new(&sdk_config),
            region,
        })
    }

    /// Verify credentials and endpoint by listing at most one secret
    pub async fn check_connectivity(&self) -> Result<()> {
        let start = Instant::now();
        self.client
            .list_secrets()
            .max_results(1)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to AWS Secrets Manager in region {}",
                    self.region
                )
            })?;
        info!(
            region = %self.region,
            duration_ms = start.elapsed().as_millis() as u64,
            "AWS Secrets Manager connectivity check passed"
        );
        Ok(())
    }

    fn to_tags(tags: &BTreeMap<String, String>) -> Vec<Tag> {
        tags.iter()
            .map(|(k, v)| Tag::builder().key(k).value(v).build())
            .collect()
    }
}

/// Record duration or error for one AWS call
fn observe<T>(operation: &str, start: Instant, result: &Result<T>) {
    match result {
        Ok(_) => metrics::record_vault_operation(operation, start.elapsed().as_secs_f64()),
        Err(e) => {
            metrics::increment_vault_operation_errors(operation);
            warn!(provider = "aws", operation, error = %format!("{e:#}"), "AWS Secrets Manager call failed");
        }
    }
}

#[async_trait]
impl SecretVault for AwsSecretsManager {
    async fn get_secret(&self, path: &str) -> Result<Option<VaultPayload>> {
        let span = info_span!("aws.secret.get", secret.path = path, region = %self.region);
        let start = Instant::now();

        let result = async {
            match self.client.get_secret_value().secret_id(path).send().await {
                Ok(output) => {
                    if let Some(text) = output.secret_string() {
                        Ok(Some(VaultPayload::Text(text.to_string())))
                    } else if let Some(blob) = output.secret_binary() {
                        Ok(Some(VaultPayload::Binary(blob.as_ref().to_vec())))
                    } else {
                        Err(anyhow::anyhow!("AWS secret {path} has no value"))
                    }
                }
                Err(e)
                    if e.as_service_error()
                        .is_some_and(|se| se.is_resource_not_found_exception()) =>
                {
                    debug!(path, "AWS secret not found");
                    Ok(None)
                }
                Err(e) => Err(anyhow::Error::new(e)
                    .context(format!("Failed to get AWS secret {path}"))),
            }
        }
        .instrument(span)
        .await;

        observe("get", start, &result);
        result
    }

    async fn describe_secret(&self, path: &str) -> Result<bool> {
        let span = info_span!("aws.secret.describe", secret.path = path, region = %self.region);
        let start = Instant::now();

        let result = async {
            match self.client.describe_secret().secret_id(path).send().await {
                Ok(_) => Ok(true),
                Err(e)
                    if e.as_service_error()
                        .is_some_and(|se| se.is_resource_not_found_exception()) =>
                {
                    Ok(false)
                }
                Err(e) => Err(anyhow::Error::new(e)
                    .context(format!("Failed to describe AWS secret {path}"))),
            }
        }
        .instrument(span)
        .await;

        observe("describe", start, &result);
        result
    }

    async fn create_secret(
        &self,
        path: &str,
        payload: &VaultPayload,
        tags: &BTreeMap<String, String>,
        kms_key_id: Option<&str>,
    ) -> Result<()> {
        let span = info_span!("aws.secret.create", secret.path = path, region = %self.region);
        let start = Instant::now();

        let mut request = self
            .client
            .create_secret()
            .name(path)
            .set_tags(Some(Self::to_tags(tags)));

        request = match payload {
            VaultPayload::Text(text) => request.secret_string(text),
            VaultPayload::Binary(bytes) => request.secret_binary(Blob::new(bytes.clone())),
        };

        if let Some(kms_key_id) = kms_key_id {
            request = request.kms_key_id(kms_key_id);
        }

        let result = request
            .send()
            .instrument(span)
            .await
            .map(|_| ())
            .with_context(|| format!("Failed to create AWS secret {path}"));

        observe("create", start, &result);
        result
    }

    async fn update_secret_value(&self, path: &str, payload: &VaultPayload) -> Result<()> {
        let span = info_span!("aws.secret.update", secret.path = path, region = %self.region);
        let start = Instant::now();

        let request = self.client.put_secret_value().secret_id(path);
        let request = match payload {
            VaultPayload::Text(text) => request.secret_string(text),
            VaultPayload::Binary(bytes) => request.secret_binary(Blob::new(bytes.clone())),
        };

        let result = request
            .send()
            .instrument(span)
            .await
            .map(|_| ())
            .with_context(|| format!("Failed to update AWS secret {path}"));

        observe("update", start, &result);
        result
    }

    async fn tag_secret(&self, path: &str, tags: &BTreeMap<String, String>) -> Result<()> {
        let span = info_span!("aws.secret.tag", secret.path = path, region = %self.region);
        let start = Instant::now();

        let result = self
            .client
            .tag_resource()
            .secret_id(path)
            .set_tags(Some(Self::to_tags(tags)))
            .send()
            .instrument(span)
            .await
            .map(|_| ())
            .with_context(|| format!("Failed to tag AWS secret {path}"));

        observe("tag", start, &result);
        result
    }
}
