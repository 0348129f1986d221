//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.
//!
//! Every setting has a default. Environment variables are populated from a
//! ConfigMap using `envFrom` in the deployment; CLI flags win over both.

use crate::controller::reconciler::merge::MergePolicy;
use crate::controller::reconciler::vault_writer::VaultDefaults;
use clap::Parser;
use std::collections::BTreeMap;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "plain" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Command-line flags of the controller binary
///
/// Unset flags fall back to the environment.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "secret-sync-controller")]
#[command(about = "Keeps ASecret values in sync between AWS Secrets Manager and Kubernetes Secrets")]
pub struct CliArgs {
    /// AWS region to use
    #[arg(long)]
    pub aws_region: Option<String>,
    /// Custom AWS endpoint URL (e.g. LocalStack)
    #[arg(long)]
    pub aws_endpoint: Option<String>,
    /// Maximum number of AWS API attempts
    #[arg(long)]
    pub aws_max_retries: Option<u32>,
    /// Port for /metrics, /healthz and /readyz
    #[arg(long)]
    pub metrics_port: Option<u16>,
    /// Drop Secret keys that are no longer declared in the ASecret
    #[arg(long)]
    pub remove_remote_keys: bool,
    /// KMS key used for new AWS secrets when the ASecret sets none
    #[arg(long)]
    pub default_kms_key_id: Option<String>,
    /// Skip the AWS connectivity check at startup
    #[arg(long)]
    pub skip_connectivity_check: bool,
    /// Log format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

/// Controller-level configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// AWS region; falls back to the SDK's own discovery when unset
    pub aws_region: Option<String>,
    /// Custom AWS endpoint URL
    pub aws_endpoint_url: Option<String>,
    /// Maximum AWS SDK attempts per call
    pub aws_max_retries: u32,
    /// Tags applied to every AWS secret (`AWS_TAG_<KEY>=<value>`)
    pub aws_tags: BTreeMap<String, String>,
    /// KMS key used when an ASecret sets none
    pub default_kms_key_id: Option<String>,
    /// Prune undeclared keys from managed Secrets
    pub remove_remote_keys: bool,
    /// HTTP server port
    pub metrics_port: u16,
    /// Requeue interval after a failed reconciliation (seconds)
    pub reconciliation_error_requeue_secs: u64,
    /// Requeue interval after a failed AWS read (seconds)
    pub vault_read_error_requeue_secs: u64,
    /// Watch stream restart delay (seconds)
    pub watch_restart_delay_secs: u64,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Skip the startup `ListSecrets` probe
    pub skip_connectivity_check: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            aws_region: None,
            aws_endpoint_url: None,
            aws_max_retries: DEFAULT_AWS_MAX_RETRIES,
            aws_tags: default_tags(),
            default_kms_key_id: None,
            remove_remote_keys: false,
            metrics_port: DEFAULT_METRICS_PORT,
            reconciliation_error_requeue_secs: DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            vault_read_error_requeue_secs: DEFAULT_VAULT_READ_ERROR_REQUEUE_SECS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            log_level: "INFO".to_string(),
            log_format: LogFormat::Json,
            skip_connectivity_check: false,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            aws_region: env_var_opt("AWS_REGION").or_else(|| env_var_opt("AWS_DEFAULT_REGION")),
            aws_endpoint_url: env_var_opt("AWS_ENDPOINT_URL"),
            aws_max_retries: env_var_or_default("AWS_MAX_RETRIES", DEFAULT_AWS_MAX_RETRIES),
            aws_tags: tags_from_vars(std::env::vars()),
            default_kms_key_id: env_var_opt("DEFAULT_KMS_KEY_ID"),
            remove_remote_keys: env_var_or_default_bool("REMOVE_REMOTE_KEYS", false),
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            reconciliation_error_requeue_secs: env_var_or_default(
                "RECONCILIATION_ERROR_REQUEUE_SECS",
                DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            ),
            vault_read_error_requeue_secs: env_var_or_default(
                "VAULT_READ_ERROR_REQUEUE_SECS",
                DEFAULT_VAULT_READ_ERROR_REQUEUE_SECS,
            ),
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            log_level: env_var_or_default_str("LOG_LEVEL", "INFO"),
            log_format: env_var_or_default("LOG_FORMAT", LogFormat::Json),
            skip_connectivity_check: env_var_or_default_bool("SKIP_CONNECTIVITY_CHECK", false),
        }
    }

    /// Apply command-line flags on top of this configuration
    #[must_use]
    pub fn with_cli(mut self, args: &CliArgs) -> Self {
        if let Some(region) = &args.aws_region {
            self.aws_region = Some(region.clone());
        }
        if let Some(endpoint) = &args.aws_endpoint {
            self.aws_endpoint_url = Some(endpoint.clone());
        }
        if let Some(retries) = args.aws_max_retries {
            self.aws_max_retries = retries;
        }
        if let Some(port) = args.metrics_port {
            self.metrics_port = port;
        }
        if let Some(kms_key_id) = &args.default_kms_key_id {
            self.default_kms_key_id = Some(kms_key_id.clone());
        }
        if let Some(format) = args.log_format {
            self.log_format = format;
        }
        self.remove_remote_keys |= args.remove_remote_keys;
        self.skip_connectivity_check |= args.skip_connectivity_check;
        self
    }

    /// Merge settings for the merge engine
    #[must_use]
    pub fn merge_policy(&self) -> MergePolicy {
        MergePolicy {
            remove_remote_keys: self.remove_remote_keys,
        }
    }

    /// Defaults for AWS secret writes
    #[must_use]
    pub fn vault_defaults(&self) -> VaultDefaults {
        VaultDefaults {
            kms_key_id: self.default_kms_key_id.clone(),
            tags: self.aws_tags.clone(),
        }
    }

    /// Get reconciliation error requeue duration
    pub fn reconciliation_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.reconciliation_error_requeue_secs)
    }

    /// Get AWS read error requeue duration
    pub fn vault_read_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.vault_read_error_requeue_secs)
    }

    /// Get watch restart delay duration
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }
}

fn default_tags() -> BTreeMap<String, String> {
    let (key, value) = crate::constants::DEFAULT_MANAGED_BY_TAG;
    BTreeMap::from([(key.to_string(), value.to_string())])
}

/// Default tags plus every `AWS_TAG_<KEY>=<value>` variable, keys lower-cased
fn tags_from_vars(vars: impl Iterator<Item = (String, String)>) -> BTreeMap<String, String> {
    let mut tags = default_tags();
    for (name, value) in vars {
        if let Some(key) = name.strip_prefix(crate::constants::AWS_TAG_ENV_PREFIX) {
            if !key.is_empty() {
                tags.insert(key.to_lowercase(), value);
            }
        }
    }
    tags
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read a non-empty environment variable
fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
