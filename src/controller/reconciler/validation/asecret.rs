//! # ASecret Validation
//!
//! Checks an ASecret before any store is read or written.

use super::duration::parse_kubernetes_duration;
use crate::constants::DEFAULT_REFRESH_INTERVAL_SECS;
use crate::controller::reconciler::codec::ValueType;
use crate::crd::ASecretSpec;
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static SECRET_KEY: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[-._a-zA-Z0-9]+$"));

static KUBERNETES_NAME: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
});

/// Validate an ASecret spec
pub fn validate_asecret_spec(spec: &ASecretSpec) -> Result<()> {
    validate_kubernetes_name(&spec.target_secret_name, "targetSecretName")?;

    if spec.aws_secret_path.trim().is_empty() {
        return Err(anyhow::anyhow!("awsSecretPath cannot be empty"));
    }

    let key_regex = SECRET_KEY
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;
    for key in spec.data.keys() {
        if key.len() > 253 || !key_regex.is_match(key) {
            return Err(anyhow::anyhow!(
                "data key '{key}' must consist of alphanumeric characters, '-', '_' or '.'"
            ));
        }
    }

    if spec.value_type == ValueType::Binary {
        let owned = spec.data.values().filter(|source| !source.import_only()).count();
        if owned > 1 {
            return Err(anyhow::anyhow!(
                "valueType binary supports at most one non-import-only data key, got {owned}"
            ));
        }
    }

    refresh_interval(spec)?;

    Ok(())
}

/// Delay until the next scheduled sync
///
/// Unset or zero intervals use the one hour default.
pub fn refresh_interval(spec: &ASecretSpec) -> Result<Duration> {
    let default = Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS);
    let Some(interval) = spec.refresh_interval.as_deref() else {
        return Ok(default);
    };

    let duration = parse_kubernetes_duration(interval)
        .map_err(|e| anyhow::anyhow!("Invalid refreshInterval: {e}"))?;

    Ok(if duration.is_zero() { default } else { duration })
}

/// Validate Kubernetes resource name (RFC 1123 subdomain)
fn validate_kubernetes_name(name: &str, field_name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(anyhow::anyhow!("{field_name} cannot be empty"));
    }

    if name.len() > 253 {
        return Err(anyhow::anyhow!(
            "{field_name} '{name}' exceeds maximum length of 253 characters (got {})",
            name.len()
        ));
    }

    let name_regex = KUBERNETES_NAME
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;
    if !name_regex.is_match(name) {
        return Err(anyhow::anyhow!(
            "{field_name} '{name}' must be a valid Kubernetes name (lowercase alphanumeric, hyphens, dots; cannot start/end with hyphen or dot)"
        ));
    }

    Ok(())
}
