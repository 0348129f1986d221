//! # Error Policy
//!
//! Requeue decisions for failed reconciliations and handling of watch stream errors.
//!
//! | Error | Requeue |
//! |-------|---------|
//! | AWS read failure | fixed short delay (30s) |
//! | Invalid resource | the resource's refresh interval |
//! | Anything else | error requeue (60s) |

use crate::controller::reconciler::validation::refresh_interval;
use crate::controller::reconciler::{Reconciler, ReconcilerError, TriggerSource};
use crate::crd::{AGenerator, ASecret};
use crate::observability;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn, Instrument};

/// Delay and trigger source for the retry after `error`
#[must_use]
pub fn requeue_for(
    asecret: &ASecret,
    error: &ReconcilerError,
    error_requeue: Duration,
    vault_read_error_requeue: Duration,
) -> (Duration, TriggerSource) {
    match error {
        ReconcilerError::VaultRead { .. } => (vault_read_error_requeue, TriggerSource::VaultReadRetry),
        // Never faster than the normal cycle; an unparsable interval falls back to the default
        ReconcilerError::Validation(_) => (
            refresh_interval(&asecret.spec).unwrap_or_else(|_| {
                Duration::from_secs(crate::constants::DEFAULT_REFRESH_INTERVAL_SECS)
            }),
            TriggerSource::InvalidResource,
        ),
        _ => (error_requeue, TriggerSource::RetryAfterError),
    }
}

/// Handle ASecret reconciliation errors
pub fn handle_reconciliation_error(
    obj: Arc<ASecret>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        reason = error.reason()
    );
    let _error_guard = error_span.enter();

    if error.is_retryable() {
        error!(error = %error, "Reconciliation failed for {}/{}", namespace, name);
    } else {
        warn!(error = %error, "ASecret {}/{} is invalid", namespace, name);
    }
    observability::metrics::increment_reconciliation_errors(error.reason());

    let (delay, trigger) =
        requeue_for(&obj, error, ctx.error_requeue, ctx.vault_read_error_requeue);
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
    info!(
        trigger_source = trigger.as_str(),
        "Next attempt scheduled: {} (in {}s)",
        next_trigger_time.to_rfc3339(),
        delay.as_secs()
    );

    observability::metrics::increment_requeues_total(trigger.as_str());
    Action::requeue(delay)
}

/// Handle AGenerator reconciliation errors
pub fn handle_generator_error(
    obj: Arc<AGenerator>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    error!(
        generator = %obj.name_any(),
        error = %error,
        "AGenerator reconciliation failed"
    );
    observability::metrics::increment_reconciliation_errors(error.reason());
    observability::metrics::increment_requeues_total(TriggerSource::RetryAfterError.as_str());
    Action::requeue(ctx.error_requeue)
}

/// Handle watch stream errors
///
/// Expired resource versions restart immediately; throttling and auth failures
/// wait before the stream is polled again.
pub async fn handle_watch_stream_error(error_string: &str, watch_restart_delay: Duration) {
    let error_span = tracing::span!(
        tracing::Level::WARN,
        "controller.watch.error",
        error = %error_string
    );

    let is_410 = error_string.contains("410")
        || error_string.contains("too old resource version")
        || error_string.contains("Expired");
    let is_401 = error_string.contains("401") || error_string.contains("Unauthorized");
    let is_429 = error_string.contains("429") || error_string.contains("TooManyRequests");

    async {
        if is_410 {
            warn!("Watch resource version expired (410), watch will restart");
            return;
        }
        if is_401 {
            error!("Watch authentication failed (401 Unauthorized), check the controller's RBAC");
        } else if is_429 {
            warn!(
                "API server throttling (429), backing off for {}s",
                watch_restart_delay.as_secs()
            );
        } else {
            error!("Controller stream error: {}", error_string);
        }
        tokio::time::sleep(watch_restart_delay).await;
    }
    .instrument(error_span)
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reconciler::codec::ValueType;
    use crate::crd::ASecretSpec;
    use std::collections::BTreeMap;

    const ERROR_REQUEUE: Duration = Duration::from_secs(60);
    const VAULT_READ_REQUEUE: Duration = Duration::from_secs(30);

    fn asecret(refresh: Option<&str>) -> ASecret {
        ASecret::new(
            "db",
            ASecretSpec {
                target_secret_name: "db-credentials".to_string(),
                aws_secret_path: "/prod/db".to_string(),
                kms_key_id: None,
                data: BTreeMap::new(),
                tags: BTreeMap::new(),
                only_import_remote: None,
                value_type: ValueType::Kv,
                refresh_interval: refresh.map(ToString::to_string),
                target_secret_template: None,
            },
        )
    }

    #[test]
    fn test_vault_read_uses_short_retry() {
        let error = ReconcilerError::VaultRead {
            path: "/prod/db".to_string(),
            source: anyhow::anyhow!("throttled"),
        };

        let (delay, trigger) =
            requeue_for(&asecret(Some("10m")), &error, ERROR_REQUEUE, VAULT_READ_REQUEUE);

        assert_eq!(delay, VAULT_READ_REQUEUE);
        assert_eq!(trigger, TriggerSource::VaultReadRetry);
    }

    #[test]
    fn test_validation_waits_for_refresh_interval() {
        let error = ReconcilerError::Validation("bad key".to_string());

        let (delay, trigger) =
            requeue_for(&asecret(Some("10m")), &error, ERROR_REQUEUE, VAULT_READ_REQUEUE);
        assert_eq!(delay, Duration::from_secs(600));
        assert_eq!(trigger, TriggerSource::InvalidResource);

        let (delay, _) =
            requeue_for(&asecret(Some("soon")), &error, ERROR_REQUEUE, VAULT_READ_REQUEUE);
        assert_eq!(delay, Duration::from_secs(3600));
    }

    #[test]
    fn test_other_errors_use_error_requeue() {
        let error = ReconcilerError::Generator("generator 'pw' not found".to_string());

        let (delay, trigger) = requeue_for(&asecret(None), &error, ERROR_REQUEUE, VAULT_READ_REQUEUE);

        assert_eq!(delay, ERROR_REQUEUE);
        assert_eq!(trigger, TriggerSource::RetryAfterError);
    }
}
