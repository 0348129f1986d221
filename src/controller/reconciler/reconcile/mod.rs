//! # Reconciliation Logic
//!
//! Entry points invoked by the controller runtime for ASecret and AGenerator
//! resources. Errors are turned into requeues by `runtime::error_policy`.
//!
//! Writing status re-triggers the watch. An ASecret whose last sync is still
//! current (same generation, next sync not reached, managed Secret untouched)
//! is requeued for the remaining time instead of being synced again.

use crate::controller::generator::validate_generator_spec;
use crate::controller::reconciler::status::{failed_status, generator_status};
use crate::controller::reconciler::sync::SyncOutcome;
use crate::controller::reconciler::types::{
    Reconciler, ReconcilerError, SecretVersions, TriggerSource,
};
use crate::crd::{AGenerator, ASecret};
use crate::observability;
use chrono::{DateTime, Utc};
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};

/// Slack allowed when comparing against the scheduled sync time
const SCHEDULE_TOLERANCE_SECS: i64 = 2;

/// Reconcile one ASecret
pub async fn reconcile(asecret: Arc<ASecret>, ctx: Arc<Reconciler>) -> Result<Action, ReconcilerError> {
    let name = asecret.name_any();
    let namespace = asecret.namespace().unwrap_or_default();
    let key = SecretVersions::key(&namespace, &name);
    let span = info_span!(
        "reconcile",
        resource.kind = "ASecret",
        resource.name = %name,
        resource.namespace = %namespace,
        path = %asecret.spec.aws_secret_path
    );

    async move {
        if let Some(remaining) = time_until_due(&asecret, Utc::now()) {
            if !secret_drifted(&asecret, &ctx, &key).await {
                debug!(
                    remaining_secs = remaining.as_secs(),
                    "Sync is current, skipping"
                );
                return Ok(Action::requeue(remaining));
            }
            info!("Managed Secret changed since last sync, resyncing");
        }

        let start = Instant::now();
        observability::metrics::increment_reconciliations("asecret");

        let result = ctx.syncer.sync(&asecret).await;
        observability::metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => {
                ctx.secret_versions.record(key, outcome.secret_version.clone());
                Ok(requeue_after_success(&outcome))
            }
            Err(e) => {
                report_failure(&asecret, &ctx, &e).await;
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

/// Time left before the next sync when the last one is still current
///
/// Returns `None` when a sync should run now: no successful sync yet, the spec
/// changed since, or the scheduled time has been reached.
#[must_use]
pub fn time_until_due(asecret: &ASecret, now: DateTime<Utc>) -> Option<Duration> {
    let status = asecret.status.as_ref()?;

    let synced = status
        .synced_condition()
        .is_some_and(|c| c.status == "True");
    if !synced || status.observed_generation != asecret.metadata.generation {
        return None;
    }

    let next = DateTime::parse_from_rfc3339(status.next_sync_time.as_deref()?)
        .ok()?
        .with_timezone(&Utc);
    let remaining = next - now - chrono::Duration::seconds(SCHEDULE_TOLERANCE_SECS);
    if remaining <= chrono::Duration::zero() {
        return None;
    }
    remaining.to_std().ok()
}

/// True unless the managed Secret is exactly the one written by the last sync
async fn secret_drifted(asecret: &ASecret, ctx: &Reconciler, key: &str) -> bool {
    let Some(recorded) = ctx.secret_versions.get(key) else {
        return true;
    };
    let Some(namespace) = asecret.namespace() else {
        return true;
    };

    match ctx
        .store
        .get_secret(&namespace, &asecret.spec.target_secret_name)
        .await
    {
        Ok(Some(secret)) => secret.metadata.resource_version.as_deref() != Some(recorded.as_str()),
        Ok(None) => true,
        Err(e) => {
            debug!(error = %format!("{e:#}"), "Could not read managed Secret, resyncing");
            true
        }
    }
}

fn requeue_after_success(outcome: &SyncOutcome) -> Action {
    info!(
        keys = ?outcome.keys,
        cluster = outcome.cluster_write.as_str(),
        vault = outcome.vault_write.map_or("none", |w| w.as_str()),
        next_sync_secs = outcome.next_delay.as_secs(),
        "Secret synced"
    );
    observability::metrics::increment_requeues_total(TriggerSource::TimerBased.as_str());
    Action::requeue(outcome.next_delay)
}

/// Record the failure on the ASecret status; a failed patch is only logged
async fn report_failure(asecret: &ASecret, ctx: &Reconciler, error: &ReconcilerError) {
    let Some(namespace) = asecret.namespace() else {
        return;
    };
    let previous = asecret.status.as_ref();
    let status = failed_status(previous, error.reason(), &error.to_string());
    if previous == Some(&status) {
        return;
    }
    if let Err(e) = ctx
        .store
        .patch_asecret_status(&namespace, &asecret.name_any(), &status)
        .await
    {
        warn!(error = %format!("{e:#}"), "Failed to record sync failure on status");
    }
}

/// Validate one AGenerator and record the `Valid` condition
pub async fn reconcile_generator(
    generator: Arc<AGenerator>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = generator.name_any();
    observability::metrics::increment_reconciliations("agenerator");

    let result = validate_generator_spec(&generator.spec);
    observability::metrics::increment_generator_validations(result.is_ok());
    match &result {
        Ok(()) => info!(generator = %name, "AGenerator is valid"),
        Err(e) => warn!(generator = %name, error = %e, "AGenerator is invalid"),
    }

    let previous = generator.status.as_ref();
    let status = generator_status(previous, &result);
    if previous != Some(&status) {
        ctx.store
            .patch_agenerator_status(&name, &status)
            .await
            .map_err(ReconcilerError::Status)?;
    }

    Ok(Action::await_change())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reconciler::status::synced_status;
    use crate::controller::reconciler::codec::ValueType;
    use crate::crd::ASecretSpec;
    use std::collections::BTreeMap;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn asecret(generation: i64) -> ASecret {
        let mut asecret = ASecret::new(
            "db",
            ASecretSpec {
                target_secret_name: "db-credentials".to_string(),
                aws_secret_path: "/prod/db".to_string(),
                kms_key_id: None,
                data: BTreeMap::new(),
                tags: BTreeMap::new(),
                only_import_remote: None,
                value_type: ValueType::Kv,
                refresh_interval: None,
                target_secret_template: None,
            },
        );
        asecret.metadata.namespace = Some("apps".to_string());
        asecret.metadata.generation = Some(generation);
        asecret
    }

    #[test]
    fn test_new_resource_is_due() {
        assert!(time_until_due(&asecret(1), at("2026-03-01T12:00:00Z")).is_none());
    }

    #[test]
    fn test_current_sync_waits_for_schedule() {
        let mut resource = asecret(1);
        resource.status = Some(synced_status(
            None,
            Some(1),
            Duration::from_secs(600),
            at("2026-03-01T12:00:00Z"),
        ));

        let remaining = time_until_due(&resource, at("2026-03-01T12:05:00Z")).unwrap();
        assert_eq!(remaining, Duration::from_secs(298));
    }

    #[test]
    fn test_schedule_reached_is_due() {
        let mut resource = asecret(1);
        resource.status = Some(synced_status(
            None,
            Some(1),
            Duration::from_secs(600),
            at("2026-03-01T12:00:00Z"),
        ));

        assert!(time_until_due(&resource, at("2026-03-01T12:09:59Z")).is_none());
    }

    #[test]
    fn test_spec_change_is_due() {
        let mut resource = asecret(2);
        resource.status = Some(synced_status(
            None,
            Some(1),
            Duration::from_secs(600),
            at("2026-03-01T12:00:00Z"),
        ));

        assert!(time_until_due(&resource, at("2026-03-01T12:01:00Z")).is_none());
    }

    #[test]
    fn test_failed_sync_is_due() {
        let mut resource = asecret(1);
        let synced = synced_status(
            None,
            Some(1),
            Duration::from_secs(600),
            at("2026-03-01T12:00:00Z"),
        );
        resource.status = Some(failed_status(Some(&synced), "vault-read", "timeout"));

        assert!(time_until_due(&resource, at("2026-03-01T12:01:00Z")).is_none());
    }
}
