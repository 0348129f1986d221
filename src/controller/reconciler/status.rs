//! # Status
//!
//! Status conditions written after each reconciliation.
//!
//! Conditions keep their previous `lastTransitionTime` when their state is
//! unchanged, so a repeated failure produces an identical status and the
//! patch is skipped.

use crate::constants::{CONDITION_SYNCED, CONDITION_VALID};
use crate::controller::generator::GeneratorError;
use crate::crd::{AGeneratorStatus, ASecretStatus, Condition};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Status after a successful sync
#[must_use]
pub fn synced_status(
    previous: Option<&ASecretStatus>,
    generation: Option<i64>,
    next_delay: Duration,
    now: DateTime<Utc>,
) -> ASecretStatus {
    let condition = Condition::now(
        CONDITION_SYNCED,
        true,
        "ReconciliationSucceeded",
        "Secret successfully synced",
    )
    .settled_against(previous.and_then(ASecretStatus::synced_condition));

    let next_sync = chrono::Duration::from_std(next_delay)
        .ok()
        .and_then(|delay| now.checked_add_signed(delay));

    ASecretStatus {
        conditions: vec![condition],
        last_sync_time: Some(now.to_rfc3339()),
        observed_generation: generation,
        next_sync_time: next_sync.map(|t| t.to_rfc3339()),
    }
}

/// Status after a failed sync; the last successful sync time is kept
#[must_use]
pub fn failed_status(previous: Option<&ASecretStatus>, reason: &str, message: &str) -> ASecretStatus {
    let condition = Condition::now(CONDITION_SYNCED, false, reason, message)
        .settled_against(previous.and_then(ASecretStatus::synced_condition));

    ASecretStatus {
        conditions: vec![condition],
        last_sync_time: previous.and_then(|s| s.last_sync_time.clone()),
        observed_generation: previous.and_then(|s| s.observed_generation),
        next_sync_time: None,
    }
}

/// Status after validating an AGenerator
#[must_use]
pub fn generator_status(
    previous: Option<&AGeneratorStatus>,
    result: &Result<(), GeneratorError>,
) -> AGeneratorStatus {
    let condition = match result {
        Ok(()) => Condition::now(CONDITION_VALID, true, "ValidationSucceeded", "Generator is valid"),
        Err(e) => Condition::now(CONDITION_VALID, false, "ValidationFailed", e.to_string()),
    };
    let previous = previous.and_then(|s| s.conditions.iter().find(|c| c.r#type == CONDITION_VALID));

    AGeneratorStatus {
        conditions: vec![condition.settled_against(previous)],
    }
}
