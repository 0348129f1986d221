//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `secret_sync_reconciliations_total` - Reconciliations by resource kind
//! - `secret_sync_reconciliation_errors_total` - Reconciliation errors by reason
//! - `secret_sync_reconciliation_duration_seconds` - Duration of ASecret reconciliations
//! - `secret_sync_requeues_total` - Requeues by trigger reason
//! - `secret_sync_vault_operations_total` - AWS Secrets Manager calls by operation
//! - `secret_sync_vault_operation_errors_total` - Failed AWS Secrets Manager calls by operation
//! - `secret_sync_vault_operation_duration_seconds` - Duration of AWS Secrets Manager calls
//! - `secret_sync_cluster_secret_writes_total` - Kubernetes Secret writes by kind (create, update)
//! - `secret_sync_generated_values_total` - Values produced by AGenerators
//! - `secret_sync_pruned_keys_total` - Keys removed because they are no longer declared
//! - `secret_sync_generator_validations_total` - AGenerator validations by result
//! - `secret_sync_duration_parsing_errors_total` - Invalid `refreshInterval` values

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_sync_reconciliations_total",
            "Total number of reconciliations by resource kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_sync_reconciliation_errors_total",
            "Total number of reconciliation errors by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "secret_sync_reconciliation_duration_seconds",
            "Duration of ASecret reconciliation in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_sync_requeues_total",
            "Total number of requeues by trigger reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

static VAULT_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_sync_vault_operations_total",
            "Total number of AWS Secrets Manager operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create VAULT_OPERATIONS_TOTAL metric - this should never happen")
});

static VAULT_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_sync_vault_operation_errors_total",
            "Total number of AWS Secrets Manager operation errors by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create VAULT_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static VAULT_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "secret_sync_vault_operation_duration_seconds",
            "Duration of AWS Secrets Manager operations in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["operation"],
    )
    .expect("Failed to create VAULT_OPERATION_DURATION metric - this should never happen")
});

static CLUSTER_SECRET_WRITES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_sync_cluster_secret_writes_total",
            "Total number of Kubernetes Secret writes by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create CLUSTER_SECRET_WRITES_TOTAL metric - this should never happen")
});

static GENERATED_VALUES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_sync_generated_values_total",
        "Total number of values produced by AGenerators",
    )
    .expect("Failed to create GENERATED_VALUES_TOTAL metric - this should never happen")
});

static PRUNED_KEYS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_sync_pruned_keys_total",
        "Total number of keys pruned because they are no longer declared",
    )
    .expect("Failed to create PRUNED_KEYS_TOTAL metric - this should never happen")
});

static GENERATOR_VALIDATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "secret_sync_generator_validations_total",
            "Total number of AGenerator validations by result",
        ),
        &["result"],
    )
    .expect("Failed to create GENERATOR_VALIDATIONS_TOTAL metric - this should never happen")
});

static DURATION_PARSING_ERRORS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "secret_sync_duration_parsing_errors_total",
        "Total number of refreshInterval parsing failures",
    )
    .expect("Failed to create DURATION_PARSING_ERRORS_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
/// Register all metrics with the registry
///
/// Fails if called twice.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(CLUSTER_SECRET_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GENERATED_VALUES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PRUNED_KEYS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GENERATOR_VALIDATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(DURATION_PARSING_ERRORS_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(reason: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

pub fn record_vault_operation(operation: &str, duration: f64) {
    VAULT_OPERATIONS_TOTAL.with_label_values(&[operation]).inc();
    VAULT_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_vault_operation_errors(operation: &str) {
    VAULT_OPERATION_ERRORS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

pub fn increment_cluster_secret_writes(kind: &str) {
    CLUSTER_SECRET_WRITES_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_generated_values() {
    GENERATED_VALUES_TOTAL.inc();
}

pub fn increment_pruned_keys(count: u64) {
    PRUNED_KEYS_TOTAL.inc_by(count);
}

pub fn increment_generator_validations(valid: bool) {
    let result = if valid { "valid" } else { "invalid" };
    GENERATOR_VALIDATIONS_TOTAL.with_label_values(&[result]).inc();
}

pub fn increment_duration_parsing_errors() {
    DURATION_PARSING_ERRORS_TOTAL.inc();
}
