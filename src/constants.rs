//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8081;

/// Default requeue interval for reconciliation errors (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 60;

/// Requeue interval after a failed AWS Secrets Manager read (seconds)
pub const DEFAULT_VAULT_READ_ERROR_REQUEUE_SECS: u64 = 30;

/// Refresh interval used when an ASecret sets none (seconds)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 3600;

/// Default maximum AWS SDK attempts per call
pub const DEFAULT_AWS_MAX_RETRIES: u32 = 5;

/// Prefix of environment variables that define default AWS tags
pub const AWS_TAG_ENV_PREFIX: &str = "AWS_TAG_";

/// Tag applied to every AWS secret unless overridden
pub const DEFAULT_MANAGED_BY_TAG: (&str, &str) = ("managed-by", "yaso");

/// Default delay before restarting watch stream after it ends (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Field manager used for status patches
pub const FIELD_MANAGER: &str = "secret-sync-controller";

/// Condition type set on ASecrets after a sync attempt
pub const CONDITION_SYNCED: &str = "Synced";

/// Condition type set on AGenerators after validation
pub const CONDITION_VALID: &str = "Valid";
