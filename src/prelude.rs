//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use secret_sync_controller::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Store traits - implement these to run the syncer against other backends
pub use crate::controller::generator::GeneratorLookup;
pub use crate::controller::reconciler::KubeStore;
pub use crate::provider::SecretVault;

// Reconciler types
pub use crate::controller::reconciler::codec::{SecretValues, ValueType, VaultPayload};
pub use crate::controller::reconciler::merge::MergePolicy;
pub use crate::controller::reconciler::vault_writer::VaultDefaults;
pub use crate::controller::reconciler::{
    reconcile, ReconcilerError, Reconciler, SecretSyncer, SyncOutcome, TriggerSource,
};

// Config types
pub use crate::config::{CliArgs, ControllerConfig, LogFormat};

pub use crate::provider::aws::AwsSecretsManager;
