//! # Reconciler
//!
//! Core reconciliation logic for `ASecret` and `AGenerator` resources.
//!
//! ## Reconciliation Flow
//!
//! 1. Read the AWS secret and the managed Kubernetes Secret
//! 2. Merge them with the declared keys (`merge`)
//! 3. Write the Kubernetes Secret (`cluster_writer`)
//! 4. Write the AWS secret if its key set changed (`change`, `vault_writer`)
//! 5. Update status and requeue after `refreshInterval`

pub mod change;
pub mod cluster_writer;
pub mod codec;
pub mod kube_store;
pub mod merge;
pub mod reconcile;
pub mod status;
pub mod sync;
pub mod types;
pub mod validation;
pub mod vault_writer;

pub use kube_store::{KubeApiStore, KubeStore};
pub use reconcile::{reconcile, reconcile_generator};
pub use sync::{SecretSyncer, SyncOutcome};
pub use types::{Reconciler, ReconcilerError, SecretVersions, TriggerSource};
