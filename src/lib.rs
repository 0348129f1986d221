//! Secret Sync Controller Library
//!
//! Keeps Kubernetes Secrets and AWS Secrets Manager secrets in sync, generating
//! missing values from `AGenerator` rules.
//!
//! ## Quick Start
//!
//! ```rust
//! use secret_sync_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
