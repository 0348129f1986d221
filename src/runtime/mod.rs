//! # Runtime
//!
//! Process-level wiring around the reconciler.
//!
//! - `initialization`: tracing, metrics, HTTP server and client setup
//! - `watch_loop`: the ASecret and AGenerator controllers
//! - `error_policy`: requeue decisions after failed reconciliations

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;
