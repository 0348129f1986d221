//! # Controller
//!
//! Core controller modules for the secret sync controller.
//!
//! - `generator`: AGenerator validation and random value generation
//! - `reconciler`: Core reconciliation logic
//! - `server`: HTTP server for metrics and health checks

pub mod generator;
pub mod reconciler;
pub mod server;
