//! # Configuration
//!
//! Controller configuration from environment variables, overridden by CLI flags.

mod controller;

pub use controller::{CliArgs, ControllerConfig, LogFormat};
