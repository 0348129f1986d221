//! # Validation
//!
//! Validates ASecret resources and duration strings.

mod asecret;
mod duration;

pub use asecret::{refresh_interval, validate_asecret_spec};
pub use duration::parse_kubernetes_duration;
