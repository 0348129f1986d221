//! # Custom Resource Definitions
//!
//! CRD types for the secret sync controller.
//!
//! ## Module Structure
//!
//! - `asecret.rs` - ASecret specification (target Secret, AWS path, declared keys)
//! - `agenerator.rs` - AGenerator specification (random value rules)
//! - `status.rs` - Status types and conditions

mod agenerator;
mod asecret;
mod status;

pub use agenerator::{
    default_length, default_special_chars, default_true, AGenerator, AGeneratorSpec,
    DEFAULT_SPECIAL_CHARS,
};
pub use asecret::{ASecret, ASecretSpec, DataSource, GeneratorReference, SecretTemplate};
pub use status::{AGeneratorStatus, ASecretStatus, Condition};
