//! # Generator
//!
//! Random value generation for keys that reference an `AGenerator`.
//!
//! Values are drawn uniformly from the enabled character classes using the
//! operating system's CSPRNG.

use crate::crd::AGeneratorSpec;
use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::Rng;
use thiserror::Error;

const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const NUMBERS: &str = "0123456789";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeneratorError {
    #[error(
        "at least one character type (uppercase, lowercase, numbers, or special chars) must be enabled"
    )]
    NoCharacterClass,
    #[error("length must be greater than 0")]
    InvalidLength,
    #[error("no character set defined for value generation")]
    EmptyCharset,
}

/// Lookup of generator configurations by name
#[async_trait]
pub trait GeneratorLookup: Send + Sync {
    /// Get a generator spec, `None` when the generator does not exist
    async fn get_generator(&self, name: &str) -> Result<Option<AGeneratorSpec>>;
}

/// Validate that a generator can produce values
pub fn validate_generator_spec(spec: &AGeneratorSpec) -> Result<(), GeneratorError> {
    if !spec.include_uppercase
        && !spec.include_lowercase
        && !spec.include_numbers
        && !spec.include_special_chars
    {
        return Err(GeneratorError::NoCharacterClass);
    }

    if spec.length == 0 {
        return Err(GeneratorError::InvalidLength);
    }

    if charset(spec).is_empty() {
        return Err(GeneratorError::EmptyCharset);
    }

    Ok(())
}

/// Generate a random string following the generator spec
pub fn generate_random_string(spec: &AGeneratorSpec) -> Result<String, GeneratorError> {
    validate_generator_spec(spec)?;

    let chars = charset(spec);
    let mut rng = OsRng;
    Ok((0..spec.length)
        .map(|_| chars[rng.gen_range(0..chars.len())])
        .collect())
}

/// Alphabet for the enabled character classes
fn charset(spec: &AGeneratorSpec) -> Vec<char> {
    let mut chars = Vec::new();
    if spec.include_uppercase {
        chars.extend(UPPERCASE.chars());
    }
    if spec.include_lowercase {
        chars.extend(LOWERCASE.chars());
    }
    if spec.include_numbers {
        chars.extend(NUMBERS.chars());
    }
    if spec.include_special_chars {
        chars.extend(spec.special_chars.chars());
    }
    chars
}
