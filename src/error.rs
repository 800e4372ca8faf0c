use thiserror::Error;

use crate::config::ConfigError;
use crate::vocabulary::{GeneratorError, StorageError};

/// Errors surfaced to callers of the vocabulary service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Generator setup failed: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Fail fast on a non-positive id before touching the store
pub fn require_positive_id(name: &str, value: i64) -> Result<()> {
    if value <= 0 {
        return Err(ServiceError::Validation(format!(
            "{} must be positive, got {}",
            name, value
        )));
    }
    Ok(())
}

pub fn require_optional_id(name: &str, value: Option<i64>) -> Result<()> {
    match value {
        Some(id) => require_positive_id(name, id),
        None => Ok(()),
    }
}
