//! Error types module

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid storage backend: {0}")]
    InvalidStorageBackend(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
}
