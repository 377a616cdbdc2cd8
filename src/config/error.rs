//! Configuration error types

use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid port number")]
    InvalidPort,

    #[error("Function name must not be empty")]
    EmptyFunctionName,

    #[error("Message binding name must not be empty")]
    EmptyMessageBinding,

    #[error("Health path {0} collides with the trigger route")]
    HealthPathConflict(String),
}
