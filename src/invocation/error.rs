// Invocation error types

use thiserror::Error;

/// Errors raised while decoding an invocation envelope
#[derive(Debug, Error)]
pub enum InvocationError {
    /// Top-level body is not a valid envelope
    #[error("Invalid request payload: {0}")]
    MalformedRequest(#[source] serde_json::Error),
}

/// A metadata value had a different JSON type than the caller expected
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Metadata field '{key}' expected {expected}, found {found}")]
pub struct MetadataTypeMismatch {
    pub key: String,
    pub expected: &'static str,
    pub found: &'static str,
}
