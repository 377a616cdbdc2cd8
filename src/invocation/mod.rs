//! Invocation envelope module
//!
//! Wire types exchanged with the function host on every trigger call,
//! plus the decoding rules for message payloads and metadata values.

mod error;
mod types;

pub use error::{InvocationError, MetadataTypeMismatch};
pub use types::{InvocationRequest, InvocationResponse};
