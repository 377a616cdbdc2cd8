//! Request handler module
//!
//! Responsible for request routing dispatch and the invocation endpoint.

mod invoke;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
