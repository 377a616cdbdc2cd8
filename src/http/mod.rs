//! HTTP protocol layer module
//!
//! JSON response builders shared by the trigger and health routes.

pub mod response;

// Re-export commonly used types
pub use response::{
    build_404_response, build_405_response, build_413_response, build_health_response,
    build_invalid_payload_response, json_response,
};
