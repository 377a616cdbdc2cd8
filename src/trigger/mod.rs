//! Queue trigger module
//!
//! Application logic behind the function route: take one decoded
//! invocation, process the message, and build the result envelope.

mod service_bus;

pub use service_bus::QueueTriggerHandler;
#[cfg(test)]
pub use service_bus::{END_LOG, START_LOG};
