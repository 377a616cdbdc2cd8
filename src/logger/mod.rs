//! Logger module
//!
//! Provides logging utilities for the trigger handler:
//! - Server lifecycle logging
//! - Per-invocation progress lines (the process-wide diagnostic stream)
//! - Access logging in several formats
//! - Error and warning logging
//!
//! Everything is emitted through `tracing`; [`init`] installs the subscriber.

mod format;

pub use format::{AccessLogEntry, AccessLogFormat};

use crate::config::Config;
use hyper::{Method, Uri, Version};
use serde_json::Value;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber
///
/// Should be called once at application startup. `RUST_LOG` overrides
/// `logging.level` when set.
pub fn init(config: &Config) -> io::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.logging.level)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e))
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!("======================================");
    tracing::info!("Queue trigger handler started");
    tracing::info!("Listening on: http://{addr}");
    tracing::info!(
        "Function: POST {} (binding '{}')",
        config.trigger.route(),
        config.trigger.message_binding
    );
    tracing::info!(
        "Processing delay: {} ms",
        config.trigger.processing_delay_ms
    );
    if let Some(workers) = config.server.workers {
        tracing::info!("Worker threads: {workers}");
    }
    if let Some(max) = config.performance.max_connections {
        tracing::info!("Max connections: {max}");
    }
    if config.health.enabled {
        tracing::info!("Health check: GET {}", config.health.path);
    }
    tracing::info!("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!("[ERROR] Failed to serve connection: {err:?}");
}

pub fn log_error(message: &str) {
    tracing::error!("[ERROR] {message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("[WARN] {message}");
}

pub fn log_request(method: &Method, uri: &Uri, version: Version) {
    tracing::debug!("[Request] {method} {uri} {version:?}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: AccessLogFormat) {
    tracing::info!(target: "access", "{}", entry.format(format));
}

/// Progress line of a trigger invocation
pub fn log_invocation(line: &str) {
    tracing::info!(target: "trigger", "{line}");
}

/// Metadata value surfaced for diagnostics only
pub fn log_invocation_metadata(key: &str, value: &Value) {
    tracing::info!(target: "trigger", "{key}: {}", display_metadata(value));
}

pub fn log_shutdown_requested(signal: &str) {
    tracing::info!("[SIGNAL] {signal} received, initiating graceful shutdown");
}

pub fn log_draining(active: usize, grace: Duration) {
    tracing::info!(
        "[SHUTDOWN] Waiting up to {}s for {active} active connection(s)",
        grace.as_secs()
    );
}

pub fn log_shutdown_complete(remaining: usize) {
    if remaining == 0 {
        tracing::info!("[SHUTDOWN] All connections closed");
    } else {
        tracing::warn!("[SHUTDOWN] Grace period elapsed with {remaining} connection(s) still open");
    }
}

// Strings print bare, matching how the host renders metadata
fn display_metadata(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
