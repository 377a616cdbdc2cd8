// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::time::Duration;

use crate::logger::AccessLogFormat;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub trigger: TriggerConfig,
    #[serde(default)]
    pub health: HealthConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Overridden by `FUNCTIONS_CUSTOMHANDLER_PORT` when the host sets it
    #[serde(default = "default_port")]
    pub port: u16,
    /// Tokio worker threads (CPU cores when unset)
    #[serde(default)]
    pub workers: Option<usize>,
    /// Listen backlog passed to `listen(2)`
    #[serde(default = "default_backlog")]
    pub backlog: u32,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_access_log")]
    pub access_log: bool,
    #[serde(default)]
    pub access_log_format: AccessLogFormat,
}

/// Connection handling configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    #[serde(default = "default_keep_alive")]
    pub keep_alive: bool,
    /// Time allowed for a client to send request headers, in seconds.
    /// Covers idle keep-alive connections but never a request in flight.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,
    #[serde(default)]
    pub max_connections: Option<u64>,
    /// Time allowed for in-flight connections after a shutdown signal, in seconds
    #[serde(default = "default_shutdown_grace_period")]
    pub shutdown_grace_period: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_server_name")]
    pub server_name: String,
    #[serde(default = "default_max_body_size")]
    pub max_body_size: u64,
}

/// Queue trigger configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TriggerConfig {
    /// Function name; the host posts invocations to `/<function_name>`
    #[serde(default = "default_function_name")]
    pub function_name: String,
    /// Input binding holding the queue message
    #[serde(default = "default_message_binding")]
    pub message_binding: String,
    /// Simulated processing time per message, in milliseconds
    #[serde(default = "default_processing_delay_ms")]
    pub processing_delay_ms: u64,
}

/// Health check configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    #[serde(default = "default_health_path")]
    pub path: String,
}

impl PerformanceConfig {
    pub const fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }

    pub const fn shutdown_grace_period(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_period)
    }
}

impl TriggerConfig {
    /// Request path the host invokes this function on
    pub fn route(&self) -> String {
        format!("/{}", self.function_name.trim_start_matches('/'))
    }

    pub const fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

const fn default_backlog() -> u32 {
    1024
}

#[allow(clippy::missing_const_for_fn)]
fn default_log_level() -> String {
    "info".to_string()
}

const fn default_access_log() -> bool {
    true
}

const fn default_keep_alive() -> bool {
    true
}

const fn default_connection_timeout() -> u64 {
    60
}

const fn default_shutdown_grace_period() -> u64 {
    10
}

#[allow(clippy::missing_const_for_fn)]
fn default_server_name() -> String {
    "Tokio-Hyper/1.0".to_string()
}

const fn default_max_body_size() -> u64 {
    10_485_760 // 10MB
}

#[allow(clippy::missing_const_for_fn)]
fn default_function_name() -> String {
    "serviceBusQueueTrigger".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_message_binding() -> String {
    "message".to_string()
}

const fn default_processing_delay_ms() -> u64 {
    5_000
}

const fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_path() -> String {
    "/healthz".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            backlog: default_backlog(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            access_log: default_access_log(),
            access_log_format: AccessLogFormat::default(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive: default_keep_alive(),
            connection_timeout: default_connection_timeout(),
            max_connections: None,
            shutdown_grace_period: default_shutdown_grace_period(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            server_name: default_server_name(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            function_name: default_function_name(),
            message_binding: default_message_binding(),
            processing_delay_ms: default_processing_delay_ms(),
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            path: default_health_path(),
        }
    }
}
