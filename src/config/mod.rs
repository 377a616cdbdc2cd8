// Configuration module entry point
// Loads layered configuration and holds the shared application state

mod error;
mod state;
mod types;

use config::builder::DefaultState;
use config::ConfigBuilder;
use std::net::SocketAddr;

// Re-export public types
pub use error::{ConfigError, ValidationError};
pub use state::AppState;
pub use types::{Config, HttpConfig, TriggerConfig};

/// Port assigned by the function host to its custom handler
pub const HOST_PORT_ENV: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

/// Prefix for environment overrides, e.g. `TRIGGER_HANDLER_TRIGGER__PROCESSING_DELAY_MS`
const ENV_PREFIX: &str = "TRIGGER_HANDLER";

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest precedence first: built-in defaults, the optional
    /// config file, `TRIGGER_HANDLER_*` variables, and finally the host's
    /// `FUNCTIONS_CUSTOMHANDLER_PORT`.
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::build(builder, std::env::var(HOST_PORT_ENV).ok())
    }

    fn build(
        builder: ConfigBuilder<DefaultState>,
        host_port: Option<String>,
    ) -> Result<Self, ConfigError> {
        let host_port = host_port.filter(|p| !p.trim().is_empty());
        let settings = builder
            .set_override_option("server.port", host_port)?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.server.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.trigger.function_name.trim_matches('/').is_empty() {
            return Err(ValidationError::EmptyFunctionName);
        }
        if self.trigger.message_binding.is_empty() {
            return Err(ValidationError::EmptyMessageBinding);
        }
        if self.health.enabled && self.health.path == self.trigger.route() {
            return Err(ValidationError::HealthPathConflict(self.health.path.clone()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(format!("{}:{}", self.server.host, self.server.port).parse()?)
    }
}
