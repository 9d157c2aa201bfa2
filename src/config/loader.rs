//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::OrchestratorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides `observability.service_name`.
pub const SERVICE_NAME_ENV: &str = "OTEL_SERVICE_NAME";
/// Overrides `upstreams.routing_base_url`.
pub const ROUTING_URL_ENV: &str = "ORCHESTRATOR_ROUTING_URL";
/// Sets `observability.otlp_endpoint`.
pub const OTLP_TRACES_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_TRACES_ENDPOINT";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, apply environment overrides, and validate configuration.
///
/// Without a path the built-in defaults are used as the base.
pub fn load_config(path: Option<&Path>) -> Result<OrchestratorConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_file(path)?,
        None => OrchestratorConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_file(path: &Path) -> Result<OrchestratorConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides<F>(config: &mut OrchestratorConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(name) = lookup(SERVICE_NAME_ENV).filter(|v| !v.is_empty()) {
        config.observability.service_name = name;
    }
    if let Some(url) = lookup(ROUTING_URL_ENV).filter(|v| !v.is_empty()) {
        config.upstreams.routing_base_url = url;
    }
    if let Some(endpoint) = lookup(OTLP_TRACES_ENDPOINT_ENV).filter(|v| !v.is_empty()) {
        config.observability.otlp_endpoint = Some(endpoint);
    }
}
