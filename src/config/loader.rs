//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::{AppConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {key}")]
    Env { key: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file overlaid with the process environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] but reads environment values through `lookup`.
pub fn load_config_with<F>(path: Option<&Path>, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };

    apply_env(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values onto `config`. Unset keys leave the field untouched.
pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(uri) = lookup("MONGO_URI") {
        config.database.uri = Some(uri);
    }
    if let Some(name) = lookup("MONGO_DB") {
        config.database.name = Some(name);
    }
    if let Some(host) = lookup("HOST") {
        config.server.host = host;
    }
    if let Some(port) = parse_var(&lookup, "PORT")? {
        config.server.port = port;
    }
    if let Some(secs) = parse_var(&lookup, "REQUEST_TIMEOUT_SECS")? {
        config.server.request_timeout_secs = secs;
    }

    if let Some(skip) = flag(&lookup, "SKIP_SEED_ON_START") {
        config.seed.skip = skip;
    }
    if let Some(force) = flag(&lookup, "FORCE_SEED_ON_START") {
        config.seed.force = force;
    }
    if let Some(enabled) = flag(&lookup, "ENABLE_PINECONE") {
        config.search.pinecone_enabled = enabled;
    }
    if let Some(key) = lookup("PINECONE_API_KEY") {
        config.search.api_key = Some(key);
    }
    if let Some(host) = lookup("PINECONE_INDEX_HOST") {
        config.search.index_host = Some(host);
    }
    if let Some(namespace) = lookup("PINECONE_NAMESPACE") {
        config.search.namespace = namespace;
    }

    if let Some(format) = lookup("LOG_FORMAT") {
        config.observability.log_format = parse_log_format(&format).ok_or(ConfigError::Env {
            key: "LOG_FORMAT",
            value: format,
        })?;
    }
    if let Some(addr) = lookup("METRICS_ADDR") {
        config.observability.metrics_address = Some(addr);
    }

    Ok(())
}

/// Parse a `LOG_FORMAT` value.
pub fn parse_log_format(value: &str) -> Option<LogFormat> {
    match value.trim().to_ascii_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "pretty" | "text" => Some(LogFormat::Pretty),
        _ => None,
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { key, value: raw }),
    }
}

// Flags are on only for the exact string "true"; anything else set means off.
fn flag<F>(lookup: &F, key: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|value| value == "true")
}
