//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits so a TOML file can supply any subset of the
//! settings; the environment overlay in `loader.rs` fills in the rest.

use serde::{Deserialize, Serialize};

/// Root configuration for the storefront service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and request handling settings.
    pub server: ServerConfig,

    /// Document database settings.
    pub database: DatabaseConfig,

    /// Startup seeding toggles.
    pub seed: SeedConfig,

    /// External vector index (Pinecone) settings.
    pub search: SearchConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// The `host:port` string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (all interfaces by default).
    pub host: String,

    /// Listen port.
    pub port: u16,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// MongoDB connection string. Required before the connect stage.
    pub uri: Option<String>,

    /// Database name. Falls back to the URI's default database, then `storefront`.
    pub name: Option<String>,
}

/// Seeding toggles read once at startup.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct SeedConfig {
    /// Skip the seed stage entirely.
    pub skip: bool,

    /// Reseed even when products already exist.
    pub force: bool,
}

/// Pinecone integration settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Run the external index sync stage at startup.
    pub pinecone_enabled: bool,

    /// Pinecone API key.
    pub api_key: Option<String>,

    /// Index host URL, e.g. `https://products-abc123.svc.us-east-1.pinecone.io`.
    pub index_host: Option<String>,

    /// Namespace records are written to.
    pub namespace: String,

    /// Per-request timeout for Pinecone calls, in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            pinecone_enabled: false,
            api_key: None,
            index_host: None,
            namespace: "products".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Prometheus exporter bind address. Metrics are not exported when unset.
    pub metrics_address: Option<String>,
}
