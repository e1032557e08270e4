//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require a database connection string before any network I/O
//! - Validate value ranges (timeouts > 0, body limit > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Pinecone settings are left alone: a broken index config only degrades search

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("MONGO_URI is missing")]
    MissingDatabaseUri,

    #[error("MONGO_URI must start with mongodb:// or mongodb+srv://")]
    InvalidDatabaseUri,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("metrics address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check an assembled configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.database.uri.as_deref().map(str::trim) {
        None | Some("") => errors.push(ValidationError::MissingDatabaseUri),
        Some(uri) => {
            // Seed lists (`host1:27017,host2:27017`) are not valid URLs, so
            // only the scheme is checked here; the driver parses the rest.
            if !(uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://")) {
                errors.push(ValidationError::InvalidDatabaseUri);
            }
        }
    }

    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("REQUEST_TIMEOUT_SECS"));
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("server.max_body_bytes"));
    }
    if config.search.timeout_secs == 0 {
        errors.push(ValidationError::Zero("search.timeout_secs"));
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
