//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overlay: MONGO_URI, PORT, *_ON_START, ...)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → moved into the startup orchestrator, shared via AppState
//! ```
//!
//! # Design Decisions
//! - Config is read once and never changes for the life of the process
//! - All fields have defaults to allow minimal configs
//! - Environment beats file, file beats defaults

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with, ConfigError};
pub use schema::AppConfig;
pub use schema::DatabaseConfig;
pub use schema::LogFormat;
pub use schema::SearchConfig;
pub use schema::SeedConfig;
pub use schema::ServerConfig;
