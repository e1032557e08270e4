//! Storefront API library.
//!
//! The binary is a thin wrapper over `lifecycle::run`; everything else is
//! exposed so integration tests can drive startup with stub collaborators.

pub mod config;
pub mod db;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routes;
pub mod search;
pub mod seed;

pub use config::AppConfig;
pub use http::AppState;
pub use lifecycle::{Collaborators, Launched, Shutdown, Startup, StartupError};
