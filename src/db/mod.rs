//! Document database subsystem.
//!
//! # Data Flow
//! ```text
//! Startup stage 2:
//!     Connector::connect(uri) → single attempt + ping → Arc<dyn Store>
//!
//! Requests:
//!     route handler → AppState.store → Store method → MongoDB / memory
//! ```
//!
//! # Design Decisions
//! - Handlers and collaborators only see the `Store` trait
//! - One connection handle per process, released at exit
//! - Stock reservation is a conditional update, never read-then-write

pub mod memory;
pub mod models;
pub mod mongo;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::{MemoryConnector, MemoryStore};
pub use models::{Order, OrderItem, Product, ProductQuery, Session, ShippingAddress, User};
pub use mongo::{MongoConnector, MongoStore};

/// Errors surfaced by a `Store` or `Connector`.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Backend(String),
}

impl From<mongodb::error::Error> for DbError {
    fn from(err: mongodb::error::Error) -> Self {
        if mongo::is_duplicate_key(&err) {
            DbError::Duplicate(err.to_string())
        } else {
            DbError::Backend(err.to_string())
        }
    }
}

/// Persistence operations the service needs.
#[async_trait]
pub trait Store: Send + Sync {
    /// Round-trip to the server.
    async fn ping(&self) -> Result<(), DbError>;

    async fn count_products(&self) -> Result<u64, DbError>;
    async fn clear_products(&self) -> Result<u64, DbError>;
    async fn insert_products(&self, products: Vec<Product>) -> Result<usize, DbError>;
    async fn list_products(&self, query: &ProductQuery) -> Result<Vec<Product>, DbError>;
    async fn get_product(&self, id: &str) -> Result<Option<Product>, DbError>;

    /// Fetch several products. Missing ids are skipped; result order is unspecified.
    async fn get_products(&self, ids: &[String]) -> Result<Vec<Product>, DbError>;

    /// Case-insensitive substring match over name, description and category.
    async fn search_products(&self, text: &str, limit: usize) -> Result<Vec<Product>, DbError>;

    /// Atomically take `quantity` units if at least that many are in stock.
    async fn reserve_stock(&self, id: &str, quantity: i64) -> Result<bool, DbError>;

    /// Return previously reserved units.
    async fn release_stock(&self, id: &str, quantity: i64) -> Result<(), DbError>;

    async fn insert_order(&self, order: &Order) -> Result<(), DbError>;
    async fn get_order(&self, id: &str) -> Result<Option<Order>, DbError>;

    /// Orders placed by `user_id`, newest first.
    async fn list_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, DbError>;

    /// Fails with `DbError::Duplicate` when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), DbError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
    async fn find_user(&self, id: &str) -> Result<Option<User>, DbError>;

    async fn insert_session(&self, session: &Session) -> Result<(), DbError>;
    async fn find_session(&self, token: &str) -> Result<Option<Session>, DbError>;
}

/// Opens the process-wide database handle.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Make a single connection attempt against `uri`.
    async fn connect(&self, uri: &str) -> Result<Arc<dyn Store>, DbError>;
}
