//! Route collections mounted under `/api`.
//!
//! Each collection is a self-contained `Router<AppState>`; the server mounts
//! them under fixed prefixes (see `http::server`).

pub mod auth;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod search;

use axum::Router;

use crate::http::AppState;

/// The five collection routers, in mount order.
pub struct RouteSet {
    pub products: Router<AppState>,
    pub checkout: Router<AppState>,
    pub orders: Router<AppState>,
    pub search: Router<AppState>,
    pub auth: Router<AppState>,
}

impl RouteSet {
    /// Production handlers.
    pub fn standard() -> Self {
        Self {
            products: products::router(),
            checkout: checkout::router(),
            orders: orders::router(),
            search: search::router(),
            auth: auth::router(),
        }
    }
}

impl Default for RouteSet {
    fn default() -> Self {
        Self::standard()
    }
}
