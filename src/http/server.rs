//! Router assembly.
//!
//! # Responsibilities
//! - Hold the shared state handed to every handler
//! - Mount the collection routers under their fixed prefixes
//! - Wire up middleware (request ID, tracing, CORS, limits, timeout, metrics)
//!
//! # Design Decisions
//! - Mount order is fixed: root redirect, docs, health, then collections
//! - Unknown paths answer with the same JSON error shape as handlers

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::LOCATION;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, ServerConfig};
use crate::db::Store;
use crate::health::{self, StartupReport};
use crate::http::{docs, ApiError};
use crate::observability::metrics;
use crate::routes::RouteSet;
use crate::search::SearchBackend;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub search: SearchBackend,
    pub report: StartupReport,
    pub config: Arc<AppConfig>,
}

/// Collection prefixes, in mount order.
pub const PRODUCTS_PREFIX: &str = "/api/products";
pub const CHECKOUT_PREFIX: &str = "/api/checkout";
pub const ORDERS_PREFIX: &str = "/api/orders";
pub const SEARCH_PREFIX: &str = "/api/search";
pub const AUTH_PREFIX: &str = "/api/auth";

/// Build the full application router.
#[allow(deprecated)]
pub fn mount(routes: RouteSet, state: AppState, server: &ServerConfig) -> Router {
    let RouteSet {
        products,
        checkout,
        orders,
        search,
        auth,
    } = routes;

    Router::new()
        .route("/", get(redirect_to_docs))
        .merge(docs::json_router())
        .merge(docs::ui_router())
        .route("/health", get(health::health))
        .nest(PRODUCTS_PREFIX, products)
        .nest(CHECKOUT_PREFIX, checkout)
        .nest(ORDERS_PREFIX, orders)
        .nest(SEARCH_PREFIX, search)
        .nest(AUTH_PREFIX, auth)
        .fallback(not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(server.max_body_bytes))
                .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
                .layer(middleware::from_fn(metrics::track_requests)),
        )
}

async fn redirect_to_docs() -> impl IntoResponse {
    (StatusCode::FOUND, [(LOCATION, docs::DOCS_UI_PATH)])
}

async fn not_found() -> ApiError {
    ApiError::not_found("no route for this path")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::health::{SearchStatus, SeedStatus};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState {
            store: Arc::new(MemoryStore::new()),
            search: SearchBackend::Text,
            report: StartupReport {
                seed: SeedStatus::Skipped,
                search: SearchStatus::Text,
            },
            config: Arc::new(AppConfig::default()),
        }
    }

    fn app() -> Router {
        mount(RouteSet::standard(), state(), &ServerConfig::default())
    }

    #[tokio::test]
    async fn root_redirects_to_docs() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/api-docs");
    }

    #[tokio::test]
    async fn unknown_path_is_json_404() {
        let response = app()
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["content-type"], "application/json");
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }
}
