//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;
use axum::routing::get;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;

use storefront::config::AppConfig;
use storefront::db::{Connector, DbError, MemoryConnector, MemoryStore, Store};
use storefront::http::AppState;
use storefront::routes::RouteSet;
use storefront::search::NoopSync;
use storefront::seed::{SeedError, SeedOptions, SeedOutcome, Seeder};
use storefront::Collaborators;

pub const TEST_URI: &str = "mongodb://localhost:27017/storefront-test";

/// Config with a URI and an ephemeral loopback port.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.uri = Some(TEST_URI.to_string());
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config
}

/// Connector that records attempts and delegates to a shared memory store.
#[derive(Clone, Default)]
pub struct CountingConnector {
    pub inner: MemoryConnector,
    pub calls: Arc<AtomicUsize>,
}

impl CountingConnector {
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Self {
            inner: MemoryConnector::with_store(store),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for CountingConnector {
    async fn connect(&self, uri: &str) -> Result<Arc<dyn Store>, DbError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.connect(uri).await
    }
}

/// Connector whose single attempt always fails.
pub struct FailingConnector;

#[async_trait]
impl Connector for FailingConnector {
    async fn connect(&self, _uri: &str) -> Result<Arc<dyn Store>, DbError> {
        Err(DbError::Connect("connection refused".into()))
    }
}

/// Seeder that records the options it was called with.
#[derive(Clone, Default)]
pub struct RecordingSeeder {
    pub calls: Arc<std::sync::Mutex<Vec<SeedOptions>>>,
}

impl RecordingSeeder {
    pub fn calls(&self) -> Vec<SeedOptions> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Seeder for RecordingSeeder {
    async fn seed(&self, _store: &dyn Store, options: SeedOptions) -> Result<SeedOutcome, SeedError> {
        self.calls.lock().unwrap().push(options);
        Ok(SeedOutcome::SEEDED)
    }
}

/// Seeder that always fails.
pub struct FailingSeeder;

#[async_trait]
impl Seeder for FailingSeeder {
    async fn seed(&self, _store: &dyn Store, _options: SeedOptions) -> Result<SeedOutcome, SeedError> {
        Err(SeedError::Db(DbError::Backend("write refused".into())))
    }
}

/// Routes where each collection answers `GET /` with its own marker.
pub fn marker_routes() -> RouteSet {
    fn marker(name: &'static str) -> Router<AppState> {
        Router::new().route("/", get(move || async move { name }))
    }
    RouteSet {
        products: marker("products"),
        checkout: marker("checkout"),
        orders: marker("orders"),
        search: marker("search"),
        auth: marker("auth"),
    }
}

/// Production seeder and routes over a memory store, sync disabled.
pub fn memory_collaborators(store: Arc<MemoryStore>) -> Collaborators {
    Collaborators {
        connector: Box::new(MemoryConnector::with_store(store)),
        seeder: Box::new(storefront::seed::ProductSeeder::new()),
        index_sync: Box::new(NoopSync),
        routes: RouteSet::standard(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
