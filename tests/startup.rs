//! Startup orchestration tests: stage order, fatal vs. best-effort failures,
//! mount order and the live listener.

use std::sync::Arc;
use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use storefront::config::load_config_with;
use storefront::config::validation::ValidationError;
use storefront::config::ConfigError;
use storefront::db::{MemoryStore, Store};
use storefront::health::{SearchStatus, SeedStatus};
use storefront::lifecycle::{Launched, Shutdown};
use storefront::search::{NoopSync, PineconeSync};
use storefront::seed::{ProductSeeder, SeedOptions, Seeder};
use storefront::{AppConfig, Collaborators, Startup, StartupError};

mod common;

use common::{
    marker_routes, memory_collaborators, test_config, CountingConnector, FailingConnector,
    FailingSeeder, RecordingSeeder,
};

struct Running {
    base: String,
    shutdown: Shutdown,
    handle: JoinHandle<std::io::Result<()>>,
}

impl Running {
    async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server should stop")
            .unwrap()
            .unwrap();
    }
}

fn serve(launched: Launched) -> Running {
    let base = format!("http://{}", launched.local_addr().unwrap());
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(launched.serve(shutdown.notified()));
    Running {
        base,
        shutdown,
        handle,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().redirect(Policy::none()).build().unwrap()
}

async fn populated_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    ProductSeeder::new()
        .seed(store.as_ref(), SeedOptions::for_startup(false))
        .await
        .unwrap();
    store
}

async fn launch(config: AppConfig, collaborators: Collaborators) -> Result<Launched, StartupError> {
    Startup::new(config, collaborators).launch().await
}

async fn health(base: &str) -> Value {
    client()
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn missing_uri_fails_before_connecting_or_binding() {
    // Reserve a free port, then release it so a bind would succeed.
    let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let mut config = test_config();
    config.database.uri = None;
    config.server.port = port;

    let connector = CountingConnector::default();
    let collaborators = Collaborators {
        connector: Box::new(connector.clone()),
        ..memory_collaborators(Arc::new(MemoryStore::new()))
    };

    let err = launch(config, collaborators).await.err().unwrap();
    assert!(matches!(err, StartupError::MissingDatabaseUri));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(connector.calls(), 0);

    // Nothing is holding the port.
    TcpListener::bind(("127.0.0.1", port)).await.unwrap();
}

#[tokio::test]
async fn missing_uri_in_environment_is_a_config_error() {
    let err = load_config_with(None, |_| None).unwrap_err();
    match &err {
        ConfigError::Validation(errors) => {
            assert!(errors.contains(&ValidationError::MissingDatabaseUri))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(StartupError::from(err).exit_code(), 1);
}

#[tokio::test]
async fn connect_failure_is_fatal() {
    let collaborators = Collaborators {
        connector: Box::new(FailingConnector),
        ..memory_collaborators(Arc::new(MemoryStore::new()))
    };
    let err = launch(test_config(), collaborators).await.err().unwrap();
    assert!(matches!(err, StartupError::Connect(_)));
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn connects_once_with_configured_uri() {
    let connector = CountingConnector::default();
    let collaborators = Collaborators {
        connector: Box::new(connector.clone()),
        ..memory_collaborators(Arc::new(MemoryStore::new()))
    };
    launch(test_config(), collaborators).await.unwrap();
    assert_eq!(connector.calls(), 1);
}

#[tokio::test]
async fn populated_store_skips_seeding_and_listens() {
    let store = populated_store().await;
    let before = store.count_products().await.unwrap();

    let launched = launch(test_config(), memory_collaborators(store.clone()))
        .await
        .unwrap();
    assert_eq!(launched.report().seed, SeedStatus::Skipped);
    assert_eq!(store.count_products().await.unwrap(), before);

    let running = serve(launched);
    let body = health(&running.base).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["seed"], "skipped");
    running.stop().await;
}

#[tokio::test]
async fn seeder_receives_skip_if_exists_by_default() {
    let seeder = RecordingSeeder::default();
    let collaborators = Collaborators {
        seeder: Box::new(seeder.clone()),
        ..memory_collaborators(Arc::new(MemoryStore::new()))
    };
    launch(test_config(), collaborators).await.unwrap();
    assert_eq!(
        seeder.calls(),
        vec![SeedOptions {
            force: false,
            skip_if_exists: true
        }]
    );
}

#[tokio::test]
async fn force_seed_runs_on_populated_store() {
    let seeder = RecordingSeeder::default();
    let mut config = test_config();
    config.seed.force = true;
    let collaborators = Collaborators {
        seeder: Box::new(seeder.clone()),
        ..memory_collaborators(populated_store().await)
    };
    let launched = launch(config, collaborators).await.unwrap();
    assert_eq!(launched.report().seed, SeedStatus::Seeded);
    assert_eq!(
        seeder.calls(),
        vec![SeedOptions {
            force: true,
            skip_if_exists: false
        }]
    );
}

#[tokio::test]
async fn force_seed_with_real_seeder_reports_seeded() {
    let mut config = test_config();
    config.seed.force = true;
    let launched = launch(config, memory_collaborators(populated_store().await))
        .await
        .unwrap();
    assert_eq!(launched.report().seed, SeedStatus::Seeded);
}

#[tokio::test]
async fn skip_flag_never_calls_seeder() {
    let seeder = RecordingSeeder::default();
    let mut config = test_config();
    config.seed.skip = true;
    config.seed.force = true;
    let collaborators = Collaborators {
        seeder: Box::new(seeder.clone()),
        ..memory_collaborators(Arc::new(MemoryStore::new()))
    };
    let launched = launch(config, collaborators).await.unwrap();
    assert_eq!(launched.report().seed, SeedStatus::Disabled);
    assert!(seeder.calls().is_empty());
}

#[tokio::test]
async fn seed_failure_does_not_prevent_bind() {
    let collaborators = Collaborators {
        seeder: Box::new(FailingSeeder),
        ..memory_collaborators(Arc::new(MemoryStore::new()))
    };
    let launched = launch(test_config(), collaborators).await.unwrap();
    assert_eq!(launched.report().seed, SeedStatus::Failed);

    let running = serve(launched);
    let body = health(&running.base).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["seed"], "failed");
    running.stop().await;
}

#[tokio::test]
async fn sync_disabled_uses_text_search() {
    let launched = launch(test_config(), memory_collaborators(Arc::new(MemoryStore::new())))
        .await
        .unwrap();
    assert_eq!(launched.report().search, SearchStatus::Text);
}

#[tokio::test]
async fn misconfigured_sync_falls_back_and_still_listens() {
    let mut config = test_config();
    config.search.pinecone_enabled = true;
    config.search.api_key = None;
    let collaborators = Collaborators {
        index_sync: Box::new(PineconeSync::new(config.search.clone())),
        ..memory_collaborators(Arc::new(MemoryStore::new()))
    };

    let launched = launch(config, collaborators).await.unwrap();
    assert_eq!(launched.report().search, SearchStatus::Fallback);

    let running = serve(launched);
    let body = health(&running.base).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["search"], "fallback");

    let search: Value = client()
        .get(format!("{}/api/search?q=skillet", running.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(search["mode"], "text");
    running.stop().await;
}

#[tokio::test]
async fn unreachable_sync_target_falls_back() {
    // Grab a port and close it so connections are refused.
    let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = probe.local_addr().unwrap();
    drop(probe);

    let mut config = test_config();
    config.search.pinecone_enabled = true;
    config.search.api_key = Some("test-key".into());
    config.search.index_host = Some(format!("http://{dead}"));
    config.search.timeout_secs = 2;
    let collaborators = Collaborators {
        index_sync: Box::new(PineconeSync::new(config.search.clone())),
        ..memory_collaborators(Arc::new(MemoryStore::new()))
    };

    let launched = launch(config, collaborators).await.unwrap();
    assert_eq!(launched.report().search, SearchStatus::Fallback);
    serve(launched).stop().await;
}

#[tokio::test]
async fn noop_sync_when_enabled_is_fallback() {
    let mut config = test_config();
    config.search.pinecone_enabled = true;
    let collaborators = Collaborators {
        index_sync: Box::new(NoopSync),
        ..memory_collaborators(Arc::new(MemoryStore::new()))
    };
    let launched = launch(config, collaborators).await.unwrap();
    assert_eq!(launched.report().search, SearchStatus::Fallback);
}

#[tokio::test]
async fn root_redirects_and_prefixes_reach_their_handlers() {
    let collaborators = Collaborators {
        routes: marker_routes(),
        ..memory_collaborators(Arc::new(MemoryStore::new()))
    };
    let running = serve(launch(test_config(), collaborators).await.unwrap());
    let client = client();

    let root = client.get(format!("{}/", running.base)).send().await.unwrap();
    assert_eq!(root.status(), StatusCode::FOUND);
    assert_eq!(root.headers()["location"], "/api-docs");

    for name in ["products", "checkout", "orders", "search", "auth"] {
        let res = client
            .get(format!("{}/api/{name}", running.base))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "/api/{name}");
        assert_eq!(res.text().await.unwrap(), name);
    }

    let docs = client
        .get(format!("{}/api-docs.json", running.base))
        .send()
        .await
        .unwrap();
    assert_eq!(docs.status(), StatusCode::OK);
    let ui = client
        .get(format!("{}/api-docs", running.base))
        .send()
        .await
        .unwrap();
    assert!(ui.text().await.unwrap().contains("swagger-ui"));

    running.stop().await;
}

#[tokio::test]
async fn bind_failure_is_fatal() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = test_config();
    config.server.port = occupied.local_addr().unwrap().port();

    let err = launch(config, memory_collaborators(Arc::new(MemoryStore::new())))
        .await
        .err()
        .unwrap();
    match &err {
        StartupError::Bind { address, .. } => assert!(address.starts_with("127.0.0.1:")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), 1);
}

#[tokio::test]
async fn served_instance_stops_on_shutdown() {
    let launched = launch(test_config(), memory_collaborators(Arc::new(MemoryStore::new())))
        .await
        .unwrap();
    let addr = launched.local_addr().unwrap();
    let running = serve(launched);

    let res = client().get(format!("{}/health", running.base)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    drop(res);

    running.stop().await;
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}
