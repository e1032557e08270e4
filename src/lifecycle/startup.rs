//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect to the database (fatal on failure)
//! - Seed the catalog and sync the external index (best effort)
//! - Mount documentation, health and the API collections
//! - Bind the listener and hand back a server ready to run
//!
//! # Design Decisions
//! - Fail fast: a missing connection string stops before any network I/O
//! - Stages are sequential; a best-effort stage logs and continues
//! - Collaborators are trait objects so every stage can be stubbed
//! - Nothing global: config and handles travel in `AppState`

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{AppConfig, ConfigError};
use crate::db::{Connector, DbError, MongoConnector, Store};
use crate::health::{SearchStatus, SeedStatus, StartupReport};
use crate::http::{mount, AppState};
use crate::lifecycle::shutdown::shutdown_signal;
use crate::observability::metrics;
use crate::routes::RouteSet;
use crate::search::{IndexSync, PineconeSync, SearchBackend};
use crate::seed::{ProductSeeder, SeedOptions, Seeder};

/// Fatal startup failures. Every variant ends the process with exit code 1.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("MONGO_URI is not set")]
    MissingDatabaseUri,

    #[error("database connection failed: {0}")]
    Connect(#[source] DbError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
}

impl StartupError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

/// The pluggable parts of startup.
pub struct Collaborators {
    pub connector: Box<dyn Connector>,
    pub seeder: Box<dyn Seeder>,
    pub index_sync: Box<dyn IndexSync>,
    pub routes: RouteSet,
}

impl Collaborators {
    /// MongoDB, the bundled catalog, Pinecone and the real handlers.
    pub fn production(config: &AppConfig) -> Self {
        Self {
            connector: Box::new(MongoConnector::new(config.database.name.clone())),
            seeder: Box::new(ProductSeeder::new()),
            index_sync: Box::new(PineconeSync::new(config.search.clone())),
            routes: RouteSet::standard(),
        }
    }
}

/// A configured but not yet started service.
pub struct Startup {
    config: AppConfig,
    collaborators: Collaborators,
}

impl Startup {
    /// Prepare startup; nothing runs until `launch`.
    pub fn new(config: AppConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
        }
    }

    /// Run stages 2 through 6. On success the listener is bound but no
    /// connection has been accepted yet.
    pub async fn launch(self) -> Result<Launched, StartupError> {
        let Startup {
            config,
            collaborators,
        } = self;

        // Stage 2: connect.
        let uri = config
            .database
            .uri
            .as_deref()
            .map(str::trim)
            .filter(|uri| !uri.is_empty())
            .ok_or(StartupError::MissingDatabaseUri)?;
        let store = match collaborators.connector.connect(uri).await {
            Ok(store) => {
                metrics::record_stage("connect", "ok");
                tracing::info!(stage = "connect", outcome = "ok", "Database connected");
                store
            }
            Err(e) => {
                metrics::record_stage("connect", "failed");
                return Err(StartupError::Connect(e));
            }
        };

        // Stage 3: seed.
        let seed = seed_stage(&config, collaborators.seeder.as_ref(), store.as_ref()).await;

        // Stage 4: external index sync.
        let (search, search_status) =
            sync_stage(&config, collaborators.index_sync.as_ref(), store.as_ref()).await;

        let report = StartupReport {
            seed,
            search: search_status,
        };

        // Stage 5: mount.
        let server = config.server.clone();
        let address = config.bind_address();
        let state = AppState {
            store,
            search,
            report,
            config: Arc::new(config),
        };
        let app = mount(collaborators.routes, state, &server);
        tracing::debug!("Routes mounted");

        // Stage 6: listen.
        let listener = match TcpListener::bind(&address).await {
            Ok(listener) => listener,
            Err(source) => {
                metrics::record_stage("listen", "failed");
                return Err(StartupError::Bind { address, source });
            }
        };
        metrics::record_stage("listen", "ok");

        Ok(Launched {
            listener,
            app,
            report,
        })
    }
}

async fn seed_stage(config: &AppConfig, seeder: &dyn Seeder, store: &dyn Store) -> SeedStatus {
    if config.seed.skip {
        tracing::info!(
            stage = "seed",
            outcome = "disabled",
            "Seeding skipped (SKIP_SEED_ON_START=true)"
        );
        metrics::record_stage("seed", "disabled");
        return SeedStatus::Disabled;
    }

    match seeder.seed(store, SeedOptions::for_startup(config.seed.force)).await {
        Ok(outcome) => {
            let status = if outcome.seeded {
                tracing::info!(
                    stage = "seed",
                    outcome = "seeded",
                    force = config.seed.force,
                    "Product catalog seeded"
                );
                SeedStatus::Seeded
            } else if outcome.skipped {
                tracing::info!(
                    stage = "seed",
                    outcome = "skipped",
                    "Products already present, seeding skipped"
                );
                SeedStatus::Skipped
            } else {
                tracing::info!(stage = "seed", outcome = "unchanged", "Seeder wrote nothing");
                SeedStatus::Unchanged
            };
            metrics::record_stage("seed", "ok");
            status
        }
        Err(e) => {
            tracing::error!(
                stage = "seed",
                outcome = "failed",
                error = %e,
                "Seeding failed, continuing without it"
            );
            metrics::record_stage("seed", "failed");
            SeedStatus::Failed
        }
    }
}

async fn sync_stage(
    config: &AppConfig,
    index_sync: &dyn IndexSync,
    store: &dyn Store,
) -> (SearchBackend, SearchStatus) {
    if !config.search.pinecone_enabled {
        metrics::record_stage("sync", "disabled");
        return (SearchBackend::Text, SearchStatus::Text);
    }

    match index_sync.sync(store).await {
        Ok(index) => {
            tracing::info!(
                stage = "sync",
                outcome = "ok",
                "Pinecone sync complete, vector search enabled"
            );
            metrics::record_stage("sync", "ok");
            (SearchBackend::Vector(index), SearchStatus::Vector)
        }
        Err(e) => {
            tracing::warn!(
                stage = "sync",
                outcome = "failed",
                error = %e,
                "Pinecone disabled or misconfigured. Using fallback search."
            );
            metrics::record_stage("sync", "failed");
            (SearchBackend::Text, SearchStatus::Fallback)
        }
    }
}

/// A bound listener with its router, ready to serve.
pub struct Launched {
    listener: TcpListener,
    app: Router,
    report: StartupReport,
}

impl Launched {
    /// Address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Outcome of the best-effort stages.
    pub fn report(&self) -> StartupReport {
        self.report
    }

    /// Accept connections until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Process entry point: start with production collaborators and serve until
/// a shutdown signal. Fatal errors are logged and mapped to exit code 1.
pub async fn run(config: Result<AppConfig, ConfigError>) -> ExitCode {
    let config = match config {
        Ok(config) => config,
        Err(e) => return fatal(StartupError::from(e)),
    };

    if let Some(addr) = config
        .observability
        .metrics_address
        .as_deref()
        .and_then(|a| a.parse::<SocketAddr>().ok())
    {
        metrics::init_metrics(addr);
    }

    let collaborators = Collaborators::production(&config);
    let launched = match Startup::new(config, collaborators).launch().await {
        Ok(launched) => launched,
        Err(e) => return fatal(e),
    };

    match launched.local_addr() {
        Ok(addr) => tracing::info!(address = %addr, report = ?launched.report(), "Server running"),
        Err(e) => tracing::warn!(error = %e, "Server running, local address unknown"),
    }

    match launched.serve(shutdown_signal()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

fn fatal(err: StartupError) -> ExitCode {
    tracing::error!(error = %err, "Startup failed");
    ExitCode::from(err.exit_code())
}
