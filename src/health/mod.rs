//! Service health reporting.
//!
//! # Data Flow
//! ```text
//! Startup orchestrator:
//!     seed stage outcome   → SeedStatus
//!     sync stage outcome   → SearchStatus
//!     → StartupReport (immutable, stored in AppState)
//!
//! GET /health:
//!     StartupReport + live Store::ping → HealthResponse
//! ```
//!
//! # Design Decisions
//! - Always answers 200 so it doubles as a liveness probe
//! - `status: degraded` when seeding or sync failed, or the database stopped answering
//! - Startup outcomes never change after launch

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::http::AppState;

/// Result of startup stage 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SeedStatus {
    /// Catalog written.
    Seeded,
    /// Products already present.
    Skipped,
    /// Seeder ran but wrote nothing.
    Unchanged,
    /// `SKIP_SEED_ON_START=true`.
    Disabled,
    /// Seeder returned an error.
    Failed,
}

/// Result of startup stage 4, i.e. how search is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    /// Index synced, vector search active.
    Vector,
    /// Sync was enabled but failed; text search in use.
    Fallback,
    /// Sync not enabled; text search in use.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Connected,
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// What the best-effort startup stages achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StartupReport {
    pub seed: SeedStatus,
    pub search: SearchStatus,
}

impl StartupReport {
    pub fn is_degraded(&self) -> bool {
        self.seed == SeedStatus::Failed || self.search == SearchStatus::Fallback
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: &'static str,
    pub database: DatabaseStatus,
    pub seed: SeedStatus,
    pub search: SearchStatus,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up; body tells whether it runs degraded", body = HealthResponse),
    ),
    tag = "health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.store.ping().await {
        Ok(()) => DatabaseStatus::Connected,
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            DatabaseStatus::Unreachable
        }
    };

    let degraded = state.report.is_degraded() || database == DatabaseStatus::Unreachable;

    Json(HealthResponse {
        status: if degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Ok
        },
        version: env!("CARGO_PKG_VERSION"),
        database,
        seed: state.report.seed,
        search: state.report.search,
    })
}
