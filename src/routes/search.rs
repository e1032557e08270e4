//! Product search.
//!
//! Vector mode is used only when startup synced the external index. A query
//! that fails at request time is answered by text search instead of erroring.

use std::collections::HashMap;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::{Product, Store};
use crate::http::{ApiError, AppState};
use crate::search::{SearchBackend, VectorIndex};

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 50;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(search))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Free-text query.
    pub q: String,
    /// Maximum results, capped at 50.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Vector,
    Text,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub mode: SearchMode,
    pub results: Vec<Product>,
}

async fn vector_search(
    index: &dyn VectorIndex,
    store: &dyn Store,
    text: &str,
    limit: usize,
) -> Result<Vec<Product>, ApiError> {
    let ids = index.query(text, limit).await.map_err(|e| ApiError::Internal(e.to_string()))?;
    let mut found: HashMap<String, Product> = store
        .get_products(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();
    // Keep the index ranking; ids no longer in the catalog drop out.
    Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
}

#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching products, best first", body = SearchResponse),
        (status = 400, description = "Missing or malformed query", body = crate::http::error::ErrorBody),
        (status = 422, description = "Empty query", body = crate::http::error::ErrorBody),
    ),
    tag = "search"
)]
pub async fn search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Query(params) = params?;
    let text = params.q.trim();
    if text.is_empty() {
        return Err(ApiError::validation("query must not be empty"));
    }
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let store = state.store.as_ref();

    if let SearchBackend::Vector(index) = &state.search {
        match vector_search(index.as_ref(), store, text, limit).await {
            Ok(results) => {
                return Ok(Json(SearchResponse {
                    mode: SearchMode::Vector,
                    results,
                }))
            }
            Err(e) => tracing::warn!(error = %e, "Vector search failed, answering with text search"),
        }
    }

    Ok(Json(SearchResponse {
        mode: SearchMode::Text,
        results: store.search_products(text, limit).await?,
    }))
}
