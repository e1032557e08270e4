//! Catalog browsing.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::db::{Product, ProductQuery};
use crate::http::{ApiError, AppState};

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/{id}", get(get_product))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Only products in this category.
    pub category: Option<String>,
    /// Page size, capped at 100.
    pub limit: Option<usize>,
    /// Products to skip.
    pub skip: Option<usize>,
}

impl ListParams {
    fn into_query(self) -> ProductQuery {
        ProductQuery {
            category: self.category.filter(|c| !c.trim().is_empty()),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            skip: self.skip.unwrap_or(0),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ListParams),
    responses(
        (status = 200, description = "Products ordered by id", body = [Product]),
        (status = 400, description = "Malformed query", body = crate::http::error::ErrorBody),
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let Query(params) = params?;
    let products = state.store.list_products(&params.into_query()).await?;
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = Product),
        (status = 404, description = "No such product", body = crate::http::error::ErrorBody),
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    state
        .store
        .get_product(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("product {id}")))
}
