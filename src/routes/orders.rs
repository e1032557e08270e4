//! Order history for signed-in customers.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::db::Order;
use crate::http::extract::AuthUser;
use crate::http::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/{id}", get(get_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "The caller's orders, newest first", body = [Order]),
        (status = 401, description = "Missing or invalid token", body = crate::http::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.store.list_orders_for_user(&user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = String, Path, description = "Order id")),
    responses(
        (status = 200, description = "The order", body = Order),
        (status = 401, description = "Missing or invalid token", body = crate::http::error::ErrorBody),
        (status = 404, description = "No such order for this customer", body = crate::http::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    // Someone else's order is indistinguishable from a missing one.
    state
        .store
        .get_order(&id)
        .await?
        .filter(|order| order.user_id.as_deref() == Some(user.id.as_str()))
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("order {id}")))
}
