//! Order placement.
//!
//! # Data Flow
//! ```text
//! POST /api/checkout
//!     → validate + merge duplicate lines
//!     → load products, price lines from the catalog
//!     → reserve stock per line (release earlier lines on failure)
//!     → insert order (release everything on failure)
//!     → 201 Order
//! ```

use std::collections::{BTreeMap, HashMap};

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::{Order, OrderItem, ShippingAddress, Store};
use crate::http::extract::AuthUser;
use crate::http::{ApiError, AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(checkout))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub email: String,
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i64,
}

/// Merge duplicate product lines, rejecting bad input.
fn merge_items(request: &CheckoutRequest) -> Result<BTreeMap<String, i64>, ApiError> {
    if !request.email.contains('@') {
        return Err(ApiError::validation("email is invalid"));
    }
    if request.items.is_empty() {
        return Err(ApiError::validation("cart is empty"));
    }

    let mut merged = BTreeMap::new();
    for item in &request.items {
        if item.quantity < 1 {
            return Err(ApiError::validation(format!(
                "quantity for {} must be at least 1",
                item.product_id
            )));
        }
        let quantity: &mut i64 = merged.entry(item.product_id.clone()).or_default();
        *quantity = quantity
            .checked_add(item.quantity)
            .ok_or_else(|| ApiError::validation("quantity too large"))?;
    }
    Ok(merged)
}

async fn release_all(store: &dyn Store, reserved: &[(String, i64)]) {
    for (id, quantity) in reserved {
        if let Err(e) = store.release_stock(id, *quantity).await {
            tracing::error!(product_id = %id, quantity, error = %e, "Failed to release reserved stock");
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed", body = Order),
        (status = 400, description = "Malformed body", body = crate::http::error::ErrorBody),
        (status = 404, description = "Unknown product", body = crate::http::error::ErrorBody),
        (status = 409, description = "Insufficient stock", body = crate::http::error::ErrorBody),
        (status = 422, description = "Invalid cart", body = crate::http::error::ErrorBody),
    ),
    security((), ("bearer_auth" = [])),
    tag = "checkout"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    body: Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let Json(request) = body?;
    let merged = merge_items(&request)?;
    let store = state.store.as_ref();

    let ids: Vec<String> = merged.keys().cloned().collect();
    let catalog: HashMap<String, _> = store
        .get_products(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let mut items = Vec::with_capacity(merged.len());
    let mut total_cents: i64 = 0;
    for (id, quantity) in &merged {
        let product = catalog
            .get(id)
            .ok_or_else(|| ApiError::not_found(format!("product {id}")))?;
        let line_total_cents = product
            .price_cents
            .checked_mul(*quantity)
            .ok_or_else(|| ApiError::validation("order total too large"))?;
        total_cents = total_cents
            .checked_add(line_total_cents)
            .ok_or_else(|| ApiError::validation("order total too large"))?;
        items.push(OrderItem {
            product_id: id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity: *quantity,
            line_total_cents,
        });
    }

    let mut reserved: Vec<(String, i64)> = Vec::with_capacity(merged.len());
    for (id, quantity) in &merged {
        match store.reserve_stock(id, *quantity).await {
            Ok(true) => reserved.push((id.clone(), *quantity)),
            Ok(false) => {
                release_all(store, &reserved).await;
                return Err(ApiError::Conflict(format!("insufficient stock for {id}")));
            }
            Err(e) => {
                release_all(store, &reserved).await;
                return Err(e.into());
            }
        }
    }

    let order = Order {
        id: Uuid::new_v4().to_string(),
        user_id: user.map(|AuthUser(u)| u.id),
        email: request.email.trim().to_lowercase(),
        items,
        shipping_address: request.shipping_address,
        total_cents,
        created_at: Utc::now(),
    };

    if let Err(e) = store.insert_order(&order).await {
        release_all(store, &reserved).await;
        return Err(e.into());
    }

    tracing::info!(order_id = %order.id, total_cents, lines = order.items.len(), "Order placed");
    Ok((StatusCode::CREATED, Json(order)))
}
