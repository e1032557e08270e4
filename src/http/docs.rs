//! API documentation endpoints.
//!
//! Assembles the utoipa-annotated handlers into one OpenAPI document served
//! at `/api-docs.json`, and a Swagger UI page at `/api-docs` that renders it.

use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::http::AppState;

pub const DOCS_UI_PATH: &str = "/api-docs";
pub const DOCS_JSON_PATH: &str = "/api-docs.json";

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Token returned by /api/auth/login or /api/auth/register"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        description = "Product catalog, checkout, orders, search and customer accounts."
    ),
    paths(
        crate::health::health,
        crate::routes::products::list_products,
        crate::routes::products::get_product,
        crate::routes::checkout::checkout,
        crate::routes::orders::list_orders,
        crate::routes::orders::get_order,
        crate::routes::search::search,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::me,
    ),
    components(
        schemas(
            crate::db::Product,
            crate::db::Order,
            crate::db::OrderItem,
            crate::db::ShippingAddress,
            crate::http::error::ErrorBody,
            crate::http::error::ErrorDetail,
            crate::health::HealthResponse,
            crate::routes::checkout::CheckoutRequest,
            crate::routes::checkout::CartItem,
            crate::routes::search::SearchResponse,
            crate::routes::search::SearchMode,
            crate::routes::auth::RegisterRequest,
            crate::routes::auth::LoginRequest,
            crate::routes::auth::AuthResponse,
            crate::routes::auth::UserProfile,
        ),
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness and degraded-mode reporting"),
        (name = "products", description = "Catalog browsing"),
        (name = "checkout", description = "Order placement"),
        (name = "orders", description = "Order history for signed-in customers"),
        (name = "search", description = "Vector search with text fallback"),
        (name = "auth", description = "Registration, login and session lookup"),
    )
)]
pub struct ApiDoc;

/// Router for the OpenAPI JSON document.
pub fn json_router() -> Router<AppState> {
    Router::new().route(DOCS_JSON_PATH, get(openapi_json))
}

/// Router for the Swagger UI page.
pub fn ui_router() -> Router<AppState> {
    Router::new().route(DOCS_UI_PATH, get(swagger_ui))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn swagger_ui() -> Html<String> {
    Html(format!(
        r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Storefront API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {{
      window.ui = SwaggerUIBundle({{ url: "{DOCS_JSON_PATH}", dom_id: "#swagger-ui" }});
    }};
  </script>
</body>
</html>
"##
    ))
}
