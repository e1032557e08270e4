//! Customer accounts and sessions.
//!
//! # Design Decisions
//! - Emails are stored lowercased so lookups are case-insensitive
//! - Passwords are stored as `sha256(salt || password)` with a per-user salt
//! - Tokens are opaque UUIDs persisted as sessions; they do not expire

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::{Session, User};
use crate::http::extract::{AuthUser, JsonOrForm};
use crate::http::{ApiError, AppState};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    /// At least 8 characters.
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    /// Send as `Authorization: Bearer <token>`.
    pub token: String,
    pub user: UserProfile,
}

pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ApiError::validation("email is invalid")),
    }
}

async fn issue_session(state: &AppState, user: &User) -> Result<AuthResponse, ApiError> {
    let session = Session {
        token: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        created_at: Utc::now(),
    };
    state.store.insert_session(&session).await?;
    Ok(AuthResponse {
        token: session.token,
        user: UserProfile::from(user),
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body(content = RegisterRequest, content_type = "application/json"),
    responses(
        (status = 201, description = "Account created and signed in", body = AuthResponse),
        (status = 409, description = "Email already registered", body = crate::http::error::ErrorBody),
        (status = 422, description = "Invalid input", body = crate::http::error::ErrorBody),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let email = normalize_email(&request.email)?;
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation("name must not be empty"));
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let salt = Uuid::new_v4().simple().to_string();
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        password_hash: hash_password(&salt, &request.password),
        salt,
        email,
        created_at: Utc::now(),
    };
    state.store.insert_user(&user).await.map_err(|e| match ApiError::from(e) {
        ApiError::Conflict(_) => ApiError::Conflict("email already registered".into()),
        other => other,
    })?;

    tracing::info!(user_id = %user.id, "Account registered");
    Ok((StatusCode::CREATED, Json(issue_session(&state, &user).await?)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body(content = LoginRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Wrong email or password", body = crate::http::error::ErrorBody),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let email = request.email.trim().to_lowercase();
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .filter(|user| hash_password(&user.salt, &request.password) == user.password_hash)
        .ok_or_else(|| ApiError::unauthorized("invalid email or password"))?;

    Ok(Json(issue_session(&state, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The signed-in customer", body = UserProfile),
        (status = 401, description = "Missing or invalid token", body = crate::http::error::ErrorBody),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn me(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}
