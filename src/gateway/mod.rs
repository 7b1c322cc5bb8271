//! Axum-based HTTP gateway.
//!
//! Thin mapping layer only: parse the body, call the credential store, map
//! the result to a status code. Body limits and request timeouts are handled
//! by tower-http layers; CORS is wide open because the static frontends are
//! served from arbitrary origins.

use crate::error::StoreError;
use crate::registry::{CredentialStore, NewProfile};
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB) — prevents memory exhaustion
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s)
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CredentialStore>,
}

/// Concrete return type for handlers (avoids `impl IntoResponse` inference issues).
type ApiResponse = (StatusCode, Json<serde_json::Value>);

/// Request body for registration.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    email: String,
    first_name: String,
    last_name: String,
    phone: String,
    batch: String,
    department: String,
    password: String,
    registration_date: String,
}

/// Request body for login.
#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

/// Build the service router. `/auth/register` and `/auth/login` are the
/// canonical paths; `/register` and `/login` are kept as aliases because
/// deployed frontends disagree on which they call.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/auth/register", post(handle_register))
        .route("/register", post(handle_register))
        .route("/auth/login", post(handle_login))
        .route("/login", post(handle_login))
        .route("/users", get(handle_users))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn run_gateway(host: &str, port: u16, store: Arc<CredentialStore>) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("gateway listening on http://{}", listener.local_addr()?);

    let app = router(AppState { store });
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install ctrl-c handler: {e}");
    }
    tracing::info!("shutdown signal received");
}

/// Map a store error to a client-facing response. Repository detail is
/// logged, never sent to the client.
fn error_response(err: StoreError) -> ApiResponse {
    match err {
        StoreError::Validation(_) | StoreError::DuplicateIdentity(_) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": err.to_string()})),
        ),
        StoreError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Invalid email or password"})),
        ),
        StoreError::Repository(e) => {
            tracing::error!("repository failure: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Internal server error"})),
            )
        }
    }
}

/// GET / — service banner.
async fn handle_root() -> ApiResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "message": "Alumni Management System Backend",
            "status": "running",
        })),
    )
}

/// GET /health — liveness probe.
async fn handle_health() -> ApiResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "time": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

/// POST /auth/register — create a new alumnus record.
async fn handle_register(
    State(state): State<AppState>,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(Json(b)) => b,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": format!("Invalid request: {e}")})),
            );
        }
    };

    let profile = NewProfile {
        email: body.email,
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
        batch: body.batch,
        department: body.department,
        registration_date: body.registration_date,
    };

    match state.store.register(profile, &body.password) {
        Ok(user) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Registration successful",
                "user": user,
            })),
        ),
        Err(e) => error_response(e),
    }
}

/// POST /auth/login — verify credentials and return the public profile.
async fn handle_login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> ApiResponse {
    let body = match body {
        Ok(Json(b)) => b,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": format!("Invalid request: {e}")})),
            );
        }
    };

    match state.store.authenticate(&body.email, &body.password) {
        Ok(user) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "message": "Login successful",
                "user": user,
            })),
        ),
        Err(e) => error_response(e),
    }
}

/// GET /users — every registered public profile.
async fn handle_users(State(state): State<AppState>) -> ApiResponse {
    match state.store.list_profiles() {
        Ok(users) => {
            let total = users.len();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "users": users,
                    "total": total,
                })),
            )
        }
        Err(e) => error_response(e),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
