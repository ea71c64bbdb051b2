//! HTTP API server.
//!
//! Thin request/response mapping over the core: every handler resolves the
//! caller's identity, lets the access policy decide, and serializes whatever
//! the stores hand back. Route shapes follow the operation set: login,
//! get-self, list-users, list-tasks, create-task, update-task-status,
//! dashboard-overview, analytics.

pub mod routes;

use anyhow::Result as AnyResult;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::error::Error;
use crate::identity::{self, Identity};
use crate::AppContext;

pub async fn start_server(ctx: Arc<AppContext>) -> AnyResult<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    // The browser dashboard is served from a different origin in development,
    // so the API answers preflight for anyone.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Root + health (no auth)
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health))
        // Auth
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/me", get(routes::auth::me))
        .route("/auth/users", get(routes::auth::list_users))
        // Tasks
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/{id}/status", patch(routes::tasks::update_task_status))
        // Dashboard
        .route("/dashboard/overview", get(routes::dashboard::overview))
        // Analytics
        .route("/analytics/predictions", get(routes::analytics::predictions))
        .route(
            "/analytics/optimization/{department}",
            get(routes::analytics::optimization),
        )
        .layer(cors)
        .with_state(ctx)
}

// ─── Error mapping ───────────────────────────────────────────────────────────

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Internal(e) => {
                tracing::error!(err = %e, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        // Internal details stay in the log, not in the response body.
        let message = match &self {
            Error::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ─── Identity extractor ──────────────────────────────────────────────────────

/// Pulls `Authorization: Bearer <token>` and resolves it against the user
/// directory. Handlers that take an `Identity` parameter are authenticated;
/// everything else is public.
impl FromRequestParts<Arc<AppContext>> for Identity {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppContext>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(Error::Unauthenticated)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(Error::Unauthenticated)?;
        identity::resolve(token, &state.tokens, &state.storage).await
    }
}
