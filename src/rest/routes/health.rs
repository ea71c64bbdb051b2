// rest/routes/health.rs — liveness probe and root banner (no auth).

use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppContext;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "District Administration API",
        "status": "running",
    }))
}

pub async fn health(State(ctx): State<Arc<AppContext>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": ctx.started_at.elapsed().as_secs(),
    }))
}
