// rest/routes/dashboard.rs — role-scoped overview figures.

use axum::{extract::State, Json};
use serde_json::Value;
use std::sync::Arc;

use crate::dashboard;
use crate::error::Result;
use crate::identity::Identity;
use crate::AppContext;

/// `GET /dashboard/overview` — staff get their workload, department heads
/// their department throughput, administrators the whole district. Recomputed
/// on every call.
pub async fn overview(
    State(ctx): State<Arc<AppContext>>,
    caller: Identity,
) -> Result<Json<Value>> {
    let value = dashboard::overview(&caller, &ctx.storage).await?;
    Ok(Json(value))
}
