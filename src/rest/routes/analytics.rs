// rest/routes/analytics.rs — mock predictions and optimization analysis.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::analytics::{self, model::{OptimizationResponse, PredictionResponse}};
use crate::error::Result;
use crate::identity::Identity;
use crate::policy;
use crate::AppContext;

#[derive(Deserialize)]
pub struct PredictionParams {
    pub department: String,
    /// Number of monthly periods to forecast (default: 3).
    pub periods: Option<u32>,
    /// Echoed back in the response; no model actually runs.
    pub model_type: Option<String>,
}

/// `GET /analytics/predictions?department=…&periods=…&model_type=…` —
/// denied for staff.
pub async fn predictions(
    State(_ctx): State<Arc<AppContext>>,
    caller: Identity,
    Query(params): Query<PredictionParams>,
) -> Result<Json<PredictionResponse>> {
    policy::ensure_can_view_analytics(&caller)?;
    let response = analytics::predictions(
        &params.department,
        params.periods.unwrap_or(3),
        params.model_type.as_deref().unwrap_or("random_forest"),
    );
    Ok(Json(response))
}

/// `GET /analytics/optimization/{department}` — denied for staff.
pub async fn optimization(
    State(_ctx): State<Arc<AppContext>>,
    caller: Identity,
    Path(department): Path<String>,
) -> Result<Json<OptimizationResponse>> {
    policy::ensure_can_view_analytics(&caller)?;
    Ok(Json(analytics::optimization(&department)))
}
