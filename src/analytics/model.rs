//! Analytics data models — serialisable types returned by the analytics routes.

use serde::Serialize;

// ─── Predictions ─────────────────────────────────────────────────────────────

/// One forecast period in a resource-allocation prediction series.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationForecast {
    /// ISO 8601 calendar date of the forecast period, e.g. `"2026-09-29"`.
    pub date: String,
    /// Predicted budget allocation in currency units.
    pub budget_allocation: f64,
    /// Predicted staff headcount.
    pub staff_allocation: i64,
    /// Predicted equipment allocation in currency units.
    pub equipment_allocation: f64,
}

/// Response for the predictions route: a period series plus metadata.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub department: String,
    /// Echo of the requested model type, e.g. `"random_forest"`. No model
    /// actually runs — the series is a deterministic mock.
    pub model_type: String,
    pub predictions: Vec<AllocationForecast>,
    /// Mock model confidence, 0.0–1.0.
    pub confidence: f64,
}

// ─── Optimization ────────────────────────────────────────────────────────────

/// A budget/staff/equipment triple.
#[derive(Debug, Clone, Serialize)]
pub struct ResourcePlan {
    pub budget: f64,
    pub staff: i64,
    pub equipment: f64,
}

/// Difference between current and recommended plans.
#[derive(Debug, Clone, Serialize)]
pub struct PlanDelta {
    pub budget: f64,
    pub budget_percent: f64,
    pub staff: i64,
    pub equipment: f64,
    pub equipment_percent: f64,
}

/// Response for the optimization route.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResponse {
    pub current: ResourcePlan,
    pub recommended: ResourcePlan,
    pub change: PlanDelta,
    pub explanation: String,
}
