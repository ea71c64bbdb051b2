//! Mock analytics: resource-allocation predictions and optimization advice.
//!
//! These are deterministic placeholder figures, not model output. A real
//! deployment would plug a forecasting collaborator in behind the same
//! response shapes.

pub mod model;

use chrono::Utc;

use model::{AllocationForecast, OptimizationResponse, PlanDelta, PredictionResponse, ResourcePlan};

const BASE_BUDGET: f64 = 100_000.0;
const BASE_STAFF: i64 = 15;
const MOCK_CONFIDENCE: f64 = 0.85;

/// Build a mock prediction series: one period per month ahead, budget growing
/// 5% per period, staff one head per period, equipment at 20% of budget with
/// 3% growth.
pub fn predictions(department: &str, periods: u32, model_type: &str) -> PredictionResponse {
    let now = Utc::now();
    let predictions = (0..periods)
        .map(|i| {
            let month_ahead = now + chrono::Duration::days(30 * (i as i64 + 1));
            AllocationForecast {
                date: month_ahead.format("%Y-%m-%d").to_string(),
                budget_allocation: BASE_BUDGET * (1.0 + 0.05 * i as f64),
                staff_allocation: BASE_STAFF + i as i64,
                equipment_allocation: BASE_BUDGET * 0.2 * (1.0 + 0.03 * i as f64),
            }
        })
        .collect();

    PredictionResponse {
        department: department.to_string(),
        model_type: model_type.to_string(),
        predictions,
        confidence: MOCK_CONFIDENCE,
    }
}

/// Build the static optimization analysis for a department.
pub fn optimization(_department: &str) -> OptimizationResponse {
    OptimizationResponse {
        current: ResourcePlan {
            budget: 100_000.0,
            staff: 15,
            equipment: 20_000.0,
        },
        recommended: ResourcePlan {
            budget: 105_000.0,
            staff: 16,
            equipment: 21_000.0,
        },
        change: PlanDelta {
            budget: 5_000.0,
            budget_percent: 5.0,
            staff: 1,
            equipment: 1_000.0,
            equipment_percent: 5.0,
        },
        explanation: "Analysis suggests increasing budget allocation by 5% to improve performance metrics."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_series_has_requested_length() {
        let response = predictions("Public Works", 3, "random_forest");
        assert_eq!(response.predictions.len(), 3);
        assert_eq!(response.department, "Public Works");
        assert_eq!(response.confidence, MOCK_CONFIDENCE);
    }

    #[test]
    fn budget_grows_five_percent_per_period() {
        let response = predictions("Finance", 3, "linear");
        let budgets: Vec<f64> = response
            .predictions
            .iter()
            .map(|p| p.budget_allocation)
            .collect();
        assert_eq!(budgets, vec![100_000.0, 105_000.0, 110_000.0]);
        assert_eq!(response.predictions[2].staff_allocation, 17);
    }

    #[test]
    fn zero_periods_is_an_empty_series() {
        assert!(predictions("Finance", 0, "linear").predictions.is_empty());
    }

    #[test]
    fn optimization_recommends_five_percent_increase() {
        let response = optimization("Public Works");
        assert_eq!(
            response.recommended.budget - response.current.budget,
            response.change.budget
        );
        assert_eq!(response.change.budget_percent, 5.0);
    }
}
