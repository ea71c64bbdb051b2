//! Dashboard aggregator — role-scoped summary statistics.
//!
//! Pure reductions over the current store state; nothing is cached, every
//! call recomputes. Which figures a caller gets is decided solely by role.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::identity::Identity;
use crate::policy::Role;
use crate::storage::Storage;

/// Placeholder figure for department efficiency. A real value would come from
/// performance metrics that are out of scope here.
const EFFICIENCY_SCORE: f64 = 85.5;

/// Placeholder figure for district budget utilization — same caveat.
const BUDGET_UTILIZATION: f64 = 78.3;

// ─── Overview models ─────────────────────────────────────────────────────────

/// Figures shown to staff: their own workload.
#[derive(Debug, Serialize)]
pub struct StaffOverview {
    /// Tasks currently assigned to the caller.
    pub my_tasks: i64,
    /// Tasks the caller completed in the trailing 7 days (inclusive window,
    /// today minus 6 days through today).
    pub completed_week: i64,
    /// Assigned tasks still Pending.
    pub pending_tasks: i64,
}

/// Figures shown to a department head: their department's throughput.
#[derive(Debug, Serialize)]
pub struct DepartmentOverview {
    pub department_tasks: i64,
    /// completed / total × 100; 0.0 when the department has no tasks.
    pub completion_rate: f64,
    /// Staff-role users in the department.
    pub team_members: i64,
    pub efficiency_score: f64,
}

/// Figures shown to an administrator: the whole district.
#[derive(Debug, Serialize)]
pub struct AdminOverview {
    /// Distinct departments across the user directory.
    pub total_departments: i64,
    /// Total task count.
    pub active_tasks: i64,
    /// Staff-role users district-wide.
    pub total_staff: i64,
    pub budget_utilization: f64,
}

// ─── Aggregation ─────────────────────────────────────────────────────────────

/// Compute the overview for whatever role the caller holds.
pub async fn overview(caller: &Identity, storage: &Storage) -> Result<Value> {
    let value = match caller.role {
        Role::Staff => serde_json::to_value(staff_overview(caller, storage).await?),
        Role::DepartmentHead => serde_json::to_value(department_overview(caller, storage).await?),
        Role::Administrator => serde_json::to_value(admin_overview(storage).await?),
    }
    .map_err(anyhow::Error::from)?;
    Ok(value)
}

pub async fn staff_overview(caller: &Identity, storage: &Storage) -> Result<StaffOverview> {
    let pool = storage.pool();

    let my_tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE assignee_id = ?")
        .bind(&caller.id)
        .fetch_one(&pool)
        .await?;

    // Inclusive trailing window: today-6 … today. Dates are stored as
    // YYYY-MM-DD strings, so lexicographic comparison is date comparison.
    let window_start = (Utc::now().date_naive() - chrono::Duration::days(6))
        .format("%Y-%m-%d")
        .to_string();
    let completed_week: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks
         WHERE assignee_id = ? AND status = 'Completed' AND completed_date >= ?",
    )
    .bind(&caller.id)
    .bind(&window_start)
    .fetch_one(&pool)
    .await?;

    let pending_tasks: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks WHERE assignee_id = ? AND status = 'Pending'",
    )
    .bind(&caller.id)
    .fetch_one(&pool)
    .await?;

    Ok(StaffOverview {
        my_tasks,
        completed_week,
        pending_tasks,
    })
}

pub async fn department_overview(
    caller: &Identity,
    storage: &Storage,
) -> Result<DepartmentOverview> {
    let pool = storage.pool();

    let department_tasks: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE department = ?")
            .bind(&caller.department)
            .fetch_one(&pool)
            .await?;
    let completed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks WHERE department = ? AND status = 'Completed'",
    )
    .bind(&caller.department)
    .fetch_one(&pool)
    .await?;

    // Guard the zero-task department: rate is 0, not a division error.
    let completion_rate = if department_tasks > 0 {
        completed as f64 / department_tasks as f64 * 100.0
    } else {
        0.0
    };

    let team_members = storage.staff_count(Some(&caller.department)).await?;

    Ok(DepartmentOverview {
        department_tasks,
        completion_rate,
        team_members,
        efficiency_score: EFFICIENCY_SCORE,
    })
}

pub async fn admin_overview(storage: &Storage) -> Result<AdminOverview> {
    let pool = storage.pool();

    let active_tasks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
        .fetch_one(&pool)
        .await?;

    Ok(AdminOverview {
        total_departments: storage.department_count().await?,
        active_tasks,
        total_staff: storage.staff_count(None).await?,
        budget_utilization: BUDGET_UTILIZATION,
    })
}
