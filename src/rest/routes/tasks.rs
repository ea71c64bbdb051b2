// rest/routes/tasks.rs — task listing, creation, and status updates.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use super::user_json;
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::policy;
use crate::tasks::{NewTask, Status, TaskListParams, TaskRow};
use crate::AppContext;

/// Transfer representation of a task with its creator and assignee embedded.
async fn task_json(ctx: &AppContext, task: &TaskRow) -> Result<Value> {
    let creator = ctx.storage.get_user(&task.creator_id).await?;
    let assignee = ctx.storage.get_user(&task.assignee_id).await?;
    Ok(json!({
        "id": task.id,
        "code": task.code,
        "name": task.name,
        "description": task.description,
        "priority": task.priority,
        "status": task.status,
        "department": task.department,
        "due_date": task.due_date,
        "completed_date": task.completed_date,
        "created_at": task.created_at,
        "creator": creator.as_ref().map(user_json),
        "assignee": assignee.as_ref().map(user_json),
    }))
}

/// `GET /tasks` — the caller's role decides the base row set; optional
/// `department` / `assigned_to` / `status` parameters narrow it further.
pub async fn list_tasks(
    State(ctx): State<Arc<AppContext>>,
    caller: Identity,
    Query(params): Query<TaskListParams>,
) -> Result<Json<Value>> {
    let scope = policy::task_scope(&caller);
    let rows = ctx.tasks.list(&scope, &params).await?;

    // One lookup per distinct user. Small result sets — no join needed.
    let mut users: HashMap<String, Value> = HashMap::new();
    let mut list = Vec::with_capacity(rows.len());
    for task in &rows {
        for id in [&task.creator_id, &task.assignee_id] {
            if !users.contains_key(id.as_str()) {
                let user = ctx.storage.get_user(id).await?;
                users.insert(id.clone(), user.as_ref().map(user_json).into());
            }
        }
        list.push(json!({
            "id": task.id,
            "code": task.code,
            "name": task.name,
            "description": task.description,
            "priority": task.priority,
            "status": task.status,
            "department": task.department,
            "due_date": task.due_date,
            "completed_date": task.completed_date,
            "created_at": task.created_at,
            "creator": users[&task.creator_id],
            "assignee": users[&task.assignee_id],
        }));
    }
    Ok(Json(Value::Array(list)))
}

/// `POST /tasks` — create a task. Denied for staff; unknown assignee is a
/// 404, malformed date or priority a 422.
pub async fn create_task(
    State(ctx): State<Arc<AppContext>>,
    caller: Identity,
    Json(draft): Json<NewTask>,
) -> Result<Json<Value>> {
    let task = ctx.tasks.create(&draft, &caller).await?;
    Ok(Json(task_json(&ctx, &task).await?))
}

/// Typed status-update command — the enum is validated before the store is
/// touched, so an unknown status never reaches SQL.
#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// `PATCH /tasks/{id}/status`.
pub async fn update_task_status(
    State(ctx): State<Arc<AppContext>>,
    caller: Identity,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<Value>> {
    let status = Status::parse(&body.status)
        .ok_or_else(|| Error::validation(format!("unknown status '{}'", body.status)))?;
    let task = ctx.tasks.update_status(&id, status, &caller).await?;
    Ok(Json(task_json(&ctx, &task).await?))
}
