//! Task store: creation, role-scoped listing, and status updates.
//!
//! Shares the SQLite pool with [`crate::storage::Storage`]. Policy checks run
//! here so every mutation path carries the caller's identity; listing takes a
//! pre-computed [`TaskScope`] and only ever narrows it.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::policy::{self, TaskScope};
use crate::storage::{with_timeout, UserRow};

// ─── Enums ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Priority::Low),
            "Medium" => Some(Priority::Medium),
            "High" => Some(Priority::High),
            "Critical" => Some(Priority::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    InProgress,
    Completed,
    Canceled,
}

impl Status {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(Status::Pending),
            "In Progress" => Some(Status::InProgress),
            "Completed" => Some(Status::Completed),
            "Canceled" => Some(Status::Canceled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
            Status::Canceled => "Canceled",
        }
    }
}

// ─── Row types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TaskRow {
    pub id: String,
    /// Human-readable display code (`T-000001` style), distinct from the
    /// primary key and allocated from a monotonic sequence.
    pub code: String,
    pub name: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub department: String,
    /// Due date, `%Y-%m-%d`.
    pub due_date: String,
    /// Set iff status is Completed.
    pub completed_date: Option<String>,
    pub creator_id: String,
    pub assignee_id: String,
    pub created_at: String,
}

/// Fields required to create a task. `assigned_to` is a username.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub priority: String,
    pub department: String,
    pub due_date: String,
    pub assigned_to: String,
}

/// Optional listing filters. Each one narrows the role-scoped set; a filter
/// that contradicts the scope yields an empty result, not an error.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListParams {
    pub department: Option<String>,
    pub assigned_to: Option<String>,
    pub status: Option<String>,
}

// ─── TaskStore ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct TaskStore {
    pool: SqlitePool,
}

impl TaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a task on behalf of `creator`.
    ///
    /// Staff are denied by policy. The assignee is looked up by username; the
    /// display code is allocated by bumping `task_seq` inside the same
    /// transaction as the row insert, so concurrent creations can never
    /// observe the same value.
    pub async fn create(&self, draft: &NewTask, creator: &Identity) -> Result<TaskRow> {
        policy::ensure_can_create_tasks(creator)?;

        let priority = Priority::parse(&draft.priority)
            .ok_or_else(|| Error::validation(format!("unknown priority '{}'", draft.priority)))?;
        NaiveDate::parse_from_str(&draft.due_date, "%Y-%m-%d").map_err(|_| {
            Error::validation(format!(
                "due_date '{}' is not a YYYY-MM-DD date",
                draft.due_date
            ))
        })?;

        let assignee: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(&draft.assigned_to)
            .fetch_optional(&self.pool)
            .await?;
        let assignee = assignee.ok_or(Error::NotFound("Assignee"))?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        let mut tx = self.pool.begin().await?;
        let seq: i64 = sqlx::query_scalar("UPDATE task_seq SET next = next + 1 RETURNING next")
            .fetch_one(&mut *tx)
            .await?;
        let code = format!("T-{seq:06}");
        sqlx::query(
            "INSERT INTO tasks
             (id, code, name, description, priority, status, department, due_date,
              completed_date, creator_id, assignee_id, created_at)
             VALUES (?, ?, ?, ?, ?, 'Pending', ?, ?, NULL, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&code)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(priority.as_str())
        .bind(&draft.department)
        .bind(&draft.due_date)
        .bind(&creator.id)
        .bind(&assignee.id)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        self.get(&id)
            .await?
            .ok_or_else(|| Error::Internal(anyhow::anyhow!("task not found after insert")))
    }

    pub async fn get(&self, id: &str) -> Result<Option<TaskRow>> {
        Ok(sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// List tasks visible under `scope`, narrowed by optional filters.
    ///
    /// The scope runs in SQL; the filters are applied as a post-pass
    /// (department and status by value, assignee resolved to a user id — an
    /// unknown assignee username leaves the filter unapplied). Re-running the
    /// query reflects current state; nothing is snapshotted.
    pub async fn list(&self, scope: &TaskScope, params: &TaskListParams) -> Result<Vec<TaskRow>> {
        let mut rows: Vec<TaskRow> = with_timeout(async {
            let rows = match scope {
                TaskScope::All => {
                    sqlx::query_as("SELECT * FROM tasks ORDER BY created_at ASC")
                        .fetch_all(&self.pool)
                        .await?
                }
                TaskScope::Department(dept) => {
                    sqlx::query_as(
                        "SELECT * FROM tasks WHERE department = ? ORDER BY created_at ASC",
                    )
                    .bind(dept)
                    .fetch_all(&self.pool)
                    .await?
                }
                TaskScope::Assignee(user_id) => {
                    sqlx::query_as(
                        "SELECT * FROM tasks WHERE assignee_id = ? ORDER BY created_at ASC",
                    )
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
                }
            };
            Ok(rows)
        })
        .await?;

        if let Some(ref dept) = params.department {
            rows.retain(|t| &t.department == dept);
        }
        if let Some(ref username) = params.assigned_to {
            let assignee: Option<UserRow> =
                sqlx::query_as("SELECT * FROM users WHERE username = ?")
                    .bind(username)
                    .fetch_optional(&self.pool)
                    .await?;
            if let Some(assignee) = assignee {
                rows.retain(|t| t.assignee_id == assignee.id);
            }
        }
        if let Some(ref status) = params.status {
            rows.retain(|t| &t.status == status);
        }

        Ok(rows)
    }

    /// Update a task's status on behalf of `caller`.
    ///
    /// Allowed for administrators, the department head of the task's
    /// department, and the task's assignee. Transitioning to Completed stamps
    /// `completed_date` with today; transitioning away clears it, keeping the
    /// set-iff-Completed invariant in both directions.
    pub async fn update_status(
        &self,
        task_id: &str,
        new_status: Status,
        caller: &Identity,
    ) -> Result<TaskRow> {
        let task = self.get(task_id).await?.ok_or(Error::NotFound("Task"))?;
        policy::ensure_can_update_status(caller, &task.department, &task.assignee_id)?;

        let completed_date = match new_status {
            Status::Completed => Some(Utc::now().date_naive().format("%Y-%m-%d").to_string()),
            _ => None,
        };

        sqlx::query("UPDATE tasks SET status = ?, completed_date = ? WHERE id = ?")
            .bind(new_status.as_str())
            .bind(&completed_date)
            .bind(task_id)
            .execute(&self.pool)
            .await?;

        self.get(task_id)
            .await?
            .ok_or(Error::NotFound("Task"))
    }

    pub async fn total_count(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM tasks")
            .fetch_one(&self.pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Role;
    use crate::storage::Storage;

    struct Fixture {
        store: TaskStore,
        admin: Identity,
        head: Identity,
        staff: Identity,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();
        storage.seed_default_users().await.unwrap();
        let store = TaskStore::new(storage.pool());

        let ident = |username: &str| {
            let storage = storage.clone();
            let username = username.to_string();
            async move {
                let row = storage.get_user_by_username(&username).await.unwrap().unwrap();
                Identity::from_user(&row).unwrap()
            }
        };

        let admin = ident("admin").await;
        let head = ident("dept_head").await;
        let staff = ident("staff").await;
        Fixture {
            store,
            admin,
            head,
            staff,
            _dir: dir,
        }
    }

    fn draft(name: &str, department: &str) -> NewTask {
        NewTask {
            name: name.to_string(),
            description: "desc".to_string(),
            priority: "High".to_string(),
            department: department.to_string(),
            due_date: "2025-01-15".to_string(),
            assigned_to: "staff".to_string(),
        }
    }

    #[tokio::test]
    async fn create_assigns_code_and_pending_status() {
        let f = fixture().await;
        let task = f
            .store
            .create(&draft("Repave Elm St", "Public Works"), &f.admin)
            .await
            .unwrap();
        assert_eq!(task.code, "T-000001");
        assert_eq!(task.status, "Pending");
        assert!(task.completed_date.is_none());

        let second = f
            .store
            .create(&draft("Fix streetlights", "Public Works"), &f.admin)
            .await
            .unwrap();
        assert_eq!(second.code, "T-000002");
    }

    #[tokio::test]
    async fn concurrent_creation_never_repeats_codes() {
        let f = fixture().await;
        let mut handles = Vec::new();
        for i in 0..10 {
            let store = f.store.clone();
            let admin = f.admin.clone();
            handles.push(tokio::spawn(async move {
                store
                    .create(&draft(&format!("task {i}"), "Public Works"), &admin)
                    .await
                    .unwrap()
                    .code
            }));
        }
        let mut codes = Vec::new();
        for h in handles {
            codes.push(h.await.unwrap());
        }
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 10);
    }

    #[tokio::test]
    async fn staff_cannot_create() {
        let f = fixture().await;
        let result = f
            .store
            .create(&draft("Nope", "Public Works"), &f.staff)
            .await;
        assert!(matches!(result, Err(Error::Forbidden(_))));
    }

    #[tokio::test]
    async fn unknown_assignee_is_not_found() {
        let f = fixture().await;
        let mut d = draft("Orphan", "Public Works");
        d.assigned_to = "ghost".to_string();
        assert!(matches!(
            f.store.create(&d, &f.admin).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn bad_date_and_priority_are_validation_errors() {
        let f = fixture().await;
        let mut d = draft("Bad date", "Public Works");
        d.due_date = "15/01/2025".to_string();
        assert!(matches!(
            f.store.create(&d, &f.admin).await,
            Err(Error::Validation(_))
        ));

        let mut d = draft("Bad priority", "Public Works");
        d.priority = "Urgent".to_string();
        assert!(matches!(
            f.store.create(&d, &f.admin).await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn staff_scope_only_sees_own_tasks() {
        let f = fixture().await;
        f.store
            .create(&draft("Mine", "Public Works"), &f.admin)
            .await
            .unwrap();
        // Task assigned to someone else.
        let mut foreign = draft("Not mine", "Public Works");
        foreign.assigned_to = "dept_head".to_string();
        f.store.create(&foreign, &f.admin).await.unwrap();

        let scope = policy::task_scope(&f.staff);
        let rows = f.store.list(&scope, &TaskListParams::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows.iter().all(|t| t.assignee_id == f.staff.id));
    }

    #[tokio::test]
    async fn department_scope_never_leaks_other_departments() {
        let f = fixture().await;
        f.store
            .create(&draft("Works job", "Public Works"), &f.admin)
            .await
            .unwrap();
        f.store
            .create(&draft("Finance job", "Finance"), &f.admin)
            .await
            .unwrap();

        let scope = policy::task_scope(&f.head);
        let rows = f.store.list(&scope, &TaskListParams::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows.iter().all(|t| t.department == "Public Works"));
    }

    #[tokio::test]
    async fn contradicting_filter_yields_empty_not_error() {
        let f = fixture().await;
        f.store
            .create(&draft("Works job", "Public Works"), &f.admin)
            .await
            .unwrap();

        // Head of Public Works asks for Finance: scope wins, result is empty.
        let scope = policy::task_scope(&f.head);
        let params = TaskListParams {
            department: Some("Finance".to_string()),
            ..Default::default()
        };
        let rows = f.store.list(&scope, &params).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn status_filter_narrows() {
        let f = fixture().await;
        let task = f
            .store
            .create(&draft("One", "Public Works"), &f.admin)
            .await
            .unwrap();
        f.store
            .create(&draft("Two", "Public Works"), &f.admin)
            .await
            .unwrap();
        f.store
            .update_status(&task.id, Status::Completed, &f.admin)
            .await
            .unwrap();

        let params = TaskListParams {
            status: Some("Completed".to_string()),
            ..Default::default()
        };
        let rows = f.store.list(&TaskScope::All, &params).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, task.id);
    }

    #[tokio::test]
    async fn completing_stamps_date_and_uncompleting_clears_it() {
        let f = fixture().await;
        let task = f
            .store
            .create(&draft("Flow", "Public Works"), &f.admin)
            .await
            .unwrap();

        // Assignee completes their own task.
        let done = f
            .store
            .update_status(&task.id, Status::Completed, &f.staff)
            .await
            .unwrap();
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(done.completed_date.as_deref(), Some(today.as_str()));

        // Department head reopens it; the stamp must go away.
        let reopened = f
            .store
            .update_status(&task.id, Status::InProgress, &f.head)
            .await
            .unwrap();
        assert_eq!(reopened.status, "In Progress");
        assert!(reopened.completed_date.is_none());
    }

    #[tokio::test]
    async fn outsider_cannot_update_status() {
        let f = fixture().await;
        let task = f
            .store
            .create(&draft("Guarded", "Public Works"), &f.admin)
            .await
            .unwrap();

        let outsider = Identity {
            id: "nobody".to_string(),
            username: "outsider".to_string(),
            role: Role::Staff,
            department: "Finance".to_string(),
        };
        assert!(matches!(
            f.store
                .update_status(&task.id, Status::Completed, &outsider)
                .await,
            Err(Error::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let f = fixture().await;
        assert!(matches!(
            f.store
                .update_status("no-such-id", Status::Completed, &f.admin)
                .await,
            Err(Error::NotFound(_))
        ));
    }
}
