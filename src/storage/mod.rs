//! SQLite persistence for the user directory, plus pool bootstrap.
//!
//! Tables are created with `CREATE TABLE IF NOT EXISTS` on startup; the pool
//! is shared with [`crate::tasks::TaskStore`] via [`Storage::pool`].

use anyhow::{Context as _, Result as AnyResult};
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::{path::Path, str::FromStr};
use uuid::Uuid;

use crate::auth;
use crate::error::{Error, Result};
use crate::policy::UserScope;

/// Default timeout for individual SQLite queries.
/// Prevents hung queries from blocking the server indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Execute a future with the standard query timeout.
pub(crate) async fn with_timeout<T>(
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Internal(anyhow::anyhow!(
            "database query timed out after {}s",
            QUERY_TIMEOUT.as_secs()
        ))),
    }
}

// ─── Row types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_digest: String,
    /// Stored role string: administrator | department_head | staff.
    pub role: String,
    /// Free-text organizational unit; scopes department_head visibility.
    pub department: String,
    pub active: bool,
    pub created_at: String,
}

/// Fields required to register a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: String,
    pub department: String,
}

// ─── Storage ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn new(data_dir: &Path) -> AnyResult<Self> {
        Self::new_with_slow_query(data_dir, 0).await
    }

    /// Create storage with slow-query logging enabled.
    ///
    /// `slow_query_ms` is the threshold in milliseconds — queries exceeding it
    /// are logged at WARN level. Set to 0 to disable slow-query logging.
    pub async fn new_with_slow_query(data_dir: &Path, slow_query_ms: u64) -> AnyResult<Self> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("district.db");
        let mut opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true);

        if slow_query_ms > 0 {
            use sqlx::ConnectOptions as _;
            opts = opts.log_slow_statements(
                log::LevelFilter::Warn,
                std::time::Duration::from_millis(slow_query_ms),
            );
        }

        let pool = SqlitePool::connect_with(opts).await?;
        Self::migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    /// Used to create a TaskStore that shares the same SQLite connection.
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    async fn migrate(pool: &SqlitePool) -> AnyResult<()> {
        let stmts = [
            "CREATE TABLE IF NOT EXISTS users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE,
                full_name       TEXT NOT NULL,
                password_digest TEXT NOT NULL,
                role            TEXT NOT NULL,
                department      TEXT NOT NULL,
                active          INTEGER NOT NULL DEFAULT 1,
                created_at      TEXT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS tasks (
                id             TEXT PRIMARY KEY,
                code           TEXT NOT NULL UNIQUE,
                name           TEXT NOT NULL,
                description    TEXT NOT NULL,
                priority       TEXT NOT NULL,
                status         TEXT NOT NULL DEFAULT 'Pending',
                department     TEXT NOT NULL,
                due_date       TEXT NOT NULL,
                completed_date TEXT,
                creator_id     TEXT NOT NULL REFERENCES users(id),
                assignee_id    TEXT NOT NULL REFERENCES users(id),
                created_at     TEXT NOT NULL
            )",
            // Single-row monotonic allocator for human-readable task codes.
            // Never derived from COUNT(*): two concurrent creations must not
            // compute the same code.
            "CREATE TABLE IF NOT EXISTS task_seq (next INTEGER NOT NULL)",
            "CREATE TABLE IF NOT EXISTS task_comments (
                id         TEXT PRIMARY KEY,
                task_id    TEXT NOT NULL REFERENCES tasks(id),
                user_id    TEXT NOT NULL REFERENCES users(id),
                body       TEXT NOT NULL,
                created_at TEXT NOT NULL
            )",
            "CREATE INDEX IF NOT EXISTS idx_tasks_department ON tasks(department)",
            "CREATE INDEX IF NOT EXISTS idx_tasks_assignee ON tasks(assignee_id)",
        ];
        for stmt in stmts {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .context("schema bootstrap failed")?;
        }

        // Seed the allocator row exactly once.
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM task_seq")
            .fetch_one(pool)
            .await?;
        if rows == 0 {
            sqlx::query("INSERT INTO task_seq (next) VALUES (0)")
                .execute(pool)
                .await?;
        }

        Ok(())
    }

    // ─── Users ───────────────────────────────────────────────────────────────

    /// Register a new user. Duplicate username or email is a validation
    /// failure; unknown role strings are rejected before touching the table.
    pub async fn create_user(&self, new: &NewUser) -> Result<UserRow> {
        if crate::policy::Role::parse(&new.role).is_none() {
            return Err(Error::validation(format!("unknown role '{}'", new.role)));
        }

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ? OR email = ?")
                .bind(&new.username)
                .bind(&new.email)
                .fetch_one(&self.pool)
                .await?;
        if existing > 0 {
            return Err(Error::validation("Username or email already registered"));
        }

        let id = Uuid::new_v4().to_string();
        let digest = auth::hash_password(&new.password)?;
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO users (id, username, email, full_name, password_digest, role, department, active, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?)",
        )
        .bind(&id)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.full_name)
        .bind(&digest)
        .bind(&new.role)
        .bind(&new.department)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_user(&id)
            .await?
            .ok_or_else(|| Error::Internal(anyhow::anyhow!("user not found after insert")))
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// List users visible under a policy scope.
    pub async fn list_users(&self, scope: &UserScope) -> Result<Vec<UserRow>> {
        with_timeout(async {
            let rows = match scope {
                UserScope::All => {
                    sqlx::query_as("SELECT * FROM users ORDER BY created_at ASC")
                        .fetch_all(&self.pool)
                        .await?
                }
                UserScope::Department(dept) => {
                    sqlx::query_as(
                        "SELECT * FROM users WHERE department = ? ORDER BY created_at ASC",
                    )
                    .bind(dept)
                    .fetch_all(&self.pool)
                    .await?
                }
            };
            Ok(rows)
        })
        .await
    }

    pub async fn user_count(&self) -> Result<i64> {
        Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?)
    }

    /// Count staff-role users, optionally limited to one department.
    pub async fn staff_count(&self, department: Option<&str>) -> Result<i64> {
        let count = match department {
            Some(dept) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM users WHERE role = 'staff' AND department = ?",
                )
                .bind(dept)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'staff'")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count)
    }

    /// Number of distinct departments across the user directory.
    pub async fn department_count(&self) -> Result<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(DISTINCT department) FROM users")
                .fetch_one(&self.pool)
                .await?,
        )
    }

    // ─── Seeding ─────────────────────────────────────────────────────────────

    /// Create the three default accounts when the user table is empty.
    ///
    /// Returns how many accounts were created (0 when the table already has
    /// users — seeding never overwrites live data).
    pub async fn seed_default_users(&self) -> Result<usize> {
        if self.user_count().await? > 0 {
            return Ok(0);
        }

        let defaults = [
            NewUser {
                username: "admin".into(),
                email: "admin@district.gov".into(),
                full_name: "System Administrator".into(),
                password: "admin123".into(),
                role: "administrator".into(),
                department: "Administration".into(),
            },
            NewUser {
                username: "dept_head".into(),
                email: "head@district.gov".into(),
                full_name: "Department Head".into(),
                password: "dept123".into(),
                role: "department_head".into(),
                department: "Public Works".into(),
            },
            NewUser {
                username: "staff".into(),
                email: "staff@district.gov".into(),
                full_name: "Staff Member".into(),
                password: "staff123".into(),
                role: "staff".into(),
                department: "Public Works".into(),
            },
        ];

        for user in &defaults {
            self.create_user(user).await?;
        }
        Ok(defaults.len())
    }
}
