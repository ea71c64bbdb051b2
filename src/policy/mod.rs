//! Role-based access policy.
//!
//! Every user holds a `Role`. The role decides which task rows and which
//! dashboard figures a caller may see or mutate. All checks here are pure
//! functions over an [`Identity`] — no storage access, no side effects; the
//! stores execute whatever row scope the policy hands back.

use crate::error::Error;
use crate::identity::Identity;

// ─── Roles ───────────────────────────────────────────────────────────────────

/// Roles a district user can hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Unrestricted visibility and mutation rights.
    Administrator,
    /// Scoped to their own department.
    DepartmentHead,
    /// Sees only tasks assigned to them; cannot create tasks.
    Staff,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Administrator => "administrator",
            Role::DepartmentHead => "department_head",
            Role::Staff => "staff",
        };
        write!(f, "{}", s)
    }
}

impl Role {
    /// Parse a role from its stored string identifier.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "administrator" => Some(Role::Administrator),
            "department_head" => Some(Role::DepartmentHead),
            "staff" => Some(Role::Staff),
            _ => None,
        }
    }
}

// ─── Row scopes ──────────────────────────────────────────────────────────────

/// Which task rows a caller may see. Applied before any optional query
/// filters — filters only narrow the scoped set, never widen it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskScope {
    /// Administrator: unrestricted.
    All,
    /// Department head: rows whose department matches.
    Department(String),
    /// Staff: rows assigned to this user id.
    Assignee(String),
}

/// Which user rows a caller may list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserScope {
    /// Administrator: all users.
    All,
    /// Department head: same-department users only.
    Department(String),
}

// ─── Checks ──────────────────────────────────────────────────────────────────

/// Task creation and core-field edits: denied for staff.
pub fn ensure_can_create_tasks(caller: &Identity) -> Result<(), Error> {
    match caller.role {
        Role::Staff => Err(Error::forbidden("Staff cannot create tasks")),
        Role::Administrator | Role::DepartmentHead => Ok(()),
    }
}

/// Status updates: administrator, department head of the task's department,
/// or the task's assignee. Everyone else is denied.
pub fn ensure_can_update_status(
    caller: &Identity,
    task_department: &str,
    task_assignee_id: &str,
) -> Result<(), Error> {
    let allowed = caller.id == task_assignee_id
        || match caller.role {
            Role::Administrator => true,
            Role::DepartmentHead => caller.department == task_department,
            Role::Staff => false,
        };

    if allowed {
        Ok(())
    } else {
        Err(Error::forbidden("Not authorized to update this task"))
    }
}

/// Row scope for task listing.
pub fn task_scope(caller: &Identity) -> TaskScope {
    match caller.role {
        Role::Administrator => TaskScope::All,
        Role::DepartmentHead => TaskScope::Department(caller.department.clone()),
        Role::Staff => TaskScope::Assignee(caller.id.clone()),
    }
}

/// Row scope for user listing. Staff may not list users at all.
pub fn user_scope(caller: &Identity) -> Result<UserScope, Error> {
    match caller.role {
        Role::Administrator => Ok(UserScope::All),
        Role::DepartmentHead => Ok(UserScope::Department(caller.department.clone())),
        Role::Staff => Err(Error::forbidden("Not enough permissions")),
    }
}

/// Analytics and prediction endpoints: denied for staff.
pub fn ensure_can_view_analytics(caller: &Identity) -> Result<(), Error> {
    match caller.role {
        Role::Staff => Err(Error::forbidden("Access denied")),
        Role::Administrator | Role::DepartmentHead => Ok(()),
    }
}
