pub mod analytics;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod tasks;

use serde_json::{json, Value};

use crate::storage::UserRow;

/// Transfer representation of a user — everything except the password digest.
pub(crate) fn user_json(user: &UserRow) -> Value {
    json!({
        "id": user.id,
        "username": user.username,
        "full_name": user.full_name,
        "email": user.email,
        "role": user.role,
        "department": user.department,
        "is_active": user.active,
        "created_at": user.created_at,
    })
}
