// rest/routes/auth.rs — login, registration, self-lookup, user listing.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::user_json;
use crate::auth;
use crate::error::{Error, Result};
use crate::identity::Identity;
use crate::policy;
use crate::storage::NewUser;
use crate::AppContext;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /auth/login` — exchange username + password for a bearer token.
///
/// A wrong username and a wrong password are indistinguishable to the caller.
pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let user = ctx
        .storage
        .get_user_by_username(&body.username)
        .await?
        .filter(|u| u.active && auth::verify_password(&body.password, &u.password_digest))
        .ok_or(Error::Unauthenticated)?;

    let token = ctx.tokens.issue(&user.username)?;
    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "user": user_json(&user),
    })))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: String,
    pub department: String,
}

/// `POST /auth/register` — create an account. Duplicate username or email
/// is a 422.
pub async fn register(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<Value>> {
    let user = ctx
        .storage
        .create_user(&NewUser {
            username: body.username,
            email: body.email,
            full_name: body.full_name,
            password: body.password,
            role: body.role,
            department: body.department,
        })
        .await?;
    Ok(Json(user_json(&user)))
}

/// `GET /auth/me` — the caller's own directory record.
pub async fn me(State(ctx): State<Arc<AppContext>>, caller: Identity) -> Result<Json<Value>> {
    let user = ctx
        .storage
        .get_user(&caller.id)
        .await?
        .ok_or(Error::Unauthenticated)?;
    Ok(Json(user_json(&user)))
}

/// `GET /auth/users` — role-scoped user listing. Staff are denied;
/// department heads see their own department; administrators see everyone.
pub async fn list_users(
    State(ctx): State<Arc<AppContext>>,
    caller: Identity,
) -> Result<Json<Value>> {
    let scope = policy::user_scope(&caller)?;
    let users = ctx.storage.list_users(&scope).await?;
    let list: Vec<Value> = users.iter().map(user_json).collect();
    Ok(Json(Value::Array(list)))
}
