//! Identity resolution: bearer credential → `(role, department, id)`.
//!
//! The resolver verifies the token signature and expiry, then looks the
//! subject up in the user directory. Every failure mode — missing header,
//! bad signature, expired token, unknown or deactivated subject — collapses
//! to `Unauthenticated`. No side effects.

use crate::auth::TokenService;
use crate::error::{Error, Result};
use crate::policy::Role;
use crate::storage::{Storage, UserRow};

/// A verified caller: everything the access policy needs to decide.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub department: String,
}

impl Identity {
    /// Build an identity from a directory row. `None` when the stored role
    /// string is not one of the known roles.
    pub fn from_user(user: &UserRow) -> Option<Self> {
        Some(Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: Role::parse(&user.role)?,
            department: user.department.clone(),
        })
    }
}

/// Resolve a bearer token to the caller's identity.
pub async fn resolve(token: &str, tokens: &TokenService, storage: &Storage) -> Result<Identity> {
    let claims = tokens.verify(token)?;
    let user = storage
        .get_user_by_username(&claims.sub)
        .await?
        .ok_or(Error::Unauthenticated)?;
    if !user.active {
        return Err(Error::Unauthenticated);
    }
    Identity::from_user(&user).ok_or(Error::Unauthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewUser;

    async fn seeded_storage() -> (Storage, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).await.unwrap();
        storage.seed_default_users().await.unwrap();
        (storage, dir)
    }

    #[tokio::test]
    async fn valid_token_resolves() {
        let (storage, _dir) = seeded_storage().await;
        let tokens = TokenService::new(b"test-secret", 30);
        let token = tokens.issue("dept_head").unwrap();

        let identity = resolve(&token, &tokens, &storage).await.unwrap();
        assert_eq!(identity.username, "dept_head");
        assert_eq!(identity.role, Role::DepartmentHead);
        assert_eq!(identity.department, "Public Works");
    }

    #[tokio::test]
    async fn unknown_subject_is_unauthenticated() {
        let (storage, _dir) = seeded_storage().await;
        let tokens = TokenService::new(b"test-secret", 30);
        let token = tokens.issue("nobody").unwrap();
        assert!(matches!(
            resolve(&token, &tokens, &storage).await,
            Err(Error::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn tampered_token_is_unauthenticated() {
        let (storage, _dir) = seeded_storage().await;
        let tokens = TokenService::new(b"test-secret", 30);
        let forged = TokenService::new(b"other-secret", 30).issue("admin").unwrap();
        assert!(matches!(
            resolve(&forged, &tokens, &storage).await,
            Err(Error::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn unknown_stored_role_is_unauthenticated() {
        let (storage, _dir) = seeded_storage().await;
        // A row with a role the policy does not know cannot become an identity.
        let user = storage
            .create_user(&NewUser {
                username: "odd".into(),
                email: "odd@district.gov".into(),
                full_name: "Odd Role".into(),
                password: "pw".into(),
                role: "staff".into(),
                department: "Records".into(),
            })
            .await
            .unwrap();
        sqlx::query("UPDATE users SET role = 'intern' WHERE id = ?")
            .bind(&user.id)
            .execute(&storage.pool())
            .await
            .unwrap();

        let tokens = TokenService::new(b"test-secret", 30);
        let token = tokens.issue("odd").unwrap();
        assert!(matches!(
            resolve(&token, &tokens, &storage).await,
            Err(Error::Unauthenticated)
        ));
    }
}
