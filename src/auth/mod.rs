//! Credential primitives: Argon2id password digests and HS256 bearer tokens.
//!
//! The rest of the crate treats both as opaque — only this module knows the
//! digest format or the token claims layout.

use anyhow::Context as _;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ─── Password hashing ────────────────────────────────────────────────────────

/// Hash a plaintext password with Argon2id and a fresh random salt.
pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| Error::Internal(anyhow::anyhow!("password hashing failed: {e}")))?;
    Ok(digest.to_string())
}

/// Check a plaintext password against a stored digest.
///
/// Returns `false` for a wrong password or an unparseable digest — callers
/// only need the yes/no answer.
pub fn verify_password(plaintext: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

// ─── Bearer tokens ───────────────────────────────────────────────────────────

/// JWT claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the username.
    pub sub: String,
    /// Expiration time (unix seconds).
    pub exp: i64,
    /// Issued at (unix seconds).
    pub iat: i64,
}

/// Issues and verifies HS256 access tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_minutes: i64,
}

impl TokenService {
    pub fn new(secret: &[u8], expiry_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            expiry_minutes,
        }
    }

    /// Issue a signed token for `username`, expiring after the configured TTL.
    pub fn issue(&self, username: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::minutes(self.expiry_minutes)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .context("token signing failed")
            .map_err(Error::Internal)
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// Every decode failure (bad signature, garbage input, expired token)
    /// collapses to `Unauthenticated` — callers never learn which check failed.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| Error::Unauthenticated)
    }
}
