//! Crate-wide error taxonomy.
//!
//! Every fallible operation in the core surfaces one of these variants; the
//! REST layer maps each to an HTTP status (401/403/404/422/500). Nothing is
//! silently swallowed and nothing is retried.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing, malformed, expired, or unknown-subject credential.
    #[error("invalid authentication credentials")]
    Unauthenticated,

    /// Authenticated, but the access policy denies the operation.
    #[error("{0}")]
    Forbidden(String),

    /// A referenced task, user, or assignee does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Malformed input: bad date format, unknown enum value, duplicate
    /// username/email on registration.
    #[error("{0}")]
    Validation(String),

    /// Infrastructure failure (database, token signing, IO).
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl Error {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Error::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Internal(e.into())
    }
}
