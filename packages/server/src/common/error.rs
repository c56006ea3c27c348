//! Errors returned by domain actions.
//!
//! Each variant maps to one HTTP status; `server::error` renders them into the
//! `{ "success": false, "error": ... }` envelope.

use thiserror::Error;

use super::auth::AuthError;
use super::validation::ValidationError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    /// 400
    #[error("{0}")]
    BadRequest(String),

    /// 401
    #[error("{0}")]
    Unauthorized(String),

    /// 403
    #[error("{0}")]
    Forbidden(String),

    /// 404
    #[error("{0}")]
    NotFound(String),

    /// 409
    #[error("{0}")]
    Conflict(String),

    /// 429
    #[error("{0}")]
    RateLimited(String),

    /// 500. The wrapped error is logged, never shown to the client.
    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{} not found", what))
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::BadRequest(err.0)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationRequired
            | AuthError::InvalidToken
            | AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::VaultNotFound => Self::NotFound(err.to_string()),
            AuthError::NotAMember | AuthError::PermissionDenied { .. } => {
                Self::Forbidden(err.to_string())
            }
            AuthError::DatabaseError(e) => Self::Internal(e.into()),
            AuthError::InternalError(e) => Self::Internal(e),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

/// Whether a database error is a unique-constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
