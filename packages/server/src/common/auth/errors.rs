use thiserror::Error;

use super::{Permission, Role};

/// Authentication and vault authorization failures.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Vault not found")]
    VaultNotFound,

    #[error("You are not a member of this vault")]
    NotAMember,

    #[error("Role {role} cannot {permission}")]
    PermissionDenied { role: Role, permission: Permission },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
