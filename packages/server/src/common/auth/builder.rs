use sqlx::PgPool;

use super::{AuthError, Permission};
use crate::common::entity_ids::{UserId, VaultId};
use crate::domains::vaults::models::{Vault, VaultMember};

/// Entry point for vault authorization checks
///
/// Usage:
/// ```ignore
/// let membership = Actor::new(user_id)
///     .can(Permission::AddSource)
///     .on(vault_id)
///     .check(deps)
///     .await?;
/// ```
pub struct Actor {
    user_id: UserId,
}

impl Actor {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    /// Specify what the actor wants to do
    pub fn can(self, permission: Permission) -> PermissionBuilder {
        PermissionBuilder {
            user_id: self.user_id,
            permission,
        }
    }
}

/// Builder after specifying the permission
pub struct PermissionBuilder {
    user_id: UserId,
    permission: Permission,
}

impl PermissionBuilder {
    /// Specify which vault the permission applies to
    pub fn on(self, vault_id: VaultId) -> VaultAccessCheck {
        VaultAccessCheck {
            user_id: self.user_id,
            permission: self.permission,
            vault_id,
        }
    }
}

/// Fully specified check, ready to run against the database
pub struct VaultAccessCheck {
    user_id: UserId,
    permission: Permission,
    vault_id: VaultId,
}

impl VaultAccessCheck {
    /// Perform the check, returning the caller's membership row on success
    pub async fn check<D>(self, deps: &D) -> Result<VaultMember, AuthError>
    where
        D: HasAuthContext,
    {
        let pool = deps.db_pool();

        if !Vault::exists(self.vault_id, pool).await? {
            return Err(AuthError::VaultNotFound);
        }

        let member = VaultMember::find(self.vault_id, self.user_id, pool).await?;
        authorize_member(member, self.permission)
    }
}

/// Trait for dependencies that can perform auth checks
pub trait HasAuthContext: Send + Sync {
    fn db_pool(&self) -> &PgPool;
}

/// Core permission check once the membership lookup has happened
pub fn authorize_member(
    member: Option<VaultMember>,
    permission: Permission,
) -> Result<VaultMember, AuthError> {
    let member = member.ok_or(AuthError::NotAMember)?;

    if !member.role.can(permission) {
        return Err(AuthError::PermissionDenied {
            role: member.role,
            permission,
        });
    }

    Ok(member)
}
