/// Vault authorization
///
/// Provides a fluent API for role checks in domain actions:
///
/// ```ignore
/// use crate::common::auth::{Actor, Permission};
///
/// Actor::new(user_id)
///     .can(Permission::ManageMembers)
///     .on(vault_id)
///     .check(deps)
///     .await?;
/// ```
///
/// Checks live in the action layer, not in the HTTP handlers.

mod builder;
mod errors;
mod role;

pub use builder::{authorize_member, Actor, HasAuthContext, PermissionBuilder, VaultAccessCheck};
pub use errors::AuthError;
pub use role::{Permission, Role};
