//! Vault membership actions

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::fanout::{invalidate_member_vault_lists, invalidate_vault_lists, notify_user};
use crate::common::error::is_unique_violation;
use crate::common::validation;
use crate::common::{
    Actor, ApiError, ApiResult, Permission, RequestContext, Role, UserId, VaultId,
};
use crate::domains::audit::models::{audit_log, AuditLog, NewAuditEntry};
use crate::domains::auth::User;
use crate::domains::vaults::data::{MemberData, Notification};
use crate::domains::vaults::models::{Vault, VaultMember, VaultMemberWithUser};
use crate::kernel::stream_hub::{MEMBER_ADDED, MEMBER_REMOVED, MEMBER_UPDATED};
use crate::kernel::{ServerDeps, StreamHub};

#[derive(Debug, Default, Deserialize)]
pub struct AddMemberInput {
    pub email: Option<String>,
    /// Defaults to VIEWER
    pub role: Option<Role>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateMemberInput {
    pub role: Option<Role>,
}

fn assignable(role: Role) -> ApiResult<Role> {
    if role.is_assignable() {
        Ok(role)
    } else {
        Err(ApiError::BadRequest(format!("Role {} cannot be assigned", role)))
    }
}

/// List a vault's members. Any member may view.
pub async fn list_members(
    ctx: &RequestContext,
    vault_id: VaultId,
    deps: &ServerDeps,
) -> ApiResult<Vec<MemberData>> {
    Actor::new(ctx.user_id)
        .can(Permission::ViewVault)
        .on(vault_id)
        .check(deps)
        .await?;

    let members = VaultMember::find_for_vault(vault_id, &deps.db_pool).await?;
    Ok(members.into_iter().map(MemberData::from).collect())
}

/// Invite a registered user by email. Owner only.
pub async fn add_member(
    ctx: &RequestContext,
    vault_id: VaultId,
    input: AddMemberInput,
    deps: &ServerDeps,
) -> ApiResult<MemberData> {
    Actor::new(ctx.user_id)
        .can(Permission::ManageMembers)
        .on(vault_id)
        .check(deps)
        .await?;

    let email = validation::normalize_email(input.email.as_deref())?;
    let role = assignable(input.role.unwrap_or(Role::Viewer))?;

    let user = User::find_by_email(&email, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    let vault = Vault::find_by_id(vault_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Vault"))?;

    let mut tx = deps.db_pool.begin().await?;

    let member = match VaultMember::insert(vault_id, user.id, role, &mut *tx).await {
        Ok(member) => member,
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Conflict(
                "User is already a member of this vault".into(),
            ))
        }
        Err(e) => return Err(e.into()),
    };
    AuditLog::record(
        NewAuditEntry {
            vault_id: Some(vault_id),
            user_id: ctx.user_id,
            action: audit_log::MEMBER_ADDED,
            entity_type: "member",
            entity_id: Some(user.id.into_uuid()),
            details: json!({ "email": user.email, "role": role }),
            ip_address: ctx.ip(),
        },
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(vault_id = %vault_id, user_id = %user.id, role = %role, "Member added");

    invalidate_member_vault_lists(deps, vault_id).await;

    let data = MemberData {
        user_id: user.id,
        email: user.email,
        name: user.name,
        role: member.role,
        joined_at: member.created_at,
    };

    deps.stream_hub
        .emit(&StreamHub::vault_topic(vault_id), MEMBER_ADDED, &data)
        .await;

    let message = format!("You were added to \"{}\" as {}", vault.name, role);
    notify_user(deps, user.id, &Notification::new(vault_id, message)).await;

    Ok(data)
}

/// Change a member's role. Owner only; the owner's own role is fixed.
pub async fn update_member_role(
    ctx: &RequestContext,
    vault_id: VaultId,
    user_id: UserId,
    input: UpdateMemberInput,
    deps: &ServerDeps,
) -> ApiResult<MemberData> {
    Actor::new(ctx.user_id)
        .can(Permission::ManageMembers)
        .on(vault_id)
        .check(deps)
        .await?;

    let role = input
        .role
        .ok_or_else(|| ApiError::BadRequest("role is required".into()))?;
    let role = assignable(role)?;

    let existing = VaultMember::find_with_user(vault_id, user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Member"))?;
    let previous = existing.member.role;
    if previous == Role::Owner {
        return Err(ApiError::BadRequest(
            "The vault owner's role cannot be changed".into(),
        ));
    }

    let mut tx = deps.db_pool.begin().await?;

    let member = VaultMember::update_role(vault_id, user_id, role, &mut *tx).await?;
    AuditLog::record(
        NewAuditEntry {
            vault_id: Some(vault_id),
            user_id: ctx.user_id,
            action: audit_log::MEMBER_ROLE_UPDATED,
            entity_type: "member",
            entity_id: Some(user_id.into_uuid()),
            details: json!({ "from": previous, "to": role }),
            ip_address: ctx.ip(),
        },
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(vault_id = %vault_id, user_id = %user_id, from = %previous, to = %role, "Member role updated");

    invalidate_vault_lists(deps, &[user_id]).await;

    let data = MemberData::from(VaultMemberWithUser {
        member,
        ..existing
    });

    deps.stream_hub
        .emit(&StreamHub::vault_topic(vault_id), MEMBER_UPDATED, &data)
        .await;
    notify_user(
        deps,
        user_id,
        &Notification::new(vault_id, format!("Your role was changed to {}", role)),
    )
    .await;

    Ok(data)
}

/// Remove a member. The owner may remove anyone but themselves; any other
/// member may remove only themselves (leave).
pub async fn remove_member(
    ctx: &RequestContext,
    vault_id: VaultId,
    user_id: UserId,
    deps: &ServerDeps,
) -> ApiResult<()> {
    let leaving = user_id == ctx.user_id;
    let permission = if leaving {
        Permission::ViewVault
    } else {
        Permission::ManageMembers
    };
    Actor::new(ctx.user_id)
        .can(permission)
        .on(vault_id)
        .check(deps)
        .await?;

    let existing = VaultMember::find(vault_id, user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Member"))?;
    if existing.role == Role::Owner {
        return Err(ApiError::BadRequest(
            "The vault owner cannot be removed".into(),
        ));
    }

    let mut tx = deps.db_pool.begin().await?;

    VaultMember::delete(vault_id, user_id, &mut *tx).await?;
    AuditLog::record(
        NewAuditEntry {
            vault_id: Some(vault_id),
            user_id: ctx.user_id,
            action: audit_log::MEMBER_REMOVED,
            entity_type: "member",
            entity_id: Some(user_id.into_uuid()),
            details: json!({ "role": existing.role, "left": leaving }),
            ip_address: ctx.ip(),
        },
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(vault_id = %vault_id, user_id = %user_id, leaving, "Member removed");

    // The removed user's list changes too, and they are no longer a member
    invalidate_vault_lists(deps, &[user_id]).await;
    invalidate_member_vault_lists(deps, vault_id).await;

    deps.stream_hub
        .emit(
            &StreamHub::vault_topic(vault_id),
            MEMBER_REMOVED,
            &json!({ "vaultId": vault_id, "userId": user_id }),
        )
        .await;

    if !leaving {
        notify_user(
            deps,
            user_id,
            &Notification::new(vault_id, "You were removed from a vault"),
        )
        .await;
    }

    Ok(())
}
