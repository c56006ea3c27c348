//! Vault CRUD actions

use serde::{Deserialize, Deserializer};
use serde_json::json;
use tracing::{info, warn};

use super::fanout::{invalidate_member_vault_lists, invalidate_vault_lists, notify_user};
use crate::common::validation;
use crate::common::{Actor, ApiError, ApiResult, Permission, RequestContext, Role, VaultId};
use crate::domains::audit::models::{audit_log, AuditLog, NewAuditEntry};
use crate::domains::sources::models::Source;
use crate::domains::vaults::data::{Notification, VaultData};
use crate::domains::vaults::models::{Vault, VaultMember, VaultSummary};
use crate::kernel::cache::{
    invalidate, read_through, source_list_key, vault_list_key, VAULT_LIST_TTL,
};
use crate::kernel::stream_hub::{VAULT_CREATED, VAULT_DELETED, VAULT_UPDATED};
use crate::kernel::{ServerDeps, StreamHub};

pub const MAX_NAME_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct CreateVaultInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateVaultInput {
    pub name: Option<String>,
    /// Absent leaves the description alone; `null` or blank clears it
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
}

/// Distinguish an explicit `null` from an absent field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// List the caller's vaults, newest first (read-through cached per user)
pub async fn list_vaults(ctx: &RequestContext, deps: &ServerDeps) -> ApiResult<Vec<VaultData>> {
    let key = vault_list_key(ctx.user_id);
    read_through(deps.cache.as_ref(), &key, VAULT_LIST_TTL, || async {
        let vaults = Vault::find_for_user(ctx.user_id, &deps.db_pool).await?;
        Ok::<_, ApiError>(vaults.into_iter().map(VaultData::from).collect())
    })
    .await
}

/// Create a vault owned by the caller.
///
/// The vault, the owner membership and the audit entry commit together.
pub async fn create_vault(
    ctx: &RequestContext,
    input: CreateVaultInput,
    deps: &ServerDeps,
) -> ApiResult<VaultData> {
    let name = validation::required_text("name", input.name.as_deref(), MAX_NAME_CHARS)?;
    let description = validation::optional_text(
        "description",
        input.description.as_deref(),
        MAX_DESCRIPTION_CHARS,
    )?;

    let mut tx = deps.db_pool.begin().await?;

    let vault = Vault::insert(&name, description.as_deref(), ctx.user_id, &mut *tx).await?;
    VaultMember::insert(vault.id, ctx.user_id, Role::Owner, &mut *tx).await?;
    AuditLog::record(
        NewAuditEntry {
            vault_id: Some(vault.id),
            user_id: ctx.user_id,
            action: audit_log::VAULT_CREATED,
            entity_type: "vault",
            entity_id: Some(vault.id.into_uuid()),
            details: json!({ "name": vault.name }),
            ip_address: ctx.ip(),
        },
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(vault_id = %vault.id, user_id = %ctx.user_id, "Vault created");

    invalidate(deps.cache.as_ref(), vec![vault_list_key(ctx.user_id)]).await;

    let data = VaultData::new_owned(vault);
    deps.stream_hub
        .emit(&StreamHub::user_topic(ctx.user_id), VAULT_CREATED, &data)
        .await;

    Ok(data)
}

/// Fetch one vault with the caller's role
pub async fn get_vault(
    ctx: &RequestContext,
    vault_id: VaultId,
    deps: &ServerDeps,
) -> ApiResult<VaultData> {
    Actor::new(ctx.user_id)
        .can(Permission::ViewVault)
        .on(vault_id)
        .check(deps)
        .await?;

    Vault::find_summary(vault_id, ctx.user_id, &deps.db_pool)
        .await?
        .map(VaultData::from)
        .ok_or_else(|| ApiError::not_found("Vault"))
}

/// Rename a vault or change its description. Owner only.
pub async fn update_vault(
    ctx: &RequestContext,
    vault_id: VaultId,
    input: UpdateVaultInput,
    deps: &ServerDeps,
) -> ApiResult<VaultData> {
    Actor::new(ctx.user_id)
        .can(Permission::UpdateVault)
        .on(vault_id)
        .check(deps)
        .await?;

    let name = match input.name.as_deref() {
        Some(raw) => Some(validation::required_text("name", Some(raw), MAX_NAME_CHARS)?),
        None => None,
    };
    let description = match input.description {
        Some(raw) => Some(validation::optional_text(
            "description",
            raw.as_deref(),
            MAX_DESCRIPTION_CHARS,
        )?),
        None => None,
    };

    if name.is_none() && description.is_none() {
        return Err(ApiError::BadRequest("Nothing to update".into()));
    }

    let summary = Vault::find_summary(vault_id, ctx.user_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Vault"))?;

    let mut tx = deps.db_pool.begin().await?;

    let vault = Vault::update(
        vault_id,
        name.as_deref(),
        description.as_ref().map(|d| d.as_deref()),
        &mut *tx,
    )
    .await?;
    AuditLog::record(
        NewAuditEntry {
            vault_id: Some(vault_id),
            user_id: ctx.user_id,
            action: audit_log::VAULT_UPDATED,
            entity_type: "vault",
            entity_id: Some(vault_id.into_uuid()),
            details: json!({ "name": name, "description": description }),
            ip_address: ctx.ip(),
        },
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(vault_id = %vault_id, "Vault updated");

    invalidate_member_vault_lists(deps, vault_id).await;

    let data = VaultData::from(VaultSummary { vault, ..summary });

    deps.stream_hub
        .emit(&StreamHub::vault_topic(vault_id), VAULT_UPDATED, &data)
        .await;

    Ok(data)
}

/// Delete a vault with everything in it. Owner only.
pub async fn delete_vault(
    ctx: &RequestContext,
    vault_id: VaultId,
    deps: &ServerDeps,
) -> ApiResult<()> {
    Actor::new(ctx.user_id)
        .can(Permission::DeleteVault)
        .on(vault_id)
        .check(deps)
        .await?;

    let vault = Vault::find_by_id(vault_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Vault"))?;
    let member_ids = VaultMember::user_ids(vault_id, &deps.db_pool).await?;
    let file_paths = Source::file_paths_for_vault(vault_id, &deps.db_pool).await?;

    let mut tx = deps.db_pool.begin().await?;

    Vault::delete(vault_id, &mut *tx).await?;
    // Vault entries cascade with the vault, so this one is kept vault-less
    AuditLog::record(
        NewAuditEntry {
            vault_id: None,
            user_id: ctx.user_id,
            action: audit_log::VAULT_DELETED,
            entity_type: "vault",
            entity_id: Some(vault_id.into_uuid()),
            details: json!({ "name": vault.name, "files_removed": file_paths.len() }),
            ip_address: ctx.ip(),
        },
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(vault_id = %vault_id, members = member_ids.len(), "Vault deleted");

    for path in &file_paths {
        if let Err(e) = deps.file_store.delete(path).await {
            warn!(path = %path, error = %e, "Failed to remove stored file of deleted vault");
        }
    }

    invalidate_vault_lists(deps, &member_ids).await;
    invalidate(deps.cache.as_ref(), vec![source_list_key(vault_id)]).await;

    deps.stream_hub
        .emit(
            &StreamHub::vault_topic(vault_id),
            VAULT_DELETED,
            &json!({ "id": vault_id, "name": vault.name }),
        )
        .await;

    let notification = Notification::new(vault_id, format!("Vault \"{}\" was deleted", vault.name));
    for member_id in member_ids.into_iter().filter(|id| *id != ctx.user_id) {
        notify_user(deps, member_id, &notification).await;
    }

    Ok(())
}
