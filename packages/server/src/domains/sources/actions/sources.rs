//! Source list, add, delete and download actions

use bytes::Bytes;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::common::validation;
use crate::common::{
    Actor, ApiError, ApiResult, AuthError, Permission, RequestContext, SourceId, VaultId,
};
use crate::domains::audit::models::{audit_log, AuditLog, NewAuditEntry};
use crate::domains::auth::User;
use crate::domains::sources::data::SourceData;
use crate::domains::sources::models::{NewSource, Source, SourceType};
use crate::domains::vaults::actions::{invalidate_member_vault_lists, notify_user};
use crate::domains::vaults::models::{Vault, VaultMember};
use crate::domains::vaults::Notification;
use crate::kernel::cache::{invalidate, read_through, source_list_key, SOURCE_LIST_TTL};
use crate::kernel::stream_hub::{SOURCE_ADDED, SOURCE_DELETED};
use crate::kernel::{ServerDeps, StreamHub};

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_NOTE_CHARS: usize = 50_000;

#[derive(Debug, Default, Deserialize)]
pub struct AddSourceInput {
    #[serde(rename = "type")]
    pub source_type: Option<SourceType>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
}

/// Bytes and headers of a stored source file
#[derive(Debug, Clone)]
pub struct SourceDownload {
    pub file_name: String,
    pub mime_type: String,
    pub data: Bytes,
}

/// List a vault's sources, newest first (read-through cached per vault)
pub async fn list_sources(
    ctx: &RequestContext,
    vault_id: VaultId,
    deps: &ServerDeps,
) -> ApiResult<Vec<SourceData>> {
    Actor::new(ctx.user_id)
        .can(Permission::ViewVault)
        .on(vault_id)
        .check(deps)
        .await?;

    read_through(
        deps.cache.as_ref(),
        &source_list_key(vault_id),
        SOURCE_LIST_TTL,
        || async {
            let sources = Source::find_for_vault(vault_id, &deps.db_pool).await?;
            Ok::<_, ApiError>(sources.into_iter().map(SourceData::from).collect())
        },
    )
    .await
}

/// Validate a JSON source body. Files go through the upload endpoint.
fn validate_input(
    input: AddSourceInput,
    vault_id: VaultId,
    ctx: &RequestContext,
) -> ApiResult<NewSource> {
    let source_type = input
        .source_type
        .ok_or_else(|| ApiError::BadRequest("type is required".into()))?;
    let title = validation::required_text("title", input.title.as_deref(), MAX_TITLE_CHARS)?;

    let mut new = NewSource::new(vault_id, ctx.user_id, source_type, title);
    match source_type {
        SourceType::Url => {
            new.url = Some(validation::http_url(input.url.as_deref())?);
            new.content =
                validation::optional_text("content", input.content.as_deref(), MAX_NOTE_CHARS)?;
        }
        SourceType::Note => {
            new.content = Some(validation::required_text(
                "content",
                input.content.as_deref(),
                MAX_NOTE_CHARS,
            )?);
        }
        SourceType::File | SourceType::Image => {
            return Err(ApiError::BadRequest(format!(
                "{} sources must be uploaded as multipart form data",
                source_type
            )));
        }
    }
    Ok(new)
}

/// Add a URL or NOTE source
pub async fn add_source(
    ctx: &RequestContext,
    vault_id: VaultId,
    input: AddSourceInput,
    deps: &ServerDeps,
) -> ApiResult<SourceData> {
    Actor::new(ctx.user_id)
        .can(Permission::AddSource)
        .on(vault_id)
        .check(deps)
        .await?;

    let new = validate_input(input, vault_id, ctx)?;
    insert_and_announce(ctx, new, deps).await
}

/// Insert the row with its audit entry, then fan out.
///
/// Shared by JSON and multipart creation.
pub(super) async fn insert_and_announce(
    ctx: &RequestContext,
    new: NewSource,
    deps: &ServerDeps,
) -> ApiResult<SourceData> {
    let vault_id = new.vault_id;

    let mut tx = deps.db_pool.begin().await?;

    let source = Source::insert(new, &mut *tx).await?;
    AuditLog::record(
        NewAuditEntry {
            vault_id: Some(vault_id),
            user_id: ctx.user_id,
            action: audit_log::SOURCE_ADDED,
            entity_type: "source",
            entity_id: Some(source.id.into_uuid()),
            details: json!({
                "title": source.title,
                "type": source.source_type,
                "fileSize": source.file_size,
            }),
            ip_address: ctx.ip(),
        },
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(
        vault_id = %vault_id,
        source_id = %source.id,
        source_type = %source.source_type,
        "Source added"
    );

    invalidate(deps.cache.as_ref(), vec![source_list_key(vault_id)]).await;
    invalidate_member_vault_lists(deps, vault_id).await;

    // The row is committed; lookups below only shape the announcement
    let author = match User::find_by_id(ctx.user_id, &deps.db_pool).await {
        Ok(user) => user.map(|user| user.name).unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Failed to load source author");
            String::new()
        }
    };
    let data = SourceData::new(source, author);

    deps.stream_hub
        .emit(&StreamHub::vault_topic(vault_id), SOURCE_ADDED, &data)
        .await;

    let vault = Vault::find_by_id(vault_id, &deps.db_pool).await;
    let members = VaultMember::user_ids(vault_id, &deps.db_pool).await;
    match (vault, members) {
        (Ok(vault), Ok(members)) => {
            let vault_name = vault.map(|vault| vault.name).unwrap_or_default();
            let notification = Notification::new(
                vault_id,
                format!(
                    "{} added \"{}\" to \"{}\"",
                    data.added_by_name, data.title, vault_name
                ),
            );
            for member_id in members.into_iter().filter(|id| *id != ctx.user_id) {
                notify_user(deps, member_id, &notification).await;
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            warn!(vault_id = %vault_id, error = %e, "Skipping source notifications")
        }
    }

    Ok(data)
}

/// Delete a source. Owners may delete any source, contributors only their own.
pub async fn delete_source(
    ctx: &RequestContext,
    vault_id: VaultId,
    source_id: SourceId,
    deps: &ServerDeps,
) -> ApiResult<()> {
    let member = Actor::new(ctx.user_id)
        .can(Permission::ViewVault)
        .on(vault_id)
        .check(deps)
        .await?;

    let source = Source::find_by_id(source_id, &deps.db_pool)
        .await?
        .filter(|source| source.vault_id == vault_id)
        .ok_or_else(|| ApiError::not_found("Source"))?;

    let own = source.added_by == ctx.user_id;
    let allowed = member.role.can(Permission::DeleteAnySource)
        || (own && member.role.can(Permission::DeleteOwnSource));
    if !allowed {
        let permission = if own {
            Permission::DeleteOwnSource
        } else {
            Permission::DeleteAnySource
        };
        return Err(AuthError::PermissionDenied {
            role: member.role,
            permission,
        }
        .into());
    }

    let mut tx = deps.db_pool.begin().await?;

    Source::delete(source_id, &mut *tx).await?;
    AuditLog::record(
        NewAuditEntry {
            vault_id: Some(vault_id),
            user_id: ctx.user_id,
            action: audit_log::SOURCE_DELETED,
            entity_type: "source",
            entity_id: Some(source_id.into_uuid()),
            details: json!({ "title": source.title, "type": source.source_type }),
            ip_address: ctx.ip(),
        },
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(vault_id = %vault_id, source_id = %source_id, "Source deleted");

    if let Some(path) = source.file_path.as_deref() {
        if let Err(e) = deps.file_store.delete(path).await {
            warn!(source_id = %source_id, error = %e, "Failed to remove stored file");
        }
    }

    invalidate(deps.cache.as_ref(), vec![source_list_key(vault_id)]).await;
    invalidate_member_vault_lists(deps, vault_id).await;

    deps.stream_hub
        .emit(
            &StreamHub::vault_topic(vault_id),
            SOURCE_DELETED,
            &json!({ "id": source_id, "vaultId": vault_id }),
        )
        .await;

    Ok(())
}

/// Fetch a stored FILE or IMAGE source for a member of its vault
pub async fn download_source(
    ctx: &RequestContext,
    source_id: SourceId,
    deps: &ServerDeps,
) -> ApiResult<SourceDownload> {
    let source = Source::find_by_id(source_id, &deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Source"))?;

    Actor::new(ctx.user_id)
        .can(Permission::ViewVault)
        .on(source.vault_id)
        .check(deps)
        .await?;

    let path = match (&source.file_path, source.source_type.is_stored_file()) {
        (Some(path), true) => path,
        _ => return Err(ApiError::NotFound("Source has no downloadable file".into())),
    };

    let data = deps.file_store.get(path).await.map_err(|e| {
        warn!(source_id = %source_id, error = %e, "Stored file is missing");
        ApiError::NotFound("Source file not found".into())
    })?;

    Ok(SourceDownload {
        file_name: source.file_name.unwrap_or(source.title),
        mime_type: source
            .mime_type
            .unwrap_or_else(|| "application/octet-stream".to_string()),
        data,
    })
}
