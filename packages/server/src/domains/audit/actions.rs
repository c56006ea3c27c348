//! Audit domain actions

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::common::{
    Actor, ApiError, ApiResult, AuditLogId, Permission, RequestContext, VaultId,
};
use crate::domains::audit::data::AuditEntryData;
use crate::domains::audit::models::{AuditCursor, AuditLog};
use crate::kernel::ServerDeps;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
    /// RFC 3339 timestamp; only entries strictly older are returned
    pub before: Option<String>,
    /// Id of the last entry already seen. Together with `before` it pages
    /// through entries that share a timestamp.
    #[serde(rename = "beforeId")]
    pub before_id: Option<AuditLogId>,
}

impl AuditQuery {
    pub fn page_size(&self) -> i64 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn cursor(&self) -> ApiResult<Option<AuditCursor>> {
        let created_at = match self.before.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(raw)
                    .map(|ts| ts.with_timezone(&Utc))
                    .map_err(|_| {
                        ApiError::BadRequest("before must be an RFC 3339 timestamp".into())
                    })?,
            ),
        };

        match (created_at, self.before_id) {
            (Some(created_at), id) => Ok(Some(AuditCursor { created_at, id })),
            (None, Some(_)) => Err(ApiError::BadRequest(
                "beforeId requires before".into(),
            )),
            (None, None) => Ok(None),
        }
    }
}

/// List a vault's audit log, newest first. Owner only.
pub async fn list_audit(
    ctx: &RequestContext,
    vault_id: VaultId,
    query: AuditQuery,
    deps: &ServerDeps,
) -> ApiResult<Vec<AuditEntryData>> {
    Actor::new(ctx.user_id)
        .can(Permission::ViewAudit)
        .on(vault_id)
        .check(deps)
        .await?;

    let before = query.cursor()?;
    let entries =
        AuditLog::find_for_vault(vault_id, before, query.page_size(), &deps.db_pool).await?;

    Ok(entries.into_iter().map(AuditEntryData::from).collect())
}
