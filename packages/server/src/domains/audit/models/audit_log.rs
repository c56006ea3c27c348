use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::common::{AuditLogId, UserId, VaultId};

// Actions recorded in the audit log
pub const VAULT_CREATED: &str = "VAULT_CREATED";
pub const VAULT_UPDATED: &str = "VAULT_UPDATED";
pub const VAULT_DELETED: &str = "VAULT_DELETED";
pub const SOURCE_ADDED: &str = "SOURCE_ADDED";
pub const SOURCE_DELETED: &str = "SOURCE_DELETED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const MEMBER_ROLE_UPDATED: &str = "MEMBER_ROLE_UPDATED";
pub const MEMBER_REMOVED: &str = "MEMBER_REMOVED";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: AuditLogId,
    pub vault_id: Option<VaultId>,
    pub user_id: Option<UserId>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Audit entry joined with the acting user's email
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuditLogWithUser {
    #[sqlx(flatten)]
    pub entry: AuditLog,
    pub user_email: Option<String>,
}

/// Position in a vault's log: entries strictly older than `created_at`, or
/// equally old with a smaller id when `id` is given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditCursor {
    pub created_at: DateTime<Utc>,
    pub id: Option<AuditLogId>,
}

/// Entry to be written
#[derive(Debug, Clone)]
pub struct NewAuditEntry<'a> {
    pub vault_id: Option<VaultId>,
    pub user_id: UserId,
    pub action: &'a str,
    pub entity_type: &'a str,
    pub entity_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub ip_address: Option<&'a str>,
}

// =============================================================================
// AuditLog Queries
// =============================================================================

impl AuditLog {
    /// Append an entry. Accepts a pool or an open transaction.
    pub async fn record<'e, E>(entry: NewAuditEntry<'_>, executor: E) -> Result<Self>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO audit_logs (id, vault_id, user_id, action, entity_type, entity_id, details, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(AuditLogId::new())
        .bind(entry.vault_id)
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.details)
        .bind(entry.ip_address)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Newest-first page of a vault's log.
    ///
    /// The cursor is the last entry of the previous page. Entries sharing its
    /// timestamp are ordered by id, so none are skipped between pages.
    pub async fn find_for_vault(
        vault_id: VaultId,
        before: Option<AuditCursor>,
        limit: i64,
        pool: &PgPool,
    ) -> Result<Vec<AuditLogWithUser>> {
        let (before_at, before_id) = match before {
            Some(cursor) => (Some(cursor.created_at), cursor.id),
            None => (None, None),
        };

        sqlx::query_as::<_, AuditLogWithUser>(
            r#"
            SELECT a.*, u.email AS user_email
            FROM audit_logs a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.vault_id = $1
              AND (
                $2::timestamptz IS NULL
                OR a.created_at < $2
                OR (a.created_at = $2 AND $3::uuid IS NOT NULL AND a.id < $3)
              )
            ORDER BY a.created_at DESC, a.id DESC
            LIMIT $4
            "#,
        )
        .bind(vault_id)
        .bind(before_at)
        .bind(before_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
