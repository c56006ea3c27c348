use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{AuditLogId, UserId, VaultId};
use crate::domains::audit::models::AuditLogWithUser;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryData {
    pub id: AuditLogId,
    pub vault_id: Option<VaultId>,
    pub user_id: Option<UserId>,
    pub user_email: Option<String>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogWithUser> for AuditEntryData {
    fn from(row: AuditLogWithUser) -> Self {
        let entry = row.entry;
        Self {
            id: entry.id,
            vault_id: entry.vault_id,
            user_id: entry.user_id,
            user_email: row.user_email,
            action: entry.action,
            entity_type: entry.entity_type,
            entity_id: entry.entity_id,
            details: entry.details,
            ip_address: entry.ip_address,
            created_at: entry.created_at,
        }
    }
}
