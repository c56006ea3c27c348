use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{SourceId, UserId, VaultId};
use crate::domains::sources::models::{Source, SourceType, SourceWithAuthor};

/// A source as returned to vault members. The storage path stays server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceData {
    pub id: SourceId,
    pub vault_id: VaultId,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub title: String,
    pub url: Option<String>,
    pub content: Option<String>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
    pub added_by: UserId,
    pub added_by_name: String,
    pub created_at: DateTime<Utc>,
}

impl SourceData {
    pub fn new(source: Source, added_by_name: impl Into<String>) -> Self {
        Self {
            id: source.id,
            vault_id: source.vault_id,
            source_type: source.source_type,
            title: source.title,
            url: source.url,
            content: source.content,
            file_name: source.file_name,
            mime_type: source.mime_type,
            file_size: source.file_size,
            added_by: source.added_by,
            added_by_name: added_by_name.into(),
            created_at: source.created_at,
        }
    }
}

impl From<SourceWithAuthor> for SourceData {
    fn from(row: SourceWithAuthor) -> Self {
        Self::new(row.source, row.added_by_name)
    }
}
