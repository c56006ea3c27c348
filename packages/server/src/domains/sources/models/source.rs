use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::{SourceId, UserId, VaultId};

/// Kind of research artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "source_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Url,
    File,
    Note,
    Image,
}

impl SourceType {
    /// FILE and IMAGE sources carry an uploaded file
    pub fn is_stored_file(self) -> bool {
        matches!(self, SourceType::File | SourceType::Image)
    }

    /// IMAGE for `image/*` MIME types, FILE for everything else
    pub fn for_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            SourceType::Image
        } else {
            SourceType::File
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Url => "URL",
            SourceType::File => "FILE",
            SourceType::Note => "NOTE",
            SourceType::Image => "IMAGE",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Source {
    pub id: SourceId,
    pub vault_id: VaultId,
    pub added_by: UserId,
    pub source_type: SourceType,
    pub title: String,
    pub url: Option<String>,
    pub content: Option<String>,
    pub file_name: Option<String>,
    /// Relative path inside the file store
    pub file_path: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Source joined with the name of the member who added it
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SourceWithAuthor {
    #[sqlx(flatten)]
    pub source: Source,
    pub added_by_name: String,
}

/// Validated fields for a new source row
#[derive(Debug, Clone)]
pub struct NewSource {
    pub id: SourceId,
    pub vault_id: VaultId,
    pub added_by: UserId,
    pub source_type: SourceType,
    pub title: String,
    pub url: Option<String>,
    pub content: Option<String>,
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<i64>,
}

impl NewSource {
    pub fn new(vault_id: VaultId, added_by: UserId, source_type: SourceType, title: String) -> Self {
        Self {
            id: SourceId::new(),
            vault_id,
            added_by,
            source_type,
            title,
            url: None,
            content: None,
            file_name: None,
            file_path: None,
            mime_type: None,
            file_size: None,
        }
    }
}

// =============================================================================
// Source Queries
// =============================================================================

impl Source {
    pub async fn insert<'e, E>(new: NewSource, executor: E) -> Result<Self>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO sources (
                id, vault_id, added_by, source_type, title, url, content,
                file_name, file_path, mime_type, file_size
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(new.id)
        .bind(new.vault_id)
        .bind(new.added_by)
        .bind(new.source_type)
        .bind(new.title)
        .bind(new.url)
        .bind(new.content)
        .bind(new.file_name)
        .bind(new.file_path)
        .bind(new.mime_type)
        .bind(new.file_size)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: SourceId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM sources WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Sources of a vault with their author, newest first
    pub async fn find_for_vault(vault_id: VaultId, pool: &PgPool) -> Result<Vec<SourceWithAuthor>> {
        sqlx::query_as::<_, SourceWithAuthor>(
            r#"
            SELECT s.*, u.name AS added_by_name
            FROM sources s
            INNER JOIN users u ON u.id = s.added_by
            WHERE s.vault_id = $1
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .bind(vault_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn delete<'e, E>(id: SourceId, executor: E) -> Result<()>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("DELETE FROM sources WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Stored file paths of every source in a vault (removed from disk when the vault goes)
    pub async fn file_paths_for_vault(vault_id: VaultId, pool: &PgPool) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "SELECT file_path FROM sources WHERE vault_id = $1 AND file_path IS NOT NULL",
        )
        .bind(vault_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
