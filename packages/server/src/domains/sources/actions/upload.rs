//! Multipart upload of FILE and IMAGE sources

use bytes::Bytes;
use tracing::warn;

use super::sources::{insert_and_announce, MAX_TITLE_CHARS};
use crate::common::validation;
use crate::common::{Actor, ApiError, ApiResult, Permission, RequestContext, VaultId};
use crate::domains::sources::data::SourceData;
use crate::domains::sources::models::{NewSource, SourceType};
use crate::kernel::ServerDeps;

const FALLBACK_MIME: &str = "application/octet-stream";

/// Parts of a multipart upload, already read by the HTTP layer
#[derive(Debug, Clone, Default)]
pub struct UploadInput {
    pub title: Option<String>,
    pub file_name: Option<String>,
    /// Content-Type declared by the client for the file part
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadInput {
    /// Declared MIME type unless it is missing or generic, then a guess from the file name
    pub fn mime_type(&self) -> String {
        match self.content_type.as_deref().map(str::trim) {
            Some(declared) if !declared.is_empty() && declared != FALLBACK_MIME => {
                declared.to_ascii_lowercase()
            }
            _ => self
                .file_name
                .as_deref()
                .and_then(|name| mime_guess::from_path(name).first_raw())
                .unwrap_or(FALLBACK_MIME)
                .to_string(),
        }
    }
}

/// Store an uploaded file and add it as a source.
///
/// The file is written to `{vault_id}/{source_id}` before the row is
/// inserted and removed again if the insert fails.
pub async fn upload_source(
    ctx: &RequestContext,
    vault_id: VaultId,
    input: UploadInput,
    deps: &ServerDeps,
) -> ApiResult<SourceData> {
    Actor::new(ctx.user_id)
        .can(Permission::AddSource)
        .on(vault_id)
        .check(deps)
        .await?;

    if input.data.is_empty() {
        return Err(ApiError::BadRequest("file is required".into()));
    }
    if input.data.len() > deps.max_upload_bytes {
        return Err(ApiError::BadRequest(format!(
            "file exceeds the {} byte upload limit",
            deps.max_upload_bytes
        )));
    }

    let file_name = validation::optional_text("file name", input.file_name.as_deref(), 255)?
        .unwrap_or_else(|| "upload".to_string());
    let title = match validation::optional_text("title", input.title.as_deref(), MAX_TITLE_CHARS)? {
        Some(title) => title,
        None => validation::required_text("title", Some(&file_name), MAX_TITLE_CHARS)?,
    };
    let mime_type = input.mime_type();
    let source_type = SourceType::for_mime(&mime_type);

    let mut new = NewSource::new(vault_id, ctx.user_id, source_type, title);
    let key = format!("{}/{}", vault_id, new.id);
    let file_size = input.data.len() as i64;
    let path = deps.file_store.put(&key, input.data).await?;

    new.file_name = Some(file_name);
    new.file_path = Some(path.clone());
    new.mime_type = Some(mime_type);
    new.file_size = Some(file_size);

    match insert_and_announce(ctx, new, deps).await {
        Ok(data) => Ok(data),
        Err(e) => {
            if let Err(cleanup) = deps.file_store.delete(&path).await {
                warn!(path = %path, error = %cleanup, "Failed to remove orphaned upload");
            }
            Err(e)
        }
    }
}
