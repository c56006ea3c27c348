//! Source routes: JSON creation, multipart upload, delete and download

use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Extension, Multipart};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};

use crate::common::{ApiError, ApiResult, RequestContext, SourceId, VaultId};
use crate::domains::sources::actions::{self, AddSourceInput, UploadInput};
use crate::domains::sources::SourceData;
use crate::server::app::AxumAppState;
use crate::server::error::{ApiJson, ApiPath};
use crate::server::response::ApiResponse;

pub async fn list_sources_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath(vault_id): ApiPath<VaultId>,
) -> ApiResult<ApiResponse<Vec<SourceData>>> {
    let sources = actions::list_sources(&ctx, vault_id, &state.deps).await?;
    Ok(ApiResponse::ok(sources))
}

pub async fn add_source_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath(vault_id): ApiPath<VaultId>,
    ApiJson(input): ApiJson<AddSourceInput>,
) -> ApiResult<ApiResponse<SourceData>> {
    let source = actions::add_source(&ctx, vault_id, input, &state.deps).await?;
    Ok(ApiResponse::created(source))
}

/// POST /vaults/:id/sources/upload with parts `file` and optional `title`
pub async fn upload_source_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath(vault_id): ApiPath<VaultId>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ApiResponse<SourceData>> {
    let multipart = multipart.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let input = read_upload(multipart).await?;
    let source = actions::upload_source(&ctx, vault_id, input, &state.deps).await?;
    Ok(ApiResponse::created(source))
}

async fn read_upload(mut multipart: Multipart) -> ApiResult<UploadInput> {
    let mut input = UploadInput::default();
    let mut has_file = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                input.file_name = field.file_name().map(String::from);
                input.content_type = field.content_type().map(String::from);
                input.data = field.bytes().await?;
                has_file = true;
            }
            Some("title") => input.title = Some(field.text().await?),
            _ => {}
        }
    }

    if !has_file {
        return Err(ApiError::BadRequest("file is required".into()));
    }
    Ok(input)
}

pub async fn delete_source_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath((vault_id, source_id)): ApiPath<(VaultId, SourceId)>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    actions::delete_source(&ctx, vault_id, source_id, &state.deps).await?;
    Ok(ApiResponse::message("Source deleted"))
}

/// GET /sources/:id/download
pub async fn download_source_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath(source_id): ApiPath<SourceId>,
) -> ApiResult<Response> {
    let download = actions::download_source(&ctx, source_id, &state.deps).await?;

    let content_type = HeaderValue::from_str(&download.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        header_safe_file_name(&download.file_name)
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_DISPOSITION, disposition),
            (CONTENT_LENGTH, HeaderValue::from(download.data.len())),
        ],
        Body::from(download.data),
    )
        .into_response())
}

/// Printable ASCII without quotes or backslashes
fn header_safe_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    if cleaned.trim().is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_safe_file_name() {
        assert_eq!(header_safe_file_name("paper.pdf"), "paper.pdf");
        assert_eq!(header_safe_file_name("my \"notes\".txt"), "my _notes_.txt");
        assert_eq!(header_safe_file_name("résumé.pdf"), "r_sum_.pdf");
        assert_eq!(header_safe_file_name(""), "download");
    }
}
