use axum::extract::Extension;

use crate::common::{ApiResult, RequestContext, VaultId};
use crate::domains::audit::actions::{list_audit, AuditQuery};
use crate::domains::audit::data::AuditEntryData;
use crate::server::app::AxumAppState;
use crate::server::error::{ApiPath, ApiQuery};
use crate::server::response::ApiResponse;

/// GET /vaults/:id/audit?limit=&before=
pub async fn list_audit_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath(vault_id): ApiPath<VaultId>,
    ApiQuery(query): ApiQuery<AuditQuery>,
) -> ApiResult<ApiResponse<Vec<AuditEntryData>>> {
    let entries = list_audit(&ctx, vault_id, query, &state.deps).await?;
    Ok(ApiResponse::ok(entries))
}
