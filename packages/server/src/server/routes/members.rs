//! /vaults/:id/members routes

use axum::extract::Extension;

use crate::common::{ApiResult, RequestContext, UserId, VaultId};
use crate::domains::vaults::actions::{self, AddMemberInput, UpdateMemberInput};
use crate::domains::vaults::MemberData;
use crate::server::app::AxumAppState;
use crate::server::error::{ApiJson, ApiPath};
use crate::server::response::ApiResponse;

pub async fn list_members_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath(vault_id): ApiPath<VaultId>,
) -> ApiResult<ApiResponse<Vec<MemberData>>> {
    let members = actions::list_members(&ctx, vault_id, &state.deps).await?;
    Ok(ApiResponse::ok(members))
}

pub async fn add_member_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath(vault_id): ApiPath<VaultId>,
    ApiJson(input): ApiJson<AddMemberInput>,
) -> ApiResult<ApiResponse<MemberData>> {
    let member = actions::add_member(&ctx, vault_id, input, &state.deps).await?;
    Ok(ApiResponse::created(member))
}

pub async fn update_member_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath((vault_id, user_id)): ApiPath<(VaultId, UserId)>,
    ApiJson(input): ApiJson<UpdateMemberInput>,
) -> ApiResult<ApiResponse<MemberData>> {
    let member = actions::update_member_role(&ctx, vault_id, user_id, input, &state.deps).await?;
    Ok(ApiResponse::ok(member))
}

pub async fn remove_member_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath((vault_id, user_id)): ApiPath<(VaultId, UserId)>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    actions::remove_member(&ctx, vault_id, user_id, &state.deps).await?;
    Ok(ApiResponse::message("Member removed"))
}
