//! /vaults routes

use axum::extract::Extension;

use crate::common::{ApiResult, RequestContext, VaultId};
use crate::domains::vaults::actions::{self, CreateVaultInput, UpdateVaultInput};
use crate::domains::vaults::VaultData;
use crate::server::app::AxumAppState;
use crate::server::error::{ApiJson, ApiPath};
use crate::server::response::ApiResponse;

pub async fn list_vaults_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
) -> ApiResult<ApiResponse<Vec<VaultData>>> {
    let vaults = actions::list_vaults(&ctx, &state.deps).await?;
    Ok(ApiResponse::ok(vaults))
}

pub async fn create_vault_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiJson(input): ApiJson<CreateVaultInput>,
) -> ApiResult<ApiResponse<VaultData>> {
    let vault = actions::create_vault(&ctx, input, &state.deps).await?;
    Ok(ApiResponse::created(vault))
}

pub async fn get_vault_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath(vault_id): ApiPath<VaultId>,
) -> ApiResult<ApiResponse<VaultData>> {
    let vault = actions::get_vault(&ctx, vault_id, &state.deps).await?;
    Ok(ApiResponse::ok(vault))
}

pub async fn update_vault_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath(vault_id): ApiPath<VaultId>,
    ApiJson(input): ApiJson<UpdateVaultInput>,
) -> ApiResult<ApiResponse<VaultData>> {
    let vault = actions::update_vault(&ctx, vault_id, input, &state.deps).await?;
    Ok(ApiResponse::ok(vault))
}

pub async fn delete_vault_handler(
    Extension(state): Extension<AxumAppState>,
    ctx: RequestContext,
    ApiPath(vault_id): ApiPath<VaultId>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    actions::delete_vault(&ctx, vault_id, &state.deps).await?;
    Ok(ApiResponse::message("Vault deleted"))
}
