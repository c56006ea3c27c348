//! /auth routes

use axum::extract::Extension;

use crate::common::ApiResult;
use crate::domains::auth::actions::{self, LoginInput, RegisterInput};
use crate::domains::auth::{AuthSession, UserData};
use crate::server::app::AxumAppState;
use crate::server::error::ApiJson;
use crate::server::middleware::AuthUser;
use crate::server::response::ApiResponse;

/// POST /auth/register
pub async fn register_handler(
    Extension(state): Extension<AxumAppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> ApiResult<ApiResponse<AuthSession>> {
    let session = actions::register(input, &state.deps).await?;
    Ok(ApiResponse::created(session))
}

/// POST /auth/login
pub async fn login_handler(
    Extension(state): Extension<AxumAppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> ApiResult<ApiResponse<AuthSession>> {
    let session = actions::login(input, &state.deps).await?;
    Ok(ApiResponse::ok(session))
}

/// GET /auth/me
pub async fn me_handler(
    Extension(state): Extension<AxumAppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<UserData>> {
    let user = actions::current_user(user.user_id, &state.deps).await?;
    Ok(ApiResponse::ok(user))
}
