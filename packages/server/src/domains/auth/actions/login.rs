//! Login action - verifies credentials and issues a token

use serde::Deserialize;
use tracing::{debug, info};

use crate::common::validation;
use crate::common::{ApiError, ApiResult, AuthError, UserId};
use crate::domains::auth::data::{AuthSession, UserData};
use crate::domains::auth::models::User;
use crate::domains::auth::password::verify_password;
use crate::kernel::ServerDeps;

#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Log in with email and password.
///
/// Unknown email and wrong password produce the same 401.
pub async fn login(input: LoginInput, deps: &ServerDeps) -> ApiResult<AuthSession> {
    let email = validation::normalize_email(input.email.as_deref())?;
    let password = input
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("password is required".into()))?;

    let Some(user) = User::find_by_email(&email, &deps.db_pool).await? else {
        debug!(email = %email, "Login for unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    let stored_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(ApiError::internal)??;

    if !valid {
        debug!(user_id = %user.id, "Login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = deps.jwt_service.create_token(user.id, &user.email)?;

    info!(user_id = %user.id, "User logged in");

    Ok(AuthSession {
        user: UserData::from(user),
        token,
    })
}

/// Look up the authenticated user. A token for a deleted user is a 401.
pub async fn current_user(user_id: UserId, deps: &ServerDeps) -> ApiResult<UserData> {
    User::find_by_id(user_id, &deps.db_pool)
        .await?
        .map(UserData::from)
        .ok_or_else(|| AuthError::InvalidToken.into())
}
