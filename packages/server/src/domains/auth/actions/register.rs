//! Register action - creates an account and issues a token

use serde::Deserialize;
use tracing::{info, warn};

use crate::common::error::is_unique_violation;
use crate::common::validation;
use crate::common::{ApiError, ApiResult};
use crate::domains::auth::data::{AuthSession, UserData};
use crate::domains::auth::models::User;
use crate::domains::auth::password::hash_password;
use crate::kernel::ServerDeps;

/// Fields are optional so a missing field is a 400 with a useful message,
/// not a deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

/// Register a new user.
///
/// Returns 409 if the email is already registered.
pub async fn register(input: RegisterInput, deps: &ServerDeps) -> ApiResult<AuthSession> {
    let email = validation::normalize_email(input.email.as_deref())?;
    let password = validation::password(input.password.as_deref())?;
    let name = validation::required_text("name", input.name.as_deref(), 100)?;

    if User::find_by_email(&email, &deps.db_pool).await?.is_some() {
        return Err(ApiError::Conflict("Email is already registered".into()));
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(ApiError::internal)??;

    let user = match User::create(&email, &name, &password_hash, &deps.db_pool).await {
        Ok(user) => user,
        // Lost a race with a concurrent registration
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %email, "Concurrent registration for the same email");
            return Err(ApiError::Conflict("Email is already registered".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let token = deps.jwt_service.create_token(user.id, &user.email)?;

    info!(user_id = %user.id, "User registered");

    Ok(AuthSession {
        user: UserData::from(user),
        token,
    })
}
