use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::{middleware::Next, response::Response};
use tracing::debug;

use super::ClientIp;
use crate::common::{ApiError, AuthError, RequestContext, UserId};
use crate::domains::auth::JwtService;

/// Authenticated user information from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
    pub email: String,
}

/// JWT authentication middleware
///
/// Extracts JWT token from Authorization header, verifies it, and adds AuthUser to request extensions.
/// If no token or invalid token, request continues without AuthUser; protected
/// handlers reject it through the `AuthUser` / `RequestContext` extractors.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = bearer_token(request.headers()).and_then(|token| verify(token, &jwt_service));

    if let Some(user) = auth_user {
        debug!(user_id = %user.user_id, "Authenticated user");
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Token from the Authorization header ("Bearer <token>" or the raw token)
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_str = headers.get("authorization")?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();
    (!token.is_empty()).then_some(token)
}

/// Verify a token and turn its claims into an `AuthUser`
pub fn verify(token: &str, jwt_service: &JwtService) -> Option<AuthUser> {
    let claims = jwt_service.verify_token(token).ok()?;
    Some(AuthUser {
        user_id: claims.user_id(),
        email: claims.email,
    })
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AuthError::AuthenticationRequired.into())
    }
}

/// Caller context for domain actions: the authenticated user plus client IP
#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let ctx = RequestContext::new(user.user_id);
        Ok(match parts.extensions.get::<ClientIp>() {
            Some(ClientIp(ip)) => ctx.with_ip(ip.to_string()),
            None => ctx,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new("test_secret", "test_issuer".to_string())
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", value.parse().unwrap());
        headers
    }

    #[test]
    fn test_extract_token_with_bearer() {
        let jwt_service = service();
        let user_id = UserId::new();
        let token = jwt_service.create_token(user_id, "ada@example.com").unwrap();

        let headers = headers(&format!("Bearer {}", token));
        let auth_user = bearer_token(&headers).and_then(|t| verify(t, &jwt_service));
        assert_eq!(auth_user.unwrap().user_id, user_id);
    }

    #[test]
    fn test_extract_token_without_bearer() {
        let jwt_service = service();
        let user_id = UserId::new();
        let token = jwt_service.create_token(user_id, "ada@example.com").unwrap();

        let headers = headers(&token);
        let auth_user = bearer_token(&headers).and_then(|t| verify(t, &jwt_service));
        assert_eq!(auth_user.unwrap().email, "ada@example.com");
    }

    #[test]
    fn test_no_auth_header() {
        assert!(bearer_token(&HeaderMap::new()).is_none());
        assert!(bearer_token(&headers("Bearer ")).is_none());
    }

    #[test]
    fn test_invalid_token() {
        assert!(verify("invalid_token", &service()).is_none());
    }

    #[test]
    fn test_token_from_other_issuer_rejected() {
        let other = JwtService::new("test_secret", "someone_else".to_string());
        let token = other.create_token(UserId::new(), "ada@example.com").unwrap();
        assert!(verify(&token, &service()).is_none());
    }
}
