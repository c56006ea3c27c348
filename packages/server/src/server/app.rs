//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::kernel::ServerDeps;
use crate::server::middleware::{
    extract_client_ip, jwt_auth_middleware, rate_limit_envelope, RateLimitSettings,
};
use crate::server::routes::*;

/// Room left for multipart framing and the title part on top of the file limit
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub deps: Arc<ServerDeps>,
}

/// HTTP-layer settings that are not domain dependencies
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// CORS allow-list; empty allows any origin
    pub allowed_origins: Vec<String>,
    /// `None` disables rate limiting
    pub rate_limit: Option<RateLimitSettings>,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

/// Routes that sit behind the rate limiter
fn api_routes(max_upload_bytes: usize) -> Router {
    Router::new()
        // Auth
        .route("/auth/register", post(register_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/me", get(me_handler))
        // Vaults
        .route("/vaults", get(list_vaults_handler).post(create_vault_handler))
        .route(
            "/vaults/:id",
            get(get_vault_handler)
                .patch(update_vault_handler)
                .delete(delete_vault_handler),
        )
        // Sources
        .route(
            "/vaults/:id/sources",
            get(list_sources_handler).post(add_source_handler),
        )
        .route(
            "/vaults/:id/sources/upload",
            post(upload_source_handler).layer(DefaultBodyLimit::max(
                max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES),
            )),
        )
        .route("/vaults/:id/sources/:source_id", delete(delete_source_handler))
        .route("/sources/:id/download", get(download_source_handler))
        // Members
        .route(
            "/vaults/:id/members",
            get(list_members_handler).post(add_member_handler),
        )
        .route(
            "/vaults/:id/members/:user_id",
            patch(update_member_handler).delete(remove_member_handler),
        )
        // Audit
        .route("/vaults/:id/audit", get(list_audit_handler))
        // Realtime
        .route("/ws", get(ws_handler))
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps, options: AppOptions) -> Router {
    let app_state = AxumAppState {
        deps: Arc::new(deps),
    };

    let jwt_service_for_middleware = app_state.deps.jwt_service.clone();

    let mut api = api_routes(app_state.deps.max_upload_bytes);

    if let Some(settings) = options.rate_limit {
        // Per-IP token bucket keyed like the audit IP: X-Forwarded-For,
        // X-Real-IP, Forwarded, then the socket address.
        // The governor takes the replenish interval, not a rate.
        match GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_millisecond(settings.replenish_interval_ms())
            .burst_size(settings.burst_size)
            .use_headers()
            .finish()
        {
            Some(config) => {
                api = api
                    .layer(GovernorLayer {
                        config: Arc::new(config),
                    })
                    .layer(middleware::map_response(rate_limit_envelope));
            }
            None => warn!(?settings, "Invalid rate limit settings, rate limiting disabled"),
        }
    }

    Router::new()
        // Health check (no rate limit)
        .route("/health", get(health_handler))
        .merge(api)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service_for_middleware.clone(), req, next)
        })) // JWT authentication
        .layer(middleware::from_fn(extract_client_ip))
        .layer(Extension(app_state)) // Shared state for handlers
        .layer(cors_layer(&options.allowed_origins))
        .layer(TraceLayer::new_for_http())
}
