use std::future::Future;
use std::time::{Duration, Instant};

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AxumAppState;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const CACHE_CHECK_KEY: &str = "health:check";

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: ComponentHealth,
    cache: ComponentHealth,
    connection_pool: ConnectionPoolHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    status: &'static str,
    latency_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct ConnectionPoolHealth {
    size: u32,
    idle_connections: usize,
    max_connections: u32,
}

async fn check_component<F, T, E>(check: F) -> ComponentHealth
where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let started = Instant::now();
    let error = match tokio::time::timeout(CHECK_TIMEOUT, check).await {
        Ok(Ok(_)) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some(format!("timed out after {}s", CHECK_TIMEOUT.as_secs())),
    };

    ComponentHealth {
        status: if error.is_none() { "ok" } else { "error" },
        latency_ms: started.elapsed().as_millis(),
        error,
    }
}

/// GET /health
///
/// 503 when Postgres is unreachable; a failing cache reports "degraded".
pub async fn health_handler(
    Extension(state): Extension<AxumAppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let pool = &state.deps.db_pool;

    let database = check_component(sqlx::query("SELECT 1").execute(pool)).await;
    let cache = check_component(state.deps.cache.get(CACHE_CHECK_KEY)).await;

    let (status_code, status) = match (database.error.is_none(), cache.error.is_none()) {
        (false, _) => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
        (true, false) => (StatusCode::OK, "degraded"),
        (true, true) => (StatusCode::OK, "healthy"),
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            database,
            cache,
            connection_pool: ConnectionPoolHealth {
                size: pool.size(),
                idle_connections: pool.num_idle(),
                max_connections: pool.options().get_max_connections(),
            },
        }),
    )
}
