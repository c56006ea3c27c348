// Main entry point for API server

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vault_server::domains::auth::JwtService;
use vault_server::kernel::{BaseCache, LocalFileStore, MemoryCache, RedisCache, ServerDeps, StreamHub};
use vault_server::server::middleware::RateLimitSettings;
use vault_server::server::{build_app, AppOptions};
use vault_server::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vault_server=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Research Vault API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // Cache: Redis when reachable, in-process otherwise
    let cache: Arc<dyn BaseCache> = match RedisCache::connect(&config.redis_url).await {
        Ok(redis) => {
            tracing::info!("Redis cache connected");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, falling back to in-memory cache");
            Arc::new(MemoryCache::new())
        }
    };

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.upload_dir))?;

    let jwt_ttl = chrono::Duration::try_hours(config.jwt_ttl_hours)
        .context("JWT_TTL_HOURS is out of range")?;
    let jwt_service =
        JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()).with_ttl(jwt_ttl);

    let stream_hub = StreamHub::new();

    let deps = ServerDeps::new(
        pool,
        cache,
        Arc::new(LocalFileStore::new(&config.upload_dir)),
        Arc::new(jwt_service),
        stream_hub.clone(),
        config.max_upload_bytes,
    );

    // Drop broadcast channels whose sockets have gone away
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            stream_hub.cleanup().await;
        }
    });

    let app = build_app(
        deps,
        AppOptions {
            allowed_origins: config.allowed_origins.clone(),
            rate_limit: Some(RateLimitSettings {
                per_second: config.rate_limit_per_second,
                burst_size: config.rate_limit_burst,
            }),
        },
    );

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
