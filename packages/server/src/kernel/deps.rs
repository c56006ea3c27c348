//! Server dependencies for domain actions (using traits for testability)
//!
//! This module provides the central dependency container used by every action.
//! External services sit behind trait objects so tests can swap them out.

use std::sync::Arc;

use sqlx::PgPool;

use crate::common::auth::HasAuthContext;
use crate::domains::auth::JwtService;
use crate::kernel::{stream_hub::StreamHub, BaseCache, BaseFileStore};

/// Default upload limit: 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    /// Read-through cache for vault and source lists
    pub cache: Arc<dyn BaseCache>,
    /// Storage for uploaded FILE/IMAGE sources
    pub file_store: Arc<dyn BaseFileStore>,
    /// JWT service for token creation
    pub jwt_service: Arc<JwtService>,
    /// In-process pub/sub hub for real-time fan-out to WebSocket rooms
    pub stream_hub: StreamHub,
    pub max_upload_bytes: usize,
}

impl ServerDeps {
    pub fn new(
        db_pool: PgPool,
        cache: Arc<dyn BaseCache>,
        file_store: Arc<dyn BaseFileStore>,
        jwt_service: Arc<JwtService>,
        stream_hub: StreamHub,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db_pool,
            cache,
            file_store,
            jwt_service,
            stream_hub,
            max_upload_bytes,
        }
    }
}

/// Implement HasAuthContext for ServerDeps to enable authorization checks
impl HasAuthContext for ServerDeps {
    fn db_pool(&self) -> &PgPool {
        &self.db_pool
    }
}
