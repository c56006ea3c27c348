// Common types and utilities shared across the application

pub mod auth;
pub mod entity_ids;
pub mod error;
pub mod id;
pub mod request_context;
pub mod validation;

pub use auth::{Actor, AuthError, HasAuthContext, Permission, Role};
pub use entity_ids::*;
pub use error::{ApiError, ApiResult};
pub use id::Id;
pub use request_context::RequestContext;
