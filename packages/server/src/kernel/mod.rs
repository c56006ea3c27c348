//! Kernel module - server infrastructure and dependencies.

pub mod cache;
pub mod deps;
pub mod file_store;
pub mod stream_hub;
pub mod test_dependencies;
pub mod traits;

pub use cache::{MemoryCache, RedisCache};
pub use deps::ServerDeps;
pub use file_store::LocalFileStore;
pub use stream_hub::StreamHub;
pub use test_dependencies::TestDependencies;
pub use traits::*;
