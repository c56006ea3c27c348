//! Sources domain - research artifacts stored in a vault

pub mod actions;
pub mod data;
pub mod models;

pub use data::SourceData;
pub use models::{Source, SourceType};
