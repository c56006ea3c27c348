//! Audit domain - append-only record of every vault mutation

pub mod actions;
pub mod data;
pub mod models;

pub use data::AuditEntryData;
pub use models::{AuditLog, NewAuditEntry};
