//! Vaults domain - vaults and their memberships

pub mod actions;
pub mod data;
pub mod models;

pub use data::{MemberData, Notification, VaultData};
pub use models::{Vault, VaultMember, VaultSummary};
