// Research Vault - API Core
//
// This crate provides the backend API for collaborative research vaults:
// accounts, vaults with role-based membership, research sources, audit
// history and real-time fan-out over WebSockets.
//
// Architecture follows domain-driven design: domains/* hold models (SQL)
// and actions (business logic); server/* is the HTTP layer.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
