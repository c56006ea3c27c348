// Business domains
pub mod audit;
pub mod auth;
pub mod sources;
pub mod vaults;
