//! Auth domain - accounts, password hashing and bearer tokens

pub mod actions;
pub mod data;
pub mod jwt;
pub mod models;
pub mod password;

pub use data::{AuthSession, UserData};
pub use jwt::{Claims, JwtService};
pub use models::User;
