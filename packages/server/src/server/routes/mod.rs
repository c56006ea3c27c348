// HTTP routes
pub mod audit;
pub mod auth;
pub mod health;
pub mod members;
pub mod sources;
pub mod vaults;
pub mod ws;

pub use audit::*;
pub use auth::*;
pub use health::*;
pub use members::*;
pub use sources::*;
pub use vaults::*;
pub use ws::ws_handler;
