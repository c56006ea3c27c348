//! Auth domain actions - registration, login and session lookup

mod login;
mod register;

pub use login::{current_user, login, LoginInput};
pub use register::{register, RegisterInput};
