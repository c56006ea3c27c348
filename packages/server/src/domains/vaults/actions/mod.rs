//! Vault domain actions - business logic functions
//!
//! Actions are called directly from the HTTP handlers. Each one runs its RBAC
//! check first, then writes (with an audit entry), then invalidates caches and
//! publishes realtime events.

mod fanout;
mod members;
mod vaults;

pub use fanout::{invalidate_member_vault_lists, notify_user};
pub use members::{
    add_member, list_members, remove_member, update_member_role, AddMemberInput,
    UpdateMemberInput,
};
pub use vaults::{
    create_vault, delete_vault, get_vault, list_vaults, update_vault, CreateVaultInput,
    UpdateVaultInput,
};
