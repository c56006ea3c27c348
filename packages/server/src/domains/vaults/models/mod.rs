pub mod vault;
pub mod vault_member;

pub use vault::{Vault, VaultSummary};
pub use vault_member::{VaultMember, VaultMemberWithUser};
