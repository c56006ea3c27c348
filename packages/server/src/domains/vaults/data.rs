use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{Role, UserId, VaultId};
use crate::domains::vaults::models::{Vault, VaultMemberWithUser, VaultSummary};

/// A vault as returned to one of its members
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultData {
    pub id: VaultId,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: UserId,
    /// The caller's role in this vault
    pub role: Role,
    pub source_count: i64,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VaultSummary> for VaultData {
    fn from(summary: VaultSummary) -> Self {
        let vault = summary.vault;
        Self {
            id: vault.id,
            name: vault.name,
            description: vault.description,
            owner_id: vault.owner_id,
            role: summary.role,
            source_count: summary.source_count,
            member_count: summary.member_count,
            created_at: vault.created_at,
            updated_at: vault.updated_at,
        }
    }
}

impl VaultData {
    /// A vault that was just created: the caller owns it and it has no sources yet
    pub fn new_owned(vault: Vault) -> Self {
        Self::from(VaultSummary {
            vault,
            role: Role::Owner,
            source_count: 0,
            member_count: 1,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberData {
    pub user_id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

impl From<VaultMemberWithUser> for MemberData {
    fn from(row: VaultMemberWithUser) -> Self {
        Self {
            user_id: row.member.user_id,
            email: row.email,
            name: row.name,
            role: row.member.role,
            joined_at: row.member.created_at,
        }
    }
}

/// Payload of `notification` events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub vault_id: VaultId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(vault_id: VaultId, message: impl Into<String>) -> Self {
        Self {
            vault_id,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}
