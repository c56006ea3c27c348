use std::fmt;

use serde::{Deserialize, Serialize};

/// A member's role within a single vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "vault_role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Contributor,
    Viewer,
}

/// Operations gated by vault role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Read the vault, its sources and members, and download files
    ViewVault,
    AddSource,
    DeleteAnySource,
    /// Delete sources the caller added themselves
    DeleteOwnSource,
    UpdateVault,
    DeleteVault,
    ManageMembers,
    ViewAudit,
}

impl Role {
    pub fn can(self, permission: Permission) -> bool {
        use Permission::*;

        match self {
            Role::Owner => true,
            Role::Contributor => matches!(permission, ViewVault | AddSource | DeleteOwnSource),
            Role::Viewer => matches!(permission, ViewVault),
        }
    }

    /// Roles an owner may hand out. Ownership itself is never transferred.
    pub fn is_assignable(self) -> bool {
        self != Role::Owner
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Contributor => "CONTRIBUTOR",
            Role::Viewer => "VIEWER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Permission::ViewVault => "view this vault",
            Permission::AddSource => "add sources",
            Permission::DeleteAnySource => "delete other members' sources",
            Permission::DeleteOwnSource => "delete sources",
            Permission::UpdateVault => "update this vault",
            Permission::DeleteVault => "delete this vault",
            Permission::ManageMembers => "manage members",
            Permission::ViewAudit => "view the audit log",
        };
        f.write_str(text)
    }
}
