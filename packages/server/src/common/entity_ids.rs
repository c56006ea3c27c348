//! Typed ID definitions for all domain entities.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for registered users.
pub struct User;

/// Marker type for vaults.
pub struct Vault;

/// Marker type for vault membership rows.
pub struct VaultMember;

/// Marker type for research sources.
pub struct Source;

/// Marker type for audit log entries.
pub struct AuditLog;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type UserId = Id<User>;

pub type VaultId = Id<Vault>;

pub type VaultMemberId = Id<VaultMember>;

pub type SourceId = Id<Source>;

pub type AuditLogId = Id<AuditLog>;
