use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::{Role, UserId, VaultId, VaultMemberId};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VaultMember {
    pub id: VaultMemberId,
    pub vault_id: VaultId,
    pub user_id: UserId,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Membership joined with the member's account details
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VaultMemberWithUser {
    #[sqlx(flatten)]
    pub member: VaultMember,
    pub email: String,
    pub name: String,
}

// =============================================================================
// VaultMember Queries
// =============================================================================

impl VaultMember {
    /// Insert a membership. Fails with a unique violation if the user is already a member.
    pub async fn insert<'e, E>(
        vault_id: VaultId,
        user_id: UserId,
        role: Role,
        executor: E,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO vault_members (id, vault_id, user_id, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(VaultMemberId::new())
        .bind(vault_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(executor)
        .await
    }

    pub async fn find(
        vault_id: VaultId,
        user_id: UserId,
        pool: &PgPool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM vault_members WHERE vault_id = $1 AND user_id = $2",
        )
        .bind(vault_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// One membership with the member's account details
    pub async fn find_with_user(
        vault_id: VaultId,
        user_id: UserId,
        pool: &PgPool,
    ) -> Result<Option<VaultMemberWithUser>> {
        sqlx::query_as::<_, VaultMemberWithUser>(
            r#"
            SELECT vm.*, u.email, u.name
            FROM vault_members vm
            INNER JOIN users u ON u.id = vm.user_id
            WHERE vm.vault_id = $1 AND vm.user_id = $2
            "#,
        )
        .bind(vault_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update_role<'e, E>(
        vault_id: VaultId,
        user_id: UserId,
        role: Role,
        executor: E,
    ) -> Result<Self>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE vault_members SET role = $3
            WHERE vault_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(vault_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn delete<'e, E>(vault_id: VaultId, user_id: UserId, executor: E) -> Result<()>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("DELETE FROM vault_members WHERE vault_id = $1 AND user_id = $2")
            .bind(vault_id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Members with account details, owner first then by join time
    pub async fn find_for_vault(vault_id: VaultId, pool: &PgPool) -> Result<Vec<VaultMemberWithUser>> {
        sqlx::query_as::<_, VaultMemberWithUser>(
            r#"
            SELECT vm.*, u.email, u.name
            FROM vault_members vm
            INNER JOIN users u ON u.id = vm.user_id
            WHERE vm.vault_id = $1
            ORDER BY
                CASE vm.role WHEN 'OWNER' THEN 0 WHEN 'CONTRIBUTOR' THEN 1 ELSE 2 END,
                vm.created_at ASC
            "#,
        )
        .bind(vault_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// IDs of every member (for cache invalidation and notifications)
    pub async fn user_ids(vault_id: VaultId, pool: &PgPool) -> Result<Vec<UserId>> {
        sqlx::query_scalar::<_, UserId>("SELECT user_id FROM vault_members WHERE vault_id = $1")
            .bind(vault_id)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }
}
