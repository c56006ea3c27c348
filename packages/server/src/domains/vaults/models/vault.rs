use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::{Role, UserId, VaultId};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Vault {
    pub id: VaultId,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A vault as seen by one member: their role plus counts
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VaultSummary {
    #[sqlx(flatten)]
    pub vault: Vault,
    pub role: Role,
    pub source_count: i64,
    pub member_count: i64,
}

// =============================================================================
// Vault Queries
// =============================================================================

impl Vault {
    /// Insert a vault row. Use inside the transaction that also creates the owner membership.
    pub async fn insert<'e, E>(
        name: &str,
        description: Option<&str>,
        owner_id: UserId,
        executor: E,
    ) -> Result<Self>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO vaults (id, name, description, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(VaultId::new())
        .bind(name)
        .bind(description)
        .bind(owner_id)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn exists(id: VaultId, pool: &PgPool) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM vaults WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(id: VaultId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM vaults WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Update name and description. `None` leaves a field unchanged; the
    /// description is cleared by passing `Some(None)`.
    pub async fn update<'e, E>(
        id: VaultId,
        name: Option<&str>,
        description: Option<Option<&str>>,
        executor: E,
    ) -> Result<Self>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE vaults
            SET name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(description.is_some())
        .bind(description.flatten())
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Delete a vault. Memberships, sources and vault audit entries cascade.
    pub async fn delete<'e, E>(id: VaultId, executor: E) -> Result<()>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query("DELETE FROM vaults WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Vaults the user is a member of, newest first
    pub async fn find_for_user(user_id: UserId, pool: &PgPool) -> Result<Vec<VaultSummary>> {
        sqlx::query_as::<_, VaultSummary>(
            r#"
            SELECT
                v.*,
                vm.role,
                (SELECT COUNT(*) FROM sources s WHERE s.vault_id = v.id) AS source_count,
                (SELECT COUNT(*) FROM vault_members m WHERE m.vault_id = v.id) AS member_count
            FROM vaults v
            INNER JOIN vault_members vm ON vm.vault_id = v.id
            WHERE vm.user_id = $1
            ORDER BY v.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// A single vault as seen by one member
    pub async fn find_summary(
        id: VaultId,
        user_id: UserId,
        pool: &PgPool,
    ) -> Result<Option<VaultSummary>> {
        sqlx::query_as::<_, VaultSummary>(
            r#"
            SELECT
                v.*,
                vm.role,
                (SELECT COUNT(*) FROM sources s WHERE s.vault_id = v.id) AS source_count,
                (SELECT COUNT(*) FROM vault_members m WHERE m.vault_id = v.id) AS member_count
            FROM vaults v
            INNER JOIN vault_members vm ON vm.vault_id = v.id
            WHERE v.id = $1 AND vm.user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}
