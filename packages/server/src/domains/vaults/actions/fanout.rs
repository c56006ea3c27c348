//! Cache invalidation and notifications shared by vault, member and source actions.

use tracing::warn;

use crate::common::{UserId, VaultId};
use crate::domains::vaults::data::Notification;
use crate::domains::vaults::models::VaultMember;
use crate::kernel::cache::{invalidate, vault_list_key};
use crate::kernel::stream_hub::NOTIFICATION;
use crate::kernel::{ServerDeps, StreamHub};

/// Drop the cached vault list of every current member of a vault.
///
/// Counts shown in the list change whenever sources or members change.
pub async fn invalidate_member_vault_lists(deps: &ServerDeps, vault_id: VaultId) {
    match VaultMember::user_ids(vault_id, &deps.db_pool).await {
        Ok(user_ids) => invalidate_vault_lists(deps, &user_ids).await,
        Err(e) => warn!(vault_id = %vault_id, error = %e, "Failed to load members for cache invalidation"),
    }
}

pub async fn invalidate_vault_lists(deps: &ServerDeps, user_ids: &[UserId]) {
    let keys = user_ids.iter().copied().map(vault_list_key).collect();
    invalidate(deps.cache.as_ref(), keys).await;
}

/// Send a `notification` event to one user's room.
pub async fn notify_user(deps: &ServerDeps, user_id: UserId, notification: &Notification) {
    deps.stream_hub
        .emit(&StreamHub::user_topic(user_id), NOTIFICATION, notification)
        .await;
}
