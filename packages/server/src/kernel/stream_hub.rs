//! In-process pub/sub hub for real-time fan-out.
//!
//! Topics are rooms: `vault:{id}` carries every write inside a vault and
//! `user:{id}` carries notifications addressed to one user. WebSocket
//! connections subscribe to the rooms they have joined.
//!
//! Producers (domain actions):
//!   hub.emit(&StreamHub::vault_topic(vault_id), "source:added", &source).await;
//!
//! Consumers (WebSocket handler):
//!   let rx = hub.subscribe("vault:abc-123").await;

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::warn;

use crate::common::{UserId, VaultId};

pub const VAULT_CREATED: &str = "vault:created";
pub const VAULT_UPDATED: &str = "vault:updated";
pub const VAULT_DELETED: &str = "vault:deleted";
pub const SOURCE_ADDED: &str = "source:added";
pub const SOURCE_DELETED: &str = "source:deleted";
pub const MEMBER_ADDED: &str = "member:added";
pub const MEMBER_UPDATED: &str = "member:updated";
pub const MEMBER_REMOVED: &str = "member:removed";
pub const NOTIFICATION: &str = "notification";

/// Topic-keyed broadcast channels.
///
/// Thread-safe, cloneable. Payloads are `serde_json::Value` so the hub has
/// no knowledge of domain types.
#[derive(Clone)]
pub struct StreamHub {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<serde_json::Value>>>>,
    capacity: usize,
}

impl StreamHub {
    /// Create a new StreamHub with default capacity (256 messages per channel).
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    pub fn vault_topic(vault_id: VaultId) -> String {
        format!("vault:{}", vault_id)
    }

    pub fn user_topic(user_id: UserId) -> String {
        format!("user:{}", user_id)
    }

    /// Publish a JSON value to a topic. No-op if no subscribers.
    pub async fn publish(&self, topic: &str, value: serde_json::Value) {
        let channels = self.channels.read().await;
        if let Some(tx) = channels.get(topic) {
            // Ignore send errors (no active receivers)
            let _ = tx.send(value);
        }
    }

    /// Publish `{ "type": event, "data": payload }` to a topic.
    pub async fn emit<T: Serialize>(&self, topic: &str, event: &str, payload: &T) {
        match serde_json::to_value(payload) {
            Ok(data) => {
                self.publish(topic, serde_json::json!({ "type": event, "data": data }))
                    .await
            }
            Err(e) => warn!(error = %e, event, topic, "Failed to serialize realtime event"),
        }
    }

    /// Subscribe to a topic. Creates the channel if it doesn't exist.
    pub async fn subscribe(&self, topic: &str) -> broadcast::Receiver<serde_json::Value> {
        let mut channels = self.channels.write().await;
        let tx = channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        tx.subscribe()
    }

    /// Remove channels with zero subscribers (housekeeping).
    pub async fn cleanup(&self) {
        let mut channels = self.channels.write().await;
        channels.retain(|_, tx| tx.receiver_count() > 0);
    }
}

impl Default for StreamHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_emit_wraps_payload_in_envelope() {
        let hub = StreamHub::new();
        let vault_id = VaultId::new();
        let topic = StreamHub::vault_topic(vault_id);
        let mut rx = hub.subscribe(&topic).await;

        hub.emit(&topic, SOURCE_ADDED, &serde_json::json!({"title": "Attention"}))
            .await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received["type"], "source:added");
        assert_eq!(received["data"]["title"], "Attention");
    }

    #[tokio::test]
    async fn test_publish_no_subscribers_is_noop() {
        let hub = StreamHub::new();
        hub.publish("vault:nobody", serde_json::json!({"data": "dropped"}))
            .await;
        assert!(hub.channels.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_removes_empty_channels() {
        let hub = StreamHub::new();
        let rx = hub.subscribe("user:ephemeral").await;
        assert_eq!(hub.channels.read().await.len(), 1);

        drop(rx);
        hub.cleanup().await;

        assert_eq!(hub.channels.read().await.len(), 0);
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let hub = StreamHub::new();
        let mut vault_a = hub.subscribe("vault:a").await;
        let mut vault_b = hub.subscribe("vault:b").await;

        hub.emit("vault:a", VAULT_UPDATED, &"a").await;

        assert_eq!(vault_a.recv().await.unwrap()["data"], "a");
        assert!(vault_b.try_recv().is_err());
    }

    #[test]
    fn test_topic_names() {
        let user_id = UserId::new();
        assert_eq!(StreamHub::user_topic(user_id), format!("user:{}", user_id));
    }
}
