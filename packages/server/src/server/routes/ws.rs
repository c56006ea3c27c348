//! WebSocket endpoint for real-time vault events.
//!
//! GET /ws?token=JWT
//!
//! Auth: JWT from `?token=` (browsers cannot set headers on WebSocket
//! handshakes), falling back to the Authorization header. The token is
//! checked before the upgrade so a bad token is a plain 401.
//!
//! Every socket is joined to `user:{id}` for notifications. Clients join
//! vault rooms with `{"type":"join","vaultId":"..."}`; membership is checked
//! against the database on each join. A room is dropped again, with a
//! `left` frame, once the vault is deleted or the user is removed from it.

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::Extension;
use axum::http::HeaderMap;
use axum::response::Response;
use futures::stream::{SplitSink, StreamExt};
use futures::SinkExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamMap;
use tracing::{debug, info};

use crate::common::{Actor, ApiError, AuthError, Permission, UserId, VaultId};
use crate::kernel::stream_hub::{MEMBER_REMOVED, VAULT_DELETED};
use crate::kernel::StreamHub;
use crate::server::app::AxumAppState;
use crate::server::error::ApiQuery;
use crate::server::middleware::{bearer_token, verify};

#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    /// JWT token for authentication
    token: Option<String>,
}

/// Frames a client may send
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    Join {
        #[serde(rename = "vaultId")]
        vault_id: VaultId,
    },
    Leave {
        #[serde(rename = "vaultId")]
        vault_id: VaultId,
    },
    Ping,
}

type Rooms = StreamMap<String, BroadcastStream<Value>>;

pub async fn ws_handler(
    Extension(state): Extension<AxumAppState>,
    ApiQuery(query): ApiQuery<WsQuery>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .as_deref()
        .or_else(|| bearer_token(&headers))
        .ok_or(AuthError::AuthenticationRequired)?;
    let user = verify(token, &state.deps.jwt_service).ok_or(AuthError::InvalidToken)?;

    let upgrade = upgrade.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    Ok(upgrade.on_upgrade(move |socket| run_socket(socket, user.user_id, state)))
}

async fn run_socket(socket: WebSocket, user_id: UserId, state: AxumAppState) {
    let hub = state.deps.stream_hub.clone();
    let (mut sender, mut receiver) = socket.split();

    let mut rooms = Rooms::new();
    let user_topic = StreamHub::user_topic(user_id);
    rooms.insert(
        user_topic.clone(),
        BroadcastStream::new(hub.subscribe(&user_topic).await),
    );

    info!(user_id = %user_id, "WebSocket connected");

    if send(&mut sender, json!({ "type": "connected", "data": { "userId": user_id } }))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_frame(&text, user_id, &mut rooms, &state).await;
                    if send(&mut sender, reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(user_id = %user_id, error = %e, "WebSocket receive failed");
                    break;
                }
            },
            Some((topic, event)) = rooms.next(), if !rooms.is_empty() => {
                let (frame, revoked) = match event {
                    Ok(value) => {
                        let revoked = topic != user_topic && revokes_access(&value, user_id);
                        (value, revoked)
                    }
                    Err(BroadcastStreamRecvError::Lagged(missed)) => {
                        debug!(user_id = %user_id, topic = %topic, missed, "WebSocket subscriber lagged");
                        // A missed removal must not leave the room open
                        let revoked = match vault_of(&topic) {
                            Some(vault_id) => !is_member(user_id, vault_id, &state).await,
                            None => false,
                        };
                        (json!({ "type": "lagged", "missed": missed }), revoked)
                    }
                };
                if send(&mut sender, frame).await.is_err() {
                    break;
                }
                if revoked {
                    rooms.remove(&topic);
                    debug!(user_id = %user_id, topic = %topic, "Vault access revoked, room dropped");
                    let left = json!({
                        "type": "left",
                        "vaultId": vault_of(&topic),
                        "reason": "access revoked",
                    });
                    if send(&mut sender, left).await.is_err() {
                        break;
                    }
                }
            }
        }
    }

    drop(rooms);
    hub.cleanup().await;
    info!(user_id = %user_id, "WebSocket disconnected");
}

async fn send(sender: &mut SplitSink<WebSocket, Message>, frame: Value) -> Result<(), axum::Error> {
    sender.send(Message::Text(frame.to_string())).await
}

/// Whether a vault-room event ends this user's access to the room
fn revokes_access(event: &Value, user_id: UserId) -> bool {
    match event["type"].as_str() {
        Some(VAULT_DELETED) => true,
        Some(MEMBER_REMOVED) => {
            event["data"]["userId"].as_str() == Some(user_id.to_string().as_str())
        }
        _ => false,
    }
}

fn vault_of(topic: &str) -> Option<VaultId> {
    topic.strip_prefix("vault:")?.parse().ok()
}

async fn is_member(user_id: UserId, vault_id: VaultId, state: &AxumAppState) -> bool {
    Actor::new(user_id)
        .can(Permission::ViewVault)
        .on(vault_id)
        .check(state.deps.as_ref())
        .await
        .is_ok()
}

async fn handle_frame(text: &str, user_id: UserId, rooms: &mut Rooms, state: &AxumAppState) -> Value {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(_) => return json!({ "type": "error", "error": "Unrecognized message" }),
    };

    match frame {
        ClientFrame::Ping => json!({ "type": "pong" }),
        ClientFrame::Join { vault_id } => {
            let check = Actor::new(user_id)
                .can(Permission::ViewVault)
                .on(vault_id)
                .check(state.deps.as_ref())
                .await;
            match check {
                Ok(_) => {
                    let topic = StreamHub::vault_topic(vault_id);
                    if !rooms.contains_key(&topic) {
                        let rx = state.deps.stream_hub.subscribe(&topic).await;
                        rooms.insert(topic, BroadcastStream::new(rx));
                    }
                    debug!(user_id = %user_id, vault_id = %vault_id, "Joined vault room");
                    json!({ "type": "joined", "vaultId": vault_id })
                }
                Err(e) => json!({
                    "type": "error",
                    "vaultId": vault_id,
                    "error": ApiError::from(e).to_string(),
                }),
            }
        }
        ClientFrame::Leave { vault_id } => {
            rooms.remove(&StreamHub::vault_topic(vault_id));
            json!({ "type": "left", "vaultId": vault_id })
        }
    }
}
