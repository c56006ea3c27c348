//! WebSocket client for tests against a served router.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

pub struct SocketClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl SocketClient {
    /// Open `/ws?token=...` and consume the `connected` frame.
    pub async fn connect(addr: SocketAddr, token: &str) -> Self {
        let url = format!("ws://{}/ws?token={}", addr, token);
        let (stream, _) = connect_async(url).await.expect("WebSocket handshake failed");
        let mut client = Self { stream };

        let connected = client.next().await;
        assert_eq!(connected["type"], "connected", "unexpected first frame {}", connected);
        client
    }

    pub async fn send(&mut self, frame: Value) {
        self.stream
            .send(Message::Text(frame.to_string()))
            .await
            .expect("WebSocket send failed");
    }

    /// Next JSON text frame, panicking after a timeout.
    pub async fn next(&mut self) -> Value {
        loop {
            let message = tokio::time::timeout(FRAME_TIMEOUT, self.stream.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("socket closed")
                .expect("socket error");
            if let Message::Text(text) = message {
                return serde_json::from_str(&text).expect("frame is not JSON");
            }
        }
    }

    /// Skip frames until one of the given type arrives.
    ///
    /// User-topic notifications interleave with room events in no fixed
    /// order, so tests wait for the frame they care about.
    pub async fn wait_for(&mut self, frame_type: &str) -> Value {
        loop {
            let frame = self.next().await;
            if frame["type"] == frame_type {
                return frame;
            }
        }
    }

    /// Frames that arrive before the reply to a ping.
    pub async fn flush(&mut self) -> Vec<Value> {
        self.send(serde_json::json!({ "type": "ping" })).await;
        let mut frames = Vec::new();
        loop {
            let frame = self.next().await;
            if frame["type"] == "pong" {
                return frames;
            }
            frames.push(frame);
        }
    }
}
