use std::sync::Arc;

use tokio::sync::RwLock;

use crate::client::ClientState;
use crate::messaging::{registry, EventKind};
use crate::types::message::ServerMessage;

/// Routes raw inbound frames to the pong handler or registered listeners.
pub struct MessageRouter {
    state: Arc<RwLock<ClientState>>,
}

impl MessageRouter {
    pub fn new_with_state(state: Arc<RwLock<ClientState>>) -> Self {
        Self { state }
    }

    /// Routes one raw text frame. Malformed payloads are logged and dropped;
    /// they never affect connection state.
    pub async fn route(&self, raw: &str) {
        let message = match ServerMessage::parse(raw) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!("Failed to parse message: {} - Raw: {}", e, raw);
                return;
            }
        };

        match message {
            ServerMessage::Pong => self.handle_pong().await,
            ServerMessage::Event { kind, data } => {
                if kind.as_str().is_empty() {
                    tracing::debug!("Dropping event frame with empty type");
                    return;
                }
                self.dispatch(kind, data).await;
            }
        }
    }

    /// Disarms the pong deadline; the connection proved alive.
    async fn handle_pong(&self) {
        let mut state = self.state.write().await;
        if let Some(deadline) = state.pong_deadline.take() {
            deadline.abort();
            tracing::debug!("Received pong, liveness deadline cleared");
        }
    }

    async fn dispatch(&self, kind: EventKind, data: serde_json::Value) {
        let listeners = {
            let state = self.state.read().await;
            state.listeners.snapshot(&kind)
        };

        tracing::debug!(
            "Dispatching '{}' to {} listener(s)",
            kind.as_str(),
            listeners.len()
        );
        registry::fire(&kind, &listeners, &data);
    }
}
