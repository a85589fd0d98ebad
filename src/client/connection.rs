use tokio::sync::{watch, Mutex};

use crate::transport::TransportSink;
use crate::types::message::ClientMessage;
use crate::types::{RealtimeError, Result};

/// Lifecycle of the single logical push connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// No channel and none wanted.
    Idle,
    /// Transport dial in flight.
    Connecting,
    /// Channel established and heartbeating.
    Open,
    /// Channel dropped by the peer or the transport.
    Closed { code: u16, reason: String },
    /// Waiting out the delay before the next automatic attempt.
    Reconnecting,
    /// Dial failed, or the retry budget is exhausted.
    Failed,
}

/// Owns the write half of the channel and the observable connection state.
pub struct ConnectionManager {
    sink: Mutex<Option<Box<dyn TransportSink>>>,
    state_tx: watch::Sender<ConnectionState>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        Self {
            sink: Mutex::new(None),
            state_tx,
        }
    }

    /// Hands over the write half after a successful dial.
    pub async fn set_sink(&self, sink: Box<dyn TransportSink>) {
        *self.sink.lock().await = Some(sink);
    }

    /// Gets the current connection state
    pub fn state(&self) -> ConnectionState {
        self.state_tx.borrow().clone()
    }

    /// Sets the connection state and notifies watchers
    pub fn set_state(&self, new_state: ConnectionState) {
        self.state_tx.send_replace(new_state);
    }

    /// Atomically moves to `Connecting` unless a live channel already exists.
    /// Returns false when a dial is in flight or the channel is open.
    pub fn begin_connecting(&self) -> bool {
        self.state_tx.send_if_modified(|state| match state {
            ConnectionState::Open | ConnectionState::Connecting => false,
            _ => {
                *state = ConnectionState::Connecting;
                true
            }
        })
    }

    /// Watch handle observing every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Checks if currently connected
    pub fn is_connected(&self) -> bool {
        *self.state_tx.borrow() == ConnectionState::Open
    }

    /// Serializes and transmits an envelope over the channel.
    pub async fn send_message(&self, message: &ClientMessage) -> Result<()> {
        let json = serde_json::to_string(message)?;

        let mut sink = self.sink.lock().await;
        match sink.as_mut() {
            Some(sink) => sink.send_text(json).await,
            None => Err(RealtimeError::NotConnected),
        }
    }

    /// Closes and drops the write half if one is present. Safe to call when
    /// already closed; state transitions are the caller's concern.
    pub async fn close(&self) {
        let mut guard = self.sink.lock().await;
        if let Some(mut sink) = guard.take() {
            if let Err(e) = sink.close().await {
                tracing::debug!("Error closing transport: {}", e);
            }
        }
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
