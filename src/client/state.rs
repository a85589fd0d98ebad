use std::collections::BTreeSet;

use tokio::task::JoinHandle;

use crate::infrastructure::{ReconnectTimer, TaskManager};
use crate::messaging::ListenerRegistry;

/// Consolidated mutable state for `RealtimeClient`.
/// Using a single struct reduces lock contention and keeps the timer
/// invariants in one place.
pub struct ClientState {
    /// Durable subscription intent. Survives reconnects; cleared only by an
    /// explicit disconnect. Transport callbacks read it to replay subscribe
    /// envelopes but never mutate it.
    pub subscriptions: BTreeSet<String>,

    /// Listener registry for server-pushed events.
    pub listeners: ListenerRegistry,

    /// Background tasks: the read loop and scheduled reconnect attempts.
    pub task_manager: TaskManager,

    /// The heartbeat ping loop, while the channel is open.
    pub heartbeat_task: Option<JoinHandle<()>>,

    /// Armed pong deadline, while a ping is outstanding.
    pub pong_deadline: Option<JoinHandle<()>>,

    /// Whether the disconnect was requested by the caller (prevents
    /// auto-reconnect).
    pub was_manual_disconnect: bool,

    /// Automatic reconnection bookkeeping.
    pub reconnect: ReconnectTimer,
}

impl ClientState {
    pub fn new() -> Self {
        Self {
            subscriptions: BTreeSet::new(),
            listeners: ListenerRegistry::new(),
            task_manager: TaskManager::new(),
            heartbeat_task: None,
            pong_deadline: None,
            was_manual_disconnect: false,
            reconnect: ReconnectTimer::default(),
        }
    }

    /// Cancels the heartbeat interval and any armed pong deadline.
    ///
    /// At most one of each is ever live; every transition out of `Open` goes
    /// through here so neither can leak into the next connection.
    pub fn cancel_heartbeat(&mut self) {
        if let Some(task) = self.heartbeat_task.take() {
            task.abort();
        }
        if let Some(deadline) = self.pong_deadline.take() {
            deadline.abort();
        }
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new()
    }
}
