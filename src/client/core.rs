use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::{watch, RwLock};
use tokio::time;

use super::{
    ClientState, ConnectionManager, ConnectionState, RealtimeClientBuilder, RealtimeClientOptions,
};
use crate::infrastructure::HeartbeatManager;
use crate::messaging::{registry, EventKind, EventListener, MessageRouter};
use crate::transport::{CloseFrame, Transport, TransportEvent, TransportStream};
use crate::types::constants::{WS_CLOSE_ABNORMAL, WS_CLOSE_NORMAL};
use crate::types::message::ClientMessage;
use crate::types::{RealtimeError, Result};

/// The realtime push channel of the VulnArk console.
///
/// One long-lived instance is constructed at application start and shared by
/// consumers. It owns the WebSocket lifecycle: connect/disconnect, automatic
/// reconnection on a bounded fixed-delay schedule, the application-level
/// ping/pong liveness protocol, and a topic subscription registry that
/// survives reconnects. Consumers observe it purely through event listeners.
///
/// Nothing here panics across the public boundary; faults become state
/// transitions, log lines, or `Err` values.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use vulnark_realtime::{RealtimeClient, RealtimeClientOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RealtimeClient::new(RealtimeClientOptions {
///     host: "console.example.com".to_string(),
///     secure: true,
///     ..Default::default()
/// })?;
///
/// client
///     .on("scan_progress", Arc::new(|data| {
///         println!("progress: {data}");
///     }))
///     .await;
///
/// client.subscribe("scan:42").await?;
/// client.connect().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RealtimeClient {
    pub(crate) endpoint: String,
    pub(crate) options: RealtimeClientOptions,

    // Connection manager: write half + observable state
    pub(crate) connection: Arc<ConnectionManager>,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,

    pub(crate) transport: Arc<dyn Transport>,
}

impl RealtimeClient {
    /// Creates a new client from options. No connection is established until
    /// [`connect()`](Self::connect) is called.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Config`] when no endpoint host is configured
    /// and [`RealtimeError::UrlParse`] when the resolved endpoint is not a
    /// valid URL.
    pub fn new(options: RealtimeClientOptions) -> Result<Self> {
        RealtimeClientBuilder::new(options)?.build()
    }

    /// Opens the push channel.
    ///
    /// A no-op while a dial is already in flight or the channel is open.
    /// Does not block waiting for `Open`: callers observe the transition via
    /// the `connection` event or [`state_changes()`](Self::state_changes).
    /// Dial failures are not surfaced here; they are absorbed into the
    /// reconnection schedule.
    pub async fn connect(&self) {
        // An explicit connect gets a fresh retry budget, including out of
        // terminal Failed.
        self.state.write().await.reconnect.reset();
        self.do_connect().await;
    }

    // Boxed to break the Send-inference cycle formed by the mutually
    // recursive async lifecycle methods (do_connect → on_open spawns the
    // heartbeat, which redials through reset_connection → do_connect). The
    // returned future is still awaited exactly as before.
    pub(crate) fn do_connect(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if !self.connection.begin_connecting() {
                tracing::debug!("Already connected or connecting");
                return;
            }
            self.set_manual_disconnect(false).await;

            tracing::info!("Connecting to {}", self.endpoint);

            let (sink, stream) = match self.transport.open(&self.endpoint).await {
                Ok(halves) => halves,
                Err(e) => {
                    tracing::error!("Failed to open push channel: {}", e);
                    self.connection.set_state(ConnectionState::Failed);
                    self.schedule_reconnect().await;
                    return;
                }
            };

            self.connection.set_sink(sink).await;
            // The read loop starts only after the open transition completed, so
            // a close signal is always observed from the Open state.
            self.on_open().await;
            self.spawn_read_task(stream).await;
        })
    }

    /// Tears the channel down and clears subscription intent.
    ///
    /// This is the only path that clears the subscription set; a transient
    /// drop keeps it so topics are replayed on reconnect. Safe to call when
    /// already idle.
    pub async fn disconnect(&self) {
        if self.connection.state() == ConnectionState::Idle {
            return;
        }

        tracing::info!("Disconnecting from push endpoint");

        {
            let mut state = self.state.write().await;
            state.was_manual_disconnect = true;
            state.cancel_heartbeat();
            state.task_manager.abort_all();
            state.subscriptions.clear();
        }

        self.connection.close().await;
        self.connection.set_state(ConnectionState::Idle);
        self.emit_connection_event(false).await;
    }

    /// Channel established: reset the retry budget, replay subscription
    /// intent, start the heartbeat, and tell listeners we are live.
    async fn on_open(&self) {
        self.connection.set_state(ConnectionState::Open);

        let topics: Vec<String> = {
            let mut state = self.state.write().await;
            state.reconnect.reset();
            state.subscriptions.iter().cloned().collect()
        };

        // Fire-and-forget resubscription; no acknowledgment is awaited.
        for topic in &topics {
            let message = ClientMessage::subscribe(topic.clone());
            if let Err(e) = self.connection.send_message(&message).await {
                tracing::warn!("Failed to resubscribe '{}': {}", topic, e);
            }
        }

        let heartbeat = HeartbeatManager::new(self.clone())
            .with_interval(self.options.ping_interval())
            .with_pong_timeout(self.options.pong_deadline());
        {
            let mut state = self.state.write().await;
            state.cancel_heartbeat();
            state.heartbeat_task = Some(tokio::spawn(heartbeat.run()));
        }

        tracing::info!("Connected to push endpoint");
        self.emit_connection_event(true).await;
    }

    /// Transport reported closure. Cancels the heartbeat pair, emits the
    /// connectivity event and, for an unclean drop, enters the reconnection
    /// schedule. A clean close never reconnects.
    async fn on_close(&self, frame: Option<CloseFrame>) {
        let manual = self.state.read().await.was_manual_disconnect;

        let frame = frame.unwrap_or(CloseFrame {
            code: WS_CLOSE_ABNORMAL,
            reason: String::new(),
        });
        let clean = manual || frame.code == WS_CLOSE_NORMAL;

        tracing::info!(
            "Connection closed: code={} reason='{}' clean={}",
            frame.code,
            frame.reason,
            clean
        );

        self.state.write().await.cancel_heartbeat();
        self.connection.close().await;

        if manual {
            // disconnect() already set Idle and emitted the event.
            return;
        }

        self.connection.set_state(ConnectionState::Closed {
            code: frame.code,
            reason: frame.reason,
        });
        self.emit_connection_event(false).await;

        if !clean {
            self.schedule_reconnect().await;
        }
    }

    async fn spawn_read_task(&self, mut stream: Box<dyn TransportStream>) {
        let client = self.clone();
        let router = MessageRouter::new_with_state(Arc::clone(&self.state));

        let mut state = self.state.write().await;
        state.task_manager.spawn(async move {
            tracing::debug!("Read task started");
            let close_frame = loop {
                match stream.next_event().await {
                    Some(TransportEvent::Message(text)) => {
                        router.route(&text).await;
                    }
                    Some(TransportEvent::Closed(frame)) => break frame,
                    Some(TransportEvent::Error(e)) => {
                        // Log only; the stream ending is the actual trigger.
                        tracing::error!("Transport error: {}", e);
                    }
                    None => break None,
                }
            };
            client.on_close(close_frame).await;
            tracing::debug!("Read task finished");
        });
    }

    /// Claims a retry slot and arms a delayed redial. Once the budget is
    /// gone the client parks in `Failed` until an explicit `connect()`.
    async fn schedule_reconnect(&self) {
        let delay = {
            let mut state = self.state.write().await;
            match state.reconnect.next_delay() {
                Some(delay) => {
                    tracing::info!(
                        "Scheduling reconnect attempt {}/{} in {:?}",
                        state.reconnect.attempts(),
                        state.reconnect.max_attempts(),
                        delay
                    );
                    delay
                }
                None => {
                    tracing::warn!("Reconnect attempts exhausted, giving up");
                    self.connection.set_state(ConnectionState::Failed);
                    return;
                }
            }
        };

        self.connection.set_state(ConnectionState::Reconnecting);

        let client = self.clone();
        self.state.write().await.task_manager.spawn(async move {
            time::sleep(delay).await;
            if client.state.read().await.was_manual_disconnect {
                tracing::debug!("Manual disconnect, abandoning scheduled reconnect");
                return;
            }
            client.do_connect().await;
        });
    }

    /// Hard reset after a missed pong: tear the channel down without
    /// touching the subscription set, then dial again immediately. A failed
    /// redial re-enters the normal reconnection schedule.
    pub(crate) async fn reset_connection(&self) {
        {
            let mut state = self.state.write().await;
            state.cancel_heartbeat();
            state.task_manager.abort_all();
        }

        self.connection.close().await;
        self.connection.set_state(ConnectionState::Closed {
            code: WS_CLOSE_ABNORMAL,
            reason: "heartbeat timeout".to_string(),
        });
        self.emit_connection_event(false).await;

        self.do_connect().await;
    }

    /// Arms the pong deadline after a ping went out.
    ///
    /// At most one deadline is ever live, and it belongs to the oldest
    /// unanswered ping: while one is armed, later pings do not push it out.
    pub(crate) async fn arm_pong_deadline(&self, timeout: Duration) {
        if self.state.read().await.pong_deadline.is_some() {
            return;
        }

        let client = self.clone();
        let handle = tokio::spawn(async move {
            time::sleep(timeout).await;
            tracing::warn!("Heartbeat deadline expired, forcing reconnect");
            // Detach our own handle so the reset below cannot cancel us.
            client.state.write().await.pong_deadline = None;
            client.reset_connection().await;
        });

        let mut state = self.state.write().await;
        if let Some(previous) = state.pong_deadline.replace(handle) {
            // Lost a race with a concurrent arm; keep a single deadline.
            previous.abort();
        }
    }

    /// Records the intent to receive `topic` events and, when the channel is
    /// open, sends the subscribe envelope immediately. Intent recorded while
    /// disconnected is replayed on the next open.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::InvalidTopic`] for an empty topic, or a send
    /// error when the immediate envelope cannot be written.
    pub async fn subscribe(&self, topic: &str) -> Result<()> {
        if topic.is_empty() {
            return Err(RealtimeError::InvalidTopic);
        }

        self.state
            .write()
            .await
            .subscriptions
            .insert(topic.to_string());

        if self.connection.is_connected() {
            self.connection
                .send_message(&ClientMessage::subscribe(topic))
                .await?;
        }
        Ok(())
    }

    /// Drops the intent to receive `topic` events; sends the unsubscribe
    /// envelope immediately when the channel is open.
    pub async fn unsubscribe(&self, topic: &str) -> Result<()> {
        if topic.is_empty() {
            return Err(RealtimeError::InvalidTopic);
        }

        self.state.write().await.subscriptions.remove(topic);

        if self.connection.is_connected() {
            self.connection
                .send_message(&ClientMessage::unsubscribe(topic))
                .await?;
        }
        Ok(())
    }

    /// Registers `listener` for `kind` events. Registration is idempotent
    /// per (kind, listener) identity; dispatch order is registration order.
    pub async fn on(&self, kind: impl Into<EventKind>, listener: EventListener) {
        self.state.write().await.listeners.add(kind.into(), listener);
    }

    /// Removes a previously registered listener. No-op when absent.
    pub async fn off(&self, kind: impl Into<EventKind>, listener: &EventListener) {
        self.state
            .write()
            .await
            .listeners
            .remove(&kind.into(), listener);
    }

    /// Serializes and transmits an envelope over the open channel.
    ///
    /// Fails as an `Err`, never a panic, when the channel is not open or the
    /// envelope cannot be serialized. Messages are never buffered for later
    /// delivery.
    pub async fn send_message(&self, message: ClientMessage) -> Result<()> {
        if !self.connection.is_connected() {
            return Err(RealtimeError::NotConnected);
        }
        self.connection.send_message(&message).await
    }

    /// Checks whether the push channel is currently open.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Watch handle receiving every connection state transition.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    /// Current subscription intent, in lexical order.
    pub async fn subscribed_topics(&self) -> Vec<String> {
        self.state.read().await.subscriptions.iter().cloned().collect()
    }

    /// Resolved push endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn set_manual_disconnect(&self, manual: bool) {
        self.state.write().await.was_manual_disconnect = manual;
    }

    /// Synthetic local event telling listeners the channel came up or went
    /// away.
    async fn emit_connection_event(&self, connected: bool) {
        self.dispatch_event(EventKind::Connection, json!({ "connected": connected }))
            .await;
    }

    async fn dispatch_event(&self, kind: EventKind, data: serde_json::Value) {
        let listeners = self.state.read().await.listeners.snapshot(&kind);
        registry::fire(&kind, &listeners, &data);
    }
}
