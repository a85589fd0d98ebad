use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use crate::client::RealtimeClient;
use crate::types::constants::{HEARTBEAT_INTERVAL, PONG_TIMEOUT};
use crate::types::message::ClientMessage;

/// Application-level ping/pong driver.
///
/// While the channel is open, sends a ping every interval and arms the pong
/// deadline. A missed pong is treated as a dead connection, not a logic
/// error: the client tears the channel down and redials.
pub struct HeartbeatManager {
    client: RealtimeClient,
    interval: Duration,
    pong_timeout: Duration,
}

impl HeartbeatManager {
    pub fn new(client: RealtimeClient) -> Self {
        Self {
            client,
            interval: Duration::from_millis(HEARTBEAT_INTERVAL),
            pong_timeout: Duration::from_millis(PONG_TIMEOUT),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_pong_timeout(mut self, pong_timeout: Duration) -> Self {
        self.pong_timeout = pong_timeout;
        self
    }

    /// Ping loop; runs until the owning task is aborted.
    pub async fn run(self) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of a tokio interval completes immediately; the
        // first ping belongs one full interval after open.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if !self.client.is_connected() {
                continue;
            }

            match self.client.send_message(ClientMessage::Ping).await {
                Ok(()) => {
                    tracing::debug!("Sent heartbeat ping");
                    self.client.arm_pong_deadline(self.pong_timeout).await;
                }
                Err(e) => {
                    tracing::warn!("Failed to send heartbeat ping: {}", e);
                }
            }
        }
    }
}
