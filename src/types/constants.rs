/// Protocol message type strings (magic strings layer)
pub mod message_types {
    pub const SUBSCRIBE: &str = "subscribe";
    pub const UNSUBSCRIBE: &str = "unsubscribe";
    pub const PING: &str = "ping";
    pub const PONG: &str = "pong";
}

/// Well-known server event names
pub mod event_names {
    pub const CONNECTION: &str = "connection";
    pub const SCAN_PROGRESS: &str = "scan_progress";
    pub const NOTIFICATION: &str = "notification";
}

/// Path the push endpoint is mounted on
pub const WS_PATH: &str = "/ws";

/// Default heartbeat ping interval (milliseconds)
pub const HEARTBEAT_INTERVAL: u64 = 15_000;

/// Default pong deadline (milliseconds)
pub const PONG_TIMEOUT: u64 = 30_000;

/// Default delay between reconnect attempts (milliseconds).
/// The delay is fixed, not an exponential curve.
pub const RECONNECT_INTERVAL: u64 = 3_000;

/// Default cap on automatic reconnect attempts
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// WebSocket close codes
pub const WS_CLOSE_NORMAL: u16 = 1000;
pub const WS_CLOSE_ABNORMAL: u16 = 1006;
