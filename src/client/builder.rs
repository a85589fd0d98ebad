use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use url::Url;

use super::{ClientState, ConnectionManager, RealtimeClient};
use crate::infrastructure::ReconnectTimer;
use crate::transport::{Transport, WebSocketTransport};
use crate::types::constants::{
    HEARTBEAT_INTERVAL, MAX_RECONNECT_ATTEMPTS, PONG_TIMEOUT, RECONNECT_INTERVAL, WS_PATH,
};
use crate::types::{RealtimeError, Result};

/// Configuration for the realtime client.
#[derive(Debug, Clone, Default)]
pub struct RealtimeClientOptions {
    /// Configured API base. A leading `http://`/`https://` is stripped; when
    /// unset the push endpoint lives on `host`.
    pub api_base_url: Option<String>,
    /// Host (and optional port) the console itself is served from; the
    /// fallback endpoint host.
    pub host: String,
    /// Whether the console was served over TLS. Selects `wss` vs `ws`.
    pub secure: bool,
    /// Heartbeat ping interval in milliseconds.
    pub heartbeat_interval: Option<u64>,
    /// Pong deadline in milliseconds.
    pub pong_timeout: Option<u64>,
    /// Fixed delay between reconnect attempts in milliseconds.
    pub reconnect_interval: Option<u64>,
    /// Cap on automatic reconnect attempts.
    pub max_reconnect_attempts: Option<u32>,
}

impl RealtimeClientOptions {
    pub(crate) fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval.unwrap_or(HEARTBEAT_INTERVAL))
    }

    pub(crate) fn pong_deadline(&self) -> Duration {
        Duration::from_millis(self.pong_timeout.unwrap_or(PONG_TIMEOUT))
    }

    pub(crate) fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval.unwrap_or(RECONNECT_INTERVAL))
    }

    pub(crate) fn retry_cap(&self) -> u32 {
        self.max_reconnect_attempts.unwrap_or(MAX_RECONNECT_ATTEMPTS)
    }
}

/// Builder that validates options and assembles the client.
pub struct RealtimeClientBuilder {
    options: RealtimeClientOptions,
    transport: Arc<dyn Transport>,
}

impl RealtimeClientBuilder {
    /// Create a new builder
    pub fn new(options: RealtimeClientOptions) -> Result<Self> {
        if options.host.is_empty() && options.api_base_url.is_none() {
            return Err(RealtimeError::Config(
                "an endpoint host is required".to_string(),
            ));
        }

        Ok(Self {
            options,
            transport: Arc::new(WebSocketTransport),
        })
    }

    /// Swaps the transport implementation. Tests use this to run the client
    /// against an in-memory channel.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Build the client
    pub fn build(self) -> Result<RealtimeClient> {
        let endpoint = endpoint_url(&self.options);
        // Validate early; dialing assumes a well-formed URL.
        Url::parse(&endpoint)?;

        let mut state = ClientState::new();
        state.reconnect = ReconnectTimer::new(
            self.options.retry_delay(),
            self.options.retry_cap(),
        );

        Ok(RealtimeClient {
            endpoint,
            options: self.options,
            connection: Arc::new(ConnectionManager::new()),
            state: Arc::new(RwLock::new(state)),
            transport: self.transport,
        })
    }
}

/// Resolves the push endpoint: secure scheme when the console itself was
/// served securely, the configured API host (scheme prefix stripped) or the
/// fallback host, and the fixed `/ws` path.
pub(crate) fn endpoint_url(options: &RealtimeClientOptions) -> String {
    let scheme = if options.secure { "wss" } else { "ws" };
    let host = options
        .api_base_url
        .as_deref()
        .map(strip_http_scheme)
        .unwrap_or(&options.host);

    format!("{}://{}{}", scheme, host, WS_PATH)
}

fn strip_http_scheme(base: &str) -> &str {
    base.strip_prefix("https://")
        .or_else(|| base.strip_prefix("http://"))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_uses_fallback_host() {
        let options = RealtimeClientOptions {
            host: "console.example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(endpoint_url(&options), "ws://console.example.com/ws");
    }

    #[test]
    fn test_endpoint_secure_scheme() {
        let options = RealtimeClientOptions {
            host: "console.example.com".to_string(),
            secure: true,
            ..Default::default()
        };
        assert_eq!(endpoint_url(&options), "wss://console.example.com/ws");
    }

    #[test]
    fn test_endpoint_strips_api_base_scheme() {
        let options = RealtimeClientOptions {
            api_base_url: Some("https://api.example.com:8443".to_string()),
            host: "console.example.com".to_string(),
            secure: true,
            ..Default::default()
        };
        assert_eq!(endpoint_url(&options), "wss://api.example.com:8443/ws");
    }

    #[test]
    fn test_endpoint_api_base_without_scheme() {
        let options = RealtimeClientOptions {
            api_base_url: Some("api.example.com".to_string()),
            host: "console.example.com".to_string(),
            ..Default::default()
        };
        assert_eq!(endpoint_url(&options), "ws://api.example.com/ws");
    }

    #[test]
    fn test_builder_rejects_missing_host() {
        let result = RealtimeClientBuilder::new(RealtimeClientOptions::default());
        assert!(matches!(result, Err(RealtimeError::Config(_))));
    }
}
