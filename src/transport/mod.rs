//! Transport abstraction over the full-duplex message channel.
//!
//! The client only needs text frames plus the lifecycle signals (opened,
//! closed-with-code, error). Keeping that behind a trait keeps the connection
//! logic independent of tokio-tungstenite and testable against an in-memory
//! double.

mod websocket;

#[cfg(test)]
pub(crate) mod mock;

pub use websocket::WebSocketTransport;

use async_trait::async_trait;

use crate::types::Result;

/// A closure signal as reported by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseFrame {
    pub code: u16,
    pub reason: String,
}

/// Inbound signals from an open channel.
#[derive(Debug)]
pub enum TransportEvent {
    /// A complete inbound text frame.
    Message(String),
    /// The peer closed the channel.
    Closed(Option<CloseFrame>),
    /// A transport-level fault; the stream ends shortly after.
    Error(String),
}

/// Write half of an open channel.
#[async_trait]
pub trait TransportSink: Send {
    async fn send_text(&mut self, text: String) -> Result<()>;
    async fn close(&mut self) -> Result<()>;
}

/// Read half of an open channel.
#[async_trait]
pub trait TransportStream: Send {
    /// Next inbound signal; `None` once the channel is gone.
    async fn next_event(&mut self) -> Option<TransportEvent>;
}

/// Opens full-duplex message channels to an endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, url: &str)
        -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>)>;
}
