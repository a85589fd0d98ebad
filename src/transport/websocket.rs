use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream, StreamExt};
use futures::SinkExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::{CloseFrame, Transport, TransportEvent, TransportSink, TransportStream};
use crate::types::Result;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production transport backed by tokio-tungstenite.
pub struct WebSocketTransport;

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(
        &self,
        url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>)> {
        tracing::debug!("Opening WebSocket connection to {}", url);
        let (stream, _response) = connect_async(url).await?;
        let (write_half, read_half) = stream.split();

        Ok((
            Box::new(WebSocketSink { inner: write_half }),
            Box::new(WebSocketReader { inner: read_half }),
        ))
    }
}

struct WebSocketSink {
    inner: SplitSink<WsStream, Message>,
}

#[async_trait]
impl TransportSink for WebSocketSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.inner.send(Message::Text(text)).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.inner.close().await?;
        Ok(())
    }
}

struct WebSocketReader {
    inner: SplitStream<WsStream>,
}

#[async_trait]
impl TransportStream for WebSocketReader {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        loop {
            let message = match self.inner.next().await? {
                Ok(message) => message,
                Err(e) => return Some(TransportEvent::Error(e.to_string())),
            };

            match message {
                Message::Text(text) => return Some(TransportEvent::Message(text)),
                Message::Close(frame) => {
                    return Some(TransportEvent::Closed(frame.map(|f| CloseFrame {
                        code: f.code.into(),
                        reason: f.reason.to_string(),
                    })))
                }
                // Transport-level ping/pong is handled by tungstenite itself;
                // the application heartbeat rides in text frames.
                Message::Ping(data) => {
                    tracing::debug!("Received transport ping ({} bytes)", data.len());
                }
                Message::Pong(data) => {
                    tracing::debug!("Received transport pong ({} bytes)", data.len());
                }
                Message::Binary(data) => {
                    tracing::warn!("Received unexpected binary message ({} bytes)", data.len());
                }
                Message::Frame(_) => {}
            }
        }
    }
}
