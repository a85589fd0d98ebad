//! In-memory transport double for tests: captures outbound frames, lets the
//! test feed inbound events, and can be told to refuse dials.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{CloseFrame, Transport, TransportEvent, TransportSink, TransportStream};
use crate::types::{RealtimeError, Result};

struct MockShared {
    sent: Mutex<Vec<String>>,
    dials: AtomicUsize,
    fail_dials: AtomicBool,
    events: Mutex<Option<mpsc::UnboundedSender<TransportEvent>>>,
}

pub(crate) struct MockTransport {
    shared: Arc<MockShared>,
}

impl MockTransport {
    pub fn new() -> (Arc<Self>, MockHandle) {
        let shared = Arc::new(MockShared {
            sent: Mutex::new(Vec::new()),
            dials: AtomicUsize::new(0),
            fail_dials: AtomicBool::new(false),
            events: Mutex::new(None),
        });
        (
            Arc::new(Self {
                shared: Arc::clone(&shared),
            }),
            MockHandle { shared },
        )
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(
        &self,
        _url: &str,
    ) -> Result<(Box<dyn TransportSink>, Box<dyn TransportStream>)> {
        self.shared.dials.fetch_add(1, Ordering::SeqCst);
        if self.shared.fail_dials.load(Ordering::SeqCst) {
            return Err(RealtimeError::Connection("dial refused".to_string()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *self.shared.events.lock().unwrap() = Some(tx);

        Ok((
            Box::new(MockSink {
                shared: Arc::clone(&self.shared),
            }),
            Box::new(MockStream { rx }),
        ))
    }
}

struct MockSink {
    shared: Arc<MockShared>,
}

#[async_trait]
impl TransportSink for MockSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.shared.sent.lock().unwrap().push(text);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

struct MockStream {
    rx: mpsc::UnboundedReceiver<TransportEvent>,
}

#[async_trait]
impl TransportStream for MockStream {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}

/// Test-side controls for the most recently opened channel.
pub(crate) struct MockHandle {
    shared: Arc<MockShared>,
}

impl MockHandle {
    /// All frames the client has written, oldest first.
    pub fn sent(&self) -> Vec<String> {
        self.shared.sent.lock().unwrap().clone()
    }

    pub fn clear_sent(&self) {
        self.shared.sent.lock().unwrap().clear();
    }

    /// Number of dial attempts, successful or not.
    pub fn dials(&self) -> usize {
        self.shared.dials.load(Ordering::SeqCst)
    }

    pub fn fail_dials(&self, fail: bool) {
        self.shared.fail_dials.store(fail, Ordering::SeqCst);
    }

    /// Feeds an inbound text frame to the client's read loop.
    pub fn push_text(&self, text: &str) {
        if let Some(tx) = self.shared.events.lock().unwrap().as_ref() {
            let _ = tx.send(TransportEvent::Message(text.to_string()));
        }
    }

    /// Delivers a close frame with the given code, then ends the stream.
    pub fn push_close(&self, code: u16, reason: &str) {
        let mut events = self.shared.events.lock().unwrap();
        if let Some(tx) = events.as_ref() {
            let _ = tx.send(TransportEvent::Closed(Some(CloseFrame {
                code,
                reason: reason.to_string(),
            })));
        }
        *events = None;
    }

    /// Kills the channel without a close frame (abnormal termination).
    pub fn drop_channel(&self) {
        *self.shared.events.lock().unwrap() = None;
    }
}
