//! # VulnArk Realtime
//!
//! Realtime notification client for the VulnArk vulnerability-management
//! console. Scan progress and system notifications are pushed over a
//! persistent WebSocket channel; this crate owns that channel's lifecycle:
//! connect/disconnect, bounded automatic reconnection, the application-level
//! heartbeat, and topic subscriptions that survive reconnects.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vulnark_realtime::{RealtimeClient, RealtimeClientOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RealtimeClient::new(RealtimeClientOptions {
//!         host: "console.example.com".to_string(),
//!         secure: true,
//!         ..Default::default()
//!     })?;
//!
//!     client
//!         .on("scan_progress", Arc::new(|data| {
//!             println!("scan progress: {data}");
//!         }))
//!         .await;
//!
//!     client.subscribe("scan:42").await?;
//!     client.connect().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod infrastructure;
pub mod messaging;
pub mod transport;
pub mod types;

pub use client::{ConnectionState, RealtimeClient, RealtimeClientBuilder, RealtimeClientOptions};
pub use messaging::{EventKind, EventListener};
pub use types::{ClientMessage, RealtimeError, Result, ServerMessage};
