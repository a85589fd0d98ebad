use std::sync::Arc;

use vulnark_realtime::{EventKind, RealtimeClient, RealtimeClientOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let host =
        std::env::var("VULNARK_HOST").unwrap_or_else(|_| "localhost:8080".to_string());

    let client = RealtimeClient::new(RealtimeClientOptions {
        host,
        ..Default::default()
    })?;

    client
        .on(EventKind::Notification, Arc::new(|data| {
            println!("notification: {data}");
        }))
        .await;

    client
        .on(EventKind::Connection, Arc::new(|data| {
            println!("connection: {data}");
        }))
        .await;

    println!("Connecting to {}...", client.endpoint());
    client.connect().await;

    // Keep the channel alive until interrupted
    tokio::signal::ctrl_c().await?;

    println!("Disconnecting...");
    client.disconnect().await;

    Ok(())
}
