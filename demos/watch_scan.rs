use std::sync::Arc;

use vulnark_realtime::{ConnectionState, RealtimeClient, RealtimeClientOptions};

/// Follows one scan task's progress stream, surviving connection drops.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let host =
        std::env::var("VULNARK_HOST").unwrap_or_else(|_| "localhost:8080".to_string());
    let scan_id = std::env::var("SCAN_ID").unwrap_or_else(|_| "42".to_string());

    let client = RealtimeClient::new(RealtimeClientOptions {
        host,
        ..Default::default()
    })?;

    client
        .on("scan_progress", Arc::new(|data| {
            println!("scan progress: {data}");
        }))
        .await;

    // Intent is recorded before connecting; the subscribe envelope goes out
    // on open and again after every reconnect.
    client.subscribe(&format!("scan:{scan_id}")).await?;
    client.connect().await;

    let mut states = client.state_changes();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            println!("state: {state:?}");
            if state == ConnectionState::Failed {
                println!("retry budget exhausted; call connect() to resume");
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    client.disconnect().await;

    Ok(())
}
