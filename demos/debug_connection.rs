//! Raw connection probe against a live backend, bypassing the connection
//! manager. Useful when the wire format itself is in question.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://localhost:8000/ws".to_string());

    println!("Connecting to {url}...");
    let (ws_stream, response) = connect_async(&url).await?;
    println!("Connected, HTTP status {}", response.status());

    let (mut write, mut read) = ws_stream.split();

    // One heartbeat up front so the backend sees a live client.
    let ping = serde_json::json!({"type": "ping", "timestamp": chrono::Utc::now().timestamp_millis()});
    write.send(Message::Text(ping.to_string().into())).await?;

    println!("Waiting for messages... (Ctrl+C to stop)");

    let mut message_count = 0;
    while let Some(message) = read.next().await {
        match message? {
            Message::Text(text) => {
                message_count += 1;
                println!("Message #{}: {}", message_count, text);

                if let Ok(value) = serde_json::from_str::<serde_json::Value>(text.as_str()) {
                    println!(
                        "Formatted JSON:\n{}",
                        serde_json::to_string_pretty(&value)?
                    );
                }

                // Stop after 10 messages for debugging
                if message_count >= 10 {
                    println!("Stopping after {} messages", message_count);
                    break;
                }
            }
            Message::Binary(data) => {
                println!("Binary message: {} bytes", data.len());
            }
            Message::Close(frame) => {
                println!("Connection closed: {:?}", frame);
                break;
            }
            _ => {}
        }
    }

    println!("Debug session complete");
    Ok(())
}
