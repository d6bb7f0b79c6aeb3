//! Minimal library usage: watch the entity channel and print state changes.

use coachiq_ws::config::ConnectionPolicy;
use coachiq_ws::connection::ConnectionManager;
use coachiq_ws::handlers::ChannelHandlers;
use url::Url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ws://localhost:8000".to_string());
    let url = Url::parse(&base)?.join("/ws")?;

    let entities = ConnectionManager::new("entities", url, ConnectionPolicy::default());

    entities
        .update_handlers(
            ChannelHandlers::new()
                .on_open(|| println!("entity channel open"))
                .on_entity_update(|update| {
                    println!(
                        "{:<28} {:<10} {}",
                        update.display_name(),
                        update.device_type,
                        update.state
                    );
                })
                .on_close(|close| println!("entity channel closed: {close:?}")),
        )
        .await;

    entities.connect().await;
    tokio::signal::ctrl_c().await?;
    entities.disconnect().await;
    Ok(())
}
