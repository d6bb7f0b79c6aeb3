use std::sync::{Arc, Mutex};
use std::time::Duration;

use coachiq_ws::config::ConnectionPolicy;
use coachiq_ws::connection::ConnectionManager;
use coachiq_ws::error::CoachIqError;
use coachiq_ws::handlers::ChannelHandlers;
use coachiq_ws::state::ChannelState;
use coachiq_ws::testing::MockTransport;
use coachiq_ws::transport::{CloseInfo, Frame};
use coachiq_ws::types::Heartbeat;
use url::Url;

fn policy() -> ConnectionPolicy {
    ConnectionPolicy {
        auto_reconnect: false,
        reconnect_delay: Duration::from_millis(100),
        max_reconnect_attempts: 0,
        connection_timeout: Duration::from_secs(10),
        heartbeat_interval: Duration::ZERO,
    }
}

fn manager(mock: &MockTransport) -> ConnectionManager<MockTransport> {
    let url = Url::parse("ws://coach.test/ws").unwrap();
    ConnectionManager::with_transport("entities", url, policy(), mock.clone())
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

const ENTITY_UPDATE: &str = r#"{
    "type": "entity_update",
    "data": {
        "entity_id": "light.galley",
        "device_type": "light",
        "friendly_name": "Galley Light",
        "suggested_area": "galley",
        "state": "on",
        "timestamp": 1718900000123
    }
}"#;

#[tokio::test(start_paused = true)]
async fn entity_update_reaches_generic_handler_first() {
    let mock = MockTransport::new();
    let server = mock.accept_next();
    let manager = manager(&mock);

    let order = Arc::new(Mutex::new(Vec::new()));
    manager
        .update_handlers(
            ChannelHandlers::new()
                .on_message({
                    let order = order.clone();
                    move |_| order.lock().unwrap().push("message")
                })
                .on_entity_update({
                    let order = order.clone();
                    move |update| {
                        assert_eq!(update.entity_id, "light.galley");
                        order.lock().unwrap().push("entity");
                    }
                }),
        )
        .await;

    manager.connect().await;
    settle().await;

    server.send_text(ENTITY_UPDATE);
    settle().await;

    assert_eq!(*order.lock().unwrap(), vec!["message", "entity"]);
    manager.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn malformed_frame_is_dropped_without_state_change() {
    let mock = MockTransport::new();
    let server = mock.accept_next();
    let manager = manager(&mock);

    let entity_hits = Arc::new(Mutex::new(0u32));
    manager
        .update_handlers(ChannelHandlers::new().on_entity_update({
            let entity_hits = entity_hits.clone();
            move |_| *entity_hits.lock().unwrap() += 1
        }))
        .await;

    manager.connect().await;
    settle().await;

    server.send_text("this is not json {");
    settle().await;
    assert_eq!(manager.state().await, ChannelState::Connected);
    assert_eq!(manager.stats().await.parse_failures, 1);

    // A later valid frame still dispatches.
    server.send_text(ENTITY_UPDATE);
    settle().await;
    assert_eq!(*entity_hits.lock().unwrap(), 1);
    assert_eq!(manager.stats().await.messages_received, 1);

    manager.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn unknown_kind_reaches_only_the_generic_handler() {
    let mock = MockTransport::new();
    let server = mock.accept_next();
    let manager = manager(&mock);

    let order = Arc::new(Mutex::new(Vec::new()));
    manager
        .update_handlers(
            ChannelHandlers::new()
                .on_message({
                    let order = order.clone();
                    move |message| {
                        order
                            .lock()
                            .unwrap()
                            .push(format!("message:{}", message.kind()))
                    }
                })
                .on_entity_update({
                    let order = order.clone();
                    move |_| order.lock().unwrap().push("entity".to_string())
                }),
        )
        .await;

    manager.connect().await;
    settle().await;

    server.send_text(r#"{"type": "firmware_update", "data": {"pct": 10}}"#);
    settle().await;

    assert_eq!(
        *order.lock().unwrap(),
        vec!["message:firmware_update".to_string()]
    );
    assert_eq!(manager.state().await, ChannelState::Connected);
    manager.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn send_fails_unless_connected() {
    let mock = MockTransport::new();
    let server = mock.accept_next();
    let manager = manager(&mock);

    let heartbeat = Heartbeat::now();
    let result = manager.send(&heartbeat).await;
    assert!(matches!(result, Err(CoachIqError::NotConnected { .. })));

    manager.connect().await;
    settle().await;
    manager.send(&heartbeat).await.unwrap();
    settle().await;
    assert_eq!(mock.sent_texts().len(), 1);
    assert!(mock.sent_texts()[0].contains("\"type\":\"ping\""));

    manager.disconnect().await;
    let result = manager.send(&heartbeat).await;
    assert!(matches!(result, Err(CoachIqError::NotConnected { .. })));

    drop(server);
}

#[tokio::test(start_paused = true)]
async fn close_callback_receives_the_close_code() {
    let mock = MockTransport::new();
    let server = mock.accept_next();
    let manager = manager(&mock);

    let seen = Arc::new(Mutex::new(None));
    manager
        .update_handlers(ChannelHandlers::new().on_close({
            let seen = seen.clone();
            move |close| *seen.lock().unwrap() = close.cloned()
        }))
        .await;

    manager.connect().await;
    settle().await;

    server.send_frame(Frame::Close(Some(CloseInfo {
        code: 1000,
        reason: "normal".to_string(),
    })));
    settle().await;

    let close = seen.lock().unwrap().clone();
    assert_eq!(close.map(|c| c.code), Some(1000));
    assert_eq!(manager.state().await, ChannelState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn updated_handlers_apply_to_the_live_connection() {
    let mock = MockTransport::new();
    let server = mock.accept_next();
    let manager = manager(&mock);

    let first = Arc::new(Mutex::new(0u32));
    manager
        .update_handlers(ChannelHandlers::new().on_entity_update({
            let first = first.clone();
            move |_| *first.lock().unwrap() += 1
        }))
        .await;

    manager.connect().await;
    settle().await;
    server.send_text(ENTITY_UPDATE);
    settle().await;
    assert_eq!(*first.lock().unwrap(), 1);

    // Re-subscribe mid-session; the old callback is replaced.
    let second = Arc::new(Mutex::new(0u32));
    manager
        .update_handlers(ChannelHandlers::new().on_entity_update({
            let second = second.clone();
            move |_| *second.lock().unwrap() += 1
        }))
        .await;

    server.send_text(ENTITY_UPDATE);
    settle().await;
    assert_eq!(*first.lock().unwrap(), 1);
    assert_eq!(*second.lock().unwrap(), 1);

    manager.disconnect().await;
}
