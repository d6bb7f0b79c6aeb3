use std::time::Duration;

use coachiq_ws::config::ConnectionPolicy;
use coachiq_ws::connection::ConnectionManager;
use coachiq_ws::state::ChannelState;
use coachiq_ws::testing::MockTransport;
use coachiq_ws::transport::{CloseInfo, Frame};
use url::Url;

fn policy(max_attempts: u32) -> ConnectionPolicy {
    ConnectionPolicy {
        auto_reconnect: true,
        reconnect_delay: Duration::from_millis(100),
        max_reconnect_attempts: max_attempts,
        connection_timeout: Duration::from_secs(10),
        heartbeat_interval: Duration::ZERO,
    }
}

fn manager(mock: &MockTransport, policy: ConnectionPolicy) -> ConnectionManager<MockTransport> {
    let url = Url::parse("ws://coach.test/ws").unwrap();
    ConnectionManager::with_transport("entities", url, policy, mock.clone())
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn capped_retries_stop_after_the_configured_attempts() {
    // The mock refuses every dial once its script is empty.
    let mock = MockTransport::new();
    let manager = manager(&mock, policy(3));

    manager.connect().await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    // Initial dial plus exactly 3 scheduled retries.
    assert_eq!(mock.dial_count(), 4);
    assert_eq!(manager.state().await, ChannelState::Error);

    // No further attempts after the cap.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(mock.dial_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn retry_delay_is_constant() {
    let mock = MockTransport::new();
    let manager = manager(&mock, policy(0));

    manager.connect().await;
    settle().await;
    assert_eq!(mock.dial_count(), 1);

    // Retries land on a fixed 100ms cadence, not a growing one.
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(mock.dial_count(), 2);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(mock.dial_count(), 3);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(mock.dial_count(), 4);

    manager.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn disconnect_suppresses_a_queued_close() {
    let mock = MockTransport::new();
    let server = mock.accept_next();
    let manager = manager(&mock, policy(0));

    manager.connect().await;
    settle().await;
    assert!(manager.is_connected().await);

    // Close arrives concurrently with the disconnect; neither ordering
    // may schedule a reconnect.
    server.send_frame(Frame::Close(Some(CloseInfo {
        code: 1001,
        reason: "going away".to_string(),
    })));
    manager.disconnect().await;

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(mock.dial_count(), 1);
    assert_eq!(manager.state().await, ChannelState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn no_retries_with_auto_reconnect_disabled() {
    let mock = MockTransport::new();
    let manager = manager(
        &mock,
        ConnectionPolicy {
            auto_reconnect: false,
            ..policy(0)
        },
    );

    manager.connect().await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(mock.dial_count(), 1);
    assert_eq!(manager.state().await, ChannelState::Error);
}

#[tokio::test(start_paused = true)]
async fn attempt_counter_resets_once_a_connection_opens() {
    let mock = MockTransport::new();
    mock.refuse_next();
    let server_after_retry = mock.accept_next();
    let manager = manager(&mock, policy(5));

    manager.connect().await;
    settle().await;
    let stats = manager.stats().await;
    assert_eq!(stats.reconnect_attempts, 1);

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(manager.is_connected().await);
    let stats = manager.stats().await;
    assert_eq!(stats.reconnect_attempts, 0, "open resets the counter");

    drop(server_after_retry);
    manager.disconnect().await;
}

#[tokio::test(start_paused = true)]
async fn server_close_triggers_a_reconnect() {
    let mock = MockTransport::new();
    let server = mock.accept_next();
    let reconnected = mock.accept_next();
    let manager = manager(&mock, policy(0));

    manager.connect().await;
    settle().await;
    assert!(manager.is_connected().await);

    server.send_frame(Frame::Close(Some(CloseInfo {
        code: 1012,
        reason: "service restart".to_string(),
    })));
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(mock.dial_count(), 2);
    assert!(manager.is_connected().await);
    let stats = manager.stats().await;
    assert_eq!(stats.last_close.as_ref().map(|c| c.code), Some(1012));

    drop(reconnected);
    manager.disconnect().await;
}
