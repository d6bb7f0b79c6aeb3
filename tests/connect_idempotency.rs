use std::time::Duration;

use coachiq_ws::config::ConnectionPolicy;
use coachiq_ws::connection::ConnectionManager;
use coachiq_ws::state::ChannelState;
use coachiq_ws::testing::MockTransport;
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

#[tokio::test(start_paused = true)]
async fn connect_while_connected_is_a_noop() {
    let mock = MockTransport::new();
    let _server = mock.accept_next();
    let manager = manager(&mock);

    manager.connect().await;
    settle().await;
    assert_eq!(manager.state().await, ChannelState::Connected);
    assert_eq!(mock.dial_count(), 1);

    manager.connect().await;
    settle().await;
    assert_eq!(mock.dial_count(), 1, "second connect must not dial again");
    assert_eq!(manager.state().await, ChannelState::Connected);
}

#[tokio::test(start_paused = true)]
async fn connect_while_connecting_is_a_noop() {
    let mock = MockTransport::new();
    mock.hang_next();
    let manager = manager(&mock);

    manager.connect().await;
    settle().await;
    assert_eq!(manager.state().await, ChannelState::Connecting);

    manager.connect().await;
    manager.connect().await;
    settle().await;
    assert_eq!(mock.dial_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn connect_after_disconnect_opens_a_fresh_socket() {
    let mock = MockTransport::new();
    let _server = mock.accept_next();
    let manager = manager(&mock);

    manager.connect().await;
    settle().await;
    assert!(manager.is_connected().await);

    manager.disconnect().await;
    assert_eq!(manager.state().await, ChannelState::Disconnected);

    let _server2 = mock.accept_next();
    manager.connect().await;
    settle().await;
    assert!(manager.is_connected().await);
    assert_eq!(mock.dial_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn disconnect_is_idempotent() {
    let mock = MockTransport::new();
    let _server = mock.accept_next();
    let manager = manager(&mock);

    manager.connect().await;
    settle().await;

    manager.disconnect().await;
    manager.disconnect().await;
    manager.disconnect().await;
    assert_eq!(manager.state().await, ChannelState::Disconnected);
    assert_eq!(mock.dial_count(), 1);
}
