/// file: src/state.rs
/// description: per-channel lifecycle state and counters, separate from connection logic
use crate::transport::CloseInfo;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;

/// Lifecycle of one channel. Reconnect cycles move `Error`/`Disconnected`
/// back through `Connecting`; an explicit disconnect pins `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChannelState::Disconnected => "disconnected",
            ChannelState::Connecting => "connecting",
            ChannelState::Connected => "connected",
            ChannelState::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub struct ConnectionState {
    /// Fresh per connection cycle; correlates log lines across a session.
    pub connection_id: String,
    pub lifecycle: ChannelState,
    pub reconnect_attempts: u32,
    pub messages_received: u64,
    pub parse_failures: u64,
    pub last_message_time: Option<Instant>,
    pub last_close: Option<CloseInfo>,
    /// Present only while a session is live; dropped on teardown so a
    /// stale `send` cannot reach a dead socket.
    pub(crate) writer: Option<mpsc::UnboundedSender<String>>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            connection_id: uuid::Uuid::new_v4().to_string(),
            lifecycle: ChannelState::Disconnected,
            reconnect_attempts: 0,
            messages_received: 0,
            parse_failures: 0,
            last_message_time: None,
            last_close: None,
            writer: None,
        }
    }
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a dial attempt: new connection id, no live writer yet.
    pub(crate) fn begin_attempt(&mut self) {
        self.connection_id = uuid::Uuid::new_v4().to_string();
        self.lifecycle = ChannelState::Connecting;
        self.writer = None;
    }

    /// Socket opened: the attempt counter resets and sends become legal.
    pub(crate) fn mark_connected(&mut self, writer: mpsc::UnboundedSender<String>) {
        self.lifecycle = ChannelState::Connected;
        self.reconnect_attempts = 0;
        self.last_message_time = Some(Instant::now());
        self.writer = Some(writer);
    }

    pub(crate) fn mark_session_over(&mut self, lifecycle: ChannelState, close: Option<CloseInfo>) {
        self.lifecycle = lifecycle;
        self.writer = None;
        if close.is_some() {
            self.last_close = close;
        }
    }

    pub fn record_message(&mut self) {
        self.last_message_time = Some(Instant::now());
        self.messages_received += 1;
    }

    pub fn record_parse_failure(&mut self) {
        self.parse_failures += 1;
    }

    pub fn is_connected(&self) -> bool {
        self.lifecycle == ChannelState::Connected
    }
}

pub type SharedConnectionState = Arc<Mutex<ConnectionState>>;

/// Point-in-time copy of a channel's state, safe to hold across awaits.
#[derive(Debug, Clone)]
pub struct ChannelStats {
    pub connection_id: String,
    pub lifecycle: ChannelState,
    pub reconnect_attempts: u32,
    pub messages_received: u64,
    pub parse_failures: u64,
    pub last_close: Option<CloseInfo>,
}

impl From<&ConnectionState> for ChannelStats {
    fn from(state: &ConnectionState) -> Self {
        Self {
            connection_id: state.connection_id.clone(),
            lifecycle: state.lifecycle,
            reconnect_attempts: state.reconnect_attempts,
            messages_received: state.messages_received,
            parse_failures: state.parse_failures,
            last_close: state.last_close.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_resets_attempts_and_close_clears_writer() {
        let mut state = ConnectionState::new();
        state.reconnect_attempts = 4;
        state.begin_attempt();
        assert_eq!(state.lifecycle, ChannelState::Connecting);
        assert_eq!(state.reconnect_attempts, 4);

        let (tx, _rx) = mpsc::unbounded_channel();
        state.mark_connected(tx);
        assert!(state.is_connected());
        assert_eq!(state.reconnect_attempts, 0);
        assert!(state.writer.is_some());

        state.mark_session_over(
            ChannelState::Disconnected,
            Some(CloseInfo {
                code: 1000,
                reason: "bye".to_string(),
            }),
        );
        assert!(!state.is_connected());
        assert!(state.writer.is_none());
        assert_eq!(state.last_close.as_ref().map(|c| c.code), Some(1000));
    }
}
