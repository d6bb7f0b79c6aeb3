// file: src/connection.rs
// description: WebSocket connection manager: lifecycle, reconnect policy, and message fan-out

use crate::{
    config::ConnectionPolicy,
    error::CoachIqError,
    handlers::ChannelHandlers,
    monitoring,
    state::{ChannelState, ChannelStats, ConnectionState, SharedConnectionState},
    transport::{CloseInfo, Frame, TungsteniteTransport, WsTransport},
    types::{Heartbeat, InboundMessage},
};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use url::Url;

/// Owns one named WebSocket channel: the live socket, every timer that can
/// touch it, and the reconnect counter. Consumers read derived state and
/// register handlers; they never see the socket itself.
///
/// All timers live inside the single connection task, so tearing the task
/// down is what guarantees no stale timer can fire against a dead socket.
pub struct ConnectionManager<T: WsTransport = TungsteniteTransport> {
    core: Arc<ManagerCore<T>>,
    task: Mutex<Option<JoinHandle<()>>>,
    shutdown: Mutex<watch::Sender<bool>>,
}

struct ManagerCore<T: WsTransport> {
    name: String,
    url: Url,
    policy: ConnectionPolicy,
    transport: T,
    state: SharedConnectionState,
    handlers: RwLock<ChannelHandlers>,
}

/// How a connected session ended, for reconnect-policy purposes.
enum SessionEnd {
    /// Peer closed (clean or not) or the stream ran dry.
    Closed(Option<CloseInfo>),
    /// The transport failed mid-session.
    Failed(CoachIqError),
    /// Explicit `disconnect()`.
    Shutdown,
}

impl ConnectionManager<TungsteniteTransport> {
    pub fn new(name: impl Into<String>, url: Url, policy: ConnectionPolicy) -> Self {
        Self::with_transport(name, url, policy, TungsteniteTransport)
    }
}

impl<T: WsTransport> ConnectionManager<T> {
    pub fn with_transport(
        name: impl Into<String>,
        url: Url,
        policy: ConnectionPolicy,
        transport: T,
    ) -> Self {
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            core: Arc::new(ManagerCore {
                name: name.into(),
                url,
                policy,
                transport,
                state: Arc::new(Mutex::new(ConnectionState::new())),
                handlers: RwLock::new(ChannelHandlers::default()),
            }),
            task: Mutex::new(None),
            shutdown: Mutex::new(shutdown_tx),
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn url(&self) -> &Url {
        &self.core.url
    }

    /// Open the channel. A no-op while already connecting or connected;
    /// otherwise any stale task is torn down before the new dial starts.
    /// Returns immediately; outcomes arrive through the handler set.
    pub async fn connect(&self) {
        {
            let state = self.core.state.lock().await;
            if matches!(
                state.lifecycle,
                ChannelState::Connecting | ChannelState::Connected
            ) {
                debug!(channel = %self.core.name, "connect ignored, already {}", state.lifecycle);
                return;
            }
        }

        if let Some(stale) = self.task.lock().await.take() {
            stale.abort();
            let _ = stale.await;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        *self.shutdown.lock().await = shutdown_tx;

        // Mark connecting before the task spawns so a racing connect()
        // observes the transition.
        self.core.state.lock().await.begin_attempt();

        let core = self.core.clone();
        let handle = tokio::spawn(run_loop(core, shutdown_rx));
        *self.task.lock().await = Some(handle);
    }

    /// Close the channel and disable reconnection. Safe to call repeatedly;
    /// returns once the connection task (and every timer it owns) is gone.
    pub async fn disconnect(&self) {
        let _ = self.shutdown.lock().await.send(true);

        let task = self.task.lock().await.take();
        if let Some(task) = task {
            let _ = task.await;
        }

        let mut state = self.core.state.lock().await;
        state.mark_session_over(ChannelState::Disconnected, None);
    }

    /// Serialize `message` to a JSON text frame and hand it to the socket.
    /// Fire-and-forget: an `Ok` means the frame was queued on a live
    /// session, not that the backend received it.
    pub async fn send<M: Serialize + ?Sized>(&self, message: &M) -> Result<(), CoachIqError> {
        let text = serde_json::to_string(message)?;
        let state = self.core.state.lock().await;
        match (&state.writer, state.lifecycle) {
            (Some(writer), ChannelState::Connected) => {
                writer.send(text).map_err(|_| CoachIqError::NotConnected {
                    channel: self.core.name.clone(),
                })
            }
            _ => Err(CoachIqError::NotConnected {
                channel: self.core.name.clone(),
            }),
        }
    }

    /// Merge new callbacks into the registered set; callbacks the new set
    /// leaves out keep their current binding.
    pub async fn update_handlers(&self, handlers: ChannelHandlers) {
        self.core.handlers.write().await.merge(handlers);
    }

    pub async fn state(&self) -> ChannelState {
        self.core.state.lock().await.lifecycle
    }

    pub async fn is_connected(&self) -> bool {
        self.core.state.lock().await.is_connected()
    }

    pub async fn stats(&self) -> ChannelStats {
        ChannelStats::from(&*self.core.state.lock().await)
    }

    /// Shared state handle for long-lived observers (health logging).
    pub fn state_handle(&self) -> SharedConnectionState {
        self.core.state.clone()
    }
}

async fn run_loop<T: WsTransport>(core: Arc<ManagerCore<T>>, mut shutdown: watch::Receiver<bool>) {
    loop {
        {
            let mut state = core.state.lock().await;
            state.begin_attempt();
        }
        info!(channel = %core.name, url = %core.url, "connecting");

        let dial = core.transport.connect(&core.url);
        let outcome = tokio::select! {
            _ = shutdown.changed() => {
                core.state.lock().await.mark_session_over(ChannelState::Disconnected, None);
                return;
            }
            outcome = timeout(core.policy.connection_timeout, dial) => outcome,
        };

        match outcome {
            Err(_elapsed) => {
                warn!(
                    channel = %core.name,
                    timeout_ms = core.policy.connection_timeout.as_millis() as u64,
                    "connection attempt timed out"
                );
                fail_attempt(&core, CoachIqError::Timeout).await;
            }
            Ok(Err(e)) => {
                warn!(channel = %core.name, error = %e, "connection attempt failed");
                fail_attempt(&core, e).await;
            }
            Ok(Ok((mut writer, mut reader))) => {
                let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
                {
                    let mut state = core.state.lock().await;
                    state.mark_connected(outbound_tx);
                    info!(
                        channel = %core.name,
                        connection_id = %state.connection_id,
                        "connected"
                    );
                }
                monitoring::CONNECTED_GAUGE.increment(1.0);
                fire_open(&core).await;

                let end = drive_session(
                    &core,
                    &mut writer,
                    &mut reader,
                    &mut outbound_rx,
                    &mut shutdown,
                )
                .await;

                monitoring::CONNECTED_GAUGE.decrement(1.0);
                match end {
                    SessionEnd::Shutdown => {
                        core.state
                            .lock()
                            .await
                            .mark_session_over(ChannelState::Disconnected, None);
                        return;
                    }
                    SessionEnd::Closed(close) => {
                        info!(
                            channel = %core.name,
                            code = close.as_ref().map(|c| c.code),
                            "connection closed"
                        );
                        core.state
                            .lock()
                            .await
                            .mark_session_over(ChannelState::Disconnected, close.clone());
                        fire_close(&core, close.as_ref()).await;
                    }
                    SessionEnd::Failed(e) => {
                        warn!(channel = %core.name, error = %e, "connection lost");
                        core.state
                            .lock()
                            .await
                            .mark_session_over(ChannelState::Error, None);
                        fire_error(&core, &e).await;
                        // The close that follows a socket error drives the
                        // reconnect path below, never the error itself.
                        fire_close(&core, None).await;
                    }
                }
            }
        }

        if *shutdown.borrow() {
            core.state
                .lock()
                .await
                .mark_session_over(ChannelState::Disconnected, None);
            return;
        }
        if !core.policy.auto_reconnect {
            return;
        }

        let attempts = core.state.lock().await.reconnect_attempts;
        if core.policy.max_reconnect_attempts > 0 && attempts >= core.policy.max_reconnect_attempts
        {
            warn!(
                channel = %core.name,
                attempts,
                "maximum reconnection attempts reached"
            );
            core.state.lock().await.lifecycle = ChannelState::Error;
            return;
        }

        let attempt = {
            let mut state = core.state.lock().await;
            state.reconnect_attempts += 1;
            state.reconnect_attempts
        };
        monitoring::RECONNECT_COUNTER.increment(1);
        info!(
            channel = %core.name,
            attempt,
            delay_ms = core.policy.reconnect_delay.as_millis() as u64,
            "reconnecting"
        );

        tokio::select! {
            _ = shutdown.changed() => {
                core.state.lock().await.mark_session_over(ChannelState::Disconnected, None);
                return;
            }
            _ = sleep(core.policy.reconnect_delay) => {}
        }
    }
}

/// Pump one live session: inbound frames, queued sends, heartbeats, and
/// the shutdown signal. Dropping the writer/reader on return is what closes
/// the socket; the heartbeat timer dies with this stack frame.
async fn drive_session<T: WsTransport>(
    core: &Arc<ManagerCore<T>>,
    writer: &mut T::Writer,
    reader: &mut T::Reader,
    outbound_rx: &mut mpsc::UnboundedReceiver<String>,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let mut heartbeat = heartbeat_timer(core.policy.heartbeat_interval);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                return SessionEnd::Shutdown;
            }
            frame = reader.next() => match frame {
                None => return SessionEnd::Closed(None),
                Some(Err(e)) => return SessionEnd::Failed(e),
                Some(Ok(Frame::Close(info))) => return SessionEnd::Closed(info),
                Some(Ok(Frame::Text(text))) => handle_text(core, &text).await,
                Some(Ok(Frame::Binary(data))) => {
                    debug!(channel = %core.name, bytes = data.len(), "ignoring binary frame");
                }
                Some(Ok(Frame::Ping(_))) => {
                    // The transport layer answers protocol pings itself.
                    debug!(channel = %core.name, "ping received");
                }
                Some(Ok(Frame::Pong(_))) => {
                    debug!(channel = %core.name, "pong received");
                }
            },
            Some(text) = outbound_rx.recv() => {
                if let Err(e) = writer.send(Frame::Text(text)).await {
                    return SessionEnd::Failed(e);
                }
            }
            _ = tick(&mut heartbeat) => {
                let ping = match serde_json::to_string(&Heartbeat::now()) {
                    Ok(ping) => ping,
                    Err(e) => {
                        warn!(channel = %core.name, error = %e, "heartbeat serialization failed");
                        continue;
                    }
                };
                debug!(channel = %core.name, "sending heartbeat");
                if let Err(e) = writer.send(Frame::Text(ping)).await {
                    return SessionEnd::Failed(e);
                }
            }
        }
    }
}

/// First tick fires one full interval after connect, not immediately.
fn heartbeat_timer(interval: Duration) -> Option<tokio::time::Interval> {
    if interval.is_zero() {
        return None;
    }
    let mut timer = interval_at(Instant::now() + interval, interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(timer)
}

async fn tick(timer: &mut Option<tokio::time::Interval>) {
    match timer.as_mut() {
        Some(timer) => {
            timer.tick().await;
        }
        None => futures_util::future::pending().await,
    }
}

async fn handle_text<T: WsTransport>(core: &Arc<ManagerCore<T>>, text: &str) {
    match InboundMessage::parse(text) {
        Ok(message) => {
            {
                let mut state = core.state.lock().await;
                state.record_message();
            }
            monitoring::MESSAGES_RECEIVED_COUNTER.increment(1);
            if let InboundMessage::Unknown { kind, .. } = &message {
                debug!(channel = %core.name, kind = %kind, "unrecognized message kind");
            }
            let handlers = core.handlers.read().await.clone();
            handlers.dispatch(&message);
        }
        Err(e) => {
            {
                let mut state = core.state.lock().await;
                state.record_parse_failure();
            }
            monitoring::PARSE_FAILURE_COUNTER.increment(1);
            warn!(
                channel = %core.name,
                error = %e,
                "dropping malformed frame: {}",
                text.chars().take(100).collect::<String>()
            );
        }
    }
}

/// A failed dial surfaces as error-then-close, matching what a live socket
/// does when it dies: the close is what feeds the reconnect policy.
async fn fail_attempt<T: WsTransport>(core: &Arc<ManagerCore<T>>, error: CoachIqError) {
    core.state
        .lock()
        .await
        .mark_session_over(ChannelState::Error, None);
    fire_error(core, &error).await;
    fire_close(core, None).await;
}

async fn fire_open<T: WsTransport>(core: &Arc<ManagerCore<T>>) {
    let handler = core.handlers.read().await.on_open.clone();
    if let Some(handler) = handler {
        handler();
    }
}

async fn fire_close<T: WsTransport>(core: &Arc<ManagerCore<T>>, info: Option<&CloseInfo>) {
    let handler = core.handlers.read().await.on_close.clone();
    if let Some(handler) = handler {
        handler(info);
    }
}

async fn fire_error<T: WsTransport>(core: &Arc<ManagerCore<T>>, error: &CoachIqError) {
    let handler = core.handlers.read().await.on_error.clone();
    if let Some(handler) = handler {
        handler(error);
    }
}
