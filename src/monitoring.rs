use crate::error::CoachIqError;
use crate::state::ChannelStats;
use anyhow::Result;
use metrics::{counter, gauge, Counter, Gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::{net::SocketAddr, sync::LazyLock};
use tracing::{error, info};

// Global metrics
pub static MESSAGES_RECEIVED_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("coachiq_ws_messages_received_total"));
pub static PARSE_FAILURE_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("coachiq_ws_parse_failures_total"));
pub static RECONNECT_COUNTER: LazyLock<Counter> =
    LazyLock::new(|| counter!("coachiq_ws_reconnects_total"));
pub static CONNECTED_GAUGE: LazyLock<Gauge> =
    LazyLock::new(|| gauge!("coachiq_ws_connected_channels"));

pub async fn setup_metrics(port: u16) -> Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    let builder = PrometheusBuilder::new()
        .with_http_listener(addr)
        .add_global_label("service", "coachiq-ws")
        .add_global_label("version", env!("CARGO_PKG_VERSION"));

    match builder.install() {
        Ok(_handle) => {
            info!(
                "Prometheus metrics server started on http://{}/metrics",
                addr
            );

            // Initialize metrics with default values
            MESSAGES_RECEIVED_COUNTER.absolute(0);
            PARSE_FAILURE_COUNTER.absolute(0);
            RECONNECT_COUNTER.absolute(0);
            CONNECTED_GAUGE.set(0.0);

            Ok(())
        }
        Err(e) => {
            error!("Failed to start metrics server: {}", e);
            Err(CoachIqError::MetricsError(e.to_string()).into())
        }
    }
}

/// Periodic per-channel health report, logged and exposable as JSON.
#[derive(Debug)]
pub struct HealthReport {
    pub channel: String,
    pub is_healthy: bool,
    pub messages_received: u64,
    pub parse_failures: u64,
    pub reconnect_attempts: u32,
}

impl HealthReport {
    pub fn from_stats(channel: &str, stats: &ChannelStats) -> Self {
        Self {
            channel: channel.to_string(),
            is_healthy: stats.lifecycle == crate::state::ChannelState::Connected,
            messages_received: stats.messages_received,
            parse_failures: stats.parse_failures,
            reconnect_attempts: stats.reconnect_attempts,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "channel": self.channel,
            "status": if self.is_healthy { "healthy" } else { "unhealthy" },
            "messages_received": self.messages_received,
            "parse_failures": self.parse_failures,
            "reconnect_attempts": self.reconnect_attempts,
            "timestamp": chrono::Utc::now()
        })
    }
}
