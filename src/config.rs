/// file: src/config.rs
/// description: Configuration management and CLI argument mapping for channel policies and endpoints
use crate::cli::Args;
use anyhow::Result;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoints: EndpointConfig,
    pub policy: ConnectionPolicy,
    pub metrics: MetricsConfig,
    pub health: HealthConfig,
    pub logging: LoggingConfig,
}

/// Backend WebSocket endpoints, one path per logical channel.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    pub base_url: Url,
    pub entities: bool,
    pub can_sniffer: bool,
    pub system_status: bool,
}

/// Per-channel lifecycle policy.
///
/// The reconnect delay is constant: retries run on a fixed cadence with
/// no backoff and no jitter.
#[derive(Debug, Clone)]
pub struct ConnectionPolicy {
    pub auto_reconnect: bool,
    pub reconnect_delay: Duration,
    /// 0 means unlimited.
    pub max_reconnect_attempts: u32,
    pub connection_timeout: Duration,
    /// Zero disables the heartbeat.
    pub heartbeat_interval: Duration,
}

impl Default for ConnectionPolicy {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            reconnect_delay: Duration::from_millis(3000),
            max_reconnect_attempts: 0,
            connection_timeout: Duration::from_millis(10_000),
            heartbeat_interval: Duration::from_millis(30_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct HealthConfig {
    pub check_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub verbose_frames: bool,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let base_url = Url::parse(&args.url)?;

        Ok(Config {
            endpoints: EndpointConfig {
                base_url,
                entities: !args.no_entities,
                can_sniffer: !args.no_can,
                system_status: !args.no_status,
            },
            policy: ConnectionPolicy {
                auto_reconnect: !args.no_reconnect,
                reconnect_delay: Duration::from_millis(args.reconnect_delay),
                max_reconnect_attempts: args.max_reconnects,
                connection_timeout: Duration::from_millis(args.connection_timeout),
                heartbeat_interval: Duration::from_millis(args.heartbeat_interval),
            },
            metrics: MetricsConfig {
                enabled: args.metrics,
                port: args.metrics_port,
            },
            health: HealthConfig {
                check_interval: Duration::from_secs(args.health_check_interval),
            },
            logging: LoggingConfig {
                verbose_frames: args.verbose_frames,
            },
        })
    }
}
