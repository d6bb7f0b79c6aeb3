use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "coachiq-ws",
    about = "terminal monitor for coachiq rv-c telemetry over websocket",
    version
)]
pub struct Args {
    /// Backend base URL (ws:// or wss://)
    #[arg(short, long, default_value = "ws://localhost:8000")]
    pub url: String,

    /// Do not open the entity-update channel
    #[arg(long)]
    pub no_entities: bool,

    /// Do not open the CAN sniffer channel
    #[arg(long)]
    pub no_can: bool,

    /// Do not open the system-status channel
    #[arg(long)]
    pub no_status: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,

    /// Enable metrics server
    #[arg(long)]
    pub metrics: bool,

    /// Metrics server port
    #[arg(long, default_value = "9090")]
    pub metrics_port: u16,

    /// Connection timeout in milliseconds
    #[arg(long, default_value = "10000")]
    pub connection_timeout: u64,

    /// Reconnection delay in milliseconds (constant, no backoff)
    #[arg(long, default_value = "3000")]
    pub reconnect_delay: u64,

    /// Maximum number of reconnection attempts (0 for unlimited)
    #[arg(long, default_value = "0")]
    pub max_reconnects: u32,

    /// Disable automatic reconnection entirely
    #[arg(long)]
    pub no_reconnect: bool,

    /// Heartbeat interval in milliseconds (0 disables heartbeats)
    #[arg(long, default_value = "30000")]
    pub heartbeat_interval: u64,

    /// Health report interval in seconds
    #[arg(long, default_value = "30")]
    pub health_check_interval: u64,

    /// Enable detailed frame logging with raw payloads
    #[arg(long)]
    pub verbose_frames: bool,

    /// Output format: table, csv, json, minimal
    #[arg(long, default_value = "table")]
    pub format: String,

    /// Disable colored output (useful for piping to files)
    #[arg(long)]
    pub no_color: bool,

    /// Enable CSV export to stderr (for easy redirection)
    #[arg(long)]
    pub csv_export: bool,

    /// Quiet mode - minimal output for TUI integration
    #[arg(long)]
    pub quiet: bool,

    /// Maximum number of updates to display (0 for unlimited)
    #[arg(long, default_value = "0")]
    pub max_events: u64,
}
