use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoachIqError {
    #[error("WebSocket connection error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Connection timeout")]
    Timeout,

    #[error("channel '{channel}' is not connected")]
    NotConnected { channel: String },

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    #[error("Maximum reconnection attempts exceeded")]
    MaxReconnectsExceeded,

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Metrics server error: {0}")]
    MetricsError(String),
}
