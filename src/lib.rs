#![doc = include_str!("../docs/rustdoc.md")]

/// Composition of the standard backend channels.
pub mod channels;
/// Command-line argument definitions.
pub mod cli;
/// Runtime configuration model and connection policy.
pub mod config;
/// WebSocket connection manager: lifecycle, reconnect, dispatch.
pub mod connection;
/// Error types used across the crate.
pub mod error;
/// Event bus messages between channels and the UI.
pub mod events;
/// Terminal output formatters.
pub mod formatter;
/// Handler registration and message dispatch.
pub mod handlers;
/// Metrics and health report structures.
pub mod monitoring;
/// Per-channel lifecycle state and counters.
pub mod state;
/// Scriptable in-memory transport for tests.
pub mod testing;
/// Tracing/logging initialization.
pub mod tracing_setup;
/// Transport abstraction and the tokio-tungstenite implementation.
pub mod transport;
/// CoachIQ wire message data models.
pub mod types;
/// UI controller and presentation loop.
pub mod ui;

/// Primary crate error type.
pub use error::CoachIqError;
