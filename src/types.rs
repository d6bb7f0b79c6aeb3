/// file: src/types.rs
/// description: type definitions and data structures for CoachIQ WebSocket push messages
use crate::error::CoachIqError;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One inbound frame, routed by the `type` discriminator.
///
/// The backend adds message kinds over time; anything this build does not
/// recognize lands in `Unknown` with the raw payload preserved so the
/// generic handler still sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    EntityUpdate(EntityUpdate),
    CanMessage(CanFrame),
    SystemStatus(SystemStatus),
    Unknown {
        kind: String,
        payload: serde_json::Value,
    },
}

impl InboundMessage {
    /// Parse a text frame. The frame must be a JSON object with a string
    /// `type` field; known kinds carry their payload under `data`.
    pub fn parse(text: &str) -> Result<Self, CoachIqError> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let kind = value
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                CoachIqError::InvalidMessage("missing 'type' discriminator".to_string())
            })?
            .to_string();

        let data = value.get("data").cloned().unwrap_or(serde_json::Value::Null);

        match kind.as_str() {
            "entity_update" => Ok(InboundMessage::EntityUpdate(serde_json::from_value(data)?)),
            "can_message" => Ok(InboundMessage::CanMessage(serde_json::from_value(data)?)),
            "system_status" => Ok(InboundMessage::SystemStatus(serde_json::from_value(data)?)),
            _ => Ok(InboundMessage::Unknown {
                kind,
                payload: value,
            }),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            InboundMessage::EntityUpdate(_) => "entity_update",
            InboundMessage::CanMessage(_) => "can_message",
            InboundMessage::SystemStatus(_) => "system_status",
            InboundMessage::Unknown { kind, .. } => kind,
        }
    }
}

/// State change for one monitored RV-C entity (light, tank, thermostat, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityUpdate {
    pub entity_id: String,
    pub device_type: String,
    pub friendly_name: Option<String>,
    pub suggested_area: Option<String>,
    pub state: String,
    /// Decoded signal values keyed by RV-C signal name.
    #[serde(default)]
    pub raw: HashMap<String, serde_json::Value>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// One sniffed CAN frame from the coach bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanFrame {
    pub arbitration_id: u32,
    /// RV-C Data Group Number as uppercase hex, when decoded.
    pub dgn: Option<String>,
    pub source_address: Option<u8>,
    /// Payload bytes as a hex string.
    pub data: String,
    pub interface: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Backend health snapshot pushed on the system-status channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub status: String,
    pub version: Option<String>,
    pub uptime_seconds: u64,
    pub entity_count: u32,
    #[serde(default)]
    pub interfaces: Vec<CanInterfaceStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanInterfaceStats {
    pub name: String,
    pub rx_frames: u64,
    pub tx_frames: u64,
    pub bus_state: String,
}

/// Outbound heartbeat. There is no pong contract; the transport's own
/// close/error signaling is the only liveness indicator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heartbeat {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: i64,
}

impl Heartbeat {
    pub fn now() -> Self {
        Self {
            kind: "ping".to_string(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

impl EntityUpdate {
    /// Get timestamp as UTC DateTime
    pub fn datetime_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_else(Utc::now)
    }

    /// Get timestamp as Local DateTime
    pub fn datetime_local(&self) -> DateTime<Local> {
        self.datetime_utc().with_timezone(&Local)
    }

    /// Check whether the entity reports an active/on state
    pub fn is_on(&self) -> bool {
        matches!(
            self.state.to_ascii_lowercase().as_str(),
            "on" | "open" | "active" | "true"
        )
    }

    /// Display name, falling back to the entity id
    pub fn display_name(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(&self.entity_id)
    }
}

impl CanFrame {
    /// Get timestamp as UTC DateTime
    pub fn datetime_utc(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_else(Utc::now)
    }

    /// Get timestamp as Local DateTime
    pub fn datetime_local(&self) -> DateTime<Local> {
        self.datetime_utc().with_timezone(&Local)
    }

    /// Decode the hex payload into raw bytes
    pub fn data_bytes(&self) -> Result<Vec<u8>, CoachIqError> {
        hex::decode(&self.data)
            .map_err(|e| CoachIqError::InvalidMessage(format!("bad CAN payload hex: {e}")))
    }

    /// Priority bits from the 29-bit arbitration id
    pub fn priority(&self) -> u8 {
        ((self.arbitration_id >> 26) & 0x07) as u8
    }
}

impl SystemStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") || self.status.eq_ignore_ascii_case("ok")
    }

    pub fn total_rx_frames(&self) -> u64 {
        self.interfaces.iter().map(|i| i.rx_frames).sum()
    }

    pub fn total_tx_frames(&self) -> u64 {
        self.interfaces.iter().map(|i| i.tx_frames).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entity_update() {
        let text = r#"{
            "type": "entity_update",
            "data": {
                "entity_id": "light.bedroom_ceiling",
                "device_type": "light",
                "friendly_name": "Bedroom Ceiling",
                "suggested_area": "bedroom",
                "state": "on",
                "raw": {"operating_status": 200},
                "timestamp": 1718900000123
            }
        }"#;

        let msg = InboundMessage::parse(text).unwrap();
        match msg {
            InboundMessage::EntityUpdate(update) => {
                assert_eq!(update.entity_id, "light.bedroom_ceiling");
                assert!(update.is_on());
                assert_eq!(update.display_name(), "Bedroom Ceiling");
            }
            other => panic!("expected entity update, got {other:?}"),
        }
    }

    #[test]
    fn parses_can_message() {
        let text = r#"{
            "type": "can_message",
            "data": {
                "arbitration_id": 419360256,
                "dgn": "1FEDA",
                "source_address": 68,
                "data": "01c8ffff00000000",
                "interface": "can0",
                "timestamp": 1718900000123
            }
        }"#;

        let msg = InboundMessage::parse(text).unwrap();
        match msg {
            InboundMessage::CanMessage(frame) => {
                assert_eq!(frame.interface, "can0");
                assert_eq!(frame.data_bytes().unwrap()[1], 0xc8);
            }
            other => panic!("expected can message, got {other:?}"),
        }
    }

    #[test]
    fn parses_system_status() {
        let text = r#"{
            "type": "system_status",
            "data": {
                "status": "healthy",
                "version": "0.9.2",
                "uptime_seconds": 4200,
                "entity_count": 37,
                "interfaces": [
                    {"name": "can0", "rx_frames": 120000, "tx_frames": 350, "bus_state": "active"}
                ]
            }
        }"#;

        let msg = InboundMessage::parse(text).unwrap();
        match msg {
            InboundMessage::SystemStatus(status) => {
                assert!(status.is_healthy());
                assert_eq!(status.total_rx_frames(), 120_000);
            }
            other => panic!("expected system status, got {other:?}"),
        }
    }

    #[test]
    fn unknown_discriminator_is_preserved() {
        let msg = InboundMessage::parse(r#"{"type": "firmware_update", "data": {"pct": 40}}"#)
            .unwrap();
        match msg {
            InboundMessage::Unknown { kind, payload } => {
                assert_eq!(kind, "firmware_update");
                assert_eq!(payload["data"]["pct"], 40);
            }
            other => panic!("expected unknown, got {other:?}"),
        }
    }

    #[test]
    fn missing_discriminator_is_an_error() {
        assert!(InboundMessage::parse(r#"{"data": {}}"#).is_err());
        assert!(InboundMessage::parse("not json at all").is_err());
    }

    #[test]
    fn heartbeat_is_ping_shaped() {
        let text = serde_json::to_string(&Heartbeat::now()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "ping");
        assert!(value["timestamp"].is_i64());
    }
}
