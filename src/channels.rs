/// file: src/channels.rs
/// description: explicit composition of the standard CoachIQ channels, one manager each
use crate::{
    config::Config,
    connection::ConnectionManager,
    transport::{TungsteniteTransport, WsTransport},
};
use anyhow::Result;

pub const ENTITIES_CHANNEL: &str = "entities";
pub const CAN_SNIFFER_CHANNEL: &str = "can-sniffer";
pub const SYSTEM_STATUS_CHANNEL: &str = "system-status";

const ENTITIES_PATH: &str = "/ws";
const CAN_SNIFFER_PATH: &str = "/ws/can-sniffer";
const SYSTEM_STATUS_PATH: &str = "/ws/status";

/// The backend channels a monitor session composes, each an independently
/// managed connection. Held and passed explicitly; there is no ambient
/// global socket anywhere in this crate.
pub struct ChannelSet<T: WsTransport = TungsteniteTransport> {
    pub entities: Option<ConnectionManager<T>>,
    pub can_sniffer: Option<ConnectionManager<T>>,
    pub system_status: Option<ConnectionManager<T>>,
}

impl ChannelSet<TungsteniteTransport> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let base = &config.endpoints.base_url;

        let build = |name: &str, path: &str| -> Result<ConnectionManager<TungsteniteTransport>> {
            let url = base.join(path)?;
            Ok(ConnectionManager::new(name, url, config.policy.clone()))
        };

        Ok(Self {
            entities: config
                .endpoints
                .entities
                .then(|| build(ENTITIES_CHANNEL, ENTITIES_PATH))
                .transpose()?,
            can_sniffer: config
                .endpoints
                .can_sniffer
                .then(|| build(CAN_SNIFFER_CHANNEL, CAN_SNIFFER_PATH))
                .transpose()?,
            system_status: config
                .endpoints
                .system_status
                .then(|| build(SYSTEM_STATUS_CHANNEL, SYSTEM_STATUS_PATH))
                .transpose()?,
        })
    }
}

impl<T: WsTransport> ChannelSet<T> {
    pub fn iter(&self) -> impl Iterator<Item = &ConnectionManager<T>> {
        self.entities
            .iter()
            .chain(self.can_sniffer.iter())
            .chain(self.system_status.iter())
    }

    pub async fn connect_all(&self) {
        for channel in self.iter() {
            channel.connect().await;
        }
    }

    pub async fn disconnect_all(&self) {
        for channel in self.iter() {
            channel.disconnect().await;
        }
    }
}
