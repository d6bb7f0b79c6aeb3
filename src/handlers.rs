/// file: src/handlers.rs
/// description: callback registration and dispatch for parsed channel messages
use crate::error::CoachIqError;
use crate::transport::CloseInfo;
use crate::types::{CanFrame, EntityUpdate, InboundMessage, SystemStatus};
use std::sync::Arc;
use tracing::debug;

pub type MessageHandler = Arc<dyn Fn(&InboundMessage) + Send + Sync>;
pub type EntityUpdateHandler = Arc<dyn Fn(&EntityUpdate) + Send + Sync>;
pub type CanMessageHandler = Arc<dyn Fn(&CanFrame) + Send + Sync>;
pub type SystemStatusHandler = Arc<dyn Fn(&SystemStatus) + Send + Sync>;
pub type OpenHandler = Arc<dyn Fn() + Send + Sync>;
pub type CloseHandler = Arc<dyn Fn(Option<&CloseInfo>) + Send + Sync>;
pub type ErrorHandler = Arc<dyn Fn(&CoachIqError) + Send + Sync>;

/// The callbacks registered on one channel.
///
/// Every parsed frame goes to `on_message` first, then to the matching
/// type-specific handler. Callbacks run on the connection task and must
/// not block; hand heavy work off through a channel.
#[derive(Clone, Default)]
pub struct ChannelHandlers {
    pub on_message: Option<MessageHandler>,
    pub on_entity_update: Option<EntityUpdateHandler>,
    pub on_can_message: Option<CanMessageHandler>,
    pub on_system_status: Option<SystemStatusHandler>,
    pub on_open: Option<OpenHandler>,
    pub on_close: Option<CloseHandler>,
    pub on_error: Option<ErrorHandler>,
}

impl ChannelHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_message(mut self, f: impl Fn(&InboundMessage) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(f));
        self
    }

    pub fn on_entity_update(mut self, f: impl Fn(&EntityUpdate) + Send + Sync + 'static) -> Self {
        self.on_entity_update = Some(Arc::new(f));
        self
    }

    pub fn on_can_message(mut self, f: impl Fn(&CanFrame) + Send + Sync + 'static) -> Self {
        self.on_can_message = Some(Arc::new(f));
        self
    }

    pub fn on_system_status(mut self, f: impl Fn(&SystemStatus) + Send + Sync + 'static) -> Self {
        self.on_system_status = Some(Arc::new(f));
        self
    }

    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(f));
        self
    }

    pub fn on_close(mut self, f: impl Fn(Option<&CloseInfo>) + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&CoachIqError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Merge another set into this one. Only callbacks the other set
    /// provides are replaced; everything else keeps its current binding.
    pub fn merge(&mut self, other: ChannelHandlers) {
        if other.on_message.is_some() {
            self.on_message = other.on_message;
        }
        if other.on_entity_update.is_some() {
            self.on_entity_update = other.on_entity_update;
        }
        if other.on_can_message.is_some() {
            self.on_can_message = other.on_can_message;
        }
        if other.on_system_status.is_some() {
            self.on_system_status = other.on_system_status;
        }
        if other.on_open.is_some() {
            self.on_open = other.on_open;
        }
        if other.on_close.is_some() {
            self.on_close = other.on_close;
        }
        if other.on_error.is_some() {
            self.on_error = other.on_error;
        }
    }

    /// Deliver one parsed message: generic handler first, then by kind.
    pub(crate) fn dispatch(&self, message: &InboundMessage) {
        if let Some(handler) = &self.on_message {
            handler(message);
        }

        match message {
            InboundMessage::EntityUpdate(update) => {
                if let Some(handler) = &self.on_entity_update {
                    handler(update);
                }
            }
            InboundMessage::CanMessage(frame) => {
                if let Some(handler) = &self.on_can_message {
                    handler(frame);
                }
            }
            InboundMessage::SystemStatus(status) => {
                if let Some(handler) = &self.on_system_status {
                    handler(status);
                }
            }
            InboundMessage::Unknown { kind, .. } => {
                debug!(kind = %kind, "no handler for message kind");
            }
        }
    }
}

impl std::fmt::Debug for ChannelHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelHandlers")
            .field("on_message", &self.on_message.is_some())
            .field("on_entity_update", &self.on_entity_update.is_some())
            .field("on_can_message", &self.on_can_message.is_some())
            .field("on_system_status", &self.on_system_status.is_some())
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn entity_update() -> InboundMessage {
        InboundMessage::EntityUpdate(EntityUpdate {
            entity_id: "light.galley".to_string(),
            device_type: "light".to_string(),
            friendly_name: None,
            suggested_area: None,
            state: "on".to_string(),
            raw: Default::default(),
            timestamp: 0,
        })
    }

    #[test]
    fn generic_handler_runs_before_type_specific() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let handlers = ChannelHandlers::new()
            .on_message({
                let order = order.clone();
                move |_| order.lock().unwrap().push("message")
            })
            .on_entity_update({
                let order = order.clone();
                move |_| order.lock().unwrap().push("entity")
            });

        handlers.dispatch(&entity_update());
        assert_eq!(*order.lock().unwrap(), vec!["message", "entity"]);
    }

    #[test]
    fn unknown_kind_reaches_only_generic_handler() {
        let order = Arc::new(Mutex::new(Vec::new()));

        let handlers = ChannelHandlers::new()
            .on_message({
                let order = order.clone();
                move |_| order.lock().unwrap().push("message")
            })
            .on_entity_update({
                let order = order.clone();
                move |_| order.lock().unwrap().push("entity")
            });

        handlers.dispatch(&InboundMessage::Unknown {
            kind: "mystery".to_string(),
            payload: serde_json::Value::Null,
        });
        assert_eq!(*order.lock().unwrap(), vec!["message"]);
    }

    #[test]
    fn merge_keeps_unspecified_callbacks() {
        let hits = Arc::new(Mutex::new(Vec::new()));

        let mut handlers = ChannelHandlers::new()
            .on_message({
                let hits = hits.clone();
                move |_| hits.lock().unwrap().push("original_message")
            })
            .on_entity_update({
                let hits = hits.clone();
                move |_| hits.lock().unwrap().push("original_entity")
            });

        handlers.merge(ChannelHandlers::new().on_entity_update({
            let hits = hits.clone();
            move |_| hits.lock().unwrap().push("replacement_entity")
        }));

        handlers.dispatch(&entity_update());
        assert_eq!(
            *hits.lock().unwrap(),
            vec!["original_message", "replacement_entity"]
        );
    }
}
