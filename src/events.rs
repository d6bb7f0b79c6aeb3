/// file: src/events.rs
/// description: Event bus to decouple channel callbacks from UI presentation
use crate::transport::CloseInfo;
use crate::types::{CanFrame, EntityUpdate, SystemStatus};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum MonitorEvent {
    Starting,
    ChannelConnecting { channel: String, url: String },
    ChannelConnected { channel: String },
    ChannelClosed { channel: String, close: Option<CloseInfo> },
    ChannelError { channel: String, error: String },
    EntityUpdated(EntityUpdate),
    CanFrameSeen(CanFrame),
    StatusReport(SystemStatus),
    UnknownMessage { channel: String, kind: String },
    Stopping,
}

// Bounded channel so a runaway CAN sniffer burst cannot grow memory
// without limit. A loaded coach bus peaks around 2,500 frames/sec, so
// this gives the UI a few seconds of slack before frames are shed.
const EVENT_CHANNEL_CAPACITY: usize = 10_000;

pub type EventSender = mpsc::Sender<MonitorEvent>;
pub type EventReceiver = mpsc::Receiver<MonitorEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}
