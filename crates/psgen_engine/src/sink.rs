use tokio::sync::mpsc::UnboundedSender;

use crate::EngineEvent;

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

/// Forwards events to the front-end's loop. Events sent after the receiver
/// is gone are dropped.
pub struct ChannelEventSink {
    tx: UnboundedSender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}
