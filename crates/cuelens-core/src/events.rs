//! Overlay Events
//!
//! Events a headless host receives from the overlay, and the sinks that
//! carry them out of the engine.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use cuelens_lib::core::lookup::{LookupRequest, LookupResponse};
use cuelens_lib::OverlayFrame;

/// Events emitted while driving a session
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OverlayEvent {
    /// A cue list was installed
    CuesLoaded { count: usize },
    /// Render snapshot after a step
    Frame { step: usize, frame: OverlayFrame },
    /// A lookup was handed to the dictionary provider
    LookupIssued { request: LookupRequest },
    /// The provider answered; `shown` is false for stale responses
    LookupResolved {
        response: LookupResponse,
        shown: bool,
    },
}

impl OverlayEvent {
    /// Serializes the event as a single JSON line
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Receives overlay events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: OverlayEvent);
}

/// Discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: OverlayEvent) {}
}

/// Forwards events into an unbounded channel
#[derive(Clone, Debug)]
pub struct ChannelSink {
    event_tx: mpsc::UnboundedSender<OverlayEvent>,
}

impl ChannelSink {
    /// Creates a sink and the receiver that drains it
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OverlayEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        (Self { event_tx }, event_rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: OverlayEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("Overlay event receiver dropped");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.emit(OverlayEvent::CuesLoaded { count: 2 });
        sink.emit(OverlayEvent::CuesLoaded { count: 3 });

        assert_eq!(rx.try_recv().ok(), Some(OverlayEvent::CuesLoaded { count: 2 }));
        assert_eq!(rx.try_recv().ok(), Some(OverlayEvent::CuesLoaded { count: 3 }));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);
        sink.emit(OverlayEvent::CuesLoaded { count: 1 });
    }

    #[test]
    fn test_event_json_tag() {
        let line = OverlayEvent::CuesLoaded { count: 4 }.to_json_line().unwrap();
        assert_eq!(line, r#"{"event":"cuesLoaded","count":4}"#);
    }
}
