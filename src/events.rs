//! Orchestration milestones surfaced to external observers.
//!
//! Dispatch is a plain fan-out: every registered sink sees every event in
//! emission order, and no decision depends on a sink.
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::key::KeyStatus;
use crate::session::SessionId;

/// Named notification emitted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmeEvent {
    /// A key system was accepted by the platform.
    KeySystemAccessComplete { key_system: String },
    /// A platform key session was created.
    KeySessionCreated { session: SessionId },
    /// A license exchange was attempted (success or failure).
    LicenseRequestAttempted { key_system: String },
    /// A key reported a new status.
    KeyStatusChange {
        key_id: Vec<u8>,
        status: KeyStatus,
        session: SessionId,
    },
}

impl EmeEvent {
    /// Event name as exposed to players.
    pub fn name(&self) -> &'static str {
        match self {
            EmeEvent::KeySystemAccessComplete { .. } => "keysystemaccesscomplete",
            EmeEvent::KeySessionCreated { .. } => "keysessioncreated",
            EmeEvent::LicenseRequestAttempted { .. } => "licenserequestattempted",
            EmeEvent::KeyStatusChange { .. } => "keystatuschange",
        }
    }
}

/// Receiver of orchestration events.
pub trait EventSink: Send + Sync {
    fn notify(&self, event: &EmeEvent);
}

impl EventSink for mpsc::UnboundedSender<EmeEvent> {
    fn notify(&self, event: &EmeEvent) {
        // A dropped receiver only means nobody is listening anymore.
        let _ = self.send(event.clone());
    }
}

/// Fan-out to all subscribed sinks.
#[derive(Clone, Default)]
pub struct EventDispatch {
    sinks: Arc<RwLock<Vec<Arc<dyn EventSink>>>>,
}

impl EventDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, sink: Arc<dyn EventSink>) {
        self.sinks.write().push(sink);
    }

    /// Subscribe a channel and return its receiving end.
    pub fn channel(&self) -> mpsc::UnboundedReceiver<EmeEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribe(Arc::new(tx));
        rx
    }

    pub fn emit(&self, event: EmeEvent) {
        trace!("event {}", event.name());
        let sinks = self.sinks.read().clone();
        for sink in sinks.iter() {
            sink.notify(&event);
        }
    }
}

impl std::fmt::Debug for EventDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatch")
            .field("sinks", &self.sinks.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::{EmeEvent, EventDispatch, EventSink};

    struct Counter(AtomicUsize);

    impl EventSink for Counter {
        fn notify(&self, _event: &EmeEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn every_sink_sees_every_event() {
        let dispatch = EventDispatch::new();
        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        dispatch.subscribe(counter.clone());
        let mut rx = dispatch.channel();

        dispatch.emit(EmeEvent::LicenseRequestAttempted {
            key_system: "com.widevine.alpha".to_string(),
        });
        dispatch.emit(EmeEvent::KeySystemAccessComplete {
            key_system: "com.widevine.alpha".to_string(),
        });

        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
        assert_eq!(
            rx.try_recv().expect("first event").name(),
            "licenserequestattempted"
        );
        assert_eq!(
            rx.try_recv().expect("second event").name(),
            "keysystemaccesscomplete"
        );
    }

    #[test]
    fn dropped_channel_is_ignored() {
        let dispatch = EventDispatch::new();
        drop(dispatch.channel());
        dispatch.emit(EmeEvent::LicenseRequestAttempted {
            key_system: "k".to_string(),
        });
    }
}
