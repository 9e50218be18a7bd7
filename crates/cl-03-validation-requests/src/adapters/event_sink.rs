//! Event sink adapters
//!
//! Implements the EventSink port for collecting the audit stream

use crate::events::ValidationEvent;
use crate::ports::EventSink;
use parking_lot::RwLock;
use uuid::Uuid;

/// In-memory event sink, also used as the node's audit log
pub struct InMemoryEventSink {
    events: RwLock<Vec<ValidationEvent>>,
}

impl InMemoryEventSink {
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
        }
    }

    pub fn get_events(&self) -> Vec<ValidationEvent> {
        self.events.read().clone()
    }

    pub fn events_for(&self, request_id: Uuid) -> Vec<ValidationEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.request_id() == request_id)
            .cloned()
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }
}

impl Default for InMemoryEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for InMemoryEventSink {
    fn publish(&self, event: ValidationEvent) {
        self.events.write().push(event);
    }
}

/// Sink that drops everything
#[derive(Default)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn publish(&self, _event: ValidationEvent) {}
}
