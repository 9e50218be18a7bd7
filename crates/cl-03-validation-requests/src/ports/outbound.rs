//! Driven ports (Outbound dependencies)

use crate::events::ValidationEvent;

/// Sink for the audit event stream.
///
/// Called after the request lock is released; implementations must not block.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: ValidationEvent);
}
