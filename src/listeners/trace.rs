//! # TraceListener: logs every event it receives
//!
//! A minimal listener that writes incoming events to `tracing` at `INFO`.
//! Register it next to real listeners to see what flows through a type; it
//! never marks events handled.
//!
//! ## Example output
//! ```text
//! INFO framevisor::listeners::trace: event received listener="mouse" event="MousePosition" event_type=0x... created_at=1.2s handled=false
//! ```

use crate::events::EventRef;
use crate::listeners::Listener;

/// Event tracing listener.
#[derive(Debug)]
pub struct TraceListener {
    label: &'static str,
}

impl TraceListener {
    /// Construct a new [`TraceListener`].
    #[must_use]
    pub fn new() -> Self {
        Self { label: "trace" }
    }

    /// Construct a listener whose log lines carry `label`.
    #[must_use]
    pub fn labeled(label: &'static str) -> Self {
        Self { label }
    }
}

impl Default for TraceListener {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for TraceListener {
    fn on_event(&self, e: &EventRef) {
        tracing::info!(
            listener = self.label,
            event = e.name(),
            event_type = %e.event_type(),
            created_at = ?e.created_at(),
            handled = e.is_handled(),
            "event received"
        );
    }

    fn name(&self) -> &'static str {
        "TraceListener"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Ping;

    #[test]
    fn leaves_events_unhandled() {
        let ev = Ping::new(3);
        TraceListener::labeled("test").on_event(&ev);
        assert!(!ev.is_handled());
        assert_eq!(TraceListener::new().name(), "TraceListener");
    }
}
