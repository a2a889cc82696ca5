//! Error type used by the dispatcher, its registries and event codecs.
//!
//! Every condition in [`DispatchError`] is returned to the immediate caller.
//! None of them is fatal to the dispatcher: a duplicate registration or an
//! unknown listener leaves state untouched, and the caller decides whether
//! the attempt was a bug.
//!
//! A budget-limited drain is **not** an error; it is reported through
//! [`Drain::Partial`](crate::Drain::Partial).

use thiserror::Error;

use crate::events::EventType;

/// # Errors produced by dispatcher operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// An equal listener handle is already registered for this event type.
    #[error("listener {listener} is already registered for event type {event_type}")]
    DuplicateRegistration {
        /// Event type the registration targeted.
        event_type: EventType,
        /// Name of the rejected listener.
        listener: &'static str,
    },

    /// No equal listener handle is registered for this event type.
    #[error("listener {listener} is not registered for event type {event_type}")]
    ListenerNotFound {
        /// Event type the removal targeted.
        event_type: EventType,
        /// Name of the listener that was not found.
        listener: &'static str,
    },

    /// Nobody is listening for this event type; the event was not queued.
    ///
    /// Informational: see [`DispatchError::is_informational`].
    #[error("no listeners for {event} ({event_type}); event not queued")]
    NoListenersForType {
        /// Event type nobody listens to.
        event_type: EventType,
        /// Name of the dropped event.
        event: &'static str,
    },

    /// The event carries a reserved type id or no name.
    #[error("invalid event {event:?}: {reason}")]
    InvalidEvent {
        /// Name reported by the event (may be empty).
        event: &'static str,
        /// What made it invalid.
        reason: &'static str,
    },

    /// Another live dispatcher already holds the global designation.
    #[error("a global dispatcher is already designated: {current}")]
    GlobalAlreadySet {
        /// Name of the dispatcher currently designated.
        current: String,
    },

    /// `update` was called from inside a listener it was delivering to.
    #[error("update called while the dispatcher is already draining")]
    ReentrantUpdate,

    /// An event could not be serialized or deserialized.
    #[error("codec failure for {event}: {reason}")]
    Codec {
        /// Name of the event.
        event: &'static str,
        /// Underlying reason.
        reason: String,
    },
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use framevisor::{DispatchError, EventType};
    ///
    /// let err = DispatchError::NoListenersForType {
    ///     event_type: EventType::from_name("mouse_position"),
    ///     event: "MousePosition",
    /// };
    /// assert_eq!(err.as_label(), "no_listeners_for_type");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::DuplicateRegistration { .. } => "duplicate_registration",
            DispatchError::ListenerNotFound { .. } => "listener_not_found",
            DispatchError::NoListenersForType { .. } => "no_listeners_for_type",
            DispatchError::InvalidEvent { .. } => "invalid_event",
            DispatchError::GlobalAlreadySet { .. } => "global_already_set",
            DispatchError::ReentrantUpdate => "reentrant_update",
            DispatchError::Codec { .. } => "codec",
        }
    }

    /// `true` for outcomes that describe state rather than a misuse.
    ///
    /// Only [`DispatchError::NoListenersForType`] qualifies.
    pub fn is_informational(&self) -> bool {
        matches!(self, DispatchError::NoListenersForType { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let ty = EventType::from_name("ping");
        let cases = [
            (
                DispatchError::DuplicateRegistration { event_type: ty, listener: "l" },
                "duplicate_registration",
            ),
            (
                DispatchError::ListenerNotFound { event_type: ty, listener: "l" },
                "listener_not_found",
            ),
            (
                DispatchError::InvalidEvent { event: "", reason: "empty name" },
                "invalid_event",
            ),
            (
                DispatchError::GlobalAlreadySet { current: "main".into() },
                "global_already_set",
            ),
            (DispatchError::ReentrantUpdate, "reentrant_update"),
        ];
        for (err, label) in cases {
            assert_eq!(err.as_label(), label);
            assert!(!err.is_informational());
        }
    }

    #[test]
    fn no_listeners_is_informational() {
        let err = DispatchError::NoListenersForType {
            event_type: EventType::from_name("ping"),
            event: "Ping",
        };
        assert!(err.is_informational());
        assert!(err.to_string().contains("Ping"));
    }
}
