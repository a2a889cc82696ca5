//! # Listener registry - event type → ordered listener handles.
//!
//! ## Rules
//! - Insertion order is delivery order.
//! - An equal handle is never stored twice for the same type
//!   (`DuplicateRegistration`); state is left unchanged on rejection.
//! - Removal takes out the first equal handle (`ListenerNotFound` if absent).
//! - Empty per-type lists are kept; [`ListenerRegistry::prune`] only drops
//!   handles whose listener is gone.
//!
//! ## Delivery
//! ```text
//! deliver(event, policy)
//!   └─► snapshot(event.event_type())   live listeners, registration order
//!         └─► for each listener:
//!               ├─ policy says stop?  → break
//!               └─ listener.on_event(&event)
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::HandledPolicy;
use crate::error::DispatchError;
use crate::events::{EventRef, EventType};
use crate::listeners::{Listener, ListenerHandle};

/// Single-owner map of event type → listener handles.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    listeners: HashMap<EventType, Vec<ListenerHandle>>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handle` for `event_type`, rejecting an equal handle.
    pub fn add(&mut self, handle: ListenerHandle, event_type: EventType) -> Result<(), DispatchError> {
        let list = self.listeners.entry(event_type).or_default();
        if list.iter().any(|h| *h == handle) {
            tracing::warn!(
                listener = handle.name(),
                %event_type,
                "attempted to double-register a listener"
            );
            return Err(DispatchError::DuplicateRegistration {
                event_type,
                listener: handle.name(),
            });
        }
        list.push(handle);
        Ok(())
    }

    /// Removes the first handle equal to `handle` for `event_type`.
    pub fn remove(&mut self, handle: &ListenerHandle, event_type: EventType) -> Result<(), DispatchError> {
        let removed = self.listeners.get_mut(&event_type).and_then(|list| {
            let i = list.iter().position(|h| h == handle)?;
            Some(list.remove(i))
        });
        match removed {
            Some(_) => Ok(()),
            None => Err(DispatchError::ListenerNotFound {
                event_type,
                listener: handle.name(),
            }),
        }
    }

    /// Whether an equal handle is registered for `event_type`.
    pub fn contains(&self, handle: &ListenerHandle, event_type: EventType) -> bool {
        self.listeners
            .get(&event_type)
            .is_some_and(|list| list.contains(handle))
    }

    /// Number of live listeners for `event_type`.
    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.listeners
            .get(&event_type)
            .map_or(0, |list| list.iter().filter(|h| h.is_alive()).count())
    }

    /// Whether at least one live listener is registered for `event_type`.
    pub fn has_listeners(&self, event_type: EventType) -> bool {
        self.listeners
            .get(&event_type)
            .is_some_and(|list| list.iter().any(ListenerHandle::is_alive))
    }

    /// Live listeners for `event_type`, in registration order.
    pub fn snapshot(&self, event_type: EventType) -> Vec<Arc<dyn Listener>> {
        self.listeners
            .get(&event_type)
            .map(|list| list.iter().filter_map(ListenerHandle::upgrade).collect())
            .unwrap_or_default()
    }

    /// Delivers `event` to the listeners of its type.
    ///
    /// Returns the number of listeners invoked.
    pub fn deliver(&self, event: &EventRef, policy: HandledPolicy) -> usize {
        deliver_to(&self.snapshot(event.event_type()), event, policy)
    }

    /// Drops handles whose listener is gone. Returns how many were dropped.
    pub fn prune(&mut self) -> usize {
        let mut pruned = 0;
        for list in self.listeners.values_mut() {
            let before = list.len();
            list.retain(ListenerHandle::is_alive);
            pruned += before - list.len();
        }
        pruned
    }

    /// Event types that have (or had) a registration.
    pub fn event_types(&self) -> impl Iterator<Item = EventType> + '_ {
        self.listeners.keys().copied()
    }
}

/// Invokes `listeners` in order under `policy`. Returns how many ran.
pub(crate) fn deliver_to(
    listeners: &[Arc<dyn Listener>],
    event: &EventRef,
    policy: HandledPolicy,
) -> usize {
    let mut invoked = 0;
    for listener in listeners {
        if policy.should_stop(event.as_ref()) {
            break;
        }
        tracing::trace!(listener = listener.name(), event = event.name(), "delivering");
        listener.on_event(event);
        invoked += 1;
    }
    invoked
}
