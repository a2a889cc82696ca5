//! # Scoped registration guards.
//!
//! A [`Subscription`] ties one registration to a value's lifetime: dropping
//! it removes the listener from the dispatcher it was registered with. A
//! context that stores its subscription next to its own state can never
//! outlive its unregistration.
//!
//! [`ThreadedSubscription`] is the same guard for the
//! [`ThreadSafeRegistry`]; unlike [`Subscription`] it is `Send`.
//!
//! ## Rules
//! - Dropping a guard after its owner is gone is a no-op.
//! - Dropping a guard whose listener was already removed by hand is a no-op.
//! - Guards created by `listen` also own the closure they registered.

use std::fmt;
use std::rc::{Rc, Weak as RcWeak};
use std::sync::{Arc, Weak};

use crate::core::Dispatcher;
use crate::events::EventType;
use crate::listeners::{Listener, ListenerHandle};
use crate::registry::ThreadSafeRegistry;

/// Registration on a [`Dispatcher`], removed on drop.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    handle: ListenerHandle,
    event_type: EventType,
    owner: RcWeak<Dispatcher>,
    _owned: Option<Arc<dyn Listener>>,
}

impl Subscription {
    pub(crate) fn new(
        handle: ListenerHandle,
        event_type: EventType,
        owner: &Rc<Dispatcher>,
        owned: Option<Arc<dyn Listener>>,
    ) -> Self {
        Self {
            handle,
            event_type,
            owner: Rc::downgrade(owner),
            _owned: owned,
        }
    }

    /// Handle this guard registered.
    pub fn handle(&self) -> &ListenerHandle {
        &self.handle
    }

    /// Event type this guard registered for.
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// `true` while the dispatcher is alive and still holds the registration.
    pub fn is_active(&self) -> bool {
        self.owner
            .upgrade()
            .is_some_and(|d| d.has_listener(&self.handle, self.event_type))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("handle", &self.handle)
            .field("event_type", &self.event_type)
            .field("owns_listener", &self._owned.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(dispatcher) = self.owner.upgrade() else {
            return;
        };
        if let Err(err) = dispatcher.remove_listener(&self.handle, self.event_type) {
            tracing::debug!(
                listener = self.handle.name(),
                event_type = %self.event_type,
                label = err.as_label(),
                "subscription already released"
            );
        }
    }
}

/// Registration on a [`ThreadSafeRegistry`], removed on drop.
#[must_use = "dropping a ThreadedSubscription unregisters its listener"]
pub struct ThreadedSubscription {
    handle: ListenerHandle,
    event_type: EventType,
    owner: Weak<ThreadSafeRegistry>,
    _owned: Option<Arc<dyn Listener>>,
}

impl ThreadedSubscription {
    pub(crate) fn new(
        handle: ListenerHandle,
        event_type: EventType,
        owner: &Arc<ThreadSafeRegistry>,
        owned: Option<Arc<dyn Listener>>,
    ) -> Self {
        Self {
            handle,
            event_type,
            owner: Arc::downgrade(owner),
            _owned: owned,
        }
    }

    pub fn handle(&self) -> &ListenerHandle {
        &self.handle
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// `true` while the registry is alive and still holds the registration.
    pub fn is_active(&self) -> bool {
        self.owner
            .upgrade()
            .is_some_and(|r| r.contains(&self.handle, self.event_type))
    }
}

impl fmt::Debug for ThreadedSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadedSubscription")
            .field("handle", &self.handle)
            .field("event_type", &self.event_type)
            .field("owns_listener", &self._owned.is_some())
            .finish()
    }
}

impl Drop for ThreadedSubscription {
    fn drop(&mut self) {
        let Some(registry) = self.owner.upgrade() else {
            return;
        };
        if let Err(err) = registry.remove(&self.handle, self.event_type) {
            tracing::debug!(
                listener = self.handle.name(),
                event_type = %self.event_type,
                label = err.as_label(),
                "threaded subscription already released"
            );
        }
    }
}
