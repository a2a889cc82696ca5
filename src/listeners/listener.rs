//! # Listener trait and non-owning handles.
//!
//! Provides [`Listener`], the callback a collaborator registers for an event
//! type, and [`ListenerHandle`], the comparable reference the registries
//! store.
//!
//! ## Rules
//! - A handle is a `Weak` reference: registries never keep a listener alive.
//! - Two handles are equal iff they point at the same listener allocation,
//!   i.e. the same callback bound to the same context.
//! - A handle whose listener was dropped is skipped at delivery and pruned.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use framevisor::{EventRef, Listener, ListenerHandle};
//!
//! struct Counter;
//!
//! impl Listener for Counter {
//!     fn on_event(&self, _event: &EventRef) {}
//!     fn name(&self) -> &'static str { "counter" }
//! }
//!
//! let counter = Arc::new(Counter);
//! let a = ListenerHandle::new(&counter);
//! let b = ListenerHandle::new(&counter);
//! assert_eq!(a, b);
//! assert_ne!(a, ListenerHandle::new(&Arc::new(Counter)));
//!
//! drop(counter);
//! assert!(!a.is_alive());
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use crate::events::EventRef;

/// Callback invoked for each delivered event of the registered type.
///
/// ### Implementation requirements
/// - Return quickly; queued delivery runs under the caller's frame budget.
/// - Mark the event handled to stop delivery under
///   [`HandledPolicy::StopWhenHandled`](crate::HandledPolicy::StopWhenHandled).
/// - Never call [`Dispatcher::update`](crate::Dispatcher::update) from here.
pub trait Listener: Send + Sync + 'static {
    /// Handles one event.
    fn on_event(&self, event: &EventRef);

    /// Name used in logs and registration errors.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl<F> Listener for F
where
    F: Fn(&EventRef) + Send + Sync + 'static,
{
    fn on_event(&self, event: &EventRef) {
        self(event)
    }

    fn name(&self) -> &'static str {
        "closure"
    }
}

/// Non-owning, comparable reference to a [`Listener`].
#[derive(Clone)]
pub struct ListenerHandle {
    target: Weak<dyn Listener>,
    name: &'static str,
}

impl ListenerHandle {
    /// Creates a handle to a concrete listener.
    pub fn new<L: Listener>(listener: &Arc<L>) -> Self {
        let weak: Weak<L> = Arc::downgrade(listener);
        Self {
            target: weak,
            name: listener.name(),
        }
    }

    /// Creates a handle to an already type-erased listener.
    pub fn from_dyn(listener: &Arc<dyn Listener>) -> Self {
        Self {
            target: Arc::downgrade(listener),
            name: listener.name(),
        }
    }

    /// Listener name captured at creation.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// `false` once the listener has been dropped.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Upgrades to the listener if it is still alive.
    #[inline]
    pub fn upgrade(&self) -> Option<Arc<dyn Listener>> {
        self.target.upgrade()
    }

    fn addr(&self) -> *const () {
        self.target.as_ptr().cast::<()>()
    }
}

impl PartialEq for ListenerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for ListenerHandle {}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("name", &self.name)
            .field("addr", &self.addr())
            .field("alive", &self.is_alive())
            .finish()
    }
}
