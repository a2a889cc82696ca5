//! # Dispatcher: immediate triggers, budgeted queues and the threaded side channel.
//!
//! The [`Dispatcher`] owns a [`ListenerRegistry`], a double-buffered
//! [`EventQueue`] and a shared [`ThreadSafeRegistry`]. It lives on one thread
//! (`Rc<Dispatcher>`); only the thread-safe registry crosses threads.
//!
//! ## Delivery paths
//! ```text
//! trigger(&ev) ──► validate ──► snapshot(listeners) ──► deliver (trigger_policy)
//!
//! queue(ev)    ──► validate ──► any live listener? ──no──► Err(NoListenersForType)
//!                                   │yes
//!                                   ▼
//!                            active buffer
//!
//! update(budget)
//!   ├─ already draining? ──► Err(ReentrantUpdate)
//!   ├─ prune dead handles, both registries (prune_on_update)
//!   ├─ begin_drain(): flip buffers
//!   └─ drain: for each event until empty or deadline
//!         snapshot(listeners) ──► deliver (drain_policy)
//!      ├─ empty      ──► Drain::Flushed
//!      └─ deadline   ──► leftovers to front of active ──► Drain::Partial
//!
//! trigger_threaded(&ev) ──► ThreadSafeRegistry::trigger (threaded_policy)
//! ```
//!
//! ## Re-entrancy
//! Delivery never holds a borrow of the registry or the queue while a listener
//! runs. Listeners may `trigger`, `queue`, `abort`, `add_listener` and
//! `remove_listener` on the dispatcher that is delivering to them:
//! - events queued during a drain wait for the next `update`;
//! - a listener added during a delivery first sees the next event;
//! - `update` from inside a listener is rejected with `ReentrantUpdate`.
//!
//! Listeners are `Send + Sync`, so they cannot capture an `Rc<Dispatcher>`;
//! the usual way back to the dispatcher from a listener is [`global::get`].
//!
//! ## Example
//! ```rust
//! use std::any::Any;
//! use std::sync::Arc;
//! use framevisor::{Budget, Dispatcher, DispatcherConfig, Event, EventMeta, EventRef, EventType};
//!
//! struct Clicked { meta: EventMeta }
//!
//! impl Event for Clicked {
//!     fn event_type(&self) -> EventType { EventType::from_name("clicked") }
//!     fn name(&self) -> &'static str { "Clicked" }
//!     fn meta(&self) -> &EventMeta { &self.meta }
//!     fn duplicate(&self) -> EventRef { Arc::new(Clicked { meta: EventMeta::new(self.created_at()) }) }
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! let dispatcher = Dispatcher::new("ui", DispatcherConfig::default());
//! let _sub = dispatcher
//!     .listen(EventType::from_name("clicked"), |ev: &EventRef| ev.mark_handled())
//!     .unwrap();
//!
//! let ev: EventRef = Arc::new(Clicked { meta: EventMeta::new(dispatcher.now()) });
//! dispatcher.queue(Arc::clone(&ev)).unwrap();
//! assert_eq!(dispatcher.pending(), 1);
//!
//! let drain = dispatcher.update(Budget::Unlimited).unwrap();
//! assert!(drain.is_flushed());
//! assert!(ev.is_handled());
//! ```
//!
//! [`global::get`]: crate::global::get

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use super::builder::DispatcherBuilder;
use crate::clock::{Budget, Clock, MonotonicClock};
use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::events::{EventRef, EventType, validate};
use crate::global;
use crate::listeners::{Listener, ListenerHandle, Subscription};
use crate::queue::{self, Drain, EventQueue};
use crate::registry::{ListenerRegistry, ThreadSafeRegistry, deliver_to};

/// Single-thread event dispatcher.
pub struct Dispatcher {
    name: String,
    cfg: DispatcherConfig,
    clock: Arc<dyn Clock>,
    registry: RefCell<ListenerRegistry>,
    queue: RefCell<EventQueue>,
    threaded: Arc<ThreadSafeRegistry>,
    draining: Cell<bool>,
}

/// Clears the draining flag when `update` returns or unwinds.
struct DrainingGuard<'a>(&'a Cell<bool>);

impl Drop for DrainingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Dispatcher {
    /// Creates a dispatcher with a [`MonotonicClock`]. Not designated global.
    pub fn new(name: impl Into<String>, cfg: DispatcherConfig) -> Rc<Self> {
        Rc::new(Self::from_parts(name.into(), cfg, Arc::new(MonotonicClock::new())))
    }

    /// Starts a [`DispatcherBuilder`].
    pub fn builder(name: impl Into<String>) -> DispatcherBuilder {
        DispatcherBuilder::new(name)
    }

    pub(crate) fn from_parts(name: String, cfg: DispatcherConfig, clock: Arc<dyn Clock>) -> Self {
        let threaded = Arc::new(ThreadSafeRegistry::new(cfg.threaded_policy, cfg.threaded_delivery));
        Self {
            name,
            cfg,
            clock,
            registry: RefCell::new(ListenerRegistry::new()),
            queue: RefCell::new(EventQueue::new()),
            threaded,
            draining: Cell::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.cfg
    }

    /// Current reading of the dispatcher's clock; use it to stamp events.
    pub fn now(&self) -> Duration {
        self.clock.elapsed()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ---- registration ----

    /// Registers `handle` for `event_type` on the main path.
    pub fn add_listener(&self, handle: ListenerHandle, event_type: EventType) -> Result<(), DispatchError> {
        self.registry.borrow_mut().add(handle, event_type)
    }

    /// Removes `handle` for `event_type` from the main path.
    pub fn remove_listener(&self, handle: &ListenerHandle, event_type: EventType) -> Result<(), DispatchError> {
        self.registry.borrow_mut().remove(handle, event_type)
    }

    pub fn has_listener(&self, handle: &ListenerHandle, event_type: EventType) -> bool {
        self.registry.borrow().contains(handle, event_type)
    }

    /// Live main-path listeners for `event_type`.
    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.registry.borrow().listener_count(event_type)
    }

    /// Registers `handle` and returns a guard that removes it on drop.
    pub fn subscribe(self: &Rc<Self>, handle: ListenerHandle, event_type: EventType) -> Result<Subscription, DispatchError> {
        self.add_listener(handle.clone(), event_type)?;
        Ok(Subscription::new(handle, event_type, self, None))
    }

    /// Registers a closure; the returned guard owns it.
    pub fn listen<F>(self: &Rc<Self>, event_type: EventType, f: F) -> Result<Subscription, DispatchError>
    where
        F: Fn(&EventRef) + Send + Sync + 'static,
    {
        let listener: Arc<dyn Listener> = Arc::new(f);
        let handle = ListenerHandle::from_dyn(&listener);
        self.add_listener(handle.clone(), event_type)?;
        Ok(Subscription::new(handle, event_type, self, Some(listener)))
    }

    // ---- delivery ----

    /// Delivers `event` now, bypassing the queue.
    ///
    /// Returns whether at least one listener was invoked.
    pub fn trigger(&self, event: &EventRef) -> Result<bool, DispatchError> {
        validate(event.as_ref())?;
        let listeners = self.registry.borrow().snapshot(event.event_type());
        let invoked = deliver_to(&listeners, event, self.cfg.trigger_policy);
        Ok(invoked > 0)
    }

    /// Appends `event` to the active buffer for the next `update`.
    ///
    /// Fails with [`DispatchError::NoListenersForType`] (and drops the event)
    /// when no live listener is registered for its type.
    pub fn queue(&self, event: EventRef) -> Result<(), DispatchError> {
        validate(event.as_ref())?;
        let event_type = event.event_type();
        if !self.registry.borrow().has_listeners(event_type) {
            tracing::warn!(
                dispatcher = %self.name,
                event = event.name(),
                %event_type,
                "no listeners for event type; event not queued"
            );
            return Err(DispatchError::NoListenersForType {
                event_type,
                event: event.name(),
            });
        }
        self.queue.borrow_mut().enqueue(event);
        Ok(())
    }

    /// Removes not-yet-drained events of `event_type` from the active buffer.
    ///
    /// Removes the first match, or all of them with `all_of_type`. Events
    /// already in a running drain pass are not affected.
    /// Returns whether anything was removed.
    pub fn abort(&self, event_type: EventType, all_of_type: bool) -> bool {
        let removed = self.queue.borrow_mut().abort(event_type, all_of_type);
        if removed > 0 {
            tracing::debug!(dispatcher = %self.name, %event_type, removed, "aborted queued events");
        }
        removed > 0
    }

    /// Runs one processing cycle: flips the buffers and delivers the snapshot
    /// within `budget`.
    ///
    /// Must not be called from a listener; doing so returns
    /// [`DispatchError::ReentrantUpdate`] and leaves the running pass intact.
    pub fn update(&self, budget: Budget) -> Result<Drain, DispatchError> {
        if self.draining.replace(true) {
            tracing::warn!(dispatcher = %self.name, "update called from inside a listener");
            return Err(DispatchError::ReentrantUpdate);
        }
        let _guard = DrainingGuard(&self.draining);
        let deadline = budget.deadline(self.clock.elapsed());

        if self.cfg.prune_on_update {
            let pruned = self.registry.borrow_mut().prune() + self.threaded.prune();
            if pruned > 0 {
                tracing::debug!(dispatcher = %self.name, pruned, "dropped handles of dead listeners");
            }
        }

        self.queue.borrow_mut().begin_drain();
        let policy = self.cfg.drain_policy;
        let outcome = queue::drain(&self.queue, deadline, self.clock.as_ref(), |event| {
            let listeners = self.registry.borrow().snapshot(event.event_type());
            deliver_to(&listeners, event, policy) > 0
        });

        if let Drain::Partial { delivered, carried } = outcome {
            tracing::debug!(
                dispatcher = %self.name,
                delivered,
                carried,
                ?budget,
                "budget elapsed; carrying events to next update"
            );
        }
        Ok(outcome)
    }

    /// Events waiting in the active buffer.
    pub fn pending(&self) -> usize {
        self.queue.borrow().pending()
    }

    /// `true` while an `update` is delivering.
    pub fn is_draining(&self) -> bool {
        self.draining.get()
    }

    // ---- threaded side channel ----

    /// Shared registry for cross-thread triggers.
    pub fn threaded(&self) -> &Arc<ThreadSafeRegistry> {
        &self.threaded
    }

    pub fn add_threaded_listener(&self, handle: ListenerHandle, event_type: EventType) -> Result<(), DispatchError> {
        self.threaded.add(handle, event_type)
    }

    pub fn remove_threaded_listener(&self, handle: &ListenerHandle, event_type: EventType) -> Result<(), DispatchError> {
        self.threaded.remove(handle, event_type)
    }

    /// Delivers `event` to the threaded listeners on the calling thread.
    pub fn trigger_threaded(&self, event: &EventRef) -> Result<bool, DispatchError> {
        self.threaded.trigger(event)
    }

    // ---- global designation ----

    /// Designates this dispatcher as the process-wide one.
    pub fn make_global(self: &Rc<Self>) -> Result<(), DispatchError> {
        global::set(self)
    }

    pub fn is_global(&self) -> bool {
        global::is_designated(self)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("name", &self.name)
            .field("pending", &self.queue.try_borrow().map(|q| q.pending()).ok())
            .field("draining", &self.draining.get())
            .finish_non_exhaustive()
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        global::release(self);
    }
}
