//! # framevisor
//!
//! **Framevisor** is a frame-driven event dispatcher for Rust.
//!
//! Producers publish typed events; listeners registered per event type receive
//! them either immediately ([`Dispatcher::trigger`]) or once per frame from a
//! double-buffered queue drained under a time budget ([`Dispatcher::update`]).
//! A mutex-guarded side channel lets other threads trigger listeners without
//! touching the queue.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌────────────┐   ┌────────────┐              ┌──────────────────┐
//!   │ producer A │   │ producer B │              │ worker threads   │
//!   └─────┬──────┘   └─────┬──────┘              └────────┬─────────┘
//!         │ trigger         │ queue                        │ trigger
//!         ▼                 ▼                              ▼
//! ┌─────────────────────────────────────────┐   ┌──────────────────────────┐
//! │ Dispatcher (one thread, Rc)             │   │ ThreadSafeRegistry (Arc) │
//! │  - ListenerRegistry  type → [handles]   │──►│  Mutex<ListenerRegistry> │
//! │  - EventQueue        [active|draining]  │   └────────────┬─────────────┘
//! │  - Clock             budgets, stamps    │                │
//! └────────┬───────────────────┬────────────┘                │
//!          │ immediate         │ update(budget), once/frame  │
//!          ▼                   ▼                             ▼
//!     listener.on_event   listener.on_event           listener.on_event
//! ```
//!
//! ### One frame
//! ```text
//! Pump tick ──► update(budget)
//!   ├─► begin_drain(): active ⇄ draining
//!   ├─► for event in draining (FIFO):
//!   │     ├─ deadline passed? ─► move rest to FRONT of active ─► Drain::Partial
//!   │     └─ deliver to listeners (registration order, handled policy)
//!   └─► Drain::Flushed
//! events queued by listeners meanwhile ─► active buffer ─► next frame
//! ```
//!
//! ## Features
//! | Area              | Description                                                 | Key types / traits                              |
//! |-------------------|-------------------------------------------------------------|-------------------------------------------------|
//! | **Events**        | Typed records with a stable type id and a handled flag.     | [`Event`], [`EventType`], [`EventRef`]          |
//! | **Listeners**     | Callbacks with non-owning handles and RAII registrations.   | [`Listener`], [`ListenerHandle`], [`Subscription`] |
//! | **Dispatch**      | Immediate trigger, budgeted queue, abort.                   | [`Dispatcher`], [`Drain`], [`Budget`]           |
//! | **Threads**       | Cross-thread triggers through a locked registry.            | [`ThreadSafeRegistry`], [`ThreadedSubscription`] |
//! | **Frame loop**    | Tokio interval driving `update` with cancellation.          | [`Pump`], [`PumpReport`]                        |
//! | **Configuration** | Delivery policies per path, pump timing.                    | [`DispatcherConfig`], [`PumpConfig`]            |
//! | **Errors**        | Typed, non-fatal outcomes.                                  | [`DispatchError`]                               |
//!
//! ## Optional features
//! - `logging` (default): exports [`TraceListener`], which logs every event it receives.
//!
//! ## Example
//! ```rust
//! use std::any::Any;
//! use std::sync::Arc;
//! use framevisor::{Budget, Dispatcher, Event, EventMeta, EventRef, EventType};
//!
//! struct Scored { meta: EventMeta, points: u32 }
//!
//! impl Scored {
//!     const TYPE: EventType = EventType::from_name("scored");
//! }
//!
//! impl Event for Scored {
//!     fn event_type(&self) -> EventType { Self::TYPE }
//!     fn name(&self) -> &'static str { "Scored" }
//!     fn meta(&self) -> &EventMeta { &self.meta }
//!     fn duplicate(&self) -> EventRef {
//!         Arc::new(Scored { meta: EventMeta::new(self.created_at()), points: self.points })
//!     }
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! let dispatcher = Dispatcher::builder("game").build()?;
//! let _scoreboard = dispatcher.listen(Scored::TYPE, |ev: &EventRef| {
//!     if let Some(s) = ev.downcast_ref::<Scored>() {
//!         assert_eq!(s.points, 10);
//!     }
//! })?;
//!
//! dispatcher.queue(Arc::new(Scored { meta: EventMeta::new(dispatcher.now()), points: 10 }))?;
//! let frame = dispatcher.update(Budget::millis(4))?;
//! assert_eq!(frame.delivered(), 1);
//! # Ok::<(), framevisor::DispatchError>(())
//! ```
mod clock;
mod config;
mod core;
mod error;
mod events;
mod listeners;
mod queue;
mod registry;

pub mod global;

#[cfg(test)]
mod testing;

// ---- Public re-exports ----

pub use clock::{Budget, Clock, ManualClock, MonotonicClock};
pub use config::{DispatcherConfig, HandledPolicy, PumpConfig, ThreadedDelivery};
pub use crate::core::{Dispatcher, DispatcherBuilder, Pump, PumpReport, StopReason};
pub use error::DispatchError;
pub use events::{Event, EventMeta, EventRef, EventType};
pub use listeners::{Listener, ListenerHandle, Subscription, ThreadedSubscription};
pub use queue::{Drain, EventQueue};
pub use registry::{ListenerRegistry, ThreadSafeRegistry};

// Optional: built-in listener that logs every event.
// Enable with: `--features logging` (on by default)
#[cfg(feature = "logging")]
pub use listeners::TraceListener;
