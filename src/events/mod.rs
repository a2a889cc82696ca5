//! Event data model.
//!
//! ## Contents
//! - [`Event`] the contract every event kind implements
//! - [`EventMeta`] timestamp + handled flag embedded in each event
//! - [`EventType`] stable per-kind identifier
//! - [`EventRef`] shared handle passed to listeners
//!
//! Producers build events, the [`Dispatcher`](crate::Dispatcher) routes them
//! by [`EventType`] to the listeners registered for that type.

mod event;

pub(crate) use event::validate;
pub use event::{Event, EventMeta, EventRef, EventType};
