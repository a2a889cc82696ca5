//! # Listener registries.
//!
//! - [`ListenerRegistry`] single-owner map used by the dispatcher's main path
//!   (`trigger`, `queue`, `update`).
//! - [`ThreadSafeRegistry`] mutex-guarded registry for immediate triggers from
//!   any thread.
//!
//! Both store [`ListenerHandle`](crate::ListenerHandle)s per
//! [`EventType`](crate::EventType) in registration order and share one
//! delivery loop, so ordering and handled-policy behave the same on every path.

mod listeners;
mod threaded;

pub(crate) use listeners::deliver_to;
pub use listeners::ListenerRegistry;
pub use threaded::ThreadSafeRegistry;
