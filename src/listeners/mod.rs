//! # Listeners: callbacks, handles and registration guards.
//!
//! ## Architecture
//! ```text
//!  context ──owns──► Subscription ──drop──► Dispatcher::remove_listener
//!     │                    │
//!     └──Arc<L: Listener>  └── ListenerHandle (Weak<dyn Listener>)
//!                                   │
//!                                   ▼
//!                          ListenerRegistry / ThreadSafeRegistry
//!                                   │  delivery: upgrade → on_event(&EventRef)
//!                                   ▼
//!                              L::on_event
//! ```
//!
//! ## Contents
//! - [`Listener`] callback trait (blanket impl for `Fn(&EventRef)` closures)
//! - [`ListenerHandle`] non-owning comparable reference stored by registries
//! - [`Subscription`], [`ThreadedSubscription`] unregister-on-drop guards
//! - [`TraceListener`] built-in listener that logs events (feature `logging`)

mod listener;
mod subscription;
#[cfg(feature = "logging")]
mod trace;

pub use listener::{Listener, ListenerHandle};
pub use subscription::{Subscription, ThreadedSubscription};
#[cfg(feature = "logging")]
pub use trace::TraceListener;
