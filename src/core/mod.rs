//! Dispatcher core: orchestration and the frame loop.
//!
//! The public API of this module is [`Dispatcher`] (built directly or through
//! [`DispatcherBuilder`]) and the [`Pump`] that drives it once per tick.
//!
//! Internal modules:
//! - [`dispatcher`]: registries, double-buffered queue, budgeted `update`;
//! - [`builder`]: clock injection and global designation at build time;
//! - [`pump`]: tokio interval loop with cancellation and optional OS signals;
//! - [`shutdown`]: cross-platform termination signal helper.

mod builder;
mod dispatcher;
mod pump;
mod shutdown;

pub use builder::DispatcherBuilder;
pub use dispatcher::Dispatcher;
pub use pump::{Pump, PumpReport, StopReason};
