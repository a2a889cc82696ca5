use std::rc::Rc;
use std::sync::Arc;

use super::dispatcher::Dispatcher;
use crate::clock::{Clock, MonotonicClock};
use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::global;

/// Builder for a [`Dispatcher`] with optional clock and global designation.
pub struct DispatcherBuilder {
    name: String,
    cfg: DispatcherConfig,
    clock: Option<Arc<dyn Clock>>,
    global: bool,
}

impl DispatcherBuilder {
    /// Creates a builder with the default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cfg: DispatcherConfig::default(),
            clock: None,
            global: false,
        }
    }

    /// Sets the delivery policies.
    pub fn with_config(mut self, cfg: DispatcherConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Injects the time source used for budgets and [`Dispatcher::now`].
    ///
    /// Defaults to a [`MonotonicClock`] started at build time.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Designates the dispatcher as the process-wide one on build.
    pub fn with_global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    /// Builds the dispatcher.
    ///
    /// Fails with [`DispatchError::GlobalAlreadySet`] when `with_global(true)` was
    /// requested and another live dispatcher already holds the designation;
    /// the new dispatcher is dropped in that case.
    pub fn build(self) -> Result<Rc<Dispatcher>, DispatchError> {
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let dispatcher = Rc::new(Dispatcher::from_parts(self.name, self.cfg, clock));
        if self.global {
            global::set(&dispatcher)?;
        }
        tracing::debug!(
            dispatcher = dispatcher.name(),
            global = self.global,
            "dispatcher built"
        );
        Ok(dispatcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::HandledPolicy;
    use crate::testing::global_guard;

    #[test]
    fn defaults() {
        let d = DispatcherBuilder::new("plain").build().unwrap();
        assert_eq!(d.name(), "plain");
        assert_eq!(d.config().drain_policy, HandledPolicy::StopWhenHandled);
        assert!(!d.is_global());
    }

    #[test]
    fn custom_clock_and_config() {
        let clock = Arc::new(ManualClock::starting_at(std::time::Duration::from_secs(3)));
        let d = DispatcherBuilder::new("custom")
            .with_config(DispatcherConfig::with_policy(HandledPolicy::Broadcast))
            .with_clock(clock)
            .build()
            .unwrap();
        assert_eq!(d.now(), std::time::Duration::from_secs(3));
        assert_eq!(d.threaded().policy(), HandledPolicy::Broadcast);
    }

    #[test]
    fn second_global_build_fails() {
        let _g = global_guard();
        let first = DispatcherBuilder::new("first").with_global(true).build().unwrap();
        assert!(first.is_global());

        let err = DispatcherBuilder::new("second").with_global(true).build().unwrap_err();
        assert_eq!(
            err,
            DispatchError::GlobalAlreadySet {
                current: "first".into()
            }
        );
        assert!(first.is_global());

        drop(first);
        let third = DispatcherBuilder::new("third").with_global(true).build().unwrap();
        assert!(third.is_global());
    }
}
