//! # Frame pump: calls `update` once per tick.
//!
//! A headless stand-in for an application main loop. [`Pump::run`] drives
//! [`Dispatcher::update`] from a tokio interval until the cancellation token
//! fires (or, when configured, an OS termination signal arrives).
//!
//! ```text
//! loop (biased select):
//!   token.cancelled()          ──► stop (Cancelled)
//!   shutdown signal (optional) ──► stop (Signal)
//!   interval.tick()            ──► dispatcher.update(frame_budget)
//!                                   ├─ Flushed  → frames += 1
//!                                   └─ Partial  → frames += 1, partial_frames += 1
//! after loop:
//!   flush_on_stop ──► dispatcher.update(Unlimited)
//! ```
//!
//! ## Rules
//! - Missed ticks are skipped, never bunched up.
//! - The dispatcher is `!Sync`; run the pump on a current-thread runtime or
//!   inside a `LocalSet`.
//! - Cancellation is observed between frames, never in the middle of a drain.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::dispatcher::Dispatcher;
use super::shutdown;
use crate::clock::Budget;
use crate::config::PumpConfig;
use crate::queue::Drain;

/// Why a pump stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The cancellation token fired.
    Cancelled,
    /// An OS termination signal arrived.
    Signal,
}

/// Summary of one [`Pump::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpReport {
    /// `update` calls made by the loop (the final flush is not a frame).
    pub frames: u64,
    /// Frames whose budget ran out.
    pub partial_frames: u64,
    /// Events delivered, final flush included.
    pub delivered: usize,
    /// Outcome of the final flush, when one ran.
    pub final_flush: Option<Drain>,
    pub stop: StopReason,
}

impl PumpReport {
    fn new() -> Self {
        Self {
            frames: 0,
            partial_frames: 0,
            delivered: 0,
            final_flush: None,
            stop: StopReason::Cancelled,
        }
    }

    fn record(&mut self, drain: Drain) {
        self.frames += 1;
        self.delivered += drain.delivered();
        if !drain.is_flushed() {
            self.partial_frames += 1;
        }
    }
}

/// Drives a dispatcher at a fixed tick.
#[derive(Debug, Clone, Default)]
pub struct Pump {
    cfg: PumpConfig,
}

impl Pump {
    pub fn new(cfg: PumpConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &PumpConfig {
        &self.cfg
    }

    /// Runs frames until `token` is cancelled (or a signal arrives when
    /// `stop_on_signal` is set).
    pub async fn run(&self, dispatcher: &Dispatcher, token: CancellationToken) -> PumpReport {
        let budget = self.cfg.budget();
        let mut ticker = time::interval(self.cfg.tick_clamped());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let stop_on_signal = self.cfg.stop_on_signal;
        let signal = async move {
            if !stop_on_signal {
                return std::future::pending::<()>().await;
            }
            match shutdown::wait_for_shutdown_signal().await {
                Ok(name) => tracing::info!(signal = name, "shutdown signal received"),
                Err(err) => {
                    tracing::warn!(error = %err, "signal handler unavailable; stopping on cancellation only");
                    std::future::pending::<()>().await;
                }
            }
        };
        tokio::pin!(signal);

        let mut report = PumpReport::new();
        report.stop = loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break StopReason::Cancelled,
                _ = &mut signal => break StopReason::Signal,
                _ = ticker.tick() => match dispatcher.update(budget) {
                    Ok(drain) => report.record(drain),
                    Err(err) => tracing::warn!(
                        dispatcher = dispatcher.name(),
                        label = err.as_label(),
                        "frame skipped"
                    ),
                },
            }
        };

        if self.cfg.flush_on_stop {
            match dispatcher.update(Budget::Unlimited) {
                Ok(drain) => {
                    report.delivered += drain.delivered();
                    report.final_flush = Some(drain);
                }
                Err(err) => tracing::warn!(label = err.as_label(), "final flush skipped"),
            }
        }

        tracing::debug!(
            dispatcher = dispatcher.name(),
            frames = report.frames,
            partial_frames = report.partial_frames,
            delivered = report.delivered,
            stop = ?report.stop,
            "pump stopped"
        );
        report
    }

    /// Runs frames for `duration`, then stops as if cancelled.
    pub async fn run_for(&self, dispatcher: &Dispatcher, duration: Duration) -> PumpReport {
        let token = CancellationToken::new();
        let timer = {
            let token = token.clone();
            async move {
                time::sleep(duration).await;
                token.cancel();
            }
        };
        let (report, ()) = tokio::join!(self.run(dispatcher, token), timer);
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::events::EventRef;
    use crate::listeners::ListenerHandle;
    use crate::testing::{Ping, Recorder};

    fn fast(frame_budget: Duration, flush_on_stop: bool) -> Pump {
        Pump::new(PumpConfig {
            tick: Duration::from_millis(1),
            frame_budget,
            flush_on_stop,
            stop_on_signal: false,
        })
    }

    #[tokio::test]
    async fn cancelled_before_start_only_flushes() {
        let d = Dispatcher::new("pump", Default::default());
        let l = Arc::new(Recorder::new());
        let _sub = d.subscribe(ListenerHandle::new(&l), Ping::TYPE).unwrap();
        d.queue(Ping::new(1)).unwrap();
        d.queue(Ping::new(2)).unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let report = fast(Duration::ZERO, true).run(&d, token).await;

        assert_eq!(report.frames, 0);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.final_flush, Some(Drain::Flushed { delivered: 2 }));
        assert_eq!(report.stop, StopReason::Cancelled);
        assert_eq!(l.seen(), vec![1, 2]);
    }

    #[tokio::test]
    async fn budget_spreads_events_over_frames() {
        let clock = Arc::new(ManualClock::new());
        let d = Dispatcher::builder("pump").with_clock(clock.clone()).build().unwrap();
        let token = CancellationToken::new();

        // Each event costs 10ms of a 5ms frame; the listener stops the pump
        // after the third one.
        let stop = token.clone();
        let cost = Arc::clone(&clock);
        let _sub = d
            .listen(Ping::TYPE, move |ev: &EventRef| {
                cost.advance(Duration::from_millis(10));
                if ev.downcast_ref::<Ping>().is_some_and(|p| p.seq == 3) {
                    stop.cancel();
                }
            })
            .unwrap();
        for i in 1..=3 {
            d.queue(Ping::new(i)).unwrap();
        }

        let report = fast(Duration::from_millis(5), false).run(&d, token).await;
        assert_eq!(report.frames, 3);
        assert_eq!(report.partial_frames, 2);
        assert_eq!(report.delivered, 3);
        assert_eq!(report.final_flush, None);
    }

    #[tokio::test]
    async fn run_for_stops_on_its_own() {
        let d = Dispatcher::new("pump", Default::default());
        let l = Arc::new(Recorder::new());
        let _sub = d.subscribe(ListenerHandle::new(&l), Ping::TYPE).unwrap();
        d.queue(Ping::new(1)).unwrap();

        let report = fast(Duration::ZERO, true)
            .run_for(&d, Duration::from_millis(20))
            .await;
        assert!(report.frames >= 1);
        assert_eq!(report.partial_frames, 0);
        assert_eq!(report.delivered, 1);
        assert_eq!(l.seen(), vec![1]);
    }

    #[test]
    fn default_pump_runs_at_sixty_hertz() {
        let pump = Pump::default();
        assert_eq!(pump.config().tick, Duration::from_millis(16));
        assert_eq!(pump.config().budget(), Budget::Unlimited);
    }
}
