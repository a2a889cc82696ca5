//! # Example: threaded_trigger
//!
//! Worker threads report progress through the global dispatcher's thread-safe
//! registry while the owner thread keeps its own queue.
//!
//! Shows how to:
//! - Find the shared registry from any thread with [`global::threaded`].
//! - Register threaded listeners with a guard ([`ThreadSafeRegistry::listen`]).
//! - Choose between `Snapshot` and `Serialized` threaded delivery.
//!
//! ## Flow
//! ```text
//! main thread:  Dispatcher::builder("Global").with_global(true)
//!                 └─► threaded().listen(Progress, tally)
//! worker N:     global::threaded() ──► trigger(Progress) ──► tally (on worker N)
//! main thread:  join workers ──► read tally
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example threaded_trigger
//! ```

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use framevisor::{
    Dispatcher, DispatcherConfig, Event, EventMeta, EventRef, EventType, HandledPolicy,
    ThreadSafeRegistry, ThreadedDelivery, global,
};
use tracing_subscriber::EnvFilter;

struct Progress {
    meta: EventMeta,
    worker: usize,
    done: u64,
}

impl Progress {
    const TYPE: EventType = EventType::from_name("worker_progress");
}

impl Event for Progress {
    fn event_type(&self) -> EventType {
        Self::TYPE
    }
    fn name(&self) -> &'static str {
        "Progress"
    }
    fn meta(&self) -> &EventMeta {
        &self.meta
    }
    fn duplicate(&self) -> EventRef {
        Arc::new(Progress {
            meta: EventMeta::new(self.created_at()),
            worker: self.worker,
            done: self.done,
        })
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = DispatcherConfig {
        threaded_policy: HandledPolicy::Broadcast,
        threaded_delivery: ThreadedDelivery::Snapshot,
        ..DispatcherConfig::default()
    };
    let dispatcher = Dispatcher::builder("Global").with_config(cfg).with_global(true).build()?;

    let total = Arc::new(AtomicU64::new(0));
    let tally = Arc::clone(&total);
    let _tally = dispatcher.threaded().listen(Progress::TYPE, move |ev: &EventRef| {
        if let Some(p) = ev.downcast_ref::<Progress>() {
            tally.fetch_add(p.done, Ordering::Relaxed);
        }
    })?;
    let _log = dispatcher.threaded().listen(Progress::TYPE, |ev: &EventRef| {
        if let Some(p) = ev.downcast_ref::<Progress>() {
            tracing::debug!(worker = p.worker, done = p.done, thread = ?thread::current().id(), "progress");
        }
    })?;

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            thread::spawn(move || -> Result<(), framevisor::DispatchError> {
                let Some(registry) = global::threaded() else {
                    return Ok(());
                };
                for step in 1..=10 {
                    let ev: EventRef = Arc::new(Progress {
                        meta: EventMeta::default(),
                        worker,
                        done: step,
                    });
                    registry.trigger(&ev)?;
                }
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        match worker.join() {
            Ok(result) => result?,
            Err(_) => tracing::error!("worker panicked"),
        }
    }

    // A standalone registry with serialized delivery: one trigger at a time.
    let serialized = Arc::new(ThreadSafeRegistry::new(HandledPolicy::StopWhenHandled, ThreadedDelivery::Serialized));
    let _first = serialized.listen(Progress::TYPE, |ev: &EventRef| ev.mark_handled())?;
    let _never = serialized.listen(Progress::TYPE, |_ev: &EventRef| tracing::warn!("unreachable listener ran"))?;
    thread::scope(|s| {
        for worker in 0..2 {
            let serialized = &serialized;
            s.spawn(move || {
                let ev: EventRef = Arc::new(Progress {
                    meta: EventMeta::default(),
                    worker,
                    done: 0,
                });
                let _ = serialized.trigger(&ev);
            });
        }
    });

    tracing::info!(
        total = total.load(Ordering::Relaxed),
        expected = 4 * 55,
        global = ?global::name(),
        "workers finished"
    );
    Ok(())
}
