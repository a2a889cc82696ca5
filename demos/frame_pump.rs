//! # Example: frame_pump
//!
//! A headless "game loop": a [`Pump`] calls `update` every 16ms with a 2ms
//! frame budget. A burst of expensive events is spread over several frames
//! instead of stalling one.
//!
//! Shows how to:
//! - Configure a [`Pump`] with [`PumpConfig`].
//! - Stop the loop with a [`CancellationToken`] or Ctrl-C.
//! - Read the [`PumpReport`](framevisor::PumpReport) afterwards.
//!
//! ## Run
//! ```bash
//! RUST_LOG=framevisor=debug cargo run --example frame_pump
//! ```

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use framevisor::{Dispatcher, Event, EventMeta, EventRef, EventType, Pump, PumpConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

struct Job {
    meta: EventMeta,
    id: u32,
}

impl Job {
    const TYPE: EventType = EventType::from_name("job");
}

impl Event for Job {
    fn event_type(&self) -> EventType {
        Self::TYPE
    }
    fn name(&self) -> &'static str {
        "Job"
    }
    fn meta(&self) -> &EventMeta {
        &self.meta
    }
    fn duplicate(&self) -> EventRef {
        Arc::new(Job {
            meta: EventMeta::new(self.created_at()),
            id: self.id,
        })
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let dispatcher = Dispatcher::builder("frames").build()?;
    let token = CancellationToken::new();

    let stop = token.clone();
    let _worker = dispatcher.listen(Job::TYPE, move |ev: &EventRef| {
        let Some(job) = ev.downcast_ref::<Job>() else {
            return;
        };
        // Half a millisecond of "work" per job.
        std::thread::sleep(Duration::from_micros(500));
        tracing::info!(job = job.id, queued_at = ?job.created_at(), "job done");
        if job.id == 19 {
            stop.cancel();
        }
    })?;

    for id in 0..20 {
        dispatcher.queue(Arc::new(Job {
            meta: EventMeta::new(dispatcher.now()),
            id,
        }))?;
    }

    let pump = Pump::new(PumpConfig {
        tick: Duration::from_millis(16),
        frame_budget: Duration::from_millis(2),
        flush_on_stop: true,
        stop_on_signal: true,
    });
    let report = pump.run(&dispatcher, token).await;

    tracing::info!(
        frames = report.frames,
        partial_frames = report.partial_frames,
        delivered = report.delivered,
        stop = ?report.stop,
        "pump finished"
    );
    Ok(())
}
