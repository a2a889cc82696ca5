//! # Example: mouse_pick
//!
//! Headless mouse picking: a grid of circles listens for mouse positions,
//! clicks are queued and drained once per frame, and the first circle under
//! the cursor claims the click.
//!
//! Shows how to:
//! - Define an [`Event`] kind with a `const` [`EventType`] and a byte codec.
//! - Tie a registration to a context's lifetime with a [`Subscription`].
//! - Stop delivery by marking the event handled (first handler wins).
//!
//! ## Flow
//! ```text
//! click(x, y) ──► dispatcher.queue(MousePosition)
//! frame       ──► dispatcher.update(4ms)
//!                   └─► Circle::on_event (registration order)
//!                         └─ hit? ──► activate + mark_handled ──► remaining circles skipped
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example mouse_pick
//! ```

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use framevisor::{
    Budget, DispatchError, Dispatcher, Event, EventMeta, EventRef, EventType, Listener,
    ListenerHandle, Subscription,
};
use tracing_subscriber::EnvFilter;

/// Cursor position at the time of a click.
struct MousePosition {
    meta: EventMeta,
    x: f32,
    y: f32,
}

impl MousePosition {
    const TYPE: EventType = EventType::from_name("mouse_position");

    fn at(dispatcher: &Dispatcher, x: f32, y: f32) -> EventRef {
        Arc::new(Self {
            meta: EventMeta::new(dispatcher.now()),
            x,
            y,
        })
    }
}

impl Event for MousePosition {
    fn event_type(&self) -> EventType {
        Self::TYPE
    }

    fn name(&self) -> &'static str {
        "MousePosition"
    }

    fn meta(&self) -> &EventMeta {
        &self.meta
    }

    fn duplicate(&self) -> EventRef {
        Arc::new(Self {
            meta: EventMeta::new(self.created_at()),
            x: self.x,
            y: self.y,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn serialize(&self, out: &mut Vec<u8>) -> Result<(), DispatchError> {
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
        Ok(())
    }

    fn deserialize(&mut self, input: &[u8]) -> Result<(), DispatchError> {
        let codec = |reason: &str| DispatchError::Codec {
            event: "MousePosition",
            reason: reason.to_owned(),
        };
        let (x, y) = input
            .split_first_chunk::<4>()
            .and_then(|(x, rest)| rest.first_chunk::<4>().map(|y| (*x, *y)))
            .ok_or_else(|| codec("expected 8 bytes"))?;
        self.x = f32::from_le_bytes(x);
        self.y = f32::from_le_bytes(y);
        Ok(())
    }
}

/// A pickable circle; axis-aligned box hit test like the original sample.
struct Circle {
    id: usize,
    x: f32,
    y: f32,
    radius: f32,
    activated: AtomicBool,
}

impl Circle {
    fn contains(&self, x: f32, y: f32) -> bool {
        x < self.x + self.radius
            && x > self.x - self.radius
            && y < self.y + self.radius
            && y > self.y - self.radius
    }
}

impl Listener for Circle {
    fn on_event(&self, event: &EventRef) {
        if self.activated.load(Ordering::Relaxed) {
            return;
        }
        let Some(pos) = event.downcast_ref::<MousePosition>() else {
            return;
        };
        if self.contains(pos.x, pos.y) {
            tracing::info!(circle = self.id, x = pos.x, y = pos.y, radius = self.radius, "picked a circle");
            self.activated.store(true, Ordering::Relaxed);
            event.mark_handled();
        }
    }

    fn name(&self) -> &'static str {
        "Circle"
    }
}

/// Circle plus the registration that lives exactly as long as it does.
struct Placed {
    circle: Arc<Circle>,
    _subscription: Subscription,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let dispatcher = Dispatcher::builder("Global").with_global(true).build()?;

    let mut circles = Vec::new();
    for row in 0..10 {
        for col in 0..10 {
            let circle = Arc::new(Circle {
                id: row * 10 + col,
                x: 40.0 + col as f32 * 60.0,
                y: 40.0 + row as f32 * 60.0,
                radius: 5.0 + ((row + col) % 6) as f32,
                activated: AtomicBool::new(false),
            });
            let subscription = dispatcher.subscribe(ListenerHandle::new(&circle), MousePosition::TYPE)?;
            circles.push(Placed {
                circle,
                _subscription: subscription,
            });
        }
    }

    #[cfg(feature = "logging")]
    let _trace = {
        let trace = Arc::new(framevisor::TraceListener::labeled("mouse"));
        let sub = dispatcher.subscribe(ListenerHandle::new(&trace), MousePosition::TYPE)?;
        (trace, sub)
    };

    // Round trip one click through the codec, as a recorder would.
    let mut bytes = Vec::new();
    MousePosition::at(&dispatcher, 100.0, 40.0).serialize(&mut bytes)?;
    let mut replayed = MousePosition {
        meta: EventMeta::new(dispatcher.now()),
        x: 0.0,
        y: 0.0,
    };
    replayed.deserialize(&bytes)?;

    let clicks = [(41.0, 42.0), (100.0, 100.0), (300.0, 280.0), (5.0, 5.0)];
    for (x, y) in clicks {
        dispatcher.queue(MousePosition::at(&dispatcher, x, y))?;
    }
    dispatcher.queue(Arc::new(replayed))?;

    // Removing a circle drops its subscription; it can no longer be picked.
    circles.retain(|p| p.circle.id != 5);

    let mut frame = 0;
    loop {
        frame += 1;
        let drain = dispatcher.update(Budget::millis(4))?;
        tracing::debug!(frame, delivered = drain.delivered(), carried = drain.carried(), "frame");
        if drain.is_flushed() && dispatcher.pending() == 0 {
            break;
        }
    }

    let picked: Vec<usize> = circles
        .iter()
        .filter(|p| p.circle.activated.load(Ordering::Relaxed))
        .map(|p| p.circle.id)
        .collect();
    tracing::info!(frames = frame, ?picked, remaining = circles.len(), "done");
    Ok(())
}
