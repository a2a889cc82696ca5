//! Shared test fixtures: small event kinds and recording listeners.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::clock::{Clock, ManualClock};
use crate::events::{Event, EventMeta, EventRef, EventType};
use crate::listeners::Listener;

/// Serializes tests that touch the process-wide global slot.
static GLOBAL_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn global_guard() -> MutexGuard<'static, ()> {
    GLOBAL_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

macro_rules! seq_event {
    ($ty:ident, $name:literal) => {
        pub(crate) struct $ty {
            meta: EventMeta,
            pub seq: u32,
        }

        impl $ty {
            pub const TYPE: EventType = EventType::from_name($name);

            pub fn new(seq: u32) -> EventRef {
                Self::at(seq, Duration::ZERO)
            }

            pub fn at(seq: u32, created_at: Duration) -> EventRef {
                Arc::new(Self {
                    meta: EventMeta::new(created_at),
                    seq,
                })
            }
        }

        impl Event for $ty {
            fn event_type(&self) -> EventType {
                Self::TYPE
            }
            fn name(&self) -> &'static str {
                stringify!($ty)
            }
            fn meta(&self) -> &EventMeta {
                &self.meta
            }
            fn duplicate(&self) -> EventRef {
                Self::at(self.seq, self.created_at())
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
    };
}

seq_event!(Ping, "test.ping");
seq_event!(Pong, "test.pong");

/// Event reporting the reserved type id.
#[derive(Default)]
pub(crate) struct Broken {
    meta: EventMeta,
}

impl Event for Broken {
    fn event_type(&self) -> EventType {
        EventType::INVALID
    }
    fn name(&self) -> &'static str {
        "Broken"
    }
    fn meta(&self) -> &EventMeta {
        &self.meta
    }
    fn duplicate(&self) -> EventRef {
        Arc::new(Broken::default())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Event with an empty name.
#[derive(Default)]
pub(crate) struct Nameless {
    meta: EventMeta,
}

impl Event for Nameless {
    fn event_type(&self) -> EventType {
        EventType::from_name("test.nameless")
    }
    fn name(&self) -> &'static str {
        ""
    }
    fn meta(&self) -> &EventMeta {
        &self.meta
    }
    fn duplicate(&self) -> EventRef {
        Arc::new(Nameless::default())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn seq_of(event: &EventRef) -> u32 {
    if let Some(p) = event.downcast_ref::<Ping>() {
        p.seq
    } else if let Some(p) = event.downcast_ref::<Pong>() {
        p.seq
    } else {
        u32::MAX
    }
}

pub(crate) type SharedLog = Arc<Mutex<Vec<String>>>;

/// Records the sequence number of every event it receives.
pub(crate) struct Recorder {
    name: &'static str,
    handles: bool,
    seen: Mutex<Vec<u32>>,
    log: Option<(&'static str, SharedLog)>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::named("recorder")
    }

    pub fn named(name: &'static str) -> Self {
        Self {
            name,
            handles: false,
            seen: Mutex::new(Vec::new()),
            log: None,
        }
    }

    /// Marks every event handled after recording it.
    pub fn handling() -> Self {
        Self {
            handles: true,
            ..Self::new()
        }
    }

    pub fn shared_log() -> SharedLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    /// Also appends `"{label}:{seq}"` to `log`, for cross-listener ordering.
    pub fn logging(label: &'static str, log: &SharedLog) -> Self {
        Self {
            log: Some((label, Arc::clone(log))),
            ..Self::named(label)
        }
    }

    pub fn entries(log: &SharedLog) -> Vec<String> {
        lock(log).clone()
    }

    pub fn seen(&self) -> Vec<u32> {
        lock(&self.seen).clone()
    }
}

impl Listener for Recorder {
    fn on_event(&self, event: &EventRef) {
        let seq = seq_of(event);
        lock(&self.seen).push(seq);
        if let Some((label, log)) = &self.log {
            lock(log).push(format!("{label}:{seq}"));
        }
        if self.handles {
            event.mark_handled();
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Listener that "takes" `cost` of clock time per event.
pub(crate) struct SlowListener {
    clock: Arc<ManualClock>,
    cost: Duration,
    seen: Mutex<Vec<(u32, Duration)>>,
}

impl SlowListener {
    pub fn new(clock: &Arc<ManualClock>, cost: Duration) -> Self {
        Self {
            clock: Arc::clone(clock),
            cost,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<u32> {
        lock(&self.seen).iter().map(|(seq, _)| *seq).collect()
    }

    /// Clock readings at which each event started.
    pub fn started_at(&self) -> Vec<Duration> {
        lock(&self.seen).iter().map(|(_, at)| *at).collect()
    }
}

impl Listener for SlowListener {
    fn on_event(&self, event: &EventRef) {
        lock(&self.seen).push((seq_of(event), self.clock.elapsed()));
        self.clock.advance(self.cost);
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}
