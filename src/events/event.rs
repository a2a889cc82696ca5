//! # Events published through the dispatcher.
//!
//! An event is a record that knows its own [`EventType`], carries a fixed
//! creation timestamp and a one-way `handled` flag. Both live in an
//! [`EventMeta`] that every concrete event embeds and exposes via
//! [`Event::meta`].
//!
//! Events travel as [`EventRef`] (`Arc<dyn Event>`): every listener in one
//! delivery pass sees the same instance, and the event is dropped when the
//! last reference goes away.
//!
//! ## Example
//! ```rust
//! use std::any::Any;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use framevisor::{Event, EventMeta, EventRef, EventType};
//!
//! struct Resized { meta: EventMeta, width: u32 }
//!
//! impl Resized {
//!     const TYPE: EventType = EventType::from_name("window_resized");
//! }
//!
//! impl Event for Resized {
//!     fn event_type(&self) -> EventType { Self::TYPE }
//!     fn name(&self) -> &'static str { "Resized" }
//!     fn meta(&self) -> &EventMeta { &self.meta }
//!     fn duplicate(&self) -> EventRef {
//!         Arc::new(Resized { meta: EventMeta::new(self.created_at()), width: self.width })
//!     }
//!     fn as_any(&self) -> &dyn Any { self }
//! }
//!
//! let ev: EventRef = Arc::new(Resized { meta: EventMeta::new(Duration::from_millis(5)), width: 640 });
//! assert!(!ev.is_handled());
//! ev.mark_handled();
//! assert!(ev.is_handled());
//! assert_eq!(ev.downcast_ref::<Resized>().map(|r| r.width), Some(640));
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::DispatchError;

/// Shared reference to a published event.
pub type EventRef = Arc<dyn Event>;

/// Stable identifier of an event kind.
///
/// Derived once per kind, usually from a name with [`EventType::from_name`]
/// in a `const`, so it is identical for every instance of that kind.
/// The raw value `0` is reserved as [`EventType::INVALID`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventType(u64);

impl EventType {
    /// Reserved id; events reporting it are rejected by the dispatcher.
    pub const INVALID: EventType = EventType(0);

    /// Hashes `name` (FNV-1a, 64 bit) into an event type.
    ///
    /// Never yields [`EventType::INVALID`].
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            i += 1;
        }
        if hash == 0 {
            hash = 1;
        }
        EventType(hash)
    }

    /// Wraps a raw id chosen by the caller.
    pub const fn from_raw(raw: u64) -> Self {
        EventType(raw)
    }

    /// Returns the raw id.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// `false` only for [`EventType::INVALID`].
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Timestamp and handled flag shared by every event.
///
/// `handled` only ever moves from `false` to `true`; a fresh event (see
/// [`Event::duplicate`]) is the only way back to `false`.
#[derive(Debug, Default)]
pub struct EventMeta {
    created_at: Duration,
    handled: AtomicBool,
}

impl EventMeta {
    /// Creates metadata stamped with `created_at` (elapsed time of the
    /// producer's clock).
    pub fn new(created_at: Duration) -> Self {
        Self {
            created_at,
            handled: AtomicBool::new(false),
        }
    }

    /// Creation timestamp.
    #[inline]
    pub fn created_at(&self) -> Duration {
        self.created_at
    }

    /// Whether some listener has marked the event handled.
    #[inline]
    pub fn is_handled(&self) -> bool {
        self.handled.load(Ordering::Acquire)
    }

    /// Marks the event handled.
    #[inline]
    pub fn mark_handled(&self) {
        self.handled.store(true, Ordering::Release);
    }
}

/// A concrete event kind.
///
/// Implementors embed an [`EventMeta`] and return it from [`Event::meta`];
/// the handled/timestamp accessors are provided on top of it.
pub trait Event: Any + Send + Sync {
    /// Stable identifier of this kind. Must not change after construction.
    fn event_type(&self) -> EventType;

    /// Human-readable name for diagnostics. Must not be empty.
    fn name(&self) -> &'static str;

    /// Shared timestamp/handled state.
    fn meta(&self) -> &EventMeta;

    /// Builds a fresh, unhandled copy carrying the same payload and timestamp.
    fn duplicate(&self) -> EventRef;

    /// Upcast used by [`downcast_ref`](trait.Event.html#method.downcast_ref).
    fn as_any(&self) -> &dyn Any;

    /// Writes the payload into `out`. The format is owned by the event kind.
    fn serialize(&self, out: &mut Vec<u8>) -> Result<(), DispatchError> {
        let _ = out;
        Err(DispatchError::Codec {
            event: self.name(),
            reason: "serialization not supported".into(),
        })
    }

    /// Restores the payload from `input`, before the event is shared.
    fn deserialize(&mut self, input: &[u8]) -> Result<(), DispatchError> {
        let _ = input;
        Err(DispatchError::Codec {
            event: self.name(),
            reason: "deserialization not supported".into(),
        })
    }

    #[inline]
    fn is_handled(&self) -> bool {
        self.meta().is_handled()
    }

    #[inline]
    fn mark_handled(&self) {
        self.meta().mark_handled();
    }

    #[inline]
    fn created_at(&self) -> Duration {
        self.meta().created_at()
    }
}

impl dyn Event {
    /// Borrows the concrete event if it is a `T`.
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name())
            .field("event_type", &self.event_type())
            .field("created_at", &self.created_at())
            .field("handled", &self.is_handled())
            .finish()
    }
}

/// Rejects events the dispatcher cannot route.
pub(crate) fn validate(event: &dyn Event) -> Result<(), DispatchError> {
    let reason = if !event.event_type().is_valid() {
        "reserved event type id"
    } else if event.name().is_empty() {
        "empty event name"
    } else {
        return Ok(());
    };
    tracing::error!(event = event.name(), reason, "rejecting invalid event");
    Err(DispatchError::InvalidEvent {
        event: event.name(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Broken, Nameless, Ping};

    #[test]
    fn type_ids_are_stable_per_kind() {
        const A: EventType = EventType::from_name("ping");
        assert_eq!(A, EventType::from_name("ping"));
        assert_ne!(A, EventType::from_name("pong"));
        assert!(A.is_valid());
        assert!(!EventType::INVALID.is_valid());
        assert!(!EventType::from_raw(0).is_valid());
    }

    #[test]
    fn handled_moves_one_way() {
        let ev = Ping::new(1);
        assert!(!ev.is_handled());
        ev.mark_handled();
        ev.mark_handled();
        assert!(ev.is_handled());

        let copy = ev.duplicate();
        assert!(!copy.is_handled());
        assert_eq!(copy.event_type(), Ping::TYPE);
        assert_eq!(copy.created_at(), ev.created_at());
        assert_eq!(copy.downcast_ref::<Ping>().map(|p| p.seq), Some(1));
    }

    #[test]
    fn downcast_rejects_other_kinds() {
        let ev = Ping::new(7);
        assert!(ev.downcast_ref::<Broken>().is_none());
    }

    #[test]
    fn default_codec_reports_unsupported() {
        let ev = Ping::new(1);
        let mut out = Vec::new();
        let err = ev.serialize(&mut out).unwrap_err();
        assert_eq!(err.as_label(), "codec");
    }

    #[test]
    fn validate_rejects_malformed_events() {
        assert!(validate(Ping::new(1).as_ref()).is_ok());

        let err = validate(&Broken::default()).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidEvent { reason: "reserved event type id", .. }));

        let err = validate(&Nameless::default()).unwrap_err();
        assert!(matches!(err, DispatchError::InvalidEvent { reason: "empty event name", .. }));
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(EventType::from_raw(0xff).to_string(), "0x00000000000000ff");
    }
}
