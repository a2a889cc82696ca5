//! # Double-buffered event queue.
//!
//! Two FIFO buffers; exactly one is **active** (accepts `enqueue`), the other
//! is empty or **draining**. Each `update` flips them once:
//!
//! ```text
//!            begin_drain()
//!   ┌──────────┐  flip   ┌──────────┐
//!   │ active 0 │ ──────► │ draining │ ──pop_front──► deliver
//!   └──────────┘         └──────────┘
//!   ┌──────────┐         ┌──────────┐
//!   │    1     │ ──────► │ active 1 │ ◄── enqueue (also from listeners)
//!   └──────────┘ cleared └──────────┘
//!
//!   budget elapsed: leftovers of the draining buffer are pushed to the
//!   FRONT of the active buffer, keeping their order.
//! ```
//!
//! ## Rules
//! - A drain pass only sees the point-in-time snapshot taken by `begin_drain`;
//!   events enqueued while it runs wait for the next pass.
//! - `abort` only touches the active buffer.
//! - Leftovers run ahead of events queued during the interrupted pass.
//!
//! The queue does no routing of its own. [`Dispatcher`](crate::Dispatcher)
//! decides what may be enqueued and how drained events are delivered.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use crate::clock::Clock;
use crate::events::{EventRef, EventType};

/// Outcome of one `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// The snapshot was delivered completely.
    Flushed {
        /// Events of this pass that reached at least one listener.
        delivered: usize,
    },
    /// The time budget ran out; the rest moves to the next pass.
    Partial {
        /// Events of this pass that reached at least one listener.
        delivered: usize,
        /// Events carried over to the front of the active buffer.
        carried: usize,
    },
}

impl Drain {
    /// `true` when nothing was carried over.
    #[inline]
    pub fn is_flushed(&self) -> bool {
        matches!(self, Drain::Flushed { .. })
    }

    /// Events that reached at least one listener in this pass.
    ///
    /// Events popped without invoking anybody (already handled, or every
    /// listener of the type gone) are consumed but not counted.
    #[inline]
    pub fn delivered(&self) -> usize {
        match *self {
            Drain::Flushed { delivered } | Drain::Partial { delivered, .. } => delivered,
        }
    }

    /// Events carried over (0 when flushed).
    #[inline]
    pub fn carried(&self) -> usize {
        match *self {
            Drain::Flushed { .. } => 0,
            Drain::Partial { carried, .. } => carried,
        }
    }
}

/// Two generation buffers with an active index.
#[derive(Debug, Default)]
pub struct EventQueue {
    buffers: [VecDeque<EventRef>; 2],
    active: usize,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index (0 or 1) of the buffer accepting new events.
    #[inline]
    pub fn active_index(&self) -> usize {
        self.active
    }

    #[inline]
    fn draining(&self) -> usize {
        1 - self.active
    }

    /// Appends `event` to the active buffer.
    pub fn enqueue(&mut self, event: EventRef) {
        self.buffers[self.active].push_back(event);
    }

    /// Flips the buffers and returns the index of the one to drain.
    ///
    /// The new active buffer is cleared so a pass never mixes with leftovers
    /// of older generations.
    pub fn begin_drain(&mut self) -> usize {
        let d = self.active;
        self.active = self.draining();
        self.buffers[self.active].clear();
        d
    }

    /// Takes the next event of the draining buffer.
    pub fn pop_draining(&mut self) -> Option<EventRef> {
        let d = self.draining();
        self.buffers[d].pop_front()
    }

    /// Events still waiting in the draining buffer.
    #[inline]
    pub fn draining_len(&self) -> usize {
        self.buffers[self.draining()].len()
    }

    /// Moves what is left of the draining buffer to the front of the active
    /// one, preserving order. Returns how many events moved.
    pub fn requeue_leftovers(&mut self) -> usize {
        let d = self.draining();
        let active = self.active;
        let mut moved = 0;
        while let Some(event) = self.buffers[d].pop_back() {
            self.buffers[active].push_front(event);
            moved += 1;
        }
        moved
    }

    /// Removes events of `event_type` from the active buffer.
    ///
    /// Removes the first match, or every match when `all_of_type` is set.
    /// Returns how many were removed.
    pub fn abort(&mut self, event_type: EventType, all_of_type: bool) -> usize {
        let buf = &mut self.buffers[self.active];
        if all_of_type {
            let before = buf.len();
            buf.retain(|e| e.event_type() != event_type);
            before - buf.len()
        } else {
            match buf.iter().position(|e| e.event_type() == event_type) {
                Some(i) => usize::from(buf.remove(i).is_some()),
                None => 0,
            }
        }
    }

    /// Events waiting in the active buffer.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buffers[self.active].len()
    }

    /// `true` when both buffers are empty.
    pub fn is_empty(&self) -> bool {
        self.buffers.iter().all(VecDeque::is_empty)
    }
}

/// Delivers the draining buffer until it is empty or `deadline` passes.
///
/// The queue is only borrowed around each pop, so `deliver` may enqueue or
/// abort through the same `RefCell`. The deadline is checked before every
/// event: a deadline that already passed delivers nothing. `deliver` returns
/// whether the event reached a listener.
pub(crate) fn drain<F>(
    queue: &RefCell<EventQueue>,
    deadline: Option<Duration>,
    clock: &dyn Clock,
    mut deliver: F,
) -> Drain
where
    F: FnMut(&EventRef) -> bool,
{
    let mut delivered = 0;
    loop {
        if queue.borrow().draining_len() == 0 {
            return Drain::Flushed { delivered };
        }
        if deadline.is_some_and(|d| clock.elapsed() >= d) {
            break;
        }
        let Some(event) = queue.borrow_mut().pop_draining() else {
            return Drain::Flushed { delivered };
        };
        if deliver(&event) {
            delivered += 1;
        }
    }
    let carried = queue.borrow_mut().requeue_leftovers();
    Drain::Partial { delivered, carried }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::testing::{Ping, Pong};

    fn seqs(q: &mut EventQueue) -> Vec<u32> {
        let mut out = Vec::new();
        q.begin_drain();
        while let Some(ev) = q.pop_draining() {
            if let Some(p) = ev.downcast_ref::<Ping>() {
                out.push(p.seq);
            }
        }
        out
    }

    #[test]
    fn begin_drain_flips_and_clears() {
        let mut q = EventQueue::new();
        assert_eq!(q.active_index(), 0);
        q.enqueue(Ping::new(1));
        q.enqueue(Ping::new(2));

        assert_eq!(q.begin_drain(), 0);
        assert_eq!(q.active_index(), 1);
        assert_eq!(q.pending(), 0);
        assert_eq!(q.draining_len(), 2);

        // Enqueues during a drain land in the new active buffer.
        q.enqueue(Ping::new(3));
        assert_eq!(q.draining_len(), 2);
        assert_eq!(q.pending(), 1);
    }

    #[test]
    fn leftovers_go_to_the_front_in_order() {
        let mut q = EventQueue::new();
        for i in 1..=4 {
            q.enqueue(Ping::new(i));
        }
        q.begin_drain();
        assert!(q.pop_draining().is_some());
        q.enqueue(Ping::new(10));

        assert_eq!(q.requeue_leftovers(), 3);
        assert_eq!(q.draining_len(), 0);
        assert_eq!(seqs(&mut q), vec![2, 3, 4, 10]);
        assert!(q.is_empty());
    }

    #[test]
    fn abort_first_or_all() {
        let mut q = EventQueue::new();
        q.enqueue(Ping::new(1));
        q.enqueue(Pong::new(2));
        q.enqueue(Ping::new(3));
        q.enqueue(Ping::new(4));

        assert_eq!(q.abort(Ping::TYPE, false), 1);
        assert_eq!(q.pending(), 3);
        assert_eq!(q.abort(Ping::TYPE, true), 2);
        assert_eq!(q.pending(), 1);
        assert_eq!(q.abort(Ping::TYPE, true), 0);
        assert_eq!(q.abort(Ping::TYPE, false), 0);
    }

    #[test]
    fn abort_ignores_the_draining_buffer() {
        let mut q = EventQueue::new();
        q.enqueue(Ping::new(1));
        q.begin_drain();
        assert_eq!(q.abort(Ping::TYPE, true), 0);
        assert_eq!(q.draining_len(), 1);
    }

    #[test]
    fn drain_flushes_without_deadline() {
        let queue = RefCell::new(EventQueue::new());
        let clock = ManualClock::new();
        for i in 1..=3 {
            queue.borrow_mut().enqueue(Ping::new(i));
        }
        queue.borrow_mut().begin_drain();

        let mut seen = Vec::new();
        let out = drain(&queue, None, &clock, |ev| {
            seen.push(ev.downcast_ref::<Ping>().map_or(0, |p| p.seq));
            true
        });
        assert_eq!(out, Drain::Flushed { delivered: 3 });
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn drain_stops_at_deadline_and_carries_the_rest() {
        let queue = RefCell::new(EventQueue::new());
        let clock = ManualClock::new();
        for i in 1..=3 {
            queue.borrow_mut().enqueue(Ping::new(i));
        }
        queue.borrow_mut().begin_drain();

        let deadline = Some(Duration::from_millis(5));
        let out = drain(&queue, deadline, &clock, |_ev| {
            clock.advance(Duration::from_millis(10));
            true
        });
        assert_eq!(out, Drain::Partial { delivered: 1, carried: 2 });
        assert!(!out.is_flushed());
        assert_eq!(queue.borrow().pending(), 2);
    }

    #[test]
    fn elapsed_deadline_delivers_nothing() {
        let queue = RefCell::new(EventQueue::new());
        let clock = ManualClock::starting_at(Duration::from_millis(3));
        queue.borrow_mut().enqueue(Ping::new(1));
        queue.borrow_mut().begin_drain();

        let out = drain(&queue, Some(Duration::from_millis(3)), &clock, |_ev| {
            panic!("nothing should be delivered")
        });
        assert_eq!(out, Drain::Partial { delivered: 0, carried: 1 });
    }

    #[test]
    fn empty_snapshot_is_flushed_even_past_deadline() {
        let queue = RefCell::new(EventQueue::new());
        let clock = ManualClock::starting_at(Duration::from_secs(1));
        queue.borrow_mut().begin_drain();

        let out = drain(&queue, Some(Duration::ZERO), &clock, |_ev| true);
        assert_eq!(out, Drain::Flushed { delivered: 0 });
        assert_eq!(out.carried(), 0);
    }

    #[test]
    fn deliver_may_enqueue_into_the_same_queue() {
        let queue = RefCell::new(EventQueue::new());
        let clock = ManualClock::new();
        queue.borrow_mut().enqueue(Ping::new(1));
        queue.borrow_mut().begin_drain();

        let out = drain(&queue, None, &clock, |_ev| {
            queue.borrow_mut().enqueue(Ping::new(2));
            true
        });
        assert_eq!(out.delivered(), 1);
        assert_eq!(queue.borrow().pending(), 1);
    }

    #[test]
    fn unreceived_events_are_consumed_but_not_counted() {
        let queue = RefCell::new(EventQueue::new());
        let clock = ManualClock::new();
        for i in 1..=4 {
            queue.borrow_mut().enqueue(Ping::new(i));
        }
        queue.borrow_mut().begin_drain();

        let out = drain(&queue, None, &clock, |ev| {
            ev.downcast_ref::<Ping>().is_some_and(|p| p.seq % 2 == 0)
        });
        assert_eq!(out, Drain::Flushed { delivered: 2 });
        assert_eq!(queue.borrow().draining_len(), 0);
        assert!(queue.borrow().is_empty());
    }
}
