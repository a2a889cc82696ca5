//! # Process-wide dispatcher slot.
//!
//! A discovery convenience for top-level wiring: one dispatcher at a time may
//! be designated "global". Pass dispatchers explicitly where you can; use the
//! slot where a collaborator (typically a listener) has no other way back.
//!
//! ```text
//!             SLOT (static Mutex)                 LOCAL (thread_local, owner thread)
//!   ┌───────────────────────────────────┐       ┌──────────────────────────┐
//!   │ owner: ThreadId                   │       │ Weak<Dispatcher>          │
//!   │ name:  String                     │       └──────────────────────────┘
//!   │ threaded: Weak<ThreadSafeRegistry>│               │
//!   │ addr                              │         get() on owner thread
//!   └───────────────────────────────────┘
//!            │
//!      threaded() from any thread
//! ```
//!
//! ## Rules
//! - Designating a second live dispatcher fails with `GlobalAlreadySet`;
//!   re-designating the same one is a no-op.
//! - Dropping the designated dispatcher vacates the slot.
//! - [`get`] only answers on the thread that owns the dispatcher.

use std::cell::RefCell;
use std::rc::{Rc, Weak as RcWeak};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

use crate::core::Dispatcher;
use crate::error::DispatchError;
use crate::registry::ThreadSafeRegistry;

struct GlobalSlot {
    owner: ThreadId,
    name: String,
    threaded: Weak<ThreadSafeRegistry>,
    addr: usize,
}

static SLOT: Mutex<Option<GlobalSlot>> = Mutex::new(None);

thread_local! {
    static LOCAL: RefCell<Option<RcWeak<Dispatcher>>> = const { RefCell::new(None) };
}

fn slot() -> MutexGuard<'static, Option<GlobalSlot>> {
    SLOT.lock().unwrap_or_else(PoisonError::into_inner)
}

fn addr_of(dispatcher: &Dispatcher) -> usize {
    std::ptr::from_ref(dispatcher) as usize
}

/// Designates `dispatcher` as the global one.
pub fn set(dispatcher: &Rc<Dispatcher>) -> Result<(), DispatchError> {
    let addr = addr_of(dispatcher);
    let mut guard = slot();
    if let Some(current) = guard.as_ref() {
        if current.addr == addr {
            return Ok(());
        }
        tracing::warn!(
            current = %current.name,
            requested = dispatcher.name(),
            "global dispatcher already designated"
        );
        return Err(DispatchError::GlobalAlreadySet {
            current: current.name.clone(),
        });
    }
    *guard = Some(GlobalSlot {
        owner: thread::current().id(),
        name: dispatcher.name().to_owned(),
        threaded: Arc::downgrade(dispatcher.threaded()),
        addr,
    });
    drop(guard);

    LOCAL.with(|local| *local.borrow_mut() = Some(Rc::downgrade(dispatcher)));
    tracing::debug!(dispatcher = dispatcher.name(), "designated global dispatcher");
    Ok(())
}

/// The global dispatcher, when called on the thread that owns it.
pub fn get() -> Option<Rc<Dispatcher>> {
    let addr = {
        let guard = slot();
        let current = guard.as_ref()?;
        if current.owner != thread::current().id() {
            return None;
        }
        current.addr
    };
    let dispatcher = LOCAL.with(|local| local.borrow().as_ref().and_then(RcWeak::upgrade))?;
    (addr_of(&dispatcher) == addr).then_some(dispatcher)
}

/// The global dispatcher's thread-safe registry, from any thread.
pub fn threaded() -> Option<Arc<ThreadSafeRegistry>> {
    slot().as_ref().and_then(|s| s.threaded.upgrade())
}

/// Name of the global dispatcher, if one is designated.
pub fn name() -> Option<String> {
    slot().as_ref().map(|s| s.name.clone())
}

pub fn is_set() -> bool {
    slot().is_some()
}

/// Vacates the slot. Returns whether a dispatcher was designated.
pub fn clear() -> bool {
    let Some(previous) = slot().take() else {
        return false;
    };
    if previous.owner == thread::current().id() {
        let _ = LOCAL.try_with(|local| local.borrow_mut().take());
    }
    tracing::debug!(dispatcher = %previous.name, "global dispatcher cleared");
    true
}

pub(crate) fn is_designated(dispatcher: &Dispatcher) -> bool {
    slot().as_ref().is_some_and(|s| s.addr == addr_of(dispatcher))
}

/// Vacates the slot if `dispatcher` holds it. Called from its `Drop`.
pub(crate) fn release(dispatcher: &Dispatcher) {
    let addr = addr_of(dispatcher);
    let mut guard = slot();
    if guard.as_ref().is_some_and(|s| s.addr == addr) {
        *guard = None;
        drop(guard);
        let _ = LOCAL.try_with(|local| {
            if let Ok(mut local) = local.try_borrow_mut() {
                *local = None;
            }
        });
        tracing::debug!(dispatcher = dispatcher.name(), "global dispatcher dropped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DispatcherConfig;
    use crate::testing::{Ping, Recorder, global_guard};
    use crate::listeners::ListenerHandle;

    #[test]
    fn unset_slot_answers_none() {
        let _g = global_guard();
        assert!(!is_set());
        assert!(get().is_none());
        assert!(threaded().is_none());
        assert!(!clear());
    }

    #[test]
    fn set_get_and_drop() {
        let _g = global_guard();
        let d = Dispatcher::new("main", DispatcherConfig::default());
        set(&d).unwrap();
        set(&d).unwrap();
        assert_eq!(name().as_deref(), Some("main"));

        let found = get().unwrap();
        assert!(Rc::ptr_eq(&found, &d));
        drop(found);

        drop(d);
        assert!(!is_set());
        assert!(get().is_none());
    }

    #[test]
    fn second_dispatcher_is_refused() {
        let _g = global_guard();
        let a = Dispatcher::new("a", DispatcherConfig::default());
        let b = Dispatcher::new("b", DispatcherConfig::default());
        set(&a).unwrap();

        let err = set(&b).unwrap_err();
        assert_eq!(err, DispatchError::GlobalAlreadySet { current: "a".into() });
        assert!(a.is_global());
        assert!(!b.is_global());

        // Dropping the refused one leaves the designation alone.
        drop(b);
        assert!(a.is_global());
        assert!(clear());
        assert!(!a.is_global());
    }

    #[test]
    fn threaded_registry_is_reachable_from_other_threads() {
        let _g = global_guard();
        let d = Dispatcher::new("main", DispatcherConfig::default());
        d.make_global().unwrap();
        let l = Arc::new(Recorder::new());
        d.add_threaded_listener(ListenerHandle::new(&l), Ping::TYPE).unwrap();

        let (local, delivered) = thread::spawn(|| {
            let local = get().is_some();
            let delivered = threaded().map(|r| r.trigger(&Ping::new(5)));
            (local, delivered)
        })
        .join()
        .unwrap();

        assert!(!local);
        assert_eq!(delivered, Some(Ok(true)));
        assert_eq!(l.seen(), vec![5]);
    }

    #[test]
    fn clear_then_redesignate() {
        let _g = global_guard();
        let a = Dispatcher::new("a", DispatcherConfig::default());
        let b = Dispatcher::new("b", DispatcherConfig::default());
        set(&a).unwrap();
        assert!(clear());
        assert!(get().is_none());

        set(&b).unwrap();
        assert!(Rc::ptr_eq(&get().unwrap(), &b));
        drop(a);
        assert!(b.is_global());
        drop(b);
        assert!(!is_set());
    }
}
