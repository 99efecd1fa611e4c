//! Listener registry and the synchronous dispatch fold.
//!
//! Registration uses a copy-on-write list: writers build a fresh
//! snapshot under a lock while dispatchers on other connection threads
//! keep iterating the snapshot they already cloned. An in-flight
//! dispatch therefore always sees a consistent listener set, and new
//! registrations become visible from the next dispatch.
//!
//! The dispatch itself is a fold over the ordered listener outcomes:
//! listeners run in priority order on the calling thread, the cancel
//! flag aggregates with cancel-wins semantics, `Monitor`-tier writes
//! are discarded, and a failing listener is logged and skipped without
//! disturbing the rest of the chain.

pub mod listener;

use std::borrow::Cow;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::event::{Cancellable, PacketAccess, ReceiveEvent, SendEvent};

pub use listener::{ListenerError, ListenerFilter, ListenerId, PacketListener, Priority};

/// One registered listener with its dispatch metadata.
pub(crate) struct RegisteredListener {
    id: ListenerId,
    name: Cow<'static, str>,
    priority: Priority,
    filter: ListenerFilter,
    listener: Arc<dyn PacketListener>,
}

/// Shared, concurrently accessed collection of packet listeners.
pub struct ListenerRegistry {
    snapshot: RwLock<Arc<Vec<RegisteredListener>>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Registers a listener under a priority tier and filter.
    ///
    /// `name` identifies the listener in failure logs. The registration
    /// is visible starting from the next dispatch, not any currently
    /// running one.
    pub fn register(
        &self,
        listener: Arc<dyn PacketListener>,
        priority: Priority,
        filter: ListenerFilter,
        name: impl Into<Cow<'static, str>>,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = RegisteredListener {
            id,
            name: name.into(),
            priority,
            filter,
            listener,
        };

        let mut guard = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        let mut next: Vec<RegisteredListener> =
            guard.iter().map(RegisteredListener::clone_meta).collect();
        // Stable within a tier: new entries go after existing peers.
        let at = next
            .iter()
            .position(|r| r.priority > priority)
            .unwrap_or(next.len());
        next.insert(at, entry);
        *guard = Arc::new(next);

        tracing::debug!(listener = %id, priority = ?priority, "listener registered");
        id
    }

    /// Removes a registration. Returns whether it was present. An
    /// in-flight dispatch that already took its snapshot still runs the
    /// listener one last time.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut guard = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        if !guard.iter().any(|r| r.id == id) {
            return false;
        }
        let next: Vec<RegisteredListener> = guard
            .iter()
            .filter(|r| r.id != id)
            .map(RegisteredListener::clone_meta)
            .collect();
        *guard = Arc::new(next);
        tracing::debug!(listener = %id, "listener unregistered");
        true
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<RegisteredListener>> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisteredListener {
    fn clone_meta(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            priority: self.priority,
            filter: self.filter,
            listener: Arc::clone(&self.listener),
        }
    }
}

/// Runs one event through a listener snapshot, returning the final
/// cancelled state.
///
/// `call` selects the direction-appropriate callback. The fold is the
/// single place the aggregation rules live:
/// - cancel-wins: once any non-Monitor listener cancels, later clears
///   are overwritten back to cancelled before the next listener runs;
/// - Monitor tier observes the settled flag but cannot change it;
/// - a listener that errors or panics is logged and skipped, and the
///   flag keeps whatever value the successful listeners produced.
fn run_chain<E, F>(listeners: &[RegisteredListener], event: &mut E, call: F) -> bool
where
    E: PacketAccess + Cancellable,
    F: Fn(&dyn PacketListener, &mut E) -> Result<(), ListenerError>,
{
    let phase = event.phase();
    let direction = event.direction();
    let mut cancelled = false;

    for reg in listeners {
        if reg.priority == Priority::Monitor || !reg.filter.matches(phase, direction) {
            continue;
        }
        event.set_cancelled(cancelled);
        invoke(reg, event, &call);
        cancelled = cancelled || event.is_cancelled();
    }

    for reg in listeners {
        if reg.priority != Priority::Monitor || !reg.filter.matches(phase, direction) {
            continue;
        }
        event.set_cancelled(cancelled);
        invoke(reg, event, &call);
        // Monitor writes are discarded on the next iteration / below.
    }

    event.set_cancelled(cancelled);
    cancelled
}

fn invoke<E, F>(reg: &RegisteredListener, event: &mut E, call: &F)
where
    E: PacketAccess + Cancellable,
    F: Fn(&dyn PacketListener, &mut E) -> Result<(), ListenerError>,
{
    match catch_unwind(AssertUnwindSafe(|| call(reg.listener.as_ref(), event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(
                listener = %reg.name,
                packet = %event.envelope().identity(),
                error = %e,
                "listener callback failed"
            );
        }
        Err(panic) => {
            let msg = panic_message(&panic);
            tracing::error!(
                listener = %reg.name,
                packet = %event.envelope().identity(),
                panic = %msg,
                "listener callback panicked"
            );
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

pub(crate) fn dispatch_send(listeners: &[RegisteredListener], event: &mut SendEvent) -> bool {
    run_chain(listeners, event, |listener, ev| listener.on_send(ev))
}

pub(crate) fn dispatch_receive(listeners: &[RegisteredListener], event: &mut ReceiveEvent) -> bool {
    run_chain(listeners, event, |listener, ev| listener.on_receive(ev))
}
