//! Change notifications between grid components.
//!
//! The grouping engine, the hierarchical adapter, the data communicator and
//! the aggregation overlay each own derived state. A component publishes
//! through a [`Signal`] and its dependents connect slots to it.
//!
//! Dispatch is direct: slots run on the emitting thread, in connection order,
//! before [`Signal::emit`] returns. When the engine's `group_changed` emission
//! returns, the adapter has already rebuilt its group rows and the overlay its
//! aggregation row.
//!
//! The slot list is snapshotted before any slot runs. A slot may read the
//! emitter, emit again, or connect and disconnect slots; list changes apply
//! from the next emission.
//!
//! ```
//! use groupgrid_core::Signal;
//!
//! let group_changed = Signal::<usize>::new();
//! let id = group_changed.connect(|roots| println!("regrouped into {roots} roots"));
//! group_changed.emit(2);
//! assert!(group_changed.disconnect(id));
//! ```
//!
//! Components that observe each other hold a [`ConnectionGuard`] per
//! connection, so their slots go away with them.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// Handle of one connected slot, for [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

struct Connection<Args> {
    seq: u64,
    slot: Slot<Args>,
}

/// Connected slots. `seq` keeps connection order across reused slot keys.
struct Slots<Args> {
    connections: SlotMap<ConnectionId, Connection<Args>>,
    next_seq: u64,
}

/// A notification with any number of connected slots.
///
/// `Args` is what every slot receives by reference; `()` for bare
/// notifications.
pub struct Signal<Args> {
    slots: Arc<Mutex<Slots<Args>>>,
}

impl<Args: Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slots.lock().connections.len())
            .finish()
    }
}

impl<Args: Send + 'static> Signal<Args> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(Mutex::new(Slots {
                connections: SlotMap::with_key(),
                next_seq: 0,
            })),
        }
    }

    /// Connects `slot`; it runs on every later emission until disconnected.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let mut slots = self.slots.lock();
        let seq = slots.next_seq;
        slots.next_seq += 1;
        slots.connections.insert(Connection {
            seq,
            slot: Arc::new(slot),
        })
    }

    /// Connects a slot on behalf of `owner`, held weakly.
    ///
    /// The slot receives the upgraded owner and is skipped once the owner is
    /// gone, so a component can observe another without keeping itself alive.
    pub fn connect_weak<O, F>(&self, owner: &Weak<O>, slot: F) -> ConnectionId
    where
        O: Send + Sync + 'static,
        F: Fn(&O, &Args) + Send + Sync + 'static,
    {
        let owner = owner.clone();
        self.connect(move |args| {
            if let Some(owner) = owner.upgrade() {
                slot(&owner, args);
            }
        })
    }

    /// Connects `slot` until the returned guard is dropped.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        self.guard(id)
    }

    /// [`connect_weak`](Self::connect_weak), disconnected when the returned
    /// guard is dropped.
    ///
    /// Components keep the guard in a field, so dropping the owner releases
    /// its slot.
    pub fn connect_weak_scoped<O, F>(&self, owner: &Weak<O>, slot: F) -> ConnectionGuard<Args>
    where
        O: Send + Sync + 'static,
        F: Fn(&O, &Args) + Send + Sync + 'static,
    {
        let id = self.connect_weak(owner, slot);
        self.guard(id)
    }

    fn guard(&self, id: ConnectionId) -> ConnectionGuard<Args> {
        ConnectionGuard {
            slots: Arc::downgrade(&self.slots),
            id,
        }
    }

    /// Returns `false` if `id` was not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.slots.lock().connections.remove(id).is_some()
    }

    pub fn disconnect_all(&self) {
        self.slots.lock().connections.clear();
    }

    pub fn connection_count(&self) -> usize {
        self.slots.lock().connections.len()
    }

    /// Runs every connected slot with `args`, in connection order.
    pub fn emit(&self, args: Args) {
        let mut connections: Vec<(u64, Slot<Args>)> = self
            .slots
            .lock()
            .connections
            .values()
            .map(|connection| (connection.seq, connection.slot.clone()))
            .collect();
        if connections.is_empty() {
            return;
        }
        connections.sort_unstable_by_key(|(seq, _)| *seq);

        tracing::trace!(target: targets::SIGNAL, slots = connections.len(), "emit");
        for (_, slot) in connections {
            slot(&args);
        }
    }
}

/// Disconnects its slot when dropped.
///
/// Created by [`Signal::connect_scoped`] and [`Signal::connect_weak_scoped`].
/// The guard does not keep the signal alive; once the signal is gone,
/// dropping the guard does nothing.
///
/// ```
/// use groupgrid_core::Signal;
///
/// let refreshed = Signal::<()>::new();
/// {
///     let _guard = refreshed.connect_scoped(|_| {});
///     assert_eq!(refreshed.connection_count(), 1);
/// }
/// assert_eq!(refreshed.connection_count(), 0);
/// ```
#[must_use = "dropping the guard disconnects the slot"]
pub struct ConnectionGuard<Args> {
    slots: Weak<Mutex<Slots<Args>>>,
    id: ConnectionId,
}

impl<Args> ConnectionGuard<Args> {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Disconnects now; `false` if the signal or the slot was already gone.
    pub fn disconnect(self) -> bool {
        self.release()
    }

    fn release(&self) -> bool {
        match self.slots.upgrade() {
            Some(slots) => slots.lock().connections.remove(self.id).is_some(),
            None => false,
        }
    }
}

impl<Args> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<Args> fmt::Debug for ConnectionGuard<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("id", &self.id)
            .field("connected", &(self.slots.strong_count() > 0))
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);
static_assertions::assert_impl_all!(ConnectionGuard<()>: Send, Sync);
