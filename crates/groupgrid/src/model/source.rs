//! The observable item collection the grid is bound to.
//!
//! An [`ItemSource`] is an ordered, in-memory collection with get-by-id and
//! change notifications. The grouping engine consumes only full iteration and
//! the [`SourceSignals::item_set_changed`] notification; everything else is
//! for adapters and the grid facade.

use std::fmt;
use std::sync::Arc;

use groupgrid_core::Signal;

use super::meta::{Entity, MetaClass, PropertyPath};

/// Whether the item source is currently bound to live data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BindingState {
    /// Items are loaded and may be queried.
    #[default]
    Active,
    /// The source is detached; readers should answer empty.
    Inactive,
}

/// Kind of mutation reported by [`SourceSignals::item_set_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The whole collection was replaced, cleared or reordered.
    Refresh,
    /// Items were inserted.
    Add,
    /// Items were removed.
    Remove,
    /// Existing items were replaced with new versions.
    Set,
}

/// Payload of an item set change.
#[derive(Debug, Clone)]
pub struct ItemSetChange<T> {
    /// What happened.
    pub kind: ChangeKind,
    /// The affected items (empty for [`ChangeKind::Refresh`]).
    pub items: Vec<T>,
}

impl<T> ItemSetChange<T> {
    pub fn new(kind: ChangeKind, items: Vec<T>) -> Self {
        Self { kind, items }
    }

    /// A change affecting the whole collection.
    pub fn refresh() -> Self {
        Self::new(ChangeKind::Refresh, Vec::new())
    }
}

/// One key of a flat sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortOrder {
    pub path: PropertyPath,
    pub ascending: bool,
}

impl SortOrder {
    pub fn asc(path: PropertyPath) -> Self {
        Self {
            path,
            ascending: true,
        }
    }

    pub fn desc(path: PropertyPath) -> Self {
        Self {
            path,
            ascending: false,
        }
    }
}

/// Signals emitted by an [`ItemSource`].
pub struct SourceSignals<T: Entity> {
    /// Emitted after items were added, removed, replaced or reordered.
    pub item_set_changed: Signal<ItemSetChange<T>>,

    /// Emitted after a single item was replaced with a new version.
    pub value_changed: Signal<T>,

    /// Emitted after the binding state changed.
    pub state_changed: Signal<BindingState>,
}

impl<T: Entity> Default for SourceSignals<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> SourceSignals<T> {
    /// Creates a new set of source signals.
    pub fn new() -> Self {
        Self {
            item_set_changed: Signal::new(),
            value_changed: Signal::new(),
            state_changed: Signal::new(),
        }
    }
}

impl<T: Entity> fmt::Debug for SourceSignals<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSignals")
            .field("item_set_changed", &self.item_set_changed)
            .field("value_changed", &self.value_changed)
            .field("state_changed", &self.state_changed)
            .finish()
    }
}

/// An observable, ordered, in-memory item collection.
///
/// Implementations must emit [`SourceSignals::item_set_changed`] after every
/// mutation, once the new contents are readable through [`items`](Self::items).
pub trait ItemSource<T: Entity>: Send + Sync {
    /// All items in iteration order.
    fn items(&self) -> Vec<T>;

    /// Looks an item up by id.
    fn item(&self, id: &T::Id) -> Option<T>;

    /// Returns `true` if an item with `id` is present.
    fn contains(&self, id: &T::Id) -> bool {
        self.item(id).is_some()
    }

    /// Number of items.
    fn len(&self) -> usize;

    /// Returns `true` if the source holds no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current binding state.
    fn state(&self) -> BindingState {
        BindingState::Active
    }

    /// Schema class of the items, if known.
    fn meta_class(&self) -> Option<Arc<MetaClass>> {
        None
    }

    /// Reorders the items by `orders` (an empty slice keeps the current
    /// order) and reports a refresh.
    fn sort(&self, orders: &[SortOrder]);

    /// The source's change notifications.
    fn signals(&self) -> &SourceSignals<T>;
}
