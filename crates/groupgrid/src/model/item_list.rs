//! In-memory item source.
//!
//! `ItemList<T>` is the default [`ItemSource`]: a vector of items behind a
//! lock, reporting every mutation through [`SourceSignals`].

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use groupgrid_core::Property;
use groupgrid_core::logging::targets;
use parking_lot::RwLock;

use super::meta::{Entity, MetaClass};
use super::source::{BindingState, ChangeKind, ItemSetChange, ItemSource, SortOrder, SourceSignals};
use super::value::compare_values;

/// An observable list of items.
///
/// # Example
///
/// ```ignore
/// let list = ItemList::new(employees).with_meta_class(employee_class);
/// list.signals().item_set_changed.connect(|change| println!("{:?}", change.kind));
/// list.remove(&2);
/// ```
pub struct ItemList<T: Entity> {
    items: RwLock<Vec<T>>,
    meta_class: Option<Arc<MetaClass>>,
    state: Property<BindingState>,
    signals: SourceSignals<T>,
}

impl<T: Entity> ItemList<T> {
    /// Creates a list holding `items`.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            meta_class: None,
            state: Property::new(BindingState::Active),
            signals: SourceSignals::new(),
        }
    }

    /// Creates an empty list.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Declares the schema class of the items.
    pub fn with_meta_class(mut self, class: Arc<MetaClass>) -> Self {
        self.meta_class = Some(class);
        self
    }

    /// Appends an item to the end of the list.
    pub fn push(&self, item: T) {
        self.items.write().push(item.clone());
        self.notify(ChangeKind::Add, vec![item]);
    }

    /// Inserts an item at `index`, or at the end if `index` is past it.
    pub fn insert(&self, index: usize, item: T) {
        {
            let mut items = self.items.write();
            let index = index.min(items.len());
            items.insert(index, item.clone());
        }
        self.notify(ChangeKind::Add, vec![item]);
    }

    /// Removes the item with `id`, returning it if it was present.
    pub fn remove(&self, id: &T::Id) -> Option<T> {
        let removed = {
            let mut items = self.items.write();
            let position = items.iter().position(|item| item.id() == *id)?;
            items.remove(position)
        };
        self.notify(ChangeKind::Remove, vec![removed.clone()]);
        Some(removed)
    }

    /// Replaces the stored item that has the same id as `item`.
    ///
    /// Returns `false` if no such item exists.
    pub fn update(&self, item: T) -> bool {
        {
            let mut items = self.items.write();
            let id = item.id();
            match items.iter_mut().find(|existing| existing.id() == id) {
                Some(existing) => *existing = item.clone(),
                None => return false,
            }
        }
        self.signals.value_changed.emit(item.clone());
        self.notify(ChangeKind::Set, vec![item]);
        true
    }

    /// Replaces all items.
    pub fn set_items(&self, items: Vec<T>) {
        *self.items.write() = items;
        self.notify(ChangeKind::Refresh, Vec::new());
    }

    /// Removes all items.
    pub fn clear(&self) {
        self.items.write().clear();
        self.notify(ChangeKind::Refresh, Vec::new());
    }

    /// Changes the binding state.
    pub fn set_state(&self, state: BindingState) {
        if self.state.set(state) {
            tracing::debug!(target: targets::MODEL, ?state, "item list binding state changed");
            self.signals.state_changed.emit(state);
            self.notify(ChangeKind::Refresh, Vec::new());
        }
    }

    fn notify(&self, kind: ChangeKind, items: Vec<T>) {
        tracing::trace!(target: targets::MODEL, ?kind, count = items.len(), "item set changed");
        self.signals
            .item_set_changed
            .emit(ItemSetChange::new(kind, items));
    }
}

impl<T: Entity> ItemSource<T> for ItemList<T> {
    fn items(&self) -> Vec<T> {
        self.items.read().clone()
    }

    fn item(&self, id: &T::Id) -> Option<T> {
        self.items.read().iter().find(|item| item.id() == *id).cloned()
    }

    fn contains(&self, id: &T::Id) -> bool {
        self.items.read().iter().any(|item| item.id() == *id)
    }

    fn len(&self) -> usize {
        self.items.read().len()
    }

    fn state(&self) -> BindingState {
        self.state.get()
    }

    fn meta_class(&self) -> Option<Arc<MetaClass>> {
        self.meta_class.clone()
    }

    fn sort(&self, orders: &[SortOrder]) {
        if !orders.is_empty() {
            // Stable, so equal keys keep their relative order.
            self.items.write().sort_by(|a, b| compare_by_orders(a, b, orders));
        }
        self.notify(ChangeKind::Refresh, Vec::new());
    }

    fn signals(&self) -> &SourceSignals<T> {
        &self.signals
    }
}

impl<T: Entity> fmt::Debug for ItemList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemList")
            .field("len", &self.items.read().len())
            .field("state", &self.state.get())
            .finish()
    }
}

fn compare_by_orders<T: Entity>(a: &T, b: &T, orders: &[SortOrder]) -> Ordering {
    for order in orders {
        let ordering = compare_values(&order.path.value_of(a), &order.path.value_of(b));
        let ordering = if order.ascending {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
