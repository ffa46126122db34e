//! Client paging protocol on top of a [`HierarchicalDataProvider`].
//!
//! The client addresses rows by opaque string keys and asks for ranges of one
//! level at a time: the top level via [`GroupDataCommunicator::set_requested_range`]
//! and the children of an expanded row via
//! [`GroupDataCommunicator::set_parent_requested_range`]. Every answer is a
//! list of [`RangeUpdate`]s; the first one is the requested range, the rest
//! are children pre-fetched for expanded rows near the top of the viewport.
//!
//! # Eager Fetch
//!
//! After a range is served its rows are queued as potential parents. While
//! the look-ahead budget lasts, queued rows are taken front to front; an
//! expanded one gets its first `max(estimate, page_size)` children served in
//! the same answer, and those children are queued ahead of the remaining
//! siblings. The budget is reset once per [`FetchContext::request_id`].

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Weak};

use groupgrid_core::logging::{span_names, targets};
use groupgrid_core::{ConnectionGuard, PerfSpan, Signal};
use parking_lot::{Mutex, RwLock};

use crate::model::Entity;

use super::provider::HierarchicalDataProvider;
use super::query::{HierarchicalQuery, Query};

/// Default number of rows served per range.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Approximate number of rows visible in the client viewport.
pub const EAGER_FETCH_VIEWPORT_SIZE_ESTIMATE: usize = 40;

/// Tunables of a [`GroupDataCommunicator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommunicatorSettings {
    pub page_size: usize,
    pub eager_fetch: bool,
    pub eager_fetch_viewport_estimate: usize,
}

impl Default for CommunicatorSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            eager_fetch: true,
            eager_fetch_viewport_estimate: EAGER_FETCH_VIEWPORT_SIZE_ESTIMATE,
        }
    }
}

/// Identity of the client round trip a range request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchContext {
    pub request_id: u64,
}

impl FetchContext {
    pub fn new(request_id: u64) -> Self {
        Self { request_id }
    }
}

/// One row as sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowData {
    pub key: String,
    pub has_children: bool,
    pub expanded: bool,
}

/// Rows of one level served for one range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeUpdate {
    /// Key of the parent row, `None` for the top level.
    pub parent_key: Option<String>,
    pub start: usize,
    /// Total number of rows on this level.
    pub level_size: usize,
    pub rows: Vec<RowData>,
}

/// Assigns stable string keys to rows.
///
/// A row keeps its key until the mapper is cleared, so the client can refer
/// back to rows it was sent.
pub struct KeyMapper<T: Entity> {
    keys: HashMap<T::Id, String>,
    items: HashMap<String, T>,
    next_key: u64,
}

impl<T: Entity> Default for KeyMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> KeyMapper<T> {
    pub fn new() -> Self {
        Self {
            keys: HashMap::new(),
            items: HashMap::new(),
            next_key: 0,
        }
    }

    /// Returns the key of `item`, assigning a new one if needed.
    pub fn key(&mut self, item: &T) -> String {
        let id = item.id();
        if let Some(key) = self.keys.get(&id) {
            // Keep the latest copy of the row.
            self.items.insert(key.clone(), item.clone());
            return key.clone();
        }

        self.next_key += 1;
        let key = self.next_key.to_string();
        self.keys.insert(id, key.clone());
        self.items.insert(key.clone(), item.clone());
        key
    }

    /// The row a key was assigned to.
    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.get(key)
    }

    /// Returns `true` if `item` has a key.
    pub fn has(&self, item: &T) -> bool {
        self.keys.contains_key(&item.id())
    }

    /// Forgets the key of `item`.
    pub fn remove(&mut self, item: &T) -> Option<String> {
        let key = self.keys.remove(&item.id())?;
        self.items.remove(&key);
        Some(key)
    }

    /// Forgets every key. Keys are never reused.
    pub fn remove_all(&mut self) {
        self.keys.clear();
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

struct EagerFetch {
    remaining: usize,
    last_request: Option<u64>,
    queued_parents: VecDeque<String>,
}

/// Signals emitted by a [`GroupDataCommunicator`].
pub struct CommunicatorSignals<T: Entity> {
    /// Emitted when rows were expanded.
    /// Args: the rows that changed state
    pub expanded: Signal<Vec<T>>,

    /// Emitted when rows were collapsed.
    /// Args: the rows that changed state
    pub collapsed: Signal<Vec<T>>,

    /// Emitted after the provider refreshed; all keys sent so far are void
    /// and the client has to request its ranges again.
    pub reset: Signal<()>,
}

impl<T: Entity> CommunicatorSignals<T> {
    fn new() -> Self {
        Self {
            expanded: Signal::new(),
            collapsed: Signal::new(),
            reset: Signal::new(),
        }
    }
}

/// Serves client range requests and tracks expand/collapse state.
pub struct GroupDataCommunicator<T: Entity> {
    provider: Arc<dyn HierarchicalDataProvider<T>>,
    settings: RwLock<CommunicatorSettings>,
    key_mapper: Mutex<KeyMapper<T>>,
    expanded: RwLock<HashMap<T::Id, T>>,
    eager: Mutex<EagerFetch>,
    signals: CommunicatorSignals<T>,
    _refreshed: ConnectionGuard<()>,
}

impl<T: Entity> GroupDataCommunicator<T> {
    /// Creates a communicator with default settings.
    pub fn new(provider: Arc<dyn HierarchicalDataProvider<T>>) -> Arc<Self> {
        Self::with_settings(provider, CommunicatorSettings::default())
    }

    pub fn with_settings(
        provider: Arc<dyn HierarchicalDataProvider<T>>,
        settings: CommunicatorSettings,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let refreshed = provider
                .refreshed()
                .connect_weak_scoped(weak, |communicator: &Self, _| communicator.on_refreshed());

            Self {
                provider,
                settings: RwLock::new(settings),
                key_mapper: Mutex::new(KeyMapper::new()),
                expanded: RwLock::new(HashMap::new()),
                eager: Mutex::new(EagerFetch {
                    remaining: 0,
                    last_request: None,
                    queued_parents: VecDeque::new(),
                }),
                signals: CommunicatorSignals::new(),
                _refreshed: refreshed,
            }
        })
    }

    pub fn provider(&self) -> &Arc<dyn HierarchicalDataProvider<T>> {
        &self.provider
    }

    pub fn signals(&self) -> &CommunicatorSignals<T> {
        &self.signals
    }

    pub fn settings(&self) -> CommunicatorSettings {
        *self.settings.read()
    }

    pub fn set_settings(&self, settings: CommunicatorSettings) {
        *self.settings.write() = settings;
    }

    pub fn page_size(&self) -> usize {
        self.settings.read().page_size
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.settings.write().page_size = page_size;
    }

    /// The key of `item`, assigning one if needed.
    pub fn key_of(&self, item: &T) -> String {
        self.key_mapper.lock().key(item)
    }

    /// The row a key was sent for.
    pub fn item_by_key(&self, key: &str) -> Option<T> {
        self.key_mapper.lock().get(key).cloned()
    }

    /// Returns `true` if `item` is expanded.
    pub fn is_expanded(&self, item: &T) -> bool {
        self.expanded.read().contains_key(&item.id())
    }

    /// Returns `true` if any row is expanded.
    pub fn has_expanded_items(&self) -> bool {
        !self.expanded.read().is_empty()
    }

    /// The expanded rows, in no particular order.
    pub fn expanded_items(&self) -> Vec<T> {
        self.expanded.read().values().cloned().collect()
    }

    /// Expands `items`, returning the rows that were collapsed before.
    ///
    /// Rows without children are ignored.
    pub fn expand(&self, items: &[T]) -> Vec<T> {
        let changed: Vec<T> = {
            let mut expanded = self.expanded.write();
            items
                .iter()
                .filter(|item| self.provider.has_children(item))
                .filter(|item| expanded.insert(item.id(), (*item).clone()).is_none())
                .cloned()
                .collect()
        };

        if !changed.is_empty() {
            tracing::debug!(target: targets::HIERARCHY, count = changed.len(), "rows expanded");
            self.signals.expanded.emit(changed.clone());
        }
        changed
    }

    /// Collapses `items`, returning the rows that were expanded before.
    pub fn collapse(&self, items: &[T]) -> Vec<T> {
        let changed: Vec<T> = {
            let mut expanded = self.expanded.write();
            items
                .iter()
                .filter_map(|item| expanded.remove(&item.id()))
                .collect()
        };

        if !changed.is_empty() {
            tracing::debug!(target: targets::HIERARCHY, count = changed.len(), "rows collapsed");
            self.signals.collapsed.emit(changed.clone());
        }
        changed
    }

    /// Applies a client expand/collapse toggle.
    ///
    /// Returns `true` if the key was known and the state changed.
    pub fn update_expanded_state(&self, key: &str, expanded: bool) -> bool {
        let Some(item) = self.item_by_key(key) else {
            tracing::debug!(target: targets::HIERARCHY, key, "expand toggle for unknown key ignored");
            return false;
        };

        let changed = if expanded {
            self.expand(std::slice::from_ref(&item))
        } else {
            self.collapse(std::slice::from_ref(&item))
        };
        !changed.is_empty()
    }

    /// Serves `length` top-level rows starting at `start`.
    pub fn set_requested_range(
        &self,
        ctx: &FetchContext,
        start: usize,
        length: usize,
    ) -> Vec<RangeUpdate> {
        self.serve(ctx, None, start, length)
    }

    /// Serves `length` children of the row with key `parent_key`, starting
    /// at `start`.
    ///
    /// Unknown keys answer nothing; the client is behind a reset.
    pub fn set_parent_requested_range(
        &self,
        ctx: &FetchContext,
        start: usize,
        length: usize,
        parent_key: &str,
    ) -> Vec<RangeUpdate> {
        let Some(parent) = self.item_by_key(parent_key) else {
            tracing::debug!(target: targets::HIERARCHY, parent_key, "range request for unknown parent ignored");
            return Vec::new();
        };
        self.serve(ctx, Some((parent, parent_key.to_string())), start, length)
    }

    fn serve(
        &self,
        ctx: &FetchContext,
        parent: Option<(T, String)>,
        start: usize,
        length: usize,
    ) -> Vec<RangeUpdate> {
        let _span = PerfSpan::new(span_names::RANGE_REQUEST);
        let settings = self.settings();
        self.begin_request(ctx, &settings);

        let first = self.fetch_range(parent, start, length);
        let mut updates = vec![first];
        if !settings.eager_fetch {
            return updates;
        }

        self.enqueue_parents(&updates[0]);
        let child_length = settings
            .eager_fetch_viewport_estimate
            .max(settings.page_size);
        while let Some((parent, key)) = self.next_expanded_parent() {
            let update = self.fetch_range(Some((parent, key)), 0, child_length);
            self.enqueue_parents(&update);
            updates.push(update);
        }

        tracing::trace!(
            target: targets::HIERARCHY,
            request_id = ctx.request_id,
            ranges = updates.len(),
            "range request served"
        );
        updates
    }

    fn begin_request(&self, ctx: &FetchContext, settings: &CommunicatorSettings) {
        let mut eager = self.eager.lock();
        if eager.last_request != Some(ctx.request_id) {
            eager.remaining = settings.eager_fetch_viewport_estimate;
            eager.queued_parents.clear();
            eager.last_request = Some(ctx.request_id);
        }
    }

    fn fetch_range(&self, parent: Option<(T, String)>, start: usize, length: usize) -> RangeUpdate {
        let (parent, parent_key) = match parent {
            Some((item, key)) => (Some(item), Some(key)),
            None => (None, None),
        };
        let level = HierarchicalQuery {
            parent,
            page: Query::all(),
        };
        let level_size = self.provider.child_count(&level);
        let items = self
            .provider
            .fetch_children(&level.with_page(Query::range(start, length)));

        let expanded = self.expanded.read();
        let mut key_mapper = self.key_mapper.lock();
        let rows = items
            .iter()
            .map(|item| RowData {
                key: key_mapper.key(item),
                has_children: self.provider.has_children(item),
                expanded: expanded.contains_key(&item.id()),
            })
            .collect();

        RangeUpdate {
            parent_key,
            start,
            level_size,
            rows,
        }
    }

    fn enqueue_parents(&self, update: &RangeUpdate) {
        let mut eager = self.eager.lock();
        for row in update.rows.iter().rev() {
            eager.queued_parents.push_front(row.key.clone());
        }
    }

    fn next_expanded_parent(&self) -> Option<(T, String)> {
        let mut eager = self.eager.lock();
        while eager.remaining > 0 {
            let key = eager.queued_parents.pop_front()?;
            eager.remaining -= 1;

            let Some(item) = self.item_by_key(&key) else {
                continue;
            };
            if self.is_expanded(&item) {
                return Some((item, key));
            }
        }
        None
    }

    fn on_refreshed(&self) {
        self.key_mapper.lock().remove_all();
        self.eager.lock().queued_parents.clear();

        let dropped = {
            let mut expanded = self.expanded.write();
            let before = expanded.len();
            expanded.retain(|_, item| self.provider.has_children(item));
            before - expanded.len()
        };

        tracing::debug!(target: targets::HIERARCHY, dropped_expanded = dropped, "communicator reset");
        self.signals.reset.emit(());
    }
}

impl<T: Entity> fmt::Debug for GroupDataCommunicator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupDataCommunicator")
            .field("settings", &*self.settings.read())
            .field("keys", &self.key_mapper.lock().len())
            .field("expanded", &self.expanded.read().len())
            .finish()
    }
}
