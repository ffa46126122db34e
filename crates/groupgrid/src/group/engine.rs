//! The grouping engine.
//!
//! `GroupingEngine` owns the group tree for one item source. It rebuilds the
//! whole [`GroupIndex`] on every regroup request and on every change of the
//! source, then notifies observers through [`GroupSignals`]. Observers (the
//! hierarchical adapter, the aggregation overlay) never mutate the index; they
//! rebuild their own derived state when `group_changed` fires.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use groupgrid_core::logging::{span_names, targets};
use groupgrid_core::{ConnectionGuard, PerfSpan, Signal, TreeDebug, TreeFormatOptions};
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::model::{Entity, ItemSetChange, ItemSource, SortOrder, Value};

use super::identity::GroupIdentity;
use super::index::GroupIndex;
use super::property::{GroupProperty, GroupPropertyValueProvider, GroupingPropertyContext};
use super::query::GroupQuery;

/// Signals emitted by a [`GroupingEngine`].
pub struct GroupSignals<T: Entity> {
    /// Emitted after every rebuild or clear of the group tree.
    /// Args: version of the new tree (0 is never used)
    pub group_changed: Signal<u64>,

    /// Emitted after an explicit `group_by` call succeeded.
    /// Args: the requested grouping properties
    pub group_by: Signal<Vec<GroupProperty>>,

    /// Re-emits the source's item set changes once the tree has been rebuilt
    /// for them.
    pub item_set_changed: Signal<ItemSetChange<T>>,
}

impl<T: Entity> GroupSignals<T> {
    fn new() -> Self {
        Self {
            group_changed: Signal::new(),
            group_by: Signal::new(),
            item_set_changed: Signal::new(),
        }
    }
}

/// Builds and owns the group tree of an item source.
///
/// # Example
///
/// ```ignore
/// let engine = GroupingEngine::new(source);
/// engine.add_group_property_value_provider("sizeCategory", |ctx| {
///     if ctx.item.headcount > 10 { "large".into() } else { "small".into() }
/// });
/// engine.group_by(vec![GroupProperty::generated("sizeCategory")])?;
/// assert_eq!(engine.root_groups().len(), 2);
/// ```
pub struct GroupingEngine<T: Entity> {
    source: Arc<dyn ItemSource<T>>,
    properties: RwLock<Vec<GroupProperty>>,
    index: RwLock<Option<Arc<GroupIndex<T>>>>,
    version: AtomicU64,
    providers: RwLock<HashMap<String, GroupPropertyValueProvider<T>>>,
    sort_orders: RwLock<Vec<SortOrder>>,
    signals: GroupSignals<T>,
    _source_connection: ConnectionGuard<ItemSetChange<T>>,
}

impl<T: Entity> GroupingEngine<T> {
    /// Creates an engine over `source` with grouping inactive.
    ///
    /// The engine subscribes to the source's item set changes for its whole
    /// lifetime.
    pub fn new(source: Arc<dyn ItemSource<T>>) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let source_connection = source
                .signals()
                .item_set_changed
                .connect_weak_scoped(weak, |engine, change| engine.on_item_set_changed(change));

            Self {
                source,
                properties: RwLock::new(Vec::new()),
                index: RwLock::new(None),
                version: AtomicU64::new(0),
                providers: RwLock::new(HashMap::new()),
                sort_orders: RwLock::new(Vec::new()),
                signals: GroupSignals::new(),
                _source_connection: source_connection,
            }
        })
    }

    /// The item source this engine groups.
    pub fn source(&self) -> &Arc<dyn ItemSource<T>> {
        &self.source
    }

    /// The engine's notifications.
    pub fn signals(&self) -> &GroupSignals<T> {
        &self.signals
    }

    /// The current group tree, if grouping is active.
    pub fn snapshot(&self) -> Option<Arc<GroupIndex<T>>> {
        self.index.read().clone()
    }

    /// Groups the source items by `properties`, outermost first.
    ///
    /// An empty list ungroups. After ungrouping, a remembered flat sort is
    /// re-applied to the source.
    #[tracing::instrument(skip_all, target = "groupgrid::grouping", level = "debug", fields(levels = properties.len()))]
    pub fn group_by(&self, properties: Vec<GroupProperty>) -> Result<()> {
        *self.properties.write() = properties.clone();

        let result = if properties.is_empty() {
            self.clear();
            Ok(())
        } else {
            self.regroup()
        };

        if result.is_ok() {
            self.signals.group_by.emit(properties);
        }

        if !self.has_groups() {
            let orders = self.sort_orders.read().clone();
            if !orders.is_empty() {
                self.source.sort(&orders);
            }
        }

        result
    }

    /// Remembers `orders` as the flat sort and applies it to the source.
    ///
    /// When grouping is active, the regroup triggered by the source keeps the
    /// new item order as first-seen order.
    pub fn sort(&self, orders: Vec<SortOrder>) {
        *self.sort_orders.write() = orders.clone();
        self.source.sort(&orders);
    }

    /// The remembered flat sort.
    pub fn sort_orders(&self) -> Vec<SortOrder> {
        self.sort_orders.read().clone()
    }

    /// Registers the provider for generated property `name`, replacing any
    /// previous one.
    ///
    /// Takes effect on the next regroup.
    pub fn add_group_property_value_provider<F>(&self, name: impl Into<String>, provider: F)
    where
        F: Fn(&GroupingPropertyContext<'_, T>) -> Value + Send + Sync + 'static,
    {
        let provider: GroupPropertyValueProvider<T> = Arc::new(provider);
        self.providers.write().insert(name.into(), provider);
    }

    /// Removes the provider for `name`, returning `true` if one was registered.
    pub fn remove_group_property_value_provider(&self, name: &str) -> bool {
        self.providers.write().remove(name).is_some()
    }

    /// Removes every registered provider.
    pub fn remove_all_group_property_value_providers(&self) {
        self.providers.write().clear();
    }

    /// Rebuilds the tree from the current items if grouping is active.
    pub fn refresh(&self) -> Result<()> {
        if self.has_groups() {
            self.regroup()
        } else {
            Ok(())
        }
    }

    /// Renders the current tree for diagnostics.
    pub fn debug_tree(&self, options: TreeFormatOptions) -> String {
        match self.snapshot() {
            Some(index) => TreeDebug::with_options(options).format(index.as_ref()),
            None => "No groups\n".to_string(),
        }
    }

    fn on_item_set_changed(&self, change: &ItemSetChange<T>) {
        if let Err(err) = self.refresh() {
            tracing::error!(target: targets::GROUPING, error = %err, "regroup after item set change failed");
        }
        self.signals.item_set_changed.emit(change.clone());
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn clear(&self) {
        let version = self.next_version();
        *self.index.write() = None;
        tracing::debug!(target: targets::GROUPING, version, "grouping cleared");
        self.signals.group_changed.emit(version);
    }

    fn regroup(&self) -> Result<()> {
        let _span = PerfSpan::new(span_names::REGROUP);

        let properties = self.properties.read().clone();
        let providers = self.providers.read().clone();
        let items = self.source.items();
        let version = self.next_version();

        let index = GroupIndex::build(version, &items, &properties, |item, property| {
            value_by_property(item, property, &providers)
        })?;

        tracing::debug!(
            target: targets::GROUPING,
            version,
            roots = index.roots().len(),
            groups = index.group_count(),
            items = index.item_count(),
            "regrouped items"
        );

        *self.index.write() = Some(Arc::new(index));
        self.signals.group_changed.emit(version);
        Ok(())
    }
}

fn value_by_property<T: Entity>(
    item: &T,
    property: &GroupProperty,
    providers: &HashMap<String, GroupPropertyValueProvider<T>>,
) -> Value {
    match property {
        GroupProperty::SchemaPath(path) => path.value_of(item),
        GroupProperty::Generated(name) => match providers.get(name) {
            Some(provider) => provider(&GroupingPropertyContext {
                item,
                property: name,
            }),
            None => {
                tracing::warn!(
                    target: targets::GROUPING,
                    property = %name,
                    "no value provider registered for generated group property"
                );
                Value::None
            }
        },
    }
}

impl<T: Entity> GroupQuery<T> for GroupingEngine<T> {
    fn has_groups(&self) -> bool {
        self.index.read().is_some()
    }

    fn group_properties(&self) -> Vec<GroupProperty> {
        self.properties.read().clone()
    }

    fn root_groups(&self) -> Vec<GroupIdentity> {
        self.snapshot()
            .map(|index| index.roots().to_vec())
            .unwrap_or_default()
    }

    fn children(&self, group: &GroupIdentity) -> Vec<GroupIdentity> {
        self.snapshot()
            .map(|index| index.children(group).to_vec())
            .unwrap_or_default()
    }

    fn has_children(&self, group: &GroupIdentity) -> bool {
        self.snapshot()
            .is_some_and(|index| index.has_children(group))
    }

    fn contains_group(&self, group: &GroupIdentity) -> bool {
        self.snapshot().is_some_and(|index| index.contains(group))
    }

    fn own_child_items(&self, group: &GroupIdentity) -> Vec<T> {
        self.snapshot()
            .map(|index| index.own_items(group).to_vec())
            .unwrap_or_default()
    }

    fn child_items(&self, group: &GroupIdentity) -> Vec<T> {
        self.snapshot()
            .map(|index| index.child_items(group))
            .unwrap_or_default()
    }

    fn group_items(&self, group: &GroupIdentity) -> Vec<T> {
        self.snapshot()
            .map(|index| index.group_items(group))
            .unwrap_or_default()
    }

    fn group_items_count(&self, group: &GroupIdentity) -> usize {
        self.snapshot()
            .map(|index| index.group_items_count(group))
            .unwrap_or(0)
    }

    fn group_path(&self, item: &T) -> Result<Vec<GroupIdentity>> {
        let id = item.id();
        if !self.source.contains(&id) {
            return Err(Error::item_not_found(&id));
        }
        Ok(self
            .snapshot()
            .map(|index| index.group_path(&id))
            .unwrap_or_default())
    }

    fn parent_group(&self, item: &T) -> Option<GroupIdentity> {
        self.snapshot()
            .and_then(|index| index.item_group(&item.id()).cloned())
    }
}

impl<T: Entity> fmt::Debug for GroupingEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupingEngine")
            .field("properties", &*self.properties.read())
            .field("index", &*self.index.read())
            .field("providers", &self.providers.read().len())
            .finish()
    }
}
