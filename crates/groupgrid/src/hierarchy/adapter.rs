//! Hierarchical view of a grouping engine.
//!
//! `HierarchicalGroupAdapter` serves the group tree through the paged
//! tree-fetch protocol. Group nodes are represented by synthetic rows of the
//! grid's item type; the adapter keeps a bidirectional map between those rows
//! and their [`GroupIdentity`], rebuilt from scratch whenever the engine
//! regroups.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use groupgrid_core::logging::{span_names, targets};
use groupgrid_core::{ConnectionGuard, PerfSpan, Signal};
use parking_lot::{Mutex, RwLock};

use crate::error::Result;
use crate::group::{GroupIdentity, GroupIndex, GroupProperty, GroupQuery, GroupingEngine};
use crate::model::{BindingState, Entity, ItemSetChange, MetaClass};

use super::provider::HierarchicalDataProvider;
use super::query::{HierarchicalQuery, Query};
use super::row_factory::GroupRowFactory;

/// Bidirectional map between synthetic rows and group identities.
struct GroupRowMap<T: Entity> {
    order: Vec<T::Id>,
    rows: HashMap<T::Id, (T, GroupIdentity)>,
    groups: HashMap<GroupIdentity, T>,
}

impl<T: Entity> GroupRowMap<T> {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            rows: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    fn insert(&mut self, row: T, group: GroupIdentity) {
        let id = row.id();
        self.order.push(id.clone());
        self.groups.insert(group.clone(), row.clone());
        self.rows.insert(id, (row, group));
    }

    fn contains_row(&self, id: &T::Id) -> bool {
        self.rows.contains_key(id)
    }

    fn group(&self, id: &T::Id) -> Option<&GroupIdentity> {
        self.rows.get(id).map(|(_, group)| group)
    }

    fn row(&self, group: &GroupIdentity) -> Option<&T> {
        self.groups.get(group)
    }

    fn rows(&self) -> Vec<T> {
        self.order
            .iter()
            .filter_map(|id| self.rows.get(id).map(|(row, _)| row.clone()))
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

struct GroupRows<T: Entity> {
    roots: GroupRowMap<T>,
    children: GroupRowMap<T>,
}

impl<T: Entity> GroupRows<T> {
    fn new() -> Self {
        Self {
            roots: GroupRowMap::new(),
            children: GroupRowMap::new(),
        }
    }

    fn contains_row(&self, id: &T::Id) -> bool {
        self.roots.contains_row(id) || self.children.contains_row(id)
    }

    fn group(&self, id: &T::Id) -> Option<&GroupIdentity> {
        self.roots.group(id).or_else(|| self.children.group(id))
    }

    fn row(&self, group: &GroupIdentity) -> Option<&T> {
        self.roots.row(group).or_else(|| self.children.row(group))
    }
}

/// One rebuild of the group rows, reading a single index snapshot.
struct RowBuilder<'a, T: Entity> {
    index: &'a GroupIndex<T>,
    source_class: Option<Arc<MetaClass>>,
}

impl<T: Entity> RowBuilder<'_, T> {
    fn collect(&self, factory: &mut GroupRowFactory<T>, group: &GroupIdentity, rows: &mut GroupRows<T>) {
        for child in self.index.children(group) {
            let Some(row) = self.create(factory, child, rows) else {
                continue;
            };
            rows.children.insert(row, child.clone());
            self.collect(factory, child, rows);
        }
    }

    /// Creates the row for `group`; failures are logged and skip the
    /// group's subtree.
    fn create(
        &self,
        factory: &mut GroupRowFactory<T>,
        group: &GroupIdentity,
        rows: &GroupRows<T>,
    ) -> Option<T> {
        let known_item = self.index.first_item(group);

        let Some(row) = factory.create(group, self.source_class.as_ref(), known_item) else {
            tracing::error!(target: targets::HIERARCHY, %group, "unable to create group row");
            return None;
        };

        // Every source item is in the index while grouping is active.
        let id = row.id();
        if rows.contains_row(&id) || self.index.contains_item(&id) {
            tracing::error!(
                target: targets::HIERARCHY,
                %group,
                row_id = %id,
                "group row id collides with an existing row"
            );
            return None;
        }
        Some(row)
    }
}

/// Serves a [`GroupingEngine`] as a lazy, paged tree of rows.
///
/// - Top level: one synthetic row per root group, or the flat items when
///   grouping is inactive.
/// - Children of a group row: rows of its child groups, or its items at the
///   deepest level.
/// - While the item source is inactive every query answers empty.
pub struct HierarchicalGroupAdapter<T: Entity> {
    engine: Arc<GroupingEngine<T>>,
    row_factory: Mutex<GroupRowFactory<T>>,
    rows: RwLock<GroupRows<T>>,
    refreshed: Signal<()>,
    _group_changed: ConnectionGuard<u64>,
    _item_set_changed: ConnectionGuard<ItemSetChange<T>>,
}

impl<T: Entity> HierarchicalGroupAdapter<T> {
    /// Creates an adapter over `engine`, building rows for any grouping that
    /// is already active.
    pub fn new(engine: Arc<GroupingEngine<T>>, row_factory: GroupRowFactory<T>) -> Arc<Self> {
        let adapter = Arc::new_cyclic(|weak: &Weak<Self>| {
            let group_changed = engine
                .signals()
                .group_changed
                .connect_weak_scoped(weak, |adapter: &Self, _| {
                    adapter.update_group_rows();
                    adapter.refreshed.emit(());
                });

            // Grouped changes were already served through `group_changed`.
            let item_set_changed = engine
                .signals()
                .item_set_changed
                .connect_weak_scoped(weak, |adapter: &Self, _| {
                    if !adapter.engine.has_groups() {
                        adapter.refreshed.emit(());
                    }
                });

            Self {
                engine,
                row_factory: Mutex::new(row_factory),
                rows: RwLock::new(GroupRows::new()),
                refreshed: Signal::new(),
                _group_changed: group_changed,
                _item_set_changed: item_set_changed,
            }
        });
        adapter.update_group_rows();
        adapter
    }

    /// The wrapped engine.
    pub fn engine(&self) -> &Arc<GroupingEngine<T>> {
        &self.engine
    }

    /// Regroups the underlying engine.
    pub fn group_by(&self, properties: Vec<GroupProperty>) -> Result<()> {
        self.engine.group_by(properties)
    }

    /// Returns `true` if `row` is a synthetic group row.
    pub fn is_group_row(&self, row: &T) -> bool {
        self.rows.read().contains_row(&row.id())
    }

    /// The group a synthetic row stands for.
    pub fn group_by_row(&self, row: &T) -> Option<GroupIdentity> {
        self.rows.read().group(&row.id()).cloned()
    }

    /// The synthetic row standing for `group`.
    pub fn row_by_group(&self, group: &GroupIdentity) -> Option<T> {
        self.rows.read().row(group).cloned()
    }

    /// Number of synthetic rows currently mapped.
    pub fn group_row_count(&self) -> usize {
        let rows = self.rows.read();
        rows.roots.len() + rows.children.len()
    }

    fn is_active(&self) -> bool {
        self.engine.source().state() == BindingState::Active
    }

    fn update_group_rows(&self) {
        let _span = PerfSpan::new(span_names::GROUP_ROWS);

        let mut rows = GroupRows::new();
        if let Some(index) = self.engine.snapshot() {
            let builder = RowBuilder {
                index: &index,
                source_class: self.engine.source().meta_class(),
            };
            let mut factory = self.row_factory.lock();
            for root in index.roots() {
                let Some(row) = builder.create(&mut factory, root, &rows) else {
                    continue;
                };
                rows.roots.insert(row, root.clone());
                builder.collect(&mut factory, root, &mut rows);
            }
        }

        tracing::debug!(
            target: targets::HIERARCHY,
            roots = rows.roots.len(),
            children = rows.children.len(),
            "group rows rebuilt"
        );
        *self.rows.write() = rows;
    }

    fn collect_own_children(&self, parent: Option<&T>) -> Vec<T> {
        let Some(parent) = parent else {
            let rows = self.rows.read();
            return if rows.roots.is_empty() {
                drop(rows);
                self.engine.source().items()
            } else {
                rows.roots.rows()
            };
        };

        let Some(group) = self.group_by_row(parent) else {
            return Vec::new();
        };

        let child_groups = self.engine.children(&group);
        if child_groups.is_empty() {
            return self.engine.child_items(&group);
        }

        let rows = self.rows.read();
        child_groups
            .iter()
            .filter_map(|child| rows.children.row(child).cloned())
            .collect()
    }
}

impl<T: Entity> HierarchicalDataProvider<T> for HierarchicalGroupAdapter<T> {
    fn size(&self, query: &Query) -> usize {
        if !self.is_active() {
            return 0;
        }
        self.fetch(query).len()
    }

    fn fetch(&self, query: &Query) -> Vec<T> {
        if !self.is_active() {
            return Vec::new();
        }
        query.page(self.engine.source().items())
    }

    fn child_count(&self, query: &HierarchicalQuery<T>) -> usize {
        if !self.is_active() {
            return 0;
        }
        self.collect_own_children(query.parent.as_ref()).len()
    }

    fn fetch_children(&self, query: &HierarchicalQuery<T>) -> Vec<T> {
        if !self.is_active() {
            return Vec::new();
        }
        query.page.page(self.collect_own_children(query.parent.as_ref()))
    }

    fn has_children(&self, item: &T) -> bool {
        self.is_group_row(item)
    }

    fn refreshed(&self) -> &Signal<()> {
        &self.refreshed
    }
}

impl<T: Entity> GroupQuery<T> for HierarchicalGroupAdapter<T> {
    fn has_groups(&self) -> bool {
        self.engine.has_groups()
    }

    fn group_properties(&self) -> Vec<GroupProperty> {
        self.engine.group_properties()
    }

    fn root_groups(&self) -> Vec<GroupIdentity> {
        self.engine.root_groups()
    }

    fn children(&self, group: &GroupIdentity) -> Vec<GroupIdentity> {
        self.engine.children(group)
    }

    fn has_children(&self, group: &GroupIdentity) -> bool {
        self.engine.has_children(group)
    }

    fn contains_group(&self, group: &GroupIdentity) -> bool {
        self.engine.contains_group(group)
    }

    fn own_child_items(&self, group: &GroupIdentity) -> Vec<T> {
        self.engine.own_child_items(group)
    }

    fn child_items(&self, group: &GroupIdentity) -> Vec<T> {
        self.engine.child_items(group)
    }

    fn group_items(&self, group: &GroupIdentity) -> Vec<T> {
        self.engine.group_items(group)
    }

    fn group_items_count(&self, group: &GroupIdentity) -> usize {
        self.engine.group_items_count(group)
    }

    fn group_path(&self, item: &T) -> Result<Vec<GroupIdentity>> {
        self.engine.group_path(item)
    }

    fn parent_group(&self, item: &T) -> Option<GroupIdentity> {
        self.engine.parent_group(item)
    }
}

impl<T: Entity> fmt::Debug for HierarchicalGroupAdapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HierarchicalGroupAdapter")
            .field("engine", &self.engine)
            .field("group_rows", &self.group_row_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemList, ItemSource, PropertyAccess, SortOrder, SourceSignals, Value};
    use std::sync::atomic::{AtomicU32, Ordering};

    static NEXT_ROW: AtomicU32 = AtomicU32::new(10_000);

    #[derive(Debug, Clone)]
    struct Row {
        id: u32,
        dept: &'static str,
        team: &'static str,
    }

    impl PropertyAccess for Row {
        fn property_value(&self, name: &str) -> Value {
            match name {
                "dept" => Value::from(self.dept),
                "team" => Value::from(self.team),
                _ => Value::None,
            }
        }
    }

    impl Entity for Row {
        type Id = u32;

        fn id(&self) -> u32 {
            self.id
        }

        fn blank(&self) -> Option<Self> {
            Some(Row {
                id: NEXT_ROW.fetch_add(1, Ordering::SeqCst),
                dept: "",
                team: "",
            })
        }
    }

    fn row(id: u32, dept: &'static str, team: &'static str) -> Row {
        Row { id, dept, team }
    }

    fn setup() -> (Arc<ItemList<Row>>, Arc<HierarchicalGroupAdapter<Row>>) {
        let list = Arc::new(ItemList::new(vec![
            row(1, "Eng", "A"),
            row(2, "Eng", "B"),
            row(3, "Sales", "A"),
        ]));
        let engine = GroupingEngine::new(list.clone());
        for name in ["dept", "team"] {
            engine.add_group_property_value_provider(name, move |ctx| ctx.item.property_value(name));
        }
        let adapter = HierarchicalGroupAdapter::new(engine, GroupRowFactory::new());
        (list, adapter)
    }

    fn group_by_dept_team(adapter: &HierarchicalGroupAdapter<Row>) {
        adapter
            .group_by(vec![
                GroupProperty::generated("dept"),
                GroupProperty::generated("team"),
            ])
            .unwrap();
    }

    #[test]
    fn test_ungrouped_serves_flat_items() {
        let (_list, adapter) = setup();

        let roots = adapter.fetch_children(&HierarchicalQuery::roots());
        assert_eq!(roots.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(!HierarchicalDataProvider::has_children(&*adapter, &roots[0]));
        assert_eq!(adapter.size(&Query::range(1, 10)), 2);
    }

    #[test]
    fn test_group_rows_navigation() {
        let (_list, adapter) = setup();
        group_by_dept_team(&adapter);

        let roots = adapter.fetch_children(&HierarchicalQuery::roots());
        assert_eq!(roots.len(), 2);
        assert!(roots.iter().all(|r| HierarchicalDataProvider::has_children(&*adapter, r)));
        assert_eq!(adapter.group_row_count(), 5);

        let eng = adapter.group_by_row(&roots[0]).unwrap();
        assert_eq!(eng.value(), &Value::from("Eng"));
        assert_eq!(adapter.row_by_group(&eng).unwrap().id, roots[0].id);

        let teams = adapter.fetch_children(&HierarchicalQuery::children_of(roots[0].clone()));
        assert_eq!(teams.len(), 2);
        assert_eq!(adapter.child_count(&HierarchicalQuery::children_of(roots[0].clone())), 2);

        let leaves = adapter.fetch_children(&HierarchicalQuery::children_of(teams[1].clone()));
        assert_eq!(leaves.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2]);
        assert!(!HierarchicalDataProvider::has_children(&*adapter, &leaves[0]));
    }

    #[test]
    fn test_children_paging() {
        let (_list, adapter) = setup();
        group_by_dept_team(&adapter);

        let query = HierarchicalQuery::roots().with_page(Query::range(1, 5));
        let page = adapter.fetch_children(&query);
        assert_eq!(page.len(), 1);
        assert_eq!(
            adapter.group_by_row(&page[0]).unwrap().value(),
            &Value::from("Sales")
        );
        assert_eq!(adapter.child_count(&query), 2);
    }

    #[test]
    fn test_unknown_parent_has_no_children() {
        let (_list, adapter) = setup();
        group_by_dept_team(&adapter);

        let stranger = row(77, "Ops", "Z");
        assert!(adapter.fetch_children(&HierarchicalQuery::children_of(stranger.clone())).is_empty());
        assert!(!HierarchicalDataProvider::has_children(&*adapter, &stranger));
    }

    #[test]
    fn test_rows_rebuilt_on_mutation() {
        let (list, adapter) = setup();
        group_by_dept_team(&adapter);
        let refreshes = Arc::new(AtomicU32::new(0));
        let counter = refreshes.clone();
        adapter.refreshed().connect(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        list.remove(&2);

        assert_eq!(adapter.group_row_count(), 4);
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);

        adapter.group_by(Vec::new()).unwrap();
        assert_eq!(adapter.group_row_count(), 0);
        assert_eq!(adapter.fetch_children(&HierarchicalQuery::roots()).len(), 2);
    }

    #[test]
    fn test_inactive_source_answers_empty() {
        let (list, adapter) = setup();
        group_by_dept_team(&adapter);

        list.set_state(BindingState::Inactive);

        assert_eq!(adapter.size(&Query::all()), 0);
        assert!(adapter.fetch(&Query::all()).is_empty());
        assert!(adapter.fetch_children(&HierarchicalQuery::roots()).is_empty());
        assert_eq!(adapter.child_count(&HierarchicalQuery::roots()), 0);
    }

    #[test]
    fn test_failed_row_construction_skips_subtree() {
        let list = Arc::new(ItemList::new(vec![row(1, "Eng", "A"), row(2, "Sales", "B")]));
        let engine = GroupingEngine::new(list.clone());
        engine.add_group_property_value_provider("dept", |ctx| ctx.item.property_value("dept"));
        engine.add_group_property_value_provider("team", |ctx| ctx.item.property_value("team"));

        let factory = GroupRowFactory::new().with_callback(|group: &GroupIdentity| {
            if group.value_of(&GroupProperty::generated("dept")) == Some(&Value::from("Eng")) {
                None
            } else {
                Some(Row {
                    id: NEXT_ROW.fetch_add(1, Ordering::SeqCst),
                    dept: "",
                    team: "",
                })
            }
        });
        let adapter = HierarchicalGroupAdapter::new(engine, factory);
        group_by_dept_team(&adapter);

        let roots = adapter.fetch_children(&HierarchicalQuery::roots());
        assert_eq!(roots.len(), 1);
        assert_eq!(adapter.group_row_count(), 2);
    }

    #[test]
    fn test_dropping_adapter_disconnects_from_engine() {
        let (_list, adapter) = setup();
        let engine = adapter.engine().clone();
        assert_eq!(engine.signals().group_changed.connection_count(), 1);
        assert_eq!(engine.signals().item_set_changed.connection_count(), 1);

        drop(adapter);
        assert_eq!(engine.signals().group_changed.connection_count(), 0);
        assert_eq!(engine.signals().item_set_changed.connection_count(), 0);
    }

    /// An item list that counts full scans and per-id lookups.
    struct CountingSource {
        list: ItemList<Row>,
        scans: AtomicU32,
        lookups: AtomicU32,
    }

    impl ItemSource<Row> for CountingSource {
        fn items(&self) -> Vec<Row> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            self.list.items()
        }

        fn item(&self, id: &u32) -> Option<Row> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.list.item(id)
        }

        fn contains(&self, id: &u32) -> bool {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            self.list.contains(id)
        }

        fn len(&self) -> usize {
            self.list.len()
        }

        fn sort(&self, orders: &[SortOrder]) {
            self.list.sort(orders);
        }

        fn signals(&self) -> &SourceSignals<Row> {
            self.list.signals()
        }
    }

    #[test]
    fn test_rebuild_scans_the_source_once() {
        let rows = (1..=500).map(|id| row(id, "Eng", "A")).collect();
        let source = Arc::new(CountingSource {
            list: ItemList::new(rows),
            scans: AtomicU32::new(0),
            lookups: AtomicU32::new(0),
        });
        let engine = GroupingEngine::new(source.clone());
        engine.add_group_property_value_provider("id", |ctx| Value::Int(i64::from(ctx.item.id)));
        let adapter = HierarchicalGroupAdapter::new(engine.clone(), GroupRowFactory::new());

        adapter.group_by(vec![GroupProperty::generated("id")]).unwrap();
        assert_eq!(adapter.group_row_count(), 500);
        assert_eq!(source.scans.load(Ordering::SeqCst), 1);
        assert_eq!(source.lookups.load(Ordering::SeqCst), 0);

        engine.refresh().unwrap();
        assert_eq!(adapter.group_row_count(), 500);
        assert_eq!(source.scans.load(Ordering::SeqCst), 2);
        assert_eq!(source.lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_colliding_row_id_is_rejected() {
        let list = Arc::new(ItemList::new(vec![row(1, "Eng", "A")]));
        let engine = GroupingEngine::new(list.clone());
        engine.add_group_property_value_provider("dept", |ctx| ctx.item.property_value("dept"));
        let factory = GroupRowFactory::new().with_callback(|_| Some(row(1, "", "")));
        let adapter = HierarchicalGroupAdapter::new(engine, factory);

        adapter.group_by(vec![GroupProperty::generated("dept")]).unwrap();
        assert_eq!(adapter.group_row_count(), 0);
    }
}
