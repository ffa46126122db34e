//! Paged tree view and client paging protocol over grouped items.

mod common;

use std::sync::Arc;

use common::{Employee, path, scenario_items};
use groupgrid::group::{GroupProperty, GroupQuery, GroupingEngine};
use groupgrid::hierarchy::{
    CommunicatorSettings, FetchContext, GroupDataCommunicator, GroupRowFactory,
    HierarchicalDataProvider, HierarchicalGroupAdapter, HierarchicalQuery, Query,
};
use groupgrid::model::{BindingState, EntityFactory, ItemList, MetaClass};

fn grouped_adapter(list: Arc<ItemList<Employee>>) -> Arc<HierarchicalGroupAdapter<Employee>> {
    let engine = GroupingEngine::new(list);
    let adapter = HierarchicalGroupAdapter::new(engine, GroupRowFactory::new());
    adapter
        .group_by(vec![path("dept").into(), path("team").into()])
        .unwrap();
    adapter
}

fn ids(rows: &[Employee]) -> Vec<u32> {
    rows.iter().map(|row| row.id).collect()
}

#[test]
fn walks_the_scenario_tree() {
    let adapter = grouped_adapter(scenario_items());

    let roots = adapter.fetch_children(&HierarchicalQuery::roots());
    assert_eq!(roots.len(), 2);
    assert_eq!(adapter.child_count(&HierarchicalQuery::roots()), 2);

    let eng_teams = adapter.fetch_children(&HierarchicalQuery::children_of(roots[0].clone()));
    let sales_teams = adapter.fetch_children(&HierarchicalQuery::children_of(roots[1].clone()));
    assert_eq!(eng_teams.len(), 2);
    assert_eq!(sales_teams.len(), 1);

    let leaves: Vec<u32> = eng_teams
        .iter()
        .chain(&sales_teams)
        .flat_map(|team| adapter.fetch_children(&HierarchicalQuery::children_of(team.clone())))
        .map(|row| row.id)
        .collect();
    assert_eq!(leaves, vec![1, 2, 3]);
}

#[test]
fn flat_fetch_and_size_follow_paging() {
    let adapter = grouped_adapter(scenario_items());

    assert_eq!(ids(&adapter.fetch(&Query::all())), vec![1, 2, 3]);
    assert_eq!(ids(&adapter.fetch(&Query::range(1, 1))), vec![2]);
    assert_eq!(adapter.size(&Query::range(2, 10)), 1);
    assert!(adapter.is_in_memory());
}

#[test]
fn group_rows_map_back_to_groups() {
    let adapter = grouped_adapter(scenario_items());

    for group in adapter.root_groups() {
        let row = adapter.row_by_group(&group).unwrap();
        assert!(adapter.is_group_row(&row));
        assert_eq!(adapter.group_by_row(&row), Some(group.clone()));
        for child in adapter.children(&group) {
            let child_row = adapter.row_by_group(&child).unwrap();
            assert_eq!(adapter.group_by_row(&child_row), Some(child));
        }
    }
}

#[test]
fn removal_is_served_after_rebuild() {
    let list = scenario_items();
    let adapter = grouped_adapter(list.clone());

    list.remove(&2);

    let roots = adapter.fetch_children(&HierarchicalQuery::roots());
    let eng_teams = adapter.fetch_children(&HierarchicalQuery::children_of(roots[0].clone()));
    assert_eq!(eng_teams.len(), 1);
    assert_eq!(
        adapter.group_by_row(&eng_teams[0]).unwrap().value().to_string(),
        "A"
    );
}

#[test]
fn inactive_source_serves_nothing() {
    let list = scenario_items();
    let adapter = grouped_adapter(list.clone());

    list.set_state(BindingState::Inactive);
    assert!(adapter.fetch_children(&HierarchicalQuery::roots()).is_empty());
    assert_eq!(adapter.size(&Query::all()), 0);

    list.set_state(BindingState::Active);
    assert_eq!(adapter.fetch_children(&HierarchicalQuery::roots()).len(), 2);
}

struct SchemaRows;

impl EntityFactory<Employee> for SchemaRows {
    fn create(&self, class: &MetaClass) -> Option<Employee> {
        assert_eq!(class.name(), "Employee");
        Some(Employee::new(500 + rand_id(), "", "", 0))
    }
}

fn rand_id() -> u32 {
    use std::sync::atomic::{AtomicU32, Ordering};
    static NEXT: AtomicU32 = AtomicU32::new(0);
    NEXT.fetch_add(1, Ordering::SeqCst)
}

#[test]
fn schema_factory_builds_group_rows() {
    let engine = GroupingEngine::new(scenario_items());
    let factory = GroupRowFactory::new().with_entity_factory(Arc::new(SchemaRows));
    let adapter = HierarchicalGroupAdapter::new(engine, factory);
    adapter.group_by(vec![path("dept").into()]).unwrap();

    let roots = adapter.fetch_children(&HierarchicalQuery::roots());
    assert_eq!(roots.len(), 2);
    assert!(roots.iter().all(|row| row.id >= 500));
}

#[test]
fn communicator_pages_expanded_groups() {
    let adapter = grouped_adapter(scenario_items());
    let communicator = GroupDataCommunicator::with_settings(
        adapter.clone(),
        CommunicatorSettings {
            page_size: 10,
            ..CommunicatorSettings::default()
        },
    );

    let first = communicator.set_requested_range(&FetchContext::new(1), 0, 10);
    assert_eq!(first.len(), 1);
    let eng_key = first[0].rows[0].key.clone();

    assert!(communicator.update_expanded_state(&eng_key, true));
    let teams = communicator.set_parent_requested_range(&FetchContext::new(2), 0, 10, &eng_key);
    assert_eq!(teams[0].level_size, 2);
    assert!(teams[0].rows.iter().all(|row| row.has_children));

    // Expanded rows are pre-fetched on the next top-level request.
    let again = communicator.set_requested_range(&FetchContext::new(3), 0, 10);
    assert_eq!(again.len(), 2);
    assert_eq!(again[1].parent_key.as_deref(), Some(eng_key.as_str()));
}

#[test]
fn regroup_resets_the_communicator() {
    let adapter = grouped_adapter(scenario_items());
    let communicator = GroupDataCommunicator::new(adapter.clone());
    let first = communicator.set_requested_range(&FetchContext::new(1), 0, 10);
    communicator.update_expanded_state(&first[0].rows[0].key, true);

    adapter
        .group_by(vec![GroupProperty::generated("missing")])
        .unwrap();

    assert!(!communicator.has_expanded_items());
    let after = communicator.set_requested_range(&FetchContext::new(2), 0, 10);
    assert_eq!(after[0].level_size, 1);
}
