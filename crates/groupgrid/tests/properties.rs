//! Structural properties of the group tree over arbitrary items.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{Employee, path};
use groupgrid::group::{GroupIdentity, GroupProperty, GroupQuery, GroupingEngine};
use groupgrid::model::ItemList;
use proptest::prelude::*;

fn employees() -> impl Strategy<Value = Vec<Employee>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["Eng", "Sales", "Ops"]),
            prop::sample::select(vec!["A", "B", "C", "D"]),
            0i64..100,
        ),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (dept, team, headcount))| Employee::new(i as u32 + 1, dept, team, headcount))
            .collect()
    })
}

fn grouping() -> impl Strategy<Value = Vec<GroupProperty>> {
    prop::sample::select(vec![
        vec!["dept"],
        vec!["team"],
        vec!["dept", "team"],
        vec!["team", "dept"],
        vec!["dept", "team", "headcount"],
    ])
    .prop_map(|names| names.into_iter().map(|name| path(name).into()).collect())
}

fn leaves(engine: &GroupingEngine<Employee>, group: &GroupIdentity, out: &mut Vec<GroupIdentity>) {
    let children = engine.children(group);
    if children.is_empty() {
        out.push(group.clone());
    }
    for child in &children {
        leaves(engine, child, out);
    }
}

/// Every group depth-first, with the ids of its own items.
fn shape(engine: &GroupingEngine<Employee>) -> Vec<(GroupIdentity, Vec<u32>)> {
    let mut out = Vec::new();
    let mut pending: Vec<GroupIdentity> = engine.root_groups().into_iter().rev().collect();
    while let Some(group) = pending.pop() {
        let ids = engine.own_child_items(&group).iter().map(|i| i.id).collect();
        pending.extend(engine.children(&group).into_iter().rev());
        out.push((group, ids));
    }
    out
}

proptest! {
    #[test]
    fn leaves_partition_the_items(items in employees(), properties in grouping()) {
        let engine = GroupingEngine::new(Arc::new(ItemList::new(items.clone())));
        engine.group_by(properties.clone()).unwrap();

        let mut all_leaves = Vec::new();
        for root in engine.root_groups() {
            leaves(&engine, &root, &mut all_leaves);
        }

        let mut seen = HashSet::new();
        for leaf in &all_leaves {
            prop_assert_eq!(leaf.depth() + 1, properties.len());
            for item in engine.own_child_items(leaf) {
                prop_assert!(seen.insert(item.id), "item {} in two groups", item.id);
            }
        }
        prop_assert_eq!(seen.len(), items.len());
    }

    #[test]
    fn counts_add_up(items in employees(), properties in grouping()) {
        let engine = GroupingEngine::new(Arc::new(ItemList::new(items.clone())));
        engine.group_by(properties).unwrap();

        let roots = engine.root_groups();
        let total: usize = roots.iter().map(|g| engine.group_items_count(g)).sum();
        prop_assert_eq!(total, items.len());

        let mut pending = roots;
        while let Some(group) = pending.pop() {
            let children = engine.children(&group);
            prop_assert!(!engine.group_items(&group).is_empty());
            if !children.is_empty() {
                let sum: usize = children.iter().map(|c| engine.group_items_count(c)).sum();
                prop_assert_eq!(engine.group_items_count(&group), sum);
            }
            pending.extend(children);
        }
    }

    #[test]
    fn item_paths_lead_back_to_the_item(items in employees(), properties in grouping()) {
        let engine = GroupingEngine::new(Arc::new(ItemList::new(items.clone())));
        engine.group_by(properties.clone()).unwrap();

        for item in &items {
            let chain = engine.group_path(item).unwrap();
            prop_assert_eq!(chain.len(), properties.len());
            let leaf = chain.last().unwrap();
            let parent = engine.parent_group(item);
            prop_assert_eq!(parent.as_ref(), Some(leaf));
            prop_assert!(engine.own_child_items(leaf).iter().any(|i| i.id == item.id));
        }
    }

    #[test]
    fn regrouping_is_idempotent(items in employees(), properties in grouping()) {
        let engine = GroupingEngine::new(Arc::new(ItemList::new(items)));
        engine.group_by(properties.clone()).unwrap();
        let first = shape(&engine);

        engine.group_by(properties).unwrap();
        prop_assert_eq!(shape(&engine), first);
    }
}
