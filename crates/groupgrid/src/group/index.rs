//! The group tree built by one grouping pass.
//!
//! A `GroupIndex` is immutable once built. The engine publishes each new
//! index as a whole (behind an `Arc`), so readers always see one consistent
//! pass and never a partially updated tree.

use std::collections::HashMap;
use std::fmt;

use groupgrid_core::TreeSource;

use crate::error::{Error, Result};
use crate::model::{Entity, Value};

use super::identity::GroupIdentity;
use super::property::GroupProperty;

/// Parent/child structure and membership of one grouping pass.
///
/// - `parents`: every known group, mapped to its enclosing group (`None` for
///   roots)
/// - `children`: child groups in first-seen order (only groups with children
///   have an entry)
/// - `roots`: top-level groups in first-seen order
/// - `group_items`: items whose deepest group is exactly the key
/// - `item_group`: reverse of `group_items`, by item id
pub struct GroupIndex<T: Entity> {
    version: u64,
    parents: HashMap<GroupIdentity, Option<GroupIdentity>>,
    children: HashMap<GroupIdentity, Vec<GroupIdentity>>,
    roots: Vec<GroupIdentity>,
    group_items: HashMap<GroupIdentity, Vec<T>>,
    item_group: HashMap<T::Id, GroupIdentity>,
}

impl<T: Entity> GroupIndex<T> {
    fn new(version: u64) -> Self {
        Self {
            version,
            parents: HashMap::new(),
            children: HashMap::new(),
            roots: Vec::new(),
            group_items: HashMap::new(),
            item_group: HashMap::new(),
        }
    }

    /// Groups `items` by `properties`, walking the property list depth-first
    /// for each item.
    ///
    /// Groups are shared between items with the same value prefix, so the
    /// work is one `value_of` call per item and property.
    pub(crate) fn build<F>(
        version: u64,
        items: &[T],
        properties: &[GroupProperty],
        mut value_of: F,
    ) -> Result<Self>
    where
        F: FnMut(&T, &GroupProperty) -> Value,
    {
        let mut index = Self::new(version);

        for item in items {
            let mut pairs = Vec::with_capacity(properties.len());
            let mut parent: Option<GroupIdentity> = None;

            for property in properties {
                pairs.push((property.clone(), value_of(item, property)));
                let group = GroupIdentity::from_pairs(pairs.clone())
                    .ok_or_else(|| Error::missing_item_group(item.id()))?;
                index.register(&group, parent.as_ref());
                parent = Some(group);
            }

            let leaf = parent.ok_or_else(|| Error::missing_item_group(item.id()))?;
            index.item_group.insert(item.id(), leaf.clone());
            index.group_items.entry(leaf).or_default().push(item.clone());
        }

        Ok(index)
    }

    fn register(&mut self, group: &GroupIdentity, parent: Option<&GroupIdentity>) {
        if self.parents.contains_key(group) {
            return;
        }
        self.parents.insert(group.clone(), parent.cloned());
        match parent {
            Some(parent) => self
                .children
                .entry(parent.clone())
                .or_default()
                .push(group.clone()),
            None => self.roots.push(group.clone()),
        }
    }

    /// Sequence number of the pass that built this index.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Top-level groups in first-seen order.
    pub fn roots(&self) -> &[GroupIdentity] {
        &self.roots
    }

    /// Direct child groups of `group`; empty for leaves and unknown groups.
    pub fn children(&self, group: &GroupIdentity) -> &[GroupIdentity] {
        self.children.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_children(&self, group: &GroupIdentity) -> bool {
        !self.children(group).is_empty()
    }

    pub fn contains(&self, group: &GroupIdentity) -> bool {
        self.parents.contains_key(group)
    }

    /// The enclosing group of `group`.
    pub fn parent(&self, group: &GroupIdentity) -> Option<&GroupIdentity> {
        self.parents.get(group).and_then(Option::as_ref)
    }

    /// Items directly in `group` (leaf membership only).
    pub fn own_items(&self, group: &GroupIdentity) -> &[T] {
        self.group_items.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Items of `group` and all its descendants: descendants' items first,
    /// depth-first in child order, then the group's own items.
    pub fn child_items(&self, group: &GroupIdentity) -> Vec<T> {
        let mut items = Vec::new();
        self.collect_child_items(group, &mut items);
        items
    }

    fn collect_child_items(&self, group: &GroupIdentity, items: &mut Vec<T>) {
        for child in self.children(group) {
            self.collect_child_items(child, items);
        }
        items.extend_from_slice(self.own_items(group));
    }

    /// The first item of [`child_items`](Self::child_items), without
    /// collecting the rest.
    pub fn first_item(&self, group: &GroupIdentity) -> Option<&T> {
        self.children(group)
            .iter()
            .find_map(|child| self.first_item(child))
            .or_else(|| self.own_items(group).first())
    }

    /// Returns `true` if the item with `id` was grouped in this pass.
    pub fn contains_item(&self, id: &T::Id) -> bool {
        self.item_group.contains_key(id)
    }

    /// Items counted for `group`: its own list when it has one, otherwise the
    /// accumulated items of its children.
    pub fn group_items(&self, group: &GroupIdentity) -> Vec<T> {
        if let Some(items) = self.group_items.get(group) {
            return items.clone();
        }
        let mut items = Vec::new();
        for child in self.children(group) {
            items.extend(self.group_items(child));
        }
        items
    }

    /// Number of items in `group`, summing children when it has no own list.
    pub fn group_items_count(&self, group: &GroupIdentity) -> usize {
        match self.group_items.get(group) {
            Some(items) => items.len(),
            None => self
                .children(group)
                .iter()
                .map(|child| self.group_items_count(child))
                .sum(),
        }
    }

    /// Leaf group of the item with `id`.
    pub fn item_group(&self, id: &T::Id) -> Option<&GroupIdentity> {
        self.item_group.get(id)
    }

    /// Root-to-leaf chain of groups containing the item with `id`.
    pub fn group_path(&self, id: &T::Id) -> Vec<GroupIdentity> {
        let mut path = Vec::new();
        let mut current = self.item_group.get(id);
        while let Some(group) = current {
            path.push(group.clone());
            current = self.parent(group);
        }
        path.reverse();
        path
    }

    /// Total number of groups at all levels.
    pub fn group_count(&self) -> usize {
        self.parents.len()
    }

    /// Number of grouped items.
    pub fn item_count(&self) -> usize {
        self.item_group.len()
    }
}

impl<T: Entity> fmt::Debug for GroupIndex<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupIndex")
            .field("version", &self.version)
            .field("roots", &self.roots.len())
            .field("groups", &self.parents.len())
            .field("items", &self.item_group.len())
            .finish()
    }
}

impl<T: Entity> TreeSource for GroupIndex<T> {
    type Node = GroupIdentity;

    fn title(&self) -> String {
        format!("Groups v{} ({} items)", self.version, self.item_count())
    }

    fn roots(&self) -> Vec<GroupIdentity> {
        self.roots.clone()
    }

    fn children(&self, node: &GroupIdentity) -> Vec<GroupIdentity> {
        GroupIndex::children(self, node).to_vec()
    }

    fn label(&self, node: &GroupIdentity) -> String {
        format!("{} ({})", node.value(), self.group_items_count(node))
    }

    fn node_kind(&self, node: &GroupIdentity) -> Option<String> {
        Some(node.property().key())
    }

    fn leaves(&self, node: &GroupIdentity) -> Vec<String> {
        self.own_items(node)
            .iter()
            .map(|item| item.id().to_string())
            .collect()
    }
}
