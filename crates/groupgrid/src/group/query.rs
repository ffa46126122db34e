//! Read-only query surface over the current group tree.

use std::marker::PhantomData;

use crate::error::Result;
use crate::model::Entity;

use super::identity::GroupIdentity;
use super::property::GroupProperty;

/// Queries answered from the current grouping.
///
/// Every query is defined while grouping is inactive or the group is unknown,
/// answering empty or zero. The one exception is [`group_path`](Self::group_path),
/// which fails for items that are not in the bound source.
pub trait GroupQuery<T: Entity>: Send + Sync {
    /// Returns `true` while a grouping is active.
    fn has_groups(&self) -> bool;

    /// The current grouping properties, outermost first.
    fn group_properties(&self) -> Vec<GroupProperty>;

    /// Top-level groups in first-seen order.
    fn root_groups(&self) -> Vec<GroupIdentity>;

    /// Direct child groups in first-seen order.
    fn children(&self, group: &GroupIdentity) -> Vec<GroupIdentity>;

    /// Returns `true` if `group` has child groups.
    fn has_children(&self, group: &GroupIdentity) -> bool;

    /// Returns `true` if grouping is active and `group` is part of it.
    fn contains_group(&self, group: &GroupIdentity) -> bool;

    /// Items whose deepest group is `group`.
    fn own_child_items(&self, group: &GroupIdentity) -> Vec<T>;

    /// Items of `group` and all descendants, descendants first.
    fn child_items(&self, group: &GroupIdentity) -> Vec<T>;

    /// All items counted for `group`.
    fn group_items(&self, group: &GroupIdentity) -> Vec<T>;

    /// Number of items counted for `group`.
    fn group_items_count(&self, group: &GroupIdentity) -> usize;

    /// Root-to-leaf chain of groups containing `item`.
    ///
    /// Empty if grouping is inactive; an error if `item` is not in the source.
    fn group_path(&self, item: &T) -> Result<Vec<GroupIdentity>>;

    /// Leaf group containing `item`.
    fn parent_group(&self, item: &T) -> Option<GroupIdentity>;
}

/// A [`GroupQuery`] with no groups, for grids that have no items bound.
#[derive(Debug)]
pub struct EmptyGroupQuery<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> EmptyGroupQuery<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for EmptyGroupQuery<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> GroupQuery<T> for EmptyGroupQuery<T> {
    fn has_groups(&self) -> bool {
        false
    }

    fn group_properties(&self) -> Vec<GroupProperty> {
        Vec::new()
    }

    fn root_groups(&self) -> Vec<GroupIdentity> {
        Vec::new()
    }

    fn children(&self, _group: &GroupIdentity) -> Vec<GroupIdentity> {
        Vec::new()
    }

    fn has_children(&self, _group: &GroupIdentity) -> bool {
        false
    }

    fn contains_group(&self, _group: &GroupIdentity) -> bool {
        false
    }

    fn own_child_items(&self, _group: &GroupIdentity) -> Vec<T> {
        Vec::new()
    }

    fn child_items(&self, _group: &GroupIdentity) -> Vec<T> {
        Vec::new()
    }

    fn group_items(&self, _group: &GroupIdentity) -> Vec<T> {
        Vec::new()
    }

    fn group_items_count(&self, _group: &GroupIdentity) -> usize {
        0
    }

    fn group_path(&self, _item: &T) -> Result<Vec<GroupIdentity>> {
        Ok(Vec::new())
    }

    fn parent_group(&self, _item: &T) -> Option<GroupIdentity> {
        None
    }
}
