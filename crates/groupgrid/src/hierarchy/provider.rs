//! Server side of the paged tree-fetch protocol.

use groupgrid_core::Signal;

use crate::model::Entity;

use super::query::{HierarchicalQuery, Query};

/// Lazy, paged access to a tree of rows.
///
/// Counts are always computed from the same rows the fetch methods return,
/// so a page boundary never disagrees with the reported size.
pub trait HierarchicalDataProvider<T: Entity>: Send + Sync {
    /// Number of rows `fetch(query)` returns.
    fn size(&self, query: &Query) -> usize;

    /// A page of the flat item list.
    fn fetch(&self, query: &Query) -> Vec<T>;

    /// Number of children of `query.parent`, ignoring paging.
    fn child_count(&self, query: &HierarchicalQuery<T>) -> usize;

    /// A page of the children of `query.parent` (top level when `None`).
    fn fetch_children(&self, query: &HierarchicalQuery<T>) -> Vec<T>;

    /// Returns `true` if `item` can be expanded.
    fn has_children(&self, item: &T) -> bool;

    /// Returns `true` if all rows are held in memory.
    fn is_in_memory(&self) -> bool {
        true
    }

    /// Emitted after the served rows changed (regroup, item set change).
    fn refreshed(&self) -> &Signal<()>;
}
