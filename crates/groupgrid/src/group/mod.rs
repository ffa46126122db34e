//! Multi-level row grouping.
//!
//! This module turns a flat item source into a tree of groups:
//!
//! - [`GroupProperty`]: one grouping dimension (schema path or generated)
//! - [`GroupIdentity`]: ordered (property, value) pairs naming one group node
//! - [`GroupIndex`]: the immutable tree produced by one grouping pass
//! - [`GroupingEngine`]: owns the tree, rebuilds it on every change
//! - [`GroupQuery`]: the read-only query surface used by the adapters
//!
//! # Grouping Order
//!
//! Root groups and child groups appear in the order their first item appears
//! in the source, not sorted by value. To order groups, sort the source.
//!
//! # Example
//!
//! ```ignore
//! let engine = GroupingEngine::new(source);
//! engine.group_by(vec![dept.into(), team.into()])?;
//!
//! for root in engine.root_groups() {
//!     println!("{} ({})", root.value(), engine.group_items_count(&root));
//!     for child in engine.children(&root) {
//!         println!("  {}", child.value());
//!     }
//! }
//! ```

mod engine;
mod identity;
mod index;
mod property;
mod query;

pub use engine::{GroupSignals, GroupingEngine};
pub use identity::GroupIdentity;
pub use index::GroupIndex;
pub use property::{GroupProperty, GroupPropertyValueProvider, GroupingPropertyContext};
pub use query::{EmptyGroupQuery, GroupQuery};
