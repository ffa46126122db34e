//! The grouping data grid facade.
//!
//! [`GroupDataGrid`] ties columns, grouping, the hierarchical view and
//! aggregation together for one bound item source.

mod column;
#[allow(clippy::module_inception)]
mod grid;

pub use column::{AccessManager, AllowAll, Column, ColumnSet};
pub use grid::GroupDataGrid;
