//! Groupgrid - multi-level row grouping for tabular data.
//!
//! Groupgrid turns a flat item source into a tree of groups, serves that tree
//! through a lazy, paged tree-fetch protocol with synthetic group rows, and
//! aggregates column values. Everything is rebuilt eagerly and synchronously
//! on every change, so readers never see a partially updated tree.
//!
//! # Modules
//!
//! - [`model`]: values, schema metadata and the observable item source
//! - [`group`]: the grouping engine and its query surface
//! - [`hierarchy`]: the paged tree view and the client paging protocol
//! - [`aggregation`]: per-column aggregations
//! - [`grid`]: columns and the [`GroupDataGrid`] facade
//! - [`config`]: TOML/JSON grid configuration
//!
//! # Example
//!
//! ```ignore
//! use groupgrid::prelude::*;
//!
//! let grid = GroupDataGrid::new(metadata);
//! grid.add_property_column("dept", "Employee", "dept")?;
//! grid.add_property_column("team", "Employee", "team")?;
//! grid.set_items(Arc::new(ItemList::new(employees)))?;
//! grid.group_by_columns(&["dept", "team"])?;
//!
//! let communicator = grid.communicator().unwrap();
//! let updates = communicator.set_requested_range(&FetchContext::new(1), 0, 50);
//! ```

pub mod aggregation;
pub mod config;
pub mod error;
pub mod grid;
pub mod group;
pub mod hierarchy;
pub mod model;

pub use groupgrid_core;

pub use aggregation::{AggregationInfo, AggregationPosition, AggregationType};
pub use config::{ConfigError, GroupGridConfig};
pub use error::{Error, Result};
pub use grid::{Column, GroupDataGrid};
pub use group::{GroupIdentity, GroupProperty, GroupQuery, GroupingEngine};
pub use hierarchy::{GroupDataCommunicator, HierarchicalDataProvider, HierarchicalGroupAdapter};

/// Commonly used types.
pub mod prelude {
    pub use crate::aggregation::{
        AggregationInfo, AggregationPosition, AggregationRow, AggregationStrategy, AggregationType,
    };
    pub use crate::config::GroupGridConfig;
    pub use crate::error::{Error, Result};
    pub use crate::grid::{AccessManager, Column, GroupDataGrid};
    pub use crate::group::{GroupIdentity, GroupProperty, GroupQuery, GroupingEngine};
    pub use crate::hierarchy::{
        FetchContext, GroupDataCommunicator, GroupRowFactory, HierarchicalDataProvider,
        HierarchicalGroupAdapter, HierarchicalQuery, Query, RangeUpdate,
    };
    pub use crate::model::{
        BindingState, Entity, ItemList, ItemSource, MetaClass, MetaProperty, Metadata,
        PropertyAccess, PropertyPath, Value, ValueType,
    };
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use static_assertions::assert_impl_all;

    #[derive(Debug, Clone)]
    struct Row;

    impl model::PropertyAccess for Row {
        fn property_value(&self, _name: &str) -> model::Value {
            model::Value::None
        }
    }

    impl model::Entity for Row {
        type Id = u32;

        fn id(&self) -> u32 {
            0
        }
    }

    assert_impl_all!(GroupingEngine<Row>: Send, Sync);
    assert_impl_all!(HierarchicalGroupAdapter<Row>: Send, Sync);
    assert_impl_all!(GroupDataCommunicator<Row>: Send, Sync);
    assert_impl_all!(GroupDataGrid<Row>: Send, Sync);
}
