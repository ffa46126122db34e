//! Paged tree view of a grouped item source.
//!
//! - [`HierarchicalDataProvider`]: the lazy tree-fetch protocol
//! - [`HierarchicalGroupAdapter`]: serves a [`GroupingEngine`](crate::group::GroupingEngine)
//!   through that protocol using synthetic group rows
//! - [`GroupRowFactory`]: builds the synthetic rows
//! - [`GroupDataCommunicator`]: client range requests, row keys and
//!   expand/collapse state

mod adapter;
mod communicator;
mod provider;
mod query;
mod row_factory;

pub use adapter::HierarchicalGroupAdapter;
pub use communicator::{
    CommunicatorSettings, CommunicatorSignals, DEFAULT_PAGE_SIZE, EAGER_FETCH_VIEWPORT_SIZE_ESTIMATE,
    FetchContext, GroupDataCommunicator, KeyMapper, RangeUpdate, RowData,
};
pub use provider::HierarchicalDataProvider;
pub use query::{HierarchicalQuery, Query};
pub use row_factory::{GroupRowCallback, GroupRowFactory};
