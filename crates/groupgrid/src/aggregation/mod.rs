//! Column aggregation.
//!
//! Columns register an [`AggregationInfo`] with the [`AggregationOverlay`];
//! built-in aggregation types are checked against the column property's
//! [`ValueType`](crate::model::ValueType) through the [`Aggregations`]
//! registry when results are computed.
//!
//! | Value type                 | Supported                  |
//! |----------------------------|----------------------------|
//! | `Int`, `Float`             | Sum, Count, Avg, Min, Max  |
//! | `Date`, `DateTime`         | Count, Min, Max            |
//! | `String`, `Bool`, `Reference` | Count                   |
//!
//! `Custom` aggregations apply to any column and are computed by an
//! [`AggregationStrategy`].

mod info;
mod overlay;
mod strategies;

pub use info::{AggregationFormatter, AggregationInfo, AggregationPosition, AggregationStrategy, AggregationType};
pub use overlay::{AggregationCell, AggregationOverlay, AggregationRow};
pub use strategies::Aggregations;
