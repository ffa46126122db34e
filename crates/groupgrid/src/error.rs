//! Error types for the grouping grid.

use crate::config::ConfigError;

/// Result type alias for grouping grid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or querying the grid.
///
/// Read-path queries about unknown groups never fail; they answer empty.
/// Everything here is either a setup mistake surfaced to the caller of a
/// mutating API or an internal consistency failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A grouping pass produced no group for an item.
    #[error("Item '{item}' was not assigned to any group")]
    MissingItemGroup { item: String },

    /// An item is not part of the bound item source.
    #[error("Item '{id}' is not present in the item source")]
    ItemNotFound { id: String },

    /// An aggregation is already registered for the column.
    #[error("Aggregation for column '{column}' already exists")]
    DuplicateAggregation { column: String },

    /// Aggregation results were requested while aggregation is disabled.
    #[error("Aggregation is not enabled")]
    AggregationDisabled,

    /// Aggregation results were requested without bound items.
    #[error("Unable to aggregate: items are not bound")]
    ItemsNotBound,

    /// A built-in aggregation was registered for a column without a property.
    #[error("Unable to aggregate column '{column}' without property")]
    AggregationWithoutProperty { column: String },

    /// A custom aggregation has no strategy to compute it.
    #[error("Custom aggregation for column '{column}' has no strategy")]
    MissingAggregationStrategy { column: String },

    /// The aggregation type does not apply to the property's value type.
    #[error(
        "Unable to aggregate column '{column}' with data type '{value_type}' with default aggregation strategy: {aggregation}"
    )]
    UnsupportedAggregation {
        column: String,
        value_type: String,
        aggregation: String,
    },

    /// A column was moved to a position outside the column list.
    #[error(
        "Index '{index}' is out of range. Available indexes to move column: from 0 to {max} including bounds"
    )]
    ColumnIndexOutOfRange { index: usize, max: usize },

    /// No column with the key exists.
    #[error("Column '{key}' does not exist")]
    UnknownColumn { key: String },

    /// A column with the key already exists.
    #[error("Column '{key}' already exists")]
    DuplicateColumn { key: String },

    /// A property path does not resolve against the class.
    #[error("Property '{path}' not found in class '{class}'")]
    UnknownProperty { class: String, path: String },

    /// A class name is not registered.
    #[error("Class '{name}' is not registered")]
    UnknownMetaClass { name: String },

    /// Loading a configuration document failed.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Create a missing item group error.
    pub fn missing_item_group(item: impl ToString) -> Self {
        Self::MissingItemGroup {
            item: item.to_string(),
        }
    }

    /// Create an item not found error.
    pub fn item_not_found(id: impl ToString) -> Self {
        Self::ItemNotFound { id: id.to_string() }
    }

    /// Create a duplicate aggregation error.
    pub fn duplicate_aggregation(column: impl Into<String>) -> Self {
        Self::DuplicateAggregation {
            column: column.into(),
        }
    }

    /// Create an unsupported aggregation error.
    pub fn unsupported_aggregation(
        column: impl Into<String>,
        value_type: impl ToString,
        aggregation: impl ToString,
    ) -> Self {
        Self::UnsupportedAggregation {
            column: column.into(),
            value_type: value_type.to_string(),
            aggregation: aggregation.to_string(),
        }
    }

    /// Create an unknown column error.
    pub fn unknown_column(key: impl Into<String>) -> Self {
        Self::UnknownColumn { key: key.into() }
    }

    /// Create an unknown property error.
    pub fn unknown_property(class: impl Into<String>, path: impl Into<String>) -> Self {
        Self::UnknownProperty {
            class: class.into(),
            path: path.into(),
        }
    }

    /// Create an unknown class error.
    pub fn unknown_meta_class(name: impl Into<String>) -> Self {
        Self::UnknownMetaClass { name: name.into() }
    }
}

static_assertions::assert_impl_all!(Error: Send, Sync);
