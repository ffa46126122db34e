//! Per-column aggregation settings.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::{PropertyPath, Value};

/// How a column's values are folded into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    Sum,
    Count,
    Avg,
    Min,
    Max,
    /// Computed by a caller-supplied [`AggregationStrategy`].
    Custom,
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregationType::Sum => "SUM",
            AggregationType::Count => "COUNT",
            AggregationType::Avg => "AVG",
            AggregationType::Min => "MIN",
            AggregationType::Max => "MAX",
            AggregationType::Custom => "CUSTOM",
        };
        f.write_str(name)
    }
}

/// Where the aggregation row is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPosition {
    /// An extra header row.
    Top,
    /// An extra footer row.
    #[default]
    Bottom,
}

/// A caller-defined aggregation.
///
/// Receives one value per aggregated item, in source order. When the column
/// has no property every value is [`Value::None`].
pub trait AggregationStrategy: Send + Sync {
    fn aggregate(&self, values: &[Value]) -> Value;
}

impl<F> AggregationStrategy for F
where
    F: Fn(&[Value]) -> Value + Send + Sync,
{
    fn aggregate(&self, values: &[Value]) -> Value {
        self(values)
    }
}

/// Renders an aggregated value as cell text.
pub type AggregationFormatter = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Aggregation settings of one column.
///
/// # Example
///
/// ```ignore
/// let info = AggregationInfo::new(AggregationType::Sum)
///     .with_property(headcount)
///     .with_cell_title("Total headcount");
/// grid.add_aggregation_info("headcount", info)?;
/// ```
#[derive(Clone)]
pub struct AggregationInfo {
    property: Option<PropertyPath>,
    aggregation_type: AggregationType,
    strategy: Option<Arc<dyn AggregationStrategy>>,
    formatter: Option<AggregationFormatter>,
    cell_title: Option<String>,
}

impl AggregationInfo {
    pub fn new(aggregation_type: AggregationType) -> Self {
        Self {
            property: None,
            aggregation_type,
            strategy: None,
            formatter: None,
            cell_title: None,
        }
    }

    /// A custom aggregation computed by `strategy`.
    pub fn custom(strategy: impl AggregationStrategy + 'static) -> Self {
        Self::new(AggregationType::Custom).with_strategy(strategy)
    }

    pub fn with_property(mut self, property: PropertyPath) -> Self {
        self.property = Some(property);
        self
    }

    pub fn with_strategy(mut self, strategy: impl AggregationStrategy + 'static) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Tooltip of the rendered cell.
    pub fn with_cell_title(mut self, title: impl Into<String>) -> Self {
        self.cell_title = Some(title.into());
        self
    }

    pub fn property(&self) -> Option<&PropertyPath> {
        self.property.as_ref()
    }

    pub fn aggregation_type(&self) -> AggregationType {
        self.aggregation_type
    }

    pub fn strategy(&self) -> Option<&Arc<dyn AggregationStrategy>> {
        self.strategy.as_ref()
    }

    pub fn cell_title(&self) -> Option<&str> {
        self.cell_title.as_deref()
    }

    /// Formats `value` with the formatter, or its display text.
    pub fn format(&self, value: &Value) -> String {
        match &self.formatter {
            Some(formatter) => formatter(value),
            None => value.to_string(),
        }
    }
}

impl fmt::Debug for AggregationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregationInfo")
            .field("property", &self.property.as_ref().map(ToString::to_string))
            .field("aggregation_type", &self.aggregation_type)
            .field("strategy", &self.strategy.is_some())
            .field("formatter", &self.formatter.is_some())
            .field("cell_title", &self.cell_title)
            .finish()
    }
}
