//! Built-in aggregations and the value types they apply to.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::model::{Value, ValueType, compare_values};

use super::info::AggregationType;

const NUMERIC: &[AggregationType] = &[
    AggregationType::Sum,
    AggregationType::Count,
    AggregationType::Avg,
    AggregationType::Min,
    AggregationType::Max,
];
const TEMPORAL: &[AggregationType] = &[
    AggregationType::Count,
    AggregationType::Min,
    AggregationType::Max,
];
const COUNT_ONLY: &[AggregationType] = &[AggregationType::Count];

/// Registry of the built-in aggregations supported per value type.
#[derive(Debug, Clone)]
pub struct Aggregations {
    supported: HashMap<ValueType, Vec<AggregationType>>,
}

impl Default for Aggregations {
    fn default() -> Self {
        let mut supported = HashMap::new();
        for value_type in [ValueType::Int, ValueType::Float] {
            supported.insert(value_type, NUMERIC.to_vec());
        }
        for value_type in [ValueType::Date, ValueType::DateTime] {
            supported.insert(value_type, TEMPORAL.to_vec());
        }
        for value_type in [ValueType::String, ValueType::Bool, ValueType::Reference] {
            supported.insert(value_type, COUNT_ONLY.to_vec());
        }
        Self { supported }
    }
}

impl Aggregations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the aggregations supported for `value_type`.
    pub fn register(&mut self, value_type: ValueType, supported: Vec<AggregationType>) {
        self.supported.insert(value_type, supported);
    }

    pub fn supported(&self, value_type: ValueType) -> &[AggregationType] {
        self.supported
            .get(&value_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns `true` if the built-in `aggregation` applies to `value_type`.
    pub fn supports(&self, value_type: ValueType, aggregation: AggregationType) -> bool {
        aggregation != AggregationType::Custom && self.supported(value_type).contains(&aggregation)
    }

    /// Folds `values` with a built-in aggregation.
    ///
    /// `Count` counts all values; the others skip [`Value::None`]. A `Sum` of
    /// nothing is zero of `value_type`; `Avg`, `Min` and `Max` of nothing are
    /// [`Value::None`]. `Custom` is not built in and yields [`Value::None`].
    pub fn compute(aggregation: AggregationType, value_type: ValueType, values: &[Value]) -> Value {
        match aggregation {
            AggregationType::Count => Value::Int(values.len() as i64),
            AggregationType::Sum => sum(value_type, values),
            AggregationType::Avg => avg(values),
            AggregationType::Min => extreme(values, Ordering::Less),
            AggregationType::Max => extreme(values, Ordering::Greater),
            AggregationType::Custom => Value::None,
        }
    }
}

fn sum(value_type: ValueType, values: &[Value]) -> Value {
    let floating = value_type == ValueType::Float || values.iter().any(|v| matches!(v, Value::Float(_)));
    if floating {
        Value::Float(values.iter().filter_map(Value::as_f64).sum())
    } else {
        Value::Int(
            values
                .iter()
                .filter_map(Value::as_int)
                .fold(0i64, i64::saturating_add),
        )
    }
}

fn avg(values: &[Value]) -> Value {
    let numbers: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
    if numbers.is_empty() {
        return Value::None;
    }
    Value::Float(numbers.iter().sum::<f64>() / numbers.len() as f64)
}

fn extreme(values: &[Value], wanted: Ordering) -> Value {
    values
        .iter()
        .filter(|v| !v.is_none())
        .fold(None::<&Value>, |best, v| match best {
            Some(b) if compare_values(v, b) != wanted => Some(b),
            _ => Some(v),
        })
        .cloned()
        .unwrap_or_default()
}
