//! Grouping dimensions and generated-value providers.

use std::fmt;
use std::sync::Arc;

use crate::model::{PropertyPath, Value};

/// One grouping dimension.
///
/// Either a schema property path read directly from items (through reference
/// hops), or the name of a generated property whose values come from a
/// registered [`GroupPropertyValueProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupProperty {
    /// A property path resolved against the item schema.
    SchemaPath(PropertyPath),
    /// A computed property, keyed by provider name.
    Generated(String),
}

impl GroupProperty {
    /// A generated property named `name`.
    pub fn generated(name: impl Into<String>) -> Self {
        Self::Generated(name.into())
    }

    /// The schema path, if this is a schema property.
    pub fn as_path(&self) -> Option<&PropertyPath> {
        match self {
            Self::SchemaPath(path) => Some(path),
            Self::Generated(_) => None,
        }
    }

    /// The underlying key: the dotted path or the provider name.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl From<PropertyPath> for GroupProperty {
    fn from(path: PropertyPath) -> Self {
        Self::SchemaPath(path)
    }
}

impl fmt::Display for GroupProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaPath(path) => write!(f, "{path}"),
            Self::Generated(name) => f.write_str(name),
        }
    }
}

/// Arguments passed to a [`GroupPropertyValueProvider`].
#[derive(Debug)]
pub struct GroupingPropertyContext<'a, T> {
    /// The item being grouped.
    pub item: &'a T,
    /// Name of the generated property being evaluated.
    pub property: &'a str,
}

/// Computes the grouping value of a generated property for one item.
pub type GroupPropertyValueProvider<T> =
    Arc<dyn Fn(&GroupingPropertyContext<'_, T>) -> Value + Send + Sync>;
