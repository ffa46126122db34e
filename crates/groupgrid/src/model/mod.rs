//! Item model for the grouping grid.
//!
//! This module defines what the grid is bound to:
//!
//! - [`Value`] / [`ValueType`]: property values with value-based equality
//! - [`PropertyAccess`] / [`Entity`]: how items expose their properties
//! - [`Metadata`], [`MetaClass`], [`PropertyPath`]: schema reflection
//! - [`ItemSource`] / [`ItemList`]: the observable item collection
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use groupgrid::model::{Entity, ItemList, ItemSource, MetaClass, MetaProperty, Metadata, PropertyAccess, Value, ValueType};
//!
//! #[derive(Debug, Clone)]
//! struct Employee { id: u32, dept: &'static str }
//!
//! impl PropertyAccess for Employee {
//!     fn property_value(&self, name: &str) -> Value {
//!         if name == "dept" { Value::from(self.dept) } else { Value::None }
//!     }
//! }
//!
//! impl Entity for Employee {
//!     type Id = u32;
//!     fn id(&self) -> u32 { self.id }
//! }
//!
//! let mut metadata = Metadata::new();
//! let class = metadata.register(
//!     MetaClass::new("Employee").with_property(MetaProperty::new("dept", ValueType::String)),
//! );
//! let list = ItemList::new(vec![Employee { id: 1, dept: "Eng" }]).with_meta_class(class);
//! let dept = metadata.resolve_path("Employee", "dept").unwrap();
//! assert_eq!(dept.value_of(&list.items()[0]), Value::from("Eng"));
//! ```

mod item_list;
mod meta;
mod source;
mod value;

pub use item_list::ItemList;
pub use meta::{Entity, EntityFactory, MetaClass, MetaProperty, Metadata, PropertyAccess, PropertyPath};
pub use source::{BindingState, ChangeKind, ItemSetChange, ItemSource, SortOrder, SourceSignals};
pub use value::{Reference, Value, ValueType, compare_values};
