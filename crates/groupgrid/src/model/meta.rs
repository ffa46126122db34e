//! Schema metadata for grid items.
//!
//! Items expose their properties by name through [`PropertyAccess`]. A
//! [`Metadata`] registry describes the item classes ([`MetaClass`]) and
//! resolves dotted paths such as `"department.name"` into a validated
//! [`PropertyPath`], which then reads values through reference hops.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{Error, Result};

use super::value::{Value, ValueType};

/// Read access to named properties of an object.
///
/// This is object safe so referenced objects can be stored behind
/// `Arc<dyn PropertyAccess>` inside a [`Reference`](super::Reference).
pub trait PropertyAccess: Send + Sync {
    /// Returns the value of property `name`, or [`Value::None`] if the object
    /// has no such property or it is unset.
    fn property_value(&self, name: &str) -> Value;
}

/// A row object shown by the grid.
///
/// # Example
///
/// ```
/// use groupgrid::model::{Entity, PropertyAccess, Value};
///
/// #[derive(Debug, Clone)]
/// struct Employee {
///     id: u32,
///     dept: String,
/// }
///
/// impl PropertyAccess for Employee {
///     fn property_value(&self, name: &str) -> Value {
///         match name {
///             "dept" => Value::from(self.dept.as_str()),
///             _ => Value::None,
///         }
///     }
/// }
///
/// impl Entity for Employee {
///     type Id = u32;
///
///     fn id(&self) -> u32 {
///         self.id
///     }
/// }
/// ```
pub trait Entity: PropertyAccess + Clone + fmt::Debug + 'static {
    /// Stable identity of an item.
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Returns the identity of this item.
    fn id(&self) -> Self::Id;

    /// Builds a new, empty instance of the same runtime kind with a fresh id.
    ///
    /// Used as the last-resort way to produce synthetic group rows.
    fn blank(&self) -> Option<Self> {
        None
    }
}

/// Schema-driven construction of blank items, used for synthetic group rows.
pub trait EntityFactory<T: Entity>: Send + Sync {
    /// Creates an empty instance of `class` with a fresh id.
    fn create(&self, class: &MetaClass) -> Option<T>;
}

/// Description of one property of a [`MetaClass`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaProperty {
    name: String,
    value_type: ValueType,
    reference_class: Option<String>,
}

impl MetaProperty {
    /// A plain data property.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            reference_class: None,
        }
    }

    /// A reference to an object of class `class`.
    pub fn reference(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value_type: ValueType::Reference,
            reference_class: Some(class.into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Class of the referenced object, for reference properties.
    pub fn reference_class(&self) -> Option<&str> {
        self.reference_class.as_deref()
    }
}

/// Description of an item class: its name and properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaClass {
    name: String,
    properties: Vec<MetaProperty>,
}

impl MetaClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Adds a property (builder style).
    pub fn with_property(mut self, property: MetaProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[MetaProperty] {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&MetaProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Registry of known item classes.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    classes: HashMap<String, Arc<MetaClass>>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `class`, replacing any class of the same name.
    pub fn register(&mut self, class: MetaClass) -> Arc<MetaClass> {
        let class = Arc::new(class);
        self.classes.insert(class.name.clone(), class.clone());
        class
    }

    pub fn class(&self, name: &str) -> Option<Arc<MetaClass>> {
        self.classes.get(name).cloned()
    }

    /// Resolves a dotted property path starting at class `class`.
    ///
    /// Every segment but the last must be a reference property whose target
    /// class is registered.
    pub fn resolve_path(&self, class: &str, path: &str) -> Result<PropertyPath> {
        let owner = self.class(class).ok_or_else(|| Error::unknown_meta_class(class))?;
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();

        let mut enclosing = owner.clone();
        let mut value_type = None;
        for (i, segment) in segments.iter().enumerate() {
            let property = enclosing
                .property(segment)
                .ok_or_else(|| Error::unknown_property(owner.name(), path))?;
            value_type = Some(property.value_type());

            if i + 1 < segments.len() {
                let target = property
                    .reference_class()
                    .ok_or_else(|| Error::unknown_property(owner.name(), path))?;
                enclosing = self.class(target).ok_or_else(|| Error::unknown_meta_class(target))?;
            }
        }

        let value_type = value_type.ok_or_else(|| Error::unknown_property(owner.name(), path))?;
        Ok(PropertyPath {
            owner,
            segments: segments.into(),
            value_type,
            enclosing,
        })
    }

    /// Formats a value as display text.
    pub fn format(&self, value: &Value) -> String {
        match value {
            Value::Bool(true) => "Yes".to_string(),
            Value::Bool(false) => "No".to_string(),
            other => other.to_string(),
        }
    }
}

/// A validated path from an item class to a (possibly nested) property.
///
/// Equality and hashing use the owner class name and the segments.
#[derive(Debug, Clone)]
pub struct PropertyPath {
    owner: Arc<MetaClass>,
    segments: Arc<[String]>,
    value_type: ValueType,
    enclosing: Arc<MetaClass>,
}

impl PropertyPath {
    /// The class the path starts from.
    pub fn owner(&self) -> &Arc<MetaClass> {
        &self.owner
    }

    /// The class declaring the last property of the path.
    pub fn enclosing(&self) -> &Arc<MetaClass> {
        &self.enclosing
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The declared type of the last property.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Returns `true` if the path goes through at least one reference.
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// Reads the value of this path from `item`, following references.
    ///
    /// An empty reference along the way yields [`Value::None`].
    pub fn value_of(&self, item: &dyn PropertyAccess) -> Value {
        let Some((first, rest)) = self.segments.split_first() else {
            return Value::None;
        };

        let mut current = item.property_value(first);
        for segment in rest {
            current = match current {
                Value::Reference(reference) => reference.target().property_value(segment),
                _ => return Value::None,
            };
        }
        current
    }
}

impl PartialEq for PropertyPath {
    fn eq(&self, other: &Self) -> bool {
        self.owner.name == other.owner.name && self.segments == other.segments
    }
}

impl Eq for PropertyPath {}

impl Hash for PropertyPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.name.hash(state);
        self.segments.hash(state);
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reference;

    struct Department {
        name: &'static str,
    }

    impl PropertyAccess for Department {
        fn property_value(&self, name: &str) -> Value {
            match name {
                "name" => Value::from(self.name),
                _ => Value::None,
            }
        }
    }

    struct Employee {
        department: Option<Arc<Department>>,
    }

    impl PropertyAccess for Employee {
        fn property_value(&self, name: &str) -> Value {
            match name {
                "department" => match &self.department {
                    Some(dept) => Value::from(Reference::new(dept.name, dept.name, dept.clone())),
                    None => Value::None,
                },
                _ => Value::None,
            }
        }
    }

    fn metadata() -> Metadata {
        let mut metadata = Metadata::new();
        metadata.register(
            MetaClass::new("Department").with_property(MetaProperty::new("name", ValueType::String)),
        );
        metadata.register(
            MetaClass::new("Employee")
                .with_property(MetaProperty::new("salary", ValueType::Float))
                .with_property(MetaProperty::reference("department", "Department")),
        );
        metadata
    }

    #[test]
    fn test_resolve_nested_path() {
        let path = metadata().resolve_path("Employee", "department.name").unwrap();

        assert_eq!(path.owner().name(), "Employee");
        assert_eq!(path.enclosing().name(), "Department");
        assert_eq!(path.value_type(), ValueType::String);
        assert!(path.is_nested());
        assert_eq!(path.to_string(), "department.name");
    }

    #[test]
    fn test_resolve_unknown_property() {
        let err = metadata().resolve_path("Employee", "department.budget").unwrap_err();
        assert!(matches!(err, Error::UnknownProperty { .. }));

        let err = metadata().resolve_path("Employee", "salary.amount").unwrap_err();
        assert!(matches!(err, Error::UnknownProperty { .. }));

        let err = metadata().resolve_path("Project", "name").unwrap_err();
        assert!(matches!(err, Error::UnknownMetaClass { .. }));
    }

    #[test]
    fn test_value_through_reference() {
        let path = metadata().resolve_path("Employee", "department.name").unwrap();

        let staffed = Employee {
            department: Some(Arc::new(Department { name: "Eng" })),
        };
        assert_eq!(path.value_of(&staffed), Value::from("Eng"));

        let unassigned = Employee { department: None };
        assert_eq!(path.value_of(&unassigned), Value::None);
    }

    #[test]
    fn test_path_equality() {
        let metadata = metadata();
        let a = metadata.resolve_path("Employee", "salary").unwrap();
        let b = metadata.resolve_path("Employee", "salary").unwrap();
        let c = metadata.resolve_path("Employee", "department").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_format() {
        let metadata = metadata();
        assert_eq!(metadata.format(&Value::Bool(true)), "Yes");
        assert_eq!(metadata.format(&Value::Int(12)), "12");
        assert_eq!(metadata.format(&Value::None), "");
    }
}
