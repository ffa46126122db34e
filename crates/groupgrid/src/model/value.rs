//! Property values read from items.
//!
//! [`Value`] is what a schema property path or a generated-property provider
//! yields for one item. Grouping keys are built from values, so unlike a plain
//! display payload a `Value` has value-based `Eq` and `Hash`: floats compare by
//! their normalised bit pattern, references by the key of the referenced
//! object.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use super::meta::PropertyAccess;

/// The declared type of a schema property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Text.
    String,
    /// Signed integer.
    Int,
    /// Floating point number.
    Float,
    /// Boolean flag.
    Bool,
    /// Calendar date.
    Date,
    /// Date and time without zone.
    DateTime,
    /// Link to another object.
    Reference,
}

impl ValueType {
    /// Returns `true` for types that support arithmetic aggregation.
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Int | ValueType::Float)
    }

    /// Returns `true` for types with a natural ordering beyond equality.
    pub fn is_temporal(self) -> bool {
        matches!(self, ValueType::Date | ValueType::DateTime)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::Date => "date",
            ValueType::DateTime => "datetime",
            ValueType::Reference => "reference",
        };
        f.write_str(name)
    }
}

/// A link from one item to another object, as read through a reference
/// property.
///
/// Two references are equal when their keys are equal; the caption is what
/// the reference displays as.
#[derive(Clone)]
pub struct Reference {
    key: String,
    caption: String,
    target: Arc<dyn PropertyAccess>,
}

impl Reference {
    /// Creates a reference to `target`, identified by `key`.
    pub fn new(
        key: impl Into<String>,
        caption: impl Into<String>,
        target: Arc<dyn PropertyAccess>,
    ) -> Self {
        Self {
            key: key.into(),
            caption: caption.into(),
            target,
        }
    }

    /// Identity of the referenced object.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display text of the referenced object.
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// The referenced object, for reading further path segments.
    pub fn target(&self) -> &dyn PropertyAccess {
        self.target.as_ref()
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Reference {}

impl Hash for Reference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("key", &self.key)
            .field("caption", &self.caption)
            .finish_non_exhaustive()
    }
}

/// A single property value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value (missing property, empty reference hop, unknown provider).
    #[default]
    None,
    /// Text.
    String(String),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Date and time without zone.
    DateTime(NaiveDateTime),
    /// Link to another object.
    Reference(Reference),
}

impl Value {
    /// Returns `true` if this is [`Value::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// The type of the stored value, or `None` for [`Value::None`].
    pub fn value_type(&self) -> Option<ValueType> {
        Some(match self {
            Value::None => return None,
            Value::String(_) => ValueType::String,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Bool(_) => ValueType::Bool,
            Value::Date(_) => ValueType::Date,
            Value::DateTime(_) => ValueType::DateTime,
            Value::Reference(_) => ValueType::Reference,
        })
    }

    /// Get as a string slice, if this is string data.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer, if this is integer data.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as a float, converting integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as a boolean, if this is boolean data.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as a date, if this is date data.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Get as a reference, if this is reference data.
    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Reference(r) => Some(r),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::None => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::Date(_) => 4,
            Value::DateTime(_) => 5,
            Value::Reference(_) => 6,
        }
    }
}

/// Canonical bit pattern for float equality and hashing: `-0.0` folds into
/// `0.0` and every NaN into one NaN.
fn float_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_bits(*a) == float_bits(*b),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Reference(a), Value::Reference(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::None => {}
            Value::String(s) => s.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Float(n) => float_bits(*n).hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
            Value::DateTime(d) => d.hash(state),
            Value::Reference(r) => r.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => Ok(()),
            Value::String(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            Value::Reference(r) => f.write_str(r.caption()),
        }
    }
}

/// Total ordering over values used for sorting and min/max aggregation.
///
/// [`Value::None`] sorts first. Integers and floats compare numerically with
/// each other. Values of unrelated types order by a fixed type rank.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(sa), Value::String(sb)) => sa.cmp(sb),
        (Value::Int(ia), Value::Int(ib)) => ia.cmp(ib),
        (Value::Bool(ba), Value::Bool(bb)) => ba.cmp(bb),
        (Value::Date(da), Value::Date(db)) => da.cmp(db),
        (Value::DateTime(da), Value::DateTime(db)) => da.cmp(db),
        (Value::Reference(ra), Value::Reference(rb)) => ra
            .caption()
            .cmp(rb.caption())
            .then_with(|| ra.key().cmp(rb.key())),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            match (a.as_f64(), b.as_f64()) {
                (Some(fa), Some(fb)) => fa.total_cmp(&fb),
                _ => Ordering::Equal,
            }
        }
        _ => a.rank().cmp(&b.rank()),
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::DateTime(d)
    }
}

impl From<Reference> for Value {
    fn from(r: Reference) -> Self {
        Value::Reference(r)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::None, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Named(&'static str);

    impl PropertyAccess for Named {
        fn property_value(&self, name: &str) -> Value {
            match name {
                "name" => Value::from(self.0),
                _ => Value::None,
            }
        }
    }

    #[test]
    fn test_float_equality_is_bitwise_normalised() {
        assert_eq!(Value::Float(0.0), Value::Float(-0.0));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(1.0), Value::Int(1));

        let set: HashSet<Value> = [Value::Float(0.0), Value::Float(-0.0)].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_reference_equality_by_key() {
        let a = Reference::new("d-1", "Engineering", Arc::new(Named("Engineering")));
        let b = Reference::new("d-1", "Eng (renamed)", Arc::new(Named("Eng")));
        let c = Reference::new("d-2", "Engineering", Arc::new(Named("Engineering")));

        assert_eq!(Value::from(a.clone()), Value::from(b));
        assert_ne!(Value::from(a.clone()), Value::from(c));
        assert_eq!(a.target().property_value("name"), Value::from("Engineering"));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(&Value::Int(2), &Value::Float(2.5)), Ordering::Less);
        assert_eq!(compare_values(&Value::None, &Value::Int(-10)), Ordering::Less);
        assert_eq!(
            compare_values(&Value::from("b"), &Value::from("a")),
            Ordering::Greater
        );

        let early = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let late = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(compare_values(&early.into(), &late.into()), Ordering::Less);
    }

    #[test]
    fn test_display() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::from(date).to_string(), "2024-03-09");
        assert_eq!(Value::None.to_string(), "");
        assert_eq!(Value::from(Some(7)).to_string(), "7");
        assert_eq!(Value::from(None::<i64>), Value::None);
    }

    #[test]
    fn test_value_type() {
        assert_eq!(Value::Int(1).value_type(), Some(ValueType::Int));
        assert_eq!(Value::None.value_type(), None);
        assert!(ValueType::Float.is_numeric());
        assert!(!ValueType::String.is_numeric());
        assert!(ValueType::Date.is_temporal());
    }
}
