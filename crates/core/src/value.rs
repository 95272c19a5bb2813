//! Value type definitions for the Pivotal table engine.
//!
//! This module defines the `Value` enum which represents any value that can be
//! stored in a column slot, and the coercion rules applied when a value is
//! written into a column of a fixed type.

use crate::error::{Error, Result};
use crate::types::DataType;
use alloc::string::{String, ToString};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Milliseconds in one day, used to convert between dates and datetimes.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// A value that can be stored in a column slot.
#[derive(Clone, Debug)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Boolean(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string
    String(String),
    /// Date stored as days since the Unix epoch
    Date(i32),
    /// DateTime stored as Unix timestamp in milliseconds
    DateTime(i64),
}

impl Value {
    /// Returns the data type of this value, or None if it's Null.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::String(_) => Some(DataType::String),
            Value::Date(_) => Some(DataType::Date),
            Value::DateTime(_) => Some(DataType::DateTime),
        }
    }

    /// Returns true if this value is Null.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for integer and float values.
    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int64(_) | Value::Float64(_))
    }

    /// Returns the boolean value if this is a Boolean, None otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the i64 value if this is an Int64, None otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the f64 value if this is a Float64, None otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a String, None otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns the day number if this is a Date, None otherwise.
    pub fn as_date(&self) -> Option<i32> {
        match self {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the datetime timestamp if this is a DateTime, None otherwise.
    pub fn as_datetime(&self) -> Option<i64> {
        match self {
            Value::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    /// Widens an integer or float to f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Coerces this value into a column of type `target`.
    ///
    /// Numerically compatible values convert (an integral float fits an
    /// integer column, an integer widens to float); anything else is a
    /// type mismatch reported against `column`. Negative zero comes out as
    /// `0.0`, so equal keys always carry the same bits.
    pub fn coerce(self, column: &str, target: DataType) -> Result<Value> {
        let this = match self {
            Value::Float64(f) if f == 0.0 => Value::Float64(0.0),
            other => other,
        };
        this.coerce_canonical(column, target)
    }

    fn coerce_canonical(self, column: &str, target: DataType) -> Result<Value> {
        if self.is_null() || self.data_type() == Some(target) {
            return Ok(self);
        }
        let coerced = match (&self, target) {
            (Value::Int64(i), DataType::Float64) => Some(Value::Float64(*i as f64)),
            (Value::Int64(i), DataType::Date) => i32::try_from(*i).ok().map(Value::Date),
            (Value::Int64(i), DataType::DateTime) => Some(Value::DateTime(*i)),
            (Value::Float64(f), DataType::Int64) => integral(*f).map(Value::Int64),
            (Value::Float64(f), DataType::Date) => {
                integral(*f).and_then(|i| i32::try_from(i).ok()).map(Value::Date)
            }
            (Value::Float64(f), DataType::DateTime) => integral(*f).map(Value::DateTime),
            (Value::Date(d), DataType::DateTime) => Some(Value::DateTime(*d as i64 * MILLIS_PER_DAY)),
            (Value::DateTime(t), DataType::Date) if t % MILLIS_PER_DAY == 0 => {
                i32::try_from(t / MILLIS_PER_DAY).ok().map(Value::Date)
            }
            _ => None,
        };
        coerced.ok_or_else(|| Error::type_mismatch(column, target, self))
    }
}

/// Returns the float as an i64 when it has no fractional part.
fn integral(f: f64) -> Option<i64> {
    if !f.is_finite() || f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return None;
    }
    let i = f as i64;
    if i as f64 == f {
        Some(i)
    } else {
        None
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(b) => b.hash(state),
            Value::Int64(i) => i.hash(state),
            Value::Float64(f) => {
                // 0.0 == -0.0 and NaN == NaN, so hash them alike.
                let bits = if *f == 0.0 {
                    0u64
                } else if f.is_nan() {
                    f64::NAN.to_bits()
                } else {
                    f.to_bits()
                };
                bits.hash(state)
            }
            Value::String(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
            Value::DateTime(d) => d.hash(state),
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            // Cross-type numeric comparisons
            (Value::Int64(a), Value::Float64(b)) => {
                let a_f64 = *a as f64;
                if b.is_nan() {
                    Ordering::Less
                } else {
                    a_f64.partial_cmp(b).unwrap_or(Ordering::Equal)
                }
            }
            (Value::Float64(a), Value::Int64(b)) => {
                let b_f64 = *b as f64;
                if a.is_nan() {
                    Ordering::Greater
                } else {
                    a.partial_cmp(&b_f64).unwrap_or(Ordering::Equal)
                }
            }
            (Value::Float64(a), Value::Float64(b)) => {
                // Handle NaN: treat NaN as greater than all other values
                match (a.is_nan(), b.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
                }
            }
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            // Different types: order by type discriminant
            _ => self.type_order().cmp(&other.type_order()),
        }
    }
}

impl Value {
    /// Returns a type ordering value for comparing different types.
    fn type_order(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Int64(_) => 2,
            Value::Float64(_) => 3,
            Value::String(_) => 4,
            Value::Date(_) => 5,
            Value::DateTime(_) => 6,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Int64(i) => write!(f, "{}", i),
            Value::Float64(v) => write!(f, "{}", v),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}d", d),
            Value::DateTime(t) => write!(f, "{}ms", t),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Int64(i) => serializer.serialize_i64(*i),
            Value::Float64(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Date(d) => serializer.serialize_i64(*d as i64 * MILLIS_PER_DAY),
            Value::DateTime(t) => serializer.serialize_i64(*t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_value_type_check() {
        assert_eq!(Value::Int64(42).data_type(), Some(DataType::Int64));
        assert_eq!(Value::Date(3).data_type(), Some(DataType::Date));
        assert_eq!(Value::Null.data_type(), None);
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert_eq!(Value::Int64(100).as_i64(), Some(100));
        assert_eq!(Value::Float64(3.5).as_f64(), Some(3.5));
        assert_eq!(Value::String("hello".into()).as_str(), Some("hello"));
        assert_eq!(Value::DateTime(1234567890).as_datetime(), Some(1234567890));
        assert_eq!(Value::Int64(2).to_f64(), Some(2.0));
        assert_eq!(Value::String("2".into()).to_f64(), None);
    }

    #[test]
    fn test_value_ordering() {
        assert!(Value::Int64(1) < Value::Int64(2));
        assert!(Value::Float64(5.5) < Value::Float64(6.25));
        assert!(Value::Int64(2) < Value::Float64(2.5));
        assert!(Value::String("a".into()) < Value::String("b".into()));
        assert!(Value::Null < Value::Int64(0));
    }

    #[test]
    fn test_coerce_drops_sign_of_zero() {
        let v = Value::Float64(-0.0).coerce("k", DataType::Float64).unwrap();
        match v {
            Value::Float64(f) => assert!(f.is_sign_positive()),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            Value::Float64(-0.0).coerce("k", DataType::Int64).unwrap(),
            Value::Int64(0)
        );
    }

    #[test]
    fn test_coerce_widens_integers() {
        let v = Value::Int64(4).coerce("x", DataType::Float64).unwrap();
        assert_eq!(v, Value::Float64(4.0));
    }

    #[test]
    fn test_coerce_integral_float_into_integer() {
        assert_eq!(
            Value::Float64(8.0).coerce("x", DataType::Int64).unwrap(),
            Value::Int64(8)
        );
        let err = Value::Float64(2.5).coerce("x", DataType::Int64).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_coerce_rejects_incompatible() {
        let err = Value::String("a".into()).coerce("x", DataType::Int64).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        let err = Value::Boolean(true).coerce("x", DataType::String).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_coerce_null_and_dates() {
        assert_eq!(Value::Null.coerce("x", DataType::Boolean).unwrap(), Value::Null);
        assert_eq!(
            Value::Date(1).coerce("x", DataType::DateTime).unwrap(),
            Value::DateTime(MILLIS_PER_DAY)
        );
        assert_eq!(
            Value::Int64(19000).coerce("x", DataType::Date).unwrap(),
            Value::Date(19000)
        );
    }

    #[test]
    fn test_zero_hashes_alike() {
        use core::hash::BuildHasher;
        let state = hashbrown::hash_map::DefaultHashBuilder::default();
        assert_eq!(
            state.hash_one(Value::Float64(0.0)),
            state.hash_one(Value::Float64(-0.0))
        );
    }
}
