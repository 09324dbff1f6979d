//! Self-describing MessagePack values.

use std::fmt;

use crate::error::{Error, Result};
use crate::format::marker;

/// A decoded MessagePack value of any shape.
///
/// Width and signedness are not carried on the wire, so integers are
/// width-erased: [`Value::UInt`] for non-negative values and [`Value::Int`]
/// for negative ones when produced by the unpacker. Equality compares
/// integers numerically across the two variants and treats NaN as equal to
/// NaN, so a value always equals its own round trip.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    UInt(u64),
    Int(i64),
    F32(f32),
    F64(f64),
    Raw(Vec<u8>),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::UInt(_) | Self::Int(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::F32(_) | Self::F64(_))
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// The marker family this value was (or would be) encoded with, used in
    /// mismatch errors.
    fn representative_marker(&self) -> u8 {
        match self {
            Self::Nil => marker::NIL,
            Self::Bool(true) => marker::TRUE,
            Self::Bool(false) => marker::FALSE,
            Self::UInt(_) => marker::UINT_64,
            Self::Int(_) => marker::INT_64,
            Self::F32(_) => marker::FLOAT_32,
            Self::F64(_) => marker::FLOAT_64,
            Self::Raw(_) => marker::RAW_32,
            Self::Array(_) => marker::ARRAY_32,
            Self::Map(_) => marker::MAP_32,
        }
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::mismatch(expected, self.representative_marker())
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            other => Err(other.mismatch("bool")),
        }
    }

    /// Converts an integer value to `T`, failing with `Overflow` when it does
    /// not fit.
    fn as_integer<T>(&self) -> Result<T>
    where
        T: TryFrom<u64> + TryFrom<i64>,
    {
        match self {
            Self::UInt(v) => <T as TryFrom<u64>>::try_from(*v).map_err(|_| Error::overflow::<T>()),
            Self::Int(v) => <T as TryFrom<i64>>::try_from(*v).map_err(|_| Error::overflow::<T>()),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn as_i8(&self) -> Result<i8> {
        self.as_integer()
    }

    pub fn as_i16(&self) -> Result<i16> {
        self.as_integer()
    }

    pub fn as_i32(&self) -> Result<i32> {
        self.as_integer()
    }

    pub fn as_i64(&self) -> Result<i64> {
        self.as_integer()
    }

    pub fn as_u8(&self) -> Result<u8> {
        self.as_integer()
    }

    pub fn as_u16(&self) -> Result<u16> {
        self.as_integer()
    }

    pub fn as_u32(&self) -> Result<u32> {
        self.as_integer()
    }

    pub fn as_u64(&self) -> Result<u64> {
        self.as_integer()
    }

    /// Returns the value as `f32`. A float64 outside the finite `f32` range
    /// is an overflow; infinities and NaN narrow as-is.
    pub fn as_f32(&self) -> Result<f32> {
        match self {
            Self::F32(f) => Ok(*f),
            Self::F64(d) => narrow_f64(*d),
            other => Err(other.mismatch("float")),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Self::F32(f) => Ok(f64::from(*f)),
            Self::F64(d) => Ok(*d),
            other => Err(other.mismatch("float")),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Self::Raw(b) => Ok(b),
            other => Err(other.mismatch("raw")),
        }
    }

    /// Returns the raw payload as UTF-8 text.
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Self::Raw(b) => {
                std::str::from_utf8(b).map_err(|_| Error::mismatch("utf-8 raw", marker::RAW_32))
            }
            other => Err(other.mismatch("raw")),
        }
    }

    pub fn as_array(&self) -> Result<&[Value]> {
        match self {
            Self::Array(items) => Ok(items),
            other => Err(other.mismatch("array")),
        }
    }

    pub fn as_map(&self) -> Result<&[(Value, Value)]> {
        match self {
            Self::Map(entries) => Ok(entries),
            other => Err(other.mismatch("map")),
        }
    }

    /// Looks up a map entry whose key is the raw string `key`.
    pub fn map_get(&self, key: &str) -> Option<&Value> {
        let entries = self.as_map().ok()?;
        entries
            .iter()
            .find(|(k, _)| k.as_bytes().is_ok_and(|b| b == key.as_bytes()))
            .map(|(_, v)| v)
    }
}

/// Narrows a float64 to float32, rejecting finite values beyond `f32::MAX`.
pub(crate) fn narrow_f64(d: f64) -> Result<f32> {
    if d.is_finite() && d.abs() > f64::from(f32::MAX) {
        Err(Error::overflow::<f32>())
    } else {
        Ok(d as f32)
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(u), Self::Int(i)) | (Self::Int(i), Self::UInt(u)) => {
                u64::try_from(*i).is_ok_and(|i| i == *u)
            }
            (Self::F32(a), Self::F32(b)) => float_eq(f64::from(*a), f64::from(*b)),
            (Self::F64(a), Self::F64(b)) => float_eq(*a, *b),
            (Self::Raw(a), Self::Raw(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => false,
        }
    }
}

// -- Convenience conversions --

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        match u64::try_from(i) {
            Ok(u) => Self::UInt(u),
            Err(_) => Self::Int(i),
        }
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::from(i64::from(i))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Self::UInt(u)
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Self::UInt(u64::from(u))
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::F32(f)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::F64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Raw(s.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Raw(s.into_bytes())
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Raw(b.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl From<Vec<(Value, Value)>> for Value {
    fn from(entries: Vec<(Value, Value)>) -> Self {
        Self::Map(entries)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Nil, Into::into)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
            Self::Raw(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "\"{s}\""),
                Err(_) => write!(f, "<{} bytes>", b.len()),
            },
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn integers_compare_numerically() {
        assert_eq!(Value::Int(5), Value::UInt(5));
        assert_eq!(Value::UInt(5), Value::Int(5));
        assert_ne!(Value::Int(-1), Value::UInt(u64::MAX));
        assert_eq!(Value::from(-3i64), Value::Int(-3));
        assert!(matches!(Value::from(7i64), Value::UInt(7)));
    }

    #[test]
    fn nan_equals_nan() {
        assert_eq!(Value::F64(f64::NAN), Value::F64(-f64::NAN));
        assert_eq!(Value::F32(f32::NAN), Value::F32(f32::NAN));
        assert_ne!(Value::F64(1.0), Value::F32(1.0));
    }

    #[test]
    fn accessors_report_mismatch() {
        let v = Value::from("hi");
        assert_eq!(v.as_str().unwrap(), "hi");
        assert_eq!(v.as_bool().unwrap_err().kind(), ErrorKind::TypeMismatch);
        assert_eq!(v.as_i32().unwrap_err().kind(), ErrorKind::TypeMismatch);
        assert!(v.is_raw());
        assert!(!v.is_nil());
    }

    #[test]
    fn integer_accessors_check_range() {
        let v = Value::UInt(200);
        assert_eq!(v.as_u8().unwrap(), 200);
        assert_eq!(v.as_i8().unwrap_err().kind(), ErrorKind::Overflow);
        assert_eq!(Value::Int(-1).as_u64().unwrap_err().kind(), ErrorKind::Overflow);
        assert_eq!(Value::Int(-129).as_i16().unwrap(), -129);
    }

    #[test]
    fn float_narrowing() {
        assert_eq!(Value::F64(1.5).as_f32().unwrap(), 1.5);
        assert_eq!(Value::F64(1e300).as_f32().unwrap_err().kind(), ErrorKind::Overflow);
        assert_eq!(Value::F64(f64::INFINITY).as_f32().unwrap(), f32::INFINITY);
        assert!(Value::F64(f64::NAN).as_f32().unwrap().is_nan());
    }

    #[test]
    fn map_lookup_by_string_key() {
        let v = Value::Map(vec![
            (Value::from("name"), Value::from("Alice")),
            (Value::from(1i64), Value::Bool(true)),
        ]);
        assert_eq!(v.map_get("name"), Some(&Value::from("Alice")));
        assert_eq!(v.map_get("age"), None);
        assert_eq!(Value::Nil.map_get("name"), None);
    }

    #[test]
    fn display_nested() {
        let v = Value::Array(vec![Value::Nil, Value::Int(-2), Value::from("x")]);
        assert_eq!(v.to_string(), "[nil, -2, \"x\"]");
    }
}
