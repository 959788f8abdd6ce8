use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;

use crate::error::NimbleError;

/// Values passed between application code and the database driver.
///
/// The same enum is used for bound parameters, raw result values, and the
/// values produced by entity accessors:
/// ```rust
/// use nimble_sql::prelude::*;
///
/// let params = vec![
///     Value::Long(1),
///     Value::Text("alice".into()),
///     Value::from(vec!["a", "b", "c"]),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// 8-bit integer
    Byte(i8),
    /// 16-bit integer
    Short(i16),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Text/string value
    Text(String),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// Calendar date value
    Date(NaiveDate),
    /// JSON value
    Json(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
    /// Array or collection parameter; expanded into one marker per item when bound
    List(Vec<Value>),
}

/// Runtime type of a [`Value`], and the destination type used for coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Text,
    Timestamp,
    Date,
    Json,
    Blob,
    List,
    /// Enumeration stored by variant name
    Enum(EnumType),
    /// No coercion wanted; the value is taken as-is
    Any,
}

/// Name and variant names of an enumeration stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumType {
    pub name: &'static str,
    pub variants: &'static [&'static str],
}

impl EnumType {
    /// Whether `name` is one of the variants (exact, case-sensitive).
    #[must_use]
    pub fn has_variant(&self, name: &str) -> bool {
        self.variants.contains(&name)
    }
}

impl ValueType {
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueType::Byte
                | ValueType::Short
                | ValueType::Int
                | ValueType::Long
                | ValueType::Float
                | ValueType::Double
        )
    }
}

impl Value {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The runtime type of this value.
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Byte(_) => ValueType::Byte,
            Value::Short(_) => ValueType::Short,
            Value::Int(_) => ValueType::Int,
            Value::Long(_) => ValueType::Long,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::Text(_) => ValueType::Text,
            Value::Timestamp(_) => ValueType::Timestamp,
            Value::Date(_) => ValueType::Date,
            Value::Json(_) => ValueType::Json,
            Value::Blob(_) => ValueType::Blob,
            Value::List(_) => ValueType::List,
        }
    }

    /// Build a list parameter from any iterator of convertible items.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Number of positional markers this value occupies once bound.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        match self {
            Value::List(items) => items.len().max(1),
            _ => 1,
        }
    }

    #[must_use]
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(i64::from(*v)),
            Value::Short(v) => Some(i64::from(*v)),
            Value::Int(v) => Some(i64::from(*v)),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(f64::from(*v)),
            Value::Double(v) => Some(*v),
            _ => self.as_long().map(|v| v as f64),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if let Value::Bool(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let Value::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
            Value::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Json(v) => write!(f, "{v}"),
            Value::Blob(bytes) => {
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// A Rust type that can be stored in and read back from a [`Value`].
///
/// `from_value` is strict: the value must already hold the matching variant.
/// Coercion between variants is the job of the
/// [`ConverterRegistry`](crate::conversion::ConverterRegistry), which runs first.
pub trait SqlType: Sized {
    /// Destination type used when coercing raw values into this type.
    const VALUE_TYPE: ValueType;

    fn into_value(self) -> Value;

    /// Extract this type from a value of the exact matching variant.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ConversionError` when the variant does not match.
    fn from_value(value: Value) -> Result<Self, NimbleError>;
}

fn mismatch(value: &Value, to: ValueType) -> NimbleError {
    let message = if value.is_null() {
        "NULL can't be assigned to a non-optional member".to_string()
    } else {
        format!("unexpected value {value}")
    };
    NimbleError::conversion(value.value_type(), to, message)
}

macro_rules! impl_sql_type {
    ($ty:ty, $variant:ident) => {
        impl SqlType for $ty {
            const VALUE_TYPE: ValueType = ValueType::$variant;

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> Result<Self, NimbleError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(mismatch(&other, ValueType::$variant)),
                }
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

impl_sql_type!(bool, Bool);
impl_sql_type!(i8, Byte);
impl_sql_type!(i16, Short);
impl_sql_type!(i32, Int);
impl_sql_type!(i64, Long);
impl_sql_type!(f32, Float);
impl_sql_type!(f64, Double);
impl_sql_type!(String, Text);
impl_sql_type!(NaiveDateTime, Timestamp);
impl_sql_type!(NaiveDate, Date);
impl_sql_type!(JsonValue, Json);

impl SqlType for Vec<u8> {
    const VALUE_TYPE: ValueType = ValueType::Blob;

    fn into_value(self) -> Value {
        Value::Blob(self)
    }

    fn from_value(value: Value) -> Result<Self, NimbleError> {
        match value {
            Value::Blob(bytes) => Ok(bytes),
            other => Err(mismatch(&other, ValueType::Blob)),
        }
    }
}

impl SqlType for Value {
    const VALUE_TYPE: ValueType = ValueType::Any;

    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> Result<Self, NimbleError> {
        Ok(value)
    }
}

impl<T: SqlType> SqlType for Option<T> {
    const VALUE_TYPE: ValueType = T::VALUE_TYPE;

    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, NimbleError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::list(items)
    }
}

/// An enumeration stored in the database by its exact variant name.
///
/// Usually derived with `#[derive(SqlEnum)]`, which also implements [`SqlType`].
pub trait SqlEnum: Sized + 'static {
    const ENUM_TYPE: EnumType;

    fn variant_name(&self) -> &'static str;

    fn from_variant_name(name: &str) -> Option<Self>;
}

/// Store an enumeration as its variant name.
pub fn enum_into_value<T: SqlEnum>(value: &T) -> Value {
    Value::Text(value.variant_name().to_string())
}

/// Read an enumeration back from its variant name.
///
/// # Errors
///
/// Returns `NimbleError::ConversionError` if the value is not text or names no variant.
pub fn enum_from_value<T: SqlEnum>(value: Value) -> Result<T, NimbleError> {
    let to = ValueType::Enum(T::ENUM_TYPE);
    match value {
        Value::Text(name) => T::from_variant_name(&name).ok_or_else(|| {
            NimbleError::conversion(
                ValueType::Text,
                to,
                format!("'{name}' is not a variant of {}", T::ENUM_TYPE.name),
            )
        }),
        other => Err(mismatch(&other, to)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Color {
        Red,
        Green,
    }

    impl SqlEnum for Color {
        const ENUM_TYPE: EnumType = EnumType {
            name: "Color",
            variants: &["Red", "Green"],
        };

        fn variant_name(&self) -> &'static str {
            match self {
                Color::Red => "Red",
                Color::Green => "Green",
            }
        }

        fn from_variant_name(name: &str) -> Option<Self> {
            match name {
                "Red" => Some(Color::Red),
                "Green" => Some(Color::Green),
                _ => None,
            }
        }
    }

    #[test]
    fn strict_extraction_rejects_other_variants() {
        assert_eq!(i32::from_value(Value::Int(4)).unwrap(), 4);
        let err = i32::from_value(Value::Long(4)).unwrap_err();
        assert!(matches!(err, NimbleError::ConversionError { .. }));
        assert!(String::from_value(Value::Null).is_err());
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
    }

    #[test]
    fn enums_round_trip_by_name() {
        assert_eq!(enum_into_value(&Color::Green), Value::Text("Green".into()));
        assert_eq!(
            enum_from_value::<Color>(Value::Text("Red".into())).unwrap(),
            Color::Red
        );
        assert!(enum_from_value::<Color>(Value::Text("red".into())).is_err());
    }

    #[test]
    fn list_values_count_markers() {
        assert_eq!(Value::from(vec![1_i64, 2, 3]).marker_count(), 3);
        assert_eq!(Value::List(vec![]).marker_count(), 1);
        assert_eq!(Value::from("x").marker_count(), 1);
    }

    #[test]
    fn canonical_string_forms() {
        let ts = NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2020-01-02 03:04:05");
        assert_eq!(Value::Double(2.5).to_string(), "2.5");
        assert_eq!(Value::Blob(vec![0x0a, 0xff]).to_string(), "0aff");
    }
}
