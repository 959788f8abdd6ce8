//! Bidirectional value conversion between driver values and application types.
//!
//! Converters are registered once, while a [`ConverterRegistryBuilder`] is being
//! filled, and the built [`ConverterRegistry`] is immutable afterwards so it can be
//! shared across threads behind an `Arc` without locking.

mod coerce;
mod defaults;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::NimbleError;
use crate::types::{SqlType, Value, ValueType};

pub use coerce::coerce;

/// A conversion applied to a single value.
pub type ConverterFn = Arc<dyn Fn(Value) -> Result<Value, NimbleError> + Send + Sync>;

/// Collects converters during the initialization phase.
///
/// Registration is additive; registering a second converter for the same key
/// replaces the first.
///
/// ```rust
/// use nimble_sql::prelude::*;
///
/// let registry = ConverterRegistry::builder()
///     .from_db(ValueType::Long, ValueType::Text, |v| Ok(Value::Text(format!("#{v}"))))
///     .build();
/// let out = registry.from_storage(Value::Long(7), ValueType::Text).unwrap();
/// assert_eq!(out, Value::Text("#7".into()));
/// ```
#[derive(Clone, Default)]
pub struct ConverterRegistryBuilder {
    from_db: HashMap<(ValueType, ValueType), ConverterFn>,
    to_db: HashMap<ValueType, ConverterFn>,
}

impl ConverterRegistryBuilder {
    /// An empty builder with no converters at all.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder pre-populated with the default converters.
    #[must_use]
    pub fn with_defaults() -> Self {
        defaults::register(Self::new())
    }

    /// Register a conversion for values read from the database.
    #[must_use]
    pub fn from_db<F>(mut self, from: ValueType, to: ValueType, converter: F) -> Self
    where
        F: Fn(Value) -> Result<Value, NimbleError> + Send + Sync + 'static,
    {
        self.from_db.insert((from, to), Arc::new(converter));
        self
    }

    /// Register a conversion for values sent to the database.
    #[must_use]
    pub fn to_db<F>(mut self, from: ValueType, converter: F) -> Self
    where
        F: Fn(Value) -> Result<Value, NimbleError> + Send + Sync + 'static,
    {
        self.to_db.insert(from, Arc::new(converter));
        self
    }

    /// Freeze the registry.
    #[must_use]
    pub fn build(self) -> ConverterRegistry {
        ConverterRegistry {
            from_db: self.from_db,
            to_db: self.to_db,
        }
    }
}

/// Frozen converter lookup tables.
#[derive(Clone)]
pub struct ConverterRegistry {
    from_db: HashMap<(ValueType, ValueType), ConverterFn>,
    to_db: HashMap<ValueType, ConverterFn>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        ConverterRegistryBuilder::with_defaults().build()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("from_db", &self.from_db.keys().collect::<Vec<_>>())
            .field("to_db", &self.to_db.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ConverterRegistry {
    /// Start a registry from the defaults; add converters, then `build()`.
    #[must_use]
    pub fn builder() -> ConverterRegistryBuilder {
        ConverterRegistryBuilder::with_defaults()
    }

    /// Convert an application value before it is bound to a statement.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by a registered converter.
    pub fn to_storage(&self, value: Value) -> Result<Value, NimbleError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self.to_db.get(&value.value_type()) {
            Some(converter) => converter(value),
            None => Ok(value),
        }
    }

    /// Convert a raw database value into the destination type.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ConversionError` when the value can't be coerced
    /// (e.g. unknown enumeration variant), or whatever a registered converter returns.
    pub fn from_storage(&self, value: Value, dest: ValueType) -> Result<Value, NimbleError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self.from_db.get(&(value.value_type(), dest)) {
            Some(converter) => converter(value),
            None => coerce(value, dest),
        }
    }

    /// Convert a raw database value all the way into a Rust type.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ConversionError` if coercion or extraction fails.
    pub fn convert<T: SqlType>(&self, value: Value) -> Result<T, NimbleError> {
        T::from_value(self.from_storage(value, T::VALUE_TYPE)?)
    }

    /// Whether a from-db converter is registered for the pair.
    #[must_use]
    pub fn has_from_db(&self, from: ValueType, to: ValueType) -> bool {
        self.from_db.contains_key(&(from, to))
    }

    /// Whether a to-db converter is registered for the runtime type.
    #[must_use]
    pub fn has_to_db(&self, from: ValueType) -> bool {
        self.to_db.contains_key(&from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnumType;

    const GENDER: EnumType = EnumType {
        name: "Gender",
        variants: &["MALE", "FEMALE"],
    };

    #[test]
    fn null_passes_through_both_directions() {
        let registry = ConverterRegistry::default();
        assert_eq!(registry.to_storage(Value::Null).unwrap(), Value::Null);
        assert_eq!(
            registry.from_storage(Value::Null, ValueType::Long).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn integer_widens_to_double() {
        let registry = ConverterRegistry::default();
        let out = registry.from_storage(Value::Int(3), ValueType::Double).unwrap();
        assert_eq!(out, Value::Double(3.0));
        assert_eq!(registry.convert::<f64>(Value::Long(3)).unwrap(), 3.0);
    }

    #[test]
    fn enum_text_parses_by_exact_name() {
        let registry = ConverterRegistry::default();
        let dest = ValueType::Enum(GENDER);
        assert_eq!(
            registry.from_storage(Value::Text("MALE".into()), dest).unwrap(),
            Value::Text("MALE".into())
        );
        let err = registry
            .from_storage(Value::Text("X".into()), dest)
            .unwrap_err();
        assert!(matches!(err, NimbleError::ConversionError { .. }));
        assert!(registry.from_storage(Value::Long(1), dest).is_err());
    }

    #[test]
    fn registered_converter_wins_and_last_write_wins() {
        let registry = ConverterRegistryBuilder::new()
            .from_db(ValueType::Long, ValueType::Text, |_| Ok(Value::Text("first".into())))
            .from_db(ValueType::Long, ValueType::Text, |_| Ok(Value::Text("second".into())))
            .to_db(ValueType::Bool, |v| Ok(Value::Long(i64::from(v == Value::Bool(true)))))
            .build();
        assert_eq!(
            registry.from_storage(Value::Long(1), ValueType::Text).unwrap(),
            Value::Text("second".into())
        );
        assert_eq!(registry.to_storage(Value::Bool(true)).unwrap(), Value::Long(1));
        assert_eq!(registry.to_storage(Value::Int(5)).unwrap(), Value::Int(5));
    }
}
