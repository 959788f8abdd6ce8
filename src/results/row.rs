use std::collections::HashMap;
use std::sync::Arc;

use crate::conversion::ConverterRegistry;
use crate::error::NimbleError;
use crate::types::{SqlType, Value};

/// Column name to index. The first column with a given name wins.
pub(crate) fn index_cache(column_names: &[String]) -> Arc<HashMap<String, usize>> {
    let mut cache = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        cache.entry(name.clone()).or_insert(i);
    }
    Arc::new(cache)
}

/// A generic result row: ordered column names plus the raw values.
///
/// Rows of one query share their column names and lookup cache. Typed access
/// goes through the converter registry the row was created with.
#[derive(Debug, Clone)]
pub struct Row {
    column_names: Arc<Vec<String>>,
    values: Vec<Value>,
    // name -> index, shared by every row of the same query
    column_index_cache: Arc<HashMap<String, usize>>,
    registry: Arc<ConverterRegistry>,
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.column_names == other.column_names && self.values == other.values
    }
}

impl Row {
    /// Create a row from column names and values.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` if the lengths differ.
    pub fn new(
        column_names: Arc<Vec<String>>,
        values: Vec<Value>,
        registry: Arc<ConverterRegistry>,
    ) -> Result<Self, NimbleError> {
        let cache = index_cache(&column_names);
        Self::with_cache(column_names, cache, values, registry)
    }

    /// A row with every value `Null`.
    #[must_use]
    pub fn nulls(column_names: Vec<String>, registry: Arc<ConverterRegistry>) -> Self {
        Self {
            values: vec![Value::Null; column_names.len()],
            column_index_cache: index_cache(&column_names),
            column_names: Arc::new(column_names),
            registry,
        }
    }

    pub(crate) fn with_cache(
        column_names: Arc<Vec<String>>,
        column_index_cache: Arc<HashMap<String, usize>>,
        values: Vec<Value>,
        registry: Arc<ConverterRegistry>,
    ) -> Result<Self, NimbleError> {
        if column_names.len() != values.len() {
            return Err(NimbleError::ValidationError(format!(
                "{} column names but {} values",
                column_names.len(),
                values.len()
            )));
        }
        Ok(Self {
            column_names,
            values,
            column_index_cache,
            registry,
        })
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_names.len()
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` if `index` is out of range.
    pub fn column_name(&self, index: usize) -> Result<&str, NimbleError> {
        self.column_names
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| out_of_range(index))
    }

    /// Index of the first column called `column_name`.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index_cache.get(column_name).copied()
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Raw value of the first column called `column_name`.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` if there is no such column.
    pub fn get(&self, column_name: &str) -> Result<&Value, NimbleError> {
        let index = self
            .column_index(column_name)
            .ok_or_else(|| unknown_column(column_name))?;
        self.value(index)
    }

    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` if `index` is out of range.
    pub fn value(&self, index: usize) -> Result<&Value, NimbleError> {
        self.values.get(index).ok_or_else(|| out_of_range(index))
    }

    /// Value of `column_name` converted to `T`.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` for an unknown column and
    /// `NimbleError::ConversionError` if the value doesn't convert.
    pub fn get_as<T: SqlType>(&self, column_name: &str) -> Result<T, NimbleError> {
        self.registry.convert(self.get(column_name)?.clone())
    }

    /// Value at `index` converted to `T`.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` for an out-of-range index and
    /// `NimbleError::ConversionError` if the value doesn't convert.
    pub fn value_as<T: SqlType>(&self, index: usize) -> Result<T, NimbleError> {
        self.registry.convert(self.value(index)?.clone())
    }

    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` if `index` is out of range.
    pub fn set_value(&mut self, index: usize, value: impl Into<Value>) -> Result<(), NimbleError> {
        let slot = self.values.get_mut(index).ok_or_else(|| out_of_range(index))?;
        *slot = value.into();
        Ok(())
    }

    /// Replace the value of the first column called `column_name`.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` if there is no such column.
    pub fn set(&mut self, column_name: &str, value: impl Into<Value>) -> Result<(), NimbleError> {
        let index = self
            .column_index(column_name)
            .ok_or_else(|| unknown_column(column_name))?;
        self.set_value(index, value)
    }
}

fn out_of_range(index: usize) -> NimbleError {
    NimbleError::ValidationError(format!("column index {index} out of range"))
}

fn unknown_column(column_name: &str) -> NimbleError {
    NimbleError::ValidationError(format!("no column named {column_name}"))
}
