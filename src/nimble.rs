use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::connection::NbConnection;
use crate::conversion::{ConverterRegistry, ConverterRegistryBuilder};
use crate::driver::Connection;
use crate::error::NimbleError;
use crate::meta::MetadataResolver;
use crate::results::Row;
use crate::translation::PlaceholderStyle;
use crate::types::{Value, ValueType};

/// Settings shared by every connection created from one [`Nimble`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NimbleOptions {
    /// Marker syntax the driver expects
    pub placeholder_style: PlaceholderStyle,
}

/// The single initialization phase: options plus converter registration.
///
/// ```rust
/// use nimble_sql::prelude::*;
///
/// let nimble = Nimble::builder()
///     .placeholder_style(PlaceholderStyle::Dollar)
///     .to_db(ValueType::Bool, |v| Ok(Value::Text(v.to_string())))
///     .build();
/// assert_eq!(nimble.options().placeholder_style, PlaceholderStyle::Dollar);
/// ```
#[derive(Clone, Default)]
pub struct NimbleBuilder {
    options: NimbleOptions,
    converters: Option<ConverterRegistryBuilder>,
}

impl NimbleBuilder {
    #[must_use]
    pub fn options(mut self, options: NimbleOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn placeholder_style(mut self, style: PlaceholderStyle) -> Self {
        self.options.placeholder_style = style;
        self
    }

    /// Replace the converter set entirely (defaults are not kept).
    #[must_use]
    pub fn converters(mut self, converters: ConverterRegistryBuilder) -> Self {
        self.converters = Some(converters);
        self
    }

    /// Register a from-db converter on top of the defaults.
    #[must_use]
    pub fn from_db<F>(mut self, from: ValueType, to: ValueType, converter: F) -> Self
    where
        F: Fn(Value) -> Result<Value, NimbleError> + Send + Sync + 'static,
    {
        let converters = self.converters.take().unwrap_or_else(ConverterRegistry::builder);
        self.converters = Some(converters.from_db(from, to, converter));
        self
    }

    /// Register a to-db converter on top of the defaults.
    #[must_use]
    pub fn to_db<F>(mut self, from: ValueType, converter: F) -> Self
    where
        F: Fn(Value) -> Result<Value, NimbleError> + Send + Sync + 'static,
    {
        let converters = self.converters.take().unwrap_or_else(ConverterRegistry::builder);
        self.converters = Some(converters.to_db(from, converter));
        self
    }

    /// Freeze the converters and produce the context.
    #[must_use]
    pub fn build(self) -> Nimble {
        let registry = self
            .converters
            .unwrap_or_else(ConverterRegistry::builder)
            .build();
        Nimble {
            registry: Arc::new(registry),
            options: self.options,
        }
    }
}

/// Entry point: wraps driver connections and owns the frozen converter registry.
#[derive(Debug, Clone)]
pub struct Nimble {
    registry: Arc<ConverterRegistry>,
    options: NimbleOptions,
}

impl Default for Nimble {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Nimble {
    /// Default converters and options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn builder() -> NimbleBuilder {
        NimbleBuilder::default()
    }

    #[must_use]
    pub fn options(&self) -> NimbleOptions {
        self.options
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    /// The process-wide metadata resolver.
    #[must_use]
    pub fn resolver(&self) -> &'static MetadataResolver {
        MetadataResolver::global()
    }

    /// Wrap a driver connection.
    #[must_use]
    pub fn connect<C: Connection + 'static>(&self, conn: C) -> NbConnection {
        NbConnection::new(
            Box::new(conn),
            Arc::clone(&self.registry),
            self.options,
        )
    }

    /// Build a standalone row.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` if the lengths differ.
    pub fn create_row(&self, column_names: Vec<String>, values: Vec<Value>) -> Result<Row, NimbleError> {
        Row::new(Arc::new(column_names), values, Arc::clone(&self.registry))
    }

    /// A standalone row of nulls, to be filled in with [`Row::set`].
    #[must_use]
    pub fn create_empty_row(&self, column_names: Vec<String>) -> Row {
        Row::nulls(column_names, Arc::clone(&self.registry))
    }

    /// Open a SQLite database file.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::SqliteError` if the file can't be opened.
    #[cfg(feature = "sqlite")]
    pub fn open_sqlite(&self, path: impl AsRef<std::path::Path>) -> Result<NbConnection, NimbleError> {
        Ok(self.connect(crate::sqlite::SqliteConnection::open(path)?))
    }

    /// Open a private in-memory SQLite database.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::SqliteError` if the database can't be created.
    #[cfg(feature = "sqlite")]
    pub fn open_sqlite_in_memory(&self) -> Result<NbConnection, NimbleError> {
        Ok(self.connect(crate::sqlite::SqliteConnection::open_in_memory()?))
    }
}
