use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;

use crate::types::ValueType;

#[derive(Debug, Error)]
pub enum NimbleError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error("Metadata error for type {type_name}: {message}")]
    MetadataError { type_name: String, message: String },

    #[error("Binding error for parameter :{parameter}: {message}")]
    BindingError { parameter: String, message: String },

    #[error("Parameter source error: {0}")]
    SourceError(String),

    #[error("Can't convert value of type {from:?} to {to:?}: {message}")]
    ConversionError {
        from: ValueType,
        to: ValueType,
        message: String,
    },

    #[error("Mapping error for column '{column}' in type {type_name}: {message}")]
    MappingError {
        column: String,
        type_name: String,
        message: String,
    },

    #[error("Result is not singular: {0}")]
    CardinalityError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Driver error: {0}")]
    DriverError(String),
}

/// Coarse classification of a [`NimbleError`], one per failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Metadata,
    Binding,
    Conversion,
    Mapping,
    Cardinality,
    Validation,
    Driver,
}

impl NimbleError {
    /// Which failure kind this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            #[cfg(feature = "sqlite")]
            NimbleError::SqliteError(_) => ErrorKind::Driver,
            NimbleError::DriverError(_) => ErrorKind::Driver,
            NimbleError::MetadataError { .. } => ErrorKind::Metadata,
            NimbleError::BindingError { .. } | NimbleError::SourceError(_) => ErrorKind::Binding,
            NimbleError::ConversionError { .. } => ErrorKind::Conversion,
            NimbleError::MappingError { .. } => ErrorKind::Mapping,
            NimbleError::CardinalityError(_) => ErrorKind::Cardinality,
            NimbleError::ValidationError(_) => ErrorKind::Validation,
        }
    }

    pub(crate) fn metadata(type_name: &str, message: impl Into<String>) -> Self {
        NimbleError::MetadataError {
            type_name: type_name.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn binding(parameter: &str, message: impl Into<String>) -> Self {
        NimbleError::BindingError {
            parameter: parameter.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn conversion(from: ValueType, to: ValueType, message: impl Into<String>) -> Self {
        NimbleError::ConversionError {
            from,
            to,
            message: message.into(),
        }
    }

    pub(crate) fn mapping(column: &str, type_name: &str, message: impl Into<String>) -> Self {
        NimbleError::MappingError {
            column: column.to_string(),
            type_name: type_name.to_string(),
            message: message.into(),
        }
    }

    /// Name of the parameter a binding failure refers to, if any.
    #[must_use]
    pub fn parameter(&self) -> Option<&str> {
        if let NimbleError::BindingError { parameter, .. } = self {
            Some(parameter)
        } else {
            None
        }
    }

    /// Name of the result column a mapping failure refers to, if any.
    #[must_use]
    pub fn column(&self) -> Option<&str> {
        if let NimbleError::MappingError { column, .. } = self {
            Some(column)
        } else {
            None
        }
    }
}
