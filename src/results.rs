//! Result rows and the mappers that build them.

pub mod mappers;
pub mod row;

pub use mappers::{
    GenericRowMapper, MapMapper, RowMap, RowMapper, TypedRecordMapper, map_rows, resolve_setters,
};
pub use row::Row;

/// What a non-query statement did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteOutcome {
    pub rows_affected: usize,
    /// Key generated by the database, when one was requested and produced
    pub generated_key: Option<crate::types::Value>,
}

impl ExecuteOutcome {
    /// The generated key converted to `T`, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ConversionError` if the key doesn't convert.
    pub fn generated_key_as<T: crate::types::SqlType>(
        &self,
        registry: &crate::conversion::ConverterRegistry,
    ) -> Result<Option<T>, crate::error::NimbleError> {
        self.generated_key
            .clone()
            .map(|key| registry.convert(key))
            .transpose()
    }
}
