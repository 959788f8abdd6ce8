use std::sync::Arc;

use crate::driver::Cursor;
use crate::error::NimbleError;
use crate::meta::Entity;
use crate::results::{
    GenericRowMapper, MapMapper, Row, RowMap, RowMapper, TypedRecordMapper, map_rows,
};
use crate::types::{SqlType, Value};

use super::NbQuery;

impl NbQuery<'_, '_> {
    /// Map every row with a caller-supplied mapper.
    ///
    /// # Errors
    ///
    /// Returns binding errors, driver errors, or the mapper's own errors.
    pub fn fetch_with<M: RowMapper>(self, mut mapper: M) -> Result<Vec<M::Output>, NimbleError> {
        let prepared = self.prepare()?;
        self.conn
            .run_query(&prepared, |cursor| map_rows(&mut mapper, cursor))
    }

    /// Map every row to a `T`.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::MappingError` naming a column no member of `T`
    /// resolves to, plus binding and driver errors.
    pub fn fetch_list<T: Entity>(self) -> Result<Vec<T>, NimbleError> {
        let registry = Arc::clone(self.conn.registry());
        self.fetch_with(TypedRecordMapper::<T>::new(registry))
    }

    /// At most one `T`.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::CardinalityError` if the query yields more than one row.
    pub fn fetch_one<T: Entity>(self) -> Result<Option<T>, NimbleError> {
        let mut records = self.fetch_list::<T>()?;
        if records.len() > 1 {
            return Err(NimbleError::CardinalityError(format!(
                "expected at most one row, got {}",
                records.len()
            )));
        }
        Ok(records.pop())
    }

    /// Every row as a generic [`Row`].
    ///
    /// # Errors
    ///
    /// Returns binding and driver errors.
    pub fn fetch_rows(self) -> Result<Vec<Row>, NimbleError> {
        let registry = Arc::clone(self.conn.registry());
        self.fetch_with(GenericRowMapper::new(registry))
    }

    /// Every row as column name -> raw value.
    ///
    /// # Errors
    ///
    /// Returns binding and driver errors.
    pub fn fetch_maps(self) -> Result<Vec<RowMap>, NimbleError> {
        self.fetch_with(MapMapper)
    }

    /// The single value of a one-column query; `Null` if there are no rows.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::CardinalityError` if the query has more than one
    /// column or yields more than one row.
    pub fn fetch_value(self) -> Result<Value, NimbleError> {
        let prepared = self.prepare()?;
        self.conn.run_query(&prepared, |cursor| {
            if cursor.column_count() > 1 {
                return Err(NimbleError::CardinalityError(format!(
                    "expected one column, got {}",
                    cursor.column_count()
                )));
            }
            if !cursor.next()? {
                return Ok(Value::Null);
            }
            let value = cursor.value(0)?;
            if cursor.next()? {
                return Err(NimbleError::CardinalityError(
                    "expected one row, got more".into(),
                ));
            }
            Ok(value)
        })
    }

    /// [`NbQuery::fetch_value`] converted to `T`.
    ///
    /// # Errors
    ///
    /// Same as `fetch_value`, plus `NimbleError::ConversionError`.
    pub fn fetch_value_as<T: SqlType>(self) -> Result<T, NimbleError> {
        let registry = Arc::clone(self.conn.registry());
        registry.convert(self.fetch_value()?)
    }
}
