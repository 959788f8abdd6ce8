//! Per-connection API: ad-hoc queries and naming-convention CRUD.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::conversion::ConverterRegistry;
use crate::driver::{Connection, Cursor};
use crate::error::NimbleError;
use crate::extract::{NbParams, ParamSource};
use crate::meta::{Accessible, Entity, MetadataResolver};
use crate::nimble::NimbleOptions;
use crate::query_builder::NbQuery;
use crate::results::ExecuteOutcome;
use crate::translation::{PreparedSql, prepare_sql};
use crate::types::Value;

/// A driver connection plus the context every query on it needs.
pub struct NbConnection {
    conn: Box<dyn Connection>,
    registry: Arc<ConverterRegistry>,
    options: NimbleOptions,
}

impl fmt::Debug for NbConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NbConnection")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl NbConnection {
    pub(crate) fn new(
        conn: Box<dyn Connection>,
        registry: Arc<ConverterRegistry>,
        options: NimbleOptions,
    ) -> Self {
        Self {
            conn,
            registry,
            options,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn options(&self) -> NimbleOptions {
        self.options
    }

    /// The wrapped driver connection.
    pub fn driver(&mut self) -> &mut dyn Connection {
        self.conn.as_mut()
    }

    /// Start a query with `:name` parameters.
    ///
    /// ```rust
    /// # use nimble_sql::prelude::*;
    /// # fn demo(conn: &mut NbConnection) -> Result<(), NimbleError> {
    /// let names: Vec<String> = conn
    ///     .query("select name from person where id in (:ids)")
    ///     .param("ids", vec![1_i64, 2, 3])
    ///     .fetch_rows()?
    ///     .iter()
    ///     .map(|row| row.get_as("name"))
    ///     .collect::<Result<_, _>>()?;
    /// # let _ = names;
    /// # Ok(())
    /// # }
    /// ```
    pub fn query<'p>(&mut self, sql: &str) -> NbQuery<'_, 'p> {
        NbQuery::new(self, sql)
    }

    /// Run statements with no parameters and no results.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if any statement fails.
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), NimbleError> {
        self.conn.execute_batch(sql)
    }

    /// Execute `sql` with parameters read from `obj`, then store a generated key
    /// back onto it under the same rule as [`NbConnection::insert`].
    ///
    /// # Errors
    ///
    /// Returns a binding error for parameters `obj` has no accessor for, driver
    /// errors, and metadata/conversion errors from applying the key.
    pub fn execute_for(
        &mut self,
        sql: &str,
        obj: &mut dyn Accessible,
    ) -> Result<ExecuteOutcome, NimbleError> {
        let descriptor = MetadataResolver::global().descriptor_of(&*obj);
        let takes_key = descriptor.takes_generated_key(&*obj);
        let outcome = self
            .query(sql)
            .source(ParamSource::Object(&*obj))
            .execute()?;
        if let Some(key) = outcome.generated_key.clone()
            && takes_key
        {
            descriptor.apply_identifier(key, obj, &self.registry)?;
        }
        Ok(outcome)
    }

    pub(crate) fn prepare(
        &self,
        sql: &str,
        values: &crate::extract::ValueMap,
    ) -> Result<PreparedSql, NimbleError> {
        let prepared = prepare_sql(sql, values, self.options.placeholder_style, &self.registry)?;
        debug!(sql = %prepared.sql, params = prepared.values.len(), "prepared statement");
        Ok(prepared)
    }

    /// Run a row-returning statement and hand its cursor to `read`.
    pub(crate) fn run_query<R>(
        &mut self,
        prepared: &PreparedSql,
        read: impl FnOnce(&mut dyn Cursor) -> Result<R, NimbleError>,
    ) -> Result<R, NimbleError> {
        let mut stmt = self.conn.prepare(&prepared.sql, false)?;
        for (i, value) in prepared.values.iter().enumerate() {
            stmt.bind(i + 1, value)?;
        }
        let mut cursor = stmt.execute_query()?;
        read(cursor.as_mut())
    }

    /// Run a statement that returns no rows, collecting the first generated key.
    pub(crate) fn run_update(&mut self, prepared: &PreparedSql) -> Result<ExecuteOutcome, NimbleError> {
        let mut stmt = self.conn.prepare(&prepared.sql, true)?;
        for (i, value) in prepared.values.iter().enumerate() {
            stmt.bind(i + 1, value)?;
        }
        let rows_affected = stmt.execute_update()?;
        let mut keys = stmt.generated_keys()?;
        let generated_key = if keys.column_count() > 0 && keys.next()? {
            Some(keys.value(0)?)
        } else {
            None
        };
        debug!(rows_affected, ?generated_key, "statement executed");
        Ok(ExecuteOutcome {
            rows_affected,
            generated_key,
        })
    }

    /// Insert `obj` into its table and store a generated key back onto it.
    ///
    /// The key is stored only on an `id(generated)` identifier, or on an untagged
    /// `id` that is still null. A caller-supplied identifier is left alone.
    ///
    /// # Errors
    ///
    /// Returns metadata errors from resolving the type, driver errors, and
    /// conversion errors from applying the key.
    pub fn insert(&mut self, obj: &mut dyn Accessible) -> Result<ExecuteOutcome, NimbleError> {
        let resolver = MetadataResolver::global();
        let descriptor = resolver.descriptor_of(&*obj);
        let columns = descriptor.column_map(&*obj)?;

        let mut params = NbParams::new();
        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", descriptor.table)
        } else {
            let mut names = Vec::with_capacity(columns.len());
            let mut markers = Vec::with_capacity(columns.len());
            for (i, (column, value)) in columns.into_iter().enumerate() {
                let param = format!("c{i}");
                markers.push(format!(":{param}"));
                params.insert(&param, value);
                names.push(column);
            }
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                descriptor.table,
                names.join(", "),
                markers.join(", ")
            )
        };
        debug!(entity = descriptor.type_name, %sql, "insert");

        let takes_key = descriptor.takes_generated_key(&*obj);
        let outcome = self.query(&sql).params(params).execute()?;
        if let Some(key) = outcome.generated_key.clone()
            && takes_key
        {
            descriptor.apply_identifier(key, obj, &self.registry)?;
        }
        Ok(outcome)
    }

    /// Update the row identified by `obj`'s identifier with its column values.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` if the identifier is null or there
    /// are no columns to set, and metadata or driver errors otherwise.
    pub fn update(&mut self, obj: &dyn Accessible) -> Result<ExecuteOutcome, NimbleError> {
        let descriptor = MetadataResolver::global().descriptor_of(obj);
        let identifier = descriptor.identifier_column_map(obj)?;
        if identifier.values().any(Value::is_null) {
            return Err(NimbleError::ValidationError(format!(
                "can't update {} without an identifier value",
                descriptor.type_name
            )));
        }
        let columns = descriptor.column_map(obj)?;
        if columns.is_empty() {
            return Err(NimbleError::ValidationError(format!(
                "{} has no columns to update",
                descriptor.type_name
            )));
        }

        let mut params = NbParams::new();
        let mut sets = Vec::with_capacity(columns.len());
        for (i, (column, value)) in columns.into_iter().enumerate() {
            let param = format!("c{i}");
            sets.push(format!("{column}=:{param}"));
            params.insert(&param, value);
        }
        let mut conditions = Vec::with_capacity(identifier.len());
        for (i, (column, value)) in identifier.into_iter().enumerate() {
            let param = format!("k{i}");
            conditions.push(format!("{column}=:{param}"));
            params.insert(&param, value);
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            descriptor.table,
            sets.join(", "),
            conditions.join(" AND ")
        );
        debug!(entity = descriptor.type_name, %sql, "update");
        self.query(&sql).params(params).execute()
    }

    /// Load the `T` whose identifier equals `id`.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::CardinalityError` if more than one row matches,
    /// `NimbleError::MappingError` if a column can't be mapped, and metadata or
    /// driver errors otherwise.
    pub fn load<T: Entity>(&mut self, id: impl Into<Value>) -> Result<Option<T>, NimbleError> {
        let resolver = MetadataResolver::global();
        let table = resolver.table_name::<T>();
        let column = resolver.identifier_column::<T>()?;
        let sql = format!("SELECT * FROM {table} WHERE {column}=:id");
        debug!(entity = T::meta().type_name, %sql, "load");

        let mut records = self.query(&sql).param("id", id).fetch_list::<T>()?;
        if records.len() > 1 {
            return Err(NimbleError::CardinalityError(format!(
                "{} rows of {table} have {column} = the requested id",
                records.len()
            )));
        }
        Ok(records.pop())
    }

    /// Delete the row identified by `obj`'s identifier.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` if the identifier is null, and
    /// metadata or driver errors otherwise.
    pub fn delete(&mut self, obj: &dyn Accessible) -> Result<ExecuteOutcome, NimbleError> {
        let descriptor = MetadataResolver::global().descriptor_of(obj);
        let identifier = descriptor.identifier_column_map(obj)?;
        let Some((column, value)) = identifier.into_iter().next() else {
            return Err(NimbleError::metadata(descriptor.type_name, "no identifier accessor"));
        };
        if value.is_null() {
            return Err(NimbleError::ValidationError(format!(
                "can't delete {} without an identifier value",
                descriptor.type_name
            )));
        }
        self.delete_where(descriptor.table, &column, value)
    }

    /// Delete the `T` whose identifier equals `id`.
    ///
    /// # Errors
    ///
    /// Returns metadata errors if `T` has no identifier, and driver errors.
    pub fn delete_by_id<T: Entity>(&mut self, id: impl Into<Value>) -> Result<ExecuteOutcome, NimbleError> {
        let resolver = MetadataResolver::global();
        let column = resolver.identifier_column::<T>()?;
        self.delete_where(resolver.table_name::<T>(), &column, id.into())
    }

    fn delete_where(
        &mut self,
        table: &str,
        column: &str,
        id: Value,
    ) -> Result<ExecuteOutcome, NimbleError> {
        let sql = format!("DELETE FROM {table} WHERE {column}=:id");
        debug!(%sql, "delete");
        self.query(&sql).param("id", id).execute()
    }
}
