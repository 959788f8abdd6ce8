mod dml;
mod select;

use serde::Serialize;

use crate::connection::NbConnection;
use crate::error::NimbleError;
use crate::extract::{NbParams, ParamSource, ValueMap};
use crate::meta::Accessible;
use crate::translation::{PreparedSql, extract_names};
use crate::types::Value;

/// Fluent builder for one statement with `:name` parameters.
///
/// Values come from one [`ParamSource`] plus any explicit [`NbQuery::param`] calls,
/// which take precedence over the source.
///
/// ```rust,no_run
/// use nimble_sql::prelude::*;
///
/// # fn demo() -> Result<(), NimbleError> {
/// let nimble = Nimble::new();
/// let mut conn = nimble.open_sqlite_in_memory()?;
/// let count: i64 = conn
///     .query("select count(*) from person where last_name = :last")
///     .param("last", "Lannister")
///     .fetch_value_as()?;
/// # let _ = count;
/// # Ok(())
/// # }
/// ```
pub struct NbQuery<'c, 'p> {
    conn: &'c mut NbConnection,
    sql: String,
    source: ParamSource<'p>,
    overrides: NbParams,
}

impl<'c, 'p> NbQuery<'c, 'p> {
    pub(crate) fn new(conn: &'c mut NbConnection, sql: &str) -> Self {
        Self {
            conn,
            sql: sql.to_string(),
            source: ParamSource::None,
            overrides: NbParams::new(),
        }
    }

    /// Set one parameter, overriding the source.
    #[must_use]
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.overrides.insert(name, value);
        self
    }

    /// Use an explicit parameter set as the source.
    #[must_use]
    pub fn params(self, params: NbParams) -> Self {
        self.source(ParamSource::Params(params))
    }

    /// Use a name to value map as the source.
    #[must_use]
    pub fn params_map(self, map: &'p ValueMap) -> Self {
        self.source(ParamSource::Map(map))
    }

    /// Read parameters from an entity's accessors.
    #[must_use]
    pub fn params_from(self, obj: &'p dyn Accessible) -> Self {
        self.source(ParamSource::Object(obj))
    }

    /// Read parameters from the fields of any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::SourceError` if `value` fails to serialize.
    pub fn params_serialized<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, NimbleError> {
        Ok(self.source(ParamSource::serialized(value)?))
    }

    #[must_use]
    pub fn source(mut self, source: ParamSource<'p>) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Resolve every parameter and rewrite the SQL.
    fn prepare(&self) -> Result<PreparedSql, NimbleError> {
        let parsed = extract_names(&self.sql);
        let from_source: Vec<&str> = parsed
            .distinct_names()
            .into_iter()
            .filter(|name| self.overrides.get(name).is_none())
            .collect();

        let mut values = if from_source.is_empty() {
            ValueMap::new()
        } else {
            self.source.value_map(&from_source)?
        };
        for (name, value) in self.overrides.iter() {
            values.insert(name.to_string(), value.clone());
        }
        self.conn.prepare(&self.sql, &values)
    }
}
