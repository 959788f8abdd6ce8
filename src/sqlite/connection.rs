use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::driver::{BufferedCursor, Connection, Cursor, Statement};
use crate::error::NimbleError;
use crate::types::Value;

use super::params::to_sqlite_value;
use super::query::build_cursor;

/// A [`Connection`] over a single rusqlite connection.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl SqliteConnection {
    /// Open (or create) a database file.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::SqliteError` if the file can't be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, NimbleError> {
        Ok(Self::from_rusqlite(rusqlite::Connection::open(path)?))
    }

    /// # Errors
    ///
    /// Returns `NimbleError::SqliteError` if the database can't be created.
    pub fn open_in_memory() -> Result<Self, NimbleError> {
        Ok(Self::from_rusqlite(rusqlite::Connection::open_in_memory()?))
    }

    #[must_use]
    pub fn from_rusqlite(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// The underlying rusqlite connection.
    #[must_use]
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }

    #[must_use]
    pub fn into_inner(self) -> rusqlite::Connection {
        self.conn
    }
}

impl Connection for SqliteConnection {
    fn prepare(
        &mut self,
        sql: &str,
        return_generated_keys: bool,
    ) -> Result<Box<dyn Statement + '_>, NimbleError> {
        let stmt = self.conn.prepare(sql)?;
        let is_insert = sql
            .trim_start()
            .get(..6)
            .is_some_and(|head| head.eq_ignore_ascii_case("insert"));
        Ok(Box::new(SqliteStatement {
            conn: &self.conn,
            stmt,
            wants_key: return_generated_keys && is_insert,
            generated_key: None,
        }))
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), NimbleError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

struct SqliteStatement<'c> {
    conn: &'c rusqlite::Connection,
    stmt: rusqlite::Statement<'c>,
    wants_key: bool,
    generated_key: Option<i64>,
}

impl Statement for SqliteStatement<'_> {
    fn bind(&mut self, index: usize, value: &Value) -> Result<(), NimbleError> {
        let value = to_sqlite_value(index, value)?;
        self.stmt.raw_bind_parameter(index, value)?;
        Ok(())
    }

    fn execute_query(&mut self) -> Result<Box<dyn Cursor + '_>, NimbleError> {
        Ok(Box::new(build_cursor(&mut self.stmt)?))
    }

    fn execute_update(&mut self) -> Result<usize, NimbleError> {
        let affected = self.stmt.raw_execute()?;
        if self.wants_key {
            let key = self.conn.last_insert_rowid();
            debug!(key, "sqlite generated key");
            self.generated_key = Some(key);
        }
        Ok(affected)
    }

    fn generated_keys(&mut self) -> Result<Box<dyn Cursor + '_>, NimbleError> {
        let cursor = match self.generated_key {
            Some(key) => BufferedCursor::single("last_insert_rowid()", Value::Long(key)),
            None => BufferedCursor::new(vec!["last_insert_rowid()".into()], Vec::new()),
        };
        Ok(Box::new(cursor))
    }
}
