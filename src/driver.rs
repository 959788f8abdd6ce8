//! The narrow driver surface the engine runs on.
//!
//! A driver supplies a [`Connection`] that prepares [`Statement`]s, which in turn
//! yield forward-only [`Cursor`]s. Parameter indexes and cursor columns are
//! 1-based and 0-based respectively, matching common driver conventions.

use crate::error::NimbleError;
use crate::types::Value;

/// Forward-only result cursor.
pub trait Cursor {
    /// Advance to the next row. `false` once the rows are exhausted.
    ///
    /// # Errors
    ///
    /// Returns a driver error if fetching fails.
    fn next(&mut self) -> Result<bool, NimbleError>;

    fn column_count(&self) -> usize;

    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` for an out-of-range index.
    fn column_name(&self, index: usize) -> Result<&str, NimbleError>;

    /// Raw value of the current row at `index`.
    ///
    /// # Errors
    ///
    /// Returns `NimbleError::ValidationError` for an out-of-range index or when
    /// the cursor is not positioned on a row.
    fn value(&self, index: usize) -> Result<Value, NimbleError>;
}

pub trait Statement {
    /// Bind `value` to the 1-based positional marker `index`.
    ///
    /// # Errors
    ///
    /// Returns a driver or binding error if the value can't be bound.
    fn bind(&mut self, index: usize, value: &Value) -> Result<(), NimbleError>;

    /// # Errors
    ///
    /// Returns a driver error if execution fails.
    fn execute_query(&mut self) -> Result<Box<dyn Cursor + '_>, NimbleError>;

    /// Run a statement that returns no rows. Returns the affected row count.
    ///
    /// # Errors
    ///
    /// Returns a driver error if execution fails.
    fn execute_update(&mut self) -> Result<usize, NimbleError>;

    /// Keys generated by the last `execute_update`, one per row.
    ///
    /// # Errors
    ///
    /// Returns a driver error if the keys can't be read.
    fn generated_keys(&mut self) -> Result<Box<dyn Cursor + '_>, NimbleError>;
}

pub trait Connection {
    /// # Errors
    ///
    /// Returns a driver error if the SQL can't be prepared.
    fn prepare(
        &mut self,
        sql: &str,
        return_generated_keys: bool,
    ) -> Result<Box<dyn Statement + '_>, NimbleError>;

    /// Run one or more statements without parameters or results.
    ///
    /// # Errors
    ///
    /// Returns a driver error if any statement fails.
    fn execute_batch(&mut self, sql: &str) -> Result<(), NimbleError>;
}

/// Cursor over rows already held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferedCursor {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    position: Option<usize>,
}

impl BufferedCursor {
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            position: None,
        }
    }

    /// One column, one row.
    #[must_use]
    pub fn single(column: &str, value: Value) -> Self {
        Self::new(vec![column.to_string()], vec![vec![value]])
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn current(&self) -> Result<&[Value], NimbleError> {
        self.position
            .and_then(|p| self.rows.get(p))
            .map(Vec::as_slice)
            .ok_or_else(|| NimbleError::ValidationError("cursor is not on a row".into()))
    }
}

impl Cursor for BufferedCursor {
    fn next(&mut self) -> Result<bool, NimbleError> {
        let next = self.position.map_or(0, |p| (p + 1).min(self.rows.len()));
        self.position = Some(next);
        Ok(next < self.rows.len())
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, index: usize) -> Result<&str, NimbleError> {
        self.columns
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| NimbleError::ValidationError(format!("no column at index {index}")))
    }

    fn value(&self, index: usize) -> Result<Value, NimbleError> {
        self.current()?
            .get(index)
            .cloned()
            .ok_or_else(|| NimbleError::ValidationError(format!("no column at index {index}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_cursor_walks_rows_once() {
        let mut cursor = BufferedCursor::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![Value::Long(1), Value::Text("x".into())],
                vec![Value::Long(2), Value::Null],
            ],
        );
        assert!(cursor.value(0).is_err());
        assert!(cursor.next().unwrap());
        assert_eq!(cursor.value(1).unwrap(), Value::Text("x".into()));
        assert!(cursor.next().unwrap());
        assert_eq!(cursor.value(0).unwrap(), Value::Long(2));
        assert!(!cursor.next().unwrap());
        assert!(!cursor.next().unwrap());
        assert!(cursor.value(0).is_err());
        assert_eq!(cursor.column_name(1).unwrap(), "b");
        assert!(cursor.column_name(2).is_err());
    }

    #[test]
    fn empty_cursor_has_no_rows() {
        let mut cursor = BufferedCursor::default();
        assert!(!cursor.next().unwrap());
        assert_eq!(cursor.column_count(), 0);
    }
}
