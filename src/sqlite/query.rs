use rusqlite::Statement;
use rusqlite::types::Value as SqliteValue;

use crate::driver::BufferedCursor;
use crate::error::NimbleError;
use crate::types::Value;

/// Read column `idx` of a rusqlite row as a raw [`Value`].
///
/// # Errors
///
/// Returns `NimbleError::SqliteError` if the column can't be read.
pub fn extract_value(row: &rusqlite::Row<'_>, idx: usize) -> Result<Value, NimbleError> {
    let value: SqliteValue = row.get(idx)?;
    Ok(match value {
        SqliteValue::Null => Value::Null,
        SqliteValue::Integer(i) => Value::Long(i),
        SqliteValue::Real(f) => Value::Double(f),
        SqliteValue::Text(s) => Value::Text(s),
        SqliteValue::Blob(b) => Value::Blob(b),
    })
}

/// Run an already bound statement and materialize its rows.
///
/// # Errors
///
/// Returns `NimbleError::SqliteError` if execution or row fetching fails.
pub fn build_cursor(stmt: &mut Statement<'_>) -> Result<BufferedCursor, NimbleError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let column_count = column_names.len();

    let mut rows = stmt.raw_query();
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        let mut row_values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            row_values.push(extract_value(row, i)?);
        }
        values.push(row_values);
    }

    Ok(BufferedCursor::new(column_names, values))
}
