use rusqlite::types::Value as SqliteValue;

use crate::error::NimbleError;
use crate::types::Value;

/// Convert a bound [`Value`] into a rusqlite value.
///
/// Temporal values go in as text, booleans as integers, JSON as its compact text.
///
/// # Errors
///
/// Returns `NimbleError::BindingError` for a `List`; lists must be expanded into
/// individual markers before they reach the driver.
pub fn to_sqlite_value(index: usize, value: &Value) -> Result<SqliteValue, NimbleError> {
    let converted = match value {
        Value::Null => SqliteValue::Null,
        Value::Bool(b) => SqliteValue::Integer(i64::from(*b)),
        Value::Byte(v) => SqliteValue::Integer(i64::from(*v)),
        Value::Short(v) => SqliteValue::Integer(i64::from(*v)),
        Value::Int(v) => SqliteValue::Integer(i64::from(*v)),
        Value::Long(v) => SqliteValue::Integer(*v),
        Value::Float(v) => SqliteValue::Real(f64::from(*v)),
        Value::Double(v) => SqliteValue::Real(*v),
        Value::Text(s) => SqliteValue::Text(s.clone()),
        Value::Timestamp(dt) => SqliteValue::Text(dt.format("%F %T%.f").to_string()),
        Value::Date(d) => SqliteValue::Text(d.format("%F").to_string()),
        Value::Json(json) => SqliteValue::Text(json.to_string()),
        Value::Blob(bytes) => SqliteValue::Blob(bytes.clone()),
        Value::List(_) => {
            return Err(NimbleError::binding(
                &format!("?{index}"),
                "a list can't be bound to a single marker",
            ));
        }
    };
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn temporal_values_bind_as_text() {
        let dt = NaiveDate::from_ymd_opt(1955, 6, 7)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(
            to_sqlite_value(1, &Value::Timestamp(dt)).unwrap(),
            SqliteValue::Text("1955-06-07 10:30:00".into())
        );
        assert_eq!(
            to_sqlite_value(1, &Value::Date(dt.date())).unwrap(),
            SqliteValue::Text("1955-06-07".into())
        );
    }

    #[test]
    fn booleans_bind_as_integers_and_lists_are_rejected() {
        assert_eq!(
            to_sqlite_value(1, &Value::Bool(true)).unwrap(),
            SqliteValue::Integer(1)
        );
        let err = to_sqlite_value(2, &Value::List(vec![])).unwrap_err();
        assert_eq!(err.parameter(), Some("?2"));
    }
}
