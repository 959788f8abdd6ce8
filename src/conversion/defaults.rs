use chrono::{NaiveDate, NaiveDateTime};

use crate::error::NimbleError;
use crate::types::{Value, ValueType};

use super::ConverterRegistryBuilder;

// Timestamps come back from text-typed columns in any of these layouts.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

pub(super) fn register(builder: ConverterRegistryBuilder) -> ConverterRegistryBuilder {
    builder
        .from_db(ValueType::Text, ValueType::Timestamp, text_to_timestamp)
        .from_db(ValueType::Text, ValueType::Date, text_to_date)
        .from_db(ValueType::Timestamp, ValueType::Date, timestamp_to_date)
        .from_db(ValueType::Date, ValueType::Timestamp, date_to_timestamp)
        .from_db(ValueType::Text, ValueType::Json, text_to_json)
        .to_db(ValueType::Json, json_to_text)
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn unexpected(value: &Value, to: ValueType) -> NimbleError {
    NimbleError::conversion(value.value_type(), to, format!("can't parse '{value}'"))
}

fn text_to_timestamp(value: Value) -> Result<Value, NimbleError> {
    match value.as_text().and_then(parse_timestamp) {
        Some(dt) => Ok(Value::Timestamp(dt)),
        None => Err(unexpected(&value, ValueType::Timestamp)),
    }
}

fn text_to_date(value: Value) -> Result<Value, NimbleError> {
    let parsed = value.as_text().and_then(|s| {
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .ok()
            .or_else(|| parse_timestamp(s).map(|dt| dt.date()))
    });
    match parsed {
        Some(d) => Ok(Value::Date(d)),
        None => Err(unexpected(&value, ValueType::Date)),
    }
}

fn timestamp_to_date(value: Value) -> Result<Value, NimbleError> {
    match value {
        Value::Timestamp(dt) => Ok(Value::Date(dt.date())),
        other => Err(unexpected(&other, ValueType::Date)),
    }
}

fn date_to_timestamp(value: Value) -> Result<Value, NimbleError> {
    match value {
        Value::Date(d) => d
            .and_hms_opt(0, 0, 0)
            .map(Value::Timestamp)
            .ok_or_else(|| unexpected(&Value::Date(d), ValueType::Timestamp)),
        other => Err(unexpected(&other, ValueType::Timestamp)),
    }
}

fn text_to_json(value: Value) -> Result<Value, NimbleError> {
    match value {
        Value::Text(s) => serde_json::from_str(&s).map(Value::Json).map_err(|e| {
            NimbleError::conversion(ValueType::Text, ValueType::Json, e.to_string())
        }),
        other => Err(unexpected(&other, ValueType::Json)),
    }
}

fn json_to_text(value: Value) -> Result<Value, NimbleError> {
    match value {
        Value::Json(json) => Ok(Value::Text(json.to_string())),
        other => Ok(other),
    }
}
