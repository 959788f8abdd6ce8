use crate::error::NimbleError;
use crate::types::{Value, ValueType};

#[derive(Clone, Copy)]
enum Number {
    Integral(i64),
    Real(f64),
}

fn number(value: &Value) -> Option<Number> {
    match value {
        Value::Byte(v) => Some(Number::Integral(i64::from(*v))),
        Value::Short(v) => Some(Number::Integral(i64::from(*v))),
        Value::Int(v) => Some(Number::Integral(i64::from(*v))),
        Value::Long(v) => Some(Number::Integral(*v)),
        Value::Float(v) => Some(Number::Real(f64::from(*v))),
        Value::Double(v) => Some(Number::Real(*v)),
        _ => None,
    }
}

// `as` truncates toward zero for float -> int and wraps for int -> narrower int.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn narrow(n: Number, dest: ValueType) -> Option<Value> {
    let out = match (n, dest) {
        (Number::Integral(i), ValueType::Byte) => Value::Byte(i as i8),
        (Number::Real(f), ValueType::Byte) => Value::Byte(f as i8),
        (Number::Integral(i), ValueType::Short) => Value::Short(i as i16),
        (Number::Real(f), ValueType::Short) => Value::Short(f as i16),
        (Number::Integral(i), ValueType::Int) => Value::Int(i as i32),
        (Number::Real(f), ValueType::Int) => Value::Int(f as i32),
        (Number::Integral(i), ValueType::Long) => Value::Long(i),
        (Number::Real(f), ValueType::Long) => Value::Long(f as i64),
        (Number::Integral(i), ValueType::Float) => Value::Float(i as f32),
        (Number::Real(f), ValueType::Float) => Value::Float(f as f32),
        (Number::Integral(i), ValueType::Double) => Value::Double(i as f64),
        (Number::Real(f), ValueType::Double) => Value::Double(f),
        _ => return None,
    };
    Some(out)
}

/// Default coercion applied when no converter is registered for
/// `(value.value_type(), dest)`.
///
/// - enumeration destination: text naming a variant exactly, else an error
/// - numeric destination from any numeric value: natural widening/narrowing
/// - boolean destination from a numeric value: `false` iff zero
/// - text destination from non-text: the canonical string form
/// - anything else is returned unchanged
///
/// # Errors
///
/// Returns `NimbleError::ConversionError` for enumeration mismatches.
pub fn coerce(value: Value, dest: ValueType) -> Result<Value, NimbleError> {
    let from = value.value_type();
    if from == ValueType::Null {
        return Ok(value);
    }

    match dest {
        ValueType::Enum(enum_type) => match value {
            Value::Text(name) if enum_type.has_variant(&name) => Ok(Value::Text(name)),
            Value::Text(name) => Err(NimbleError::conversion(
                from,
                dest,
                format!("'{name}' is not a variant of {}", enum_type.name),
            )),
            _ => Err(NimbleError::conversion(
                from,
                dest,
                format!("only text can be converted to enum {}", enum_type.name),
            )),
        },
        _ if dest.is_numeric() && from.is_numeric() => {
            let converted = number(&value).and_then(|n| narrow(n, dest));
            Ok(converted.unwrap_or(value))
        }
        ValueType::Bool if from.is_numeric() => {
            let is_zero = match number(&value) {
                Some(Number::Integral(i)) => i == 0,
                Some(Number::Real(f)) => f == 0.0,
                None => false,
            };
            Ok(Value::Bool(!is_zero))
        }
        ValueType::Text if from != ValueType::Text => Ok(Value::Text(value.to_string())),
        _ => Ok(value),
    }
}
