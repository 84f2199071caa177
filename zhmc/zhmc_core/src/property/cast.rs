//! Type casts applied to input property values.
//!
//! Values arriving from playbooks are frequently strings even where the HMC
//! data model expects numbers or booleans; these casts convert them.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::utils::repr;

fn cast_error(value: &Value, prop_name: &str, target: &str) -> Error {
    Error::parameter(format!(
        "Value {} of property '{}' cannot be converted to {}",
        repr(value),
        prop_name,
        target
    ))
}

/// Convert to an integer.
pub fn cast_int(value: &Value, prop_name: &str) -> Result<Value> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        Value::Number(n) => n
            .as_f64()
            .map(|f| Value::from(f.trunc() as i64))
            .ok_or_else(|| cast_error(value, prop_name, "an integer")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| cast_error(value, prop_name, "an integer")),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        _ => Err(cast_error(value, prop_name, "an integer")),
    }
}

/// Convert to a floating point number.
pub fn cast_float(value: &Value, prop_name: &str) -> Result<Value> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(Value::from)
            .ok_or_else(|| cast_error(value, prop_name, "a float")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::from)
            .map_err(|_| cast_error(value, prop_name, "a float")),
        _ => Err(cast_error(value, prop_name, "a float")),
    }
}

/// Convert to a boolean.
pub fn cast_bool(value: &Value, prop_name: &str) -> Result<Value> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::Bool(n.as_f64().unwrap_or(0.0) != 0.0)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(cast_error(value, prop_name, "a boolean")),
        },
        _ => Err(cast_error(value, prop_name, "a boolean")),
    }
}

/// Ensure a string value. Null and lists of strings are passed through.
pub fn cast_unicode(value: &Value, prop_name: &str) -> Result<Value> {
    match value {
        Value::Null | Value::String(_) => Ok(value.clone()),
        Value::Array(items) => items
            .iter()
            .map(|item| cast_unicode(item, prop_name))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        _ => Err(cast_error(value, prop_name, "a string")),
    }
}

/// Ensure a list value. A single non-list value becomes a one-item list.
pub fn cast_list(value: &Value, _prop_name: &str) -> Result<Value> {
    match value {
        Value::Array(_) => Ok(value.clone()),
        Value::Null => Ok(Value::Array(Vec::new())),
        other => Ok(Value::Array(vec![other.clone()])),
    }
}
