//! Equality functions for property values that have several textual forms.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::utils::repr;

/// A hex number in canonical form: the sign and the lower case digits
/// without leading zeros. Zero has no sign and the digits "0".
#[derive(Debug, PartialEq)]
struct HexNumber {
    negative: bool,
    digits: String,
}

impl HexNumber {
    fn from_magnitude(negative: bool, magnitude: u64) -> HexNumber {
        HexNumber {
            negative: negative && magnitude != 0,
            digits: format!("{:x}", magnitude),
        }
    }
}

/// Parse a hex number value of any length. Empty strings and null mean
/// "no value".
fn hex_value(value: &Value) -> std::result::Result<Option<HexNumber>, ()> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => {
            let s = s.trim();
            let (negative, unsigned) = match s.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, s.strip_prefix('+').unwrap_or(s)),
            };
            let digits = unsigned
                .strip_prefix("0x")
                .or_else(|| unsigned.strip_prefix("0X"))
                .unwrap_or(unsigned);
            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(());
            }
            let digits = digits.trim_start_matches('0').to_ascii_lowercase();
            if digits.is_empty() {
                return Ok(Some(HexNumber::from_magnitude(false, 0)));
            }
            Ok(Some(HexNumber { negative, digits }))
        }
        Value::Number(n) => match (n.as_u64(), n.as_i64()) {
            (Some(v), _) => Ok(Some(HexNumber::from_magnitude(false, v))),
            (None, Some(v)) => Ok(Some(HexNumber::from_magnitude(true, v.unsigned_abs()))),
            _ => Err(()),
        },
        _ => Err(()),
    }
}

/// Test two hex string values of a property for equality.
///
/// `"0x1F"`, `"1f"` and `"001F"` are all equal. A malformed new value is a
/// parameter error, and so is a malformed current value.
pub fn eq_hex(current: Option<&Value>, new: &Value, prop_name: &str) -> Result<bool> {
    let current = match current {
        Some(value) => hex_value(value).map_err(|_| {
            Error::parameter(format!(
                "Unexpected: Actual value of property '{}' is not a valid hex number: {}",
                prop_name,
                repr(value)
            ))
        })?,
        None => None,
    };
    let new = hex_value(new).map_err(|_| {
        Error::parameter(format!(
            "New value for property '{}' is not a valid hex number: {}",
            prop_name,
            repr(new)
        ))
    })?;
    Ok(current == new)
}

/// Normalize a MAC address to lower case two-digit octets.
fn normalized_mac(value: &Value) -> std::result::Result<Option<String>, ()> {
    let mac = match value {
        Value::Null => return Ok(None),
        Value::String(s) if s.is_empty() => return Ok(None),
        Value::String(s) => s,
        _ => return Err(()),
    };
    let octets = mac
        .split(':')
        .map(|part| u8::from_str_radix(part, 16).map(|b| format!("{:02x}", b)))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| ())?;
    Ok(Some(octets.join(":")))
}

/// Test two MAC address values of a property for equality, ignoring case
/// and leading zeros of the octets.
pub fn eq_mac(current: Option<&Value>, new: &Value, prop_name: &str) -> Result<bool> {
    let current = match current {
        Some(value) => normalized_mac(value).map_err(|_| {
            Error::parameter(format!(
                "Unexpected: Actual value of property '{}' is not a valid MAC address: {}",
                prop_name,
                repr(value)
            ))
        })?,
        None => None,
    };
    let new = normalized_mac(new).map_err(|_| {
        Error::parameter(format!(
            "New value for property '{}' is not a valid MAC address: {}",
            prop_name,
            repr(new)
        ))
    })?;
    Ok(current == new)
}

/// Test two string values for equality, ignoring case.
pub fn eq_casefold(current: Option<&Value>, new: &Value, _prop_name: &str) -> Result<bool> {
    match (current, new) {
        (Some(Value::String(a)), Value::String(b)) => Ok(a.to_lowercase() == b.to_lowercase()),
        (current, new) => Ok(current.unwrap_or(&Value::Null) == new),
    }
}
