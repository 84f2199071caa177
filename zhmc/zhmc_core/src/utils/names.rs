//! Conversion between module (underscore) and HMC (hyphen) property names.

use serde_json::Value;

use crate::types::Properties;

fn convert(props: &Properties, from: char, to: char) -> Properties {
    props
        .iter()
        .map(|(name, value)| {
            let value = match value {
                Value::Object(inner) => Value::Object(convert(inner, from, to)),
                other => other.clone(),
            };
            (name.replace(from, &to.to_string()), value)
        })
        .collect()
}

/// Convert property names from hyphens to underscores, recursively into
/// nested objects. Objects inside lists are left unchanged.
pub fn underscore_properties(props: &Properties) -> Properties {
    convert(props, '-', '_')
}

/// Convert property names from underscores to hyphens, recursively into
/// nested objects. Objects inside lists are left unchanged.
pub fn hyphen_properties(props: &Properties) -> Properties {
    convert(props, '_', '-')
}
