//! Blanking of sensitive values before they are logged or returned.

use serde_json::Value;

use crate::types::Properties;

/// Replacement for blanked out sensitive values.
pub const BLANKED_OUT: &str = "********";

/// Return a copy of the properties with the given properties blanked out.
///
/// Names that are not present are ignored.
pub fn blanked_dict(props: &Properties, blanked: &[&str]) -> Properties {
    let mut copied = props.clone();
    for name in blanked {
        if let Some(value) = copied.get_mut(*name) {
            *value = Value::String(BLANKED_OUT.to_string());
        }
    }
    copied
}

/// Return a copy of the properties with the given properties removed.
pub fn removed_dict(props: &Properties, removed: &[&str]) -> Properties {
    let mut copied = props.clone();
    for name in removed {
        copied.remove(*name);
    }
    copied
}

/// Return a copy of the module parameters that is safe to log.
///
/// The password and session id in `hmc_auth` are blanked out, and so are
/// the given names in the `properties` parameter.
pub fn blanked_params(params: &Properties, blanked_properties: &[&str]) -> Properties {
    let mut copied = params.clone();
    if let Some(Value::Object(props)) = copied.get("properties") {
        if !blanked_properties.is_empty() {
            let blanked = blanked_dict(props, blanked_properties);
            copied.insert("properties".to_string(), Value::Object(blanked));
        }
    }
    if let Some(Value::Object(auth)) = copied.get("hmc_auth") {
        let mut auth = auth.clone();
        for key in ["password", "session_id"] {
            if matches!(auth.get(key), Some(v) if !v.is_null()) {
                auth.insert(key.to_string(), Value::String(BLANKED_OUT.to_string()));
            }
        }
        copied.insert("hmc_auth".to_string(), Value::Object(auth));
    }
    copied
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blanked_params() {
        let params = json!({
            "hmc_auth": {"userid": "admin", "password": "secret", "session_id": null},
            "properties": {"password": "pw", "description": "d"},
            "name": "u1"
        });
        let blanked = blanked_params(params.as_object().unwrap(), &["password"]);
        assert_eq!(
            Value::Object(blanked),
            json!({
                "hmc_auth": {"userid": "admin", "password": "********", "session_id": null},
                "properties": {"password": "********", "description": "d"},
                "name": "u1"
            })
        );
        // the input is untouched
        assert_eq!(params["hmc_auth"]["password"], "secret");
    }

    #[test]
    fn test_removed_dict() {
        let props = json!({"password": "pw", "name": "u1"});
        let removed = removed_dict(props.as_object().unwrap(), &["password", "other"]);
        assert_eq!(Value::Object(removed), json!({"name": "u1"}));
    }
}
