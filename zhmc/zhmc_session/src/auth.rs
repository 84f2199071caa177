//! HMC connection parameters.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use zhmc_core::{Error, Result};

/// The `hmc_auth` module parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HmcAuth {
    /// HMC userid, for a new session.
    #[serde(default)]
    pub userid: Option<String>,

    /// HMC password, for a new session.
    #[serde(default)]
    pub password: Option<String>,

    /// Id of an existing HMC session.
    #[serde(default)]
    pub session_id: Option<String>,

    /// Path of CA certificates for verifying the HMC certificate.
    #[serde(default)]
    pub ca_certs: Option<String>,

    /// Verify the HMC certificate.
    #[serde(default = "default_verify")]
    pub verify: bool,
}

fn default_verify() -> bool {
    true
}

/// Parse the `hmc_host` module parameter into a list of HMC hosts.
///
/// The parameter may be a string, a string representation of a list
/// (`"[h1, 'h2']"`), or a list of strings.
pub fn parse_hmc_host(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            match trimmed.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
                Some(inner) => Ok(inner
                    .split(',')
                    .map(|h| h.trim_matches(|c| c == ' ' || c == '"' || c == '\'').to_string())
                    .filter(|h| !h.is_empty())
                    .collect()),
                None => Ok(vec![s.clone()]),
            }
        }
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    Error::parameter(format!(
                        "Module parameter 'hmc_host' must be a list of strings, but has an item {}",
                        item
                    ))
                })
            })
            .collect(),
        other => Err(Error::parameter(format!(
            "Module parameter 'hmc_host' must be a string or list type, but is {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_hmc_host() {
        assert_eq!(parse_hmc_host(&json!("10.0.0.1")).unwrap(), vec!["10.0.0.1"]);
        assert_eq!(
            parse_hmc_host(&json!("[10.0.0.1, '10.0.0.2', \"hmc3\"]")).unwrap(),
            vec!["10.0.0.1", "10.0.0.2", "hmc3"]
        );
        assert_eq!(
            parse_hmc_host(&json!(["hmc1", "hmc2"])).unwrap(),
            vec!["hmc1", "hmc2"]
        );
        assert!(parse_hmc_host(&json!(42)).is_err());
    }

    #[test]
    fn test_hmc_auth_defaults() {
        let auth: HmcAuth = serde_json::from_value(json!({"userid": "u"})).unwrap();
        assert_eq!(auth.userid.as_deref(), Some("u"));
        assert!(auth.verify);
        assert!(auth.session_id.is_none());
    }
}
