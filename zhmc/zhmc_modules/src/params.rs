//! Module parameters.
//!
//! Every module accepts the connection parameters `hmc_host` and `hmc_auth`
//! and the optional `log_file`, in addition to its own parameters. The
//! module parameters are deserialized into a typed struct per module, which
//! rejects unknown parameters.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;

use zhmc_core::{Error, Properties, Result};
use zhmc_session::{parse_hmc_host, HmcAuth};

/// Names of the parameters handled by the runner rather than the module.
pub const COMMON_PARAMS: [&str; 4] = ["hmc_host", "hmc_auth", "log_file", "_faked_session"];

/// Parameters common to all modules.
#[derive(Debug, Clone, Deserialize)]
pub struct CommonParams {
    /// The HMC host(s): a string, a list string or a list.
    pub hmc_host: Value,

    /// The HMC credentials or session.
    pub hmc_auth: HmcAuth,

    /// Path of the log file.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl CommonParams {
    /// Extract the common parameters from the module parameters.
    pub fn from_params(params: &Properties) -> Result<Self> {
        let common: Properties = params
            .iter()
            .filter(|(name, _)| COMMON_PARAMS[..3].contains(&name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        serde_json::from_value(Value::Object(common)).map_err(|e| {
            Error::parameter(format!("Invalid connection parameters: {}", e))
        })
    }

    /// The HMC hosts.
    pub fn hosts(&self) -> Result<Vec<String>> {
        parse_hmc_host(&self.hmc_host)
    }
}

/// Deserialize the module-specific parameters.
///
/// The common parameters are left out, so module parameter structs can deny
/// unknown fields.
pub fn parse_params<T: DeserializeOwned>(params: &Properties) -> Result<T> {
    let module_params: Properties = params
        .iter()
        .filter(|(name, _)| !COMMON_PARAMS.contains(&name.as_str()))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    serde_json::from_value(Value::Object(module_params))
        .map_err(|e| Error::parameter(format!("Invalid module parameters: {}", e)))
}
