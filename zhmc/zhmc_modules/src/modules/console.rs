//! The `zhmc_console` module: the HMC itself.

use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use zhmc_core::{Error, HmcClient, Operation, Properties, Resource, Result};

use crate::module::{required_str, ModuleOutput};
use crate::params::parse_params;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ConsoleState {
    Facts,
    Upgrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum BackupLocationType {
    Ftp,
    #[default]
    Usb,
}

impl BackupLocationType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Ftp => "ftp",
            Self::Usb => "usb",
        }
    }
}

fn default_upgrade_timeout() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConsoleParams {
    state: ConsoleState,
    #[serde(default)]
    bundle_level: Option<String>,
    #[serde(default = "default_upgrade_timeout")]
    upgrade_timeout: u64,
    #[serde(default)]
    backup_location_type: BackupLocationType,
    #[serde(default = "default_true")]
    accept_firmware: bool,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: ConsoleParams = parse_params(params)?;
    match params.state {
        ConsoleState::Facts => facts(client),
        ConsoleState::Upgrade => upgrade(client, &params, check_mode),
    }
}

/// The console properties plus the artificial `api_version` property.
fn console_result(client: &dyn HmcClient, console: &Resource) -> Result<Properties> {
    let mut result = console.properties.clone();
    result.insert(
        "api_version".to_string(),
        Value::Object(client.query_api_version()?),
    );
    Ok(result)
}

fn facts(client: &dyn HmcClient) -> Result<ModuleOutput> {
    let console = client.console()?;
    Ok(ModuleOutput::new(false, console_result(client, &console)?))
}

/// Upgrade the HMC firmware to the requested bundle level.
///
/// An HMC that already is at that bundle level is left unchanged. In check
/// mode, the change is predicted by comparing the bundle levels.
fn upgrade(client: &dyn HmcClient, params: &ConsoleParams, check_mode: bool) -> Result<ModuleOutput> {
    let bundle_level = required_str(&params.bundle_level, "bundle_level")?;
    let mut console = client.console()?;

    let current_level = console
        .prop("ec-mcl-description")
        .and_then(|ec| ec.get("bundle-level"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let Some(current_level) = current_level else {
        return Err(Error::parameter(format!(
            "HMC version {} does not support firmware upgrade through the Web Services API",
            console.str_prop("version").unwrap_or("unknown")
        )));
    };

    let changed = if check_mode {
        current_level != bundle_level
    } else {
        debug!(
            "Upgrading HMC '{}' from bundle level {} to {}",
            console.name(),
            current_level,
            bundle_level
        );
        let operation = Operation::SingleStepInstall {
            bundle_level: bundle_level.to_string(),
            accept_firmware: params.accept_firmware,
            backup_location_type: params.backup_location_type.as_str().to_string(),
            timeout: Some(Duration::from_secs(params.upgrade_timeout)),
        };
        match client.invoke(&console.uri, &operation) {
            Ok(()) => true,
            Err(e) if e.is_http(400, 356) => {
                debug!("HMC '{}' is already at bundle level {}", console.name(), bundle_level);
                false
            }
            Err(e) => return Err(e),
        }
    };

    client.pull_properties(&mut console)?;
    Ok(ModuleOutput::new(changed, console_result(client, &console)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zhmc_core::CONSOLE_URI;
    use zhmc_session::FakedHmc;

    fn params(value: Value) -> Properties {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_facts_include_api_version() {
        let hmc = FakedHmc::new();
        let output = run(&hmc, &params(json!({"state": "facts"})), false).unwrap();
        assert!(!output.changed);
        assert_eq!(output.result["name"], "HMC1");
        assert_eq!(output.result["api_version"]["api-major-version"], 4);
    }

    #[test]
    fn test_upgrade() {
        let hmc = FakedHmc::new();
        let input = params(json!({"state": "upgrade", "bundle_level": "H25"}));
        let output = run(&hmc, &input, false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["ec-mcl-description"]["bundle-level"], "H25");

        // already at that bundle level
        let output = run(&hmc, &input, false).unwrap();
        assert!(!output.changed);
    }

    #[test]
    fn test_upgrade_in_check_mode() {
        let hmc = FakedHmc::new();
        let output = run(
            &hmc,
            &params(json!({"state": "upgrade", "bundle_level": "H25"})),
            true,
        )
        .unwrap();
        assert!(output.changed);
        assert_eq!(output.result["ec-mcl-description"]["bundle-level"], "H21");
        assert!(hmc.mutations().is_empty());
    }

    #[test]
    fn test_upgrade_parameter_errors() {
        let hmc = FakedHmc::new();
        let err = run(&hmc, &params(json!({"state": "upgrade"})), false).unwrap_err();
        assert_eq!(err.to_string(), "Missing required module input parameter: bundle_level");

        hmc.set_properties(CONSOLE_URI, &params(json!({"ec-mcl-description": {}})))
            .unwrap();
        let err = run(
            &hmc,
            &params(json!({"state": "upgrade", "bundle_level": "H25"})),
            false,
        )
        .unwrap_err();
        assert_eq!(
            err.failure_message(),
            "ParameterError: HMC version 2.16.0 does not support firmware upgrade through the \
             Web Services API"
        );
    }
}
