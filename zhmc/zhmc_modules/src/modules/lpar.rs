//! The `zhmc_lpar` module: LPARs of CPCs in classic mode.
//!
//! LPARs cannot be created or deleted. The module drives an LPAR into an
//! inactive, active or loaded state and updates its properties.

use log::debug;
use serde::Deserialize;
use std::time::Duration;

use zhmc_core::property::process_properties;
use zhmc_core::tables::LPAR_PROPERTIES;
use zhmc_core::{Error, HmcClient, Properties, Resource, ResourceClass, Result};

use crate::lookup::find_cpc;
use crate::module::ModuleOutput;
use crate::params::parse_params;
use crate::status::{ensure_lpar_active, ensure_lpar_inactive, ensure_lpar_loaded, LparOptions};

/// LPAR statuses in which properties can be updated.
const UPDATABLE_STATUSES: [&str; 3] = ["not-operating", "operating", "acceptable"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LparState {
    Inactive,
    Active,
    Loaded,
    Set,
    Facts,
}

impl LparState {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Loaded => "loaded",
            Self::Set => "set",
            Self::Facts => "facts",
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LparParams {
    cpc_name: String,
    name: String,
    state: LparState,
    #[serde(default)]
    activation_profile_name: Option<String>,
    #[serde(default)]
    load_address: Option<String>,
    #[serde(default)]
    load_parameter: Option<String>,
    #[serde(default = "default_true")]
    clear_indicator: bool,
    #[serde(default)]
    store_status_indicator: bool,
    /// Timeout in seconds for the HMC operations.
    #[serde(default)]
    timeout: Option<u64>,
    /// Timeout in seconds for reaching the desired status.
    #[serde(default)]
    status_timeout: Option<u64>,
    #[serde(default)]
    allow_status_exceptions: bool,
    #[serde(default)]
    force: bool,
    #[serde(default)]
    properties: Option<Properties>,
}

impl LparParams {
    fn options(&self) -> LparOptions {
        LparOptions {
            activation_profile_name: self.activation_profile_name.clone(),
            load_address: self.load_address.clone(),
            load_parameter: self.load_parameter.clone(),
            clear_indicator: self.clear_indicator,
            store_status_indicator: self.store_status_indicator,
            operation_timeout: self.timeout.map(Duration::from_secs),
            status_timeout: self.status_timeout.map(Duration::from_secs),
            allow_status_exceptions: self.allow_status_exceptions,
            force: self.force,
        }
    }

    fn input_properties(&self) -> Properties {
        self.properties.clone().unwrap_or_default()
    }

    /// Fail if properties were given for a state that does not use them.
    fn reject_properties(&self) -> Result<()> {
        match &self.properties {
            Some(props) if !props.is_empty() => Err(Error::parameter(format!(
                "Properties must not be specified for state={} with LPAR '{}'.",
                self.state.as_str(),
                self.name
            ))),
            _ => Ok(()),
        }
    }
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: LparParams = parse_params(params)?;
    match params.state {
        LparState::Inactive => ensure_inactive(client, &params, check_mode),
        LparState::Active | LparState::Loaded => ensure_running(client, &params, check_mode),
        LparState::Set => ensure_set(client, &params, check_mode),
        LparState::Facts => facts(client, &params),
    }
}

fn find_lpar(client: &dyn HmcClient, params: &LparParams) -> Result<Resource> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let mut lpar = client.find(ResourceClass::Lpar, Some(&cpc.uri), &params.name)?;
    client.pull_properties(&mut lpar)?;
    Ok(lpar)
}

/// The minimal set of properties to update on the LPAR.
fn update_properties(lpar: &Resource, input: &Properties) -> Result<Properties> {
    let changes = process_properties(&LPAR_PROPERTIES, input, Some(&lpar.properties), &[])?;
    if !changes.create.is_empty() || changes.requires_deactivation {
        return Err(Error::unexpected(format!(
            "LPAR '{}' cannot have create properties or require deactivation",
            lpar.name()
        )));
    }
    Ok(changes.update)
}

/// Update the LPAR properties. Returns whether there were any to update.
fn apply_update(
    client: &dyn HmcClient,
    lpar: &mut Resource,
    input: &Properties,
    check_mode: bool,
) -> Result<bool> {
    let update = update_properties(lpar, input)?;
    if update.is_empty() {
        return Ok(false);
    }
    let status = lpar.str_prop("status").unwrap_or("");
    if !UPDATABLE_STATUSES.contains(&status) {
        return Err(Error::status(format!(
            "LPAR '{}' has status {} and cannot be updated.",
            lpar.name(),
            status
        )));
    }
    debug!("Updating properties of LPAR '{}'", lpar.name());
    if check_mode {
        lpar.update_local(&update);
    } else {
        client.update(&lpar.uri, &update)?;
        client.pull_properties(lpar)?;
    }
    Ok(true)
}

fn ensure_inactive(
    client: &dyn HmcClient,
    params: &LparParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    params.reject_properties()?;
    let mut lpar = find_lpar(client, params)?;
    let changed = ensure_lpar_inactive(client, &mut lpar, check_mode, &params.options())?;
    if changed && !check_mode {
        client.pull_properties(&mut lpar)?;
    }
    Ok(ModuleOutput::new(changed, lpar.properties))
}

/// Ensure the LPAR is active (`active`) or loaded (`loaded`), then update
/// its properties.
fn ensure_running(
    client: &dyn HmcClient,
    params: &LparParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let mut lpar = find_lpar(client, params)?;
    let options = params.options();
    let mut changed = if params.state == LparState::Loaded {
        ensure_lpar_loaded(client, &mut lpar, check_mode, &options)?
    } else {
        ensure_lpar_active(client, &mut lpar, check_mode, &options)?
    };
    if changed && !check_mode {
        client.pull_properties(&mut lpar)?;
    }
    changed |= apply_update(client, &mut lpar, &params.input_properties(), check_mode)?;
    Ok(ModuleOutput::new(changed, lpar.properties))
}

fn ensure_set(client: &dyn HmcClient, params: &LparParams, check_mode: bool) -> Result<ModuleOutput> {
    let mut lpar = find_lpar(client, params)?;
    let changed = apply_update(client, &mut lpar, &params.input_properties(), check_mode)?;
    Ok(ModuleOutput::new(changed, lpar.properties))
}

fn facts(client: &dyn HmcClient, params: &LparParams) -> Result<ModuleOutput> {
    params.reject_properties()?;
    let lpar = find_lpar(client, params)?;
    Ok(ModuleOutput::new(false, lpar.properties))
}
