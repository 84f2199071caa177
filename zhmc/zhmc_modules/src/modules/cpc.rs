//! The `zhmc_cpc` module: updatable properties of CPCs.

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use zhmc_core::property::process_normal_property;
use zhmc_core::tables::CPC_PROPERTIES;
use zhmc_core::{Error, Filter, HmcClient, Properties, Resource, ResourceClass, Result};

use crate::lookup::find_cpc;
use crate::module::ModuleOutput;
use crate::params::parse_params;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CpcState {
    Set,
    Facts,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CpcParams {
    name: String,
    state: CpcState,
    #[serde(default)]
    properties: Option<Properties>,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: CpcParams = parse_params(params)?;
    match params.state {
        CpcState::Set => ensure_set(client, &params, check_mode),
        CpcState::Facts => facts(client, &params),
    }
}

/// The minimal set of properties to update on the CPC.
///
/// CPCs cannot be created, so any property that is not updatable is
/// rejected up front.
fn update_properties(cpc: &Resource, input: &Properties) -> Result<Properties> {
    let mut update = Properties::new();
    for (name, value) in input {
        let updatable = CPC_PROPERTIES
            .get(name)
            .map(|spec| spec.allowed && spec.update)
            .unwrap_or(false);
        if !updatable {
            return Err(Error::parameter(format!(
                "CPC property '{}' specified in the 'properties' module parameter cannot be \
                 updated.",
                name
            )));
        }
        let changes = process_normal_property(&CPC_PROPERTIES, name, value, Some(&cpc.properties))?;
        if !changes.create.is_empty() {
            return Err(Error::unexpected(format!(
                "CPC property '{}' resulted in create properties",
                name
            )));
        }
        update.extend(changes.update);
    }
    Ok(update)
}

/// The CPC properties plus the `partitions` and `adapters` lists.
fn cpc_result(client: &dyn HmcClient, cpc: &Resource) -> Result<Properties> {
    let mut result = cpc.properties.clone();
    let children = |class: ResourceClass| -> Result<Value> {
        let listed = client.list(class, Some(&cpc.uri), &Filter::all())?;
        Ok(Value::Array(
            listed.into_iter().map(|res| Value::Object(res.properties)).collect(),
        ))
    };
    result.insert("partitions".to_string(), children(ResourceClass::Partition)?);
    result.insert("adapters".to_string(), children(ResourceClass::Adapter)?);
    Ok(result)
}

fn ensure_set(client: &dyn HmcClient, params: &CpcParams, check_mode: bool) -> Result<ModuleOutput> {
    let mut cpc = find_cpc(client, &params.name)?;
    client.pull_properties(&mut cpc)?;

    let input = params.properties.clone().unwrap_or_default();
    let update = update_properties(&cpc, &input)?;
    let changed = !update.is_empty();
    if changed {
        debug!(
            "Updating properties of CPC '{}': {}",
            cpc.name(),
            Value::Object(update.clone())
        );
        if !check_mode {
            client.update(&cpc.uri, &update)?;
        }
        cpc.update_local(&update);
    }
    Ok(ModuleOutput::new(changed, cpc_result(client, &cpc)?))
}

fn facts(client: &dyn HmcClient, params: &CpcParams) -> Result<ModuleOutput> {
    let mut cpc = find_cpc(client, &params.name)?;
    client.pull_properties(&mut cpc)?;
    Ok(ModuleOutput::new(false, cpc_result(client, &cpc)?))
}
