//! The `zhmc_nic` module: NICs of partitions.

use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};

use zhmc_core::property::process_properties;
use zhmc_core::tables::NIC_PROPERTIES;
use zhmc_core::{
    Error, Filter, HmcClient, Properties, PropertyChanges, Resource, ResourceClass, Result,
};

use crate::lookup::{adapter_port_from_input, find_cpc, find_partition};
use crate::module::ModuleOutput;
use crate::modules::partition::nic_properties;
use crate::params::parse_params;
use crate::status::wait_for_transition_completion;

const ARTIFICIAL_PROPERTIES: [&str; 2] = ["adapter_name", "adapter_port"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum NicState {
    Absent,
    Present,
    Facts,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NicParams {
    cpc_name: String,
    partition_name: String,
    name: String,
    state: NicState,
    #[serde(default)]
    properties: Option<Properties>,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: NicParams = parse_params(params)?;
    match params.state {
        NicState::Absent => ensure_absent(client, &params, check_mode),
        NicState::Present => ensure_present(client, &params, check_mode),
        NicState::Facts => facts(client, &params),
    }
}

/// The property that connects a NIC to the given adapter port, and its
/// value.
///
/// RoCE and CNA NICs reference the port directly. OSA and HiperSockets NICs
/// reference the virtual switch of the port.
fn backing_property(
    client: &dyn HmcClient,
    cpc_uri: &str,
    adapter: &Resource,
    port: &Resource,
) -> Result<(&'static str, String)> {
    match adapter.str_prop("adapter-family") {
        Some("roce") | Some("cna") => Ok(("network-adapter-port-uri", port.uri.clone())),
        Some("osa") | Some("hipersockets") => {
            let port_index = port.prop("index").cloned().unwrap_or(Value::Null);
            let vswitches = client.list(
                ResourceClass::VirtualSwitch,
                Some(cpc_uri),
                &Filter::all().with("backing-adapter-uri", adapter.uri.as_str()),
            )?;
            let vswitch = vswitches
                .into_iter()
                .find(|vs| vs.prop("port") == Some(&port_index))
                .ok_or_else(|| {
                    Error::unexpected(format!(
                        "No virtual switch found for port {} of adapter '{}'",
                        port_index,
                        adapter.name()
                    ))
                })?;
            Ok(("virtual-switch-uri", vswitch.uri))
        }
        family => Err(Error::parameter(format!(
            "Artificial property 'adapter_name' specifies the name of a non-network adapter \
             of family {}: '{}'",
            family.map_or_else(|| "None".to_string(), |f| format!("'{}'", f)),
            adapter.name()
        ))),
    }
}

/// Compute the changes for a NIC.
///
/// # Arguments
///
/// * `client` - The HMC client.
/// * `partition` - The partition of the NIC.
/// * `nic` - The NIC with its full set of properties, or `None` if it does
///   not exist yet.
/// * `name` - The NIC name.
/// * `input` - The `properties` module parameter.
pub fn process_nic_properties(
    client: &dyn HmcClient,
    partition: &Resource,
    nic: Option<&Resource>,
    name: &str,
    input: &Properties,
) -> Result<PropertyChanges> {
    let mut changes = PropertyChanges::new();
    changes.create.insert("name".to_string(), json!(name));
    changes.merge(process_properties(
        &NIC_PROPERTIES,
        input,
        nic.map(|n| &n.properties),
        &ARTIFICIAL_PROPERTIES,
    )?);

    let cpc_uri = partition.parent.as_deref().ok_or_else(|| {
        Error::unexpected(format!("Partition {} has no parent CPC", partition.uri))
    })?;
    if let Some((adapter, port)) = adapter_port_from_input(client, cpc_uri, input)? {
        let (hmc_name, uri) = backing_property(client, cpc_uri, &adapter, &port)?;
        let differs = nic.map_or(true, |n| n.str_prop(hmc_name) != Some(uri.as_str()));
        if differs {
            changes.update.insert(hmc_name.to_string(), json!(uri));
        }
        changes.create.insert(hmc_name.to_string(), json!(uri));
    }
    Ok(changes)
}

fn ensure_present(
    client: &dyn HmcClient,
    params: &NicParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let mut partition = match find_partition(client, &cpc, &params.partition_name) {
        Ok(partition) => partition,
        Err(e) if e.is_not_found() && check_mode => {
            return Ok(ModuleOutput::new(true, json!({})));
        }
        Err(e) => return Err(e),
    };
    let input = params.properties.clone().unwrap_or_default();

    let existing = client.find_optional(ResourceClass::Nic, Some(&partition.uri), &params.name)?;
    let (changed, nic) = match existing {
        None => {
            if check_mode {
                (true, None)
            } else {
                let changes =
                    process_nic_properties(client, &partition, None, &params.name, &input)?;
                let nic = client.create(ResourceClass::Nic, Some(&partition.uri), &changes.create)?;
                let update = changes.update_after_create();
                if !update.is_empty() {
                    client.update(&nic.uri, &update)?;
                }
                (true, Some(client.get(&nic.uri)?))
            }
        }
        Some(mut nic) => {
            client.pull_properties(&mut nic)?;
            let changes =
                process_nic_properties(client, &partition, Some(&nic), &params.name, &input)?;
            if changes.update.is_empty() {
                (false, Some(nic))
            } else {
                if !check_mode {
                    if changes.requires_deactivation {
                        return Err(Error::unexpected(format!(
                            "NIC properties {:?} cannot be updated while the partition is active",
                            changes.update.keys().collect::<Vec<_>>()
                        )));
                    }
                    wait_for_transition_completion(client, &params.cpc_name, &mut partition)?;
                    debug!("Updating NIC '{}'", nic.name());
                    client.update(&nic.uri, &changes.update)?;
                    client.pull_properties(&mut nic)?;
                }
                (true, Some(nic))
            }
        }
    };

    let result = match nic {
        Some(nic) => nic_properties(client, nic)?,
        None => Properties::new(),
    };
    Ok(ModuleOutput::new(changed, result))
}

fn ensure_absent(
    client: &dyn HmcClient,
    params: &NicParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let partition = find_partition(client, &cpc, &params.partition_name)?;
    let Some(nic) = client.find_optional(ResourceClass::Nic, Some(&partition.uri), &params.name)?
    else {
        return Ok(ModuleOutput::new(false, json!({})));
    };
    if !check_mode {
        client.delete(&nic.uri)?;
    }
    Ok(ModuleOutput::new(true, json!({})))
}

fn facts(client: &dyn HmcClient, params: &NicParams) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let partition = find_partition(client, &cpc, &params.partition_name)?;
    let nic = client.find(ResourceClass::Nic, Some(&partition.uri), &params.name)?;
    let nic = client.get(&nic.uri)?;
    Ok(ModuleOutput::new(false, nic_properties(client, nic)?))
}
