//! The `zhmc_virtual_function` module: virtual functions of partitions.

use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};

use zhmc_core::property::process_properties;
use zhmc_core::tables::VIRTUAL_FUNCTION_PROPERTIES;
use zhmc_core::{Error, HmcClient, Properties, PropertyChanges, Resource, ResourceClass, Result};

use crate::lookup::{find_cpc, find_partition, not_found_as_parameter_error};
use crate::module::ModuleOutput;
use crate::params::parse_params;
use crate::status::wait_for_transition_completion;

const ARTIFICIAL_PROPERTIES: [&str; 1] = ["adapter_name"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum VirtualFunctionState {
    Absent,
    Present,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VirtualFunctionParams {
    cpc_name: String,
    partition_name: String,
    name: String,
    state: VirtualFunctionState,
    #[serde(default)]
    properties: Option<Properties>,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: VirtualFunctionParams = parse_params(params)?;
    match params.state {
        VirtualFunctionState::Absent => ensure_absent(client, &params, check_mode),
        VirtualFunctionState::Present => ensure_present(client, &params, check_mode),
    }
}

/// Compute the changes for a virtual function.
///
/// The artificial `adapter_name` property is resolved into `adapter-uri`.
pub fn process_virtual_function_properties(
    client: &dyn HmcClient,
    partition: &Resource,
    vfunction: Option<&Resource>,
    name: &str,
    input: &Properties,
) -> Result<PropertyChanges> {
    let mut changes = PropertyChanges::new();
    changes.create.insert("name".to_string(), json!(name));
    changes.merge(process_properties(
        &VIRTUAL_FUNCTION_PROPERTIES,
        input,
        vfunction.map(|vf| &vf.properties),
        &ARTIFICIAL_PROPERTIES,
    )?);

    if let Some(name_value) = input.get("adapter_name") {
        let adapter_name = match name_value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let cpc_uri = partition.parent.as_deref().ok_or_else(|| {
            Error::unexpected(format!("Partition {} has no parent CPC", partition.uri))
        })?;
        let adapter = not_found_as_parameter_error(
            client.find(ResourceClass::Adapter, Some(cpc_uri), &adapter_name),
            || {
                format!(
                    "Artificial property 'adapter_name' does not specify the name of an \
                     existing adapter: '{}'",
                    adapter_name
                )
            },
        )?;
        let differs =
            vfunction.map_or(true, |vf| vf.str_prop("adapter-uri") != Some(adapter.uri.as_str()));
        if differs {
            changes.update.insert("adapter-uri".to_string(), json!(adapter.uri));
        }
        changes.create.insert("adapter-uri".to_string(), json!(adapter.uri));
    }
    Ok(changes)
}

fn ensure_present(
    client: &dyn HmcClient,
    params: &VirtualFunctionParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let mut partition = match find_partition(client, &cpc, &params.partition_name) {
        Ok(partition) => partition,
        // the virtual function would be created along with the partition
        Err(e) if e.is_not_found() && check_mode => {
            return Ok(ModuleOutput::new(true, json!({})));
        }
        Err(e) => return Err(e),
    };
    let input = params.properties.clone().unwrap_or_default();

    let existing = client.find_optional(
        ResourceClass::VirtualFunction,
        Some(&partition.uri),
        &params.name,
    )?;
    let (changed, vfunction) = match existing {
        None => {
            if check_mode {
                (true, None)
            } else {
                let changes = process_virtual_function_properties(
                    client,
                    &partition,
                    None,
                    &params.name,
                    &input,
                )?;
                debug!(
                    "Creating virtual function '{}' in partition '{}'",
                    params.name,
                    partition.name()
                );
                let vf = client.create(
                    ResourceClass::VirtualFunction,
                    Some(&partition.uri),
                    &changes.create,
                )?;
                let update = changes.update_after_create();
                if !update.is_empty() {
                    client.update(&vf.uri, &update)?;
                }
                (true, Some(client.get(&vf.uri)?))
            }
        }
        Some(mut vf) => {
            client.pull_properties(&mut vf)?;
            let changes = process_virtual_function_properties(
                client,
                &partition,
                Some(&vf),
                &params.name,
                &input,
            )?;
            if changes.update.is_empty() {
                (false, Some(vf))
            } else {
                if !check_mode {
                    // all virtual function properties can be updated while
                    // the partition is active
                    if changes.requires_deactivation {
                        return Err(Error::unexpected(format!(
                            "Virtual function properties {:?} cannot be updated while the \
                             partition is active",
                            changes.update.keys().collect::<Vec<_>>()
                        )));
                    }
                    wait_for_transition_completion(client, &params.cpc_name, &mut partition)?;
                    debug!("Updating virtual function '{}'", vf.name());
                    client.update(&vf.uri, &changes.update)?;
                    client.pull_properties(&mut vf)?;
                }
                (true, Some(vf))
            }
        }
    };

    let result = vfunction.map(|vf| vf.properties).unwrap_or_default();
    Ok(ModuleOutput::new(changed, result))
}

fn ensure_absent(
    client: &dyn HmcClient,
    params: &VirtualFunctionParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let partition = find_partition(client, &cpc, &params.partition_name)?;
    let Some(vf) = client.find_optional(
        ResourceClass::VirtualFunction,
        Some(&partition.uri),
        &params.name,
    )?
    else {
        return Ok(ModuleOutput::new(false, json!({})));
    };
    if !check_mode {
        debug!("Deleting virtual function '{}'", vf.name());
        client.delete(&vf.uri)?;
    }
    Ok(ModuleOutput::new(true, json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zhmc_session::FakedHmc;

    fn props(value: Value) -> Properties {
        value.as_object().unwrap().clone()
    }

    struct Setup {
        hmc: FakedHmc,
        partition: String,
        zedc: String,
    }

    fn setup() -> Setup {
        let hmc = FakedHmc::new();
        let cpc = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
        let zedc = hmc
            .add(
                ResourceClass::Adapter,
                Some(&cpc),
                props(json!({"name": "ZEDC1", "adapter-family": "accelerator"})),
            )
            .unwrap();
        let partition = hmc
            .add(ResourceClass::Partition, Some(&cpc), props(json!({"name": "part1"})))
            .unwrap();
        Setup {
            hmc,
            partition,
            zedc,
        }
    }

    fn params(state: &str, properties: Value) -> Properties {
        props(json!({
            "cpc_name": "CPC1",
            "partition_name": "part1",
            "name": "vf1",
            "state": state,
            "properties": properties,
        }))
    }

    #[test]
    fn test_create_and_update() {
        let s = setup();
        let input = json!({"adapter_name": "ZEDC1", "description": "zEDC", "device_number": "033F"});

        let output = run(&s.hmc, &params("present", input.clone()), true).unwrap();
        assert!(output.changed);
        assert_eq!(output.result, json!({}));
        assert!(s.hmc.mutations().is_empty());

        let output = run(&s.hmc, &params("present", input.clone()), false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["adapter-uri"], json!(s.zedc));
        assert_eq!(output.result["device-number"], "033F");
        let uri = output.result["element-uri"].as_str().unwrap().to_string();
        assert_eq!(
            s.hmc.properties(&s.partition).unwrap()["virtual-function-uris"],
            json!([uri])
        );

        let input = json!({"adapter_name": "ZEDC1", "description": "zEDC", "device_number": "33f"});
        let output = run(&s.hmc, &params("present", input), false).unwrap();
        assert!(!output.changed);

        let output = run(&s.hmc, &params("present", json!({"description": "new"})), false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["description"], "new");
    }

    #[test]
    fn test_unknown_adapter() {
        let s = setup();
        let err = run(&s.hmc, &params("present", json!({"adapter_name": "NOPE"})), false)
            .unwrap_err();
        assert_eq!(
            err.failure_message(),
            "ParameterError: Artificial property 'adapter_name' does not specify the name of \
             an existing adapter: 'NOPE'"
        );
        assert!(s.hmc.mutations().is_empty());
    }

    #[test]
    fn test_missing_partition() {
        let s = setup();
        let mut input = params("present", json!({}));
        input.insert("partition_name".to_string(), json!("part9"));
        let output = run(&s.hmc, &input, true).unwrap();
        assert!(output.changed);
        assert!(run(&s.hmc, &input, false).unwrap_err().is_not_found());
    }

    #[test]
    fn test_absent() {
        let s = setup();
        s.hmc
            .add(
                ResourceClass::VirtualFunction,
                Some(&s.partition),
                props(json!({"name": "vf1"})),
            )
            .unwrap();
        let output = run(&s.hmc, &params("absent", json!({})), true).unwrap();
        assert!(output.changed);
        assert!(s.hmc.mutations().is_empty());

        let output = run(&s.hmc, &params("absent", json!({})), false).unwrap();
        assert!(output.changed);
        assert_eq!(
            s.hmc.properties(&s.partition).unwrap()["virtual-function-uris"],
            json!([])
        );
        let output = run(&s.hmc, &params("absent", json!({})), false).unwrap();
        assert!(!output.changed);
    }
}
