//! The `zhmc_hba` module: HBAs of partitions.
//!
//! The adapter port backing an HBA is given through the artificial
//! properties `adapter_name` and `adapter_port`. It can only be set when the
//! HBA is created.

use log::debug;
use serde::Deserialize;
use serde_json::json;

use zhmc_core::property::process_properties;
use zhmc_core::tables::HBA_PROPERTIES;
use zhmc_core::{Error, HmcClient, Properties, PropertyChanges, Resource, ResourceClass, Result};

use crate::lookup::{adapter_port_from_input, find_cpc, find_partition};
use crate::module::ModuleOutput;
use crate::params::parse_params;
use crate::status::wait_for_transition_completion;

const ARTIFICIAL_PROPERTIES: [&str; 2] = ["adapter_name", "adapter_port"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum HbaState {
    Absent,
    Present,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HbaParams {
    cpc_name: String,
    partition_name: String,
    name: String,
    state: HbaState,
    #[serde(default)]
    properties: Option<Properties>,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: HbaParams = parse_params(params)?;
    match params.state {
        HbaState::Absent => ensure_absent(client, &params, check_mode),
        HbaState::Present => ensure_present(client, &params, check_mode),
    }
}

/// Compute the changes for an HBA.
///
/// # Arguments
///
/// * `client` - The HMC client.
/// * `partition` - The partition of the HBA.
/// * `hba` - The HBA with its full set of properties, or `None` if it does
///   not exist yet.
/// * `name` - The HBA name.
/// * `input` - The `properties` module parameter.
pub fn process_hba_properties(
    client: &dyn HmcClient,
    partition: &Resource,
    hba: Option<&Resource>,
    name: &str,
    input: &Properties,
) -> Result<PropertyChanges> {
    let mut changes = PropertyChanges::new();
    changes.create.insert("name".to_string(), json!(name));
    changes.merge(process_properties(
        &HBA_PROPERTIES,
        input,
        hba.map(|h| &h.properties),
        &ARTIFICIAL_PROPERTIES,
    )?);

    let cpc_uri = partition.parent.as_deref().ok_or_else(|| {
        Error::unexpected(format!("Partition {} has no parent CPC", partition.uri))
    })?;
    if let Some((_, port)) = adapter_port_from_input(client, cpc_uri, input)? {
        if let Some(hba) = hba {
            if hba.str_prop("adapter-port-uri") != Some(port.uri.as_str()) {
                return Err(Error::parameter(
                    "Artificial properties 'adapter_name' and 'adapter_port' cannot be used \
                     to change the adapter port of an existing HBA",
                ));
            }
        }
        changes
            .create
            .insert("adapter-port-uri".to_string(), json!(port.uri));
    }
    Ok(changes)
}

fn ensure_present(
    client: &dyn HmcClient,
    params: &HbaParams,
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

    let existing = client.find_optional(ResourceClass::Hba, Some(&partition.uri), &params.name)?;
    let (changed, hba) = match existing {
        None => {
            if check_mode {
                (true, None)
            } else {
                let changes =
                    process_hba_properties(client, &partition, None, &params.name, &input)?;
                let hba = client.create(ResourceClass::Hba, Some(&partition.uri), &changes.create)?;
                let update = changes.update_after_create();
                if !update.is_empty() {
                    client.update(&hba.uri, &update)?;
                }
                (true, Some(client.get(&hba.uri)?))
            }
        }
        Some(mut hba) => {
            client.pull_properties(&mut hba)?;
            let changes =
                process_hba_properties(client, &partition, Some(&hba), &params.name, &input)?;
            if changes.update.is_empty() {
                (false, Some(hba))
            } else {
                if !check_mode {
                    if changes.requires_deactivation {
                        return Err(Error::unexpected(format!(
                            "HBA properties {:?} cannot be updated while the partition is active",
                            changes.update.keys().collect::<Vec<_>>()
                        )));
                    }
                    wait_for_transition_completion(client, &params.cpc_name, &mut partition)?;
                    debug!("Updating HBA '{}'", hba.name());
                    client.update(&hba.uri, &changes.update)?;
                    client.pull_properties(&mut hba)?;
                }
                (true, Some(hba))
            }
        }
    };

    let result = hba.map(|h| h.properties).unwrap_or_default();
    Ok(ModuleOutput::new(changed, result))
}

fn ensure_absent(
    client: &dyn HmcClient,
    params: &HbaParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let partition = find_partition(client, &cpc, &params.partition_name)?;
    let Some(hba) = client.find_optional(ResourceClass::Hba, Some(&partition.uri), &params.name)?
    else {
        return Ok(ModuleOutput::new(false, json!({})));
    };
    if !check_mode {
        client.delete(&hba.uri)?;
    }
    Ok(ModuleOutput::new(true, json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use zhmc_session::FakedHmc;

    fn props(value: Value) -> Properties {
        value.as_object().unwrap().clone()
    }

    struct Setup {
        hmc: FakedHmc,
        partition: String,
        port: String,
    }

    fn setup() -> Setup {
        let hmc = FakedHmc::new();
        let cpc = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
        let fcp = hmc
            .add(ResourceClass::Adapter, Some(&cpc), props(json!({"name": "FCP1"})))
            .unwrap();
        let port = hmc
            .add(ResourceClass::Port, Some(&fcp), props(json!({"name": "p0", "index": 0})))
            .unwrap();
        hmc.add(ResourceClass::Port, Some(&fcp), props(json!({"name": "p1", "index": 1})))
            .unwrap();
        let partition = hmc
            .add(ResourceClass::Partition, Some(&cpc), props(json!({"name": "part1"})))
            .unwrap();
        Setup { hmc, partition, port }
    }

    fn params(state: &str, properties: Value) -> Properties {
        props(json!({
            "cpc_name": "CPC1",
            "partition_name": "part1",
            "name": "hba1",
            "state": state,
            "properties": properties,
        }))
    }

    #[test]
    fn test_create_hba() {
        let s = setup();
        let input = json!({"adapter_name": "FCP1", "adapter_port": 0, "description": "boot"});
        let output = run(&s.hmc, &params("present", input.clone()), false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["adapter-port-uri"], json!(s.port));
        assert_eq!(output.result["description"], "boot");
        assert_eq!(output.result["parent"], json!(s.partition));

        // idempotent
        let output = run(&s.hmc, &params("present", input), false).unwrap();
        assert!(!output.changed);
    }

    #[test]
    fn test_unknown_adapter() {
        let s = setup();
        let err = run(
            &s.hmc,
            &params("present", json!({"adapter_name": "NOPE", "adapter_port": 0})),
            false,
        )
        .unwrap_err();
        assert_eq!(
            err.failure_message(),
            "ParameterError: Artificial property 'adapter_name' does not specify the name of \
             an existing adapter: 'NOPE'"
        );
        assert!(s.hmc.mutations().is_empty());
    }

    #[test]
    fn test_update_description() {
        let s = setup();
        let input = json!({"adapter_name": "FCP1", "adapter_port": 0});
        run(&s.hmc, &params("present", input), false).unwrap();

        let output = run(&s.hmc, &params("present", json!({"description": "new"})), true).unwrap();
        assert!(output.changed);
        let before = s.hmc.mutations().len();
        let output = run(&s.hmc, &params("present", json!({"description": "new"})), false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["description"], "new");
        assert_eq!(s.hmc.mutations().len(), before + 1);
    }

    #[test]
    fn test_adapter_port_cannot_change() {
        let s = setup();
        run(&s.hmc, &params("present", json!({"adapter_name": "FCP1", "adapter_port": 0})), false)
            .unwrap();
        let err = run(
            &s.hmc,
            &params("present", json!({"adapter_name": "FCP1", "adapter_port": 1})),
            false,
        )
        .unwrap_err();
        assert_eq!(err.class_name(), "ParameterError");
        assert!(err.to_string().contains("cannot be used to change the adapter port"));
    }

    #[test]
    fn test_adapter_name_without_port() {
        let s = setup();
        let err = run(&s.hmc, &params("present", json!({"adapter_name": "FCP1"})), false)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Artificial properties 'adapter_name' and 'adapter_port' must either both be \
             specified or both be omitted."
        );
    }

    #[test]
    fn test_missing_partition_in_check_mode() {
        let s = setup();
        let mut p = params("present", json!({}));
        p.insert("partition_name".to_string(), json!("nopart"));
        let output = run(&s.hmc, &p, true).unwrap();
        assert!(output.changed);
        assert!(s.hmc.mutations().is_empty());
        assert!(run(&s.hmc, &p, false).unwrap_err().is_not_found());
    }

    #[test]
    fn test_absent() {
        let s = setup();
        let output = run(&s.hmc, &params("absent", json!({})), false).unwrap();
        assert!(!output.changed);
        run(&s.hmc, &params("present", json!({"adapter_name": "FCP1", "adapter_port": 0})), false)
            .unwrap();
        let output = run(&s.hmc, &params("absent", json!({})), false).unwrap();
        assert!(output.changed);
        assert!(s
            .hmc
            .find_optional(ResourceClass::Hba, Some(&s.partition), "hba1")
            .unwrap()
            .is_none());
    }
}
