//! The `zhmc_storage_volume` module: storage volumes of storage groups.

use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};

use zhmc_core::property::process_properties;
use zhmc_core::tables::STORAGE_VOLUME_PROPERTIES;
use zhmc_core::{Error, HmcClient, Properties, PropertyChanges, Resource, ResourceClass, Result};

use crate::lookup::{find_console_object, find_cpc};
use crate::module::ModuleOutput;
use crate::modules::storage_group::check_cpc;
use crate::params::parse_params;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StorageVolumeState {
    Absent,
    Present,
    Facts,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StorageVolumeParams {
    cpc_name: String,
    storage_group_name: String,
    name: String,
    state: StorageVolumeState,
    #[serde(default)]
    properties: Option<Properties>,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: StorageVolumeParams = parse_params(params)?;
    let storage_group = find_storage_group(client, &params)?;
    match params.state {
        StorageVolumeState::Absent => ensure_absent(client, &params, &storage_group, check_mode),
        StorageVolumeState::Present => {
            ensure_present(client, &params, &storage_group, check_mode)
        }
        StorageVolumeState::Facts => facts(client, &params, &storage_group),
    }
}

/// Find the storage group and check that it belongs to the CPC.
fn find_storage_group(client: &dyn HmcClient, params: &StorageVolumeParams) -> Result<Resource> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let storage_group = find_console_object(
        client,
        ResourceClass::StorageGroup,
        &params.storage_group_name,
    )?;
    let storage_group = client.get(&storage_group.uri)?;
    check_cpc(client, &storage_group, &cpc)?;
    Ok(storage_group)
}

/// Compute the changes for a storage volume.
pub fn process_storage_volume_properties(
    storage_volume: Option<&Resource>,
    name: &str,
    input: &Properties,
) -> Result<PropertyChanges> {
    let mut changes = PropertyChanges::new();
    if storage_volume.is_none() {
        changes.create.insert("name".to_string(), json!(name));
    }
    changes.merge(process_properties(
        &STORAGE_VOLUME_PROPERTIES,
        input,
        storage_volume.map(|sv| &sv.properties),
        &[],
    )?);
    Ok(changes)
}

/// Storage volume properties with the `type` of its storage group (`fcp`,
/// or `fc` for ECKD volumes).
fn storage_volume_properties(storage_volume: &Resource, storage_group: &Resource) -> Properties {
    let mut props = storage_volume.properties.clone();
    props.insert(
        "type".to_string(),
        storage_group.prop("type").cloned().unwrap_or(Value::Null),
    );
    props
}

fn ensure_present(
    client: &dyn HmcClient,
    params: &StorageVolumeParams,
    storage_group: &Resource,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let input = params.properties.clone().unwrap_or_default();
    let existing = client.find_optional(
        ResourceClass::StorageVolume,
        Some(&storage_group.uri),
        &params.name,
    )?;

    let (changed, storage_volume) = match existing {
        None => {
            if check_mode {
                (true, None)
            } else {
                let changes = process_storage_volume_properties(None, &params.name, &input)?;
                debug!(
                    "Creating storage volume '{}' in storage group '{}'",
                    params.name,
                    storage_group.name()
                );
                let sv = client.create(
                    ResourceClass::StorageVolume,
                    Some(&storage_group.uri),
                    &changes.create,
                )?;
                let update = changes.update_after_create();
                if !update.is_empty() {
                    client.update(&sv.uri, &update)?;
                }
                (true, Some(client.get(&sv.uri)?))
            }
        }
        Some(mut sv) => {
            client.pull_properties(&mut sv)?;
            let changes = process_storage_volume_properties(Some(&sv), &params.name, &input)?;
            if !changes.create.is_empty() {
                return Err(Error::unexpected(format!(
                    "Unexpected create properties for existing storage volume: {:?}",
                    changes.create.keys().collect::<Vec<_>>()
                )));
            }
            if changes.update.is_empty() {
                (false, Some(sv))
            } else {
                if check_mode {
                    sv.update_local(&changes.update);
                } else {
                    debug!("Updating storage volume '{}'", sv.name());
                    client.update(&sv.uri, &changes.update)?;
                    client.pull_properties(&mut sv)?;
                }
                (true, Some(sv))
            }
        }
    };

    let result = match storage_volume {
        Some(sv) => storage_volume_properties(&sv, storage_group),
        None => Properties::new(),
    };
    Ok(ModuleOutput::new(changed, result))
}

fn ensure_absent(
    client: &dyn HmcClient,
    params: &StorageVolumeParams,
    storage_group: &Resource,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let Some(sv) = client.find_optional(
        ResourceClass::StorageVolume,
        Some(&storage_group.uri),
        &params.name,
    )?
    else {
        return Ok(ModuleOutput::new(false, json!({})));
    };
    if !check_mode {
        debug!("Deleting storage volume '{}'", sv.name());
        client.delete(&sv.uri)?;
    }
    Ok(ModuleOutput::new(true, json!({})))
}

fn facts(
    client: &dyn HmcClient,
    params: &StorageVolumeParams,
    storage_group: &Resource,
) -> Result<ModuleOutput> {
    let sv = client.find(
        ResourceClass::StorageVolume,
        Some(&storage_group.uri),
        &params.name,
    )?;
    let sv = client.get(&sv.uri)?;
    Ok(ModuleOutput::new(
        false,
        storage_volume_properties(&sv, storage_group),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zhmc_session::FakedHmc;

    fn props(value: Value) -> Properties {
        value.as_object().unwrap().clone()
    }

    fn setup() -> (FakedHmc, String) {
        let hmc = FakedHmc::new();
        let cpc1 = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
        let cpc2 = hmc.add_cpc(props(json!({"name": "CPC2"}))).unwrap();
        let sg = hmc
            .add_console_object(
                ResourceClass::StorageGroup,
                props(json!({"name": "sg1", "cpc-uri": cpc1, "type": "fcp"})),
            )
            .unwrap();
        hmc.add_console_object(
            ResourceClass::StorageGroup,
            props(json!({"name": "sg2", "cpc-uri": cpc2, "type": "fc"})),
        )
        .unwrap();
        (hmc, sg)
    }

    fn params(storage_group: &str, state: &str, properties: Value) -> Properties {
        props(json!({
            "cpc_name": "CPC1",
            "storage_group_name": storage_group,
            "name": "vol1",
            "state": state,
            "properties": properties,
        }))
    }

    #[test]
    fn test_create_update_delete() {
        let (hmc, sg) = setup();
        let input = json!({"size": "16", "usage": "boot", "description": "root disk"});

        let output = run(&hmc, &params("sg1", "present", input.clone()), true).unwrap();
        assert!(output.changed);
        assert_eq!(output.result, json!({}));
        assert!(hmc.mutations().is_empty());

        let output = run(&hmc, &params("sg1", "present", input.clone()), false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["size"], 16.0);
        assert_eq!(output.result["usage"], "boot");
        assert_eq!(output.result["type"], "fcp");
        let uri = output.result["element-uri"].as_str().unwrap().to_string();
        assert!(uri.starts_with(&format!("{}/storage-volumes/", sg)));
        assert_eq!(
            hmc.properties(&sg).unwrap()["storage-volume-uris"],
            json!([uri])
        );

        let output = run(&hmc, &params("sg1", "present", input), false).unwrap();
        assert!(!output.changed);

        let output = run(&hmc, &params("sg1", "present", json!({"size": 32})), true).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["size"], 32.0);
        assert_eq!(hmc.properties(&uri).unwrap()["size"], 16.0);

        let output = run(&hmc, &params("sg1", "absent", json!({})), false).unwrap();
        assert!(output.changed);
        assert_eq!(hmc.properties(&sg).unwrap()["storage-volume-uris"], json!([]));
        let output = run(&hmc, &params("sg1", "absent", json!({})), false).unwrap();
        assert!(!output.changed);
    }

    #[test]
    fn test_facts() {
        let (hmc, sg) = setup();
        hmc.add(
            ResourceClass::StorageVolume,
            Some(&sg),
            props(json!({"name": "vol1", "size": 8.0})),
        )
        .unwrap();
        let output = run(&hmc, &params("sg1", "facts", json!({})), false).unwrap();
        assert!(!output.changed);
        assert_eq!(output.result["size"], 8.0);
        assert_eq!(output.result["fulfillment-state"], "complete");

        let mut input = params("sg1", "facts", json!({}));
        input.insert("name".to_string(), json!("vol9"));
        assert!(run(&hmc, &input, false).unwrap_err().is_not_found());
    }

    #[test]
    fn test_storage_group_of_other_cpc() {
        let (hmc, _) = setup();
        let err = run(&hmc, &params("sg2", "present", json!({"size": 1})), false).unwrap_err();
        assert_eq!(
            err.failure_message(),
            "ParameterError: Storage group 'sg2' is not associated with the specified CPC \
             'CPC1', but with CPC 'CPC2'."
        );
    }

    #[test]
    fn test_read_only_property() {
        let (hmc, _) = setup();
        let err = run(&hmc, &params("sg1", "present", json!({"uuid": "abc"})), false)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Property 'uuid' is not allowed in the 'properties' module parameter."
        );
    }
}
