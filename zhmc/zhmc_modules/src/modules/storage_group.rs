//! The `zhmc_storage_group` module: storage groups of the HMC.
//!
//! Storage groups are console-level objects that are associated with one
//! CPC. The `cpc_name` module parameter must name that CPC.

use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};

use zhmc_core::property::process_properties;
use zhmc_core::tables::STORAGE_GROUP_PROPERTIES;
use zhmc_core::{
    Error, Filter, HmcClient, Operation, Properties, PropertyChanges, Resource, ResourceClass,
    Result,
};

use crate::lookup::{find_console_object, find_console_object_optional, find_cpc, properties_of};
use crate::module::ModuleOutput;
use crate::params::parse_params;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StorageGroupState {
    Absent,
    Present,
    Facts,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StorageGroupParams {
    cpc_name: String,
    name: String,
    state: StorageGroupState,
    #[serde(default)]
    properties: Option<Properties>,
    #[serde(default)]
    expand: bool,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: StorageGroupParams = parse_params(params)?;
    match params.state {
        StorageGroupState::Absent => ensure_absent(client, &params, check_mode),
        StorageGroupState::Present => ensure_present(client, &params, check_mode),
        StorageGroupState::Facts => facts(client, &params),
    }
}

/// The partitions a storage group is attached to.
pub fn attached_partitions(client: &dyn HmcClient, storage_group: &Resource) -> Result<Vec<Resource>> {
    let Some(cpc_uri) = storage_group.str_prop("cpc-uri") else {
        return Ok(Vec::new());
    };
    let partitions = client.list(ResourceClass::Partition, Some(cpc_uri), &Filter::all())?;
    let mut attached = Vec::new();
    for partition in partitions {
        let partition = client.get(&partition.uri)?;
        if partition
            .str_list_prop("storage-group-uris")
            .contains(&storage_group.uri)
        {
            attached.push(partition);
        }
    }
    Ok(attached)
}

/// Check that a storage group is associated with the CPC.
pub(crate) fn check_cpc(
    client: &dyn HmcClient,
    storage_group: &Resource,
    cpc: &Resource,
) -> Result<()> {
    let sg_cpc_uri = storage_group.str_prop("cpc-uri").unwrap_or("");
    if sg_cpc_uri != cpc.uri {
        let sg_cpc_name = match client.get(sg_cpc_uri) {
            Ok(sg_cpc) => sg_cpc.name().to_string(),
            Err(_) => sg_cpc_uri.to_string(),
        };
        return Err(Error::parameter(format!(
            "Storage group '{}' is not associated with the specified CPC '{}', but with CPC \
             '{}'.",
            storage_group.name(),
            cpc.name(),
            sg_cpc_name
        )));
    }
    Ok(())
}

/// Compute the changes for a storage group.
pub fn process_storage_group_properties(
    client: &dyn HmcClient,
    cpc: &Resource,
    storage_group: Option<&Resource>,
    name: &str,
    input: &Properties,
) -> Result<PropertyChanges> {
    let mut changes = PropertyChanges::new();
    match storage_group {
        None => {
            changes.create.insert("name".to_string(), json!(name));
            changes.create.insert("cpc-uri".to_string(), json!(cpc.uri));
        }
        Some(sg) => check_cpc(client, sg, cpc)?,
    }
    changes.merge(process_properties(
        &STORAGE_GROUP_PROPERTIES,
        input,
        storage_group.map(|sg| &sg.properties),
        &[],
    )?);
    if changes.requires_deactivation {
        return Err(Error::unexpected(
            "Storage group properties cannot require deactivation",
        ));
    }
    Ok(changes)
}

/// Storage group properties with `attached-partition-names`, and when
/// expanded, the candidate adapter ports (FCP only), storage volumes,
/// virtual storage resources (FCP only) and attached partitions.
pub fn storage_group_properties(
    client: &dyn HmcClient,
    storage_group: &Resource,
    expand: bool,
) -> Result<Properties> {
    let mut props = storage_group.properties.clone();
    let partitions = attached_partitions(client, storage_group)?;
    props.insert(
        "attached-partition-names".to_string(),
        partitions.iter().map(|p| json!(p.name())).collect(),
    );
    if !expand {
        return Ok(props);
    }

    let is_fcp = storage_group.str_prop("type") == Some("fcp");
    let mut ports = Vec::new();
    if is_fcp {
        for port_uri in storage_group.str_list_prop("candidate-adapter-port-uris") {
            let port = client.get(&port_uri)?;
            let adapter_uri = port.parent.clone().ok_or_else(|| {
                Error::unexpected(format!("Port {} has no parent adapter", port.uri))
            })?;
            let adapter = client.get(&adapter_uri)?;
            let mut port_props = port.properties;
            port_props.insert("parent-adapter".to_string(), Value::Object(adapter.properties));
            ports.push(Value::Object(port_props));
        }
    }
    props.insert("candidate-adapter-ports".to_string(), Value::Array(ports));

    let volumes = properties_of(client, &storage_group.str_list_prop("storage-volume-uris"))?;
    props.insert("storage-volumes".to_string(), Value::Array(volumes));

    let resources = if is_fcp {
        properties_of(
            client,
            &storage_group.str_list_prop("virtual-storage-resource-uris"),
        )?
    } else {
        Vec::new()
    };
    props.insert(
        "virtual-storage-resources".to_string(),
        Value::Array(resources),
    );

    props.insert(
        "attached-partitions".to_string(),
        partitions
            .into_iter()
            .map(|p| Value::Object(p.properties))
            .collect(),
    );
    Ok(props)
}

fn ensure_present(
    client: &dyn HmcClient,
    params: &StorageGroupParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let input = params.properties.clone().unwrap_or_default();
    let existing =
        find_console_object_optional(client, ResourceClass::StorageGroup, &params.name)?;

    let (changed, storage_group) = match existing {
        None => {
            if check_mode {
                (true, None)
            } else {
                let changes = process_storage_group_properties(
                    client,
                    &cpc,
                    None,
                    &params.name,
                    &input,
                )?;
                let sg = client.create(
                    ResourceClass::StorageGroup,
                    Some(zhmc_core::CONSOLE_URI),
                    &changes.create,
                )?;
                let update = changes.update_after_create();
                if !update.is_empty() {
                    client.update(&sg.uri, &update)?;
                }
                (true, Some(client.get(&sg.uri)?))
            }
        }
        Some(mut sg) => {
            client.pull_properties(&mut sg)?;
            let changes =
                process_storage_group_properties(client, &cpc, Some(&sg), &params.name, &input)?;
            if !changes.create.is_empty() {
                return Err(Error::unexpected(format!(
                    "Unexpected create properties for existing storage group: {:?}",
                    changes.create.keys().collect::<Vec<_>>()
                )));
            }
            if changes.update.is_empty() {
                (false, Some(sg))
            } else {
                if !check_mode {
                    debug!("Updating storage group '{}'", sg.name());
                    client.update(&sg.uri, &changes.update)?;
                    client.pull_properties(&mut sg)?;
                }
                (true, Some(sg))
            }
        }
    };

    let result = match storage_group {
        Some(sg) if !check_mode => storage_group_properties(client, &sg, params.expand)?,
        _ => Properties::new(),
    };
    Ok(ModuleOutput::new(changed, result))
}

fn ensure_absent(
    client: &dyn HmcClient,
    params: &StorageGroupParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let Some(mut sg) =
        find_console_object_optional(client, ResourceClass::StorageGroup, &params.name)?
    else {
        return Ok(ModuleOutput::new(false, json!({})));
    };
    client.pull_properties(&mut sg)?;
    check_cpc(client, &sg, &cpc)?;
    if !check_mode {
        for partition in attached_partitions(client, &sg)? {
            debug!(
                "Detaching storage group '{}' from partition '{}'",
                sg.name(),
                partition.name()
            );
            client.invoke(
                &partition.uri,
                &Operation::DetachStorageGroup {
                    storage_group_uri: sg.uri.clone(),
                },
            )?;
        }
        client.delete(&sg.uri)?;
    }
    Ok(ModuleOutput::new(true, json!({})))
}

fn facts(client: &dyn HmcClient, params: &StorageGroupParams) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let sg = find_console_object(client, ResourceClass::StorageGroup, &params.name)?;
    let sg = client.get(&sg.uri)?;
    check_cpc(client, &sg, &cpc)?;
    Ok(ModuleOutput::new(
        false,
        storage_group_properties(client, &sg, params.expand)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zhmc_session::FakedHmc;

    fn props(value: Value) -> Properties {
        value.as_object().unwrap().clone()
    }

    fn setup() -> (FakedHmc, String, String) {
        let hmc = FakedHmc::new();
        let cpc1 = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
        let cpc2 = hmc.add_cpc(props(json!({"name": "CPC2"}))).unwrap();
        (hmc, cpc1, cpc2)
    }

    fn params(state: &str, properties: Value) -> Properties {
        props(json!({
            "cpc_name": "CPC1",
            "name": "sg1",
            "state": state,
            "properties": properties,
        }))
    }

    #[test]
    fn test_create_and_update() {
        let (hmc, cpc1, _) = setup();
        let input = json!({"type": "fcp", "description": "d", "max_partitions": "4"});
        let output = run(&hmc, &params("present", input.clone()), true).unwrap();
        assert!(output.changed);
        assert_eq!(output.result, json!({}));
        assert!(hmc.mutations().is_empty());

        let output = run(&hmc, &params("present", input.clone()), false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["cpc-uri"], json!(cpc1));
        assert_eq!(output.result["max-partitions"], 4);
        assert_eq!(output.result["attached-partition-names"], json!([]));

        let output = run(&hmc, &params("present", input), false).unwrap();
        assert!(!output.changed);

        let output = run(&hmc, &params("present", json!({"description": "new"})), false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["description"], "new");
    }

    #[test]
    fn test_type_cannot_change() {
        let (hmc, _, _) = setup();
        run(&hmc, &params("present", json!({"type": "fcp"})), false).unwrap();
        let err = run(&hmc, &params("present", json!({"type": "fc"})), false).unwrap_err();
        assert_eq!(err.class_name(), "ParameterError");
    }

    #[test]
    fn test_wrong_cpc() {
        let (hmc, _, cpc2) = setup();
        hmc.add_console_object(
            ResourceClass::StorageGroup,
            props(json!({"name": "sg1", "cpc-uri": cpc2, "type": "fcp"})),
        )
        .unwrap();
        let err = run(&hmc, &params("facts", json!({})), false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Storage group 'sg1' is not associated with the specified CPC 'CPC1', but with CPC \
             'CPC2'."
        );
    }

    #[test]
    fn test_absent_detaches_partitions() {
        let (hmc, cpc1, _) = setup();
        let sg = hmc
            .add_console_object(
                ResourceClass::StorageGroup,
                props(json!({"name": "sg1", "cpc-uri": cpc1, "type": "fcp"})),
            )
            .unwrap();
        let part = hmc
            .add(
                ResourceClass::Partition,
                Some(&cpc1),
                props(json!({"name": "p1", "storage-group-uris": [sg]})),
            )
            .unwrap();

        let output = run(&hmc, &params("facts", json!({})), false).unwrap();
        assert_eq!(output.result["attached-partition-names"], json!(["p1"]));

        let output = run(&hmc, &params("absent", json!({})), false).unwrap();
        assert!(output.changed);
        assert!(hmc.properties(&sg).is_none());
        assert_eq!(
            hmc.properties(&part).unwrap()["storage-group-uris"],
            json!([])
        );

        let output = run(&hmc, &params("absent", json!({})), false).unwrap();
        assert!(!output.changed);
    }

    #[test]
    fn test_expand() {
        let (hmc, cpc1, _) = setup();
        let fcp = hmc
            .add(ResourceClass::Adapter, Some(&cpc1), props(json!({"name": "FCP1"})))
            .unwrap();
        let port = hmc
            .add(ResourceClass::Port, Some(&fcp), props(json!({"name": "p0", "index": 0})))
            .unwrap();
        let sg = hmc
            .add_console_object(
                ResourceClass::StorageGroup,
                props(json!({
                    "name": "sg1",
                    "cpc-uri": cpc1,
                    "type": "fcp",
                    "candidate-adapter-port-uris": [port],
                })),
            )
            .unwrap();
        hmc.add(ResourceClass::StorageVolume, Some(&sg), props(json!({"name": "v1"})))
            .unwrap();

        let mut p = params("facts", json!({}));
        p.insert("expand".to_string(), json!(true));
        let output = run(&hmc, &p, false).unwrap();
        let result = &output.result;
        assert_eq!(result["candidate-adapter-ports"][0]["parent-adapter"]["name"], "FCP1");
        assert_eq!(result["storage-volumes"][0]["name"], "v1");
        assert_eq!(result["virtual-storage-resources"], json!([]));
        assert_eq!(result["attached-partitions"], json!([]));
    }
}
