//! The partition module result.
//!
//! Besides the partition properties, the result carries the child elements
//! of the partition and the names behind some of its URI properties.

use serde_json::{json, Value};

use zhmc_core::{Error, HmcClient, Properties, Resource, Result};

use crate::lookup::{properties_of, select_properties};
use crate::modules::storage_group::storage_group_properties;

fn parent_of(resource: &Resource) -> Result<&str> {
    resource.parent.as_deref().ok_or_else(|| {
        Error::unexpected(format!("{} {} has no parent", resource.class, resource.uri))
    })
}

/// NIC properties with `adapter-name`, `adapter-port` and `adapter-id`.
///
/// OSA and HiperSockets NICs are backed through a virtual switch, RoCE and
/// CNA NICs directly by an adapter port.
pub fn nic_properties(client: &dyn HmcClient, nic: Resource) -> Result<Properties> {
    let (adapter_uri, port) = if let Some(vswitch_uri) = nic.str_prop("virtual-switch-uri") {
        let vswitch = client.get(vswitch_uri)?;
        let adapter_uri = vswitch
            .str_prop("backing-adapter-uri")
            .map(str::to_string)
            .ok_or_else(|| {
                Error::unexpected(format!("Virtual switch {} has no backing adapter", vswitch.uri))
            })?;
        (adapter_uri, vswitch.prop("port").cloned().unwrap_or(Value::Null))
    } else if let Some(port_uri) = nic.str_prop("network-adapter-port-uri") {
        let port = client.get(port_uri)?;
        (
            parent_of(&port)?.to_string(),
            port.prop("index").cloned().unwrap_or(Value::Null),
        )
    } else {
        return Ok(nic.properties);
    };
    let adapter = client.get(&adapter_uri)?;
    let mut props = nic.properties;
    props.insert("adapter-name".to_string(), json!(adapter.name()));
    props.insert("adapter-port".to_string(), port);
    props.insert(
        "adapter-id".to_string(),
        adapter.prop("adapter-id").cloned().unwrap_or(Value::Null),
    );
    Ok(props)
}

/// Build the module result for a partition.
///
/// # Arguments
///
/// * `client` - The HMC client.
/// * `partition` - The partition, with the properties to return.
/// * `select` - Properties to return (underscore names); `None` for all.
/// * `expand_storage_groups` - Add the attached storage groups.
/// * `expand_crypto_adapters` - Add the crypto adapters to the crypto
///   configuration.
pub fn partition_result(
    client: &dyn HmcClient,
    partition: &Resource,
    select: Option<&[String]>,
    expand_storage_groups: bool,
    expand_crypto_adapters: bool,
) -> Result<Properties> {
    let mut result = select_properties(&partition.properties, select);

    let hbas = properties_of(client, &partition.str_list_prop("hba-uris"))?;
    result.insert("hbas".to_string(), Value::Array(hbas));

    let mut nics = Vec::new();
    for nic_uri in partition.str_list_prop("nic-uris") {
        let nic = client.get(&nic_uri)?;
        nics.push(Value::Object(nic_properties(client, nic)?));
    }
    result.insert("nics".to_string(), Value::Array(nics));

    let vfs = properties_of(client, &partition.str_list_prop("virtual-function-uris"))?;
    result.insert("virtual-functions".to_string(), Value::Array(vfs));

    let (sg_name, sv_name) = match partition.str_prop("boot-storage-volume") {
        Some(sv_uri) if !sv_uri.is_empty() => {
            let sg_uri = sv_uri.split("/storage-volumes/").next().unwrap_or(sv_uri);
            let storage_group = client.get(sg_uri)?;
            let volume = client.get(sv_uri)?;
            (json!(storage_group.name()), json!(volume.name()))
        }
        _ => (Value::Null, Value::Null),
    };
    result.insert("boot-storage-group-name".to_string(), sg_name);
    result.insert("boot-storage-volume-name".to_string(), sv_name);

    if expand_storage_groups {
        let groups = partition
            .str_list_prop("storage-group-uris")
            .iter()
            .map(|uri| {
                let storage_group = client.get(uri)?;
                storage_group_properties(client, &storage_group, true).map(Value::Object)
            })
            .collect::<Result<Vec<_>>>()?;
        result.insert("storage-groups".to_string(), Value::Array(groups));
    }

    if expand_crypto_adapters {
        if let Some(Value::Object(config)) = result.get("crypto-configuration") {
            let mut config = config.clone();
            let adapter_uris: Vec<String> = match config.get("crypto-adapter-uris") {
                Some(Value::Array(uris)) => uris
                    .iter()
                    .filter_map(|u| u.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            let adapters = properties_of(client, &adapter_uris)?;
            config.insert("crypto-adapters".to_string(), Value::Array(adapters));
            result.insert("crypto-configuration".to_string(), Value::Object(config));
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zhmc_core::ResourceClass;
    use zhmc_session::FakedHmc;

    fn props(value: Value) -> Properties {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_nic_adapter_properties() {
        let hmc = FakedHmc::new();
        let cpc = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
        let osa = hmc
            .add(
                ResourceClass::Adapter,
                Some(&cpc),
                props(json!({"name": "OSA1", "adapter-id": "120", "adapter-family": "osa"})),
            )
            .unwrap();
        let vswitch = hmc
            .add(
                ResourceClass::VirtualSwitch,
                Some(&cpc),
                props(json!({"name": "VS1", "backing-adapter-uri": osa, "port": 1})),
            )
            .unwrap();
        let roce = hmc
            .add(
                ResourceClass::Adapter,
                Some(&cpc),
                props(json!({"name": "ROCE1", "adapter-id": "140", "adapter-family": "roce"})),
            )
            .unwrap();
        let port = hmc
            .add(ResourceClass::Port, Some(&roce), props(json!({"name": "p0", "index": 0})))
            .unwrap();
        let part = hmc
            .add(ResourceClass::Partition, Some(&cpc), props(json!({"name": "p1"})))
            .unwrap();
        hmc.add(
            ResourceClass::Nic,
            Some(&part),
            props(json!({"name": "nic1", "virtual-switch-uri": vswitch})),
        )
        .unwrap();
        hmc.add(
            ResourceClass::Nic,
            Some(&part),
            props(json!({"name": "nic2", "network-adapter-port-uri": port})),
        )
        .unwrap();

        let partition = hmc.get(&part).unwrap();
        let result = partition_result(&hmc, &partition, None, false, false).unwrap();
        let nics = result["nics"].as_array().unwrap();
        assert_eq!(nics[0]["adapter-name"], "OSA1");
        assert_eq!(nics[0]["adapter-port"], 1);
        assert_eq!(nics[0]["adapter-id"], "120");
        assert_eq!(nics[1]["adapter-name"], "ROCE1");
        assert_eq!(nics[1]["adapter-port"], 0);
        assert_eq!(result["hbas"], json!([]));
        assert_eq!(result["boot-storage-volume-name"], Value::Null);
    }

    #[test]
    fn test_expanded_storage_groups_and_boot_volume() {
        let hmc = FakedHmc::new();
        let cpc = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
        let fcp = hmc
            .add(ResourceClass::Adapter, Some(&cpc), props(json!({"name": "FCP1"})))
            .unwrap();
        let port = hmc
            .add(ResourceClass::Port, Some(&fcp), props(json!({"name": "p0", "index": 0})))
            .unwrap();
        let sg = hmc
            .add_console_object(
                ResourceClass::StorageGroup,
                props(json!({
                    "name": "SG1",
                    "type": "fcp",
                    "cpc-uri": cpc,
                    "candidate-adapter-port-uris": [port],
                })),
            )
            .unwrap();
        let sv = hmc
            .add(ResourceClass::StorageVolume, Some(&sg), props(json!({"name": "boot"})))
            .unwrap();
        let part = hmc
            .add(
                ResourceClass::Partition,
                Some(&cpc),
                props(json!({
                    "name": "p1",
                    "storage-group-uris": [sg],
                    "boot-storage-volume": sv,
                })),
            )
            .unwrap();

        let partition = hmc.get(&part).unwrap();
        let select = vec!["status".to_string()];
        let result = partition_result(&hmc, &partition, Some(&select), true, false).unwrap();
        assert_eq!(result["boot-storage-group-name"], "SG1");
        assert_eq!(result["boot-storage-volume-name"], "boot");
        assert!(result.get("description").is_none());
        let groups = result["storage-groups"].as_array().unwrap();
        assert_eq!(groups[0]["name"], "SG1");
        assert_eq!(groups[0]["candidate-adapter-ports"][0]["parent-adapter"]["name"], "FCP1");
        assert_eq!(groups[0]["storage-volumes"][0]["name"], "boot");
        assert_eq!(groups[0]["attached-partition-names"], json!(["p1"]));
    }
}
