//! Turning the `properties` parameter into partition changes.

use log::debug;
use serde_json::{json, Value};
use uuid::Uuid;

use zhmc_core::property::{process_properties, PropertySpec, Requiredness};
use zhmc_core::tables::PARTITION_PROPERTIES;
use zhmc_core::utils::repr;
use zhmc_core::{
    CryptoDomainConfig, Error, Filter, HmcClient, Operation, Properties, PropertyChanges,
    Resource, ResourceClass, Result, CONSOLE_URI,
};

use crate::lookup::not_found_as_parameter_error;

/// Artificial properties: not partition properties on the HMC, but resolved
/// into partition properties or operations by this module.
pub const ARTIFICIAL_PROPERTIES: [&str; 5] = [
    "boot_storage_hba_name",
    "boot_storage_group_name",
    "boot_storage_volume_name",
    "boot_network_nic_name",
    "crypto_configuration",
];

/// Changes of the crypto configuration of a partition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CryptoChanges {
    pub remove_adapters: Vec<String>,
    pub remove_domain_indexes: Vec<i64>,
    pub add_adapters: Vec<String>,
    pub add_domain_configs: Vec<CryptoDomainConfig>,
    pub change_domain_configs: Vec<CryptoDomainConfig>,
}

/// Everything the `properties` parameter asks for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartitionChanges {
    /// Property changes; `create` always starts with the partition name.
    pub properties: PropertyChanges,

    /// Crypto configuration changes, if `crypto_configuration` was given.
    pub crypto: Option<CryptoChanges>,
}

/// Whether the CPC has the `dpm-storage-management` feature enabled.
pub fn storage_mgmt_enabled(cpc: &Resource) -> bool {
    match cpc.prop("available-features-list") {
        Some(Value::Array(features)) => features
            .iter()
            .find(|f| f.get("name").and_then(Value::as_str) == Some("dpm-storage-management"))
            .and_then(|f| f.get("state"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
        _ => false,
    }
}

fn spec_of(name: &str) -> Result<&'static PropertySpec> {
    PARTITION_PROPERTIES
        .get(name)
        .ok_or_else(|| Error::unexpected(format!("Property '{}' is not in the table", name)))
}

/// The name an artificial property specifies, after its type cast.
fn artificial_name(spec: &PropertySpec, value: &Value) -> Result<String> {
    let value = match spec.type_cast {
        Some(cast) => cast(value, spec.name)?,
        None => value.clone(),
    };
    Ok(match value {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

fn existing<'a>(partition: Option<&'a Resource>, name: &str) -> Result<&'a Resource> {
    partition.ok_or_else(|| {
        Error::parameter(format!(
            "Artificial property '{}' can only be specified when the partition previously \
             exists.",
            name
        ))
    })
}

/// Set a boot device URI property, unless it already has that value.
fn set_boot_target(
    changes: &mut PropertyChanges,
    spec: &PropertySpec,
    partition: &Resource,
    hmc_name: &str,
    uri: &str,
) -> Result<()> {
    if partition.str_prop(hmc_name) != Some(uri) {
        if !spec.update_while_active {
            return Err(Error::unexpected(format!(
                "Artificial property '{}' must be updatable while the partition is active",
                spec.name
            )));
        }
        changes.update.insert(hmc_name.to_string(), json!(uri));
    }
    Ok(())
}

/// Process the `properties` module parameter of a partition.
///
/// # Arguments
///
/// * `client` - The HMC client.
/// * `cpc` - The CPC of the partition.
/// * `partition` - The partition with its current properties, or `None` if
///   it does not exist.
/// * `name` - The partition name.
/// * `input` - The `properties` module parameter.
///
/// # Returns
///
/// The properties for creation (including the name) and update, whether
/// the update requires the partition to be stopped, and the crypto changes.
pub fn process_partition_properties(
    client: &dyn HmcClient,
    cpc: &Resource,
    partition: Option<&Resource>,
    name: &str,
    input: &Properties,
) -> Result<PartitionChanges> {
    let mut input = input.clone();
    // An empty gateway means "no gateway".
    if input.get("ssc_ipv4_gateway") == Some(&json!("")) {
        input.insert("ssc_ipv4_gateway".to_string(), Value::Null);
    }

    let mut changes = PartitionChanges::default();
    changes
        .properties
        .create
        .insert("name".to_string(), json!(name));
    changes.properties.merge(process_properties(
        &PARTITION_PROPERTIES,
        &input,
        partition.map(|p| &p.properties),
        &ARTIFICIAL_PROPERTIES,
    )?);

    for (prop_name, value) in &input {
        match prop_name.as_str() {
            "boot_storage_hba_name" => {
                let spec = spec_of(prop_name)?;
                let part = existing(partition, prop_name)?;
                if storage_mgmt_enabled(cpc) {
                    return Err(Error::parameter(format!(
                        "Artificial property '{}' can only be specified when the \
                         'dpm-storage-management' feature is disabled.",
                        prop_name
                    )));
                }
                let hba_name = artificial_name(spec, value)?;
                let hba = not_found_as_parameter_error(
                    client.find(ResourceClass::Hba, Some(&part.uri), &hba_name),
                    || {
                        format!(
                            "Artificial property '{}' does not name an existing HBA: '{}'",
                            prop_name, hba_name
                        )
                    },
                )?;
                set_boot_target(
                    &mut changes.properties,
                    spec,
                    part,
                    "boot-storage-device",
                    &hba.uri,
                )?;
            }
            "boot_storage_group_name" => {
                if !input.contains_key("boot_storage_volume_name") {
                    return Err(Error::parameter(format!(
                        "Artificial property '{}' can only be specified when \
                         'boot_storage_volume_name' is also specified.",
                        prop_name
                    )));
                }
                if input.contains_key("boot_storage_volume") {
                    return Err(Error::parameter(format!(
                        "Artificial property '{}' cannot be specified when \
                         'boot_storage_volume' is also specified.",
                        prop_name
                    )));
                }
                // Handled together with 'boot_storage_volume_name'.
            }
            "boot_storage_volume_name" => {
                let spec = spec_of(prop_name)?;
                let sg_value = input.get("boot_storage_group_name").ok_or_else(|| {
                    Error::parameter(format!(
                        "Artificial property '{}' can only be specified when \
                         'boot_storage_group_name' is also specified.",
                        prop_name
                    ))
                })?;
                if input.contains_key("boot_storage_volume") {
                    return Err(Error::parameter(format!(
                        "Artificial property '{}' cannot be specified when \
                         'boot_storage_volume' is also specified.",
                        prop_name
                    )));
                }
                let part = existing(partition, prop_name)?;
                if !storage_mgmt_enabled(cpc) {
                    return Err(Error::parameter(format!(
                        "Artificial property '{}' can only be specified when the \
                         'dpm-storage-management' feature is enabled.",
                        prop_name
                    )));
                }
                let sg_name = artificial_name(spec, sg_value)?;
                let sv_name = artificial_name(spec, value)?;
                let sg = not_found_as_parameter_error(
                    client.find(ResourceClass::StorageGroup, Some(CONSOLE_URI), &sg_name),
                    || {
                        format!(
                            "Artificial property 'boot_storage_group_name' does not name an \
                             existing storage group: '{}'",
                            sg_name
                        )
                    },
                )?;
                let sv = not_found_as_parameter_error(
                    client.find(ResourceClass::StorageVolume, Some(&sg.uri), &sv_name),
                    || {
                        format!(
                            "Artificial property 'boot_storage_volume_name' does not name an \
                             existing storage volume '{}' in storage group '{}'",
                            sv_name, sg_name
                        )
                    },
                )?;
                set_boot_target(
                    &mut changes.properties,
                    spec,
                    part,
                    "boot-storage-volume",
                    &sv.uri,
                )?;
            }
            "boot_network_nic_name" => {
                let spec = spec_of(prop_name)?;
                let part = existing(partition, prop_name)?;
                let nic_name = artificial_name(spec, value)?;
                let nic = not_found_as_parameter_error(
                    client.find(ResourceClass::Nic, Some(&part.uri), &nic_name),
                    || {
                        format!(
                            "Artificial property '{}' does not name an existing NIC: '{}'",
                            prop_name, nic_name
                        )
                    },
                )?;
                set_boot_target(
                    &mut changes.properties,
                    spec,
                    part,
                    "boot-network-device",
                    &nic.uri,
                )?;
            }
            "crypto_configuration" => {
                changes.crypto = Some(crypto_changes(client, cpc, partition, value)?);
            }
            _ => {}
        }
    }
    Ok(changes)
}

/// Current crypto adapter URIs and domain configurations of a partition.
fn current_crypto_config(partition: Option<&Resource>) -> (Vec<String>, Vec<(i64, String)>) {
    let config = match partition.and_then(|p| p.prop("crypto-configuration")) {
        Some(config @ Value::Object(_)) => config,
        _ => return (Vec::new(), Vec::new()),
    };
    let adapters = match config.get("crypto-adapter-uris") {
        Some(Value::Array(uris)) => uris
            .iter()
            .filter_map(|u| u.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };
    let domains = match config.get("crypto-domain-configurations") {
        Some(Value::Array(configs)) => configs
            .iter()
            .filter_map(|dc| {
                let index = dc.get("domain-index")?.as_i64()?;
                let mode = dc.get("access-mode")?.as_str()?;
                Some((index, mode.to_string()))
            })
            .collect(),
        _ => Vec::new(),
    };
    (adapters, domains)
}

fn domain_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Resolve the `crypto_configuration` artificial property into the changes
/// needed to get from the current crypto configuration to the desired one.
fn crypto_changes(
    client: &dyn HmcClient,
    cpc: &Resource,
    partition: Option<&Resource>,
    config: &Value,
) -> Result<CryptoChanges> {
    const PROP: &str = "crypto_configuration";
    let config = config.as_object().ok_or_else(|| {
        Error::parameter(format!(
            "Artificial property '{}' is not a dictionary: {}.",
            PROP,
            repr(config)
        ))
    })?;
    let field = |name: &str| {
        config.get(name).ok_or_else(|| {
            Error::parameter(format!(
                "Artificial property '{}' does not have required field '{}'.",
                PROP, name
            ))
        })
    };
    let (current_adapters, current_domains) = current_crypto_config(partition);

    // No adapter names means all crypto adapters of the CPC.
    let adapter_uris: Vec<String> = match field("crypto_adapter_names")? {
        Value::Null => client
            .list(
                ResourceClass::Adapter,
                Some(&cpc.uri),
                &Filter::all().with("type", "crypto"),
            )?
            .into_iter()
            .map(|adapter| adapter.uri)
            .collect(),
        Value::Array(names) => {
            let mut uris = Vec::new();
            for name in names {
                let name = name.as_str().map(str::to_string).unwrap_or_else(|| name.to_string());
                let adapter = not_found_as_parameter_error(
                    client.find_by(
                        ResourceClass::Adapter,
                        Some(&cpc.uri),
                        &Filter::by_name(&name).with("type", "crypto"),
                    ),
                    || {
                        format!(
                            "Artificial property '{}' does not specify the name of an \
                             existing crypto adapter in its 'crypto_adapter_names' field: '{}'",
                            PROP, name
                        )
                    },
                )?;
                if !uris.contains(&adapter.uri) {
                    uris.push(adapter.uri);
                }
            }
            uris
        }
        other => {
            return Err(Error::parameter(format!(
                "Artificial property '{}' has a 'crypto_adapter_names' field that is not a \
                 list: {}",
                PROP,
                repr(other)
            )))
        }
    };

    let mut changes = CryptoChanges {
        add_adapters: adapter_uris
            .iter()
            .filter(|uri| !current_adapters.contains(uri))
            .cloned()
            .collect(),
        remove_adapters: current_adapters
            .iter()
            .filter(|uri| !adapter_uris.contains(uri))
            .cloned()
            .collect(),
        ..CryptoChanges::default()
    };

    let domain_configs = match field("crypto_domain_configurations")? {
        Value::Array(configs) => configs,
        other => {
            return Err(Error::parameter(format!(
                "Artificial property '{}' has a 'crypto_domain_configurations' field that is \
                 not a list: {}",
                PROP,
                repr(other)
            )))
        }
    };
    let sub_field = |dc: &Value, name: &str| -> Result<Value> {
        dc.get(name).cloned().ok_or_else(|| {
            Error::parameter(format!(
                "Artificial property '{}' does not have required sub-field '{}' in one of its \
                 'crypto_domain_configurations' fields.",
                PROP, name
            ))
        })
    };

    let mut desired = Vec::new();
    for dc in domain_configs {
        let index_value = sub_field(dc, "domain_index")?;
        let index = domain_index(&index_value).ok_or_else(|| {
            Error::parameter(format!(
                "Artificial property '{}' has a 'domain_index' sub-field that is not an \
                 integer: {}",
                PROP,
                repr(&index_value)
            ))
        })?;
        desired.push((index, dc));
    }
    changes.remove_domain_indexes = current_domains
        .iter()
        .map(|(index, _)| *index)
        .filter(|index| !desired.iter().any(|(i, _)| i == index))
        .collect();
    for (index, dc) in desired {
        let mode = match sub_field(dc, "access_mode")? {
            Value::String(s) => s,
            other => other.to_string(),
        };
        match current_domains.iter().find(|(i, _)| *i == index) {
            None => changes
                .add_domain_configs
                .push(CryptoDomainConfig::new(index, mode)),
            Some((_, current_mode)) if *current_mode != mode => changes
                .change_domain_configs
                .push(CryptoDomainConfig::new(index, mode)),
            Some(_) => {}
        }
    }
    Ok(changes)
}

/// The crypto configuration of the local partition, initialized if unset.
fn local_crypto_config(partition: &Resource) -> (Vec<Value>, Vec<Value>) {
    let config = partition.prop("crypto-configuration");
    let list = |name: &str| match config.and_then(|c| c.get(name)) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    (
        list("crypto-adapter-uris"),
        list("crypto-domain-configurations"),
    )
}

fn set_local_crypto_config(partition: &mut Resource, adapters: Vec<Value>, domains: Vec<Value>) {
    let mut props = Properties::new();
    props.insert(
        "crypto-configuration".to_string(),
        json!({
            "crypto-adapter-uris": adapters,
            "crypto-domain-configurations": domains,
        }),
    );
    partition.update_local(&props);
}

/// Apply crypto configuration changes to a partition.
///
/// Additions come first and removals last, and access mode changes to
/// `control-usage` come before changes to `control`, so that the partition
/// never loses its last usage domain on the way. In check mode the changes
/// are applied to the local partition only.
///
/// # Returns
///
/// Whether the crypto configuration was (or would have been) changed.
pub fn apply_crypto_changes(
    client: &dyn HmcClient,
    partition: &mut Resource,
    changes: &CryptoChanges,
    check_mode: bool,
) -> Result<bool> {
    let mut changed = false;

    if !changes.add_adapters.is_empty() || !changes.add_domain_configs.is_empty() {
        debug!(
            "Adding crypto adapters {:?} and domains {:?} to partition '{}'",
            changes.add_adapters,
            changes.add_domain_configs,
            partition.name()
        );
        if check_mode {
            let (mut adapters, mut domains) = local_crypto_config(partition);
            for uri in &changes.add_adapters {
                if !adapters.contains(&json!(uri)) {
                    adapters.push(json!(uri));
                }
            }
            for dc in &changes.add_domain_configs {
                let dc = json!(dc);
                if !domains.contains(&dc) {
                    domains.push(dc);
                }
            }
            set_local_crypto_config(partition, adapters, domains);
        } else {
            client.invoke(
                &partition.uri,
                &Operation::IncreaseCryptoConfig {
                    adapter_uris: changes.add_adapters.clone(),
                    domain_configs: changes.add_domain_configs.clone(),
                },
            )?;
        }
        changed = true;
    }

    if !changes.change_domain_configs.is_empty() {
        let mut change_configs = changes.change_domain_configs.clone();
        change_configs.sort_by(|a, b| b.access_mode.cmp(&a.access_mode));
        for dc in change_configs {
            debug!(
                "Changing access mode of crypto domain {} of partition '{}' to '{}'",
                dc.domain_index,
                partition.name(),
                dc.access_mode
            );
            if check_mode {
                let (adapters, mut domains) = local_crypto_config(partition);
                for domain in domains.iter_mut() {
                    if domain.get("domain-index") == Some(&json!(dc.domain_index)) {
                        domain["access-mode"] = json!(dc.access_mode);
                    }
                }
                set_local_crypto_config(partition, adapters, domains);
            } else {
                client.invoke(
                    &partition.uri,
                    &Operation::ChangeCryptoDomainConfig {
                        domain_index: dc.domain_index,
                        access_mode: dc.access_mode,
                    },
                )?;
            }
        }
        changed = true;
    }

    if !changes.remove_adapters.is_empty() || !changes.remove_domain_indexes.is_empty() {
        debug!(
            "Removing crypto adapters {:?} and domains {:?} from partition '{}'",
            changes.remove_adapters,
            changes.remove_domain_indexes,
            partition.name()
        );
        if check_mode {
            let (mut adapters, mut domains) = local_crypto_config(partition);
            adapters.retain(|uri| !changes.remove_adapters.iter().any(|r| uri == r));
            domains.retain(|dc| {
                !changes
                    .remove_domain_indexes
                    .iter()
                    .any(|i| dc.get("domain-index") == Some(&json!(i)))
            });
            set_local_crypto_config(partition, adapters, domains);
        } else {
            client.invoke(
                &partition.uri,
                &Operation::DecreaseCryptoConfig {
                    adapter_uris: changes.remove_adapters.clone(),
                    domain_indexes: changes.remove_domain_indexes.clone(),
                },
            )?;
        }
        changed = true;
    }

    Ok(changed)
}

fn is_unset(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

/// Build the partition that "Create Partition" would create, without
/// creating it. Used in check mode.
///
/// # Arguments
///
/// * `cpc` - The CPC of the partition.
/// * `create` - The create properties.
/// * `update` - Update properties that would be applied right after
///   creation.
///
/// # Errors
///
/// A parameter error lists the required properties that are missing.
pub fn check_mode_partition(
    cpc: &Resource,
    create: &Properties,
    update: &Properties,
) -> Result<Resource> {
    let mut props = create.clone();
    props.extend(update.clone());

    let mut missing = Vec::new();
    for spec in PARTITION_PROPERTIES.iter() {
        let hmc_name = spec.hmc_name();
        if matches!(spec.required, Requiredness::Always) && !props.contains_key(&hmc_name) {
            missing.push(spec.name);
        }
        if let Some(default) = spec.default.to_value() {
            props.entry(hmc_name).or_insert(default);
        }
    }
    if !missing.is_empty() {
        return Err(missing_error(&missing));
    }

    let id = Uuid::new_v4();
    let oid = id.to_string();
    let uri = format!("/api/partitions/{}", oid);
    let int = |name: &str| props.get(name).and_then(Value::as_i64).unwrap_or(0);
    let reserved_memory = int("maximum-memory") - int("initial-memory");
    props.insert("object-id".to_string(), json!(oid));
    props.insert("object-uri".to_string(), json!(uri));
    props.insert("parent".to_string(), json!(cpc.uri));
    props.insert("reserved-memory".to_string(), json!(reserved_memory));
    // Only known after the first activation.
    props.insert("threads-per-processor".to_string(), json!(0));
    // TODO: pick a partition id and short name that are unused in the CPC
    if props.get("autogenerate-partition-id") == Some(&json!(true)) {
        props.insert("partition-id".to_string(), json!("FF"));
    }
    let name = props.get("name").and_then(Value::as_str).unwrap_or("").to_string();
    let suffix = id.simple().to_string()[..4].to_uppercase();
    props
        .entry("short-name".to_string())
        .or_insert(json!(format!("{}{}", name, suffix)));

    for spec in PARTITION_PROPERTIES.iter() {
        if let Requiredness::When(required) = spec.required {
            if required(&props) && is_unset(props.get(&spec.hmc_name())) {
                missing.push(spec.name);
            }
        }
    }
    if !missing.is_empty() {
        return Err(missing_error(&missing));
    }

    Ok(Resource::new(
        uri,
        ResourceClass::Partition,
        Some(cpc.uri.clone()),
        props,
    ))
}

fn missing_error(missing: &[&str]) -> Error {
    Error::parameter(format!(
        "Required partition properties missing in module input: {}",
        missing.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zhmc_session::FakedHmc;

    fn props(value: Value) -> Properties {
        value.as_object().unwrap().clone()
    }

    fn setup() -> (FakedHmc, Resource) {
        let hmc = FakedHmc::new();
        let cpc = hmc
            .add_cpc(props(json!({
                "name": "CPC1",
                "available-features-list": [{"name": "dpm-storage-management", "state": false}]
            })))
            .unwrap();
        for name in ["CRYP1", "CRYP2"] {
            hmc.add(
                ResourceClass::Adapter,
                Some(&cpc),
                props(json!({"name": name, "type": "crypto"})),
            )
            .unwrap();
        }
        let cpc = hmc.get(&cpc).unwrap();
        (hmc, cpc)
    }

    #[test]
    fn test_name_is_first_create_property() {
        let (hmc, cpc) = setup();
        let input = props(json!({"description": "d", "ifl_processors": "2"}));
        let changes = process_partition_properties(&hmc, &cpc, None, "p1", &input).unwrap();
        let names: Vec<&String> = changes.properties.create.keys().collect();
        assert_eq!(names, vec!["name", "description", "ifl-processors"]);
        assert_eq!(changes.properties.create["ifl-processors"], json!(2));
        assert!(changes.crypto.is_none());
    }

    #[test]
    fn test_artificial_property_needs_existing_partition() {
        let (hmc, cpc) = setup();
        let input = props(json!({"boot_network_nic_name": "nic1"}));
        let err = process_partition_properties(&hmc, &cpc, None, "p1", &input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Artificial property 'boot_network_nic_name' can only be specified when the \
             partition previously exists."
        );
    }

    #[test]
    fn test_boot_storage_group_needs_volume_name() {
        let (hmc, cpc) = setup();
        let input = props(json!({"boot_storage_group_name": "sg1"}));
        let err = process_partition_properties(&hmc, &cpc, None, "p1", &input).unwrap_err();
        assert_eq!(err.class_name(), "ParameterError");
        assert!(err.to_string().contains("'boot_storage_volume_name' is also specified"));
    }

    #[test]
    fn test_ssc_gateway_empty_string_is_null() {
        let (hmc, cpc) = setup();
        let input = props(json!({"ssc_ipv4_gateway": ""}));
        let changes = process_partition_properties(&hmc, &cpc, None, "p1", &input).unwrap();
        assert_eq!(changes.properties.create["ssc-ipv4-gateway"], Value::Null);
    }

    #[test]
    fn test_crypto_changes_for_new_partition() {
        let (hmc, cpc) = setup();
        let input = props(json!({
            "crypto_configuration": {
                "crypto_adapter_names": null,
                "crypto_domain_configurations": [
                    {"domain_index": "2", "access_mode": "control-usage"},
                    {"domain_index": 3, "access_mode": "control"}
                ]
            }
        }));
        let changes = process_partition_properties(&hmc, &cpc, None, "p1", &input).unwrap();
        let crypto = changes.crypto.unwrap();
        assert_eq!(crypto.add_adapters.len(), 2);
        assert_eq!(
            crypto.add_domain_configs,
            vec![
                CryptoDomainConfig::new(2, "control-usage"),
                CryptoDomainConfig::new(3, "control")
            ]
        );
        assert!(crypto.remove_adapters.is_empty());
    }

    #[test]
    fn test_crypto_changes_against_current_config() {
        let (hmc, cpc) = setup();
        let adapters = hmc
            .list(ResourceClass::Adapter, Some(&cpc.uri), &Filter::all())
            .unwrap();
        let partition = Resource::new(
            "/api/partitions/1",
            ResourceClass::Partition,
            Some(cpc.uri.clone()),
            props(json!({
                "name": "p1",
                "crypto-configuration": {
                    "crypto-adapter-uris": [adapters[0].uri, adapters[1].uri],
                    "crypto-domain-configurations": [
                        {"domain-index": 1, "access-mode": "control"},
                        {"domain-index": 2, "access-mode": "control-usage"}
                    ]
                }
            })),
        );
        let input = props(json!({
            "crypto_configuration": {
                "crypto_adapter_names": ["CRYP1"],
                "crypto_domain_configurations": [
                    {"domain_index": 1, "access_mode": "control-usage"},
                    {"domain_index": 4, "access_mode": "control"}
                ]
            }
        }));
        let changes =
            process_partition_properties(&hmc, &cpc, Some(&partition), "p1", &input).unwrap();
        let crypto = changes.crypto.unwrap();
        assert_eq!(crypto.remove_adapters, vec![adapters[1].uri.clone()]);
        assert_eq!(crypto.remove_domain_indexes, vec![2]);
        assert!(crypto.add_adapters.is_empty());
        assert_eq!(crypto.add_domain_configs, vec![CryptoDomainConfig::new(4, "control")]);
        assert_eq!(
            crypto.change_domain_configs,
            vec![CryptoDomainConfig::new(1, "control-usage")]
        );
    }

    #[test]
    fn test_crypto_configuration_errors() {
        let (hmc, cpc) = setup();
        let input = props(json!({"crypto_configuration": "all"}));
        let err = process_partition_properties(&hmc, &cpc, None, "p1", &input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Artificial property 'crypto_configuration' is not a dictionary: 'all'."
        );

        let input = props(json!({"crypto_configuration": {"crypto_domain_configurations": []}}));
        let err = process_partition_properties(&hmc, &cpc, None, "p1", &input).unwrap_err();
        assert!(err.to_string().contains("required field 'crypto_adapter_names'"));

        let input = props(json!({
            "crypto_configuration": {
                "crypto_adapter_names": ["NOPE"],
                "crypto_domain_configurations": []
            }
        }));
        let err = process_partition_properties(&hmc, &cpc, None, "p1", &input).unwrap_err();
        assert!(err.to_string().ends_with("'crypto_adapter_names' field: 'NOPE'"));
    }

    #[test]
    fn test_apply_crypto_changes_in_check_mode() {
        let (hmc, cpc) = setup();
        let mut partition = Resource::new(
            "/api/partitions/1",
            ResourceClass::Partition,
            Some(cpc.uri.clone()),
            props(json!({
                "name": "p1",
                "crypto-configuration": {
                    "crypto-adapter-uris": ["/api/adapters/a"],
                    "crypto-domain-configurations": [
                        {"domain-index": 1, "access-mode": "control"}
                    ]
                }
            })),
        );
        let changes = CryptoChanges {
            add_adapters: vec!["/api/adapters/b".into()],
            add_domain_configs: vec![CryptoDomainConfig::new(2, "control-usage")],
            change_domain_configs: vec![CryptoDomainConfig::new(1, "control-usage")],
            remove_adapters: vec!["/api/adapters/a".into()],
            ..CryptoChanges::default()
        };
        assert!(apply_crypto_changes(&hmc, &mut partition, &changes, true).unwrap());
        assert_eq!(
            partition.prop("crypto-configuration"),
            Some(&json!({
                "crypto-adapter-uris": ["/api/adapters/b"],
                "crypto-domain-configurations": [
                    {"domain-index": 1, "access-mode": "control-usage"},
                    {"domain-index": 2, "access-mode": "control-usage"}
                ]
            }))
        );
        assert!(hmc.mutations().is_empty());
        assert!(!apply_crypto_changes(&hmc, &mut partition, &CryptoChanges::default(), true)
            .unwrap());
    }

    #[test]
    fn test_check_mode_partition() {
        let (_hmc, cpc) = setup();
        let create = props(json!({
            "name": "p1",
            "initial-memory": 1024,
            "maximum-memory": 4096,
        }));
        let partition = check_mode_partition(&cpc, &create, &Properties::new()).unwrap();
        assert!(partition.uri.starts_with("/api/partitions/"));
        assert_eq!(partition.str_prop("status"), Some("stopped"));
        assert_eq!(partition.int_prop("reserved-memory"), Some(3072));
        assert_eq!(partition.str_prop("partition-id"), Some("FF"));
        assert!(partition.str_prop("short-name").unwrap().starts_with("p1"));
        assert_eq!(partition.parent.as_deref(), Some(cpc.uri.as_str()));
    }

    #[test]
    fn test_check_mode_partition_missing_properties() {
        let (_hmc, cpc) = setup();
        let err = check_mode_partition(&cpc, &props(json!({"name": "p1"})), &Properties::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Required partition properties missing in module input: initial_memory, \
             maximum_memory"
        );

        let create = props(json!({
            "name": "p1",
            "initial-memory": 1024,
            "maximum-memory": 1024,
            "boot-device": "ftp",
            "boot-ftp-host": "ftp.example.com",
        }));
        let err = check_mode_partition(&cpc, &create, &Properties::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Required partition properties missing in module input: boot_ftp_username, \
             boot_ftp_password, boot_ftp_insfile"
        );
    }
}
