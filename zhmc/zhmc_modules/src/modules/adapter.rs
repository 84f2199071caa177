//! The `zhmc_adapter` module: adapters of CPCs in DPM mode.
//!
//! Existing adapters of any type can be updated (`set`). HiperSockets
//! adapters can also be created (`present`) and deleted (`absent`).

use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};

use zhmc_core::property::{process_normal_property, validate_input};
use zhmc_core::tables::ADAPTER_PROPERTIES;
use zhmc_core::utils::repr;
use zhmc_core::{
    ClientError, Error, Filter, HmcClient, Operation, Properties, PropertyChanges, Resource,
    ResourceClass, Result,
};

use crate::lookup::find_cpc;
use crate::module::ModuleOutput;
use crate::params::parse_params;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AdapterState {
    Set,
    Present,
    Absent,
    Facts,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AdapterParams {
    cpc_name: String,
    name: String,
    #[serde(default, rename = "match")]
    match_props: Option<Properties>,
    state: AdapterState,
    #[serde(default)]
    properties: Option<Properties>,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: AdapterParams = parse_params(params)?;
    match params.state {
        AdapterState::Set => ensure_set(client, &params, check_mode),
        AdapterState::Present => ensure_present(client, &params, check_mode),
        AdapterState::Absent => ensure_absent(client, &params, check_mode),
        AdapterState::Facts => facts(client, &params),
    }
}

/// Map the `crypto_type` input value to the HMC crypto type.
fn hmc_crypto_type(value: &Value) -> Result<&'static str> {
    match value.as_str() {
        Some("acc") => Ok("accelerator"),
        Some("cca") => Ok("cca-coprocessor"),
        Some("ep11") => Ok("ep11-coprocessor"),
        _ => Err(Error::parameter(format!(
            "Property 'crypto_type' must be one of 'acc', 'cca', 'ep11', but is: {}",
            repr(value)
        ))),
    }
}

/// The changes for an adapter, including adapter and crypto type changes.
#[derive(Debug, Default)]
struct AdapterChanges {
    properties: PropertyChanges,
    adapter_type: Option<String>,
    crypto_type: Option<String>,
}

impl AdapterChanges {
    fn is_empty(&self) -> bool {
        self.properties.update.is_empty()
            && self.adapter_type.is_none()
            && self.crypto_type.is_none()
    }
}

/// Compute the changes for an adapter.
///
/// The adapter type and crypto type of an existing adapter are changed with
/// dedicated HMC operations rather than by a property update.
fn process_adapter_properties(
    adapter: Option<&Resource>,
    name: &str,
    input: &Properties,
) -> Result<AdapterChanges> {
    let mut changes = AdapterChanges::default();
    if adapter.map_or(true, |a| a.name() != name) {
        changes.properties.create.insert("name".to_string(), json!(name));
        changes.properties.update.insert("name".to_string(), json!(name));
    }

    for (prop_name, value) in input {
        validate_input(&ADAPTER_PROPERTIES, prop_name).map_err(|_| {
            Error::parameter(format!(
                "Invalid adapter property '{}' specified in the 'properties' module parameter.",
                prop_name
            ))
        })?;
        match (adapter, prop_name.as_str()) {
            (Some(adapter), "type") => {
                if adapter.prop("type") != Some(value) {
                    changes.adapter_type = Some(match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    });
                }
            }
            (Some(adapter), "crypto_type") => {
                let crypto_type = hmc_crypto_type(value)?;
                if adapter.str_prop("crypto-type") != Some(crypto_type) {
                    changes.crypto_type = Some(crypto_type.to_string());
                }
            }
            _ => changes.properties.merge(process_normal_property(
                &ADAPTER_PROPERTIES,
                prop_name,
                value,
                adapter.map(|a| &a.properties),
            )?),
        }
    }
    Ok(changes)
}

/// Identify an adapter by its match properties if specified, or else by its
/// name.
///
/// The match properties take precedence, so that an adapter can be renamed
/// to a name another adapter currently has.
fn identify_adapter(
    client: &dyn HmcClient,
    cpc: &Resource,
    name: &str,
    match_props: Option<&Properties>,
) -> Result<Resource> {
    let filter = match match_props {
        Some(match_props) if !match_props.is_empty() => {
            let mut filter = Filter::all();
            for (prop_name, value) in match_props {
                let value = match ADAPTER_PROPERTIES.get(prop_name).and_then(|s| s.type_cast) {
                    Some(cast) => cast(value, prop_name)?,
                    None => value.clone(),
                };
                filter = filter.with(&prop_name.replace('_', "-"), value);
            }
            filter
        }
        _ => Filter::by_name(name),
    };
    client.find_by(ResourceClass::Adapter, Some(&cpc.uri), &filter)
}

/// The properties of the ports of an adapter.
fn adapter_ports(client: &dyn HmcClient, adapter: &Resource) -> Result<Vec<Value>> {
    let ports = client.list(ResourceClass::Port, Some(&adapter.uri), &Filter::all())?;
    let mut result = Vec::with_capacity(ports.len());
    for port in ports {
        // unconfigured FICON adapters reject getting the port properties
        let port = if adapter.str_prop("type") == Some("not-configured") {
            port
        } else {
            client.get(&port.uri)?
        };
        result.push(Value::Object(port.properties));
    }
    Ok(result)
}

/// The adapter properties with its `ports`.
fn adapter_properties(client: &dyn HmcClient, adapter: &Resource) -> Result<Properties> {
    let mut props = adapter.properties.clone();
    props.insert("ports".to_string(), Value::Array(adapter_ports(client, adapter)?));
    Ok(props)
}

/// Apply the changes to an existing adapter.
///
/// In check mode, the result is the current properties with the changes
/// applied locally.
fn apply_changes(
    client: &dyn HmcClient,
    cpc: &Resource,
    adapter: &mut Resource,
    changes: &AdapterChanges,
    check_mode: bool,
) -> Result<()> {
    let update = &changes.properties.update;
    if !update.is_empty() {
        if check_mode {
            // the HMC rejects renaming to the name of another adapter
            if let Some(new_name) = update.get("name").and_then(Value::as_str) {
                let other =
                    client.find_optional(ResourceClass::Adapter, Some(&cpc.uri), new_name)?;
                if other.is_some_and(|other| other.uri != adapter.uri) {
                    return Err(ClientError::http(
                        400,
                        8,
                        "An adapter with the name specified in the request body already exists \
                         on its parent CPC.",
                    )
                    .into());
                }
            }
            adapter.update_local(update);
        } else {
            debug!("Updating adapter '{}': {:?}", adapter.name(), update.keys());
            client.update(&adapter.uri, update)?;
        }
    }
    if let Some(adapter_type) = &changes.adapter_type {
        if check_mode {
            adapter.properties.insert("type".to_string(), json!(adapter_type));
        } else {
            debug!("Changing type of adapter '{}' to '{}'", adapter.name(), adapter_type);
            client.invoke(
                &adapter.uri,
                &Operation::ChangeAdapterType {
                    adapter_type: adapter_type.clone(),
                },
            )?;
        }
    }
    if let Some(crypto_type) = &changes.crypto_type {
        if check_mode {
            adapter.properties.insert("crypto-type".to_string(), json!(crypto_type));
        } else {
            debug!("Changing crypto type of adapter '{}' to '{}'", adapter.name(), crypto_type);
            client.invoke(
                &adapter.uri,
                &Operation::ChangeCryptoType {
                    crypto_type: crypto_type.clone(),
                    zeroize: None,
                },
            )?;
        }
    }
    if !check_mode && !changes.is_empty() {
        client.pull_properties(adapter)?;
    }
    Ok(())
}

fn ensure_set(
    client: &dyn HmcClient,
    params: &AdapterParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let mut adapter = identify_adapter(client, &cpc, &params.name, params.match_props.as_ref())?;
    client.pull_properties(&mut adapter)?;
    let input = params.properties.clone().unwrap_or_default();
    let changes = process_adapter_properties(Some(&adapter), &params.name, &input)?;
    apply_changes(client, &cpc, &mut adapter, &changes, check_mode)?;
    Ok(ModuleOutput::new(
        !changes.is_empty(),
        adapter_properties(client, &adapter)?,
    ))
}

/// The properties of a HiperSockets adapter that would be created in check
/// mode. Values the HMC assigns are null.
fn check_mode_hipersocket(cpc: &Resource, create: &Properties) -> Properties {
    let mut props = match json!({
        "object-uri": null,
        "object-id": null,
        "parent": cpc.uri,
        "class": "adapter",
        "description": "",
        "status": null,
        "type": "hipersockets",
        "adapter-id": null,
        "adapter-family": "hipersockets",
        "detected-card-type": "hipersockets",
        "port-count": 1,
        "network-port-uris": [null],
        "state": null,
        "maximum-transmission-unit-size": 8,
        "configured-capacity": null,
        "used-capacity": null,
        "allowed-capacity": null,
        "maximum-total-capacity": null,
        "channel-path-id": null,
        "physical-channel-status": null,
    }) {
        Value::Object(props) => props,
        _ => Properties::new(),
    };
    props.extend(create.clone());
    props.insert("ports".to_string(), json!([]));
    props
}

fn ensure_present(
    client: &dyn HmcClient,
    params: &AdapterParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let input = params.properties.clone().unwrap_or_default();

    match client.find_optional(ResourceClass::Adapter, Some(&cpc.uri), &params.name)? {
        None => {
            // Only HiperSockets adapters can be created. Requiring the type
            // catches misspelled names of existing adapters.
            match input.get("type") {
                None => {
                    return Err(Error::parameter(format!(
                        "Input property 'type' missing when creating Hipersockets adapter '{}' \
                         (must specify 'hipersockets')",
                        params.name
                    )))
                }
                Some(Value::String(t)) if t == "hipersockets" => {}
                Some(other) => {
                    return Err(Error::parameter(format!(
                        "Input property 'type' specifies {} when creating Hipersockets adapter \
                         '{}' (must specify 'hipersockets').",
                        repr(other),
                        params.name
                    )))
                }
            }
            let changes = process_adapter_properties(None, &params.name, &input)?;
            let mut create = changes.properties.create;
            let invalid: Properties = changes
                .properties
                .update
                .into_iter()
                .filter(|(name, _)| !create.contains_key(name))
                .collect();
            if !invalid.is_empty() {
                return Err(Error::parameter(format!(
                    "Invalid input properties specified when creating Hipersockets adapter \
                     '{}': {}",
                    params.name,
                    Value::Object(invalid)
                )));
            }
            // the type only states the intention; "Create Hipersocket" does
            // not accept it
            create.remove("type");

            if check_mode {
                return Ok(ModuleOutput::new(true, check_mode_hipersocket(&cpc, &create)));
            }
            debug!("Creating Hipersockets adapter '{}'", params.name);
            let adapter = client.create(ResourceClass::Adapter, Some(&cpc.uri), &create)?;
            let adapter = client.get(&adapter.uri)?;
            Ok(ModuleOutput::new(true, adapter_properties(client, &adapter)?))
        }
        Some(mut adapter) => {
            client.pull_properties(&mut adapter)?;
            let changes = process_adapter_properties(Some(&adapter), &params.name, &input)?;
            apply_changes(client, &cpc, &mut adapter, &changes, check_mode)?;
            Ok(ModuleOutput::new(
                !changes.is_empty(),
                adapter_properties(client, &adapter)?,
            ))
        }
    }
}

fn ensure_absent(
    client: &dyn HmcClient,
    params: &AdapterParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let Some(adapter) =
        client.find_optional(ResourceClass::Adapter, Some(&cpc.uri), &params.name)?
    else {
        return Ok(ModuleOutput::new(false, json!({})));
    };
    if !check_mode {
        debug!("Deleting adapter '{}'", adapter.name());
        client.delete(&adapter.uri)?;
    }
    Ok(ModuleOutput::new(true, json!({})))
}

fn facts(client: &dyn HmcClient, params: &AdapterParams) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let adapter = client.find(ResourceClass::Adapter, Some(&cpc.uri), &params.name)?;
    let adapter = client.get(&adapter.uri)?;
    Ok(ModuleOutput::new(false, adapter_properties(client, &adapter)?))
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
        ficon: String,
        crypto: String,
    }

    fn setup() -> Setup {
        let hmc = FakedHmc::new();
        let cpc = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
        let ficon = hmc
            .add(
                ResourceClass::Adapter,
                Some(&cpc),
                props(json!({
                    "name": "FCP1",
                    "adapter-id": "120",
                    "adapter-family": "ficon",
                    "type": "fcp",
                    "description": "",
                })),
            )
            .unwrap();
        hmc.add(ResourceClass::Port, Some(&ficon), props(json!({"name": "p0", "index": 0})))
            .unwrap();
        let crypto = hmc
            .add(
                ResourceClass::Adapter,
                Some(&cpc),
                props(json!({
                    "name": "CRYP1",
                    "adapter-id": "130",
                    "adapter-family": "crypto",
                    "crypto-type": "ep11-coprocessor",
                })),
            )
            .unwrap();
        Setup { hmc, ficon, crypto }
    }

    fn params(name: &str, state: &str, properties: Value) -> Properties {
        props(json!({
            "cpc_name": "CPC1",
            "name": name,
            "state": state,
            "properties": properties,
        }))
    }

    #[test]
    fn test_facts_with_ports() {
        let s = setup();
        let output = run(&s.hmc, &params("FCP1", "facts", json!({})), false).unwrap();
        assert!(!output.changed);
        assert_eq!(output.result["adapter-id"], "120");
        assert_eq!(output.result["ports"][0]["index"], 0);

        let err = run(&s.hmc, &params("NOPE", "facts", json!({})), false).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_set_properties_and_adapter_type() {
        let s = setup();
        let input = json!({"description": "boot", "type": "fc"});
        let output = run(&s.hmc, &params("FCP1", "set", input.clone()), true).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["type"], "fc");
        assert_eq!(output.result["description"], "boot");
        assert!(s.hmc.mutations().is_empty());

        let output = run(&s.hmc, &params("FCP1", "set", input.clone()), false).unwrap();
        assert!(output.changed);
        assert_eq!(s.hmc.properties(&s.ficon).unwrap()["type"], "fc");
        assert!(s
            .hmc
            .mutations()
            .contains(&format!("invoke 'Change Adapter Type' on {}", s.ficon)));

        let output = run(&s.hmc, &params("FCP1", "set", input), false).unwrap();
        assert!(!output.changed);
    }

    #[test]
    fn test_set_crypto_type() {
        let s = setup();
        let output =
            run(&s.hmc, &params("CRYP1", "set", json!({"crypto_type": "cca"})), false).unwrap();
        assert!(output.changed);
        assert_eq!(
            s.hmc.properties(&s.crypto).unwrap()["crypto-type"],
            "cca-coprocessor"
        );

        let err = run(&s.hmc, &params("CRYP1", "set", json!({"crypto_type": "xyz"})), false)
            .unwrap_err();
        assert_eq!(
            err.failure_message(),
            "ParameterError: Property 'crypto_type' must be one of 'acc', 'cca', 'ep11', but \
             is: 'xyz'"
        );
    }

    #[test]
    fn test_rename_by_match() {
        let s = setup();
        let mut input = params("FCP-BOOT", "set", json!({}));
        input.insert("match".to_string(), json!({"adapter_id": "120"}));
        let output = run(&s.hmc, &input, true).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["name"], "FCP-BOOT");

        let mut input = params("CRYP1", "set", json!({}));
        input.insert("match".to_string(), json!({"adapter_id": "120"}));
        let err = run(&s.hmc, &input, true).unwrap_err();
        assert!(err.is_http(400, 8));

        let mut input = params("FCP-BOOT", "set", json!({}));
        input.insert("match".to_string(), json!({"adapter_id": "120"}));
        run(&s.hmc, &input, false).unwrap();
        assert_eq!(s.hmc.properties(&s.ficon).unwrap()["name"], "FCP-BOOT");
    }

    #[test]
    fn test_invalid_property() {
        let s = setup();
        let err = run(&s.hmc, &params("FCP1", "set", json!({"adapter_id": "1"})), false)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid adapter property 'adapter_id' specified in the 'properties' module parameter."
        );
    }

    #[test]
    fn test_hipersocket_lifecycle() {
        let s = setup();
        let input = json!({
            "type": "hipersockets",
            "description": "HS",
            "maximum_transmission_unit_size": "16",
        });

        let output = run(&s.hmc, &params("HS1", "present", input.clone()), true).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["object-uri"], Value::Null);
        assert_eq!(output.result["maximum-transmission-unit-size"], 16);
        assert_eq!(output.result["ports"], json!([]));
        assert!(s.hmc.mutations().is_empty());

        let output = run(&s.hmc, &params("HS1", "present", input.clone()), false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["type"], "hipersockets");
        assert_eq!(output.result["description"], "HS");
        assert_eq!(output.result["ports"].as_array().unwrap().len(), 1);

        let output = run(&s.hmc, &params("HS1", "present", input), false).unwrap();
        assert!(!output.changed);

        let output = run(&s.hmc, &params("HS1", "absent", json!({})), false).unwrap();
        assert!(output.changed);
        let output = run(&s.hmc, &params("HS1", "absent", json!({})), false).unwrap();
        assert!(!output.changed);
    }

    #[test]
    fn test_create_requires_hipersockets_type() {
        let s = setup();
        let err = run(&s.hmc, &params("FCP2", "present", json!({})), false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Input property 'type' missing when creating Hipersockets adapter 'FCP2' (must \
             specify 'hipersockets')"
        );

        let err = run(&s.hmc, &params("FCP2", "present", json!({"type": "fcp"})), false)
            .unwrap_err();
        assert!(err.to_string().starts_with("Input property 'type' specifies 'fcp'"));

        let input = json!({"type": "hipersockets", "crypto_number": 3});
        let err = run(&s.hmc, &params("HS2", "present", input), false).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Invalid input properties specified when creating Hipersockets adapter"));
        assert!(s.hmc.mutations().is_empty());
    }
}
