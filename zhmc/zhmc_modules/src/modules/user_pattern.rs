//! The `zhmc_user_pattern` module: HMC user patterns.
//!
//! A user pattern references template users and LDAP server definitions by
//! URI. The module takes and returns their names instead. The result uses
//! underscored property names.

use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use zhmc_core::property::process_properties;
use zhmc_core::tables::USER_PATTERN_PROPERTIES;
use zhmc_core::utils::{repr, underscore_properties};
use zhmc_core::{
    ClientError, Error, HmcClient, Properties, PropertyChanges, Resource, ResourceClass, Result,
    CONSOLE_URI,
};

use crate::lookup::{find_console_object, find_console_object_optional, not_found_as_parameter_error};
use crate::module::ModuleOutput;
use crate::params::parse_params;

/// Artificial name properties, with the URI property they set and the class
/// of the named object.
const REFERENCES: [(&str, &str, ResourceClass); 8] = [
    ("user_template_name", "user-template-uri", ResourceClass::User),
    (
        "ldap_server_definition_name",
        "ldap-server-definition-uri",
        ResourceClass::LdapServerDefinition,
    ),
    ("specific_template_name", "specific-template-uri", ResourceClass::User),
    (
        "template_name_override_ldap_server_definition_name",
        "template-name-override-ldap-server-definition-uri",
        ResourceClass::LdapServerDefinition,
    ),
    (
        "template_name_override_default_template_name",
        "template-name-override-default-template-uri",
        ResourceClass::User,
    ),
    (
        "ldap_group_ldap_server_definition_name",
        "ldap-group-ldap-server-definition-uri",
        ResourceClass::LdapServerDefinition,
    ),
    (
        "ldap_group_default_template_name",
        "ldap-group-default-template-uri",
        ResourceClass::User,
    ),
    (
        "domain_name_restrictions_ldap_server_definition_name",
        "domain-name-restrictions-ldap-server-definition-uri",
        ResourceClass::LdapServerDefinition,
    ),
];

const MAPPINGS: &str = "ldap_group_to_template_mappings";

const ARTIFICIAL_PROPERTIES: [&str; 9] = [
    "user_template_name",
    "ldap_server_definition_name",
    "specific_template_name",
    "template_name_override_ldap_server_definition_name",
    "template_name_override_default_template_name",
    "ldap_group_ldap_server_definition_name",
    "ldap_group_default_template_name",
    "domain_name_restrictions_ldap_server_definition_name",
    MAPPINGS,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum UserPatternState {
    Absent,
    Present,
    Facts,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserPatternParams {
    name: String,
    state: UserPatternState,
    #[serde(default)]
    properties: Option<Properties>,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: UserPatternParams = parse_params(params)?;
    match params.state {
        UserPatternState::Absent => ensure_absent(client, &params, check_mode),
        UserPatternState::Present => ensure_present(client, &params, check_mode),
        UserPatternState::Facts => facts(client, &params),
    }
}

fn label(class: ResourceClass) -> &'static str {
    match class {
        ResourceClass::LdapServerDefinition => "LDAP Server Definition",
        _ => "User",
    }
}

/// Find a named object, failing with a parameter error that says where the
/// name was specified.
fn uri_by_name(
    client: &dyn HmcClient,
    class: ResourceClass,
    name: &str,
    specified: &str,
) -> Result<String> {
    let object = not_found_as_parameter_error(find_console_object(client, class, name), || {
        format!("{} '{}' specified in {} does not exist.", label(class), name, specified)
    })?;
    Ok(object.uri)
}

fn mappings_to_hmc(client: &dyn HmcClient, input: &Value) -> Result<Value> {
    let items = match input {
        Value::Null => return Ok(Value::Null),
        Value::Array(items) => items,
        other => {
            return Err(Error::parameter(format!(
                "Property '{}' must be a list, but is: {}",
                MAPPINGS,
                repr(other)
            )))
        }
    };
    let mut mappings = Vec::with_capacity(items.len());
    for item in items {
        let item = item.as_object().ok_or_else(|| {
            Error::parameter(format!(
                "Items of property '{}' must be dictionaries, but one is: {}",
                MAPPINGS,
                repr(item)
            ))
        })?;
        let mut mapping = Properties::new();
        for (name, value) in item {
            match name.as_str() {
                "template_uri" => {
                    return Err(Error::parameter(format!(
                        "Property 'template_uri' in an item of '{}' is not allowed in the \
                         'properties' module parameter.",
                        MAPPINGS
                    )))
                }
                "template_name" => {
                    let template_name = value.as_str().unwrap_or_default();
                    let uri = uri_by_name(
                        client,
                        ResourceClass::User,
                        template_name,
                        &format!("property 'template_name' in an item of '{}'", MAPPINGS),
                    )?;
                    mapping.insert("template-uri".to_string(), json!(uri));
                }
                _ => {
                    mapping.insert(name.replace('_', "-"), value.clone());
                }
            }
        }
        mappings.push(Value::Object(mapping));
    }
    if mappings.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::Array(mappings))
    }
}

/// Compute the changes for a user pattern.
///
/// # Arguments
///
/// * `client` - The HMC client.
/// * `pattern` - The user pattern with its full set of properties, or
///   `None` if it does not exist yet.
/// * `name` - The user pattern name.
/// * `input` - The `properties` module parameter.
pub fn process_user_pattern_properties(
    client: &dyn HmcClient,
    pattern: Option<&Resource>,
    name: &str,
    input: &Properties,
) -> Result<PropertyChanges> {
    let mut changes = PropertyChanges::new();
    if pattern.is_none() {
        changes.create.insert("name".to_string(), json!(name));
    }
    changes.merge(process_properties(
        &USER_PATTERN_PROPERTIES,
        input,
        pattern.map(|p| &p.properties),
        &ARTIFICIAL_PROPERTIES,
    )?);
    if changes.requires_deactivation {
        return Err(Error::unexpected(
            "User pattern properties cannot require deactivation",
        ));
    }

    let set = |hmc_name: &str, value: Value, changes: &mut PropertyChanges| match pattern {
        None => {
            if !value.is_null() {
                changes.create.insert(hmc_name.to_string(), value);
            }
        }
        Some(pattern) => {
            if pattern.prop(hmc_name).unwrap_or(&Value::Null) != &value {
                changes.update.insert(hmc_name.to_string(), value);
            }
        }
    };

    for (prop_name, uri_name, class) in REFERENCES {
        let Some(value) = input.get(prop_name) else {
            continue;
        };
        let uri = match value {
            Value::Null => Value::Null,
            Value::String(s) if s.is_empty() => Value::Null,
            Value::String(s) => json!(uri_by_name(
                client,
                class,
                s,
                &format!("property '{}'", prop_name)
            )?),
            other => {
                return Err(Error::parameter(format!(
                    "Property '{}' must be a string, but is: {}",
                    prop_name,
                    repr(other)
                )))
            }
        };
        set(uri_name, uri, &mut changes);
    }

    if let Some(value) = input.get(MAPPINGS) {
        let mappings = mappings_to_hmc(client, value)?;
        set("ldap-group-to-template-mappings", mappings, &mut changes);
    }
    Ok(changes)
}

/// Build the user pattern that "Create User Pattern" would create, without
/// creating it.
pub fn check_mode_user_pattern(create: &Properties, update: &Properties) -> Result<Resource> {
    let mut input = create.clone();
    input.extend(update.clone());
    if !input.contains_key("name") {
        return Err(ClientError::http(
            400,
            4,
            "Required input properties missing for Create User Pattern: ['name']",
        )
        .into());
    }
    let mut props = json!({
        "description": "",
        "domain-name-restrictions": null,
        "domain-name-restrictions-ldap-server-definition-uri": null,
        "ldap-group-default-template-uri": null,
        "ldap-group-ldap-server-definition-uri": null,
        "ldap-group-to-template-mappings": null,
        "ldap-server-definition-uri": null,
        "specific-template-uri": null,
        "template-name-override": null,
        "template-name-override-default-template-uri": null,
        "template-name-override-ldap-server-definition-uri": null,
        "user-template-uri": null,
        "replication-overwrite-possible": false,
        "search-order-index": 0,
    })
    .as_object()
    .cloned()
    .unwrap_or_default();
    props.extend(input);

    let oid = Uuid::new_v4().to_string();
    let uri = format!("/api/user-patterns/{}", oid);
    props.insert("object-id".to_string(), json!(oid));
    props.insert("object-uri".to_string(), json!(uri));
    props.insert("parent".to_string(), json!(CONSOLE_URI));
    props.insert("class".to_string(), json!("user-pattern"));
    Ok(Resource::new(
        uri,
        ResourceClass::UserPattern,
        Some(CONSOLE_URI.to_string()),
        props,
    ))
}

fn name_of(client: &dyn HmcClient, uri: Option<&Value>) -> Result<Value> {
    match uri.and_then(Value::as_str) {
        Some(uri) => Ok(json!(client.get(uri)?.name())),
        None => Ok(Value::Null),
    }
}

/// Build the module result from the user pattern properties: underscored
/// names, plus the names of the referenced objects.
fn pattern_result(client: &dyn HmcClient, props: &Properties) -> Result<Properties> {
    let mut result = underscore_properties(props);
    for (prop_name, uri_name, _) in REFERENCES {
        if props.contains_key(uri_name) {
            result.insert(prop_name.to_string(), name_of(client, props.get(uri_name))?);
        }
    }
    if let Some(Value::Array(mappings)) = result.get_mut(MAPPINGS) {
        for mapping in mappings.iter_mut() {
            if let Value::Object(mapping) = mapping {
                let name = name_of(client, mapping.get("template-uri"))?;
                mapping.insert("template-name".to_string(), name);
            }
        }
    }
    Ok(result)
}

fn ensure_present(
    client: &dyn HmcClient,
    params: &UserPatternParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let input = params.properties.clone().unwrap_or_default();
    let existing = find_console_object_optional(client, ResourceClass::UserPattern, &params.name)?;

    let (changed, props) = match existing {
        None => {
            let changes = process_user_pattern_properties(client, None, &params.name, &input)?;
            let update = changes.update_after_create();
            let pattern = if check_mode {
                check_mode_user_pattern(&changes.create, &update)?
            } else {
                let pattern = client.create(
                    ResourceClass::UserPattern,
                    Some(CONSOLE_URI),
                    &changes.create,
                )?;
                if !update.is_empty() {
                    client.update(&pattern.uri, &update)?;
                }
                client.get(&pattern.uri)?
            };
            (true, pattern.properties)
        }
        Some(mut pattern) => {
            client.pull_properties(&mut pattern)?;
            let changes =
                process_user_pattern_properties(client, Some(&pattern), &params.name, &input)?;
            if !changes.create.is_empty() {
                return Err(Error::unexpected(format!(
                    "Unexpected create properties for existing user pattern: {:?}",
                    changes.create.keys().collect::<Vec<_>>()
                )));
            }
            if changes.update.is_empty() {
                (false, pattern.properties)
            } else {
                debug!(
                    "Existing user pattern '{}' needs to get properties updated: {:?}",
                    params.name,
                    changes.update.keys().collect::<Vec<_>>()
                );
                if check_mode {
                    pattern.update_local(&changes.update);
                } else {
                    client.update(&pattern.uri, &changes.update)?;
                    client.pull_properties(&mut pattern)?;
                }
                (true, pattern.properties)
            }
        }
    };
    Ok(ModuleOutput::new(changed, pattern_result(client, &props)?))
}

fn ensure_absent(
    client: &dyn HmcClient,
    params: &UserPatternParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let Some(pattern) =
        find_console_object_optional(client, ResourceClass::UserPattern, &params.name)?
    else {
        return Ok(ModuleOutput::new(false, json!({})));
    };
    if !check_mode {
        client.delete(&pattern.uri)?;
    }
    Ok(ModuleOutput::new(true, json!({})))
}

fn facts(client: &dyn HmcClient, params: &UserPatternParams) -> Result<ModuleOutput> {
    let pattern = find_console_object(client, ResourceClass::UserPattern, &params.name)?;
    let pattern = client.get(&pattern.uri)?;
    Ok(ModuleOutput::new(
        false,
        pattern_result(client, &pattern.properties)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zhmc_session::FakedHmc;

    fn props(value: Value) -> Properties {
        value.as_object().unwrap().clone()
    }

    fn setup() -> FakedHmc {
        let hmc = FakedHmc::new();
        hmc.add_console_object(
            ResourceClass::User,
            props(json!({"name": "tmpl-ops", "type": "template"})),
        )
        .unwrap();
        hmc.add_console_object(
            ResourceClass::LdapServerDefinition,
            props(json!({"name": "corp-ldap"})),
        )
        .unwrap();
        hmc
    }

    fn params(state: &str, properties: Value) -> Properties {
        props(json!({"name": "ops-pattern", "state": state, "properties": properties}))
    }

    #[test]
    fn test_create_resolves_names() {
        let hmc = setup();
        let input = json!({
            "pattern": "ops.*",
            "type": "regular-expression",
            "retention_time": "7",
            "user_template_name": "tmpl-ops",
            "ldap_server_definition_name": "corp-ldap",
        });
        let output = run(&hmc, &params("present", input.clone()), false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["retention_time"], 7);
        assert_eq!(output.result["user_template_name"], "tmpl-ops");
        assert_eq!(output.result["ldap_server_definition_name"], "corp-ldap");
        assert!(output.result["user_template_uri"]
            .as_str()
            .unwrap()
            .starts_with("/api/users/"));

        let output = run(&hmc, &params("present", input), false).unwrap();
        assert!(!output.changed);
    }

    #[test]
    fn test_clear_reference() {
        let hmc = setup();
        let input = json!({"pattern": "ops.*", "type": "glob-like", "user_template_name": "tmpl-ops"});
        run(&hmc, &params("present", input), false).unwrap();
        let input = json!({"user_template_name": null});
        let output = run(&hmc, &params("present", input), false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["user_template_name"], Value::Null);
    }

    #[test]
    fn test_unknown_reference() {
        let hmc = setup();
        let input = json!({"ldap_server_definition_name": "nope"});
        let err = run(&hmc, &params("present", input), false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "LDAP Server Definition 'nope' specified in property \
             'ldap_server_definition_name' does not exist."
        );
    }

    #[test]
    fn test_template_mappings() {
        let hmc = setup();
        let input = json!({
            "ldap_group_to_template_mappings": [{"ldap_group_name": "ops", "template_name": "tmpl-ops"}],
        });
        let output = run(&hmc, &params("present", input), true).unwrap();
        assert_eq!(
            output.result["ldap_group_to_template_mappings"][0]["template-name"],
            "tmpl-ops"
        );
        assert_eq!(
            output.result["ldap_group_to_template_mappings"][0]["ldap-group-name"],
            "ops"
        );
        assert!(hmc.mutations().is_empty());

        let input = json!({"ldap_group_to_template_mappings": [{"template_uri": "/api/users/1"}]});
        let err = run(&hmc, &params("present", input), true).unwrap_err();
        assert_eq!(err.class_name(), "ParameterError");
    }
}
