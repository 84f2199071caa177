//! The `zhmc_user` module: HMC users.
//!
//! The objects a user references are given by name through artificial
//! properties (`user_role_names`, `password_rule_name`,
//! `ldap_server_definition_name`, `user_pattern_name`,
//! `default_group_name`). The result carries their names again, and with
//! `expand` the referenced objects. The write-only `password` is never
//! returned.

use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use zhmc_core::property::process_properties;
use zhmc_core::tables::USER_PROPERTIES;
use zhmc_core::utils::{blanked_dict, removed_dict};
use zhmc_core::{
    ClientError, Error, Filter, HmcClient, Operation, Properties, PropertyChanges, Resource,
    ResourceClass, Result, CONSOLE_URI,
};

use crate::lookup::{console_object_uri, find_console_object, find_console_object_optional};
use crate::module::ModuleOutput;
use crate::params::parse_params;

const ARTIFICIAL_PROPERTIES: [&str; 5] = [
    "user_role_names",
    "user_pattern_name",
    "password_rule_name",
    "ldap_server_definition_name",
    "default_group_name",
];

/// Properties that are accepted as input but never returned.
const WRITE_ONLY_PROPERTIES: [&str; 1] = ["password"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum UserState {
    Absent,
    Present,
    Facts,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserParams {
    name: String,
    state: UserState,
    #[serde(default)]
    properties: Option<Properties>,
    #[serde(default)]
    expand: bool,
}

/// The changes to apply to a user.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    /// Property changes.
    pub properties: PropertyChanges,

    /// User roles to add.
    pub add_roles: Vec<Resource>,

    /// User roles to remove.
    pub remove_roles: Vec<Resource>,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: UserParams = parse_params(params)?;
    match params.state {
        UserState::Absent => ensure_absent(client, &params, check_mode),
        UserState::Present => ensure_present(client, &params, check_mode),
        UserState::Facts => facts(client, &params),
    }
}

/// Set a reference property to a URI, on creation or when it differs.
fn set_reference(
    changes: &mut PropertyChanges,
    user: Option<&Resource>,
    hmc_name: &str,
    uri: Value,
) {
    match user {
        None => {
            changes.create.insert(hmc_name.to_string(), uri);
        }
        Some(user) => {
            if user.prop(hmc_name).unwrap_or(&Value::Null) != &uri {
                changes.update.insert(hmc_name.to_string(), uri);
            }
        }
    }
}

/// Compute the changes for a user.
///
/// # Arguments
///
/// * `client` - The HMC client.
/// * `user` - The user with its full set of properties, or `None` if it
///   does not exist yet.
/// * `name` - The user name.
/// * `input` - The `properties` module parameter.
pub fn process_user_properties(
    client: &dyn HmcClient,
    user: Option<&Resource>,
    name: &str,
    input: &Properties,
) -> Result<UserChanges> {
    let mut changes = UserChanges::default();
    if user.is_none() {
        changes
            .properties
            .create
            .insert("name".to_string(), json!(name));
    }
    changes.properties.merge(process_properties(
        &USER_PROPERTIES,
        input,
        user.map(|u| &u.properties),
        &ARTIFICIAL_PROPERTIES,
    )?);
    if changes.properties.requires_deactivation {
        return Err(Error::unexpected("User properties cannot require deactivation"));
    }

    if let Some(value) = input.get("user_role_names") {
        let role_names: Vec<String> = serde_json::from_value(value.clone()).map_err(|_| {
            Error::parameter(format!(
                "Property 'user_role_names' must be a list of user role names, but is: {}",
                value
            ))
        })?;
        let all_roles = client.list(ResourceClass::UserRole, Some(CONSOLE_URI), &Filter::all())?;
        let mut roles = Vec::new();
        for role_name in &role_names {
            let role = all_roles
                .iter()
                .find(|r| r.name() == role_name)
                .ok_or_else(|| {
                    Error::parameter(format!(
                        "User role '{}' specified in parameter 'user_role_names' does not exist.",
                        role_name
                    ))
                })?;
            roles.push(role.clone());
        }
        match user {
            None => changes.add_roles = roles,
            Some(user) => {
                let current_uris = user.str_list_prop("user-roles");
                let current: Vec<&Resource> = all_roles
                    .iter()
                    .filter(|r| current_uris.contains(&r.uri))
                    .collect();
                changes.remove_roles = current
                    .iter()
                    .filter(|r| !role_names.iter().any(|n| n == r.name()))
                    .map(|r| (*r).clone())
                    .collect();
                changes.add_roles = roles
                    .into_iter()
                    .filter(|r| !current.iter().any(|c| c.name() == r.name()))
                    .collect();
            }
        }
    }

    let references = [
        ("user_pattern_name", ResourceClass::UserPattern, "User pattern", "user-pattern-uri"),
        ("password_rule_name", ResourceClass::PasswordRule, "Password rule", "password-rule-uri"),
        (
            "ldap_server_definition_name",
            ResourceClass::LdapServerDefinition,
            "LDAP server definition",
            "ldap-server-definition-uri",
        ),
    ];
    for (prop_name, class, label, hmc_name) in references {
        if let Some(value) = input.get(prop_name) {
            let uri = console_object_uri(client, class, label, prop_name, value)?;
            set_reference(&mut changes.properties, user, hmc_name, uri);
        }
    }

    if let Some(value) = input.get("default_group_name") {
        if !value.is_null() {
            return Err(Error::parameter(format!(
                "Property 'default_group_name' cannot be set, because groups are not \
                 supported: {}",
                value
            )));
        }
        set_reference(&mut changes.properties, user, "default-group-uri", Value::Null);
    }
    Ok(changes)
}

fn quoted_list(names: &[&str]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
    format!("[{}]", quoted.join(", "))
}

/// Build the user that "Create User" would create, without creating it.
/// Used in check mode.
///
/// Fails the way the HMC does (HTTP 400.4) if required properties are
/// missing.
pub fn check_mode_user(create: &Properties, update: &Properties) -> Result<Resource> {
    let mut input = create.clone();
    input.extend(update.clone());
    let str_of = |name: &str| input.get(name).and_then(Value::as_str).unwrap_or("").to_string();

    let mut missing = Vec::new();
    for name in ["name", "type", "authentication-type"] {
        if !input.contains_key(name) {
            missing.push(name);
        }
    }
    let name = str_of("name");
    let user_type = str_of("type");
    let auth_type = str_of("authentication-type");
    let required: &[&str] = match auth_type.as_str() {
        "local" => &["password-rule-uri", "password"],
        "ldap" => &["ldap-server-definition-uri"],
        _ => &[],
    };
    missing.extend(required.iter().filter(|n| !input.contains_key(**n)));
    let mfa_server = matches!(
        input.get("mfa-types"),
        Some(Value::Array(types)) if types.contains(&json!("mfa-server"))
    );
    if mfa_server {
        for name in ["primary-mfa-server-definition-uri", "mfa-policy"] {
            if !input.contains_key(name) {
                missing.push(name);
            }
        }
    }
    if !missing.is_empty() {
        return Err(ClientError::http(
            400,
            4,
            format!(
                "Required input properties missing for Create User: {}",
                quoted_list(&missing)
            ),
        )
        .into());
    }

    let mut props = json!({
        "description": "",
        "session-timeout": 0,
        "verify-timeout": 15,
        "idle-timeout": 0,
        "max-failed-logins": 3,
        "disable-delay": 1,
        "inactivity-timeout": 0,
        "disruptive-pw-required": true,
        "disruptive-text-required": false,
        "allow-remote-access": false,
        "allow-management-interfaces": false,
        "max-web-services-api-sessions": 100,
        "web-services-api-session-idle-timeout": 360,
        "user-roles": [],
        "default-group-uri": null,
        "replication-overwrite-possible": false,
        "multi-factor-authentication-required": false,
        "email-address": null,
        "mfa-types": null,
    })
    .as_object()
    .cloned()
    .unwrap_or_default();
    let mut set = |name: &str, value: Value| {
        props.insert(name.to_string(), value);
    };
    match user_type.as_str() {
        "pattern-based" => set("user-pattern-uri", Value::Null),
        "template" => set("user-template-uri", Value::Null),
        _ => {}
    }
    if user_type != "template" {
        set("disabled", json!(false));
    }
    if auth_type == "local" {
        set("password-rule-uri", Value::Null);
        set("password-expires", Value::Null);
        set("force-password-change", json!(true));
        set("min-pw-change-time", json!(0));
    }
    if auth_type == "ldap" {
        set("ldap-server-definition-uri", Value::Null);
        if user_type != "template" {
            set("userid-on-ldap-server", json!(""));
        }
    }
    if input.get("multi-factor-authentication-required") == Some(&json!(true)) {
        set("force-shared-secret-key-change", json!(false));
    }
    if mfa_server {
        set("primary-mfa-server-definition-uri", Value::Null);
        set("backup-mfa-server-definition-uri", Value::Null);
        set("mfa-policy", Value::Null);
        if user_type == "template" {
            set("mfa-userid-override", Value::Null);
        } else {
            set("mfa-userid", json!(name));
        }
    }
    props.extend(input);

    let oid = Uuid::new_v4().to_string();
    let uri = format!("/api/users/{}", oid);
    props.insert("object-id".to_string(), json!(oid));
    props.insert("object-uri".to_string(), json!(uri));
    props.insert("parent".to_string(), json!(CONSOLE_URI));
    props.insert("class".to_string(), json!("user"));
    Ok(Resource::new(
        uri,
        ResourceClass::User,
        Some(CONSOLE_URI.to_string()),
        props,
    ))
}

/// Add the names (and with `expand`, the properties) of the objects a user
/// references to its properties.
pub fn add_artificial_properties(
    client: &dyn HmcClient,
    result: &mut Properties,
    user: &Resource,
    expand: bool,
) -> Result<()> {
    let user_type = user.str_prop("type").unwrap_or("");
    let auth_type = user.str_prop("authentication-type").unwrap_or("");
    let references = [
        (user_type == "pattern-based", "user-pattern"),
        (auth_type == "local", "password-rule"),
        (auth_type == "ldap", "ldap-server-definition"),
    ];
    for (applies, base) in references {
        let uri_prop = format!("{}-uri", base);
        let name_prop = format!("{}-name", base);
        let referenced = match user.str_prop(&uri_prop) {
            Some(uri) if applies => Some(client.get(uri)?),
            _ => None,
        };
        match referenced {
            Some(object) => {
                result.insert(name_prop, json!(object.name()));
                if expand {
                    result.insert(base.to_string(), Value::Object(object.properties));
                }
            }
            None if user.properties.contains_key(&uri_prop) => {
                result.insert(name_prop, Value::Null);
                if expand {
                    result.insert(base.to_string(), Value::Null);
                }
            }
            None => {}
        }
    }

    let role_uris = match result.get("user-roles") {
        Some(Value::Array(uris)) => uris
            .iter()
            .filter_map(|u| u.as_str().map(str::to_string))
            .collect(),
        _ => user.str_list_prop("user-roles"),
    };
    let mut names = Vec::new();
    let mut objects = Vec::new();
    for uri in &role_uris {
        let role = client.get(uri)?;
        names.push(json!(role.name()));
        objects.push(Value::Object(role.properties));
    }
    result.insert("user-role-names".to_string(), Value::Array(names));
    if expand {
        result.insert("user-role-objects".to_string(), Value::Array(objects));
    }
    Ok(())
}

fn add_role(client: &dyn HmcClient, user: &Resource, role: &Resource, check_mode: bool) -> Result<()> {
    debug!("Adding role '{}' to user '{}'", role.name(), user.name());
    if !check_mode {
        client.invoke(
            &user.uri,
            &Operation::AddUserRole {
                user_role_uri: role.uri.clone(),
            },
        )?;
    }
    Ok(())
}

/// Add a user role URI to the `user-roles` property of a result.
fn push_role_uri(result: &mut Properties, uri: &str) {
    match result.get_mut("user-roles") {
        Some(Value::Array(uris)) => uris.push(json!(uri)),
        _ => {
            result.insert("user-roles".to_string(), json!([uri]));
        }
    }
}

fn ensure_present(
    client: &dyn HmcClient,
    params: &UserParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let input = params.properties.clone().unwrap_or_default();
    let existing = find_console_object_optional(client, ResourceClass::User, &params.name)?;

    let mut changed = false;
    let (user, mut result) = match existing {
        None => {
            let changes = process_user_properties(client, None, &params.name, &input)?;
            let update = changes.properties.update_after_create();
            let user = if check_mode {
                check_mode_user(&changes.properties.create, &update)?
            } else {
                let user = client.create(
                    ResourceClass::User,
                    Some(CONSOLE_URI),
                    &changes.properties.create,
                )?;
                if !update.is_empty() {
                    client.update(&user.uri, &update)?;
                }
                client.get(&user.uri)?
            };
            let mut result = user.properties.clone();
            changed = true;
            for role in &changes.add_roles {
                add_role(client, &user, role, check_mode)?;
                push_role_uri(&mut result, &role.uri);
            }
            if !changes.remove_roles.is_empty() {
                return Err(Error::unexpected(format!(
                    "Unexpected attempt to remove user roles from newly created user '{}'",
                    user.name()
                )));
            }
            (user, result)
        }
        Some(mut user) => {
            client.pull_properties(&mut user)?;
            let mut result = user.properties.clone();
            let changes = process_user_properties(client, Some(&user), &params.name, &input)?;
            if !changes.properties.create.is_empty() {
                return Err(Error::unexpected(format!(
                    "Unexpected create properties for existing user: {:?}",
                    changes.properties.create.keys().collect::<Vec<_>>()
                )));
            }
            let update = &changes.properties.update;
            if !update.is_empty() {
                debug!(
                    "Existing user '{}' needs to get properties updated: {}",
                    params.name,
                    Value::Object(blanked_dict(update, &WRITE_ONLY_PROPERTIES))
                );
                if check_mode {
                    result.extend(update.clone());
                } else {
                    client.update(&user.uri, update)?;
                    client.pull_properties(&mut user)?;
                    result = user.properties.clone();
                }
                changed = true;
            }
            for role in &changes.add_roles {
                add_role(client, &user, role, check_mode)?;
                push_role_uri(&mut result, &role.uri);
                changed = true;
            }
            for role in &changes.remove_roles {
                debug!("Removing role '{}' from user '{}'", role.name(), params.name);
                if !check_mode {
                    client.invoke(
                        &user.uri,
                        &Operation::RemoveUserRole {
                            user_role_uri: role.uri.clone(),
                        },
                    )?;
                }
                if let Some(Value::Array(uris)) = result.get_mut("user-roles") {
                    uris.retain(|uri| uri != &json!(role.uri));
                }
                changed = true;
            }
            (user, result)
        }
    };

    add_artificial_properties(client, &mut result, &user, params.expand)?;
    let result = removed_dict(&result, &WRITE_ONLY_PROPERTIES);
    Ok(ModuleOutput::new(changed, result))
}

fn ensure_absent(
    client: &dyn HmcClient,
    params: &UserParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let Some(user) = find_console_object_optional(client, ResourceClass::User, &params.name)?
    else {
        return Ok(ModuleOutput::new(false, json!({})));
    };
    if !check_mode {
        client.delete(&user.uri)?;
    }
    Ok(ModuleOutput::new(true, json!({})))
}

fn facts(client: &dyn HmcClient, params: &UserParams) -> Result<ModuleOutput> {
    let user = find_console_object(client, ResourceClass::User, &params.name)?;
    let user = client.get(&user.uri)?;
    let mut result = user.properties.clone();
    add_artificial_properties(client, &mut result, &user, params.expand)?;
    let result = removed_dict(&result, &WRITE_ONLY_PROPERTIES);
    Ok(ModuleOutput::new(false, result))
}
