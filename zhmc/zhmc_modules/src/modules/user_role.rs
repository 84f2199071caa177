//! The `zhmc_user_role` module: HMC user roles.
//!
//! Permissions are given as a list of items, each naming the permitted
//! object in one of these forms:
//!
//! * `{class}` - all objects of a resource class
//! * `{cpc}` - a CPC
//! * `{task, view_only?}` - an HMC task
//! * `{partition, cpc}`, `{logical_partition, cpc}`, `{adapter, cpc}`,
//!   `{storage_group, cpc}` - an object of a CPC
//!
//! They are reconciled with the current permissions of the role through
//! "Add Permission to User Role" and "Remove Permission from User Role".

use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use uuid::Uuid;

use zhmc_core::property::process_properties;
use zhmc_core::tables::USER_ROLE_PROPERTIES;
use zhmc_core::utils::repr;
use zhmc_core::{
    ClientError, Error, Filter, HmcClient, Operation, Properties, PropertyChanges, Resource,
    ResourceClass, Result, CONSOLE_URI,
};

use crate::lookup::{
    find_console_object, find_console_object_optional, find_cpc, not_found_as_parameter_error,
};
use crate::module::ModuleOutput;
use crate::params::parse_params;

const ARTIFICIAL_PROPERTIES: [&str; 2] = ["associated_system_defined_user_role_name", "permissions"];

/// The system-defined role new user roles are associated with by default.
const DEFAULT_SYSTEM_ROLE: &str = "hmc-operator-tasks";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum UserRoleState {
    Absent,
    Present,
    Facts,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UserRoleParams {
    name: String,
    state: UserRoleState,
    #[serde(default)]
    properties: Option<Properties>,
}

/// A permission of a user role.
#[derive(Debug, Clone, PartialEq)]
pub struct Permission {
    /// URI of the permitted object, or the permitted resource class.
    pub permitted_object: String,

    /// The permitted object is a resource class.
    pub is_class: bool,

    /// Permission options (`view-only-mode`, `include-members`).
    pub options: Properties,

    /// The permission as returned in the module result.
    pub item: Value,
}

impl Permission {
    fn object(resource: &Resource, item: Value, options: Properties) -> Self {
        Self {
            permitted_object: resource.uri.clone(),
            is_class: false,
            options,
            item,
        }
    }

    /// The permission in the HMC notation of the permission operations.
    pub fn hmc_permission(&self) -> Properties {
        let mut permission = Properties::new();
        permission.insert("permitted-object".to_string(), json!(self.permitted_object));
        permission.insert(
            "permitted-object-type".to_string(),
            json!(if self.is_class { "object-class" } else { "object" }),
        );
        permission.extend(self.options.clone());
        permission
    }
}

/// The changes to apply to a user role.
#[derive(Debug, Clone, Default)]
pub struct UserRoleChanges {
    /// Property changes.
    pub properties: PropertyChanges,

    /// The current permissions.
    pub current: Vec<Permission>,

    /// Permissions to add.
    pub add: Vec<Permission>,

    /// Permissions to remove.
    pub remove: Vec<Permission>,
}

impl UserRoleChanges {
    /// The permissions after applying the changes.
    pub fn resulting_permissions(&self) -> Vec<Permission> {
        let mut permissions: Vec<Permission> = self
            .current
            .iter()
            .filter(|p| !self.remove.iter().any(|r| r.permitted_object == p.permitted_object))
            .cloned()
            .collect();
        permissions.extend(self.add.iter().cloned());
        permissions
    }
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: UserRoleParams = parse_params(params)?;
    match params.state {
        UserRoleState::Absent => ensure_absent(client, &params, check_mode),
        UserRoleState::Present => ensure_present(client, &params, check_mode),
        UserRoleState::Facts => facts(client, &params),
    }
}

/// The CPC a CPC child object belongs to.
fn owning_cpc(client: &dyn HmcClient, resource: &Resource) -> Result<Resource> {
    let cpc_uri = match resource.class {
        ResourceClass::StorageGroup => resource.str_prop("cpc-uri").map(str::to_string),
        _ => resource.parent.clone(),
    };
    let cpc_uri = cpc_uri.ok_or_else(|| {
        Error::unexpected(format!("{} {} has no CPC", resource.class, resource.uri))
    })?;
    client.get(&cpc_uri)
}

/// Convert permissions in HMC notation into permissions.
///
/// Fails if a permitted object does not exist.
pub fn current_permissions(
    client: &dyn HmcClient,
    hmc_permissions: &[Value],
) -> Result<Vec<Permission>> {
    let mut permissions = Vec::with_capacity(hmc_permissions.len());
    for hmc_permission in hmc_permissions {
        let permitted_object = hmc_permission
            .get("permitted-object")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::unexpected(format!("Invalid permission on HMC: {}", hmc_permission))
            })?;
        let mut options = Properties::new();
        let mut result_options = Properties::new();
        for (hmc_name, item_name) in [
            ("view-only-mode", "view_only"),
            ("include-members", "include_members"),
        ] {
            if let Some(value) = hmc_permission.get(hmc_name) {
                options.insert(hmc_name.to_string(), value.clone());
                result_options.insert(item_name.to_string(), value.clone());
            }
        }

        if hmc_permission.get("permitted-object-type").and_then(Value::as_str)
            == Some("object-class")
        {
            let mut item = json!({"class": permitted_object});
            extend_item(&mut item, result_options);
            permissions.push(Permission {
                permitted_object: permitted_object.to_string(),
                is_class: true,
                options,
                item,
            });
            continue;
        }

        let resource = client.get(permitted_object)?;
        let mut item = match resource.class {
            ResourceClass::Cpc => json!({"cpc": resource.name()}),
            ResourceClass::Task => json!({"task": resource.name()}),
            ResourceClass::Partition
            | ResourceClass::Lpar
            | ResourceClass::Adapter
            | ResourceClass::StorageGroup => {
                let key = match resource.class {
                    ResourceClass::Partition => "partition",
                    ResourceClass::Lpar => "logical_partition",
                    ResourceClass::Adapter => "adapter",
                    _ => "storage_group",
                };
                let cpc = owning_cpc(client, &resource)?;
                json!({key: resource.name(), "cpc": cpc.name()})
            }
            _ => {
                return Err(Error::parameter(format!(
                    "Resource with URI '{}' not supported for user role permissions",
                    permitted_object
                )))
            }
        };
        extend_item(&mut item, result_options);
        permissions.push(Permission::object(&resource, item, options));
    }
    Ok(permissions)
}

fn extend_item(item: &mut Value, options: Properties) {
    if let Value::Object(map) = item {
        map.extend(options);
    }
}

fn string_item(item: &Properties, key: &str) -> Result<String> {
    match item.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(Error::parameter(format!(
            "Item '{}' in permission item must be a string, but is: {}",
            key,
            repr(other)
        ))),
        None => Err(Error::unexpected(format!("Permission item has no '{}'", key))),
    }
}

fn find_in_cpc(
    client: &dyn HmcClient,
    class: ResourceClass,
    cpc: &Resource,
    name: &str,
) -> Result<Resource> {
    match class {
        ResourceClass::StorageGroup => client.find_by(
            class,
            Some(CONSOLE_URI),
            &Filter::by_name(name).with("cpc-uri", cpc.uri.clone()),
        ),
        _ => client.find(class, Some(&cpc.uri), name),
    }
}

/// Convert the `permissions` input property into permissions.
///
/// Fails with a parameter error for invalid permission items or permitted
/// objects that do not exist.
pub fn target_permissions(client: &dyn HmcClient, input: &Value) -> Result<Vec<Permission>> {
    let items = input.as_array().ok_or_else(|| {
        Error::parameter(format!(
            "Property 'permissions' must be a list of permission items, but is: {}",
            repr(input)
        ))
    })?;

    let mut permissions = Vec::with_capacity(items.len());
    for item in items {
        let item = item.as_object().ok_or_else(|| {
            Error::parameter(format!("Invalid permission item for user role: {}", repr(item)))
        })?;
        let keys: BTreeSet<&str> = item.keys().map(String::as_str).collect();
        let invalid = || {
            Error::parameter(format!(
                "Invalid combination of resources for permitted object for user role: {}",
                Value::Object(item.clone())
            ))
        };

        let permission = if keys == BTreeSet::from(["class"]) {
            let class = string_item(item, "class")?;
            Permission {
                permitted_object: class.clone(),
                is_class: true,
                options: Properties::new(),
                item: json!({"class": class}),
            }
        } else if keys == BTreeSet::from(["cpc"]) {
            let cpc_name = string_item(item, "cpc")?;
            let cpc = not_found_as_parameter_error(find_cpc(client, &cpc_name), || {
                format!("CPC '{}' specified in permission item does not exist.", cpc_name)
            })?;
            Permission::object(&cpc, json!({"cpc": cpc_name}), Properties::new())
        } else if keys.contains("task") {
            let task_name = string_item(item, "task")?;
            let extra: Vec<&&str> = keys
                .iter()
                .filter(|k| !matches!(**k, "task" | "view_only"))
                .collect();
            if !extra.is_empty() {
                return Err(Error::parameter(format!(
                    "Invalid additional items in permission item for task '{}': {:?}",
                    task_name, extra
                )));
            }
            let task = not_found_as_parameter_error(
                find_console_object(client, ResourceClass::Task, &task_name),
                || format!("Task '{}' specified in permission item does not exist.", task_name),
            )?;
            let mut options = Properties::new();
            let mut result = json!({"task": task_name});
            match item.get("view_only") {
                None | Some(Value::Null) => {}
                Some(Value::Bool(view_only)) => {
                    options.insert("view-only-mode".to_string(), json!(view_only));
                    result["view_only"] = json!(view_only);
                }
                Some(other) => {
                    return Err(Error::parameter(format!(
                        "Item 'view_only' in permission item for task '{}' must be a boolean, \
                         but is: {}",
                        task_name,
                        repr(other)
                    )))
                }
            }
            Permission::object(&task, result, options)
        } else if keys.len() == 2 && keys.contains("cpc") {
            let (key, class) = if keys.contains("partition") {
                ("partition", ResourceClass::Partition)
            } else if keys.contains("logical_partition") {
                ("logical_partition", ResourceClass::Lpar)
            } else if keys.contains("adapter") {
                ("adapter", ResourceClass::Adapter)
            } else if keys.contains("storage_group") {
                ("storage_group", ResourceClass::StorageGroup)
            } else {
                return Err(invalid());
            };
            let cpc_name = string_item(item, "cpc")?;
            let name = string_item(item, key)?;
            let cpc = not_found_as_parameter_error(find_cpc(client, &cpc_name), || {
                format!("CPC '{}' specified in permission item does not exist.", cpc_name)
            })?;
            let resource = not_found_as_parameter_error(
                find_in_cpc(client, class, &cpc, &name),
                || {
                    format!(
                        "{} '{}' on CPC '{}' specified in permission item does not exist.",
                        class.display_name(),
                        name,
                        cpc_name
                    )
                },
            )?;
            Permission::object(&resource, json!({key: name, "cpc": cpc_name}), Properties::new())
        } else {
            return Err(invalid());
        };
        permissions.push(permission);
    }
    Ok(permissions)
}

/// Compute the changes for a user role.
///
/// # Arguments
///
/// * `client` - The HMC client.
/// * `role` - The user role with its full set of properties, or `None` if
///   it does not exist yet.
/// * `name` - The user role name.
/// * `input` - The `properties` module parameter.
pub fn process_user_role_properties(
    client: &dyn HmcClient,
    role: Option<&Resource>,
    name: &str,
    input: &Properties,
) -> Result<UserRoleChanges> {
    let mut changes = UserRoleChanges::default();
    if role.is_none() {
        changes
            .properties
            .create
            .insert("name".to_string(), json!(name));
    }
    changes.properties.merge(process_properties(
        &USER_ROLE_PROPERTIES,
        input,
        role.map(|r| &r.properties),
        &ARTIFICIAL_PROPERTIES,
    )?);
    if changes.properties.requires_deactivation {
        return Err(Error::unexpected(
            "User role properties cannot require deactivation",
        ));
    }

    if let Some(value) = input.get("associated_system_defined_user_role_name") {
        let system_role_name = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let system_role = not_found_as_parameter_error(
            find_console_object(client, ResourceClass::UserRole, &system_role_name),
            || {
                format!(
                    "Cannot find system-defined user role '{}' specified in the \
                     'associated_system_defined_user_role_name' input property.",
                    system_role_name
                )
            },
        )?;
        let uri = json!(system_role.uri);
        let hmc_name = "associated-system-defined-user-role-uri".to_string();
        match role {
            None => {
                changes.properties.create.insert(hmc_name, uri);
            }
            Some(role) => {
                if role.prop(&hmc_name) != Some(&uri) {
                    changes.properties.update.insert(hmc_name, uri);
                }
            }
        }
    }

    if let Some(role) = role {
        let hmc_permissions = match role.prop("permissions") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        changes.current = current_permissions(client, &hmc_permissions)?;
    }

    if let Some(value) = input.get("permissions") {
        let target = target_permissions(client, value)?;
        changes.add = target
            .iter()
            .filter(|t| {
                !changes
                    .current
                    .iter()
                    .any(|c| c.permitted_object == t.permitted_object)
            })
            .cloned()
            .collect();
        changes.remove = changes
            .current
            .iter()
            .filter(|c| !target.iter().any(|t| t.permitted_object == c.permitted_object))
            .cloned()
            .collect();
    }
    Ok(changes)
}

/// Build the user role that "Create User Role" would create, without
/// creating it.
pub fn check_mode_user_role(
    client: &dyn HmcClient,
    create: &Properties,
    update: &Properties,
) -> Result<Resource> {
    let mut input = create.clone();
    input.extend(update.clone());
    if !input.contains_key("name") {
        return Err(ClientError::http(
            400,
            4,
            "Required input properties missing for Create User Role: ['name']",
        )
        .into());
    }

    let system_role_uri = match input.get("associated-system-defined-user-role-uri") {
        Some(uri) => uri.clone(),
        None => json!(find_console_object(client, ResourceClass::UserRole, DEFAULT_SYSTEM_ROLE)?.uri),
    };
    let mut props = json!({
        "description": "",
        "associated-system-defined-user-role-uri": system_role_uri,
        "is-inheritance-enabled": false,
        "permissions": [],
        "type": "user-defined",
        "replication-overwrite-possible": true,
    })
    .as_object()
    .cloned()
    .unwrap_or_default();
    props.extend(input);

    let oid = Uuid::new_v4().to_string();
    let uri = format!("/api/user-roles/{}", oid);
    props.insert("object-id".to_string(), json!(oid));
    props.insert("object-uri".to_string(), json!(uri));
    props.insert("parent".to_string(), json!(CONSOLE_URI));
    props.insert("class".to_string(), json!("user-role"));
    Ok(Resource::new(
        uri,
        ResourceClass::UserRole,
        Some(CONSOLE_URI.to_string()),
        props,
    ))
}

/// Add the artificial properties to a user role result.
fn add_artificial_properties(
    client: &dyn HmcClient,
    result: &mut Properties,
    permissions: &[Permission],
) -> Result<()> {
    result.insert(
        "permissions".to_string(),
        Value::Array(permissions.iter().map(|p| p.item.clone()).collect()),
    );
    let system_role_name = match result
        .get("associated-system-defined-user-role-uri")
        .and_then(Value::as_str)
    {
        Some(uri) => json!(client.get(uri)?.name()),
        None => Value::Null,
    };
    result.insert(
        "associated-system-defined-user-role-name".to_string(),
        system_role_name,
    );
    Ok(())
}

fn apply_permission_changes(
    client: &dyn HmcClient,
    role: &Resource,
    changes: &UserRoleChanges,
    check_mode: bool,
) -> Result<()> {
    for permission in &changes.remove {
        debug!(
            "Removing permission {} from user role '{}'",
            permission.item,
            role.name()
        );
        if !check_mode {
            client.invoke(
                &role.uri,
                &Operation::RemovePermission {
                    permission: permission.hmc_permission(),
                },
            )?;
        }
    }
    for permission in &changes.add {
        debug!(
            "Adding permission {} to user role '{}'",
            permission.item,
            role.name()
        );
        if !check_mode {
            client.invoke(
                &role.uri,
                &Operation::AddPermission {
                    permission: permission.hmc_permission(),
                },
            )?;
        }
    }
    Ok(())
}

fn ensure_present(
    client: &dyn HmcClient,
    params: &UserRoleParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let input = params.properties.clone().unwrap_or_default();
    let existing = find_console_object_optional(client, ResourceClass::UserRole, &params.name)?;

    let (changed, mut result, permissions) = match existing {
        None => {
            let changes = process_user_role_properties(client, None, &params.name, &input)?;
            let update = changes.properties.update_after_create();
            let role = if check_mode {
                check_mode_user_role(client, &changes.properties.create, &update)?
            } else {
                let role = client.create(
                    ResourceClass::UserRole,
                    Some(CONSOLE_URI),
                    &changes.properties.create,
                )?;
                if !update.is_empty() {
                    client.update(&role.uri, &update)?;
                }
                role
            };
            apply_permission_changes(client, &role, &changes, check_mode)?;
            let props = if check_mode {
                role.properties
            } else {
                client.get(&role.uri)?.properties
            };
            (true, props, changes.resulting_permissions())
        }
        Some(mut role) => {
            client.pull_properties(&mut role)?;
            let changes = process_user_role_properties(client, Some(&role), &params.name, &input)?;
            let mut result = role.properties.clone();
            let mut changed = false;
            if !changes.properties.update.is_empty() {
                debug!(
                    "Existing user role '{}' needs to get properties updated: {:?}",
                    params.name,
                    changes.properties.update.keys().collect::<Vec<_>>()
                );
                if check_mode {
                    result.extend(changes.properties.update.clone());
                } else {
                    client.update(&role.uri, &changes.properties.update)?;
                }
                changed = true;
            }
            if !changes.add.is_empty() || !changes.remove.is_empty() {
                apply_permission_changes(client, &role, &changes, check_mode)?;
                changed = true;
            }
            if changed && !check_mode {
                client.pull_properties(&mut role)?;
                result = role.properties;
            }
            (changed, result, changes.resulting_permissions())
        }
    };
    add_artificial_properties(client, &mut result, &permissions)?;
    Ok(ModuleOutput::new(changed, result))
}

fn ensure_absent(
    client: &dyn HmcClient,
    params: &UserRoleParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let Some(role) = find_console_object_optional(client, ResourceClass::UserRole, &params.name)?
    else {
        return Ok(ModuleOutput::new(false, json!({})));
    };
    if !check_mode {
        client.delete(&role.uri)?;
    }
    Ok(ModuleOutput::new(true, json!({})))
}

fn facts(client: &dyn HmcClient, params: &UserRoleParams) -> Result<ModuleOutput> {
    let role = find_console_object(client, ResourceClass::UserRole, &params.name)?;
    let role = client.get(&role.uri)?;
    let hmc_permissions = match role.prop("permissions") {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    let permissions = current_permissions(client, &hmc_permissions)?;
    let mut result = role.properties;
    add_artificial_properties(client, &mut result, &permissions)?;
    Ok(ModuleOutput::new(false, result))
}
