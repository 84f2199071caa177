//! Shared flow of the modules for console-level objects that are fully
//! described by their property table (password rules, LDAP server
//! definitions).

use log::debug;
use serde_json::{json, Value};
use uuid::Uuid;

use zhmc_core::property::process_properties;
use zhmc_core::utils::removed_dict;
use zhmc_core::{
    ClientError, Error, HmcClient, Properties, PropertyChanges, PropertyTable, Resource,
    ResourceClass, Result, CONSOLE_URI,
};

use crate::lookup::{find_console_object, find_console_object_optional};
use crate::module::ModuleOutput;

/// A console-level object type managed by `ensure_present`,
/// `ensure_absent` and `facts`.
pub(crate) trait ConsoleObjectType {
    /// The resource class.
    const CLASS: ResourceClass;

    /// The property table.
    const TABLE: &'static PropertyTable;

    /// Name of the type in HMC operation names, e.g. "Password Rule".
    const OPERATION_NAME: &'static str;

    /// HMC names of properties that are never returned.
    const WRITE_ONLY: &'static [&'static str] = &[];

    /// HMC names of the properties "Create" requires, given the create
    /// properties.
    fn required_properties(input: &Properties) -> Vec<&'static str>;

    /// The properties "Create" defaults.
    fn default_properties() -> Value;
}

/// Compute the changes for an object of a console object type.
pub(crate) fn process_object_properties<T: ConsoleObjectType>(
    object: Option<&Resource>,
    name: &str,
    input: &Properties,
) -> Result<PropertyChanges> {
    let mut changes = PropertyChanges::new();
    if object.is_none() {
        changes.create.insert("name".to_string(), json!(name));
    }
    changes.merge(process_properties(
        T::TABLE,
        input,
        object.map(|o| &o.properties),
        &[],
    )?);
    if changes.requires_deactivation {
        return Err(Error::unexpected(format!(
            "{} properties cannot require deactivation",
            T::TABLE.resource
        )));
    }
    Ok(changes)
}

/// Build the object that "Create" would create, without creating it.
///
/// Fails the way the HMC does (HTTP 400.4) if required properties are
/// missing.
pub(crate) fn check_mode_object<T: ConsoleObjectType>(
    create: &Properties,
    update: &Properties,
) -> Result<Resource> {
    let mut input = create.clone();
    input.extend(update.clone());

    let missing: Vec<String> = T::required_properties(&input)
        .into_iter()
        .filter(|name| !input.contains_key(*name))
        .map(|name| format!("'{}'", name))
        .collect();
    if !missing.is_empty() {
        return Err(ClientError::http(
            400,
            4,
            format!(
                "Required input properties missing for Create {}: [{}]",
                T::OPERATION_NAME,
                missing.join(", ")
            ),
        )
        .into());
    }

    let mut props = match T::default_properties() {
        Value::Object(defaults) => defaults,
        _ => Properties::new(),
    };
    props.extend(input);
    let oid = Uuid::new_v4().to_string();
    let uri = format!("/api/{}/{}", T::CLASS.uri_segment(), oid);
    props.insert("object-id".to_string(), json!(oid));
    props.insert("object-uri".to_string(), json!(uri));
    props.insert("parent".to_string(), json!(CONSOLE_URI));
    props.insert("class".to_string(), json!(T::CLASS.as_str()));
    Ok(Resource::new(
        uri,
        T::CLASS,
        Some(CONSOLE_URI.to_string()),
        props,
    ))
}

/// Ensure that the object exists and has the given properties.
pub(crate) fn ensure_present<T: ConsoleObjectType>(
    client: &dyn HmcClient,
    name: &str,
    input: &Properties,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let existing = find_console_object_optional(client, T::CLASS, name)?;
    let (changed, result) = match existing {
        None => {
            let changes = process_object_properties::<T>(None, name, input)?;
            let update = changes.update_after_create();
            let object = if check_mode {
                check_mode_object::<T>(&changes.create, &update)?
            } else {
                let object = client.create(T::CLASS, Some(CONSOLE_URI), &changes.create)?;
                if !update.is_empty() {
                    client.update(&object.uri, &update)?;
                }
                client.get(&object.uri)?
            };
            (true, object.properties)
        }
        Some(mut object) => {
            client.pull_properties(&mut object)?;
            let mut result = object.properties.clone();
            let changes = process_object_properties::<T>(Some(&object), name, input)?;
            if !changes.create.is_empty() {
                return Err(Error::unexpected(format!(
                    "Unexpected create properties for existing {}: {:?}",
                    T::TABLE.resource,
                    changes.create.keys().collect::<Vec<_>>()
                )));
            }
            if changes.update.is_empty() {
                (false, result)
            } else {
                debug!(
                    "Existing {} '{}' needs to get properties updated: {:?}",
                    T::TABLE.resource,
                    name,
                    changes.update.keys().collect::<Vec<_>>()
                );
                if check_mode {
                    result.extend(changes.update);
                } else {
                    client.update(&object.uri, &changes.update)?;
                    client.pull_properties(&mut object)?;
                    result = object.properties;
                }
                (true, result)
            }
        }
    };
    Ok(ModuleOutput::new(changed, removed_dict(&result, T::WRITE_ONLY)))
}

/// Ensure that the object does not exist.
pub(crate) fn ensure_absent<T: ConsoleObjectType>(
    client: &dyn HmcClient,
    name: &str,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let Some(object) = find_console_object_optional(client, T::CLASS, name)? else {
        return Ok(ModuleOutput::new(false, json!({})));
    };
    if !check_mode {
        client.delete(&object.uri)?;
    }
    Ok(ModuleOutput::new(true, json!({})))
}

/// Return the properties of the object.
pub(crate) fn facts<T: ConsoleObjectType>(
    client: &dyn HmcClient,
    name: &str,
) -> Result<ModuleOutput> {
    let object = find_console_object(client, T::CLASS, name)?;
    let object = client.get(&object.uri)?;
    Ok(ModuleOutput::new(
        false,
        removed_dict(&object.properties, T::WRITE_ONLY),
    ))
}
