//! Finding the resources a module works on.

use serde_json::Value;

use zhmc_core::utils::repr;
use zhmc_core::{
    ClientError, Error, Filter, HmcClient, Properties, Resource, ResourceClass, Result,
    CONSOLE_URI,
};

/// Find a CPC by name.
pub fn find_cpc(client: &dyn HmcClient, name: &str) -> Result<Resource> {
    client.find(ResourceClass::Cpc, None, name)
}

/// Find a partition of a CPC by name.
pub fn find_partition(client: &dyn HmcClient, cpc: &Resource, name: &str) -> Result<Resource> {
    client.find(ResourceClass::Partition, Some(&cpc.uri), name)
}

/// Find a console-level object (user, storage group, ...) by name.
pub fn find_console_object(
    client: &dyn HmcClient,
    class: ResourceClass,
    name: &str,
) -> Result<Resource> {
    client.find(class, Some(CONSOLE_URI), name)
}

/// Find a console-level object by name, if it exists.
pub fn find_console_object_optional(
    client: &dyn HmcClient,
    class: ResourceClass,
    name: &str,
) -> Result<Option<Resource>> {
    client.find_optional(class, Some(CONSOLE_URI), name)
}

/// Get an object by URI, or `None` if it does not exist (HTTP 404.1).
pub fn object_from_uri(client: &dyn HmcClient, uri: &str) -> Result<Option<Resource>> {
    match client.get(uri) {
        Ok(resource) => Ok(Some(resource)),
        Err(e) if e.is_http(404, 1) || e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// The properties of the objects with the given URIs.
pub fn properties_of(client: &dyn HmcClient, uris: &[String]) -> Result<Vec<Value>> {
    uris.iter()
        .map(|uri| client.get(uri).map(|res| Value::Object(res.properties)))
        .collect()
}

/// Map a client "not found" error to a parameter error.
pub fn not_found_as_parameter_error<T>(
    result: Result<T>,
    message: impl FnOnce() -> String,
) -> Result<T> {
    match result {
        Err(Error::Client(ClientError::NotFound { .. })) => Err(Error::parameter(message())),
        other => other,
    }
}

/// Resolve the artificial `adapter_name` and `adapter_port` properties of
/// an HBA or NIC into the adapter and its port.
///
/// # Arguments
///
/// * `client` - The HMC client.
/// * `cpc_uri` - URI of the CPC with the adapter.
/// * `input` - The `properties` module parameter.
///
/// # Returns
///
/// `None` if both properties are omitted.
pub fn adapter_port_from_input(
    client: &dyn HmcClient,
    cpc_uri: &str,
    input: &Properties,
) -> Result<Option<(Resource, Resource)>> {
    let (name_value, port_value) = match (input.get("adapter_name"), input.get("adapter_port")) {
        (None, None) => return Ok(None),
        (Some(name), Some(port)) => (name, port),
        _ => {
            return Err(Error::parameter(
                "Artificial properties 'adapter_name' and 'adapter_port' must either both be \
                 specified or both be omitted.",
            ))
        }
    };
    let adapter_name = match name_value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let port_index = match port_value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        Error::parameter(format!(
            "Artificial property 'adapter_port' is not an integer: {}",
            repr(port_value)
        ))
    })?;

    let adapter = not_found_as_parameter_error(
        client.find(ResourceClass::Adapter, Some(cpc_uri), &adapter_name),
        || {
            format!(
                "Artificial property 'adapter_name' does not specify the name of an existing \
                 adapter: '{}'",
                adapter_name
            )
        },
    )?;
    let port = not_found_as_parameter_error(
        client.find_by(
            ResourceClass::Port,
            Some(&adapter.uri),
            &Filter::all().with("index", port_index),
        ),
        || {
            format!(
                "Artificial property 'adapter_port' does not specify the index of an existing \
                 port on adapter '{}': {}",
                adapter_name, port_index
            )
        },
    )?;
    Ok(Some((adapter, port)))
}

/// Resolve an artificial `*_name` property that names a console-level
/// object into the object URI.
///
/// # Arguments
///
/// * `client` - The HMC client.
/// * `class` - The class of the named object.
/// * `label` - How the object is called in messages, e.g. "Password rule".
/// * `prop_name` - The name of the artificial property.
/// * `value` - The value of the artificial property.
///
/// # Returns
///
/// The object URI, or null if the value is null or empty.
pub fn console_object_uri(
    client: &dyn HmcClient,
    class: ResourceClass,
    label: &str,
    prop_name: &str,
    value: &Value,
) -> Result<Value> {
    let name = match value {
        Value::Null => return Ok(Value::Null),
        Value::String(s) if s.is_empty() => return Ok(Value::Null),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let object = not_found_as_parameter_error(find_console_object(client, class, &name), || {
        format!(
            "{} '{}' specified in parameter '{}' does not exist.",
            label, name, prop_name
        )
    })?;
    Ok(Value::String(object.uri))
}

/// Limit a property dictionary to the selected properties.
///
/// Selected names use underscores. The name and the identity properties of
/// the object are always kept.
pub fn select_properties(props: &Properties, select: Option<&[String]>) -> Properties {
    let Some(select) = select else {
        return props.clone();
    };
    let selected: Vec<String> = select.iter().map(|name| name.replace('_', "-")).collect();
    props
        .iter()
        .filter(|(name, _)| {
            matches!(
                name.as_str(),
                "name" | "object-uri" | "object-id" | "element-uri" | "element-id" | "class"
                    | "parent"
            ) || selected.contains(name)
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_properties_keeps_identity() {
        let props = json!({
            "name": "p1",
            "object-uri": "/api/partitions/1",
            "status": "active",
            "ifl-processors": 2,
            "description": "d"
        });
        let props = props.as_object().unwrap();
        let selected = select_properties(props, Some(&["ifl_processors".to_string()]));
        assert_eq!(
            Value::Object(selected),
            json!({"name": "p1", "object-uri": "/api/partitions/1", "ifl-processors": 2})
        );
        assert_eq!(select_properties(props, None).len(), 5);
    }

    #[test]
    fn test_not_found_mapping() {
        let result: Result<()> = Err(ClientError::NotFound {
            class: "adapter".into(),
            filter: "with name=\"a\"".into(),
        }
        .into());
        let err = not_found_as_parameter_error(result, || "no adapter".into()).unwrap_err();
        assert_eq!(err.failure_message(), "ParameterError: no adapter");

        let result: Result<()> = Err(ClientError::http(500, 1, "boom").into());
        let err = not_found_as_parameter_error(result, || "no adapter".into()).unwrap_err();
        assert_eq!(err.class_name(), "HTTPError");
    }
}
