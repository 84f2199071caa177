//! The property diff engine.

use log::trace;
use serde_json::Value;

use super::spec::{PropertySpec, PropertyTable};
use crate::error::{Error, Result};
use crate::types::Properties;
use crate::utils::repr;

/// The outcome of comparing desired properties with a resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyChanges {
    /// Properties to pass when creating the resource (HMC names).
    pub create: Properties,

    /// Properties to pass when updating the resource (HMC names).
    pub update: Properties,

    /// At least one property in `update` requires the resource to be
    /// deactivated (stopped) before it can be updated.
    pub requires_deactivation: bool,
}

impl PropertyChanges {
    /// Create an empty set of changes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge another set of changes into this one.
    pub fn merge(&mut self, other: PropertyChanges) {
        self.create.extend(other.create);
        self.update.extend(other.update);
        self.requires_deactivation |= other.requires_deactivation;
    }

    /// Whether neither create nor update properties are present.
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.update.is_empty()
    }

    /// The update properties that are not already covered by creation.
    ///
    /// This is what has to be applied right after creating a resource.
    pub fn update_after_create(&self) -> Properties {
        self.update
            .iter()
            .filter(|(name, _)| !self.create.contains_key(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

/// Check that an input property is defined in the table and allowed.
pub fn validate_input<'t>(table: &'t PropertyTable, name: &str) -> Result<&'t PropertySpec> {
    let spec = table.get(name).ok_or_else(|| {
        Error::parameter(format!(
            "Property '{}' is not defined in the data model for {}.",
            name, table.plural
        ))
    })?;
    if !spec.allowed {
        return Err(Error::parameter(format!(
            "Property '{}' is not allowed in the 'properties' module parameter.",
            name
        )));
    }
    Ok(spec)
}

/// Process a normal (non-artificial) property.
///
/// # Arguments
///
/// * `table` - The property table of the resource type.
/// * `name` - The property name, with underscores.
/// * `input` - The desired value.
/// * `current` - The current properties of the resource, or `None` if the
///   resource does not exist.
///
/// # Returns
///
/// The changes caused by this property.
pub fn process_normal_property(
    table: &PropertyTable,
    name: &str,
    input: &Value,
    current: Option<&Properties>,
) -> Result<PropertyChanges> {
    let spec = table
        .get(name)
        .ok_or_else(|| Error::unexpected(format!("Property '{}' is not in the table", name)))?;
    if !spec.allowed || !(spec.create || spec.update) {
        return Err(Error::unexpected(format!(
            "Property '{}' cannot be set through the 'properties' module parameter",
            name
        )));
    }

    let hmc_name = spec.hmc_name();
    let value = match spec.type_cast {
        Some(cast) => cast(input, name)?,
        None => input.clone(),
    };

    let mut changes = PropertyChanges::new();
    match current {
        Some(props) => {
            let current_value = props.get(&hmc_name);
            let equal = match spec.eq_func {
                Some(eq) => eq(current_value, &value, name)?,
                None => current_value.unwrap_or(&Value::Null) == &value,
            };
            if !equal {
                if !spec.update {
                    return Err(Error::parameter(format!(
                        "Property '{}' can be set during {} creation but cannot be \
                         updated afterwards (from {} to {}).",
                        name,
                        table.resource,
                        repr(current_value.unwrap_or(&Value::Null)),
                        repr(&value)
                    )));
                }
                trace!("Property {} changes to {}", hmc_name, value);
                changes.requires_deactivation = !spec.update_while_active;
                changes.update.insert(hmc_name, value);
            }
        }
        None => {
            if spec.create {
                changes.create.insert(hmc_name, value);
            } else {
                changes.requires_deactivation = !spec.update_while_active;
                changes.update.insert(hmc_name, value);
            }
        }
    }
    Ok(changes)
}

/// Process all input properties of a module.
///
/// Every input property is validated against the table. Properties whose
/// names appear in `artificial` are only validated; resolving them is left
/// to the caller. All other properties go through `process_normal_property`.
///
/// # Arguments
///
/// * `table` - The property table of the resource type.
/// * `input` - The desired properties, keyed by underscore names.
/// * `current` - The current properties of the resource, or `None`.
/// * `artificial` - Names of artificial properties handled by the caller.
pub fn process_properties(
    table: &PropertyTable,
    input: &Properties,
    current: Option<&Properties>,
    artificial: &[&str],
) -> Result<PropertyChanges> {
    let mut changes = PropertyChanges::new();
    for (name, value) in input {
        validate_input(table, name)?;
        if artificial.contains(&name.as_str()) {
            continue;
        }
        changes.merge(process_normal_property(table, name, value, current)?);
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::eq::eq_hex;
    use crate::property::cast::cast_int;
    use serde_json::json;

    static TEST_PROPERTIES: PropertyTable = PropertyTable {
        resource: "Thing",
        plural: "things",
        specs: &[
            PropertySpec::new("name", false, true, true, true),
            PropertySpec::writable("description"),
            PropertySpec::writable("device_number").with_eq(eq_hex),
            PropertySpec::new("initial_memory", true, true, true, false).with_cast(cast_int),
            PropertySpec::new("type", true, true, false, true),
            PropertySpec::new("boot_timeout", true, false, true, false).with_cast(cast_int),
            PropertySpec::new("adapter_name", true, true, true, true),
            PropertySpec::read_only("object_id"),
        ],
    };

    fn props(value: Value) -> Properties {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_unknown_property_rejected() {
        let input = props(json!({"no_such_prop": 1}));
        let err = process_properties(&TEST_PROPERTIES, &input, None, &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Property 'no_such_prop' is not defined in the data model for things."
        );
        assert_eq!(err.class_name(), "ParameterError");
    }

    #[test]
    fn test_disallowed_property_rejected() {
        for name in ["name", "object_id"] {
            let mut input = Properties::new();
            input.insert(name.to_string(), json!("x"));
            let err = process_properties(&TEST_PROPERTIES, &input, None, &[]).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Property '{}' is not allowed in the 'properties' module parameter.", name)
            );
        }
    }

    #[test]
    fn test_new_resource_prefers_create() {
        let input = props(json!({
            "description": "d",
            "initial_memory": "1024",
            "boot_timeout": "60"
        }));
        let changes = process_properties(&TEST_PROPERTIES, &input, None, &[]).unwrap();
        assert_eq!(changes.create, props(json!({"description": "d", "initial-memory": 1024})));
        assert_eq!(changes.update, props(json!({"boot-timeout": 60})));
        assert!(changes.requires_deactivation);
        assert_eq!(changes.update_after_create(), props(json!({"boot-timeout": 60})));
    }

    #[test]
    fn test_existing_resource_equal_values_not_updated() {
        let current = props(json!({
            "description": "d",
            "device-number": "001F",
            "initial-memory": 1024
        }));
        let input = props(json!({
            "description": "d",
            "device_number": "1F",
            "initial_memory": "1024"
        }));
        let changes = process_properties(&TEST_PROPERTIES, &input, Some(&current), &[]).unwrap();
        assert!(changes.is_empty());
        assert!(!changes.requires_deactivation);
    }

    #[test]
    fn test_existing_resource_changed_hex_value() {
        let current = props(json!({"device-number": "001F"}));
        let input = props(json!({"device_number": "0020"}));
        let changes = process_properties(&TEST_PROPERTIES, &input, Some(&current), &[]).unwrap();
        assert_eq!(changes.update, props(json!({"device-number": "0020"})));
        assert!(changes.create.is_empty());
        assert!(!changes.requires_deactivation);
    }

    #[test]
    fn test_deactivation_only_for_changed_properties() {
        let current = props(json!({"initial-memory": 1024, "description": "a"}));

        let input = props(json!({"initial_memory": 1024, "description": "b"}));
        let changes = process_properties(&TEST_PROPERTIES, &input, Some(&current), &[]).unwrap();
        assert!(!changes.requires_deactivation);

        let input = props(json!({"initial_memory": 2048}));
        let changes = process_properties(&TEST_PROPERTIES, &input, Some(&current), &[]).unwrap();
        assert!(changes.requires_deactivation);
    }

    #[test]
    fn test_create_only_property_cannot_change() {
        let current = props(json!({"type": "linux"}));
        let input = props(json!({"type": "ssc"}));
        let err = process_properties(&TEST_PROPERTIES, &input, Some(&current), &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Property 'type' can be set during Thing creation but cannot be updated \
             afterwards (from 'linux' to 'ssc')."
        );

        let input = props(json!({"type": "linux"}));
        let changes = process_properties(&TEST_PROPERTIES, &input, Some(&current), &[]).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_artificial_properties_are_skipped() {
        let input = props(json!({"adapter_name": "fcp1", "description": "d"}));
        let changes = process_properties(&TEST_PROPERTIES, &input, None, &["adapter_name"]).unwrap();
        assert_eq!(changes.create, props(json!({"description": "d"})));
    }

    #[test]
    fn test_process_normal_property_asserts_writable() {
        let err = process_normal_property(&TEST_PROPERTIES, "object_id", &json!("x"), None)
            .unwrap_err();
        assert!(!err.is_handled());
    }
}
