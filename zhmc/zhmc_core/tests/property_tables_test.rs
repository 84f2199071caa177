//! Integration tests for the property diff engine.
//!
//! These tests run the diff engine against the real property tables of the
//! resource types, verifying the properties that must hold for every table.

use serde_json::{json, Value};

use zhmc_core::property::{process_normal_property, process_properties};
use zhmc_core::tables::{
    ADAPTER_PROPERTIES, CPC_PROPERTIES, HBA_PROPERTIES, LDAP_SERVER_DEFINITION_PROPERTIES,
    LPAR_PROPERTIES, NIC_PROPERTIES, PARTITION_PROPERTIES, PASSWORD_RULE_PROPERTIES,
    STORAGE_GROUP_PROPERTIES, STORAGE_VOLUME_PROPERTIES, USER_PATTERN_PROPERTIES,
    USER_PROPERTIES, USER_ROLE_PROPERTIES, VIRTUAL_FUNCTION_PROPERTIES,
};
use zhmc_core::{Properties, PropertyTable};

fn tables() -> Vec<&'static PropertyTable> {
    vec![
        &ADAPTER_PROPERTIES,
        &CPC_PROPERTIES,
        &HBA_PROPERTIES,
        &LDAP_SERVER_DEFINITION_PROPERTIES,
        &LPAR_PROPERTIES,
        &NIC_PROPERTIES,
        &PARTITION_PROPERTIES,
        &PASSWORD_RULE_PROPERTIES,
        &STORAGE_GROUP_PROPERTIES,
        &STORAGE_VOLUME_PROPERTIES,
        &USER_PATTERN_PROPERTIES,
        &USER_PROPERTIES,
        &USER_ROLE_PROPERTIES,
        &VIRTUAL_FUNCTION_PROPERTIES,
    ]
}

fn props(value: Value) -> Properties {
    value.as_object().unwrap().clone()
}

fn single(name: &str, value: Value) -> Properties {
    let mut input = Properties::new();
    input.insert(name.to_string(), value);
    input
}

#[test]
fn test_disallowed_properties_are_rejected_in_every_table() {
    for table in tables() {
        for spec in table.iter().filter(|s| !s.allowed) {
            let input = single(spec.name, json!("x"));
            for current in [None, Some(Properties::new())] {
                let err = process_properties(table, &input, current.as_ref(), &[]).unwrap_err();
                assert_eq!(err.class_name(), "ParameterError");
                assert!(
                    err.to_string().contains("is not allowed"),
                    "{} / {}",
                    table.plural,
                    spec.name
                );
            }
        }
    }
}

#[test]
fn test_undefined_properties_are_rejected_in_every_table() {
    for table in tables() {
        let input = single("bogus_property", json!(1));
        let err = process_properties(table, &input, None, &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "Property 'bogus_property' is not defined in the data model for {}.",
                table.plural
            )
        );
    }
}

#[test]
fn test_allowed_properties_are_creatable_or_updatable() {
    for table in tables() {
        for spec in table.iter().filter(|s| s.allowed) {
            let artificial = spec.name == "crypto_configuration" || spec.name == "permissions";
            assert!(
                spec.create || spec.update || artificial,
                "{} / {}",
                table.plural,
                spec.name
            );
        }
    }
}

#[test]
fn test_new_partition_splits_create_and_update_properties() {
    let input = props(json!({
        "description": "web server",
        "ifl_processors": "2",
        "initial_memory": 4096,
        "maximum_memory": 8192,
        "boot_load_parameters": "1",
        "minimum_ifl_processing_weight": "10",
    }));
    let changes = process_properties(&PARTITION_PROPERTIES, &input, None, &[]).unwrap();
    assert_eq!(
        changes.create,
        props(json!({
            "description": "web server",
            "ifl-processors": 2,
            "initial-memory": 4096,
            "maximum-memory": 8192,
        }))
    );
    assert_eq!(
        changes.update,
        props(json!({
            "boot-load-parameters": "1",
            "minimum-ifl-processing-weight": 10,
        }))
    );
    assert!(!changes.requires_deactivation);
}

#[test]
fn test_existing_partition_requires_deactivation_for_maximum_memory() {
    let current = props(json!({
        "maximum-memory": 8192,
        "initial-memory": 4096,
        "processor-mode": "shared",
    }));

    let input = props(json!({"initial_memory": 2048, "processor_mode": "shared"}));
    let changes = process_properties(&PARTITION_PROPERTIES, &input, Some(&current), &[]).unwrap();
    assert_eq!(changes.update, props(json!({"initial-memory": 2048})));
    assert!(!changes.requires_deactivation);

    let input = props(json!({"maximum_memory": "16384"}));
    let changes = process_properties(&PARTITION_PROPERTIES, &input, Some(&current), &[]).unwrap();
    assert_eq!(changes.update, props(json!({"maximum-memory": 16384})));
    assert!(changes.requires_deactivation);
}

#[test]
fn test_hba_device_number_uses_hex_equality() {
    let current = props(json!({"device-number": "001F"}));

    let changes = process_normal_property(
        &HBA_PROPERTIES,
        "device_number",
        &json!("1F"),
        Some(&current),
    )
    .unwrap();
    assert!(changes.is_empty());

    let changes = process_normal_property(
        &HBA_PROPERTIES,
        "device_number",
        &json!("0020"),
        Some(&current),
    )
    .unwrap();
    assert_eq!(changes.update, props(json!({"device-number": "0020"})));
    assert!(!changes.requires_deactivation);
}

#[test]
fn test_nic_mac_address_comparison() {
    let current = props(json!({"mac-address": "AA:BB:CC:DD:EE:FF"}));
    let input = props(json!({"mac_address": "aa:bb:cc:dd:ee:ff"}));
    let changes = process_properties(&NIC_PROPERTIES, &input, Some(&current), &[]).unwrap();
    assert!(changes.is_empty());

    let input = props(json!({"mac_address": "aa:bb:cc:dd:ee:00"}));
    let changes = process_properties(&NIC_PROPERTIES, &input, Some(&current), &[]).unwrap();
    assert_eq!(changes.update.len(), 1);
    assert!(!changes.requires_deactivation);
}

#[test]
fn test_storage_group_type_cannot_be_updated() {
    let current = props(json!({"type": "fcp"}));
    let input = props(json!({"type": "fc"}));
    let err = process_properties(&STORAGE_GROUP_PROPERTIES, &input, Some(&current), &[])
        .unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Property 'type' can be set during StorageGroup creation"));
}
