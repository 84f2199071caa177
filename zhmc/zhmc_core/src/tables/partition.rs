use serde_json::Value;

use crate::property::cast::{cast_float, cast_int, cast_unicode};
use crate::property::eq::eq_hex;
use crate::property::{DefaultValue as D, PropertySpec as P, PropertyTable};
use crate::types::Properties;

fn str_is(props: &Properties, name: &str, expected: &str) -> bool {
    props.get(name).and_then(Value::as_str) == Some(expected)
}

fn int_or_zero(props: &Properties, name: &str) -> i64 {
    props.get(name).and_then(Value::as_i64).unwrap_or(0)
}

fn required_boot_storage_adapter(props: &Properties) -> bool {
    str_is(props, "boot-device", "storage-adapter")
}

fn required_partition_id(props: &Properties) -> bool {
    !props
        .get("autogenerate-partition-id")
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

fn required_ifl_processors(props: &Properties) -> bool {
    int_or_zero(props, "cp-processors") == 0
}

fn required_cp_processors(props: &Properties) -> bool {
    int_or_zero(props, "ifl-processors") == 0
}

fn required_boot_ftp(props: &Properties) -> bool {
    str_is(props, "boot-device", "ftp")
}

fn required_boot_removable_media(props: &Properties) -> bool {
    str_is(props, "boot-device", "removable-media")
}

fn required_type_ssc(props: &Properties) -> bool {
    props.get("type").and_then(Value::as_str).unwrap_or("linux") == "ssc"
}

const fn update_only(name: &'static str) -> P {
    P::new(name, true, false, true, true)
}

const fn read_only(name: &'static str, default: D) -> P {
    P::read_only(name).with_default(default)
}

/// Properties of partitions.
///
/// Requiredness and defaults describe the "Create Partition" operation and
/// are used to build the local partition in check mode.
pub static PARTITION_PROPERTIES: PropertyTable = PropertyTable {
    resource: "Partition",
    plural: "partitions",
    specs: &[
        // create-only properties
        P::new("type", true, true, false, false).with_default(D::Str("linux")),
        // update-only properties
        P::new("boot_network_device", false, false, true, true),
        update_only("boot_network_nic_name").with_cast(cast_unicode),
        P::new("boot_storage_device", false, false, true, true),
        update_only("boot_storage_hba_name").with_cast(cast_unicode),
        update_only("boot_storage_volume"),
        update_only("boot_storage_group_name").with_cast(cast_unicode),
        update_only("boot_storage_volume_name").with_cast(cast_unicode),
        P::new("crypto_configuration", true, false, false, false),
        update_only("acceptable_status").with_default(D::EmptyList),
        update_only("processor_management_enabled").with_default(D::Bool(false)),
        update_only("ifl_absolute_processor_capping").with_default(D::Bool(false)),
        update_only("ifl_absolute_processor_capping_value")
            .with_cast(cast_float)
            .with_default(D::Float(1.0)),
        update_only("ifl_processing_weight_capped").with_default(D::Bool(false)),
        update_only("minimum_ifl_processing_weight")
            .with_cast(cast_int)
            .with_default(D::Int(1)),
        update_only("maximum_ifl_processing_weight")
            .with_cast(cast_int)
            .with_default(D::Int(999)),
        update_only("initial_ifl_processing_weight")
            .with_cast(cast_int)
            .with_default(D::Int(100)),
        update_only("cp_absolute_processor_capping").with_default(D::Bool(false)),
        update_only("cp_absolute_processor_capping_value")
            .with_cast(cast_float)
            .with_default(D::Float(1.0)),
        update_only("cp_processing_weight_capped").with_default(D::Bool(false)),
        update_only("minimum_cp_processing_weight")
            .with_cast(cast_int)
            .with_default(D::Int(1)),
        update_only("maximum_cp_processing_weight")
            .with_cast(cast_int)
            .with_default(D::Int(999)),
        update_only("initial_cp_processing_weight")
            .with_cast(cast_int)
            .with_default(D::Int(100)),
        update_only("boot_logical_unit_number")
            .with_eq(eq_hex)
            .required_when(required_boot_storage_adapter)
            .with_default(D::Str("")),
        update_only("boot_world_wide_port_name")
            .with_eq(eq_hex)
            .required_when(required_boot_storage_adapter)
            .with_default(D::Str("")),
        update_only("boot_load_parameters")
            .with_cast(cast_unicode)
            .with_default(D::Str("")),
        update_only("boot_os_specific_parameters")
            .with_cast(cast_unicode)
            .with_default(D::Str("")),
        update_only("boot_iso_ins_file")
            .with_cast(cast_unicode)
            .with_default(D::Null),
        update_only("ssc_boot_selection").with_default(D::Str("installer")),
        // create+update properties
        P::new("name", false, true, true, true).required(),
        P::writable("description")
            .with_cast(cast_unicode)
            .with_default(D::Str("")),
        P::new("short_name", true, true, true, false).with_default(D::Special),
        P::new("partition_id", true, true, true, false)
            .required_when(required_partition_id)
            .with_default(D::Special),
        P::new("autogenerate_partition_id", true, true, true, false)
            .with_default(D::Bool(true)),
        P::writable("ifl_processors")
            .with_cast(cast_int)
            .required_when(required_ifl_processors)
            .with_default(D::Int(0)),
        P::writable("cp_processors")
            .with_cast(cast_int)
            .required_when(required_cp_processors)
            .with_default(D::Int(0)),
        P::new("processor_mode", true, true, true, false).with_default(D::Str("shared")),
        P::writable("initial_memory").with_cast(cast_int).required(),
        P::new("maximum_memory", true, true, true, false)
            .with_cast(cast_int)
            .required(),
        P::writable("reserve_resources").with_default(D::Bool(false)),
        P::writable("boot_device").with_default(D::Str("none")),
        P::writable("boot_timeout")
            .with_cast(cast_int)
            .with_default(D::Int(60)),
        P::writable("boot_ftp_host")
            .with_cast(cast_unicode)
            .required_when(required_boot_ftp)
            .with_default(D::Null),
        P::writable("boot_ftp_username")
            .with_cast(cast_unicode)
            .required_when(required_boot_ftp)
            .with_default(D::Null),
        P::writable("boot_ftp_password")
            .with_cast(cast_unicode)
            .required_when(required_boot_ftp)
            .with_default(D::Null),
        P::writable("boot_ftp_insfile")
            .with_cast(cast_unicode)
            .required_when(required_boot_ftp)
            .with_default(D::Null),
        P::writable("boot_removable_media")
            .with_cast(cast_unicode)
            .required_when(required_boot_removable_media)
            .with_default(D::Null),
        P::writable("boot_removable_media_type")
            .required_when(required_boot_removable_media)
            .with_default(D::Null),
        P::writable("boot_configuration_selector")
            .with_cast(cast_int)
            .with_default(D::Int(0)),
        P::writable("boot_record_lba").with_default(D::Int(0)),
        P::writable("access_global_performance_data").with_default(D::Bool(false)),
        P::writable("permit_cross_partition_commands").with_default(D::Bool(false)),
        P::writable("access_basic_counter_set").with_default(D::Bool(false)),
        P::writable("access_problem_state_counter_set").with_default(D::Bool(false)),
        P::writable("access_crypto_activity_counter_set").with_default(D::Bool(false)),
        P::writable("access_extended_counter_set").with_default(D::Bool(false)),
        P::writable("access_coprocessor_group_set").with_default(D::Bool(false)),
        P::writable("access_basic_sampling").with_default(D::Bool(false)),
        P::writable("access_diagnostic_sampling").with_default(D::Bool(false)),
        P::new("permit_des_key_import_functions", true, true, true, false)
            .with_default(D::Bool(true)),
        P::new("permit_aes_key_import_functions", true, true, true, false)
            .with_default(D::Bool(true)),
        P::writable("permit_ecc_key_import_functions").with_default(D::Bool(true)),
        P::writable("ssc_host_name")
            .with_cast(cast_unicode)
            .required_when(required_type_ssc)
            .with_default(D::Special),
        P::writable("ssc_ipv4_gateway")
            .with_cast(cast_unicode)
            .with_default(D::Null),
        P::writable("ssc_ipv6_gateway")
            .with_cast(cast_unicode)
            .with_default(D::Null),
        P::writable("ssc_dns_servers")
            .with_cast(cast_unicode)
            .with_default(D::EmptyList),
        P::writable("ssc_master_userid")
            .with_cast(cast_unicode)
            .required_when(required_type_ssc)
            .with_default(D::Special),
        P::writable("ssc_master_pw")
            .with_cast(cast_unicode)
            .required_when(required_type_ssc)
            .with_default(D::Special),
        P::writable("secure_boot").with_default(D::Bool(false)),
        // read-only properties
        read_only("object_uri", D::Special),
        read_only("object_id", D::Special),
        read_only("parent", D::Special),
        read_only("class", D::Str("partition")),
        read_only("status", D::Str("stopped")),
        read_only("has_unacceptable_status", D::Bool(false)),
        read_only("is_locked", D::Bool(false)),
        read_only("os_name", D::Str("")),
        read_only("os_type", D::Str("")),
        read_only("os_version", D::Str("")),
        read_only("degraded_adapters", D::EmptyList),
        read_only("current_ifl_processing_weight", D::Int(100)),
        read_only("current_cp_processing_weight", D::Int(100)),
        read_only("reserved_memory", D::Special),
        read_only("auto_start", D::Bool(false)),
        read_only("secure_execution", D::Null),
        read_only("boot_iso_image_name", D::Null),
        read_only("threads_per_processor", D::Special),
        read_only("virtual_function_uris", D::EmptyList),
        read_only("nic_uris", D::EmptyList),
        read_only("hba_uris", D::EmptyList),
        read_only("storage_group_uris", D::EmptyList),
        read_only("tape_link_uris", D::EmptyList),
        read_only("partition_link_uris", D::EmptyList),
        read_only("available_features_list", D::EmptyList),
    ],
};
