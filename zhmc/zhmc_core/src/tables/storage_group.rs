use crate::property::cast::{cast_int, cast_unicode};
use crate::property::{PropertySpec as P, PropertyTable};

/// Properties of storage groups.
pub static STORAGE_GROUP_PROPERTIES: PropertyTable = PropertyTable {
    resource: "StorageGroup",
    plural: "storage groups",
    specs: &[
        // derived from the cpc_name module parameter
        P::new("cpc_uri", false, true, false, true),
        P::new("type", true, true, false, true),
        // managed by the storage volume operations
        P::new("storage_volumes", false, true, true, true),
        P::new("name", false, true, true, true),
        P::writable("description").with_cast(cast_unicode),
        P::writable("shared"),
        P::writable("connectivity").with_cast(cast_int),
        P::writable("max_partitions").with_cast(cast_int),
        P::writable("virtual_machine_count").with_cast(cast_int),
        P::writable("email_to_addresses"),
        P::writable("email_cc_addresses"),
        P::writable("email_insert"),
        P::read_only("object_uri"),
        P::read_only("object_id"),
        P::read_only("parent"),
        P::read_only("class"),
        P::read_only("fulfillment_state"),
        P::read_only("storage_volume_uris"),
        P::read_only("virtual_storage_resource_uris"),
        P::read_only("active_connectivity"),
        P::read_only("active_max_partitions"),
        P::read_only("candidate_adapter_port_uris"),
        P::read_only("unassigned_worldwide_port_names"),
    ],
};
