use crate::property::cast::{cast_float, cast_int, cast_unicode};
use crate::property::eq::eq_hex;
use crate::property::{PropertySpec as P, PropertyTable};

/// Properties of storage volumes.
pub static STORAGE_VOLUME_PROPERTIES: PropertyTable = PropertyTable {
    resource: "StorageVolume",
    plural: "storage volumes",
    specs: &[
        P::new("name", false, true, true, true),
        P::writable("description").with_cast(cast_unicode),
        P::writable("size").with_cast(cast_float),
        P::writable("usage"),
        // ECKD only
        P::writable("model"),
        P::writable("cylinders").with_cast(cast_int),
        P::writable("device_number").with_eq(eq_hex),
        P::read_only("element_uri"),
        P::read_only("element_id"),
        P::read_only("parent"),
        P::read_only("class"),
        P::read_only("fulfillment_state"),
        P::read_only("active_size"),
        P::read_only("uuid"),
        P::read_only("active_model"),
        P::read_only("control_unit_uri"),
        P::read_only("eckd_type"),
        P::read_only("unit_address"),
    ],
};
