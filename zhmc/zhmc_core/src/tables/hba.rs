use crate::property::cast::cast_unicode;
use crate::property::eq::eq_hex;
use crate::property::{PropertySpec as P, PropertyTable};

/// Properties of HBAs.
pub static HBA_PROPERTIES: PropertyTable = PropertyTable {
    resource: "HBA",
    plural: "HBAs",
    specs: &[
        // set via adapter_name/adapter_port
        P::new("adapter_port_uri", false, true, false, true),
        // artificial
        P::new("adapter_name", true, true, false, true),
        P::new("adapter_port", true, true, false, true),
        P::new("name", false, true, true, true),
        P::writable("description").with_cast(cast_unicode),
        P::writable("device_number").with_eq(eq_hex),
        P::read_only("element_uri"),
        P::read_only("element_id"),
        P::read_only("parent"),
        P::read_only("class"),
        P::read_only("wwpn"),
    ],
};
