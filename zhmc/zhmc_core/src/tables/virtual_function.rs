use crate::property::cast::cast_unicode;
use crate::property::eq::eq_hex;
use crate::property::{PropertySpec as P, PropertyTable};

/// Properties of virtual functions.
pub static VIRTUAL_FUNCTION_PROPERTIES: PropertyTable = PropertyTable {
    resource: "VirtualFunction",
    plural: "virtual functions",
    specs: &[
        P::new("name", false, true, true, true),
        P::writable("description").with_cast(cast_unicode),
        P::writable("device_number").with_eq(eq_hex),
        // set via adapter_name
        P::new("adapter_uri", false, true, true, true),
        // artificial
        P::writable("adapter_name"),
        P::read_only("element_uri"),
        P::read_only("element_id"),
        P::read_only("parent"),
        P::read_only("class"),
    ],
};
