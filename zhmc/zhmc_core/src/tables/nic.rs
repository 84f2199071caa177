use crate::property::cast::{cast_int, cast_unicode};
use crate::property::eq::{eq_hex, eq_mac};
use crate::property::{PropertySpec as P, PropertyTable};

/// Properties of NICs.
pub static NIC_PROPERTIES: PropertyTable = PropertyTable {
    resource: "NIC",
    plural: "NICs",
    specs: &[
        P::new("name", false, true, true, true),
        P::writable("description").with_cast(cast_unicode),
        P::writable("device_number").with_eq(eq_hex),
        // set via adapter_name/adapter_port
        P::new("network_adapter_port_uri", false, true, true, true),
        P::new("virtual_switch_uri", false, true, true, true),
        // artificial
        P::writable("adapter_name"),
        P::writable("adapter_port"),
        P::writable("ssc_management_nic"),
        P::writable("ssc_ip_address_type"),
        P::writable("ssc_ip_address"),
        P::writable("ssc_mask_prefix"),
        P::writable("vlan_id").with_cast(cast_int),
        P::writable("mac_address").with_eq(eq_mac),
        P::writable("vlan_type"),
        P::writable("function_number").with_cast(cast_int),
        P::writable("function_range").with_cast(cast_int),
        P::read_only("element_uri"),
        P::read_only("element_id"),
        P::read_only("parent"),
        P::read_only("class"),
        P::read_only("type"),
    ],
};
