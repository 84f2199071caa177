use crate::property::cast::{cast_int, cast_unicode};
use crate::property::eq::eq_hex;
use crate::property::{PropertySpec as P, PropertyTable};

/// Properties of adapters.
///
/// Only HiperSockets adapters can be created, so the create flags apply to
/// them alone.
pub static ADAPTER_PROPERTIES: PropertyTable = PropertyTable {
    resource: "Adapter",
    plural: "adapters",
    specs: &[
        // artificial, changed with "Change Crypto Type"
        P::new("crypto_type", true, false, true, true),
        P::new("allowed_capacity", true, false, true, true).with_cast(cast_int),
        P::new("channel_path_id", true, false, true, true).with_eq(eq_hex),
        P::new("crypto_number", true, false, true, true).with_cast(cast_int),
        P::new("tke_commands_enabled", true, false, true, true),
        P::new("name", false, true, true, true),
        P::writable("description").with_cast(cast_unicode),
        P::writable("maximum_transmission_unit_size").with_cast(cast_int),
        // artificial, changed with "Change Adapter Type"
        P::writable("type"),
        P::read_only("object_uri"),
        P::read_only("object_id"),
        P::read_only("parent"),
        P::read_only("class"),
        P::read_only("status"),
        P::read_only("adapter_id"),
        P::read_only("adapter_family"),
        P::read_only("detected_card_type"),
        P::read_only("card_location"),
        P::read_only("port_count"),
        P::read_only("network_port_uris"),
        P::read_only("storage_port_uris"),
        P::read_only("state"),
        P::read_only("configured_capacity"),
        P::read_only("used_capacity"),
        P::read_only("maximum_total_capacity"),
        P::read_only("physical_channel_status"),
        P::read_only("udx_loaded"),
        P::read_only("ssd_is_installed"),
        P::read_only("ssd_capacity"),
        P::read_only("ssd_model_number"),
        P::read_only("ssd_serial_number"),
        P::read_only("ssd_subsystem_vendor_id"),
        P::read_only("ssd_vendor_id"),
        P::read_only("network_ports"),
    ],
};
