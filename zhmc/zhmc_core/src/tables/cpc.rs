use crate::property::cast::cast_unicode;
use crate::property::{PropertySpec as P, PropertyTable};

/// Updatable properties of CPCs. CPCs cannot be created.
pub static CPC_PROPERTIES: PropertyTable = PropertyTable {
    resource: "CPC",
    plural: "CPCs",
    specs: &[
        P::new("description", true, false, true, true).with_cast(cast_unicode),
        P::new("acceptable_status", true, false, true, true),
        P::read_only("name"),
        P::read_only("object_uri"),
        P::read_only("object_id"),
        P::read_only("parent"),
        P::read_only("class"),
    ],
};
