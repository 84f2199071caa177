use crate::property::cast::{cast_bool, cast_unicode};
use crate::property::{PropertySpec as P, PropertyTable};

/// Properties of HMC user roles.
pub static USER_ROLE_PROPERTIES: PropertyTable = PropertyTable {
    resource: "UserRole",
    plural: "user roles",
    specs: &[
        P::new("name", false, true, true, true),
        P::writable("description").with_cast(cast_unicode),
        // artificial, resolved to associated_system_defined_user_role_uri
        P::writable("associated_system_defined_user_role_name").with_cast(cast_unicode),
        P::new("associated_system_defined_user_role_uri", false, false, true, true),
        P::writable("is_inheritance_enabled").with_cast(cast_bool),
        // artificial, reconciled through add/remove permission operations
        P::new("permissions", true, false, false, true),
        P::read_only("object_uri"),
        P::read_only("object_id"),
        P::read_only("parent"),
        P::read_only("class"),
        P::read_only("replication_overwrite_possible"),
        P::read_only("type"),
    ],
};
