use crate::property::cast::{cast_int, cast_list, cast_unicode};
use crate::property::{PropertySpec as P, PropertyTable};

/// Properties of HMC user patterns.
///
/// Each `*_name` property is artificial and is resolved into the `*_uri`
/// property of the same prefix.
pub static USER_PATTERN_PROPERTIES: PropertyTable = PropertyTable {
    resource: "UserPattern",
    plural: "user patterns",
    specs: &[
        P::new("name", false, true, true, true),
        P::writable("description").with_cast(cast_unicode),
        P::writable("type"),
        P::writable("pattern").with_cast(cast_unicode),
        P::writable("retention_time").with_cast(cast_int),
        P::new("user_template_uri", false, false, true, true),
        P::writable("user_template_name"),
        P::new("ldap_server_definition_uri", false, false, true, true),
        P::writable("ldap_server_definition_name"),
        P::writable("template_name_override"),
        P::writable("domain_name_restrictions"),
        P::new("specific_template_uri", false, false, true, true),
        P::writable("specific_template_name"),
        P::new("template_name_override_ldap_server_definition_uri", false, false, true, true),
        P::writable("template_name_override_ldap_server_definition_name"),
        P::new("template_name_override_default_template_uri", false, false, true, true),
        P::writable("template_name_override_default_template_name"),
        P::writable("ldap_group_to_template_mappings").with_cast(cast_list),
        P::new("ldap_group_ldap_server_definition_uri", false, false, true, true),
        P::writable("ldap_group_ldap_server_definition_name"),
        P::new("ldap_group_default_template_uri", false, false, true, true),
        P::writable("ldap_group_default_template_name"),
        P::new("domain_name_restrictions_ldap_server_definition_uri", false, false, true, true),
        P::writable("domain_name_restrictions_ldap_server_definition_name"),
        P::read_only("element_uri"),
        P::read_only("element_id"),
        P::read_only("parent"),
        P::read_only("class"),
        P::read_only("search_order_index"),
        P::read_only("replication_overwrite_possible"),
    ],
};
