use crate::property::cast::{cast_bool, cast_int, cast_unicode};
use crate::property::eq::eq_casefold;
use crate::property::{PropertySpec as P, PropertyTable};

/// Properties of LDAP server definitions.
pub static LDAP_SERVER_DEFINITION_PROPERTIES: PropertyTable = PropertyTable {
    resource: "LdapServerDefinition",
    plural: "LDAP server definitions",
    specs: &[
        P::new("name", false, true, false, true).with_eq(eq_casefold),
        P::new("replication_overwrite_possible", true, false, true, true).with_cast(cast_bool),
        P::writable("description").with_cast(cast_unicode),
        P::writable("primary_hostname_ipaddr").with_cast(cast_unicode),
        P::writable("connection_port").with_cast(cast_int),
        P::writable("backup_hostname_ipaddr").with_cast(cast_unicode),
        P::writable("use_ssl").with_cast(cast_bool),
        P::writable("tolerate_untrusted_certificates").with_cast(cast_bool),
        P::writable("bind_distinguished_name").with_cast(cast_unicode),
        P::writable("bind_password").with_cast(cast_unicode),
        P::writable("location_method").with_cast(cast_unicode),
        P::writable("search_distinguished_name").with_cast(cast_unicode),
        P::writable("search_scope").with_cast(cast_unicode),
        P::writable("search_filter").with_cast(cast_unicode),
        P::read_only("element_uri"),
        P::read_only("element_id"),
        P::read_only("parent"),
        P::read_only("class"),
    ],
};
