use crate::property::cast::{cast_bool, cast_int, cast_unicode};
use crate::property::{PropertySpec as P, PropertyTable};

/// Properties of HMC users.
///
/// The `*_name` properties are artificial: they name the referenced object,
/// whose URI is then set in the corresponding `*_uri` property.
pub static USER_PROPERTIES: PropertyTable = PropertyTable {
    resource: "User",
    plural: "users",
    specs: &[
        P::new("type", true, true, false, true),
        P::new("default_group_uri", false, false, true, true),
        P::writable("default_group_name"),
        P::new("name", false, true, true, true),
        P::writable("description").with_cast(cast_unicode),
        P::writable("disabled").with_cast(cast_bool),
        P::writable("authentication_type"),
        // set via user_role_names
        P::read_only("user_roles"),
        P::writable("user_role_names"),
        P::new("password_rule_uri", false, true, true, true),
        P::writable("password_rule_name"),
        // write-only
        P::writable("password"),
        P::writable("force_password_change").with_cast(cast_bool),
        P::new("ldap_server_definition_uri", false, true, true, true),
        P::writable("ldap_server_definition_name"),
        P::writable("userid_on_ldap_server"),
        P::writable("session_timeout").with_cast(cast_int),
        P::writable("verify_timeout").with_cast(cast_int),
        P::writable("idle_timeout").with_cast(cast_int),
        P::writable("min_pw_change_time").with_cast(cast_int),
        P::writable("max_failed_logins").with_cast(cast_int),
        P::writable("disable_delay").with_cast(cast_int),
        P::writable("inactivity_timeout").with_cast(cast_int),
        P::writable("disruptive_pw_required").with_cast(cast_bool),
        P::writable("disruptive_text_required").with_cast(cast_bool),
        P::writable("allow_remote_access").with_cast(cast_bool),
        P::writable("allow_management_interfaces").with_cast(cast_bool),
        P::writable("max_web_services_api_sessions").with_cast(cast_int),
        P::writable("web_services_api_session_idle_timeout").with_cast(cast_int),
        P::writable("multi_factor_authentication_required").with_cast(cast_bool),
        P::writable("force_shared_secret_key_change").with_cast(cast_bool),
        P::writable("email_address"),
        P::read_only("object_uri"),
        P::read_only("object_id"),
        P::read_only("parent"),
        P::read_only("class"),
        P::read_only("user_pattern_uri"),
        P::writable("user_pattern_name"),
        P::read_only("password_expires"),
        P::read_only("replication_overwrite_possible"),
        // artificial, only in results
        P::read_only("user_pattern"),
        P::read_only("default_group"),
        P::read_only("password_rule"),
        P::read_only("ldap_server_definition"),
        P::read_only("user_role_objects"),
    ],
};
