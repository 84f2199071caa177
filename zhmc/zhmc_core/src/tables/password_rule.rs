use crate::property::cast::{cast_bool, cast_int, cast_unicode};
use crate::property::{PropertySpec as P, PropertyTable};

/// Properties of password rules.
pub static PASSWORD_RULE_PROPERTIES: PropertyTable = PropertyTable {
    resource: "PasswordRule",
    plural: "password rules",
    specs: &[
        P::new("name", false, true, true, true),
        P::writable("description").with_cast(cast_unicode),
        P::writable("expiration").with_cast(cast_int),
        P::writable("min_length").with_cast(cast_int),
        P::writable("max_length").with_cast(cast_int),
        P::writable("consecutive_characters").with_cast(cast_int),
        P::writable("similarity_count").with_cast(cast_int),
        P::writable("history_count").with_cast(cast_int),
        P::writable("case_sensitive").with_cast(cast_bool),
        // list of character-rule objects
        P::writable("character_rules"),
        P::read_only("element_uri"),
        P::read_only("element_id"),
        P::read_only("parent"),
        P::read_only("class"),
        P::read_only("type"),
        P::read_only("replication_overwrite_possible"),
    ],
};
