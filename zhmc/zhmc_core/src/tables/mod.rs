//! Property tables of the HMC resource types.
//!
//! Names use the module notation (underscores). Read-only properties are
//! listed so that specifying them is reported as "not allowed" rather than
//! "not defined in the data model".

mod adapter;
mod cpc;
mod hba;
mod ldap_server_definition;
mod lpar;
mod nic;
mod partition;
mod password_rule;
mod storage_group;
mod storage_volume;
mod user;
mod user_pattern;
mod user_role;
mod virtual_function;

pub use adapter::ADAPTER_PROPERTIES;
pub use cpc::CPC_PROPERTIES;
pub use hba::HBA_PROPERTIES;
pub use ldap_server_definition::LDAP_SERVER_DEFINITION_PROPERTIES;
pub use lpar::LPAR_PROPERTIES;
pub use nic::NIC_PROPERTIES;
pub use partition::PARTITION_PROPERTIES;
pub use password_rule::PASSWORD_RULE_PROPERTIES;
pub use storage_group::STORAGE_GROUP_PROPERTIES;
pub use storage_volume::STORAGE_VOLUME_PROPERTIES;
pub use user::USER_PROPERTIES;
pub use user_pattern::USER_PATTERN_PROPERTIES;
pub use user_role::USER_ROLE_PROPERTIES;
pub use virtual_function::VIRTUAL_FUNCTION_PROPERTIES;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyTable;

    fn all_tables() -> Vec<&'static PropertyTable> {
        vec![
            &ADAPTER_PROPERTIES,
            &CPC_PROPERTIES,
            &HBA_PROPERTIES,
            &LDAP_SERVER_DEFINITION_PROPERTIES,
            &LPAR_PROPERTIES,
            &NIC_PROPERTIES,
            &PARTITION_PROPERTIES,
            &PASSWORD_RULE_PROPERTIES,
            &STORAGE_GROUP_PROPERTIES,
            &STORAGE_VOLUME_PROPERTIES,
            &USER_PROPERTIES,
            &USER_PATTERN_PROPERTIES,
            &USER_ROLE_PROPERTIES,
            &VIRTUAL_FUNCTION_PROPERTIES,
        ]
    }

    #[test]
    fn test_names_are_unique_and_underscored() {
        for table in all_tables() {
            let mut names: Vec<&str> = table.iter().map(|s| s.name).collect();
            assert!(names.iter().all(|n| !n.contains('-')), "{}", table.plural);
            let count = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), count, "duplicate in {}", table.plural);
        }
    }

    #[test]
    fn test_every_table_has_name_property_not_allowed() {
        for table in all_tables() {
            if let Some(spec) = table.get("name") {
                assert!(!spec.allowed, "{}", table.plural);
            }
        }
    }
}
