//! The `zhmc_ldap_server_definition` module: LDAP server definitions of
//! the HMC.

use serde::Deserialize;
use serde_json::{json, Value};

use zhmc_core::tables::LDAP_SERVER_DEFINITION_PROPERTIES;
use zhmc_core::{HmcClient, Properties, PropertyTable, ResourceClass, Result};

use super::console_object::{self, ConsoleObjectType};
use crate::module::ModuleOutput;
use crate::params::parse_params;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum LdapServerDefinitionState {
    Absent,
    Present,
    Facts,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LdapServerDefinitionParams {
    name: String,
    state: LdapServerDefinitionState,
    #[serde(default)]
    properties: Option<Properties>,
}

struct LdapServerDefinition;

impl ConsoleObjectType for LdapServerDefinition {
    const CLASS: ResourceClass = ResourceClass::LdapServerDefinition;
    const TABLE: &'static PropertyTable = &LDAP_SERVER_DEFINITION_PROPERTIES;
    const OPERATION_NAME: &'static str = "LDAP Server Definition";
    const WRITE_ONLY: &'static [&'static str] = &["bind-password"];

    fn required_properties(input: &Properties) -> Vec<&'static str> {
        let mut required = vec!["name", "search-distinguished-name", "primary-hostname-ipaddr"];
        if input.get("location-method").and_then(Value::as_str) == Some("subtree") {
            required.push("search-filter");
        }
        required
    }

    fn default_properties() -> Value {
        json!({
            "description": "",
            "connection-port": null,
            "backup-hostname-ipaddr": null,
            "use-ssl": false,
            "tolerate-untrusted-certificates": null,
            "bind-distinguished-name": null,
            "bind-password": null,
            "location-method": "pattern",
            "search-scope": null,
            "search-filter": null,
            "replication-overwrite-possible": false,
        })
    }
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: LdapServerDefinitionParams = parse_params(params)?;
    match params.state {
        LdapServerDefinitionState::Absent => {
            console_object::ensure_absent::<LdapServerDefinition>(client, &params.name, check_mode)
        }
        LdapServerDefinitionState::Present => console_object::ensure_present::<LdapServerDefinition>(
            client,
            &params.name,
            &params.properties.unwrap_or_default(),
            check_mode,
        ),
        LdapServerDefinitionState::Facts => {
            console_object::facts::<LdapServerDefinition>(client, &params.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zhmc_session::FakedHmc;

    fn params(state: &str, properties: Value) -> Properties {
        json!({"name": "corp-ldap", "state": state, "properties": properties})
            .as_object()
            .unwrap()
            .clone()
    }

    fn ldap_input() -> Value {
        json!({
            "primary_hostname_ipaddr": "ldap.example.com",
            "search_distinguished_name": "uid={0},ou=people,dc=example,dc=com",
            "connection_port": "636",
            "use_ssl": true,
            "bind_password": "secret",
        })
    }

    #[test]
    fn test_create_hides_bind_password() {
        let hmc = FakedHmc::new();
        let output = run(&hmc, &params("present", ldap_input()), false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["connection-port"], 636);
        assert!(output.result.get("bind-password").is_none());

        let output = run(&hmc, &params("facts", json!({})), false).unwrap();
        assert!(output.result.get("bind-password").is_none());
    }

    #[test]
    fn test_check_mode_subtree_needs_search_filter() {
        let hmc = FakedHmc::new();
        let mut input = ldap_input();
        input["location_method"] = json!("subtree");
        let err = run(&hmc, &params("present", input), true).unwrap_err();
        assert!(err.is_http(400, 4));
        assert_eq!(
            err.to_string(),
            "400,4: Required input properties missing for Create LDAP Server Definition: \
             ['search-filter']"
        );
    }

    #[test]
    fn test_check_mode_create() {
        let hmc = FakedHmc::new();
        let output = run(&hmc, &params("present", ldap_input()), true).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["location-method"], "pattern");
        assert!(output.result.get("bind-password").is_none());
        assert!(hmc.mutations().is_empty());
    }
}
