//! The `zhmc_password_rule` module: password rules of the HMC.

use serde::Deserialize;
use serde_json::{json, Value};

use zhmc_core::tables::PASSWORD_RULE_PROPERTIES;
use zhmc_core::{HmcClient, Properties, PropertyTable, ResourceClass, Result};

use super::console_object::{self, ConsoleObjectType};
use crate::module::ModuleOutput;
use crate::params::parse_params;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PasswordRuleState {
    Absent,
    Present,
    Facts,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PasswordRuleParams {
    name: String,
    state: PasswordRuleState,
    #[serde(default)]
    properties: Option<Properties>,
}

struct PasswordRule;

impl ConsoleObjectType for PasswordRule {
    const CLASS: ResourceClass = ResourceClass::PasswordRule;
    const TABLE: &'static PropertyTable = &PASSWORD_RULE_PROPERTIES;
    const OPERATION_NAME: &'static str = "Password Rule";

    fn required_properties(_input: &Properties) -> Vec<&'static str> {
        vec!["name"]
    }

    fn default_properties() -> Value {
        json!({
            "description": "",
            "expiration": 0,
            "min-length": 8,
            "max-length": 256,
            "consecutive-characters": 0,
            "similarity-count": 0,
            "history-count": 0,
            "case-sensitive": false,
            "character-rules": [],
            "type": "user-defined",
            "replication-overwrite-possible": true,
        })
    }
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: PasswordRuleParams = parse_params(params)?;
    match params.state {
        PasswordRuleState::Absent => {
            console_object::ensure_absent::<PasswordRule>(client, &params.name, check_mode)
        }
        PasswordRuleState::Present => console_object::ensure_present::<PasswordRule>(
            client,
            &params.name,
            &params.properties.unwrap_or_default(),
            check_mode,
        ),
        PasswordRuleState::Facts => console_object::facts::<PasswordRule>(client, &params.name),
    }
}
