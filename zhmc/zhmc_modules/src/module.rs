//! Module dispatch and the module runner.

use log::debug;
use serde_json::Value;
use std::fmt;

use zhmc_core::utils::blanked_params;
use zhmc_core::{Error, HmcClient, Properties, Result};
use zhmc_session::SessionFactory;

use crate::modules;
use crate::params::CommonParams;

/// The zhmc modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Partition,
    Hba,
    Nic,
    VirtualFunction,
    StorageGroup,
    StorageGroupAttachment,
    StorageVolume,
    User,
    PasswordRule,
    LdapServerDefinition,
    UserRole,
    UserPattern,
    CryptoAttachment,
    Cpc,
    CpcCapacity,
    Adapter,
    Console,
    Lpar,
    PartitionCommand,
}

impl ModuleKind {
    /// All modules, in the order they are listed.
    pub const ALL: [ModuleKind; 19] = [
        Self::Partition,
        Self::Hba,
        Self::Nic,
        Self::VirtualFunction,
        Self::StorageGroup,
        Self::StorageGroupAttachment,
        Self::StorageVolume,
        Self::User,
        Self::PasswordRule,
        Self::LdapServerDefinition,
        Self::UserRole,
        Self::UserPattern,
        Self::CryptoAttachment,
        Self::Cpc,
        Self::CpcCapacity,
        Self::Adapter,
        Self::Console,
        Self::Lpar,
        Self::PartitionCommand,
    ];

    /// The module name, e.g. `zhmc_partition`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Partition => "zhmc_partition",
            Self::Hba => "zhmc_hba",
            Self::Nic => "zhmc_nic",
            Self::VirtualFunction => "zhmc_virtual_function",
            Self::StorageGroup => "zhmc_storage_group",
            Self::StorageGroupAttachment => "zhmc_storage_group_attachment",
            Self::StorageVolume => "zhmc_storage_volume",
            Self::User => "zhmc_user",
            Self::PasswordRule => "zhmc_password_rule",
            Self::LdapServerDefinition => "zhmc_ldap_server_definition",
            Self::UserRole => "zhmc_user_role",
            Self::UserPattern => "zhmc_user_pattern",
            Self::CryptoAttachment => "zhmc_crypto_attachment",
            Self::Cpc => "zhmc_cpc",
            Self::CpcCapacity => "zhmc_cpc_capacity",
            Self::Adapter => "zhmc_adapter",
            Self::Console => "zhmc_console",
            Self::Lpar => "zhmc_lpar",
            Self::PartitionCommand => "zhmc_partition_command",
        }
    }

    /// Look up a module by name, with or without the `zhmc_` prefix.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.strip_prefix("zhmc_").unwrap_or(name);
        Self::ALL
            .iter()
            .copied()
            .find(|kind| &kind.name()["zhmc_".len()..] == name)
    }

    /// The key of the module result in the module output.
    pub fn result_key(&self) -> &'static str {
        match self {
            Self::Partition => "partition",
            Self::Hba => "hba",
            Self::Nic => "nic",
            Self::VirtualFunction => "virtual_function",
            Self::StorageGroup => "storage_group",
            Self::StorageGroupAttachment => "storage_group_attachment",
            Self::StorageVolume => "storage_volume",
            Self::User => "user",
            Self::PasswordRule => "password_rule",
            Self::LdapServerDefinition => "ldap_server_definition",
            Self::UserRole => "user_role",
            Self::UserPattern => "user_pattern",
            Self::CryptoAttachment => "crypto_configuration",
            Self::Cpc | Self::CpcCapacity => "cpc",
            Self::Adapter => "adapter",
            Self::Console => "hmc",
            Self::Lpar => "lpar",
            Self::PartitionCommand => "output",
        }
    }

    /// Names within the `properties` parameter that must not be logged.
    pub fn blanked_properties(&self) -> &'static [&'static str] {
        match self {
            Self::User => &["password"],
            Self::LdapServerDefinition => &["bind_password"],
            Self::Partition => &["boot_ftp_password", "ssc_master_pw"],
            _ => &[],
        }
    }

    fn run(
        &self,
        client: &dyn HmcClient,
        params: &Properties,
        check_mode: bool,
    ) -> Result<ModuleOutput> {
        match self {
            Self::Partition => modules::partition::run(client, params, check_mode),
            Self::Hba => modules::hba::run(client, params, check_mode),
            Self::Nic => modules::nic::run(client, params, check_mode),
            Self::VirtualFunction => modules::virtual_function::run(client, params, check_mode),
            Self::StorageGroup => modules::storage_group::run(client, params, check_mode),
            Self::StorageGroupAttachment => {
                modules::storage_group_attachment::run(client, params, check_mode)
            }
            Self::StorageVolume => modules::storage_volume::run(client, params, check_mode),
            Self::User => modules::user::run(client, params, check_mode),
            Self::PasswordRule => modules::password_rule::run(client, params, check_mode),
            Self::LdapServerDefinition => {
                modules::ldap_server_definition::run(client, params, check_mode)
            }
            Self::UserRole => modules::user_role::run(client, params, check_mode),
            Self::UserPattern => modules::user_pattern::run(client, params, check_mode),
            Self::CryptoAttachment => modules::crypto_attachment::run(client, params, check_mode),
            Self::Cpc => modules::cpc::run(client, params, check_mode),
            Self::CpcCapacity => modules::cpc_capacity::run(client, params, check_mode),
            Self::Adapter => modules::adapter::run(client, params, check_mode),
            Self::Console => modules::console::run(client, params, check_mode),
            Self::Lpar => modules::lpar::run(client, params, check_mode),
            Self::PartitionCommand => modules::partition_command::run(client, params, check_mode),
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The outcome of a successful module run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleOutput {
    /// Whether the module changed (or in check mode, would have changed)
    /// anything.
    pub changed: bool,

    /// The module result, returned under the module's result key.
    pub result: Value,

    /// Additional top-level output entries.
    pub extra: Properties,
}

impl ModuleOutput {
    /// Create a module output without extra entries.
    pub fn new(changed: bool, result: impl Into<Value>) -> Self {
        Self {
            changed,
            result: result.into(),
            extra: Properties::new(),
        }
    }

    /// Add an extra top-level output entry.
    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// The output as returned to the caller of the module.
    pub fn to_json(&self, result_key: &str) -> Value {
        let mut out = Properties::new();
        out.insert("changed".to_string(), Value::Bool(self.changed));
        out.insert(result_key.to_string(), self.result.clone());
        out.extend(self.extra.clone());
        Value::Object(out)
    }
}

/// Runs modules against sessions from a session factory.
#[derive(Clone)]
pub struct ModuleRunner {
    factory: SessionFactory,
}

impl ModuleRunner {
    /// Create a runner.
    pub fn new(factory: SessionFactory) -> Self {
        Self { factory }
    }

    /// Run a module.
    ///
    /// # Arguments
    ///
    /// * `kind` - The module to run.
    /// * `params` - All module parameters, including the connection
    ///   parameters.
    /// * `check_mode` - Only report what would change.
    ///
    /// # Returns
    ///
    /// The module output. The session is closed in any case.
    pub fn run(
        &self,
        kind: ModuleKind,
        params: &Properties,
        check_mode: bool,
    ) -> Result<ModuleOutput> {
        debug!(
            "Module entry: {}: params: {}",
            kind,
            Value::Object(blanked_params(params, kind.blanked_properties()))
        );
        let result = self.run_in_session(kind, params, check_mode);
        match &result {
            Ok(output) => debug!(
                "Module exit (success): changed: {}, {}: {}",
                output.changed,
                kind.result_key(),
                output.result
            ),
            Err(e) => debug!("Module exit (failure): msg: {}", e.failure_message()),
        }
        result
    }

    fn run_in_session(
        &self,
        kind: ModuleKind,
        params: &Properties,
        check_mode: bool,
    ) -> Result<ModuleOutput> {
        let common = CommonParams::from_params(params)?;
        let hosts = common.hosts()?;
        let session = self.factory.open(&hosts, &common.hmc_auth)?;
        let result = kind.run(session.client(), params, check_mode);
        match session.close() {
            Err(e) if result.is_ok() => Err(e),
            _ => result,
        }
    }
}

/// A string module parameter that a state requires. Empty strings count as
/// missing.
pub(crate) fn required_str<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(Error::parameter(format!(
            "Missing required module input parameter: {}",
            name
        ))),
    }
}
