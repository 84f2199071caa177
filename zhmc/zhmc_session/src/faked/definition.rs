//! Definition files of faked HMCs.
//!
//! A faked HMC can be described in a TOML or JSON file. Objects are given
//! with their HMC properties (hyphenated names). References between objects
//! use names, and are resolved to URIs when the faked HMC is built.
//!
//! ```toml
//! [[cpcs]]
//! [cpcs.properties]
//! name = "CPC1"
//! dpm-enabled = true
//!
//! [[cpcs.adapters]]
//! [cpcs.adapters.properties]
//! name = "FCP1"
//! type = "fcp"
//! adapter-family = "ficon"
//!
//! [[cpcs.adapters.ports]]
//! name = "Port 0"
//! index = 0
//! ```

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

use super::FakedHmc;
use zhmc_core::{Error, Filter, HmcClient, Properties, ResourceClass, Result, CONSOLE_URI};

/// A faked HMC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HmcDefinition {
    /// Result of the "Query API Version" operation.
    pub api_version: Option<Properties>,

    /// Properties of the console, merged into the default ones.
    pub console: Option<Properties>,

    /// CPCs with their child objects.
    pub cpcs: Vec<CpcDefinition>,

    /// Storage groups.
    pub storage_groups: Vec<StorageGroupDefinition>,

    /// User roles.
    pub user_roles: Vec<Properties>,

    /// Password rules.
    pub password_rules: Vec<Properties>,

    /// LDAP server definitions.
    pub ldap_server_definitions: Vec<Properties>,

    /// Users.
    pub users: Vec<UserDefinition>,

    /// User patterns.
    pub user_patterns: Vec<Properties>,

    /// Tasks that user role permissions can refer to.
    pub tasks: Vec<Properties>,
}

/// A CPC of a faked HMC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpcDefinition {
    /// Properties of the CPC.
    pub properties: Properties,

    /// Adapters of the CPC.
    pub adapters: Vec<AdapterDefinition>,

    /// Virtual switches of the CPC.
    pub virtual_switches: Vec<VirtualSwitchDefinition>,

    /// Partitions of the CPC (DPM mode).
    pub partitions: Vec<PartitionDefinition>,

    /// LPARs of the CPC (classic mode).
    pub lpars: Vec<Properties>,
}

/// An adapter of a faked CPC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterDefinition {
    /// Properties of the adapter.
    pub properties: Properties,

    /// Properties of the ports of the adapter.
    pub ports: Vec<Properties>,
}

/// A virtual switch of a faked CPC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualSwitchDefinition {
    /// Properties of the virtual switch.
    pub properties: Properties,

    /// Name of the backing adapter; sets `backing-adapter-uri`.
    pub backing_adapter: Option<String>,
}

/// A partition of a faked CPC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionDefinition {
    /// Properties of the partition.
    pub properties: Properties,

    /// OS messages returned for every OS command sent to the partition.
    pub os_command_response: Vec<String>,
}

/// A storage group of a faked HMC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageGroupDefinition {
    /// Properties of the storage group.
    pub properties: Properties,

    /// Name of the CPC the storage group is associated with.
    pub cpc: String,

    /// Properties of the storage volumes.
    pub volumes: Vec<Properties>,

    /// Candidate adapter ports, as `[adapter name, port index]`.
    pub candidate_adapter_ports: Vec<(String, i64)>,

    /// Names of the partitions the storage group is attached to.
    pub attached_partitions: Vec<String>,
}

/// A user of a faked HMC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDefinition {
    /// Properties of the user.
    pub properties: Properties,

    /// Names of the user roles assigned to the user.
    pub user_roles: Vec<String>,
}

impl HmcDefinition {
    /// Load a definition from a file.
    ///
    /// Files with a `.json` extension are parsed as JSON, all others as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading faked HMC definition from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read faked HMC definition {}: {}",
                path.display(),
                e
            ))
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Parse a definition from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse faked HMC definition: {}", e)))
    }

    /// Parse a definition from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse faked HMC definition: {}", e)))
    }
}

fn find_uri(
    hmc: &FakedHmc,
    class: ResourceClass,
    parent: Option<&str>,
    name: &str,
) -> Result<String> {
    hmc.list(class, parent, &Filter::by_name(name))?
        .into_iter()
        .next()
        .map(|obj| obj.uri)
        .ok_or_else(|| {
            Error::Config(format!(
                "Faked HMC definition references {} '{}', which is not defined",
                class, name
            ))
        })
}

impl FakedHmc {
    /// Build a faked HMC from a definition.
    pub fn from_definition(def: &HmcDefinition) -> Result<Self> {
        let hmc = FakedHmc::new();
        if let Some(api_version) = &def.api_version {
            hmc.set_api_version(api_version.clone());
        }
        if let Some(console) = &def.console {
            hmc.set_properties(CONSOLE_URI, console)?;
        }

        for cpc_def in &def.cpcs {
            let cpc = hmc.add_cpc(cpc_def.properties.clone())?;
            for adapter_def in &cpc_def.adapters {
                let adapter =
                    hmc.add(ResourceClass::Adapter, Some(&cpc), adapter_def.properties.clone())?;
                for port in &adapter_def.ports {
                    hmc.add(ResourceClass::Port, Some(&adapter), port.clone())?;
                }
            }
            for vswitch_def in &cpc_def.virtual_switches {
                let mut props = vswitch_def.properties.clone();
                if let Some(adapter_name) = &vswitch_def.backing_adapter {
                    let adapter_uri =
                        find_uri(&hmc, ResourceClass::Adapter, Some(&cpc), adapter_name)?;
                    props.insert("backing-adapter-uri".to_string(), json!(adapter_uri));
                }
                hmc.add(ResourceClass::VirtualSwitch, Some(&cpc), props)?;
            }
            for part_def in &cpc_def.partitions {
                let part =
                    hmc.add(ResourceClass::Partition, Some(&cpc), part_def.properties.clone())?;
                if !part_def.os_command_response.is_empty() {
                    hmc.set_os_command_response(&part, part_def.os_command_response.clone());
                }
            }
            for lpar in &cpc_def.lpars {
                hmc.add(ResourceClass::Lpar, Some(&cpc), lpar.clone())?;
            }
        }

        for sg_def in &def.storage_groups {
            let cpc = find_uri(&hmc, ResourceClass::Cpc, None, &sg_def.cpc)?;
            let mut props = sg_def.properties.clone();
            props.insert("cpc-uri".to_string(), json!(cpc));
            let mut port_uris = Vec::new();
            for (adapter_name, index) in &sg_def.candidate_adapter_ports {
                let adapter = find_uri(&hmc, ResourceClass::Adapter, Some(&cpc), adapter_name)?;
                let port = hmc
                    .list(
                        ResourceClass::Port,
                        Some(&adapter),
                        &Filter::all().with("index", *index),
                    )?
                    .into_iter()
                    .next()
                    .ok_or_else(|| {
                        Error::Config(format!(
                            "Adapter '{}' has no port with index {}",
                            adapter_name, index
                        ))
                    })?;
                port_uris.push(Value::String(port.uri));
            }
            props.insert(
                "candidate-adapter-port-uris".to_string(),
                Value::Array(port_uris),
            );
            let sg = hmc.add_console_object(ResourceClass::StorageGroup, props)?;
            for volume in &sg_def.volumes {
                hmc.add(ResourceClass::StorageVolume, Some(&sg), volume.clone())?;
            }
            for part_name in &sg_def.attached_partitions {
                let part = find_uri(&hmc, ResourceClass::Partition, Some(&cpc), part_name)?;
                let mut part_props = hmc.get(&part)?.properties;
                let mut uris = part_props
                    .remove("storage-group-uris")
                    .and_then(|v| v.as_array().cloned())
                    .unwrap_or_default();
                uris.push(json!(sg));
                hmc.set_properties(&part, &json_props("storage-group-uris", Value::Array(uris)))?;
            }
        }

        for task in &def.tasks {
            hmc.add_console_object(ResourceClass::Task, task.clone())?;
        }
        for role in &def.user_roles {
            hmc.add_console_object(ResourceClass::UserRole, role.clone())?;
        }
        for rule in &def.password_rules {
            hmc.add_console_object(ResourceClass::PasswordRule, rule.clone())?;
        }
        for ldap in &def.ldap_server_definitions {
            hmc.add_console_object(ResourceClass::LdapServerDefinition, ldap.clone())?;
        }
        for pattern in &def.user_patterns {
            hmc.add_console_object(ResourceClass::UserPattern, pattern.clone())?;
        }
        for user_def in &def.users {
            let mut props = user_def.properties.clone();
            let roles = user_def
                .user_roles
                .iter()
                .map(|name| {
                    find_uri(&hmc, ResourceClass::UserRole, Some(CONSOLE_URI), name).map(Value::String)
                })
                .collect::<Result<Vec<_>>>()?;
            props.insert("user-roles".to_string(), Value::Array(roles));
            hmc.add_console_object(ResourceClass::User, props)?;
        }

        Ok(hmc)
    }

    /// Build a faked HMC from a definition file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_definition(&HmcDefinition::load(path)?)
    }
}

fn json_props(name: &str, value: Value) -> Properties {
    let mut props = Properties::new();
    props.insert(name.to_string(), value);
    props
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFINITION: &str = r#"
        [console]
        version = "2.15.0"

        [[cpcs]]
        [cpcs.properties]
        name = "CPC1"
        dpm-enabled = true

        [[cpcs.adapters]]
        [cpcs.adapters.properties]
        name = "FCP1"
        adapter-family = "ficon"

        [[cpcs.adapters.ports]]
        name = "Port 0"
        index = 0

        [[cpcs.partitions]]
        properties = { name = "PART1", status = "active" }

        [[storage_groups]]
        cpc = "CPC1"
        candidate_adapter_ports = [["FCP1", 0]]
        attached_partitions = ["PART1"]
        properties = { name = "SG1", type = "fcp" }

        [[user_roles]]
        name = "ops"

        [[users]]
        user_roles = ["ops"]
        properties = { name = "alice", type = "standard" }
    "#;

    #[test]
    fn test_build_from_toml() {
        let def = HmcDefinition::from_toml(DEFINITION).unwrap();
        let hmc = FakedHmc::from_definition(&def).unwrap();

        assert_eq!(hmc.console().unwrap().str_prop("version"), Some("2.15.0"));

        let cpc = hmc.find(ResourceClass::Cpc, None, "CPC1").unwrap();
        let part = hmc
            .find(ResourceClass::Partition, Some(&cpc.uri), "PART1")
            .unwrap();
        let sg = hmc
            .find(ResourceClass::StorageGroup, Some(CONSOLE_URI), "SG1")
            .unwrap();
        assert_eq!(sg.str_prop("cpc-uri"), Some(cpc.uri.as_str()));
        assert_eq!(sg.str_list_prop("candidate-adapter-port-uris").len(), 1);
        assert_eq!(part.str_list_prop("storage-group-uris"), vec![sg.uri.clone()]);

        let role = hmc
            .find(ResourceClass::UserRole, Some(CONSOLE_URI), "ops")
            .unwrap();
        let user = hmc
            .find(ResourceClass::User, Some(CONSOLE_URI), "alice")
            .unwrap();
        assert_eq!(user.str_list_prop("user-roles"), vec![role.uri]);
        assert!(hmc.mutations().is_empty());
    }

    #[test]
    fn test_unknown_reference() {
        let def = HmcDefinition::from_toml(
            r#"
            [[storage_groups]]
            cpc = "NOPE"
            properties = { name = "SG1" }
            "#,
        )
        .unwrap();
        let err = FakedHmc::from_definition(&def).err().unwrap();
        assert_eq!(err.class_name(), "ConfigError");
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hmc.json");
        std::fs::write(
            &path,
            r#"{"cpcs": [{"properties": {"name": "CPC1"}, "lpars": [{"name": "LP1"}]}]}"#,
        )
        .unwrap();
        let hmc = FakedHmc::load(&path).unwrap();
        let cpc = hmc.find(ResourceClass::Cpc, None, "CPC1").unwrap();
        let lpar = hmc.find(ResourceClass::Lpar, Some(&cpc.uri), "LP1").unwrap();
        assert_eq!(lpar.str_prop("status"), Some("not-activated"));
    }
}
