//! HMC resources.
//!
//! A `Resource` is a local, transient view of one HMC object: its canonical
//! URI, its class, the URI of its parent object and the properties that have
//! been retrieved so far. Property names use the HMC (hyphenated) notation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A property dictionary keyed by HMC (hyphenated) property names.
pub type Properties = serde_json::Map<String, Value>;

/// The classes of HMC resources the modules work with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceClass {
    /// The HMC itself.
    Console,
    /// A CPC (in DPM or classic mode).
    Cpc,
    /// A partition of a CPC in DPM mode.
    Partition,
    /// A logical partition of a CPC in classic mode.
    Lpar,
    /// An adapter of a CPC.
    Adapter,
    /// A port of an adapter.
    Port,
    /// A virtual switch backed by an OSA or HiperSockets adapter.
    VirtualSwitch,
    /// An HBA of a partition.
    Hba,
    /// A NIC of a partition.
    Nic,
    /// A virtual function of a partition.
    VirtualFunction,
    /// A storage group (HMC console level).
    StorageGroup,
    /// A storage volume of a storage group.
    StorageVolume,
    /// An HMC user.
    User,
    /// An HMC user role.
    UserRole,
    /// An HMC user pattern.
    UserPattern,
    /// An HMC password rule.
    PasswordRule,
    /// An HMC LDAP server definition.
    LdapServerDefinition,
    /// An HMC task, as a permitted object of user roles.
    Task,
}

impl ResourceClass {
    /// The HMC class name, as used in the `class` property.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Cpc => "cpc",
            Self::Partition => "partition",
            Self::Lpar => "logical-partition",
            Self::Adapter => "adapter",
            Self::Port => "port",
            Self::VirtualSwitch => "virtual-switch",
            Self::Hba => "hba",
            Self::Nic => "nic",
            Self::VirtualFunction => "virtual-function",
            Self::StorageGroup => "storage-group",
            Self::StorageVolume => "storage-volume",
            Self::User => "user",
            Self::UserRole => "user-role",
            Self::UserPattern => "user-pattern",
            Self::PasswordRule => "password-rule",
            Self::LdapServerDefinition => "ldap-server-definition",
            Self::Task => "task",
        }
    }

    /// The human readable class name used in messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Console => "Console",
            Self::Cpc => "CPC",
            Self::Partition => "Partition",
            Self::Lpar => "LPAR",
            Self::Adapter => "Adapter",
            Self::Port => "Port",
            Self::VirtualSwitch => "VirtualSwitch",
            Self::Hba => "HBA",
            Self::Nic => "NIC",
            Self::VirtualFunction => "VirtualFunction",
            Self::StorageGroup => "StorageGroup",
            Self::StorageVolume => "StorageVolume",
            Self::User => "User",
            Self::UserRole => "UserRole",
            Self::UserPattern => "UserPattern",
            Self::PasswordRule => "PasswordRule",
            Self::LdapServerDefinition => "LdapServerDefinition",
            Self::Task => "Task",
        }
    }

    /// The URI segment under which objects of this class live.
    pub fn uri_segment(&self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Cpc => "cpcs",
            Self::Partition => "partitions",
            Self::Lpar => "logical-partitions",
            Self::Adapter => "adapters",
            Self::Port => "ports",
            Self::VirtualSwitch => "virtual-switches",
            Self::Hba => "hbas",
            Self::Nic => "nics",
            Self::VirtualFunction => "virtual-functions",
            Self::StorageGroup => "storage-groups",
            Self::StorageVolume => "storage-volumes",
            Self::User => "users",
            Self::UserRole => "user-roles",
            Self::UserPattern => "user-patterns",
            Self::PasswordRule => "password-rules",
            Self::LdapServerDefinition => "ldap-server-definitions",
            Self::Task => "console/tasks",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local view of an HMC object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Canonical URI of the object.
    pub uri: String,

    /// Class of the object.
    pub class: ResourceClass,

    /// URI of the parent object, if any.
    pub parent: Option<String>,

    /// Properties retrieved so far.
    pub properties: Properties,
}

impl Resource {
    /// Create a resource view.
    pub fn new(
        uri: impl Into<String>,
        class: ResourceClass,
        parent: Option<String>,
        properties: Properties,
    ) -> Self {
        Self {
            uri: uri.into(),
            class,
            parent,
            properties,
        }
    }

    /// The value of the `name` property, or an empty string.
    pub fn name(&self) -> &str {
        self.str_prop("name").unwrap_or("")
    }

    /// Get a property value.
    pub fn prop(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Get a string property value.
    pub fn str_prop(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(Value::as_str)
    }

    /// Get a boolean property value, treating absence as `false`.
    pub fn bool_prop(&self, name: &str) -> bool {
        self.properties
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Get an integer property value.
    pub fn int_prop(&self, name: &str) -> Option<i64> {
        self.properties.get(name).and_then(Value::as_i64)
    }

    /// Get a list of strings property value, treating absence as empty.
    pub fn str_list_prop(&self, name: &str) -> Vec<String> {
        match self.properties.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Merge properties into the local view, without contacting the HMC.
    pub fn update_local(&mut self, props: &Properties) {
        for (key, value) in props {
            self.properties.insert(key.clone(), value.clone());
        }
    }
}

/// A conjunction of property equality conditions used to filter lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter matching every object.
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter matching objects with the given name.
    pub fn by_name(name: &str) -> Self {
        Self::all().with("name", Value::String(name.to_string()))
    }

    /// Add an equality condition.
    pub fn with(mut self, property: &str, value: impl Into<Value>) -> Self {
        self.conditions.push((property.to_string(), value.into()));
        self
    }

    /// Check whether the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Check whether the given properties satisfy all conditions.
    pub fn matches(&self, props: &Properties) -> bool {
        self.conditions
            .iter()
            .all(|(key, value)| props.get(key) == Some(value))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .conditions
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        write!(f, "with {}", parts.join(", "))
    }
}
