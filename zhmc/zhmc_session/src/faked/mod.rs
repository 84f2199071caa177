//! An in-memory HMC.
//!
//! `FakedHmc` implements `HmcClient` on an in-memory object tree. Objects get
//! the identity properties an HMC assigns (`object-id`/`object-uri`, or
//! `element-id`/`element-uri` for element objects such as HBAs and NICs),
//! `class` and `parent`. Partitions get the HMC defaults of all properties
//! not given on creation.
//!
//! Operations change the object properties the way the HMC does as far as
//! the modules can observe. Transitional statuses (`starting`, `stopping`)
//! can be set with `set_status` and are resolved by `wait_for_status`.
//!
//! All mutating client calls are recorded and can be inspected with
//! `mutations`, which is how tests verify that check mode does not change
//! anything.

mod definition;
mod messages;
mod operations;

pub use definition::{
    AdapterDefinition, CpcDefinition, HmcDefinition, PartitionDefinition,
    StorageGroupDefinition, UserDefinition, VirtualSwitchDefinition,
};
pub use messages::FakedOsMessageReceiver;

use crossbeam_channel::{unbounded, Sender};
use log::debug;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use zhmc_core::tables::PARTITION_PROPERTIES;
use zhmc_core::{
    ClientError, Error, Filter, HmcClient, Operation, OsMessageReceiver, Properties, Resource,
    ResourceClass, Result, CONSOLE_URI,
};

/// An in-memory HMC.
pub struct FakedHmc {
    state: RwLock<FakedState>,
}

/// The objects and bookkeeping of a faked HMC.
pub(crate) struct FakedState {
    api_version: Properties,
    objects: HashMap<String, Resource>,
    order: Vec<String>,
    os_responses: HashMap<String, Vec<String>>,
    channels: HashMap<String, Vec<Sender<Vec<String>>>>,
    mutations: Vec<String>,
    logoffs: usize,
    next_device_number: u32,
}

/// Whether objects of the class are element objects, whose URIs are below
/// the URI of their parent.
fn is_element(class: ResourceClass) -> bool {
    matches!(
        class,
        ResourceClass::Hba
            | ResourceClass::Nic
            | ResourceClass::VirtualFunction
            | ResourceClass::Port
            | ResourceClass::StorageVolume
    )
}

/// The parent property listing the URIs of child objects of the class.
fn child_list_property(class: ResourceClass) -> Option<&'static str> {
    match class {
        ResourceClass::Hba => Some("hba-uris"),
        ResourceClass::Nic => Some("nic-uris"),
        ResourceClass::VirtualFunction => Some("virtual-function-uris"),
        ResourceClass::StorageVolume => Some("storage-volume-uris"),
        _ => None,
    }
}

/// The system-defined user role the HMC associates with new user roles.
const DEFAULT_SYSTEM_ROLE: &str = "hmc-operator-tasks";

pub(crate) fn not_found(uri: &str) -> Error {
    ClientError::http(404, 1, format!("The object with URI {} does not exist", uri)).into()
}

impl FakedState {
    fn new() -> Self {
        let mut state = Self {
            api_version: json!({
                "api-major-version": 4,
                "api-minor-version": 10,
                "hmc-version": "2.16.0",
                "hmc-name": "HMC1",
            })
            .as_object()
            .cloned()
            .unwrap_or_default(),
            objects: HashMap::new(),
            order: Vec::new(),
            os_responses: HashMap::new(),
            channels: HashMap::new(),
            mutations: Vec::new(),
            logoffs: 0,
            next_device_number: 0x1000,
        };
        let console = json!({
            "object-uri": CONSOLE_URI,
            "class": "console",
            "name": "HMC1",
            "version": "2.16.0",
            "ec-mcl-description": {"bundle-level": "H21"},
        });
        state.objects.insert(
            CONSOLE_URI.to_string(),
            Resource::new(
                CONSOLE_URI,
                ResourceClass::Console,
                None,
                console.as_object().cloned().unwrap_or_default(),
            ),
        );
        state.order.push(CONSOLE_URI.to_string());
        state
    }

    pub(crate) fn object(&self, uri: &str) -> Result<&Resource> {
        self.objects.get(uri).ok_or_else(|| not_found(uri))
    }

    pub(crate) fn object_mut(&mut self, uri: &str) -> Result<&mut Resource> {
        self.objects.get_mut(uri).ok_or_else(|| not_found(uri))
    }

    fn list(&self, class: ResourceClass, parent: Option<&str>, filter: &Filter) -> Vec<Resource> {
        self.order
            .iter()
            .filter_map(|uri| self.objects.get(uri))
            .filter(|obj| obj.class == class)
            .filter(|obj| parent.map_or(true, |p| obj.parent.as_deref() == Some(p)))
            .filter(|obj| filter.matches(&obj.properties))
            .cloned()
            .collect()
    }

    fn next_device_number(&mut self) -> String {
        self.next_device_number += 1;
        format!("{:04X}", self.next_device_number)
    }

    /// Fill in the properties the HMC assigns on creation.
    fn apply_defaults(&mut self, class: ResourceClass, props: &mut Properties) {
        // New user roles are based on the operator tasks role by default.
        let operator_role = match class {
            ResourceClass::UserRole
                if props.get("type").and_then(Value::as_str) != Some("system-defined") =>
            {
                self.list(
                    ResourceClass::UserRole,
                    None,
                    &Filter::by_name(DEFAULT_SYSTEM_ROLE),
                )
                .into_iter()
                .next()
                .map(|role| role.uri)
            }
            _ => None,
        };
        let mut set_default = |name: &str, value: Value| {
            props.entry(name.to_string()).or_insert(value);
        };
        match class {
            ResourceClass::Partition => {
                for spec in PARTITION_PROPERTIES.iter() {
                    if let Some(value) = spec.default.to_value() {
                        set_default(&spec.hmc_name(), value);
                    }
                }
                set_default("crypto-configuration", Value::Null);
            }
            ResourceClass::Lpar => {
                set_default("status", json!("not-activated"));
                set_default("next-activation-profile-name", json!(null));
            }
            ResourceClass::Hba => {
                let wwpn = Uuid::new_v4().simple().to_string()[..16].to_uppercase();
                set_default("wwpn", json!(wwpn));
                set_default("description", json!(""));
            }
            ResourceClass::Nic => {
                let mac = Uuid::new_v4().as_bytes()[..5]
                    .iter()
                    .fold(String::from("02"), |acc, b| format!("{}:{:02x}", acc, b));
                set_default("mac-address", json!(mac));
                set_default("description", json!(""));
            }
            ResourceClass::StorageGroup => {
                set_default("fulfillment-state", json!("complete"));
                set_default("storage-volume-uris", json!([]));
                set_default("candidate-adapter-port-uris", json!([]));
                set_default("shared", json!(true));
            }
            ResourceClass::StorageVolume => {
                set_default("fulfillment-state", json!("complete"));
                set_default("description", json!(""));
                set_default("usage", json!("data"));
            }
            ResourceClass::VirtualFunction => {
                set_default("description", json!(""));
            }
            ResourceClass::User => {
                set_default("user-roles", json!([]));
                set_default("disabled", json!(false));
            }
            ResourceClass::UserRole => {
                set_default("type", json!("user-defined"));
                set_default("permissions", json!([]));
                if let Some(uri) = operator_role {
                    set_default("associated-system-defined-user-role-uri", json!(uri));
                }
            }
            _ => {}
        }
        if matches!(
            class,
            ResourceClass::Hba | ResourceClass::Nic | ResourceClass::VirtualFunction
        ) {
            let device_number = self.next_device_number();
            props
                .entry("device-number".to_string())
                .or_insert(json!(device_number));
        }
        // The HMC never returns passwords.
        props.remove("password");
    }

    /// Add an object, returning its URI.
    fn insert(
        &mut self,
        class: ResourceClass,
        parent: Option<&str>,
        mut props: Properties,
    ) -> Result<String> {
        if let Some(parent_uri) = parent {
            self.object(parent_uri)?;
        }
        let id = Uuid::new_v4().to_string();
        let (uri, id_prop, uri_prop) = if is_element(class) {
            let parent_uri = parent.ok_or_else(|| {
                Error::unexpected(format!("Element object of class {} needs a parent", class))
            })?;
            (
                format!("{}/{}/{}", parent_uri, class.uri_segment(), id),
                "element-id",
                "element-uri",
            )
        } else {
            (
                format!("/api/{}/{}", class.uri_segment(), id),
                "object-id",
                "object-uri",
            )
        };

        self.apply_defaults(class, &mut props);
        props.insert(id_prop.to_string(), json!(id));
        props.insert(uri_prop.to_string(), json!(uri));
        props.insert("class".to_string(), json!(class.as_str()));
        if let Some(parent_uri) = parent {
            props.insert("parent".to_string(), json!(parent_uri));
        }

        if let (Some(list_prop), Some(parent_uri)) = (child_list_property(class), parent) {
            let parent_obj = self.object_mut(parent_uri)?;
            push_unique(&mut parent_obj.properties, list_prop, json!(uri));
        }

        self.objects.insert(
            uri.clone(),
            Resource::new(uri.clone(), class, parent.map(str::to_string), props),
        );
        self.order.push(uri.clone());
        Ok(uri)
    }

    /// Remove an object and all objects below it.
    fn remove_tree(&mut self, uri: &str) {
        let children: Vec<String> = self
            .order
            .iter()
            .filter(|u| {
                self.objects
                    .get(*u)
                    .and_then(|obj| obj.parent.as_deref())
                    == Some(uri)
            })
            .cloned()
            .collect();
        for child in children {
            self.remove_tree(&child);
        }

        if let Some(obj) = self.objects.remove(uri) {
            if let (Some(list_prop), Some(parent_uri)) =
                (child_list_property(obj.class), obj.parent.as_deref())
            {
                if let Some(parent_obj) = self.objects.get_mut(parent_uri) {
                    remove_value(&mut parent_obj.properties, list_prop, &json!(uri));
                }
            }
        }
        self.order.retain(|u| u != uri);
        self.channels.remove(uri);
    }

    fn delete(&mut self, uri: &str) -> Result<()> {
        let obj = self.object(uri)?;
        match obj.class {
            ResourceClass::Partition => {
                let status = obj.str_prop("status").unwrap_or("");
                if !matches!(status, "stopped" | "reservation-error") {
                    return Err(ClientError::http(
                        409,
                        1,
                        format!(
                            "Partition '{}' cannot be deleted in status '{}'",
                            obj.name(),
                            status
                        ),
                    )
                    .into());
                }
            }
            ResourceClass::StorageGroup => {
                if !self.partitions_attached_to(uri).is_empty() {
                    return Err(ClientError::http(
                        409,
                        120,
                        format!(
                            "Storage group '{}' is attached to partitions",
                            obj.name()
                        ),
                    )
                    .into());
                }
            }
            ResourceClass::Console => {
                return Err(ClientError::http(405, 0, "The console cannot be deleted").into());
            }
            ResourceClass::Adapter if obj.str_prop("type") != Some("hipersockets") => {
                return Err(ClientError::http(
                    400,
                    1,
                    format!("Adapter '{}' is not a HiperSockets adapter", obj.name()),
                )
                .into());
            }
            _ => {}
        }
        if obj.class == ResourceClass::Adapter {
            // the virtual switches of a HiperSockets adapter go with it
            let vswitches: Vec<String> = self
                .list(
                    ResourceClass::VirtualSwitch,
                    None,
                    &Filter::all().with("backing-adapter-uri", uri),
                )
                .into_iter()
                .map(|vs| vs.uri)
                .collect();
            for vswitch in vswitches {
                self.remove_tree(&vswitch);
            }
        }
        self.remove_tree(uri);
        Ok(())
    }

    /// Create a HiperSockets adapter with its single port, the way the
    /// "Create Hipersocket" operation does.
    fn insert_hipersocket(&mut self, cpc_uri: &str, mut props: Properties) -> Result<String> {
        let defaults = json!({
            "description": "",
            "status": "active",
            "state": "online",
            "type": "hipersockets",
            "adapter-family": "hipersockets",
            "detected-card-type": "hipersockets",
            "port-count": 1,
            "maximum-transmission-unit-size": 8,
        });
        if let Value::Object(defaults) = defaults {
            for (name, value) in defaults {
                props.entry(name).or_insert(value);
            }
        }
        let adapter_id = self.next_device_number();
        props.entry("adapter-id".to_string()).or_insert(json!(adapter_id));
        let uri = self.insert(ResourceClass::Adapter, Some(cpc_uri), props)?;

        let mut port = Properties::new();
        port.insert("name".to_string(), json!("Port 0"));
        port.insert("index".to_string(), json!(0));
        let port_uri = self.insert(ResourceClass::Port, Some(&uri), port)?;
        self.object_mut(&uri)?
            .properties
            .insert("network-port-uris".to_string(), json!([port_uri]));

        let mut vswitch = Properties::new();
        let name = self.object(&uri)?.name().to_string();
        vswitch.insert("name".to_string(), json!(format!("{}_0", name)));
        vswitch.insert("type".to_string(), json!("hipersockets"));
        vswitch.insert("backing-adapter-uri".to_string(), json!(uri));
        vswitch.insert("port".to_string(), json!(0));
        self.insert(ResourceClass::VirtualSwitch, Some(cpc_uri), vswitch)?;
        Ok(uri)
    }

    /// URIs of the partitions a storage group is attached to.
    pub(crate) fn partitions_attached_to(&self, storage_group_uri: &str) -> Vec<String> {
        let target = json!(storage_group_uri);
        self.order
            .iter()
            .filter_map(|uri| self.objects.get(uri))
            .filter(|obj| obj.class == ResourceClass::Partition)
            .filter(|obj| {
                matches!(obj.prop("storage-group-uris"), Some(Value::Array(uris)) if uris.contains(&target))
            })
            .map(|obj| obj.uri.clone())
            .collect()
    }

    fn record(&mut self, action: &str, uri: &str) {
        debug!("Faked HMC: {} {}", action, uri);
        self.mutations.push(format!("{} {}", action, uri));
    }
}

/// Append a value to a list property, unless it is already present.
pub(crate) fn push_unique(props: &mut Properties, name: &str, value: Value) -> bool {
    let entry = props
        .entry(name.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if entry.is_null() {
        *entry = Value::Array(Vec::new());
    }
    match entry {
        Value::Array(items) if !items.contains(&value) => {
            items.push(value);
            true
        }
        _ => false,
    }
}

/// Remove a value from a list property.
pub(crate) fn remove_value(props: &mut Properties, name: &str, value: &Value) -> bool {
    match props.get_mut(name) {
        Some(Value::Array(items)) => {
            let before = items.len();
            items.retain(|item| item != value);
            items.len() != before
        }
        _ => false,
    }
}

impl FakedHmc {
    /// Create a faked HMC with just the console.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(FakedState::new()),
        }
    }

    /// Add an object without going through the client interface.
    ///
    /// # Arguments
    ///
    /// * `class` - The class of the object.
    /// * `parent` - URI of the parent object; `None` for CPCs.
    /// * `props` - Initial properties.
    ///
    /// # Returns
    ///
    /// The URI of the new object.
    pub fn add(
        &self,
        class: ResourceClass,
        parent: Option<&str>,
        props: Properties,
    ) -> Result<String> {
        self.state.write().insert(class, parent, props)
    }

    /// Add a CPC.
    pub fn add_cpc(&self, props: Properties) -> Result<String> {
        self.add(ResourceClass::Cpc, None, props)
    }

    /// Add an object of a console-level class (users, storage groups, ...).
    pub fn add_console_object(&self, class: ResourceClass, props: Properties) -> Result<String> {
        self.add(class, Some(CONSOLE_URI), props)
    }

    /// Replace properties of an object without recording a mutation.
    pub fn set_properties(&self, uri: &str, props: &Properties) -> Result<()> {
        self.state.write().object_mut(uri)?.update_local(props);
        Ok(())
    }

    /// Set the `status` property of an object.
    pub fn set_status(&self, uri: &str, status: &str) -> Result<()> {
        let mut props = Properties::new();
        props.insert("status".to_string(), json!(status));
        self.set_properties(uri, &props)
    }

    /// Set the result of the "Query API Version" operation.
    pub fn set_api_version(&self, props: Properties) {
        self.state.write().api_version = props;
    }

    /// Set the OS messages a partition or LPAR responds with to every command.
    pub fn set_os_command_response(&self, uri: &str, messages: Vec<String>) {
        self.state
            .write()
            .os_responses
            .insert(uri.to_string(), messages);
    }

    /// The current properties of an object.
    pub fn properties(&self, uri: &str) -> Option<Properties> {
        self.state
            .read()
            .objects
            .get(uri)
            .map(|obj| obj.properties.clone())
    }

    /// The mutating calls performed so far, as `"<action> <uri>"`.
    pub fn mutations(&self) -> Vec<String> {
        self.state.read().mutations.clone()
    }

    /// Number of logoffs performed.
    pub fn logoff_count(&self) -> usize {
        self.state.read().logoffs
    }
}

impl Default for FakedHmc {
    fn default() -> Self {
        Self::new()
    }
}

impl HmcClient for FakedHmc {
    fn query_api_version(&self) -> Result<Properties> {
        Ok(self.state.read().api_version.clone())
    }

    fn list(
        &self,
        class: ResourceClass,
        parent: Option<&str>,
        filter: &Filter,
    ) -> Result<Vec<Resource>> {
        Ok(self.state.read().list(class, parent, filter))
    }

    fn get(&self, uri: &str) -> Result<Resource> {
        self.state.read().object(uri).cloned()
    }

    fn create(
        &self,
        class: ResourceClass,
        parent: Option<&str>,
        props: &Properties,
    ) -> Result<Resource> {
        let mut state = self.state.write();
        if let Some(name) = props.get("name").and_then(Value::as_str) {
            if !state.list(class, parent, &Filter::by_name(name)).is_empty() {
                return Err(ClientError::http(
                    400,
                    8,
                    format!("An object of class {} with name '{}' already exists", class, name),
                )
                .into());
            }
        }
        let uri = match (class, parent) {
            (ResourceClass::Adapter, Some(cpc_uri)) => {
                state.insert_hipersocket(cpc_uri, props.clone())?
            }
            _ => state.insert(class, parent, props.clone())?,
        };
        state.record("create", &uri);
        state.object(&uri).cloned()
    }

    fn update(&self, uri: &str, props: &Properties) -> Result<()> {
        let mut state = self.state.write();
        if let Some(name) = props.get("name").and_then(Value::as_str) {
            let obj = state.object(uri)?;
            let clash = state
                .list(obj.class, obj.parent.as_deref(), &Filter::by_name(name))
                .into_iter()
                .any(|other| other.uri != uri);
            if clash {
                return Err(ClientError::http(
                    400,
                    8,
                    format!(
                        "An object of class {} with name '{}' already exists",
                        obj.class, name
                    ),
                )
                .into());
            }
        }
        let obj = state.object_mut(uri)?;
        let mut props = props.clone();
        props.remove("password");
        obj.update_local(&props);
        state.record("update", uri);
        Ok(())
    }

    fn delete(&self, uri: &str) -> Result<()> {
        let mut state = self.state.write();
        state.delete(uri)?;
        state.record("delete", uri);
        Ok(())
    }

    fn invoke(&self, uri: &str, operation: &Operation) -> Result<()> {
        let mut state = self.state.write();
        state.invoke(uri, operation)?;
        let action = format!("invoke '{}' on", operation.name());
        state.record(&action, uri);
        Ok(())
    }

    fn wait_for_status(
        &self,
        uri: &str,
        statuses: &[&str],
        _timeout: Option<Duration>,
    ) -> Result<String> {
        let mut state = self.state.write();
        let obj = state.object_mut(uri)?;
        let resolved = match obj.str_prop("status") {
            Some("starting") => Some("active"),
            Some("stopping") => Some("stopped"),
            _ => None,
        };
        if let Some(status) = resolved {
            obj.properties
                .insert("status".to_string(), json!(status));
        }
        let status = obj.str_prop("status").unwrap_or("").to_string();
        if statuses.contains(&status.as_str()) {
            Ok(status)
        } else {
            Err(ClientError::StatusTimeout(format!(
                "Waiting for {} to reach status {:?} timed out; current status is '{}'",
                uri, statuses, status
            ))
            .into())
        }
    }

    fn open_os_message_channel(&self, uri: &str) -> Result<Box<dyn OsMessageReceiver>> {
        let mut state = self.state.write();
        state.object(uri)?;
        let (sender, receiver) = unbounded();
        state
            .channels
            .entry(uri.to_string())
            .or_default()
            .push(sender);
        Ok(Box::new(FakedOsMessageReceiver::new(uri, receiver)))
    }

    fn logoff(&self) -> Result<()> {
        self.state.write().logoffs += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(value: Value) -> Properties {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_element_uris_and_child_lists() {
        let hmc = FakedHmc::new();
        let cpc = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
        let part = hmc
            .create(
                ResourceClass::Partition,
                Some(&cpc),
                &props(json!({"name": "p1", "initial-memory": 1024, "maximum-memory": 1024})),
            )
            .unwrap();
        assert!(part.uri.starts_with("/api/partitions/"));
        assert_eq!(part.str_prop("status"), Some("stopped"));
        assert_eq!(part.str_prop("type"), Some("linux"));

        let hba = hmc
            .create(ResourceClass::Hba, Some(&part.uri), &props(json!({"name": "hba1"})))
            .unwrap();
        assert!(hba.uri.starts_with(&format!("{}/hbas/", part.uri)));
        assert!(hba.str_prop("device-number").is_some());

        let part = hmc.get(&part.uri).unwrap();
        assert_eq!(part.str_list_prop("hba-uris"), vec![hba.uri.clone()]);

        hmc.delete(&hba.uri).unwrap();
        let part = hmc.get(&part.uri).unwrap();
        assert!(part.str_list_prop("hba-uris").is_empty());
    }

    #[test]
    fn test_hipersocket_create_and_delete() {
        let hmc = FakedHmc::new();
        let cpc = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
        let adapter = hmc
            .create(ResourceClass::Adapter, Some(&cpc), &props(json!({"name": "HS1"})))
            .unwrap();
        assert_eq!(adapter.str_prop("type"), Some("hipersockets"));
        assert_eq!(adapter.prop("maximum-transmission-unit-size"), Some(&json!(8)));
        let ports = adapter.str_list_prop("network-port-uris");
        assert_eq!(ports.len(), 1);
        assert!(ports[0].starts_with(&format!("{}/ports/", adapter.uri)));
        let vswitches = hmc
            .list(ResourceClass::VirtualSwitch, Some(&cpc), &Filter::all())
            .unwrap();
        assert_eq!(vswitches.len(), 1);
        assert_eq!(vswitches[0].str_prop("backing-adapter-uri"), Some(adapter.uri.as_str()));

        hmc.delete(&adapter.uri).unwrap();
        assert!(hmc.properties(&ports[0]).is_none());
        assert!(hmc
            .list(ResourceClass::VirtualSwitch, Some(&cpc), &Filter::all())
            .unwrap()
            .is_empty());

        let osa = hmc
            .add(ResourceClass::Adapter, Some(&cpc), props(json!({"name": "OSA1", "type": "osd"})))
            .unwrap();
        let err = hmc.delete(&osa).unwrap_err();
        assert!(err.is_http(400, 1));
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let hmc = FakedHmc::new();
        let cpc = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
        let p = props(json!({"name": "p1"}));
        hmc.create(ResourceClass::Partition, Some(&cpc), &p).unwrap();
        let err = hmc
            .create(ResourceClass::Partition, Some(&cpc), &p)
            .unwrap_err();
        assert!(err.is_http(400, 8));
    }

    #[test]
    fn test_wait_for_status_resolves_transitions() {
        let hmc = FakedHmc::new();
        let cpc = hmc.add_cpc(props(json!({"name": "CPC1"}))).unwrap();
        let part = hmc
            .add(ResourceClass::Partition, Some(&cpc), props(json!({"name": "p1"})))
            .unwrap();
        hmc.set_status(&part, "starting").unwrap();
        assert_eq!(
            hmc.wait_for_status(&part, &["active", "degraded"], None)
                .unwrap(),
            "active"
        );
        let err = hmc.wait_for_status(&part, &["stopped"], None).unwrap_err();
        assert_eq!(err.class_name(), "StatusTimeout");
    }

    #[test]
    fn test_user_password_is_not_stored() {
        let hmc = FakedHmc::new();
        let user = hmc
            .create(
                ResourceClass::User,
                Some(CONSOLE_URI),
                &props(json!({"name": "u1", "password": "secret"})),
            )
            .unwrap();
        assert!(user.prop("password").is_none());
        assert_eq!(hmc.mutations(), vec![format!("create {}", user.uri)]);
    }

    #[test]
    fn test_console_is_present() {
        let hmc = FakedHmc::new();
        let console = hmc.console().unwrap();
        assert_eq!(console.class, ResourceClass::Console);
        assert_eq!(console.str_prop("name"), Some("HMC1"));
    }
}
