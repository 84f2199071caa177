//! Operations of the faked HMC.

use serde_json::{json, Value};

use super::{push_unique, remove_value, FakedState};
use zhmc_core::types::{capacity_changes, CapacityChange};
use zhmc_core::{ClientError, Error, Operation, Properties, ResourceClass, Result};

fn conflict(reason: u16, message: String) -> Error {
    ClientError::http(409, reason, message).into()
}

fn expect_class(state: &FakedState, uri: &str, classes: &[ResourceClass]) -> Result<()> {
    let obj = state.object(uri)?;
    if classes.contains(&obj.class) {
        Ok(())
    } else {
        Err(ClientError::http(
            400,
            1,
            format!("Operation not supported for {} objects", obj.class),
        )
        .into())
    }
}

impl FakedState {
    /// Perform an operation on an object.
    pub(crate) fn invoke(&mut self, uri: &str, operation: &Operation) -> Result<()> {
        match operation {
            Operation::StartPartition => self.start_partition(uri),
            Operation::StopPartition => self.stop_partition(uri),
            Operation::MountIsoImage {
                image_name,
                ins_file_name,
                ..
            } => {
                expect_class(self, uri, &[ResourceClass::Partition])?;
                self.set(uri, "boot-iso-image-name", json!(image_name))?;
                self.set(uri, "boot-iso-ins-file", json!(ins_file_name))
            }
            Operation::UnmountIsoImage => {
                expect_class(self, uri, &[ResourceClass::Partition])?;
                self.set(uri, "boot-iso-image-name", Value::Null)?;
                self.set(uri, "boot-iso-ins-file", Value::Null)
            }
            Operation::IncreaseCryptoConfig {
                adapter_uris,
                domain_configs,
            } => self.update_crypto_config(uri, |adapters, domains| {
                for adapter_uri in adapter_uris {
                    if !adapters.contains(&json!(adapter_uri)) {
                        adapters.push(json!(adapter_uri));
                    }
                }
                for config in domain_configs {
                    let index = json!(config.domain_index);
                    if domains.iter().any(|d| d.get("domain-index") == Some(&index)) {
                        return Err(ClientError::http(
                            400,
                            255,
                            format!("Domain {} is already configured", config.domain_index),
                        )
                        .into());
                    }
                    domains.push(json!({
                        "domain-index": config.domain_index,
                        "access-mode": config.access_mode,
                    }));
                }
                Ok(())
            }),
            Operation::DecreaseCryptoConfig {
                adapter_uris,
                domain_indexes,
            } => self.update_crypto_config(uri, |adapters, domains| {
                adapters.retain(|a| !adapter_uris.iter().any(|u| a == &json!(u)));
                domains.retain(|d| {
                    !domain_indexes
                        .iter()
                        .any(|i| d.get("domain-index") == Some(&json!(i)))
                });
                Ok(())
            }),
            Operation::ChangeCryptoDomainConfig {
                domain_index,
                access_mode,
            } => self.update_crypto_config(uri, |_, domains| {
                let index = json!(domain_index);
                let domain = domains
                    .iter_mut()
                    .find(|d| d.get("domain-index") == Some(&index))
                    .ok_or_else(|| {
                        Error::from(ClientError::http(
                            400,
                            256,
                            format!("Domain {} is not configured", domain_index),
                        ))
                    })?;
                domain["access-mode"] = json!(access_mode);
                Ok(())
            }),
            Operation::ChangeAdapterType { adapter_type } => {
                expect_class(self, uri, &[ResourceClass::Adapter])?;
                let adapter = self.object(uri)?;
                if adapter.str_prop("adapter-family") != Some("ficon") {
                    return Err(ClientError::http(
                        400,
                        18,
                        format!("The type of adapter '{}' cannot be changed", adapter.name()),
                    )
                    .into());
                }
                if adapter.str_prop("type") == Some(adapter_type.as_str()) {
                    return Err(ClientError::http(
                        400,
                        8,
                        format!("Adapter '{}' already has type '{}'", adapter.name(), adapter_type),
                    )
                    .into());
                }
                self.set(uri, "type", json!(adapter_type))
            }
            Operation::ChangeCryptoType { crypto_type, .. } => {
                expect_class(self, uri, &[ResourceClass::Adapter])?;
                let adapter = self.object(uri)?;
                if adapter.str_prop("adapter-family") != Some("crypto") {
                    return Err(ClientError::http(
                        400,
                        18,
                        format!("Adapter '{}' is not a crypto adapter", adapter.name()),
                    )
                    .into());
                }
                self.set(uri, "crypto-type", json!(crypto_type))
            }
            Operation::AttachStorageGroup { storage_group_uri } => {
                expect_class(self, uri, &[ResourceClass::Partition])?;
                self.object(storage_group_uri)?;
                let part = self.object_mut(uri)?;
                if !push_unique(
                    &mut part.properties,
                    "storage-group-uris",
                    json!(storage_group_uri),
                ) {
                    return Err(conflict(
                        120,
                        format!("Storage group is already attached to partition '{}'", part.name()),
                    ));
                }
                Ok(())
            }
            Operation::DetachStorageGroup { storage_group_uri } => {
                expect_class(self, uri, &[ResourceClass::Partition])?;
                let part = self.object_mut(uri)?;
                if !remove_value(
                    &mut part.properties,
                    "storage-group-uris",
                    &json!(storage_group_uri),
                ) {
                    return Err(conflict(
                        121,
                        format!("Storage group is not attached to partition '{}'", part.name()),
                    ));
                }
                Ok(())
            }
            Operation::AddUserRole { user_role_uri } => {
                expect_class(self, uri, &[ResourceClass::User])?;
                self.object(user_role_uri)?;
                let user = self.object_mut(uri)?;
                push_unique(&mut user.properties, "user-roles", json!(user_role_uri));
                Ok(())
            }
            Operation::RemoveUserRole { user_role_uri } => {
                expect_class(self, uri, &[ResourceClass::User])?;
                let user = self.object_mut(uri)?;
                remove_value(&mut user.properties, "user-roles", &json!(user_role_uri));
                Ok(())
            }
            Operation::AddPermission { permission } => {
                expect_class(self, uri, &[ResourceClass::UserRole])?;
                let role = self.object_mut(uri)?;
                push_unique(
                    &mut role.properties,
                    "permissions",
                    Value::Object(permission.clone()),
                );
                Ok(())
            }
            Operation::RemovePermission { permission } => {
                expect_class(self, uri, &[ResourceClass::UserRole])?;
                let role = self.object_mut(uri)?;
                remove_value(
                    &mut role.properties,
                    "permissions",
                    &Value::Object(permission.clone()),
                );
                Ok(())
            }
            Operation::ActivateLpar {
                activation_profile_name,
                force,
                ..
            } => {
                expect_class(self, uri, &[ResourceClass::Lpar])?;
                let lpar = self.object(uri)?;
                let status = lpar.str_prop("status").unwrap_or("");
                if status != "not-activated" && !force {
                    return Err(ClientError::http(
                        500,
                        263,
                        format!("LPAR '{}' is already active", lpar.name()),
                    )
                    .into());
                }
                let profile = activation_profile_name
                    .clone()
                    .map(Value::String)
                    .or_else(|| lpar.prop("next-activation-profile-name").cloned())
                    .unwrap_or(Value::Null);
                self.set(uri, "last-used-activation-profile", profile)?;
                self.set(uri, "status", json!("not-operating"))
            }
            Operation::DeactivateLpar { force, .. } => {
                expect_class(self, uri, &[ResourceClass::Lpar])?;
                let lpar = self.object(uri)?;
                if lpar.str_prop("status") == Some("operating") && !force {
                    return Err(ClientError::http(
                        500,
                        263,
                        format!("LPAR '{}' has an operating system running", lpar.name()),
                    )
                    .into());
                }
                self.set(uri, "status", json!("not-activated"))
            }
            Operation::LoadLpar {
                load_address,
                load_parameter,
                force,
                ..
            } => {
                expect_class(self, uri, &[ResourceClass::Lpar])?;
                let lpar = self.object(uri)?;
                match lpar.str_prop("status").unwrap_or("") {
                    "not-activated" => {
                        return Err(conflict(
                            1,
                            format!("LPAR '{}' is not active", lpar.name()),
                        ))
                    }
                    "operating" | "exceptions" if !force => {
                        return Err(ClientError::http(
                            500,
                            263,
                            format!("LPAR '{}' is already loaded", lpar.name()),
                        )
                        .into())
                    }
                    _ => {}
                }
                if let Some(address) = load_address {
                    self.set(uri, "last-used-load-address", json!(address))?;
                }
                if let Some(parameter) = load_parameter {
                    self.set(uri, "last-used-load-parameter", json!(parameter))?;
                }
                self.set(uri, "status", json!("operating"))
            }
            Operation::AddTemporaryCapacity {
                software_model,
                processor_info,
                ..
            } => self.change_capacity(
                uri,
                CapacityChange::Add,
                software_model.as_deref(),
                processor_info,
            ),
            Operation::RemoveTemporaryCapacity {
                software_model,
                processor_info,
                ..
            } => self.change_capacity(
                uri,
                CapacityChange::Remove,
                software_model.as_deref(),
                processor_info,
            ),
            Operation::SingleStepInstall { bundle_level, .. } => {
                expect_class(self, uri, &[ResourceClass::Console])?;
                let console = self.object_mut(uri)?;
                let current = console
                    .prop("ec-mcl-description")
                    .and_then(|ec| ec.get("bundle-level"))
                    .and_then(Value::as_str);
                if current == Some(bundle_level.as_str()) {
                    return Err(ClientError::http(
                        400,
                        356,
                        format!("The HMC is already at bundle level {}", bundle_level),
                    )
                    .into());
                }
                let ec = console
                    .properties
                    .entry("ec-mcl-description".to_string())
                    .or_insert_with(|| json!({}));
                if !ec.is_object() {
                    *ec = json!({});
                }
                ec["bundle-level"] = json!(bundle_level);
                Ok(())
            }
            Operation::SendOsCommand { command, .. } => {
                expect_class(self, uri, &[ResourceClass::Partition, ResourceClass::Lpar])?;
                let mut messages = vec![command.clone()];
                messages.extend(self.os_responses.get(uri).cloned().unwrap_or_default());
                if let Some(senders) = self.channels.get_mut(uri) {
                    senders.retain(|sender| sender.send(messages.clone()).is_ok());
                }
                Ok(())
            }
        }
    }

    fn set(&mut self, uri: &str, name: &str, value: Value) -> Result<()> {
        self.object_mut(uri)?
            .properties
            .insert(name.to_string(), value);
        Ok(())
    }

    fn start_partition(&mut self, uri: &str) -> Result<()> {
        expect_class(self, uri, &[ResourceClass::Partition])?;
        let part = self.object(uri)?;
        let status = part.str_prop("status").unwrap_or("");
        if !matches!(status, "stopped" | "reservation-error") {
            return Err(conflict(
                1,
                format!(
                    "Partition '{}' cannot be started in status '{}'",
                    part.name(),
                    status
                ),
            ));
        }
        // Linux partitions without a boot device have nothing to run.
        let new_status = if part.str_prop("type") == Some("linux")
            && part.str_prop("boot-device") == Some("none")
        {
            "paused"
        } else {
            "active"
        };
        self.set(uri, "status", json!(new_status))
    }

    fn stop_partition(&mut self, uri: &str) -> Result<()> {
        expect_class(self, uri, &[ResourceClass::Partition])?;
        let part = self.object(uri)?;
        let status = part.str_prop("status").unwrap_or("");
        if !matches!(status, "active" | "degraded" | "paused" | "terminated") {
            return Err(conflict(
                1,
                format!(
                    "Partition '{}' cannot be stopped in status '{}'",
                    part.name(),
                    status
                ),
            ));
        }
        self.set(uri, "status", json!("stopped"))
    }

    fn update_crypto_config<F>(&mut self, uri: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Value>, &mut Vec<Value>) -> Result<()>,
    {
        expect_class(self, uri, &[ResourceClass::Partition])?;
        let part = self.object_mut(uri)?;
        let config = part.prop("crypto-configuration").cloned();
        let list = |name: &str| -> Vec<Value> {
            match config.as_ref().and_then(|c| c.get(name)) {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            }
        };
        let mut adapters = list("crypto-adapter-uris");
        let mut domains = list("crypto-domain-configurations");
        edit(&mut adapters, &mut domains)?;
        part.properties.insert(
            "crypto-configuration".to_string(),
            json!({
                "crypto-adapter-uris": adapters,
                "crypto-domain-configurations": domains,
            }),
        );
        Ok(())
    }

    fn change_capacity(
        &mut self,
        uri: &str,
        change: CapacityChange,
        software_model: Option<&str>,
        processor_info: &std::collections::BTreeMap<String, i64>,
    ) -> Result<()> {
        expect_class(self, uri, &[ResourceClass::Cpc])?;
        let cpc = self.object_mut(uri)?;
        let changes: Properties =
            capacity_changes(&cpc.properties, change, software_model, processor_info);
        cpc.update_local(&changes);
        Ok(())
    }
}
