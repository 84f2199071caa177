//! The `zhmc_partition` module: partitions of CPCs in DPM mode.
//!
//! States:
//!
//! - `absent`: the partition does not exist; an existing one is stopped
//!   and deleted.
//! - `stopped`: the partition exists with the given properties and is
//!   stopped.
//! - `active`: the partition exists with the given properties and is active
//!   (or degraded).
//! - `iso_mount`: an ISO image is mounted and has the given INS file.
//! - `iso_unmount`: no ISO image is mounted.
//! - `facts`: return the partition properties.

mod properties;
mod result;

pub use properties::{
    apply_crypto_changes, check_mode_partition, process_partition_properties,
    storage_mgmt_enabled, CryptoChanges, PartitionChanges, ARTIFICIAL_PROPERTIES,
};
pub use result::{nic_properties, partition_result};

use log::debug;
use serde::Deserialize;
use serde_json::json;
use std::fs::File;

use zhmc_core::{Error, HmcClient, Operation, Properties, Resource, Result};

use crate::lookup::find_cpc;
use crate::module::{required_str, ModuleOutput};
use crate::params::parse_params;
use crate::status::{start_partition, stop_partition, wait_for_transition_completion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PartitionState {
    Absent,
    Stopped,
    Active,
    IsoMount,
    IsoUnmount,
    Facts,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartitionParams {
    cpc_name: String,
    name: String,
    state: PartitionState,
    #[serde(default)]
    select_properties: Option<Vec<String>>,
    #[serde(default)]
    properties: Option<Properties>,
    #[serde(default)]
    image_name: Option<String>,
    #[serde(default)]
    image_file: Option<String>,
    #[serde(default)]
    ins_file: Option<String>,
    #[serde(default)]
    expand_storage_groups: bool,
    #[serde(default)]
    expand_crypto_adapters: bool,
}

impl PartitionParams {
    fn input(&self) -> Properties {
        self.properties.clone().unwrap_or_default()
    }

    fn result(&self, client: &dyn HmcClient, partition: &Resource) -> Result<Properties> {
        partition_result(
            client,
            partition,
            self.select_properties.as_deref(),
            self.expand_storage_groups,
            self.expand_crypto_adapters,
        )
    }
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: PartitionParams = parse_params(params)?;
    match params.state {
        PartitionState::Absent => ensure_absent(client, &params, check_mode),
        PartitionState::Stopped => ensure_stopped(client, &params, check_mode),
        PartitionState::Active => ensure_active(client, &params, check_mode),
        PartitionState::IsoMount => ensure_iso_mount(client, &params, check_mode),
        PartitionState::IsoUnmount => ensure_iso_unmount(client, &params, check_mode),
        PartitionState::Facts => facts(client, &params),
    }
}

/// Find the partition with its full set of properties, if it exists.
fn find_partition(
    client: &dyn HmcClient,
    cpc: &Resource,
    name: &str,
) -> Result<Option<Resource>> {
    let partition = crate::lookup::find_partition(client, cpc, name);
    match partition {
        Ok(mut partition) => {
            client.pull_properties(&mut partition)?;
            Ok(Some(partition))
        }
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

fn existing_partition(client: &dyn HmcClient, cpc: &Resource, name: &str) -> Result<Resource> {
    let mut partition = crate::lookup::find_partition(client, cpc, name)?;
    client.pull_properties(&mut partition)?;
    Ok(partition)
}

/// Create the partition, or in check mode build it locally.
fn create_partition(
    client: &dyn HmcClient,
    cpc: &Resource,
    changes: &PartitionChanges,
    check_mode: bool,
) -> Result<Resource> {
    let create = &changes.properties.create;
    let update = changes.properties.update_after_create();
    if check_mode {
        return check_mode_partition(cpc, create, &update);
    }
    debug!("Creating partition with properties {:?}", create.keys());
    let partition = client.create(
        zhmc_core::ResourceClass::Partition,
        Some(&cpc.uri),
        create,
    )?;
    if !update.is_empty() {
        client.update(&partition.uri, &update)?;
    }
    Ok(partition)
}

fn ensure_active(
    client: &dyn HmcClient,
    params: &PartitionParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let current = find_partition(client, &cpc, &params.name)?;
    let changes =
        process_partition_properties(client, &cpc, current.as_ref(), &params.name, &params.input())?;

    let mut changed = false;
    let mut partition = match current {
        None => {
            let mut partition = create_partition(client, &cpc, &changes, check_mode)?;
            if let Some(crypto) = &changes.crypto {
                apply_crypto_changes(client, &mut partition, crypto, check_mode)?;
            }
            changed = true;
            partition
        }
        Some(mut partition) => {
            let update = &changes.properties.update;
            if !update.is_empty() {
                if check_mode {
                    partition.update_local(update);
                } else {
                    if changes.properties.requires_deactivation {
                        stop_partition(client, &params.cpc_name, &mut partition, false)?;
                    } else {
                        wait_for_transition_completion(client, &params.cpc_name, &mut partition)?;
                    }
                    client.update(&partition.uri, update)?;
                }
                changed = true;
            }
            if let Some(crypto) = &changes.crypto {
                changed |= apply_crypto_changes(client, &mut partition, crypto, check_mode)?;
            }
            partition
        }
    };

    changed |= start_partition(client, &params.cpc_name, &mut partition, check_mode)?;

    if !check_mode {
        client.pull_properties(&mut partition)?;
        let status = partition.str_prop("status").unwrap_or("");
        if !matches!(status, "active" | "degraded") {
            return Err(Error::status(format!(
                "Could not get partition '{}' into an active state, status is: '{}'",
                partition.name(),
                status
            )));
        }
    }

    let result = params.result(client, &partition)?;
    Ok(ModuleOutput::new(changed, result))
}

fn ensure_stopped(
    client: &dyn HmcClient,
    params: &PartitionParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let current = find_partition(client, &cpc, &params.name)?;
    let changes =
        process_partition_properties(client, &cpc, current.as_ref(), &params.name, &params.input())?;

    let mut changed = false;
    let mut partition = match current {
        None => {
            let partition = create_partition(client, &cpc, &changes, check_mode)?;
            changed = true;
            partition
        }
        Some(mut partition) => {
            changed |= stop_partition(client, &params.cpc_name, &mut partition, check_mode)?;
            let update = &changes.properties.update;
            if !update.is_empty() {
                if check_mode {
                    partition.update_local(update);
                } else {
                    client.update(&partition.uri, update)?;
                }
                changed = true;
            }
            partition
        }
    };
    if let Some(crypto) = &changes.crypto {
        changed |= apply_crypto_changes(client, &mut partition, crypto, check_mode)?;
    }

    if !check_mode {
        client.pull_properties(&mut partition)?;
        let status = partition.str_prop("status").unwrap_or("");
        if status != "stopped" {
            return Err(Error::status(format!(
                "Could not get partition '{}' into a stopped state, status is: '{}'",
                partition.name(),
                status
            )));
        }
    }

    let result = params.result(client, &partition)?;
    Ok(ModuleOutput::new(changed, result))
}

fn ensure_absent(
    client: &dyn HmcClient,
    params: &PartitionParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let Some(mut partition) = find_partition(client, &cpc, &params.name)? else {
        return Ok(ModuleOutput::new(false, json!({})));
    };
    if !check_mode {
        stop_partition(client, &params.cpc_name, &mut partition, false)?;
        debug!("Deleting partition '{}'", partition.name());
        client.delete(&partition.uri)?;
    }
    Ok(ModuleOutput::new(true, json!({})))
}

fn ensure_iso_mount(
    client: &dyn HmcClient,
    params: &PartitionParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let partition = existing_partition(client, &cpc, &params.name)?;
    let image_name = required_str(&params.image_name, "image_name")?;
    let image_file = required_str(&params.image_file, "image_file")?;
    let ins_file = required_str(&params.ins_file, "ins_file")?;

    let mut changed = false;
    if partition.str_prop("boot-iso-image-name") != Some(image_name) {
        let image_error = |e: std::io::Error| {
            Error::Image(format!(
                "Cannot open ISO image file '{}' for reading: {}",
                image_file, e
            ))
        };
        if check_mode {
            File::open(image_file).map_err(image_error)?;
        } else {
            let image = std::fs::read(image_file).map_err(image_error)?;
            debug!(
                "Mounting ISO image '{}' ({} bytes) into partition '{}'",
                image_name,
                image.len(),
                partition.name()
            );
            client.invoke(
                &partition.uri,
                &Operation::MountIsoImage {
                    image,
                    image_name: image_name.to_string(),
                    ins_file_name: ins_file.to_string(),
                },
            )?;
        }
        changed = true;
    } else if partition.str_prop("boot-iso-ins-file") != Some(ins_file) {
        if !check_mode {
            let mut props = Properties::new();
            props.insert("boot-iso-ins-file".to_string(), json!(ins_file));
            client.update(&partition.uri, &props)?;
        }
        changed = true;
    }
    Ok(ModuleOutput::new(changed, json!({})))
}

fn ensure_iso_unmount(
    client: &dyn HmcClient,
    params: &PartitionParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let partition = existing_partition(client, &cpc, &params.name)?;
    let mounted = matches!(partition.str_prop("boot-iso-image-name"), Some(name) if !name.is_empty());
    if mounted && !check_mode {
        client.invoke(&partition.uri, &Operation::UnmountIsoImage)?;
    }
    Ok(ModuleOutput::new(mounted, json!({})))
}

fn facts(client: &dyn HmcClient, params: &PartitionParams) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let partition = existing_partition(client, &cpc, &params.name)?;
    let result = params.result(client, &partition)?;
    Ok(ModuleOutput::new(false, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Write;
    use zhmc_core::ResourceClass;
    use zhmc_session::FakedHmc;

    fn props(value: Value) -> Properties {
        value.as_object().unwrap().clone()
    }

    fn setup() -> FakedHmc {
        let hmc = FakedHmc::new();
        hmc.add_cpc(props(json!({
            "name": "CPC1",
            "dpm-enabled": true,
            "available-features-list": [{"name": "dpm-storage-management", "state": true}]
        })))
        .unwrap();
        hmc
    }

    fn params(state: &str, extra: Value) -> Properties {
        let mut params = props(json!({"cpc_name": "CPC1", "name": "p1", "state": state}));
        params.extend(props(extra));
        params
    }

    fn ftp_properties() -> Value {
        json!({
            "description": "web server",
            "ifl_processors": 2,
            "initial_memory": 4096,
            "maximum_memory": 4096,
            "boot_device": "ftp",
            "boot_ftp_host": "ftp.example.com",
            "boot_ftp_username": "anon",
            "boot_ftp_password": "secret",
            "boot_ftp_insfile": "/images/generic.ins",
        })
    }

    #[test]
    fn test_create_stopped_then_idempotent() {
        let hmc = setup();
        let input = params("stopped", json!({"properties": ftp_properties()}));
        let output = run(&hmc, &input, false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["status"], "stopped");
        assert_eq!(output.result["ifl-processors"], 2);
        assert_eq!(output.result["hbas"], json!([]));
        assert_eq!(output.result["boot-storage-volume-name"], Value::Null);

        let output = run(&hmc, &input, false).unwrap();
        assert!(!output.changed);
    }

    #[test]
    fn test_active_updates_with_restart() {
        let hmc = setup();
        let input = params("active", json!({"properties": ftp_properties()}));
        let output = run(&hmc, &input, false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["status"], "active");

        // maximum memory cannot be changed while the partition is active
        let mut properties = ftp_properties();
        properties["maximum_memory"] = json!(8192);
        let input = params("active", json!({"properties": properties}));
        let before = hmc.mutations().len();
        let output = run(&hmc, &input, false).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["status"], "active");
        assert_eq!(output.result["maximum-memory"], 8192);
        // stop, update, start
        assert_eq!(hmc.mutations().len() - before, 3);
    }

    #[test]
    fn test_active_without_boot_device_fails() {
        let hmc = setup();
        let input = params(
            "active",
            json!({"properties": {"ifl_processors": 1, "initial_memory": 1024, "maximum_memory": 1024}}),
        );
        let err = run(&hmc, &input, false).unwrap_err();
        assert_eq!(err.class_name(), "StatusError");
    }

    #[test]
    fn test_check_mode_create() {
        let hmc = setup();
        let input = params("stopped", json!({"properties": ftp_properties()}));
        let output = run(&hmc, &input, true).unwrap();
        assert!(output.changed);
        assert_eq!(output.result["status"], "stopped");
        assert_eq!(output.result["boot-timeout"], 60);
        assert!(hmc.mutations().is_empty());

        let input = params("stopped", json!({"properties": {"ifl_processors": 1}}));
        let err = run(&hmc, &input, true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Required partition properties missing in module input: initial_memory, \
             maximum_memory"
        );
    }

    #[test]
    fn test_absent_stops_and_deletes() {
        let hmc = setup();
        run(&hmc, &params("active", json!({"properties": ftp_properties()})), false).unwrap();
        let output = run(&hmc, &params("absent", json!({})), false).unwrap();
        assert!(output.changed);
        let output = run(&hmc, &params("absent", json!({})), false).unwrap();
        assert!(!output.changed);
        let cpc = hmc.find(ResourceClass::Cpc, None, "CPC1").unwrap();
        assert!(hmc
            .find_optional(ResourceClass::Partition, Some(&cpc.uri), "p1")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_iso_mount_and_unmount() {
        let hmc = setup();
        run(&hmc, &params("stopped", json!({"properties": ftp_properties()})), false).unwrap();
        let mut image = tempfile::NamedTempFile::new().unwrap();
        image.write_all(b"ISO").unwrap();
        let image_file = image.path().to_str().unwrap().to_string();

        let mount = params(
            "iso_mount",
            json!({"image_name": "sles.iso", "image_file": image_file, "ins_file": "/boot.ins"}),
        );
        assert!(run(&hmc, &mount, false).unwrap().changed);
        assert!(!run(&hmc, &mount, false).unwrap().changed);

        let output = run(&hmc, &params("facts", json!({})), false).unwrap();
        assert_eq!(output.result["boot-iso-image-name"], "sles.iso");

        let unmount = params("iso_unmount", json!({}));
        assert!(run(&hmc, &unmount, false).unwrap().changed);
        assert!(!run(&hmc, &unmount, false).unwrap().changed);
    }

    #[test]
    fn test_iso_mount_missing_image_file() {
        let hmc = setup();
        run(&hmc, &params("stopped", json!({"properties": ftp_properties()})), false).unwrap();
        let mount = params(
            "iso_mount",
            json!({"image_name": "a.iso", "image_file": "/nonexistent/a.iso", "ins_file": "x"}),
        );
        let err = run(&hmc, &mount, true).unwrap_err();
        assert_eq!(err.class_name(), "ImageError");
    }

    #[test]
    fn test_facts_select_properties() {
        let hmc = setup();
        run(&hmc, &params("stopped", json!({"properties": ftp_properties()})), false).unwrap();
        let output = run(
            &hmc,
            &params("facts", json!({"select_properties": ["ifl_processors"]})),
            false,
        )
        .unwrap();
        assert_eq!(output.result["ifl-processors"], 2);
        assert!(output.result.get("description").is_none());
        assert!(output.result.get("nics").is_some());
    }
}
