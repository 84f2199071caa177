//! Status transitions of partitions.
//!
//! Partition status values:
//!
//! | Status              | Resources allocated | OS running   |
//! |---------------------|---------------------|--------------|
//! | `stopped`           | no                  | no           |
//! | `starting`          | transitional        | transitional |
//! | `stopping`          | transitional        | transitional |
//! | `reservation-error` | no                  | no           |
//! | `active`            | yes                 | yes          |
//! | `degraded`          | yes                 | yes          |
//! | `terminated`        | yes                 | no           |
//! | `paused`            | yes                 | no           |
//! | `communications-not-active` | unknown     | unknown      |
//! | `status-check`      | unknown             | unknown      |
//!
//! In check mode, nothing is started or stopped. The status the partition
//! would reach is recorded in the local `status` property, and the local
//! status is what the next step of a check mode run works with.

use log::debug;
use serde_json::json;

use zhmc_core::{Error, HmcClient, Operation, Properties, Resource, Result};

/// Statuses that make any status transition fail.
pub const PART_BAD_STATUSES: [&str; 2] = ["communications-not-active", "status-check"];

/// Statuses a partition can have after `starting`.
pub const PART_STARTING_END_STATUSES: [&str; 6] = [
    "active",
    "degraded",
    "reservation-error",
    "terminated",
    "communications-not-active",
    "status-check",
];

/// Statuses a partition can have after `stopping`.
pub const PART_STOPPING_END_STATUSES: [&str; 4] = [
    "stopped",
    "terminated",
    "communications-not-active",
    "status-check",
];

const MAX_TURNS: usize = 10;
const MAX_WAIT_TURNS: usize = 2;

/// The current status of a partition.
///
/// In check mode the local status is used, since the partition may only
/// exist locally or may have been changed locally.
pub fn pull_partition_status(
    client: &dyn HmcClient,
    partition: &Resource,
    check_mode: bool,
) -> Result<String> {
    if check_mode {
        if let Some(status) = partition.str_prop("status") {
            return Ok(status.to_string());
        }
    }
    let current = client.get(&partition.uri)?;
    Ok(current.str_prop("status").unwrap_or("").to_string())
}

fn set_local_status(partition: &mut Resource, status: &str) {
    let mut props = Properties::new();
    props.insert("status".to_string(), json!(status));
    partition.update_local(&props);
}

fn bad_status(cpc_name: &str, partition: &Resource, status: &str) -> Error {
    Error::status(format!(
        "CPC '{}' has issues; partition '{}' has bad status: '{}'",
        cpc_name,
        partition.name(),
        status
    ))
}

fn wait_for(client: &dyn HmcClient, partition: &Resource, statuses: &[&str]) -> Result<String> {
    client.wait_for_status(&partition.uri, statuses, None)?;
    pull_partition_status(client, partition, false)
}

fn stop(client: &dyn HmcClient, partition: &Resource, check_mode: bool) -> Result<String> {
    if check_mode {
        return Ok("stopped".to_string());
    }
    client.invoke(&partition.uri, &Operation::StopPartition)?;
    pull_partition_status(client, partition, false)
}

/// Stop a partition, whatever its current status is.
///
/// When this returns successfully, the partition status is `stopped` or
/// `reservation-error`.
///
/// # Arguments
///
/// * `client` - The HMC client.
/// * `cpc_name` - Name of the CPC of the partition, for messages.
/// * `partition` - The partition; its local `status` is kept current.
/// * `check_mode` - Only simulate the stop.
///
/// # Returns
///
/// Whether the partition was (or would have been) changed.
pub fn stop_partition(
    client: &dyn HmcClient,
    cpc_name: &str,
    partition: &mut Resource,
    check_mode: bool,
) -> Result<bool> {
    let mut changed = false;
    let mut status = pull_partition_status(client, partition, check_mode)?;
    for _ in 0..MAX_TURNS {
        if PART_BAD_STATUSES.contains(&status.as_str()) {
            return Err(bad_status(cpc_name, partition, &status));
        }
        match status.as_str() {
            "stopped" | "reservation-error" => {
                debug!(
                    "Partition '{}' on CPC '{}' is now in status '{}'",
                    partition.name(),
                    cpc_name,
                    status
                );
                return Ok(changed);
            }
            "starting" => {
                debug!(
                    "Waiting for completion of starting of partition '{}' on CPC '{}'",
                    partition.name(),
                    cpc_name
                );
                // Let it finish starting, then stop it in the next turn.
                status = wait_for(client, partition, &PART_STARTING_END_STATUSES)?;
            }
            "stopping" => {
                debug!(
                    "Waiting for completion of stopping of partition '{}' on CPC '{}'",
                    partition.name(),
                    cpc_name
                );
                status = wait_for(client, partition, &PART_STOPPING_END_STATUSES)?;
            }
            "terminated" | "active" | "degraded" | "paused" => {
                debug!(
                    "Stop partition '{}' on CPC '{}' (current status: '{}')",
                    partition.name(),
                    cpc_name,
                    status
                );
                status = stop(client, partition, check_mode)?;
            }
            _ => {
                return Err(Error::unexpected(format!(
                    "Partition '{}' on CPC '{}' has unknown status: '{}'",
                    partition.name(),
                    cpc_name,
                    status
                )))
            }
        }
        set_local_status(partition, &status);
        changed = true;
    }
    Err(Error::unexpected(format!(
        "Abandoning waiting for the completion of the stop of partition '{}' on CPC '{}' \
         after exhausting state machine loop. Current status: '{}'.",
        partition.name(),
        cpc_name,
        status
    )))
}

/// Start a partition, whatever its current status is.
///
/// When this returns successfully, the partition status is `active` or
/// `degraded`. A partition that reaches `terminated` or `paused` after a
/// start is not stopped again; that is a status error.
///
/// # Returns
///
/// Whether the partition was (or would have been) changed.
pub fn start_partition(
    client: &dyn HmcClient,
    cpc_name: &str,
    partition: &mut Resource,
    check_mode: bool,
) -> Result<bool> {
    let mut changed = false;
    let mut tried_start = false;
    let mut status = pull_partition_status(client, partition, check_mode)?;
    for _ in 0..MAX_TURNS {
        if PART_BAD_STATUSES.contains(&status.as_str()) {
            return Err(bad_status(cpc_name, partition, &status));
        }
        match status.as_str() {
            "active" | "degraded" => {
                debug!(
                    "Partition '{}' on CPC '{}' is now in status '{}'",
                    partition.name(),
                    cpc_name,
                    status
                );
                return Ok(changed);
            }
            "stopping" => {
                debug!(
                    "Waiting for completion of stopping of partition '{}' on CPC '{}'",
                    partition.name(),
                    cpc_name
                );
                status = wait_for(client, partition, &PART_STOPPING_END_STATUSES)?;
            }
            "starting" => {
                debug!(
                    "Waiting for completion of starting of partition '{}' on CPC '{}'",
                    partition.name(),
                    cpc_name
                );
                status = wait_for(client, partition, &PART_STARTING_END_STATUSES)?;
            }
            "terminated" | "paused" => {
                if tried_start {
                    return Err(Error::status(format!(
                        "Abandoning the start of partition '{}' on CPC '{}' after reaching \
                         status '{}' after an earlier 'Start Partition' operation.",
                        partition.name(),
                        cpc_name,
                        status
                    )));
                }
                debug!(
                    "Stop partition '{}' on CPC '{}' (current status: '{}')",
                    partition.name(),
                    cpc_name,
                    status
                );
                status = stop(client, partition, check_mode)?;
            }
            "stopped" | "reservation-error" => {
                debug!(
                    "Start partition '{}' on CPC '{}' (current status: '{}')",
                    partition.name(),
                    cpc_name,
                    status
                );
                status = if check_mode {
                    // Linux partitions without boot device stop in 'paused'.
                    if partition.str_prop("type") == Some("linux")
                        && partition.str_prop("boot-device") == Some("none")
                    {
                        "paused".to_string()
                    } else {
                        "active".to_string()
                    }
                } else {
                    client.invoke(&partition.uri, &Operation::StartPartition)?;
                    pull_partition_status(client, partition, false)?
                };
                tried_start = true;
            }
            _ => {
                return Err(Error::unexpected(format!(
                    "Partition '{}' on CPC '{}' has unknown status: '{}'",
                    partition.name(),
                    cpc_name,
                    status
                )))
            }
        }
        set_local_status(partition, &status);
        changed = true;
    }
    Err(Error::unexpected(format!(
        "Abandoning waiting for the completion of the start of partition '{}' on CPC '{}' \
         after exhausting state machine loop. Current status: '{}'.",
        partition.name(),
        cpc_name,
        status
    )))
}

/// Wait for a `starting` or `stopping` transition of a partition to
/// complete. Properties of a partition cannot be updated while it is in
/// transition.
pub fn wait_for_transition_completion(
    client: &dyn HmcClient,
    cpc_name: &str,
    partition: &mut Resource,
) -> Result<()> {
    let mut status = pull_partition_status(client, partition, false)?;
    for _ in 0..MAX_WAIT_TURNS {
        if PART_BAD_STATUSES.contains(&status.as_str()) {
            return Err(bad_status(cpc_name, partition, &status));
        }
        let end_statuses: &[&str] = match status.as_str() {
            "stopping" => &PART_STOPPING_END_STATUSES,
            "starting" => &PART_STARTING_END_STATUSES,
            _ => {
                set_local_status(partition, &status);
                return Ok(());
            }
        };
        debug!(
            "Waiting for completion of {} of partition '{}' on CPC '{}'",
            status,
            partition.name(),
            cpc_name
        );
        client.wait_for_status(&partition.uri, end_statuses, None)?;
        status = pull_partition_status(client, partition, false)?;
    }
    Err(Error::unexpected(format!(
        "Abandoning waiting for the completion of a status transition of partition '{}' on \
         CPC '{}' after exhausting state machine loop. Current status: '{}'.",
        partition.name(),
        cpc_name,
        status
    )))
}
