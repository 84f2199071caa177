//! The `zhmc_storage_group_attachment` module: attachment of storage groups
//! to partitions.

use serde::Deserialize;
use serde_json::json;

use zhmc_core::{Error, HmcClient, Operation, Properties, Resource, ResourceClass, Result};

use crate::lookup::{find_console_object, find_cpc, find_partition};
use crate::module::ModuleOutput;
use crate::modules::storage_group::attached_partitions;
use crate::params::parse_params;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum AttachmentState {
    Attached,
    Detached,
    Facts,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AttachmentParams {
    cpc_name: String,
    storage_group_name: String,
    partition_name: String,
    state: AttachmentState,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: AttachmentParams = parse_params(params)?;
    let cpc = find_cpc(client, &params.cpc_name)?;
    let storage_group =
        find_console_object(client, ResourceClass::StorageGroup, &params.storage_group_name)?;
    let storage_group = client.get(&storage_group.uri)?;
    let partition = find_partition(client, &cpc, &params.partition_name)?;
    let attached = is_attached(client, &storage_group, &partition)?;

    let (changed, attached) = match (params.state, attached) {
        (AttachmentState::Attached, false) => {
            if !check_mode {
                client.invoke(
                    &partition.uri,
                    &Operation::AttachStorageGroup {
                        storage_group_uri: storage_group.uri.clone(),
                    },
                )?;
            }
            (true, !check_mode)
        }
        (AttachmentState::Detached, true) => {
            if !check_mode {
                client.invoke(
                    &partition.uri,
                    &Operation::DetachStorageGroup {
                        storage_group_uri: storage_group.uri.clone(),
                    },
                )?;
            }
            (true, check_mode)
        }
        (_, attached) => (false, attached),
    };
    Ok(ModuleOutput::new(changed, json!({ "attached": attached })))
}

fn is_attached(
    client: &dyn HmcClient,
    storage_group: &Resource,
    partition: &Resource,
) -> Result<bool> {
    let matching: Vec<Resource> = attached_partitions(client, storage_group)?
        .into_iter()
        .filter(|p| p.name() == partition.name())
        .collect();
    match matching.len() {
        0 => Ok(false),
        1 => Ok(true),
        n => Err(Error::unexpected(format!(
            "Storage group '{}' is attached to {} partitions named '{}'",
            storage_group.name(),
            n,
            partition.name()
        ))),
    }
}
