//! HMC operations on existing resources.
//!
//! Property updates, creation and deletion go through the dedicated
//! `HmcClient` methods. Everything else an HMC resource supports is expressed
//! as an `Operation` and passed to `HmcClient::invoke`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::resource::Properties;

/// Access mode of a crypto domain, paired with the domain index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CryptoDomainConfig {
    /// Domain index.
    pub domain_index: i64,

    /// `control-usage` or `control`.
    pub access_mode: String,
}

impl CryptoDomainConfig {
    /// Create a domain configuration.
    pub fn new(domain_index: i64, access_mode: impl Into<String>) -> Self {
        Self {
            domain_index,
            access_mode: access_mode.into(),
        }
    }
}

/// An operation on an HMC resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Start a partition.
    StartPartition,

    /// Stop a partition.
    StopPartition,

    /// Mount an ISO image into a partition.
    MountIsoImage {
        /// Content of the image file.
        image: Vec<u8>,
        /// Name of the image file on the HMC.
        image_name: String,
        /// Path of the INS file within the image.
        ins_file_name: String,
    },

    /// Unmount the ISO image of a partition.
    UnmountIsoImage,

    /// Add crypto adapters and domains to a partition.
    IncreaseCryptoConfig {
        /// URIs of the crypto adapters to add.
        adapter_uris: Vec<String>,
        /// Domains to add.
        domain_configs: Vec<CryptoDomainConfig>,
    },

    /// Remove crypto adapters and domains from a partition.
    DecreaseCryptoConfig {
        /// URIs of the crypto adapters to remove.
        adapter_uris: Vec<String>,
        /// Indexes of the domains to remove.
        domain_indexes: Vec<i64>,
    },

    /// Change the access mode of a crypto domain of a partition.
    ChangeCryptoDomainConfig {
        /// Domain index.
        domain_index: i64,
        /// New access mode.
        access_mode: String,
    },

    /// Change the type of a FICON Express adapter.
    ChangeAdapterType {
        /// `fc`, `fcp` or `not-configured`.
        adapter_type: String,
    },

    /// Change the crypto type of a crypto adapter.
    ChangeCryptoType {
        /// `accelerator`, `cca-coprocessor` or `ep11-coprocessor`.
        crypto_type: String,
        /// Zeroize the adapter; `None` leaves the HMC default.
        zeroize: Option<bool>,
    },

    /// Attach a storage group to a partition.
    AttachStorageGroup {
        /// URI of the storage group.
        storage_group_uri: String,
    },

    /// Detach a storage group from a partition.
    DetachStorageGroup {
        /// URI of the storage group.
        storage_group_uri: String,
    },

    /// Add a user role to a user.
    AddUserRole {
        /// URI of the user role.
        user_role_uri: String,
    },

    /// Remove a user role from a user.
    RemoveUserRole {
        /// URI of the user role.
        user_role_uri: String,
    },

    /// Add a permission to a user role.
    AddPermission {
        /// The permission (`permitted-object`, `permitted-object-type`,
        /// `include-members`, `view-only-mode`).
        permission: Properties,
    },

    /// Remove a permission from a user role.
    RemovePermission {
        /// The permission, as for `AddPermission`.
        permission: Properties,
    },

    /// Activate an LPAR.
    ActivateLpar {
        /// Activation profile; `None` uses the next activation profile.
        activation_profile_name: Option<String>,
        /// Accept status `exceptions` as success.
        allow_status_exceptions: bool,
        /// Re-activate an LPAR that is already active.
        force: bool,
        /// Timeout for the HMC operation.
        timeout: Option<Duration>,
    },

    /// Deactivate an LPAR.
    DeactivateLpar {
        /// Deactivate even when an operating system is running.
        force: bool,
        /// Timeout for the HMC operation.
        timeout: Option<Duration>,
    },

    /// Load an LPAR.
    LoadLpar {
        /// Hex device address of the load device.
        load_address: Option<String>,
        /// Parameter passed to the loaded program.
        load_parameter: Option<String>,
        /// Clear memory before loading.
        clear_indicator: bool,
        /// Store status before loading.
        store_status_indicator: bool,
        /// Accept status `exceptions` as success.
        allow_status_exceptions: bool,
        /// Re-load an LPAR that is already loaded.
        force: bool,
        /// Timeout for the HMC operation.
        timeout: Option<Duration>,
    },

    /// Activate temporary capacity of a CPC.
    AddTemporaryCapacity {
        /// Capacity record id.
        record_id: String,
        /// Target software model, if it changes.
        software_model: Option<String>,
        /// Processors to add, by processor type (`ifl`, `icf`, `iip`, `sap`).
        processor_info: BTreeMap<String, i64>,
        /// Test activation.
        test: bool,
        /// Force activation even when the record is in use.
        force: bool,
    },

    /// Deactivate temporary capacity of a CPC.
    RemoveTemporaryCapacity {
        /// Capacity record id.
        record_id: String,
        /// Target software model, if it changes.
        software_model: Option<String>,
        /// Processors to remove, by processor type.
        processor_info: BTreeMap<String, i64>,
    },

    /// Upgrade the HMC firmware to a bundle level.
    SingleStepInstall {
        /// Target bundle level, e.g. `H25`.
        bundle_level: String,
        /// Accept the previous bundle level before installing.
        accept_firmware: bool,
        /// `ftp` or `usb`.
        backup_location_type: String,
        /// Timeout for the upgrade, which may include an HMC restart.
        timeout: Option<Duration>,
    },

    /// Send a command to the operating system console of a partition.
    SendOsCommand {
        /// The command.
        command: String,
        /// Send as priority command.
        is_priority: bool,
    },
}

impl Operation {
    /// The name of the operation, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartPartition => "Start Partition",
            Self::StopPartition => "Stop Partition",
            Self::MountIsoImage { .. } => "Mount ISO Image",
            Self::UnmountIsoImage => "Unmount ISO Image",
            Self::IncreaseCryptoConfig { .. } => "Increase Crypto Configuration",
            Self::DecreaseCryptoConfig { .. } => "Decrease Crypto Configuration",
            Self::ChangeCryptoDomainConfig { .. } => "Change Crypto Domain Configuration",
            Self::ChangeAdapterType { .. } => "Change Adapter Type",
            Self::ChangeCryptoType { .. } => "Change Crypto Type",
            Self::AttachStorageGroup { .. } => "Attach Storage Group",
            Self::DetachStorageGroup { .. } => "Detach Storage Group",
            Self::AddUserRole { .. } => "Add User Role to User",
            Self::RemoveUserRole { .. } => "Remove User Role from User",
            Self::AddPermission { .. } => "Add Permission to User Role",
            Self::RemovePermission { .. } => "Remove Permission from User Role",
            Self::ActivateLpar { .. } => "Activate Logical Partition",
            Self::DeactivateLpar { .. } => "Deactivate Logical Partition",
            Self::LoadLpar { .. } => "Load Logical Partition",
            Self::AddTemporaryCapacity { .. } => "Add Temporary Capacity",
            Self::RemoveTemporaryCapacity { .. } => "Remove Temporary Capacity",
            Self::SingleStepInstall { .. } => "Console Single Step Install",
            Self::SendOsCommand { .. } => "Send OS Command",
        }
    }
}
