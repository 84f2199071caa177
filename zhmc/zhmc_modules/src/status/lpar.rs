//! Status transitions of LPARs.
//!
//! LPAR status values:
//!
//! | Status          | Resources allocated | OS running |
//! |-----------------|---------------------|------------|
//! | `not-activated` | no                  | no         |
//! | `not-operating` | yes                 | no         |
//! | `operating`     | yes                 | yes        |
//! | `acceptable`    | yes                 | yes        |
//! | `exceptions`    | unknown             | unknown    |

use log::debug;
use serde_json::json;
use std::time::Duration;

use zhmc_core::{Error, HmcClient, Operation, Properties, Resource, Result};

/// Options for activating and loading an LPAR.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LparOptions {
    /// Activation profile; `None` uses the next activation profile.
    pub activation_profile_name: Option<String>,

    /// Hex device address of the load device.
    pub load_address: Option<String>,

    /// Parameter passed to the loaded program.
    pub load_parameter: Option<String>,

    /// Clear memory before loading.
    pub clear_indicator: bool,

    /// Store status before loading.
    pub store_status_indicator: bool,

    /// Timeout for the HMC operation.
    pub operation_timeout: Option<Duration>,

    /// Timeout for reaching the desired status.
    pub status_timeout: Option<Duration>,

    /// Accept status `exceptions` as an end status.
    pub allow_status_exceptions: bool,

    /// Re-activate or re-load an LPAR that already is.
    pub force: bool,
}

impl LparOptions {
    fn activate(&self, force: bool) -> Operation {
        Operation::ActivateLpar {
            activation_profile_name: self.activation_profile_name.clone(),
            allow_status_exceptions: self.allow_status_exceptions,
            force,
            timeout: self.operation_timeout,
        }
    }

    fn load(&self, force: bool) -> Operation {
        Operation::LoadLpar {
            load_address: self.load_address.clone(),
            load_parameter: self.load_parameter.clone(),
            clear_indicator: self.clear_indicator,
            store_status_indicator: self.store_status_indicator,
            allow_status_exceptions: self.allow_status_exceptions,
            force,
            timeout: self.operation_timeout,
        }
    }

    fn with_exceptions(&self, statuses: &[&'static str]) -> Vec<&'static str> {
        let mut statuses = statuses.to_vec();
        if self.allow_status_exceptions {
            statuses.push("exceptions");
        }
        statuses
    }
}

/// The current status of an LPAR.
pub fn pull_lpar_status(client: &dyn HmcClient, lpar: &Resource) -> Result<String> {
    let current = client.get(&lpar.uri)?;
    Ok(current.str_prop("status").unwrap_or("").to_string())
}

fn set_local_status(lpar: &mut Resource, status: &str) {
    let mut props = Properties::new();
    props.insert("status".to_string(), json!(status));
    lpar.update_local(&props);
}

/// Perform an operation and wait for one of the expected statuses.
fn perform(
    client: &dyn HmcClient,
    lpar: &Resource,
    operation: &Operation,
    statuses: &[&str],
    status_timeout: Option<Duration>,
) -> Result<String> {
    client.invoke(&lpar.uri, operation)?;
    client.wait_for_status(&lpar.uri, statuses, status_timeout)?;
    pull_lpar_status(client, lpar)
}

fn check_mode_suffix(check_mode: bool) -> &'static str {
    if check_mode {
        " (check mode)"
    } else {
        ""
    }
}

/// Deactivate an LPAR, whatever its current status is.
///
/// # Returns
///
/// Whether the LPAR was (or would have been) changed.
pub fn ensure_lpar_inactive(
    client: &dyn HmcClient,
    lpar: &mut Resource,
    check_mode: bool,
    options: &LparOptions,
) -> Result<bool> {
    let org_status = pull_lpar_status(client, lpar)?;
    if org_status == "not-activated" {
        debug!(
            "LPAR '{}' was already inactive with status '{}'",
            lpar.name(),
            org_status
        );
        return Ok(false);
    }
    debug!(
        "Deactivating LPAR '{}' (current status '{}'){}",
        lpar.name(),
        org_status,
        check_mode_suffix(check_mode)
    );
    let status = if check_mode {
        "not-activated".to_string()
    } else {
        let operation = Operation::DeactivateLpar {
            force: true,
            timeout: options.operation_timeout,
        };
        perform(client, lpar, &operation, &["not-activated"], options.status_timeout)?
    };
    set_local_status(lpar, &status);
    if status != "not-activated" {
        return Err(Error::status(format!(
            "Could not get LPAR '{}' from '{}' status into an inactive state; current status \
             is: '{}'",
            lpar.name(),
            org_status,
            status
        )));
    }
    Ok(true)
}

/// Activate an LPAR, unless it is already active or loaded.
///
/// With `force`, an LPAR that is already active or loaded is re-activated.
/// When this returns successfully, the LPAR status is `not-operating`,
/// `operating` or `exceptions`.
pub fn ensure_lpar_active(
    client: &dyn HmcClient,
    lpar: &mut Resource,
    check_mode: bool,
    options: &LparOptions,
) -> Result<bool> {
    let suffix = check_mode_suffix(check_mode);
    let org_status = pull_lpar_status(client, lpar)?;
    let end_statuses = options.with_exceptions(&["not-operating", "operating"]);

    if matches!(
        org_status.as_str(),
        "not-operating" | "operating" | "exceptions"
    ) {
        if !options.force {
            debug!(
                "LPAR '{}' is in status '{}' and force is not specified, doing nothing",
                lpar.name(),
                org_status
            );
            return Ok(false);
        }
        debug!(
            "LPAR '{}' is in status '{}' and force is specified, re-activating it{}",
            lpar.name(),
            org_status,
            suffix
        );
        let status = if check_mode {
            // Assume the LPAR is not auto-loaded.
            "not-operating".to_string()
        } else {
            perform(
                client,
                lpar,
                &options.activate(true),
                &end_statuses,
                options.status_timeout,
            )?
        };
        set_local_status(lpar, &status);
        return Ok(true);
    }

    let mut status = org_status.clone();
    let mut changed = false;
    if status == "not-activated" {
        debug!(
            "LPAR '{}' is in status '{}', activating it{}",
            lpar.name(),
            status,
            suffix
        );
        status = if check_mode {
            "not-operating".to_string()
        } else {
            perform(
                client,
                lpar,
                &options.activate(false),
                &end_statuses,
                options.status_timeout,
            )?
        };
        set_local_status(lpar, &status);
        changed = true;
    }
    debug!("LPAR '{}' is now in status '{}'{}", lpar.name(), status, suffix);
    if !matches!(
        status.as_str(),
        "not-operating" | "operating" | "exceptions"
    ) {
        return Err(Error::status(format!(
            "Could not get LPAR '{}' from '{}' status into an active or loaded state; current \
             status is: '{}'",
            lpar.name(),
            org_status,
            status
        )));
    }
    Ok(changed)
}

/// Load an LPAR, activating it first if needed.
///
/// An LPAR that is already loaded is only re-loaded with `force`. When this
/// returns successfully, the LPAR status is `operating` or `exceptions`.
pub fn ensure_lpar_loaded(
    client: &dyn HmcClient,
    lpar: &mut Resource,
    check_mode: bool,
    options: &LparOptions,
) -> Result<bool> {
    let suffix = check_mode_suffix(check_mode);
    let org_status = pull_lpar_status(client, lpar)?;
    let loaded_statuses = options.with_exceptions(&["operating"]);

    if matches!(org_status.as_str(), "operating" | "exceptions") {
        if !options.force {
            debug!(
                "LPAR '{}' is in status '{}' and force is not specified, doing nothing",
                lpar.name(),
                org_status
            );
            return Ok(false);
        }
        debug!(
            "LPAR '{}' is in status '{}' and force is specified, re-loading it{}",
            lpar.name(),
            org_status,
            suffix
        );
        let status = if check_mode {
            "operating".to_string()
        } else {
            perform(
                client,
                lpar,
                &options.load(true),
                &loaded_statuses,
                options.status_timeout,
            )?
        };
        set_local_status(lpar, &status);
        return Ok(true);
    }

    let mut status = org_status.clone();
    let mut changed = false;
    if status == "not-activated" {
        debug!(
            "LPAR '{}' is in status '{}', activating it{}",
            lpar.name(),
            status,
            suffix
        );
        status = if check_mode {
            "not-operating".to_string()
        } else {
            let end_statuses = options.with_exceptions(&["not-operating", "operating"]);
            perform(
                client,
                lpar,
                &options.activate(false),
                &end_statuses,
                options.status_timeout,
            )?
        };
        set_local_status(lpar, &status);
        changed = true;
    }
    if status == "not-operating" {
        // No automatic load on activation; load it explicitly.
        debug!(
            "LPAR '{}' is in status '{}', loading it{}",
            lpar.name(),
            status,
            suffix
        );
        status = if check_mode {
            "operating".to_string()
        } else {
            perform(
                client,
                lpar,
                &options.load(false),
                &loaded_statuses,
                options.status_timeout,
            )?
        };
        set_local_status(lpar, &status);
        changed = true;
    }
    debug!("LPAR '{}' is now in status '{}'{}", lpar.name(), status, suffix);
    if !matches!(status.as_str(), "operating" | "exceptions") {
        return Err(Error::status(format!(
            "Could not get LPAR '{}' from '{}' status into a loaded state; current status is: \
             '{}'",
            lpar.name(),
            org_status,
            status
        )));
    }
    Ok(changed)
}
