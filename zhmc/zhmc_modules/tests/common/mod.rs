//! Shared fixtures for the module integration tests.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::Arc;

use zhmc_core::{Properties, ResourceClass};
use zhmc_modules::ModuleRunner;
use zhmc_session::{FakedHmc, HmcDefinition, SessionFactory};

/// A faked HMC with a DPM CPC, a classic CPC and a few console objects.
pub const HMC_DEFINITION: &str = r#"
    [[cpcs]]
    [cpcs.properties]
    name = "CPC1"
    dpm-enabled = true
    machine-type = "3906"
    description = "DPM CPC"
    available-features-list = [{ name = "dpm-storage-management", state = true }]

    [[cpcs.adapters]]
    [cpcs.adapters.properties]
    name = "OSA1"
    type = "osd"
    adapter-family = "osa"
    adapter-id = "100"

    [[cpcs.adapters.ports]]
    name = "Port 0"
    index = 0

    [[cpcs.adapters]]
    [cpcs.adapters.properties]
    name = "CRYP1"
    type = "crypto"
    adapter-family = "crypto"
    crypto-type = "ep11-coprocessor"

    [[cpcs.virtual_switches]]
    backing_adapter = "OSA1"
    properties = { name = "VSW1", port = 0 }

    [[cpcs.partitions]]
    os_command_response = ["Linux PART1 6.1.0"]
    properties = { name = "PART1", status = "active", boot-device = "ftp" }

    [[cpcs]]
    [cpcs.properties]
    name = "CPC2"
    dpm-enabled = false

    [[cpcs.lpars]]
    name = "LP1"
    status = "not-activated"

    [[user_roles]]
    name = "hmc-operator-tasks"
    type = "system-defined"

    [[password_rules]]
    name = "Standard"

    [[tasks]]
    name = "Hardware Messages"
"#;

/// Build the faked HMC.
pub fn faked_hmc() -> Arc<FakedHmc> {
    let def = HmcDefinition::from_toml(HMC_DEFINITION).unwrap();
    Arc::new(FakedHmc::from_definition(&def).unwrap())
}

/// A runner whose sessions use the faked HMC.
pub fn runner(hmc: &Arc<FakedHmc>) -> ModuleRunner {
    ModuleRunner::new(SessionFactory::faked(hmc.clone()))
}

/// Module parameters with the connection parameters added.
pub fn params(module_params: Value) -> Properties {
    let mut params = json!({
        "hmc_host": "10.11.12.13",
        "hmc_auth": {"userid": "ops", "password": "secret"},
    })
    .as_object()
    .unwrap()
    .clone();
    params.extend(module_params.as_object().unwrap().clone());
    params
}

/// URI of an object, for assertions.
pub fn uri_of(hmc: &FakedHmc, class: ResourceClass, parent: Option<&str>, name: &str) -> String {
    use zhmc_core::HmcClient;
    hmc.find(class, parent, name).unwrap().uri
}
