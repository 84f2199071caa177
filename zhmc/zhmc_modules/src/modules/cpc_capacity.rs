//! The `zhmc_cpc_capacity` module: temporary processor capacity of CPCs.
//!
//! The desired capacity is given as a target software model, which implies
//! the number of general purpose processors, and target numbers of specialty
//! processors. The differences to the current capacity are activated or
//! deactivated through the temporary capacity record `record_id`.

use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use zhmc_core::types::capacity::SPECIALTY_PROCESSORS;
use zhmc_core::types::capacity_changes;
use zhmc_core::utils::underscore_properties;
use zhmc_core::{CapacityChange, Error, HmcClient, Operation, Properties, Resource, Result};

use crate::lookup::find_cpc;
use crate::module::{required_str, ModuleOutput};
use crate::params::parse_params;

/// The CPC properties returned by the module, in HMC notation.
const CPC_CAPACITY_PROPERTIES: [&str; 34] = [
    "name",
    "has-temporary-capacity-change-allowed",
    "is-on-off-cod-enabled",
    "is-on-off-cod-installed",
    "is-on-off-cod-activated",
    "on-off-cod-activation-date",
    "software-model-purchased",
    "software-model-permanent",
    "software-model-permanent-plus-billable",
    "software-model-permanent-plus-temporary",
    "msu-purchased",
    "msu-permanent",
    "msu-permanent-plus-billable",
    "msu-permanent-plus-temporary",
    "processor-count-general-purpose",
    "processor-count-ifl",
    "processor-count-icf",
    "processor-count-iip",
    "processor-count-service-assist",
    "processor-count-spare",
    "processor-count-defective",
    "processor-count-pending-general-purpose",
    "processor-count-pending-ifl",
    "processor-count-pending-icf",
    "processor-count-pending-iip",
    "processor-count-pending-service-assist",
    "processor-count-permanent-ifl",
    "processor-count-permanent-icf",
    "processor-count-permanent-iip",
    "processor-count-permanent-service-assist",
    "processor-count-unassigned-ifl",
    "processor-count-unassigned-icf",
    "processor-count-unassigned-iip",
    "processor-count-unassigned-service-assist",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CpcCapacityState {
    Set,
    Facts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SoftwareModelDirection {
    Increase,
    Decrease,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CpcCapacityParams {
    name: String,
    state: CpcCapacityState,
    #[serde(default)]
    record_id: Option<String>,
    #[serde(default)]
    software_model: Option<String>,
    #[serde(default)]
    software_model_direction: Option<SoftwareModelDirection>,
    #[serde(default)]
    specialty_processors: Option<BTreeMap<String, i64>>,
    #[serde(default)]
    test_activation: bool,
    #[serde(default)]
    force: bool,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: CpcCapacityParams = parse_params(params)?;
    match params.state {
        CpcCapacityState::Set => ensure_set(client, &params, check_mode),
        CpcCapacityState::Facts => facts(client, &params),
    }
}

/// Processor numbers by specialty processor type.
type ProcessorInfo = BTreeMap<String, i64>;

/// The current numbers of the specialty processors of a CPC.
fn current_processors(cpc: &Resource) -> ProcessorInfo {
    SPECIALTY_PROCESSORS
        .iter()
        .map(|(kind, prop)| (kind.to_string(), cpc.int_prop(prop).unwrap_or(0)))
        .collect()
}

/// Split target processor numbers into the numbers to add and the numbers to
/// remove, relative to the current numbers.
fn split_target_processors(
    target: &ProcessorInfo,
    current: &ProcessorInfo,
) -> Result<(ProcessorInfo, ProcessorInfo)> {
    let mut add = ProcessorInfo::new();
    let mut remove = ProcessorInfo::new();
    for (kind, &target_number) in target {
        let current_number = *current.get(kind).ok_or_else(|| {
            Error::parameter(format!(
                "Invalid specialty processor type '{}' in 'specialty_processors' module \
                 parameter; valid types are: ifl, icf, iip, sap",
                kind
            ))
        })?;
        if target_number > current_number {
            add.insert(kind.clone(), target_number - current_number);
        } else if target_number < current_number {
            remove.insert(kind.clone(), current_number - target_number);
        }
    }
    Ok((add, remove))
}

/// The CPC capacity properties, with underscores.
fn cpc_result(cpc: &Resource) -> Properties {
    let props: Properties = CPC_CAPACITY_PROPERTIES
        .iter()
        .filter_map(|name| cpc.prop(name).map(|value| (name.to_string(), value.clone())))
        .collect();
    underscore_properties(&props)
}

fn ensure_set(
    client: &dyn HmcClient,
    params: &CpcCapacityParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let record_id = required_str(&params.record_id, "record_id")?;
    let mut cpc = find_cpc(client, &params.name)?;
    client.pull_properties(&mut cpc)?;

    let mut add_software_model = None;
    let mut remove_software_model = None;
    if let Some(model) = params.software_model.as_deref().filter(|m| !m.is_empty()) {
        if cpc.str_prop("software-model-permanent-plus-temporary") != Some(model) {
            match params.software_model_direction {
                Some(SoftwareModelDirection::Increase) => add_software_model = Some(model),
                Some(SoftwareModelDirection::Decrease) => remove_software_model = Some(model),
                None => {
                    return Err(Error::parameter(
                        "Missing required module input parameter: software_model_direction",
                    ))
                }
            }
        }
    }

    let (add_processors, remove_processors) = match &params.specialty_processors {
        Some(target) if !target.is_empty() => {
            split_target_processors(target, &current_processors(&cpc))?
        }
        _ => (ProcessorInfo::new(), ProcessorInfo::new()),
    };

    let mut changed = false;
    let mut need_pull = false;

    if !add_processors.is_empty() || add_software_model.is_some() {
        debug!(
            "Adding temporary capacity to CPC '{}': software_model={:?}, processors={:?}",
            cpc.name(),
            add_software_model,
            add_processors
        );
        if check_mode {
            let changes = capacity_changes(
                &cpc.properties,
                CapacityChange::Add,
                add_software_model,
                &add_processors,
            );
            cpc.update_local(&changes);
        } else {
            let operation = Operation::AddTemporaryCapacity {
                record_id: record_id.to_string(),
                software_model: add_software_model.map(str::to_string),
                processor_info: add_processors,
                test: params.test_activation,
                force: params.force,
            };
            client.invoke(&cpc.uri, &operation)?;
            need_pull = true;
        }
        changed = true;
    }

    if !remove_processors.is_empty() || remove_software_model.is_some() {
        debug!(
            "Removing temporary capacity from CPC '{}': software_model={:?}, processors={:?}",
            cpc.name(),
            remove_software_model,
            remove_processors
        );
        if check_mode {
            let changes = capacity_changes(
                &cpc.properties,
                CapacityChange::Remove,
                remove_software_model,
                &remove_processors,
            );
            cpc.update_local(&changes);
        } else {
            let operation = Operation::RemoveTemporaryCapacity {
                record_id: record_id.to_string(),
                software_model: remove_software_model.map(str::to_string),
                processor_info: remove_processors,
            };
            client.invoke(&cpc.uri, &operation)?;
            need_pull = true;
        }
        changed = true;
    }

    if need_pull {
        client.pull_properties(&mut cpc)?;
    }
    Ok(ModuleOutput::new(changed, cpc_result(&cpc)))
}

fn facts(client: &dyn HmcClient, params: &CpcCapacityParams) -> Result<ModuleOutput> {
    let mut cpc = find_cpc(client, &params.name)?;
    client.pull_properties(&mut cpc)?;
    Ok(ModuleOutput::new(false, cpc_result(&cpc)))
}
