//! The `zhmc_crypto_attachment` module: crypto adapters and domains
//! attached to a partition.
//!
//! Domains are attached in one access mode to all attached adapters. A
//! domain of an adapter can be attached in usage mode to only one partition,
//! so adapters whose desired domains are already used by another partition
//! are skipped when picking adapters by count.

use log::debug;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

use zhmc_core::utils::repr;
use zhmc_core::{
    CryptoDomainConfig, Error, Filter, HmcClient, Operation, Properties, Resource, ResourceClass,
    Result,
};

use crate::lookup::{find_cpc, find_partition};
use crate::module::ModuleOutput;
use crate::params::parse_params;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CryptoAttachmentState {
    Attached,
    Detached,
    Facts,
}

/// Access mode of attached domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    #[default]
    Usage,
    Control,
}

impl AccessMode {
    /// The access mode in HMC notation.
    pub fn hmc_name(&self) -> &'static str {
        match self {
            Self::Usage => "control-usage",
            Self::Control => "control",
        }
    }

    /// The access mode for an HMC access mode.
    pub fn from_hmc_name(name: &str) -> Option<Self> {
        match name {
            "control-usage" => Some(Self::Usage),
            "control" => Some(Self::Control),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Usage => "usage",
            Self::Control => "control",
        }
    }
}

/// Type of crypto adapters to attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CryptoType {
    Acc,
    Cca,
    #[default]
    Ep11,
}

impl CryptoType {
    /// The `crypto-type` adapter property value.
    pub fn hmc_name(&self) -> &'static str {
        match self {
            Self::Acc => "accelerator",
            Self::Cca => "cca-coprocessor",
            Self::Ep11 => "ep11-coprocessor",
        }
    }
}

fn default_domain_range() -> Vec<Value> {
    vec![json!(0), json!(-1)]
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CryptoAttachmentParams {
    cpc_name: String,
    partition_name: String,
    state: CryptoAttachmentState,
    #[serde(default)]
    adapter_count: Option<i64>,
    #[serde(default)]
    adapter_names: Vec<String>,
    #[serde(default = "default_domain_range")]
    domain_range: Vec<Value>,
    #[serde(default)]
    access_mode: AccessMode,
    #[serde(default)]
    crypto_type: CryptoType,
}

/// Run the module.
pub fn run(client: &dyn HmcClient, params: &Properties, check_mode: bool) -> Result<ModuleOutput> {
    let params: CryptoAttachmentParams = parse_params(params)?;
    match params.state {
        CryptoAttachmentState::Attached => ensure_attached(client, &params, check_mode),
        CryptoAttachmentState::Detached => ensure_detached(client, &params, check_mode),
        CryptoAttachmentState::Facts => facts(client, &params),
    }
}

/// Maximum number of crypto domains of the adapters of a CPC, by machine
/// type.
pub fn maximum_crypto_domains(cpc: &Resource) -> Result<i64> {
    let machine_type = cpc.str_prop("machine-type").unwrap_or("");
    match machine_type {
        // z196 and z114
        "2817" | "2818" => Ok(16),
        // zEC12 up to z17
        "2827" | "2964" | "3906" | "8561" | "3931" | "9175" => Ok(85),
        // zBC12 up to z16 A02
        "2828" | "2965" | "3907" | "8562" | "3932" => Ok(40),
        _ => Err(Error::Version(format!(
            "The maximum number of crypto domains is not known for CPC '{}' with machine \
             type '{}'",
            cpc.name(),
            machine_type
        ))),
    }
}

/// Parse the `domain_range` parameter into its boundaries, with `-1` as
/// upper boundary standing for the highest domain index.
fn parse_domain_range(range: &[Value], max_domains: i64) -> Result<(i64, i64)> {
    let invalid = || {
        Error::parameter(format!(
            "The 'domain_range' parameter must be a list containing two integer numbers, but \
             is: {}",
            repr(&Value::Array(range.to_vec()))
        ))
    };
    let as_int = |value: &Value| match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    let [lo, hi] = range else {
        return Err(invalid());
    };
    let lo = as_int(lo).ok_or_else(invalid)?;
    let mut hi = as_int(hi).ok_or_else(invalid)?;
    if hi == -1 {
        hi = max_domains - 1;
    }
    if lo > hi {
        return Err(Error::parameter(format!(
            "In the 'domain_range' parameter, the lower boundary (={}) of the range must be \
             less than the higher boundary (={})",
            lo, hi
        )));
    }
    Ok((lo, hi))
}

/// The crypto configuration of a partition: attached adapter URIs and
/// domain index to HMC access mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CryptoConfig {
    /// URIs of the attached adapters.
    pub adapter_uris: Vec<String>,

    /// Attached domains with their HMC access mode.
    pub domains: BTreeMap<i64, String>,
}

impl CryptoConfig {
    fn from_partition(partition: &Resource) -> Self {
        let Some(config) = partition.prop("crypto-configuration").filter(|c| !c.is_null()) else {
            return Self::default();
        };
        let adapter_uris = match config.get("crypto-adapter-uris") {
            Some(Value::Array(uris)) => uris
                .iter()
                .filter_map(|u| u.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        let mut domains = BTreeMap::new();
        if let Some(Value::Array(configs)) = config.get("crypto-domain-configurations") {
            for dc in configs {
                let index = dc.get("domain-index").and_then(Value::as_i64);
                let mode = dc.get("access-mode").and_then(Value::as_str);
                if let (Some(index), Some(mode)) = (index, mode) {
                    domains.insert(index, mode.to_string());
                }
            }
        }
        Self {
            adapter_uris,
            domains,
        }
    }
}

/// A partition of the CPC using a domain of an adapter.
#[derive(Debug, Clone)]
struct DomainUse {
    hmc_access_mode: String,
    partition_uri: String,
    partition_name: String,
}

/// Domain use of all partitions of a CPC, by adapter URI and domain index.
#[derive(Debug, Default)]
struct DomainUsage {
    uses: HashMap<String, BTreeMap<i64, Vec<DomainUse>>>,
}

impl DomainUsage {
    fn collect(client: &dyn HmcClient, cpc: &Resource) -> Result<Self> {
        let mut usage = Self::default();
        for mut partition in client.list(ResourceClass::Partition, Some(&cpc.uri), &Filter::all())? {
            if partition.prop("crypto-configuration").is_none() {
                client.pull_properties(&mut partition)?;
            }
            let config = CryptoConfig::from_partition(&partition);
            for adapter_uri in &config.adapter_uris {
                let domains = usage.uses.entry(adapter_uri.clone()).or_default();
                for (index, mode) in &config.domains {
                    domains.entry(*index).or_default().push(DomainUse {
                        hmc_access_mode: mode.clone(),
                        partition_uri: partition.uri.clone(),
                        partition_name: partition.name().to_string(),
                    });
                }
            }
        }
        Ok(usage)
    }

    fn uses(&self, adapter_uri: &str, index: i64) -> &[DomainUse] {
        self.uses
            .get(adapter_uri)
            .and_then(|domains| domains.get(&index))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The desired domains of an adapter that another partition already
    /// uses in usage mode, with that partition's access mode and name.
    fn conflicting_domains(
        &self,
        adapter: &Resource,
        partition: &Resource,
        desired: &[i64],
        access_mode: AccessMode,
    ) -> BTreeMap<i64, (String, String)> {
        let mut conflicts = BTreeMap::new();
        for index in desired {
            for domain_use in self.uses(&adapter.uri, *index) {
                if domain_use.hmc_access_mode == "control" {
                    continue;
                }
                if domain_use.partition_uri == partition.uri
                    && domain_use.hmc_access_mode == access_mode.hmc_name()
                {
                    continue;
                }
                conflicts.insert(
                    *index,
                    (
                        domain_use.hmc_access_mode.clone(),
                        domain_use.partition_name.clone(),
                    ),
                );
            }
        }
        conflicts
    }
}

/// List the crypto adapters of a CPC with their full properties.
fn crypto_adapters(
    client: &dyn HmcClient,
    cpc: &Resource,
    crypto_type: Option<CryptoType>,
) -> Result<Vec<Resource>> {
    let mut filter = Filter::all().with("adapter-family", "crypto");
    if let Some(crypto_type) = crypto_type {
        filter = filter.with("crypto-type", crypto_type.hmc_name());
    }
    let mut adapters = client.list(ResourceClass::Adapter, Some(&cpc.uri), &filter)?;
    for adapter in adapters.iter_mut() {
        client.pull_properties(adapter)?;
    }
    Ok(adapters)
}

/// The module result for the crypto configuration of a partition.
pub fn partition_crypto_result(partition: &Resource, adapters: &[Resource]) -> Value {
    let config = CryptoConfig::from_partition(partition);
    let attached: Properties = adapters
        .iter()
        .filter(|a| config.adapter_uris.contains(&a.uri))
        .map(|a| (a.name().to_string(), Value::Object(a.properties.clone())))
        .collect();
    let mut domain_config = Properties::new();
    let mut usage_domains = Vec::new();
    let mut control_domains = Vec::new();
    for (index, hmc_mode) in &config.domains {
        match AccessMode::from_hmc_name(hmc_mode) {
            Some(AccessMode::Control) => control_domains.push(*index),
            _ => usage_domains.push(*index),
        }
        let mode = AccessMode::from_hmc_name(hmc_mode).map_or(hmc_mode.as_str(), |m| m.as_str());
        domain_config.insert(index.to_string(), json!(mode));
    }
    let mut result = Properties::new();
    result.insert(
        partition.name().to_string(),
        json!({
            "adapters": attached,
            "domain_config": domain_config,
            "usage_domains": usage_domains,
            "control_domains": control_domains,
        }),
    );
    Value::Object(result)
}

fn increase(
    client: &dyn HmcClient,
    partition: &Resource,
    adapters: &[&Resource],
    domains: &[i64],
    access_mode: AccessMode,
) -> Result<()> {
    let operation = Operation::IncreaseCryptoConfig {
        adapter_uris: adapters.iter().map(|a| a.uri.clone()).collect(),
        domain_configs: domains
            .iter()
            .map(|index| CryptoDomainConfig::new(*index, access_mode.hmc_name()))
            .collect(),
    };
    client.invoke(&partition.uri, &operation).map_err(|e| {
        let names: Vec<&str> = adapters.iter().map(|a| a.name()).collect();
        Error::failed(if names.is_empty() {
            format!(
                "Attaching domains {:?} in '{}' mode to target partition '{}' failed: {}",
                domains,
                access_mode.as_str(),
                partition.name(),
                e
            )
        } else {
            format!(
                "Attaching adapter '{}' and domains {:?} in '{}' mode to target partition '{}' \
                 failed: {}",
                names.join("', '"),
                domains,
                access_mode.as_str(),
                partition.name(),
                e
            )
        })
    })
}

fn ensure_attached(
    client: &dyn HmcClient,
    params: &CryptoAttachmentParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let adapter_count = params.adapter_count.filter(|c| *c != 0);
    if adapter_count.is_some() && !params.adapter_names.is_empty() {
        return Err(Error::parameter(format!(
            "The 'adapter_count' and 'adapter_names' parameters are mutually exclusive, but \
             both have been specified: adapter_count={}, adapter_names={:?}",
            adapter_count.unwrap_or_default(),
            params.adapter_names
        )));
    }
    if adapter_count.is_none() && params.adapter_names.is_empty() {
        return Err(Error::parameter(
            "State 'attached' requires either the 'adapter_count' or the 'adapter_names' \
             parameter to be specified",
        ));
    }
    let crypto_type = if params.adapter_names.is_empty() {
        Some(params.crypto_type)
    } else {
        None
    };
    let access_mode = params.access_mode;

    let cpc = find_cpc(client, &params.cpc_name)?;
    let mut partition = find_partition(client, &cpc, &params.partition_name)?;
    client.pull_properties(&mut partition)?;

    let all_adapters = crypto_adapters(client, &cpc, crypto_type)?;
    if all_adapters.is_empty() {
        return Err(Error::failed(format!(
            "No crypto adapters found on CPC '{}'",
            params.cpc_name
        )));
    }
    let (lo, hi) = parse_domain_range(&params.domain_range, maximum_crypto_domains(&cpc)?)?;

    if let Some(count) = adapter_count {
        if count < 1 {
            return Err(Error::parameter(format!(
                "The 'adapter_count' parameter must be at least 1, but is: {}",
                count
            )));
        }
        if count > all_adapters.len() as i64 {
            return Err(Error::parameter(format!(
                "The 'adapter_count' parameter must not exceed the number of {} crypto adapters \
                 of type '{}' in CPC '{}', but is {}",
                all_adapters.len(),
                params.crypto_type.hmc_name(),
                params.cpc_name,
                count
            )));
        }
    }
    for name in &params.adapter_names {
        if !all_adapters.iter().any(|a| a.name() == name.as_str()) {
            return Err(Error::parameter(format!(
                "The 'adapter_names' parameter specifies a crypto adapter named '{}' that does \
                 not exist on CPC '{}'",
                name, params.cpc_name
            )));
        }
    }

    let config = CryptoConfig::from_partition(&partition);
    let (attached, detached): (Vec<&Resource>, Vec<&Resource>) = all_adapters
        .iter()
        .partition(|a| config.adapter_uris.contains(&a.uri));
    debug!(
        "Crypto config of partition '{}': adapters {:?}, domains {:?}",
        partition.name(),
        attached.iter().map(|a| a.name()).collect::<Vec<_>>(),
        config.domains
    );

    let usage = DomainUsage::collect(client, &cpc)?;

    let desired: Vec<i64> = (lo..=hi).collect();
    let mut add_domains = Vec::new();
    for index in &desired {
        match config.domains.get(index) {
            None => add_domains.push(*index),
            Some(mode) if mode != access_mode.hmc_name() => {
                let mode = AccessMode::from_hmc_name(mode).map_or(mode.as_str(), |m| m.as_str());
                return Err(Error::failed(format!(
                    "Domain {} is currently attached in '{}' mode to target partition '{}', but \
                     requested was for mode '{}'",
                    index,
                    mode,
                    partition.name(),
                    access_mode.as_str()
                )));
            }
            Some(_) => {}
        }
    }

    // Domains to add must be free on all adapters that are already attached.
    for adapter in &attached {
        for index in &add_domains {
            for domain_use in usage.uses(&adapter.uri, *index) {
                if domain_use.hmc_access_mode != "control" && access_mode != AccessMode::Control {
                    let mode = AccessMode::from_hmc_name(&domain_use.hmc_access_mode)
                        .map_or(domain_use.hmc_access_mode.as_str(), |m| m.as_str());
                    return Err(Error::failed(format!(
                        "Domain {} cannot be attached in '{}' mode to target partition '{}' \
                         because it is already attached in '{}' mode to partition '{}'",
                        index,
                        access_mode.as_str(),
                        partition.name(),
                        mode,
                        domain_use.partition_name
                    )));
                }
            }
        }
    }

    let mut changed = false;
    let mut added_adapters: Vec<String> = Vec::new();
    let mut added_domains: Vec<i64> = Vec::new();

    if params.adapter_names.is_empty() {
        let mut missing = (adapter_count.unwrap_or_default() - attached.len() as i64).max(0);
        if missing == 0 && !add_domains.is_empty() {
            debug!(
                "Adapters sufficient - attaching domains {:?} in '{}' mode to target partition \
                 '{}'",
                add_domains,
                access_mode.as_str(),
                partition.name()
            );
            if !check_mode {
                increase(client, &partition, &[], &add_domains, access_mode)?;
            }
            changed = true;
            added_domains.append(&mut add_domains);
        } else if missing > 0 {
            for adapter in &detached {
                if missing == 0 {
                    break;
                }
                let conflicts = usage.conflicting_domains(adapter, &partition, &desired, access_mode);
                if !conflicts.is_empty() {
                    debug!(
                        "Skipping adapter '{}' because the following of its domains are already \
                         attached to other partitions: {:?}",
                        adapter.name(),
                        conflicts
                    );
                    continue;
                }
                debug!(
                    "Attaching adapter '{}' and domains {:?} in '{}' mode to target partition \
                     '{}'",
                    adapter.name(),
                    add_domains,
                    access_mode.as_str(),
                    partition.name()
                );
                if !check_mode {
                    increase(client, &partition, &[*adapter], &add_domains, access_mode)?;
                }
                changed = true;
                added_adapters.push(adapter.name().to_string());
                added_domains.append(&mut add_domains);
                missing -= 1;
            }
            if missing > 0 {
                return Err(Error::failed(format!(
                    "Did not find enough crypto adapters with attachable domains - missing \
                     adapters: {}; Requested domains: {:?}, Access mode: {}",
                    missing,
                    desired,
                    access_mode.as_str()
                )));
            }
        }
    } else {
        for name in &params.adapter_names {
            if attached.iter().any(|a| a.name() == name.as_str()) {
                continue;
            }
            let Some(adapter) = detached.iter().find(|a| a.name() == name.as_str()) else {
                continue;
            };
            let conflicts = usage.conflicting_domains(adapter, &partition, &desired, access_mode);
            if !conflicts.is_empty() {
                return Err(Error::failed(format!(
                    "Crypto adapter '{}' cannot be attached to partition '{}' because the \
                     following of its domains are already attached to other partitions in \
                     conflicting modes: {:?}",
                    adapter.name(),
                    partition.name(),
                    conflicts
                )));
            }
            if !check_mode {
                increase(client, &partition, &[*adapter], &add_domains, access_mode)?;
            }
            changed = true;
            added_adapters.push(adapter.name().to_string());
            added_domains.append(&mut add_domains);
        }
        if !add_domains.is_empty() {
            debug!(
                "Adapters were already attached to target partition '{}' - attaching domains \
                 {:?} in '{}' mode",
                partition.name(),
                add_domains,
                access_mode.as_str()
            );
            if !check_mode {
                increase(client, &partition, &[], &add_domains, access_mode)?;
            }
            changed = true;
            added_domains.append(&mut add_domains);
        }
    }

    let result = if check_mode {
        json!({})
    } else {
        client.pull_properties(&mut partition)?;
        partition_crypto_result(&partition, &all_adapters)
    };
    Ok(ModuleOutput::new(changed, result).with_extra(
        "changes",
        json!({"added-adapters": added_adapters, "added-domains": added_domains}),
    ))
}

fn ensure_detached(
    client: &dyn HmcClient,
    params: &CryptoAttachmentParams,
    check_mode: bool,
) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let mut partition = find_partition(client, &cpc, &params.partition_name)?;
    client.pull_properties(&mut partition)?;
    let all_adapters = crypto_adapters(client, &cpc, None)?;

    let mut changed = false;
    let mut changes = Properties::new();
    if partition
        .prop("crypto-configuration")
        .is_some_and(|c| !c.is_null())
    {
        let config = CryptoConfig::from_partition(&partition);
        let remove_adapters: Vec<&Resource> = all_adapters
            .iter()
            .filter(|a| config.adapter_uris.contains(&a.uri))
            .collect();
        let remove_names: Vec<&str> = remove_adapters.iter().map(|a| a.name()).collect();
        let remove_domains: Vec<i64> = config.domains.keys().copied().collect();
        debug!(
            "Detaching adapters {:?} and domains {:?} from target partition '{}'",
            remove_names,
            remove_domains,
            partition.name()
        );
        if !check_mode {
            let operation = Operation::DecreaseCryptoConfig {
                adapter_uris: remove_adapters.iter().map(|a| a.uri.clone()).collect(),
                domain_indexes: remove_domains.clone(),
            };
            client.invoke(&partition.uri, &operation).map_err(|e| {
                Error::failed(format!(
                    "Detaching adapters {:?} and domains {:?} from target partition '{}' \
                     failed: {}",
                    remove_names,
                    remove_domains,
                    partition.name(),
                    e
                ))
            })?;
        }
        changed = true;
        changes.insert("removed-adapters".to_string(), json!(remove_names));
        changes.insert("removed-domains".to_string(), json!(remove_domains));
    }

    let result = if check_mode {
        json!({})
    } else {
        client.pull_properties(&mut partition)?;
        partition_crypto_result(&partition, &all_adapters)
    };
    Ok(ModuleOutput::new(changed, result).with_extra("changes", changes))
}

fn facts(client: &dyn HmcClient, params: &CryptoAttachmentParams) -> Result<ModuleOutput> {
    let cpc = find_cpc(client, &params.cpc_name)?;
    let mut partition = find_partition(client, &cpc, &params.partition_name)?;
    client.pull_properties(&mut partition)?;
    let all_adapters = crypto_adapters(client, &cpc, None)?;
    Ok(ModuleOutput::new(
        false,
        partition_crypto_result(&partition, &all_adapters),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zhmc_session::FakedHmc;

    fn props(value: Value) -> Properties {
        value.as_object().unwrap().clone()
    }

    fn setup() -> (FakedHmc, String) {
        let hmc = FakedHmc::new();
        let cpc = hmc
            .add_cpc(props(json!({"name": "CPC1", "machine-type": "3906", "dpm-enabled": true})))
            .unwrap();
        for name in ["CRYP00", "CRYP01"] {
            hmc.add(
                ResourceClass::Adapter,
                Some(&cpc),
                props(json!({
                    "name": name,
                    "adapter-family": "crypto",
                    "crypto-type": "ep11-coprocessor",
                })),
            )
            .unwrap();
        }
        hmc.add(
            ResourceClass::Adapter,
            Some(&cpc),
            props(json!({"name": "ACC00", "adapter-family": "crypto", "crypto-type": "accelerator"})),
        )
        .unwrap();
        for name in ["p1", "p2"] {
            hmc.add(ResourceClass::Partition, Some(&cpc), props(json!({"name": name})))
                .unwrap();
        }
        (hmc, cpc)
    }

    fn params(partition: &str, state: &str, extra: Value) -> Properties {
        let mut params = props(json!({
            "cpc_name": "CPC1",
            "partition_name": partition,
            "state": state,
        }));
        params.extend(props(extra));
        params
    }

    #[test]
    fn test_attach_by_count() {
        let (hmc, _) = setup();
        let output = run(
            &hmc,
            &params("p1", "attached", json!({"adapter_count": 1, "domain_range": [10, 11]})),
            false,
        )
        .unwrap();
        assert!(output.changed);
        assert_eq!(
            output.extra["changes"],
            json!({"added-adapters": ["CRYP00"], "added-domains": [10, 11]})
        );
        let p1 = &output.result["p1"];
        assert_eq!(p1["usage_domains"], json!([10, 11]));
        assert_eq!(p1["domain_config"], json!({"10": "usage", "11": "usage"}));
        assert!(p1["adapters"].get("CRYP00").is_some());

        let output = run(
            &hmc,
            &params("p1", "attached", json!({"adapter_count": 1, "domain_range": [10, 11]})),
            false,
        )
        .unwrap();
        assert!(!output.changed);
    }

    #[test]
    fn test_usage_conflict_skips_adapter() {
        let (hmc, _) = setup();
        run(
            &hmc,
            &params("p1", "attached", json!({"adapter_count": 1, "domain_range": [5, 5]})),
            false,
        )
        .unwrap();
        let output = run(
            &hmc,
            &params("p2", "attached", json!({"adapter_count": 1, "domain_range": [5, 5]})),
            false,
        )
        .unwrap();
        assert_eq!(output.extra["changes"]["added-adapters"], json!(["CRYP01"]));

        let err = run(
            &hmc,
            &params(
                "p2",
                "attached",
                json!({"adapter_names": ["CRYP00"], "domain_range": [5, 5]}),
            ),
            false,
        )
        .unwrap_err();
        assert_eq!(err.class_name(), "Error");
        assert!(err.to_string().starts_with("Crypto adapter 'CRYP00' cannot be attached"));
    }

    #[test]
    fn test_not_enough_adapters() {
        let (hmc, _) = setup();
        for partition in ["p1", "p2"] {
            run(
                &hmc,
                &params(
                    partition,
                    "attached",
                    json!({"adapter_count": 1, "domain_range": [0, 0]}),
                ),
                false,
            )
            .unwrap();
        }
        hmc.add(
            ResourceClass::Partition,
            Some(&hmc.find(ResourceClass::Cpc, None, "CPC1").unwrap().uri),
            props(json!({"name": "p3"})),
        )
        .unwrap();
        let err = run(
            &hmc,
            &params("p3", "attached", json!({"adapter_count": 1, "domain_range": [0, 0]})),
            false,
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Did not find enough crypto adapters with attachable domains"));
    }

    #[test]
    fn test_parameter_checks() {
        let (hmc, _) = setup();
        let err = run(
            &hmc,
            &params(
                "p1",
                "attached",
                json!({"adapter_count": 1, "adapter_names": ["CRYP00"]}),
            ),
            false,
        )
        .unwrap_err();
        assert_eq!(err.class_name(), "ParameterError");

        let err = run(
            &hmc,
            &params("p1", "attached", json!({"adapter_count": 3})),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("must not exceed the number of 2 crypto adapters"));

        let err = run(
            &hmc,
            &params("p1", "attached", json!({"adapter_count": 1, "domain_range": [4, 2]})),
            false,
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("In the 'domain_range' parameter"));

        let err = run(
            &hmc,
            &params("p1", "attached", json!({"adapter_count": 1, "domain_range": [1]})),
            false,
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("The 'domain_range' parameter must be a list"));
    }

    #[test]
    fn test_attach_requires_adapters() {
        let (hmc, _) = setup();
        for extra in [json!({"domain_range": [0, 1]}), json!({"adapter_count": 0})] {
            let err = run(&hmc, &params("p1", "attached", extra), false).unwrap_err();
            assert_eq!(
                err.failure_message(),
                "ParameterError: State 'attached' requires either the 'adapter_count' or the \
                 'adapter_names' parameter to be specified"
            );
        }
        assert!(hmc.mutations().is_empty());
    }

    #[test]
    fn test_maximum_crypto_domains_by_machine_type() {
        let cpc = |machine_type: &str| {
            Resource::new(
                "/api/cpcs/1",
                ResourceClass::Cpc,
                None,
                props(json!({"name": "CPC1", "machine-type": machine_type})),
            )
        };
        assert_eq!(maximum_crypto_domains(&cpc("2818")).unwrap(), 16);
        assert_eq!(maximum_crypto_domains(&cpc("2827")).unwrap(), 85);
        assert_eq!(maximum_crypto_domains(&cpc("3932")).unwrap(), 40);
        let err = maximum_crypto_domains(&cpc("2097")).unwrap_err();
        assert_eq!(err.class_name(), "VersionError");
        assert!(err.to_string().contains("machine type '2097'"));
    }

    #[test]
    fn test_control_mode_mismatch() {
        let (hmc, _) = setup();
        run(
            &hmc,
            &params("p1", "attached", json!({"adapter_count": 1, "domain_range": [3, 3]})),
            false,
        )
        .unwrap();
        let err = run(
            &hmc,
            &params(
                "p1",
                "attached",
                json!({"adapter_count": 1, "domain_range": [3, 3], "access_mode": "control"}),
            ),
            false,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Domain 3 is currently attached in 'usage' mode to target partition 'p1', but \
             requested was for mode 'control'"
        );
    }

    #[test]
    fn test_detach_and_facts() {
        let (hmc, _) = setup();
        run(
            &hmc,
            &params("p1", "attached", json!({"adapter_count": 2, "domain_range": [1, 2]})),
            false,
        )
        .unwrap();

        let output = run(&hmc, &params("p1", "detached", json!({})), true).unwrap();
        assert!(output.changed);
        assert_eq!(output.result, json!({}));
        assert_eq!(
            output.extra["changes"],
            json!({"removed-adapters": ["CRYP00", "CRYP01"], "removed-domains": [1, 2]})
        );

        run(&hmc, &params("p1", "detached", json!({})), false).unwrap();
        let output = run(&hmc, &params("p1", "facts", json!({})), false).unwrap();
        assert_eq!(output.result["p1"]["usage_domains"], json!([]));
        assert_eq!(output.result["p1"]["adapters"], json!({}));
    }
}
