//! Temporary capacity of a CPC.
//!
//! The specialty processor types that can be changed through temporary
//! capacity records are keyed `ifl`, `icf`, `iip` and `sap`, each with a
//! corresponding processor count property of the CPC.

use serde_json::Value;
use std::collections::BTreeMap;

use super::resource::Properties;

/// Specialty processor types and their processor count properties.
pub const SPECIALTY_PROCESSORS: [(&str, &str); 4] = [
    ("ifl", "processor-count-ifl"),
    ("icf", "processor-count-icf"),
    ("iip", "processor-count-iip"),
    ("sap", "processor-count-service-assist"),
];

/// The processor count property of a specialty processor type.
pub fn processor_count_property(kind: &str) -> Option<&'static str> {
    SPECIALTY_PROCESSORS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, prop)| *prop)
}

/// Direction of a temporary capacity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityChange {
    /// Activate temporary capacity.
    Add,
    /// Deactivate temporary capacity.
    Remove,
}

/// Compute the CPC properties resulting from a temporary capacity change.
///
/// A software model change moves the general purpose processor count by one.
/// When capacity is added, the billable software model follows the
/// temporary one.
///
/// # Arguments
///
/// * `current` - The current CPC properties.
/// * `change` - Whether capacity is added or removed.
/// * `software_model` - Target software model, if it changes.
/// * `processor_info` - Processor deltas by specialty processor type.
///
/// # Returns
///
/// The changed properties only.
pub fn capacity_changes(
    current: &Properties,
    change: CapacityChange,
    software_model: Option<&str>,
    processor_info: &BTreeMap<String, i64>,
) -> Properties {
    let count = |name: &str| current.get(name).and_then(Value::as_i64).unwrap_or(0);
    let sign = match change {
        CapacityChange::Add => 1,
        CapacityChange::Remove => -1,
    };

    let mut changes = Properties::new();
    if let Some(model) = software_model {
        let current_model = current
            .get("software-model-permanent-plus-temporary")
            .and_then(Value::as_str);
        if current_model != Some(model) {
            changes.insert(
                "software-model-permanent-plus-temporary".to_string(),
                Value::from(model),
            );
            if change == CapacityChange::Add {
                changes.insert(
                    "software-model-permanent-plus-billable".to_string(),
                    Value::from(model),
                );
            }
            changes.insert(
                "processor-count-general-purpose".to_string(),
                Value::from(count("processor-count-general-purpose") + sign),
            );
        }
    }
    for (kind, delta) in processor_info {
        if let Some(prop) = processor_count_property(kind) {
            changes.insert(prop.to_string(), Value::from(count(prop) + sign * delta));
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cpc() -> Properties {
        json!({
            "software-model-permanent-plus-temporary": "710",
            "software-model-permanent-plus-billable": "710",
            "processor-count-general-purpose": 10,
            "processor-count-ifl": 4,
            "processor-count-service-assist": 2,
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn test_add_capacity() {
        let info = BTreeMap::from([("ifl".to_string(), 2), ("sap".to_string(), 1)]);
        let changes = capacity_changes(&cpc(), CapacityChange::Add, Some("711"), &info);
        assert_eq!(changes["software-model-permanent-plus-temporary"], "711");
        assert_eq!(changes["software-model-permanent-plus-billable"], "711");
        assert_eq!(changes["processor-count-general-purpose"], 11);
        assert_eq!(changes["processor-count-ifl"], 6);
        assert_eq!(changes["processor-count-service-assist"], 3);
    }

    #[test]
    fn test_remove_capacity() {
        let info = BTreeMap::from([("ifl".to_string(), 1)]);
        let changes = capacity_changes(&cpc(), CapacityChange::Remove, Some("709"), &info);
        assert_eq!(changes["software-model-permanent-plus-temporary"], "709");
        assert!(!changes.contains_key("software-model-permanent-plus-billable"));
        assert_eq!(changes["processor-count-general-purpose"], 9);
        assert_eq!(changes["processor-count-ifl"], 3);
    }

    #[test]
    fn test_same_software_model_is_no_change() {
        let changes =
            capacity_changes(&cpc(), CapacityChange::Add, Some("710"), &BTreeMap::new());
        assert!(changes.is_empty());
        assert_eq!(processor_count_property("iip"), Some("processor-count-iip"));
        assert_eq!(processor_count_property("zaap"), None);
    }
}
