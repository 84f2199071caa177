use crate::property::cast::cast_int;
use crate::property::{PropertySpec as P, PropertyTable};

const fn update_only(name: &'static str) -> P {
    P::new(name, true, false, true, true)
}

/// Properties of LPARs. LPARs cannot be created; their properties can only
/// be updated.
pub static LPAR_PROPERTIES: PropertyTable = PropertyTable {
    resource: "LPAR",
    plural: "LPARs",
    specs: &[
        update_only("acceptable_status"),
        update_only("next_activation_profile_name"),
        update_only("initial_processing_weight").with_cast(cast_int),
        update_only("initial_processing_weight_capped"),
        update_only("minimum_processing_weight").with_cast(cast_int),
        update_only("maximum_processing_weight").with_cast(cast_int),
        update_only("workload_manager_enabled"),
        update_only("absolute_processing_capping"),
        update_only("defined_capacity").with_cast(cast_int),
        update_only("number_general_purpose_cores").with_cast(cast_int),
        update_only("number_reserved_general_purpose_cores").with_cast(cast_int),
        update_only("number_icf_cores").with_cast(cast_int),
        update_only("number_reserved_icf_cores").with_cast(cast_int),
        update_only("number_ifl_cores").with_cast(cast_int),
        update_only("number_reserved_ifl_cores").with_cast(cast_int),
        update_only("number_ziip_cores").with_cast(cast_int),
        update_only("number_reserved_ziip_cores").with_cast(cast_int),
        update_only("number_aap_cores").with_cast(cast_int),
        update_only("number_reserved_aap_cores").with_cast(cast_int),
        update_only("initial_aap_processing_weight").with_cast(cast_int),
        update_only("initial_aap_processing_weight_capped"),
        update_only("minimum_aap_processing_weight").with_cast(cast_int),
        update_only("maximum_aap_processing_weight").with_cast(cast_int),
        update_only("absolute_aap_capping"),
        update_only("initial_ifl_processing_weight").with_cast(cast_int),
        update_only("initial_ifl_processing_weight_capped"),
        update_only("minimum_ifl_processing_weight").with_cast(cast_int),
        update_only("maximum_ifl_processing_weight").with_cast(cast_int),
        update_only("absolute_ifl_capping"),
        update_only("initial_cbp_processing_weight").with_cast(cast_int),
        update_only("initial_cbp_processing_weight_capped"),
        update_only("minimum_cbp_processing_weight").with_cast(cast_int),
        update_only("maximum_cbp_processing_weight").with_cast(cast_int),
        update_only("absolute_cbp_capping"),
        update_only("initial_ziip_processing_weight").with_cast(cast_int),
        update_only("initial_ziip_processing_weight_capped"),
        update_only("minimum_ziip_processing_weight").with_cast(cast_int),
        update_only("maximum_ziip_processing_weight").with_cast(cast_int),
        update_only("absolute_ziip_capping"),
        update_only("initial_cf_processing_weight").with_cast(cast_int),
        update_only("initial_cf_processing_weight_capped"),
        update_only("minimum_cf_processing_weight").with_cast(cast_int),
        update_only("maximum_cf_processing_weight").with_cast(cast_int),
        update_only("absolute_cf_capping"),
        update_only("zaware_hostname"),
        update_only("zaware_master_userid"),
        update_only("zaware_master_pw"),
        update_only("zaware_network_info"),
        update_only("zaware_gateway_info"),
        update_only("zaware_dns_info"),
        P::read_only("object_uri"),
        P::read_only("object_id"),
        P::read_only("parent"),
        P::read_only("class"),
        P::read_only("name"),
        P::read_only("description"),
        P::read_only("is_locked"),
        P::read_only("status"),
        P::read_only("os_name"),
        P::read_only("os_type"),
        P::read_only("os_version"),
        P::read_only("sysplex_name"),
        P::read_only("activation_mode"),
        P::read_only("last_used_activation_profile"),
        P::read_only("last_used_load_address"),
        P::read_only("last_used_load_parameter"),
        P::read_only("current_processing_weight"),
        P::read_only("number_general_purpose_processors"),
        P::read_only("number_ifl_processors"),
        P::read_only("number_ziip_processors"),
        P::read_only("number_icf_processors"),
        P::read_only("number_aap_processors"),
        P::read_only("storage_central_allocation"),
    ],
};
