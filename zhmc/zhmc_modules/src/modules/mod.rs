//! The modules, one per HMC resource type.
//!
//! Every module exposes `run(client, params, check_mode)`, which parses the
//! module parameters, dispatches on the `state` parameter and returns a
//! `ModuleOutput`.

pub(crate) mod console_object;

pub mod adapter;
pub mod console;
pub mod cpc;
pub mod cpc_capacity;
pub mod crypto_attachment;
pub mod hba;
pub mod ldap_server_definition;
pub mod lpar;
pub mod nic;
pub mod partition;
pub mod partition_command;
pub mod password_rule;
pub mod storage_group;
pub mod storage_group_attachment;
pub mod storage_volume;
pub mod user;
pub mod user_pattern;
pub mod user_role;
pub mod virtual_function;
