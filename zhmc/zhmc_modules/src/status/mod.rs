//! Status transitions of partitions and LPARs.
//!
//! The helpers drive a resource into a desired status, whatever status it
//! is in when they are called, and report whether anything was (or in
//! check mode, would have been) changed. Waiting for a transition relies on
//! `HmcClient::wait_for_status`.

pub mod lpar;
pub mod partition;

pub use lpar::{ensure_lpar_active, ensure_lpar_inactive, ensure_lpar_loaded, LparOptions};
pub use partition::{
    pull_partition_status, start_partition, stop_partition, wait_for_transition_completion,
};
