//! # zhmc Modules
//!
//! Idempotent "ensure state" modules for IBM Z HMC resources. Each module
//! takes its parameters as a JSON object, compares the desired state with
//! what the HMC reports and performs the minimal set of HMC operations to
//! reach it. In check mode, no HMC resource is changed; the result reports
//! what would have been done.
//!
//! ## Crate Structure
//!
//! - **module**: The module catalog, the runner and the module output
//! - **params**: Parameters common to all modules and parameter parsing
//! - **lookup**: Finding CPCs, partitions, adapters and console objects
//! - **status**: Status transitions of partitions and LPARs
//! - **modules**: One module per resource type

pub mod lookup;
pub mod module;
pub mod modules;
pub mod params;
pub mod status;

pub use module::{ModuleKind, ModuleOutput, ModuleRunner};
pub use params::{parse_params, CommonParams};
