//! # zhmc Core
//!
//! `zhmc_core` provides the building blocks shared by the zhmc modules,
//! which reconcile IBM Z HMC resources (partitions, adapters attachments,
//! users and more) with a desired state.
//!
//! ## Crate Structure
//!
//! - **error**: Error types, including the errors of HMC clients
//! - **types**: Resources, property dictionaries and HMC operations
//! - **traits**: The `HmcClient` interface all HMC I/O goes through
//! - **property**: Property tables and the property diff engine
//! - **tables**: The property tables of all resource types
//! - **utils**: Name conversion, blanking, logging and configuration

pub mod error;
pub mod property;
pub mod tables;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export key types and traits for convenience
pub use error::{ClientError, Error, ErrorKind, Result};
pub use property::{PropertyChanges, PropertySpec, PropertyTable};
pub use traits::{HmcClient, OsMessageReceiver, CONSOLE_URI};
pub use types::{
    CapacityChange, CryptoDomainConfig, Filter, Operation, Properties, Resource, ResourceClass,
};
