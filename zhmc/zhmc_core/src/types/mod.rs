//! Data types shared by the zhmc crates.

pub mod capacity;
pub mod operation;
pub mod resource;

pub use capacity::{capacity_changes, processor_count_property, CapacityChange};
pub use operation::{CryptoDomainConfig, Operation};
pub use resource::{Filter, Properties, Resource, ResourceClass};
