//! Property tables and the property diff engine.
//!
//! Every resource type has a static `PropertyTable` describing, for each
//! property that can appear in the `properties` module parameter, whether it
//! may be given at all, whether it can be set at creation and by a later
//! update, whether the update needs the resource to be quiesced first, and
//! how values are compared and converted.
//!
//! `process_properties` uses such a table to split a desired-property
//! dictionary into the properties to pass on creation, the properties to
//! pass on update, and whether the resource must be deactivated first.

pub mod cast;
pub mod diff;
pub mod eq;
pub mod spec;

pub use diff::{process_normal_property, process_properties, validate_input, PropertyChanges};
pub use spec::{CastFn, DefaultValue, EqFn, PropertySpec, PropertyTable, Requiredness};
