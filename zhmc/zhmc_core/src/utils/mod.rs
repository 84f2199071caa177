//! Utility functions and helpers.
//!
//! This module contains various utility functions and helpers
//! that are used throughout the zhmc crates.

pub mod blank;
pub mod config;
pub mod logging;
pub mod names;

pub use blank::{blanked_dict, blanked_params, removed_dict, BLANKED_OUT};
pub use config::CliConfig;
pub use logging::{log_init, LogLevel, LogRecord};
pub use names::{hyphen_properties, underscore_properties};

use serde_json::Value;

/// Render a value for use in messages: strings in single quotes, other
/// values in JSON notation.
pub fn repr(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s),
        other => other.to_string(),
    }
}
