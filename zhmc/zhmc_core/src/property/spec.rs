//! Declarative property metadata.

use serde_json::Value;

use crate::error::Result;
use crate::types::Properties;

/// Equality test between the current value (if any) and a new input value.
///
/// The third argument is the property name, used in error messages.
pub type EqFn = fn(Option<&Value>, &Value, &str) -> Result<bool>;

/// Conversion applied to an input value before it is compared or sent.
pub type CastFn = fn(&Value, &str) -> Result<Value>;

/// Predicate over the create properties, for conditionally required properties.
pub type RequiredFn = fn(&Properties) -> bool;

/// Whether a property must be specified when a resource is created.
#[derive(Clone, Copy)]
pub enum Requiredness {
    /// Never required.
    Never,
    /// Always required.
    Always,
    /// Required when the predicate holds for the create properties.
    When(RequiredFn),
}

impl Requiredness {
    /// Evaluate against the properties a resource would be created with.
    pub fn is_required(&self, props: &Properties) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::When(f) => f(props),
        }
    }
}

/// Default value the HMC assigns when a property is not specified on creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    /// No default is known; the property is left out.
    Unknown,
    /// JSON null.
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(&'static str),
    /// An empty list.
    EmptyList,
    /// The default depends on other properties and is computed by the
    /// resource-specific code.
    Special,
}

impl DefaultValue {
    /// The default as a JSON value, if it is a fixed value.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Self::Unknown | Self::Special => None,
            Self::Null => Some(Value::Null),
            Self::Bool(b) => Some(Value::Bool(*b)),
            Self::Int(i) => Some(Value::from(*i)),
            Self::Float(f) => Some(Value::from(*f)),
            Self::Str(s) => Some(Value::String((*s).to_string())),
            Self::EmptyList => Some(Value::Array(Vec::new())),
        }
    }
}

/// Metadata for one property of a resource type.
///
/// The name uses the module notation (underscores); the HMC name is derived
/// by replacing underscores with hyphens.
#[derive(Clone, Copy)]
pub struct PropertySpec {
    /// Property name with underscores.
    pub name: &'static str,

    /// May be specified in the `properties` module parameter.
    pub allowed: bool,

    /// Can be specified when creating the resource.
    pub create: bool,

    /// Can be specified when updating the resource.
    pub update: bool,

    /// Can be updated without deactivating the resource.
    pub update_while_active: bool,

    /// Equality test; `None` means plain value equality.
    pub eq_func: Option<EqFn>,

    /// Type cast for input values; `None` means the value is used as is.
    pub type_cast: Option<CastFn>,

    /// Requiredness on creation.
    pub required: Requiredness,

    /// HMC default on creation.
    pub default: DefaultValue,
}

impl PropertySpec {
    /// A property with the given flags.
    pub const fn new(
        name: &'static str,
        allowed: bool,
        create: bool,
        update: bool,
        update_while_active: bool,
    ) -> Self {
        Self {
            name,
            allowed,
            create,
            update,
            update_while_active,
            eq_func: None,
            type_cast: None,
            required: Requiredness::Never,
            default: DefaultValue::Unknown,
        }
    }

    /// A property that can be created and updated while the resource is active.
    pub const fn writable(name: &'static str) -> Self {
        Self::new(name, true, true, true, true)
    }

    /// A read-only property.
    pub const fn read_only(name: &'static str) -> Self {
        Self::new(name, false, false, false, true)
    }

    /// Set the equality test.
    pub const fn with_eq(mut self, f: EqFn) -> Self {
        self.eq_func = Some(f);
        self
    }

    /// Set the type cast.
    pub const fn with_cast(mut self, f: CastFn) -> Self {
        self.type_cast = Some(f);
        self
    }

    /// Mark the property as always required on creation.
    pub const fn required(mut self) -> Self {
        self.required = Requiredness::Always;
        self
    }

    /// Mark the property as conditionally required on creation.
    pub const fn required_when(mut self, f: RequiredFn) -> Self {
        self.required = Requiredness::When(f);
        self
    }

    /// Set the HMC default.
    pub const fn with_default(mut self, d: DefaultValue) -> Self {
        self.default = d;
        self
    }

    /// The property name in HMC notation.
    pub fn hmc_name(&self) -> String {
        self.name.replace('_', "-")
    }
}

/// The property metadata for one resource type.
pub struct PropertyTable {
    /// Resource type name used in messages, e.g. `Partition`.
    pub resource: &'static str,

    /// Plural used in messages, e.g. `partitions`.
    pub plural: &'static str,

    /// The property specifications.
    pub specs: &'static [PropertySpec],
}

impl PropertyTable {
    /// Look up a property by its module (underscore) name.
    pub fn get(&self, name: &str) -> Option<&PropertySpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    /// Iterate over the property specifications.
    pub fn iter(&self) -> impl Iterator<Item = &PropertySpec> {
        self.specs.iter()
    }

    /// HMC names of all properties that are never allowed as input.
    pub fn read_only_hmc_names(&self) -> Vec<String> {
        self.specs
            .iter()
            .filter(|spec| !spec.allowed)
            .map(PropertySpec::hmc_name)
            .collect()
    }
}
