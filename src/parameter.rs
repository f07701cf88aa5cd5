//! Parameter schema shared by every sampling component.
//!
//! A [`Parameter`] names one physical input of the parametric study, its
//! range, how that range is spread over the unit interval, how many levels it
//! gets in a full-factorial design, and whether the user varies it actively.
//!
//! # Example
//!
//! ```
//! use romsampler::parameter::Parameter;
//!
//! let velocity = Parameter::new("velocity", 5.0, 50.0);
//! let viscosity = Parameter::new("viscosity", 1e-6, 1e-3).log_scale().levels(4);
//! let temperature = Parameter::new("temperature", 280.0, 320.0).inactive();
//!
//! velocity.validate().unwrap();
//! viscosity.validate().unwrap();
//! assert!(!temperature.active);
//! ```

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::scale::{self, Scale};

/// Default number of full-factorial levels.
pub const DEFAULT_LEVELS: usize = 3;

/// One parameter of the parametric study.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    /// Unique name, used as the column key in snapshot tables.
    pub name: String,
    /// Lower bound (inclusive).
    pub min: f64,
    /// Upper bound (inclusive).
    pub max: f64,
    /// Spacing of the range over the unit interval.
    #[cfg_attr(feature = "serde", serde(default))]
    pub scale: Scale,
    /// Number of levels in a full-factorial grid.
    #[cfg_attr(feature = "serde", serde(default = "default_levels"))]
    pub levels: usize,
    /// Whether the user varies this parameter explicitly.
    #[cfg_attr(feature = "serde", serde(default = "default_active"))]
    pub active: bool,
}

#[cfg(feature = "serde")]
fn default_levels() -> usize {
    DEFAULT_LEVELS
}

#[cfg(feature = "serde")]
fn default_active() -> bool {
    true
}

impl Parameter {
    /// Creates an active, linearly scaled parameter with three levels.
    #[must_use]
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            scale: Scale::Linear,
            levels: DEFAULT_LEVELS,
            active: true,
        }
    }

    /// Spreads the range logarithmically.
    #[must_use]
    pub fn log_scale(mut self) -> Self {
        self.scale = Scale::Log;
        self
    }

    /// Sets the spacing explicitly.
    #[must_use]
    pub fn scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the number of full-factorial levels.
    #[must_use]
    pub fn levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    /// Marks the parameter as inferred rather than user-varied.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Checks `min < max` and, for log scale, `min > 0`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBounds`] or [`Error::Domain`].
    pub fn validate(&self) -> Result<()> {
        scale::internal_bounds(self.min, self.max, self.scale)
            .map(|_| ())
            .map_err(|e| e.for_parameter(&self.name))
    }

    /// Maps a physical value into this parameter's unit space.
    ///
    /// # Errors
    ///
    /// See [`scale::to_unit`].
    pub fn to_unit(&self, value: f64) -> Result<f64> {
        scale::to_unit(value, self.min, self.max, self.scale).map_err(|e| e.for_parameter(&self.name))
    }

    /// Maps a unit coordinate to physical units, clamped to `[min, max]`.
    ///
    /// # Errors
    ///
    /// See [`scale::from_unit`].
    pub fn from_unit(&self, u: f64) -> Result<f64> {
        scale::from_unit(u, self.min, self.max, self.scale)
            .map(|v| v.clamp(self.min, self.max))
            .map_err(|e| e.for_parameter(&self.name))
    }

    /// Returns `true` if `value` lies in `[min, max]`.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Validates every parameter and checks that names are unique.
///
/// # Errors
///
/// Returns the first invalid parameter's error, or
/// [`Error::InvalidArgument`] for a duplicate name.
pub fn validate_schema(parameters: &[Parameter]) -> Result<()> {
    let mut seen = HashSet::with_capacity(parameters.len());
    for p in parameters {
        p.validate()?;
        if !seen.insert(p.name.as_str()) {
            return Err(Error::InvalidArgument(format!(
                "duplicate parameter name '{}'",
                p.name
            )));
        }
    }
    Ok(())
}

/// The parameters marked active, in schema order.
#[must_use]
pub fn active_parameters(parameters: &[Parameter]) -> Vec<&Parameter> {
    parameters.iter().filter(|p| p.active).collect()
}
