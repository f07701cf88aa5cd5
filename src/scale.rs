//! Mapping between a parameter's physical range and the unit interval.
//!
//! A [`Scale::Linear`] parameter maps `[min, max]` affinely onto `[0, 1]`;
//! a [`Scale::Log`] parameter does the same in log space, which requires a
//! strictly positive range.
//!
//! ```
//! use romsampler::scale::{Scale, from_unit, to_unit};
//!
//! let u = to_unit(10.0, 1.0, 100.0, Scale::Log).unwrap();
//! assert!((u - 0.5).abs() < 1e-12);
//! let v = from_unit(u, 1.0, 100.0, Scale::Log).unwrap();
//! assert!((v - 10.0).abs() < 1e-9);
//! ```

use crate::error::{Error, Result};

/// How a parameter's physical range is spread over the unit interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Scale {
    /// Evenly spaced in physical units.
    #[default]
    Linear,
    /// Evenly spaced in natural-log units. Requires `min > 0`.
    Log,
}

impl core::fmt::Display for Scale {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Log => write!(f, "log"),
        }
    }
}

/// Internal-space bounds: `(min, max)` or `(ln min, ln max)`.
pub(crate) fn internal_bounds(min: f64, max: f64, scale: Scale) -> Result<(f64, f64)> {
    if !(min.is_finite() && max.is_finite()) || min >= max {
        return Err(Error::InvalidBounds {
            name: String::new(),
            min,
            max,
        });
    }
    match scale {
        Scale::Linear => Ok((min, max)),
        Scale::Log => {
            if min <= 0.0 {
                return Err(Error::Domain {
                    name: String::new(),
                    reason: format!("log scale requires min > 0, got {min}"),
                });
            }
            Ok((min.ln(), max.ln()))
        }
    }
}

/// Map a physical value into unit space.
///
/// Values outside `[min, max]` map outside `[0, 1]`; nothing is clamped.
///
/// # Errors
///
/// Returns [`Error::InvalidBounds`] if `min >= max`, and [`Error::Domain`]
/// for a log scale with `min <= 0` or a non-positive `value`.
pub fn to_unit(value: f64, min: f64, max: f64, scale: Scale) -> Result<f64> {
    let (lo, hi) = internal_bounds(min, max, scale)?;
    let v = match scale {
        Scale::Linear => value,
        Scale::Log => {
            if value <= 0.0 {
                return Err(Error::Domain {
                    name: String::new(),
                    reason: format!("cannot take the log of {value}"),
                });
            }
            value.ln()
        }
    };
    Ok((v - lo) / (hi - lo))
}

/// Map a unit-space coordinate back to physical units.
///
/// # Errors
///
/// Same conditions on the bounds as [`to_unit`].
pub fn from_unit(u: f64, min: f64, max: f64, scale: Scale) -> Result<f64> {
    let (lo, hi) = internal_bounds(min, max, scale)?;
    let v = lo + u * (hi - lo);
    Ok(match scale {
        Scale::Linear => v,
        Scale::Log => v.exp(),
    })
}

/// Evenly spaced values over `[lo, hi]` with exact endpoints.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let last = n - 1;
            (0..n)
                .map(|i| {
                    if i == last {
                        hi
                    } else {
                        lo + (hi - lo) * (i as f64 / last as f64)
                    }
                })
                .collect()
        }
    }
}
