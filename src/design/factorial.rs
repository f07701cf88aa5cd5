//! Full-factorial grids.
//!
//! Each parameter contributes `levels` evenly spaced values (in log space for
//! log-scaled parameters) and the design is their Cartesian product. The row
//! count is the product of all level counts. A product that does not fit in
//! `usize` is an error; bounding it further is the caller's job.

use crate::error::{Error, Result};
use crate::parameter::Parameter;
use crate::scale::{Scale, linspace};

/// Evenly spaced physical values for one parameter, clamped to its range.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for zero levels, or the parameter's
/// validation error.
pub fn levels_for(parameter: &Parameter) -> Result<Vec<f64>> {
    parameter.validate()?;
    if parameter.levels == 0 {
        return Err(Error::InvalidArgument(format!(
            "parameter '{}' needs at least one level",
            parameter.name
        )));
    }
    let values = match parameter.scale {
        Scale::Linear => linspace(parameter.min, parameter.max, parameter.levels),
        Scale::Log => linspace(parameter.min.ln(), parameter.max.ln(), parameter.levels)
            .into_iter()
            .map(f64::exp)
            .collect(),
    };
    Ok(values
        .into_iter()
        .map(|v| v.clamp(parameter.min, parameter.max))
        .collect())
}

fn checked_product(counts: impl IntoIterator<Item = usize>) -> Result<usize> {
    counts
        .into_iter()
        .try_fold(1usize, usize::checked_mul)
        .ok_or_else(|| Error::InvalidArgument("full-factorial grid size overflows usize".into()))
}

/// Number of rows the full-factorial design over `parameters` would have.
///
/// Checked before any grid is built.
pub(crate) fn row_count(parameters: &[Parameter]) -> Result<usize> {
    checked_product(parameters.iter().map(|p| p.levels))
}

/// Cartesian product of per-parameter grids, first parameter slowest.
pub(crate) fn cartesian_product(grids: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    if grids.is_empty() || grids.iter().any(Vec::is_empty) {
        return Ok(Vec::new());
    }
    let total = checked_product(grids.iter().map(Vec::len))?;
    let mut rows = Vec::with_capacity(total);
    let mut counters = vec![0usize; grids.len()];

    for _ in 0..total {
        rows.push(
            counters
                .iter()
                .zip(grids)
                .map(|(&c, grid)| grid[c])
                .collect(),
        );
        // Odometer increment, last dimension fastest.
        for k in (0..grids.len()).rev() {
            counters[k] += 1;
            if counters[k] < grids[k].len() {
                break;
            }
            counters[k] = 0;
        }
    }
    Ok(rows)
}
