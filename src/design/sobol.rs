//! Scrambled Sobol points (Burley 2020) via `sobol_burley`.

use sobol_burley::sample;

use crate::error::{Error, Result};

/// Dimensions supported by `sobol_burley`.
pub const MAX_DIMENSIONS: usize = 256;

/// The first `n` points of a `d`-dimensional scrambled Sobol sequence.
///
/// # Errors
///
/// Returns [`Error::UnsupportedDimension`] above [`MAX_DIMENSIONS`] and
/// [`Error::InvalidArgument`] if `n` does not fit the 32-bit sequence index.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn sobol(n: usize, d: usize, seed: u64) -> Result<Vec<Vec<f64>>> {
    if d > MAX_DIMENSIONS {
        return Err(Error::UnsupportedDimension {
            dims: d,
            max: MAX_DIMENSIONS,
        });
    }
    let count = u32::try_from(n)
        .map_err(|_| Error::InvalidArgument(format!("{n} Sobol points exceed the index range")))?;
    // Fold the high half in so seeds differing only there still scramble
    // differently.
    let seed = (seed ^ (seed >> 32)) as u32;
    Ok((0..count)
        .map(|index| {
            (0..d as u32)
                .map(|dim| f64::from(sample(index, dim, seed)))
                .collect()
        })
        .collect())
}
