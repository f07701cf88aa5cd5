//! Halton low-discrepancy sequence.
//!
//! Dimension `j` is the van der Corput sequence in the `j`-th prime base.
//! Row `i` uses index `i + 1`, so the sequence never starts at the origin.

use crate::error::{Error, Result};

/// Prime bases, one per supported dimension.
pub const PRIMES: [u64; 15] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47];

/// Radical inverse of `index` in `base` (digit reversal).
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn radical_inverse(mut index: u64, base: u64) -> f64 {
    let b = base as f64;
    let mut x = 0.0;
    let mut denom = 1.0;
    while index > 0 {
        let rem = index % base;
        index /= base;
        denom *= b;
        x += rem as f64 / denom;
    }
    x
}

/// The first `n` points of the `d`-dimensional Halton sequence.
///
/// # Errors
///
/// Returns [`Error::UnsupportedDimension`] if `d` exceeds the prime table.
pub(crate) fn halton(n: usize, d: usize) -> Result<Vec<Vec<f64>>> {
    if d > PRIMES.len() {
        return Err(Error::UnsupportedDimension {
            dims: d,
            max: PRIMES.len(),
        });
    }
    Ok((1..=n as u64)
        .map(|index| {
            PRIMES[..d]
                .iter()
                .map(|&base| radical_inverse(index, base))
                .collect()
        })
        .collect())
}
