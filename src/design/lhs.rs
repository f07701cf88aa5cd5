//! Latin Hypercube sampling with maximin restarts.
//!
//! Each restart builds a stratified-random matrix: column `j` is an
//! independent permutation of `0..n`, jittered by `U(0, 1)` and divided by
//! `n`, so every dimension has exactly one sample in each of the `n`
//! equal-width strata of `[0, 1]`. The matrix with the largest minimum
//! pairwise distance wins.

use crate::rng_util;

/// Default number of maximin restarts.
pub const DEFAULT_RESTARTS: usize = 50;

/// One stratified-random `n × d` matrix in `[0, 1)`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn latin_matrix(n: usize, d: usize, rng: &mut fastrand::Rng) -> Vec<Vec<f64>> {
    let mut x = vec![vec![0.0; d]; n];
    for j in 0..d {
        let perm = rng_util::permutation(rng, n);
        for (i, &stratum) in perm.iter().enumerate() {
            x[i][j] = (stratum as f64 + rng.f64()) / n as f64;
        }
    }
    x
}

/// Minimum Euclidean distance over all pairs of rows.
///
/// Returns `f64::INFINITY` for fewer than two rows.
#[must_use]
pub fn min_pairwise_distance(points: &[Vec<f64>]) -> f64 {
    let mut best_sq = f64::INFINITY;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            let d_sq: f64 = a.iter().zip(b).map(|(p, q)| (p - q) * (p - q)).sum();
            if d_sq < best_sq {
                best_sq = d_sq;
            }
        }
    }
    best_sq.sqrt()
}

/// Best of `restarts` Latin matrices by the maximin criterion.
///
/// Returns the winning matrix and its score. The first matrix wins ties, so
/// with a fixed seed the result is never worse than a single draw.
pub(crate) fn maximin_lhs(
    n: usize,
    d: usize,
    restarts: usize,
    rng: &mut fastrand::Rng,
) -> (Vec<Vec<f64>>, f64) {
    let mut best = latin_matrix(n, d, rng);
    let mut best_score = min_pairwise_distance(&best);

    for _ in 1..restarts.max(1) {
        let candidate = latin_matrix(n, d, rng);
        let score = min_pairwise_distance(&candidate);
        if score > best_score {
            best = candidate;
            best_score = score;
        }
    }

    trace_debug!(n, d, restarts, score = best_score, "maximin LHS selected");
    (best, best_score)
}
