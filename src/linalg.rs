//! Small dense linear-algebra helpers on top of `nalgebra`.

use nalgebra::{DMatrix, DVector, SVD};

use crate::error::{Error, Result};

/// Column means and population standard deviations.
///
/// A zero standard deviation is replaced by one so that constant columns
/// standardize to zero instead of dividing by zero.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn column_stats(rows: &[Vec<f64>], d: usize) -> (Vec<f64>, Vec<f64>) {
    let n = rows.len().max(1) as f64;
    let mut means = vec![0.0; d];
    for row in rows {
        for (m, v) in means.iter_mut().zip(row) {
            *m += v;
        }
    }
    for m in &mut means {
        *m /= n;
    }
    let mut stds = vec![0.0; d];
    for row in rows {
        for j in 0..d {
            stds[j] += (row[j] - means[j]).powi(2);
        }
    }
    for s in &mut stds {
        *s = (*s / n).sqrt();
        if *s <= 0.0 || !s.is_finite() {
            *s = 1.0;
        }
    }
    (means, stds)
}

/// Threshold below which a singular value counts as zero.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn rank_tolerance(singular_values: &DVector<f64>, rows: usize, cols: usize) -> f64 {
    let s_max = singular_values.iter().copied().fold(0.0, f64::max);
    s_max * rows.max(cols) as f64 * f64::EPSILON
}

/// Number of singular values above the rank tolerance.
pub(crate) fn numerical_rank(svd: &SVD<f64, nalgebra::Dyn, nalgebra::Dyn>, rows: usize, cols: usize) -> usize {
    let tol = rank_tolerance(&svd.singular_values, rows, cols);
    svd.singular_values.iter().filter(|&&s| s > tol).count()
}

/// Minimum-norm least-squares solution of `a x = b`.
pub(crate) fn least_squares(a: DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>> {
    let (rows, cols) = a.shape();
    let svd = a.svd(true, true);
    let tol = rank_tolerance(&svd.singular_values, rows, cols);
    svd.solve(b, tol)
        .map_err(|_| Error::Numerical("least-squares solve failed"))
}

/// Right singular vectors of `a`, ordered by decreasing singular value,
/// together with the numerical rank.
pub(crate) fn principal_axes(a: &DMatrix<f64>) -> Result<(Vec<DVector<f64>>, usize)> {
    let (rows, cols) = a.shape();
    let svd = a.clone().svd(false, true);
    let rank = numerical_rank(&svd, rows, cols);
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or(Error::Numerical("SVD did not produce right singular vectors"))?;

    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&i, &j| svd.singular_values[j].total_cmp(&svd.singular_values[i]));

    let axes = order
        .into_iter()
        .map(|i| v_t.row(i).transpose())
        .collect();
    Ok((axes, rank))
}

/// Moore–Penrose pseudo-inverse.
pub(crate) fn pseudo_inverse(a: DMatrix<f64>) -> Result<DMatrix<f64>> {
    let (rows, cols) = a.shape();
    let tol = {
        let s = a.clone().singular_values();
        rank_tolerance(&s, rows, cols)
    };
    a.pseudo_inverse(tol)
        .map_err(|_| Error::Numerical("pseudo-inverse failed"))
}
