//! Local regression for parameters the user does not vary.
//!
//! Given values for the *active* parameters, [`LocalSurrogateRegressor`]
//! estimates every remaining parameter from the snapshots nearest to the
//! query:
//!
//! 1. Active columns and the query are standardized with the table's column
//!    mean and population standard deviation (zero deviation becomes one).
//! 2. The `k = min(max(2·max(d, 1), min_neighbors), n)` nearest rows are
//!    selected by Euclidean distance in that space. With no active
//!    parameter the first `k` rows are used.
//! 3. Each inactive parameter is regressed on the neighbours' standardized
//!    coordinates with an intercept. A rank-deficient design falls back to
//!    regression on the leading principal components of the centred
//!    neighbour coordinates.
//! 4. Predictions are clamped to the range observed in the whole table.
//!
//! # Example
//!
//! ```
//! use romsampler::regression::LocalSurrogateRegressor;
//! use romsampler::snapshot::{ParamValues, SnapshotTable};
//!
//! let mut table = SnapshotTable::new(["speed", "angle"]);
//! for (i, s) in [10.0, 20.0, 30.0].iter().enumerate() {
//!     let row = ParamValues::from([("speed".into(), *s), ("angle".into(), s / 10.0)]);
//!     table.push(format!("case_{i:04}"), row).unwrap();
//! }
//!
//! let query = ParamValues::from([("speed".into(), 25.0)]);
//! let inferred = LocalSurrogateRegressor::new().infer(&table, &query).unwrap();
//! assert!((inferred["angle"] - 2.5).abs() < 1e-9);
//! ```

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};
use crate::linalg;
use crate::snapshot::{ParamValues, SnapshotTable};

/// Default lower bound on the neighbourhood size.
pub const DEFAULT_MIN_NEIGHBORS: usize = 8;

/// Minimum number of snapshots required to infer anything.
const MIN_TRAIN: usize = 2;

/// Nearest-neighbour linear regressor with a PCA fallback.
#[derive(Clone, Debug)]
pub struct LocalSurrogateRegressor {
    min_neighbors: usize,
}

impl LocalSurrogateRegressor {
    /// Creates a regressor with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
        }
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> LocalSurrogateRegressorBuilder {
        LocalSurrogateRegressorBuilder::default()
    }

    /// Neighbourhood size for `d` active dimensions and `n` rows.
    #[must_use]
    pub fn neighborhood_size(&self, d: usize, n: usize) -> usize {
        (2 * d.max(1)).max(self.min_neighbors).min(n)
    }

    /// Infers every parameter of `table` not named in `active`.
    ///
    /// The key set of `active` is the active mask; its values are the query.
    ///
    /// # Errors
    ///
    /// - [`Error::InsufficientData`] if the table has fewer than two rows.
    /// - [`Error::UnknownParameter`] if `active` names a parameter the table
    ///   does not declare.
    /// - [`Error::Numerical`] if a least-squares solve fails.
    pub fn infer(&self, table: &SnapshotTable, active: &ParamValues) -> Result<ParamValues> {
        let n = table.len();
        if n < MIN_TRAIN {
            return Err(Error::InsufficientData {
                required: MIN_TRAIN,
                got: n,
            });
        }

        let mut active_cols = Vec::with_capacity(active.len());
        let mut query = Vec::with_capacity(active.len());
        for (name, &value) in active {
            let j = table
                .column_index(name)
                .ok_or_else(|| Error::UnknownParameter(name.clone()))?;
            active_cols.push(j);
            query.push(value);
        }
        let inactive_cols: Vec<usize> = (0..table.parameter_names().len())
            .filter(|j| !active_cols.contains(j))
            .collect();
        if inactive_cols.is_empty() {
            return Ok(ParamValues::new());
        }

        let d = active_cols.len();
        let k = self.neighborhood_size(d, n);
        let rows = table.rows();

        let x: Vec<Vec<f64>> = rows
            .iter()
            .map(|r| active_cols.iter().map(|&j| r.values[j]).collect())
            .collect();
        let (means, stds) = linalg::column_stats(&x, d);
        let standardize = |row: &[f64]| -> Vec<f64> {
            row.iter()
                .zip(means.iter().zip(&stds))
                .map(|(v, (m, s))| (v - m) / s)
                .collect()
        };
        let z: Vec<Vec<f64>> = x.iter().map(|r| standardize(r)).collect();
        let zq = standardize(&query);

        let neighbors = nearest(&z, &zq, k, d);
        let fit = LocalFit::new(&z, &zq, &neighbors, d)?;

        let mut out = ParamValues::new();
        for &c in &inactive_cols {
            let name = &table.parameter_names()[c];
            let y: Vec<f64> = neighbors.iter().map(|&i| rows[i].values[c]).collect();
            let raw = fit.predict(&y)?;
            let (lo, hi) = table.observed_range(name)?.unwrap_or((raw, raw));
            out.insert(name.clone(), raw.clamp(lo, hi));
        }
        Ok(out)
    }

    /// Active values merged with the inferred inactive ones.
    ///
    /// # Errors
    ///
    /// See [`infer`](Self::infer).
    pub fn complete(&self, table: &SnapshotTable, active: &ParamValues) -> Result<ParamValues> {
        let mut full = self.infer(table, active)?;
        full.extend(active.iter().map(|(k, v)| (k.clone(), *v)));
        Ok(full)
    }
}

impl Default for LocalSurrogateRegressor {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`LocalSurrogateRegressor`].
#[derive(Clone, Debug, Default)]
pub struct LocalSurrogateRegressorBuilder {
    min_neighbors: Option<usize>,
}

impl LocalSurrogateRegressorBuilder {
    /// Sets the lower bound on the neighbourhood size.
    ///
    /// Default: 8.
    #[must_use]
    pub fn min_neighbors(mut self, k: usize) -> Self {
        self.min_neighbors = Some(k);
        self
    }

    /// Builds the regressor.
    #[must_use]
    pub fn build(self) -> LocalSurrogateRegressor {
        LocalSurrogateRegressor {
            min_neighbors: self.min_neighbors.unwrap_or(DEFAULT_MIN_NEIGHBORS),
        }
    }
}

/// Indices of the `k` rows nearest to `query`; ties keep table order.
fn nearest(z: &[Vec<f64>], query: &[f64], k: usize, d: usize) -> Vec<usize> {
    if d == 0 {
        return (0..k).collect();
    }
    let mut ranked: Vec<(usize, f64)> = z
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let dist_sq: f64 = row.iter().zip(query).map(|(a, b)| (a - b).powi(2)).sum();
            (i, dist_sq)
        })
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.into_iter().take(k).map(|(i, _)| i).collect()
}

/// A regression model shared by all inactive targets of one query.
enum LocalFit {
    /// No active dimension: the neighbour mean.
    Mean,
    /// Linear model on `design`, evaluated at `query_row`.
    Linear {
        design: DMatrix<f64>,
        query_row: DVector<f64>,
    },
}

impl LocalFit {
    fn new(z: &[Vec<f64>], zq: &[f64], neighbors: &[usize], d: usize) -> Result<Self> {
        if d == 0 {
            return Ok(Self::Mean);
        }
        let k = neighbors.len();

        let design = DMatrix::from_fn(k, d + 1, |i, j| {
            if j == 0 { 1.0 } else { z[neighbors[i]][j - 1] }
        });
        let rank = linalg::numerical_rank(&design.clone().svd(false, false), k, d + 1);
        if rank == d + 1 {
            let query_row = DVector::from_fn(d + 1, |j, _| if j == 0 { 1.0 } else { zq[j - 1] });
            return Ok(Self::Linear { design, query_row });
        }

        trace_debug!(k, d, rank, "rank-deficient neighbourhood, using PCA regression");

        // Centre the neighbour coordinates and project onto the leading axes.
        #[allow(clippy::cast_precision_loss)]
        let centre: Vec<f64> = (0..d)
            .map(|j| neighbors.iter().map(|&i| z[i][j]).sum::<f64>() / k as f64)
            .collect();
        let centred = DMatrix::from_fn(k, d, |i, j| z[neighbors[i]][j] - centre[j]);
        let (axes, centred_rank) = linalg::principal_axes(&centred)?;
        let r = centred_rank.min(k.saturating_sub(1)).min(d).max(1).min(axes.len());
        if r == 0 {
            return Ok(Self::Mean);
        }

        let scores = DMatrix::from_fn(k, r, |i, c| centred.row(i).transpose().dot(&axes[c]));
        let design = DMatrix::from_fn(k, r + 1, |i, j| if j == 0 { 1.0 } else { scores[(i, j - 1)] });
        let query_centred = DVector::from_fn(d, |j, _| zq[j] - centre[j]);
        let query_row = DVector::from_fn(r + 1, |j, _| {
            if j == 0 { 1.0 } else { query_centred.dot(&axes[j - 1]) }
        });
        Ok(Self::Linear { design, query_row })
    }

    #[allow(clippy::cast_precision_loss)]
    fn predict(&self, y: &[f64]) -> Result<f64> {
        match self {
            Self::Mean => Ok(y.iter().sum::<f64>() / y.len().max(1) as f64),
            Self::Linear { design, query_row } => {
                let beta = linalg::least_squares(design.clone(), &DVector::from_column_slice(y))?;
                Ok(beta.dot(query_row))
            }
        }
    }
}
