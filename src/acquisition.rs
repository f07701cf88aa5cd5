//! Maximum-variance sample selection with a simplified Gaussian Process.
//!
//! [`AcquisitionSelector`] fits a zero-mean GP to the positions of the
//! existing snapshots in the active-parameter space and proposes the random
//! candidate whose posterior predictive variance is largest, i.e. the point
//! the current snapshot set says least about. There is no exploitation term
//! and no hyperparameter optimisation.
//!
//! # Model
//!
//! - Coordinates: each active parameter mapped to unit space through its own
//!   scale, so the configured range is `[0, 1]`.
//! - Length scale per dimension: configured range / `n`, which is `1 / n` in
//!   unit space. It depends only on the range and the number of snapshots,
//!   never on their spread, so a constant column is harmless.
//! - Kernel: `k(a, b) = σf² exp(-½ Σ ((a_j - b_j) / ℓ_j)²)` with `σf² = 1`.
//! - `K + σn² I` with `σn² = 1e-6`, factorised by Cholesky; if that fails
//!   the Moore–Penrose pseudo-inverse is used instead.
//! - Candidates: `min(max(n_candidates, 4·d²), 2048)` uniform points.
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `n_candidates` | 1000 | Requested candidate pool size |
//! | `noise_variance` | 1e-6 | Added to the kernel diagonal |
//! | `signal_variance` | 1.0 | Kernel amplitude `σf²` |
//! | `seed` | random | Reseeded on every call for reproducible selection |
//!
//! # Example
//!
//! ```
//! use romsampler::acquisition::AcquisitionSelector;
//! use romsampler::parameter::Parameter;
//! use romsampler::snapshot::{ParamValues, SnapshotTable};
//!
//! let params = vec![Parameter::new("x", 0.0, 10.0)];
//! let mut table = SnapshotTable::new(["x"]);
//! for (i, x) in [1.0, 2.0, 3.0].into_iter().enumerate() {
//!     table.push(format!("case_{i:04}"), ParamValues::from([("x".into(), x)])).unwrap();
//! }
//!
//! let selector = AcquisitionSelector::builder().seed(7).build();
//! let next = selector.select_next(&table, &params).unwrap();
//! // Far away from the three clustered snapshots.
//! assert!(next["x"] > 4.0);
//! ```

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};
use crate::linalg;
use crate::parameter::{Parameter, active_parameters, validate_schema};
use crate::rng_util;
use crate::snapshot::{ParamValues, SnapshotTable};

/// Default requested number of candidate points.
pub const DEFAULT_N_CANDIDATES: usize = 1000;
/// Default observation noise variance.
pub const DEFAULT_NOISE_VAR: f64 = 1e-6;
/// Default signal variance.
pub const DEFAULT_SIGNAL_VAR: f64 = 1.0;
/// Hard cap on the candidate pool.
pub const MAX_CANDIDATES: usize = 2048;

/// Minimum number of snapshots for a GP fit.
const MIN_TRAIN: usize = 2;

/// Chooses the next snapshot by maximum GP posterior variance.
#[derive(Clone, Debug)]
pub struct AcquisitionSelector {
    n_candidates: usize,
    noise_variance: f64,
    signal_variance: f64,
    seed: Option<u64>,
}

impl AcquisitionSelector {
    /// Creates a selector with a random seed.
    #[must_use]
    pub fn new() -> Self {
        AcquisitionSelectorBuilder::default().build()
    }

    /// Creates a selector with a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        AcquisitionSelectorBuilder::default().seed(seed).build()
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> AcquisitionSelectorBuilder {
        AcquisitionSelectorBuilder::default()
    }

    /// Candidate pool size for `d` active dimensions.
    #[must_use]
    pub fn pool_size(&self, d: usize) -> usize {
        self.n_candidates.max(4 * d * d).min(MAX_CANDIDATES)
    }

    /// Proposes values for every parameter in `parameters` marked active.
    ///
    /// # Errors
    ///
    /// See [`select_next_for`](Self::select_next_for).
    pub fn select_next(&self, table: &SnapshotTable, parameters: &[Parameter]) -> Result<ParamValues> {
        self.select_next_for(table, &active_parameters(parameters))
    }

    /// Proposes values for exactly the given active parameters.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `active` is empty.
    /// - [`Error::InsufficientData`] for fewer than two snapshots.
    /// - [`Error::UnknownParameter`] if the table lacks an active column.
    /// - [`Error::InvalidBounds`] / [`Error::Domain`] for a bad parameter or a
    ///   non-positive snapshot value under log scale.
    pub fn select_next_for(&self, table: &SnapshotTable, active: &[&Parameter]) -> Result<ParamValues> {
        let d = active.len();
        if d == 0 {
            return Err(Error::InvalidArgument(
                "acquisition needs at least one active parameter".into(),
            ));
        }
        let owned: Vec<Parameter> = active.iter().map(|&p| p.clone()).collect();
        validate_schema(&owned)?;

        let n = table.len();
        if n < MIN_TRAIN {
            return Err(Error::InsufficientData {
                required: MIN_TRAIN,
                got: n,
            });
        }

        let x_train = unit_training_data(table, active)?;
        #[allow(clippy::cast_precision_loss)]
        let lengthscales = vec![1.0 / n as f64; d];
        let model = GpModel::fit(x_train, lengthscales, self.signal_variance, self.noise_variance)?;

        let mut rng = rng_util::seeded(self.seed);
        let pool = self.pool_size(d);
        let mut best_var = f64::NEG_INFINITY;
        let mut best_x = vec![0.5; d];
        for _ in 0..pool {
            let x: Vec<f64> = (0..d).map(|_| rng_util::f64_range(&mut rng, 0.0, 1.0)).collect();
            let var = model.posterior_variance(&x);
            if var > best_var {
                best_var = var;
                best_x = x;
            }
        }

        trace_debug!(n, d, pool, variance = best_var, "acquisition candidate selected");

        active
            .iter()
            .zip(best_x)
            .map(|(p, u)| p.from_unit(u).map(|v| (p.name.clone(), v)))
            .collect()
    }
}

impl Default for AcquisitionSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`AcquisitionSelector`].
#[derive(Clone, Debug, Default)]
pub struct AcquisitionSelectorBuilder {
    n_candidates: Option<usize>,
    noise_variance: Option<f64>,
    signal_variance: Option<f64>,
    seed: Option<u64>,
}

impl AcquisitionSelectorBuilder {
    /// Sets the requested number of candidates.
    ///
    /// The pool is still raised to `4·d²` and capped at 2048.
    ///
    /// Default: 1000.
    #[must_use]
    pub fn n_candidates(mut self, n: usize) -> Self {
        self.n_candidates = Some(n);
        self
    }

    /// Sets the noise variance added to the kernel diagonal.
    ///
    /// Default: 1e-6.
    #[must_use]
    pub fn noise_variance(mut self, v: f64) -> Self {
        self.noise_variance = Some(v);
        self
    }

    /// Sets the kernel amplitude.
    ///
    /// Default: 1.0.
    #[must_use]
    pub fn signal_variance(mut self, v: f64) -> Self {
        self.signal_variance = Some(v);
        self
    }

    /// Sets the random seed. Every call to `select_next` restarts from it.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the selector.
    #[must_use]
    pub fn build(self) -> AcquisitionSelector {
        AcquisitionSelector {
            n_candidates: self.n_candidates.unwrap_or(DEFAULT_N_CANDIDATES),
            noise_variance: self.noise_variance.unwrap_or(DEFAULT_NOISE_VAR),
            signal_variance: self.signal_variance.unwrap_or(DEFAULT_SIGNAL_VAR),
            seed: self.seed,
        }
    }
}

// ---------------------------------------------------------------------------
// Squared-exponential kernel
// ---------------------------------------------------------------------------

/// `σf² exp(-½ Σ ((a_j - b_j) / ℓ_j)²)`
fn squared_exponential(a: &[f64], b: &[f64], lengthscales: &[f64], signal_var: f64) -> f64 {
    let mut r_sq = 0.0;
    for i in 0..a.len() {
        let diff = (a[i] - b[i]) / lengthscales[i];
        r_sq += diff * diff;
    }
    signal_var * (-0.5 * r_sq).exp()
}

/// Build the kernel matrix `K + σn²I`.
fn kernel_matrix(x: &[Vec<f64>], lengthscales: &[f64], signal_var: f64, noise_var: f64) -> DMatrix<f64> {
    let n = x.len();
    DMatrix::from_fn(n, n, |i, j| {
        let k = squared_exponential(&x[i], &x[j], lengthscales, signal_var);
        if i == j { k + noise_var } else { k }
    })
}

// ---------------------------------------------------------------------------
// GP fitting and prediction
// ---------------------------------------------------------------------------

/// How `(K + σn²I)^{-1}` is applied.
enum Inverse {
    Cholesky(nalgebra::linalg::Cholesky<f64, nalgebra::Dyn>),
    Pseudo(DMatrix<f64>),
}

/// A fitted GP over snapshot positions. Only the variance is needed.
struct GpModel {
    inverse: Inverse,
    x_train: Vec<Vec<f64>>,
    lengthscales: Vec<f64>,
    signal_var: f64,
}

impl GpModel {
    fn fit(x_train: Vec<Vec<f64>>, lengthscales: Vec<f64>, signal_var: f64, noise_var: f64) -> Result<Self> {
        let k = kernel_matrix(&x_train, &lengthscales, signal_var, noise_var);
        let inverse = match nalgebra::linalg::Cholesky::new(k.clone()) {
            Some(chol) => Inverse::Cholesky(chol),
            None => {
                trace_debug!(n = x_train.len(), "Cholesky failed, using pseudo-inverse");
                Inverse::Pseudo(linalg::pseudo_inverse(k)?)
            }
        };
        Ok(Self {
            inverse,
            x_train,
            lengthscales,
            signal_var,
        })
    }

    /// `σf² − k*ᵀ (K + σn²I)^{-1} k*`, floored at zero.
    fn posterior_variance(&self, x: &[f64]) -> f64 {
        let k_star = DVector::from_fn(self.x_train.len(), |i, _| {
            squared_exponential(x, &self.x_train[i], &self.lengthscales, self.signal_var)
        });
        let v = match &self.inverse {
            Inverse::Cholesky(chol) => chol.solve(&k_star),
            Inverse::Pseudo(pinv) => pinv * &k_star,
        };
        (self.signal_var - k_star.dot(&v)).max(0.0)
    }
}

/// Active columns of the table mapped into unit space.
fn unit_training_data(table: &SnapshotTable, active: &[&Parameter]) -> Result<Vec<Vec<f64>>> {
    let cols = active
        .iter()
        .map(|p| {
            table
                .column_index(&p.name)
                .ok_or_else(|| Error::UnknownParameter(p.name.clone()))
        })
        .collect::<Result<Vec<_>>>()?;
    table
        .rows()
        .iter()
        .map(|row| {
            cols.iter()
                .zip(active)
                .map(|(&j, p)| p.to_unit(row.values[j]))
                .collect::<Result<Vec<f64>>>()
        })
        .collect()
}
