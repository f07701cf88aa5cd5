//! Initial design-of-experiments generation.
//!
//! [`DesignGenerator`] turns a parameter schema into a table of sample points
//! in physical units using one of the [`DesignStrategy`] variants:
//!
//! | Strategy | Construction | Deterministic | Row count |
//! |----------|--------------|---------------|-----------|
//! | [`LatinHypercube`](DesignStrategy::LatinHypercube) | Stratified random + maximin restarts | with a seed | `n` |
//! | [`Halton`](DesignStrategy::Halton) | Prime-base digit reversal, up to 15 dimensions | always | `n` |
//! | [`FullFactorial`](DesignStrategy::FullFactorial) | Cartesian product of per-parameter levels | always | Π levels |
//! | `Sobol` (feature `sobol`) | Burley-scrambled Sobol | with a seed | `n` |
//!
//! Every strategy works in unit space first and maps each column through its
//! parameter's own scale, clamping to `[min, max]`.
//!
//! # Example
//!
//! ```
//! use romsampler::design::{DesignGenerator, DesignStrategy};
//! use romsampler::parameter::Parameter;
//!
//! let params = vec![
//!     Parameter::new("x", 0.0, 10.0),
//!     Parameter::new("y", 1.0, 100.0).log_scale(),
//! ];
//! let design = DesignGenerator::builder()
//!     .strategy(DesignStrategy::LatinHypercube)
//!     .restarts(20)
//!     .seed(42)
//!     .build()
//!     .generate(&params, 8)
//!     .unwrap();
//! assert_eq!(design.len(), 8);
//! ```

mod factorial;
mod halton;
mod lhs;
#[cfg(feature = "sobol")]
mod sobol;

use std::io::Write;

pub use factorial::levels_for;
pub use halton::{PRIMES as HALTON_PRIMES, radical_inverse};
pub use lhs::{DEFAULT_RESTARTS, min_pairwise_distance};
#[cfg(feature = "sobol")]
pub use sobol::MAX_DIMENSIONS as SOBOL_MAX_DIMENSIONS;

use crate::error::{Error, Result};
use crate::metric::csv_escape;
use crate::parameter::{Parameter, validate_schema};
use crate::rng_util;
use crate::snapshot::{ParamValues, SnapshotTable, case_name};

/// How sample points are laid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DesignStrategy {
    /// Latin Hypercube with maximin restarts.
    #[default]
    LatinHypercube,
    /// Halton low-discrepancy sequence.
    Halton,
    /// Cartesian product of each parameter's levels.
    FullFactorial,
    /// Burley-scrambled Sobol sequence.
    #[cfg(feature = "sobol")]
    Sobol,
}

impl core::fmt::Display for DesignStrategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::LatinHypercube => "latin-hypercube",
            Self::Halton => "halton",
            Self::FullFactorial => "full-factorial",
            #[cfg(feature = "sobol")]
            Self::Sobol => "sobol",
        };
        f.write_str(name)
    }
}

/// Generates space-filling designs over a parameter schema.
#[derive(Clone, Debug)]
pub struct DesignGenerator {
    strategy: DesignStrategy,
    restarts: usize,
    seed: Option<u64>,
}

impl DesignGenerator {
    /// Creates a generator for the given strategy with default settings.
    #[must_use]
    pub fn new(strategy: DesignStrategy) -> Self {
        Self {
            strategy,
            restarts: DEFAULT_RESTARTS,
            seed: None,
        }
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> DesignGeneratorBuilder {
        DesignGeneratorBuilder::default()
    }

    /// The configured strategy.
    #[must_use]
    pub fn strategy(&self) -> DesignStrategy {
        self.strategy
    }

    /// Generates a design of `n` points.
    ///
    /// Full-factorial designs still require `n >= 1` but otherwise ignore it;
    /// their size is the product of the parameters' level counts.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `n < 1`, the schema is empty, a name
    ///   repeats, or a full-factorial parameter has zero levels.
    /// - [`Error::InvalidBounds`] / [`Error::Domain`] for a bad parameter.
    /// - [`Error::UnsupportedDimension`] for Halton beyond 15 dimensions.
    pub fn generate(&self, parameters: &[Parameter], n: usize) -> Result<Design> {
        let d = parameters.len();
        if d < 1 {
            return Err(Error::InvalidArgument(
                "a design needs at least one parameter".into(),
            ));
        }
        if n < 1 {
            return Err(Error::InvalidArgument(
                "a design needs at least one sample".into(),
            ));
        }
        validate_schema(parameters)?;

        let design = match self.strategy {
            DesignStrategy::LatinHypercube => {
                let mut rng = rng_util::seeded(self.seed);
                let (unit, _) = lhs::maximin_lhs(n, d, self.restarts, &mut rng);
                Design::from_unit(self.strategy, parameters, unit)?
            }
            DesignStrategy::Halton => {
                Design::from_unit(self.strategy, parameters, halton::halton(n, d)?)?
            }
            DesignStrategy::FullFactorial => {
                factorial::row_count(parameters)?;
                let grids = parameters
                    .iter()
                    .map(levels_for)
                    .collect::<Result<Vec<_>>>()?;
                Design::from_physical(self.strategy, parameters, factorial::cartesian_product(&grids)?)?
            }
            #[cfg(feature = "sobol")]
            DesignStrategy::Sobol => {
                let unit = sobol::sobol(n, d, self.seed.unwrap_or(0))?;
                Design::from_unit(self.strategy, parameters, unit)?
            }
        };

        trace_info!(strategy = %self.strategy, rows = design.len(), dims = d, "design generated");
        Ok(design)
    }
}

impl Default for DesignGenerator {
    fn default() -> Self {
        Self::new(DesignStrategy::default())
    }
}

/// Builder for [`DesignGenerator`].
///
/// Defaults: Latin Hypercube, 50 restarts, random seed.
#[derive(Clone, Debug, Default)]
pub struct DesignGeneratorBuilder {
    strategy: Option<DesignStrategy>,
    restarts: Option<usize>,
    seed: Option<u64>,
}

impl DesignGeneratorBuilder {
    /// Sets the strategy.
    #[must_use]
    pub fn strategy(mut self, strategy: DesignStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Sets the number of maximin restarts for Latin Hypercube designs.
    ///
    /// Values below one are treated as one.
    #[must_use]
    pub fn restarts(mut self, restarts: usize) -> Self {
        self.restarts = Some(restarts);
        self
    }

    /// Sets the RNG seed (Latin Hypercube) or scramble seed (Sobol).
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the generator.
    #[must_use]
    pub fn build(self) -> DesignGenerator {
        DesignGenerator {
            strategy: self.strategy.unwrap_or_default(),
            restarts: self.restarts.unwrap_or(DEFAULT_RESTARTS).max(1),
            seed: self.seed,
        }
    }
}

/// A generated design: one row per sample, one column per parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Design {
    strategy: DesignStrategy,
    parameter_names: Vec<String>,
    unit: Vec<Vec<f64>>,
    rows: Vec<Vec<f64>>,
}

impl Design {
    fn from_unit(
        strategy: DesignStrategy,
        parameters: &[Parameter],
        unit: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let rows = unit
            .iter()
            .map(|u| {
                u.iter()
                    .zip(parameters)
                    .map(|(&ui, p)| p.from_unit(ui))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            strategy,
            parameter_names: parameters.iter().map(|p| p.name.clone()).collect(),
            unit,
            rows,
        })
    }

    fn from_physical(
        strategy: DesignStrategy,
        parameters: &[Parameter],
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let unit = rows
            .iter()
            .map(|r| {
                r.iter()
                    .zip(parameters)
                    .map(|(&v, p)| p.to_unit(v))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            strategy,
            parameter_names: parameters.iter().map(|p| p.name.clone()).collect(),
            unit,
            rows,
        })
    }

    /// The strategy that produced this design.
    #[must_use]
    pub fn strategy(&self) -> DesignStrategy {
        self.strategy
    }

    /// Column names, in schema order.
    #[must_use]
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Number of sample points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the design has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sample points in physical units.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Sample points in unit space, before scaling.
    #[must_use]
    pub fn unit_rows(&self) -> &[Vec<f64>] {
        &self.unit
    }

    /// Values of one column in physical units.
    #[must_use]
    pub fn column(&self, parameter: &str) -> Option<Vec<f64>> {
        let j = self.parameter_names.iter().position(|n| n == parameter)?;
        Some(self.rows.iter().map(|r| r[j]).collect())
    }

    /// One sample point as a name → value map.
    #[must_use]
    pub fn point(&self, index: usize) -> Option<ParamValues> {
        self.rows.get(index).map(|row| {
            self.parameter_names
                .iter()
                .cloned()
                .zip(row.iter().copied())
                .collect()
        })
    }

    /// Minimum pairwise distance between points in unit space.
    #[must_use]
    pub fn min_unit_distance(&self) -> f64 {
        min_pairwise_distance(&self.unit)
    }

    /// Names the rows `case_NNNN` from `start_index` and collects them into
    /// a snapshot table.
    ///
    /// # Errors
    ///
    /// Propagates [`SnapshotTable::push`] errors.
    pub fn into_snapshot_table(self, start_index: u64) -> Result<SnapshotTable> {
        let mut table = SnapshotTable::new(self.parameter_names.iter().cloned());
        for (offset, row) in (0u64..).zip(&self.rows) {
            let values = self
                .parameter_names
                .iter()
                .cloned()
                .zip(row.iter().copied())
                .collect();
            table.push(case_name(start_index + offset), values)?;
        }
        Ok(table)
    }

    /// Writes the physical table as CSV with a header row.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn to_csv(&self, mut writer: impl Write) -> std::io::Result<()> {
        let header: Vec<String> = self.parameter_names.iter().map(|n| csv_escape(n)).collect();
        writeln!(writer, "{}", header.join(","))?;
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(writer, "{}", cells.join(","))?;
        }
        Ok(())
    }
}
