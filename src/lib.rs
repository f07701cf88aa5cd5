#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Parametric sampling and active-learning engine for reduced-order model
//! (ROM) refinement. It lays out an initial design of experiments over a
//! parameter schema, proposes where the next expensive simulation should
//! run, and infers the parameters a user does not vary from nearby
//! snapshots.
//!
//! # Getting Started
//!
//! Generate a space-filling initial campaign, then ask for the next point:
//!
//! ```
//! use romsampler::prelude::*;
//!
//! let params = vec![
//!     Parameter::new("inlet_velocity", 1.0, 10.0),
//!     Parameter::new("viscosity", 1e-6, 1e-3).log_scale(),
//! ];
//!
//! let design = DesignGenerator::builder()
//!     .strategy(DesignStrategy::LatinHypercube)
//!     .seed(42)
//!     .build()
//!     .generate(&params, 12)
//!     .unwrap();
//! let table = design.into_snapshot_table(0).unwrap();
//!
//! let next = AcquisitionSelector::with_seed(7)
//!     .select_next(&table, &params)
//!     .unwrap();
//! assert!(params[0].contains(next["inlet_velocity"]));
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Parameter`](parameter::Parameter) | Named range with a linear or log [`Scale`](scale::Scale), factorial levels and an active flag. |
//! | [`SnapshotTable`](snapshot::SnapshotTable) | Caller-owned, append-only table of case name → parameter values. |
//! | [`DesignGenerator`](design::DesignGenerator) | Latin Hypercube (maximin), Halton, full factorial and Sobol designs. |
//! | [`AcquisitionSelector`](acquisition::AcquisitionSelector) | Simplified Gaussian process; picks the candidate with maximum posterior variance. |
//! | [`LocalSurrogateRegressor`](regression::LocalSurrogateRegressor) | Nearest-neighbour regression with a PCA fallback for inactive parameters. |
//! | [`EnhancementLoop`](enhance::EnhancementLoop) | Async select → infer → run → evaluate → rebuild loop over a [`CaseExecutor`](enhance::CaseExecutor). |
//! | [`EvalReport`](metric::EvalReport) | ROM-versus-CFD metric comparisons with CSV export. |
//! | [`SnapshotStore`](storage::SnapshotStore) | Persistence for appended snapshots. |
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `async` | `offload` helpers that run generators on tokio's blocking pool | off |
//! | `serde` | `Serialize`/`Deserialize` on schemas, metrics, designs and results | off |
//! | `journal` | `JournalSnapshotStore`: JSONL persistence with file locking (enables `serde`) | off |
//! | `sobol` | Scrambled Sobol design strategy | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at each loop step | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

pub mod acquisition;
pub mod design;
pub mod enhance;
mod error;
mod linalg;
pub mod metric;
#[cfg(feature = "async")]
pub mod offload;
pub mod parameter;
pub mod regression;
mod rng_util;
pub mod scale;
pub mod snapshot;
pub mod storage;

pub use acquisition::AcquisitionSelector;
pub use design::{Design, DesignGenerator, DesignStrategy};
pub use enhance::{CancelToken, CaseExecutor, EnhancementLoop, EnhancementReport, LoopState};
pub use error::{Error, Result};
pub use metric::{EvalReport, EvalResult, Fidelity, Metric, MetricKind};
pub use parameter::Parameter;
pub use regression::LocalSurrogateRegressor;
pub use scale::Scale;
pub use snapshot::{ParamValues, SnapshotTable};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use romsampler::prelude::*;
/// ```
pub mod prelude {
    pub use crate::acquisition::AcquisitionSelector;
    pub use crate::design::{Design, DesignGenerator, DesignStrategy};
    pub use crate::enhance::{
        CancelToken, CaseExecutor, EnhancementLoop, EnhancementReport, LoopState,
    };
    pub use crate::error::{Error, Result};
    pub use crate::metric::{
        DirectionMethod, EvalReport, EvalResult, Fidelity, ForceCoefficient, Metric, MetricKind,
    };
    pub use crate::parameter::Parameter;
    pub use crate::regression::LocalSurrogateRegressor;
    pub use crate::scale::Scale;
    pub use crate::snapshot::{ParamValues, SnapshotTable};
    #[cfg(feature = "journal")]
    pub use crate::storage::JournalSnapshotStore;
    pub use crate::storage::{MemorySnapshotStore, SnapshotStore};
}
