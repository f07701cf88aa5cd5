//! Run the CPU-bound generators on tokio's blocking pool.
//!
//! Design generation, GP selection and snapshot persistence are synchronous
//! and can take a noticeable amount of time for many restarts, large
//! candidate pools or long journals. These helpers move the work to
//! [`spawn_blocking`](tokio::task::spawn_blocking) so an async caller keeps
//! its executor thread free.
//!
//! ```
//! use romsampler::design::{DesignGenerator, DesignStrategy};
//! use romsampler::offload;
//! use romsampler::parameter::Parameter;
//!
//! # tokio::runtime::Builder::new_multi_thread().build().unwrap().block_on(async {
//! let generator = DesignGenerator::builder()
//!     .strategy(DesignStrategy::Halton)
//!     .build();
//! let params = vec![Parameter::new("x", 0.0, 1.0)];
//! let design = offload::generate_design(generator, params, 16).await.unwrap();
//! assert_eq!(design.len(), 16);
//! # });
//! ```

use std::sync::Arc;

use crate::acquisition::AcquisitionSelector;
use crate::design::{Design, DesignGenerator};
use crate::error::{Error, Result};
use crate::parameter::Parameter;
use crate::snapshot::{ParamValues, SnapshotTable};
use crate::storage::SnapshotStore;

/// [`DesignGenerator::generate`] on a blocking thread.
///
/// # Errors
///
/// Returns the generator's error, or [`Error::TaskError`] if the blocking
/// task panicked or was cancelled.
pub async fn generate_design(
    generator: DesignGenerator,
    parameters: Vec<Parameter>,
    n: usize,
) -> Result<Design> {
    tokio::task::spawn_blocking(move || generator.generate(&parameters, n))
        .await
        .map_err(|e| Error::TaskError(e.to_string()))?
}

/// [`AcquisitionSelector::select_next`] on a blocking thread.
///
/// The table is cloned into the task.
///
/// # Errors
///
/// Returns the selector's error, or [`Error::TaskError`] if the blocking
/// task panicked or was cancelled.
pub async fn select_next(
    selector: AcquisitionSelector,
    table: &SnapshotTable,
    parameters: Vec<Parameter>,
) -> Result<ParamValues> {
    let table = table.clone();
    tokio::task::spawn_blocking(move || selector.select_next(&table, &parameters))
        .await
        .map_err(|e| Error::TaskError(e.to_string()))?
}

/// [`SnapshotStore::persist_snapshot`] on a blocking thread.
///
/// [`EnhancementLoop`](crate::enhance::EnhancementLoop) persists through this
/// helper when the `async` feature is enabled.
///
/// # Errors
///
/// Returns the store's error, or [`Error::TaskError`] if the blocking task
/// panicked or was cancelled.
pub async fn persist_snapshot(
    store: Arc<dyn SnapshotStore>,
    case: String,
    params: ParamValues,
) -> Result<()> {
    tokio::task::spawn_blocking(move || store.persist_snapshot(&case, &params))
        .await
        .map_err(|e| Error::TaskError(e.to_string()))?
}
