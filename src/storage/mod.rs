//! Snapshot persistence backends.
//!
//! The [`SnapshotStore`] trait records every case the enhancement loop
//! appends, so a campaign can be resumed with the same snapshot table.
//!
//! # Available backends
//!
//! | Backend | Description | Feature flag |
//! |---------|-------------|-------------|
//! | [`MemorySnapshotStore`] | In-memory table behind a read-write lock | — |
//! | `JournalSnapshotStore` | JSONL file with `fs2` file locking | `journal` |
//!
//! ```
//! use romsampler::snapshot::ParamValues;
//! use romsampler::storage::{MemorySnapshotStore, SnapshotStore};
//!
//! let store = MemorySnapshotStore::new(["inlet_velocity"]);
//! store
//!     .persist_snapshot("case_0000", &ParamValues::from([("inlet_velocity".into(), 3.5)]))
//!     .unwrap();
//! assert_eq!(store.load_snapshots().unwrap().len(), 1);
//! ```

#[cfg(feature = "journal")]
mod journal;
mod memory;

#[cfg(feature = "journal")]
pub use journal::JournalSnapshotStore;
pub use memory::MemorySnapshotStore;

use crate::error::Result;
use crate::snapshot::{ParamValues, SnapshotTable};

/// Persists snapshot rows and reloads them as a table.
///
/// Implementations must be `Send + Sync` so a store can be shared with the
/// enhancement loop through an `Arc`. Both methods are blocking; async
/// callers can use `offload::persist_snapshot` (feature `async`).
pub trait SnapshotStore: Send + Sync {
    /// Record one case.
    ///
    /// # Errors
    ///
    /// Returns a table error for a duplicate case or mismatched parameter
    /// set, or a backend-specific error if the row cannot be written.
    fn persist_snapshot(&self, case: &str, params: &ParamValues) -> Result<()>;

    /// Every recorded case, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a backend-specific error if the rows cannot be read.
    fn load_snapshots(&self) -> Result<SnapshotTable>;
}
