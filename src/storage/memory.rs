use parking_lot::RwLock;

use super::SnapshotStore;
use crate::error::Result;
use crate::snapshot::{ParamValues, SnapshotTable};

/// In-memory snapshot store.
///
/// A thin wrapper around `RwLock<SnapshotTable>`.
#[derive(Debug)]
pub struct MemorySnapshotStore {
    table: RwLock<SnapshotTable>,
}

impl MemorySnapshotStore {
    /// Creates an empty store declaring the given parameter columns.
    #[must_use]
    pub fn new<I, S>(parameter_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_table(SnapshotTable::new(parameter_names))
    }

    /// Creates a store pre-populated with `table`.
    #[must_use]
    pub fn with_table(table: SnapshotTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    /// Number of stored cases.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Returns `true` if nothing was stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn persist_snapshot(&self, case: &str, params: &ParamValues) -> Result<()> {
        self.table.write().push(case, params.clone())
    }

    fn load_snapshots(&self) -> Result<SnapshotTable> {
        Ok(self.table.read().clone())
    }
}
