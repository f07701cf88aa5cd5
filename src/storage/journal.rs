//! JSONL-based snapshot journal.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::SnapshotStore;
use crate::error::{Error, Result};
use crate::snapshot::{ParamValues, SnapshotTable};

/// One line of the journal. Values are string encoded so they round-trip
/// exactly through any JSON reader.
#[derive(Serialize, Deserialize)]
struct SnapshotRecord {
    case: String,
    parameters: BTreeMap<String, String>,
}

/// A store that appends each snapshot as a JSON line to a file.
///
/// A write holds an exclusive file lock while it replays the journal,
/// validates the new row and appends it, so several stores or processes may
/// share one journal without ever writing the same case twice. Reads take a
/// shared lock.
///
/// ```no_run
/// use romsampler::storage::{JournalSnapshotStore, SnapshotStore};
///
/// let store = JournalSnapshotStore::new("snapshots.jsonl", ["angle", "speed"]);
/// let table = store.load_snapshots().unwrap();
/// ```
pub struct JournalSnapshotStore {
    path: PathBuf,
    parameter_names: Vec<String>,
    /// Serialise in-process writes so we only hold the file lock briefly.
    write_lock: Mutex<()>,
}

impl JournalSnapshotStore {
    /// Creates a journal at `path` declaring the given parameter columns.
    ///
    /// The file is created on the first write.
    #[must_use]
    pub fn new<I, S>(path: impl AsRef<Path>, parameter_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.as_ref().to_path_buf(),
            parameter_names: parameter_names.into_iter().map(Into::into).collect(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the journal file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replay(&self, file: &File) -> Result<SnapshotTable> {
        let mut table = SnapshotTable::new(self.parameter_names.iter().cloned());
        for record in read_records(file)? {
            let mut values = ParamValues::new();
            for (name, raw) in record.parameters {
                let v: f64 = raw.parse().map_err(|_| {
                    Error::Storage(format!(
                        "case '{}': value '{raw}' of '{name}' is not a number",
                        record.case
                    ))
                })?;
                values.insert(name, v);
            }
            table.push(record.case, values)?;
        }
        Ok(table)
    }

    /// Validate and append one row. The caller holds the exclusive lock.
    fn append_locked(&self, mut file: &File, case: &str, params: &ParamValues) -> Result<()> {
        // Reject rows the table would refuse before anything reaches disk.
        let mut existing = self.replay(file)?;
        existing.push(case, params.clone())?;

        let record = SnapshotRecord {
            case: case.to_owned(),
            parameters: params
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
        };
        let line = serde_json::to_string(&record).map_err(storage_error)?;
        writeln!(file, "{line}").map_err(storage_error)?;
        file.flush().map_err(storage_error)
    }
}

impl SnapshotStore for JournalSnapshotStore {
    fn persist_snapshot(&self, case: &str, params: &ParamValues) -> Result<()> {
        let _guard = self.write_lock.lock();
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(storage_error)?;
        file.lock_exclusive().map_err(storage_error)?;

        let outcome = self.append_locked(&file, case, params);
        file.unlock().map_err(storage_error)?;
        outcome
    }

    fn load_snapshots(&self) -> Result<SnapshotTable> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SnapshotTable::new(self.parameter_names.iter().cloned()));
            }
            Err(e) => return Err(storage_error(e)),
        };
        file.lock_shared().map_err(storage_error)?;
        let table = self.replay(&file);
        file.unlock().map_err(storage_error)?;
        table
    }
}

#[allow(clippy::needless_pass_by_value)]
fn storage_error(e: impl ToString) -> Error {
    Error::Storage(e.to_string())
}

/// Read every record from the start of a locked journal file.
fn read_records(file: &File) -> Result<Vec<SnapshotRecord>> {
    let reader = BufReader::new(file);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(storage_error)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        records.push(serde_json::from_str(line).map_err(storage_error)?);
    }
    Ok(records)
}
