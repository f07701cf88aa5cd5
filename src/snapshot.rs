//! Caller-owned table of simulated cases and the parameter values that
//! produced them.
//!
//! A [`SnapshotTable`] is declared with a fixed list of parameter names and
//! only ever grows: rows are appended, never edited or removed. The same
//! table is passed explicitly into every sampling call.
//!
//! ```
//! use romsampler::snapshot::{ParamValues, SnapshotTable};
//!
//! let mut table = SnapshotTable::new(["x", "y"]);
//! table
//!     .push("case_0000", ParamValues::from([("x".into(), 1.0), ("y".into(), 2.0)]))
//!     .unwrap();
//! assert_eq!(table.next_case_name(), "case_0001");
//! ```

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// A parameter-name → physical-value vector.
pub type ParamValues = BTreeMap<String, f64>;

/// Prefix shared by generated case names.
pub const CASE_PREFIX: &str = "case_";

/// One row of a [`SnapshotTable`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot {
    /// Unique case name.
    pub name: String,
    /// Values aligned with [`SnapshotTable::parameter_names`].
    pub values: Vec<f64>,
}

/// Ordered mapping from case name to parameter values.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SnapshotTable {
    parameter_names: Vec<String>,
    rows: Vec<Snapshot>,
}

impl SnapshotTable {
    /// Creates an empty table with the given parameter columns.
    #[must_use]
    pub fn new<I, S>(parameter_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parameter_names: parameter_names.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// The declared parameter columns, in order.
    #[must_use]
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    /// Column index of a parameter.
    #[must_use]
    pub fn column_index(&self, parameter: &str) -> Option<usize> {
        self.parameter_names.iter().position(|n| n == parameter)
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[Snapshot] {
        &self.rows
    }

    /// Case names in insertion order.
    #[must_use]
    pub fn case_names(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.name.clone()).collect()
    }

    /// Returns `true` if a case with this name exists.
    #[must_use]
    pub fn contains(&self, case: &str) -> bool {
        self.rows.iter().any(|r| r.name == case)
    }

    /// The values of one case as a name → value map.
    #[must_use]
    pub fn get(&self, case: &str) -> Option<ParamValues> {
        self.rows
            .iter()
            .find(|r| r.name == case)
            .map(|r| self.to_values(&r.values))
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCase`] if the name is taken,
    /// [`Error::MissingValue`] if a declared parameter has no value, and
    /// [`Error::UnknownParameter`] if `values` names an undeclared one.
    pub fn push(&mut self, name: impl Into<String>, values: ParamValues) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(Error::DuplicateCase(name));
        }
        if let Some(extra) = values
            .keys()
            .find(|k| !self.parameter_names.iter().any(|n| n == *k))
        {
            return Err(Error::UnknownParameter(extra.clone()));
        }
        let mut row = Vec::with_capacity(self.parameter_names.len());
        for parameter in &self.parameter_names {
            match values.get(parameter) {
                Some(&v) => row.push(v),
                None => {
                    return Err(Error::MissingValue {
                        case: name,
                        parameter: parameter.clone(),
                    });
                }
            }
        }
        self.rows.push(Snapshot { name, values: row });
        Ok(())
    }

    /// All values of one column, in row order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownParameter`] for an undeclared name.
    pub fn column(&self, parameter: &str) -> Result<Vec<f64>> {
        let j = self
            .column_index(parameter)
            .ok_or_else(|| Error::UnknownParameter(parameter.to_owned()))?;
        Ok(self.rows.iter().map(|r| r.values[j]).collect())
    }

    /// Observed `(min, max)` of a column, `None` for an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownParameter`] for an undeclared name.
    pub fn observed_range(&self, parameter: &str) -> Result<Option<(f64, f64)>> {
        let col = self.column(parameter)?;
        Ok(col.iter().copied().fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        }))
    }

    /// Largest numeric suffix among `case_<digits>` names.
    #[must_use]
    pub fn max_case_index(&self) -> Option<u64> {
        self.rows
            .iter()
            .filter_map(|r| parse_case_index(&r.name))
            .max()
    }

    /// One past the largest `case_<digits>` suffix, zero padded to four
    /// digits. `case_0000` for a table without generated names.
    #[must_use]
    pub fn next_case_name(&self) -> String {
        case_name(self.max_case_index().map_or(0, |i| i + 1))
    }

    fn to_values(&self, row: &[f64]) -> ParamValues {
        self.parameter_names
            .iter()
            .cloned()
            .zip(row.iter().copied())
            .collect()
    }
}

/// Formats a generated case name.
#[must_use]
pub fn case_name(index: u64) -> String {
    format!("{CASE_PREFIX}{index:04}")
}

/// Parses the suffix of a `case_<digits>` name.
#[must_use]
pub fn parse_case_index(name: &str) -> Option<u64> {
    let digits = name.strip_prefix(CASE_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
