//! Metric descriptions and ROM-versus-CFD evaluation results.
//!
//! The engine never computes a metric itself. A [`Metric`] is handed to the
//! case executor, which returns one scalar per case and [`Fidelity`]; the
//! engine only compares the two numbers and records an [`EvalResult`].

use core::fmt;
use std::io::Write;

/// Which result a metric is extracted from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Fidelity {
    /// The field reconstructed from the reduced-order model.
    Rom,
    /// The full-fidelity CFD solution.
    Cfd,
}

/// Which force coefficient to report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ForceCoefficient {
    /// Lift coefficient `Cl`.
    Lift,
    /// Drag coefficient `Cd`.
    Drag,
    /// Moment coefficient `Cm`.
    Moment,
}

impl ForceCoefficient {
    /// Short symbol, e.g. `Cd`.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Lift => "Cl",
            Self::Drag => "Cd",
            Self::Moment => "Cm",
        }
    }
}

/// How the force directions of a [`MetricKind::ForceCoefficient`] are given.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DirectionMethod {
    /// Drag and lift directions are used as given.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "direct"))]
    Direct,
    /// Drag and lift directions are rotated by the angle of attack and the
    /// angle of sideslip.
    #[cfg_attr(feature = "serde", serde(rename = "AoA_AoS"))]
    AngleOfAttack,
}

/// Category-specific configuration of a metric.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "category", rename_all = "snake_case"))]
pub enum MetricKind {
    /// Integrated force coefficient over a set of boundaries.
    ForceCoefficient {
        /// Region the boundaries belong to, for multi-region cases.
        #[cfg_attr(feature = "serde", serde(default))]
        region: Option<String>,
        /// Boundaries the force is integrated over.
        boundaries: Vec<String>,
        /// Reported coefficient.
        coefficient: ForceCoefficient,
        /// Whether the angles below rotate the direction vectors.
        #[cfg_attr(feature = "serde", serde(default))]
        direction_method: DirectionMethod,
        /// Drag direction vector.
        drag_direction: [f64; 3],
        /// Lift direction vector.
        lift_direction: [f64; 3],
        /// Centre of rotation for moments.
        center_of_rotation: [f64; 3],
        /// Angle of attack in degrees.
        angle_of_attack: f64,
        /// Angle of sideslip in degrees.
        angle_of_sideslip: f64,
    },
    /// Field value sampled at a point.
    PointProbe {
        /// Probe location.
        coordinate: [f64; 3],
        /// Field name, e.g. `p` or `U`.
        field: String,
        /// Vector component, if the field is a vector.
        component: Option<String>,
        /// Boundary to snap the probe onto.
        snap_onto_boundary: Option<String>,
    },
    /// Aggregate of a field over a surface.
    SurfaceAggregate {
        /// Surface (boundary) name.
        surface: String,
        /// Aggregation, e.g. `areaWeightedAverage`.
        report_type: String,
        /// Field name.
        field: String,
        /// Vector component, if the field is a vector.
        component: Option<String>,
    },
    /// Aggregate of a field over a cell zone.
    VolumeAggregate {
        /// Cell zone name.
        volume: String,
        /// Aggregation, e.g. `volumeAverage`.
        report_type: String,
        /// Field name.
        field: String,
        /// Vector component, if the field is a vector.
        component: Option<String>,
    },
}

/// A scalar quantity the case executor can extract from a result.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metric {
    /// Display label; derived from `kind` when absent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: Option<String>,
    /// What to extract.
    pub kind: MetricKind,
}

impl Metric {
    /// Creates a metric with a derived label.
    #[must_use]
    pub fn new(kind: MetricKind) -> Self {
        Self { label: None, kind }
    }

    /// Overrides the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The explicit label, or one built from the configuration.
    #[must_use]
    pub fn label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        match &self.kind {
            MetricKind::ForceCoefficient {
                boundaries,
                coefficient,
                ..
            } => {
                let location = if boundaries.is_empty() {
                    "No boundary".to_owned()
                } else {
                    boundaries.join(", ")
                };
                format!("{} @ {location}", coefficient.symbol())
            }
            MetricKind::PointProbe {
                coordinate: c,
                field,
                component,
                ..
            } => format!(
                "{} @ ({}, {}, {})",
                field_label(field, component.as_deref()),
                c[0],
                c[1],
                c[2]
            ),
            MetricKind::SurfaceAggregate {
                surface,
                report_type,
                field,
                component,
            } => format!(
                "{report_type} of {} @ {surface}",
                field_label(field, component.as_deref())
            ),
            MetricKind::VolumeAggregate {
                volume,
                report_type,
                field,
                component,
            } => format!(
                "{report_type} of {} @ {volume}",
                field_label(field, component.as_deref())
            ),
        }
    }
}

fn field_label(field: &str, component: Option<&str>) -> String {
    match component {
        Some(c) => format!("{field}.{c}"),
        None => field.to_owned(),
    }
}

/// `|cfd - rom| / |cfd| · 100`, or `0` when `cfd == 0`.
#[must_use]
pub fn relative_error_percent(rom: f64, cfd: f64) -> f64 {
    if cfd == 0.0 {
        0.0
    } else {
        (cfd - rom).abs() / cfd.abs() * 100.0
    }
}

/// One metric compared between ROM and CFD for one case.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvalResult {
    /// Case name.
    pub case: String,
    /// Metric display label.
    pub metric_label: String,
    /// Value extracted from the ROM reconstruction.
    pub rom_value: f64,
    /// Value extracted from the CFD solution.
    pub cfd_value: f64,
    /// Relative error in percent.
    pub relative_error_percent: f64,
}

impl EvalResult {
    /// Builds a result and computes its relative error.
    #[must_use]
    pub fn new(
        case: impl Into<String>,
        metric_label: impl Into<String>,
        rom_value: f64,
        cfd_value: f64,
    ) -> Self {
        Self {
            case: case.into(),
            metric_label: metric_label.into(),
            rom_value,
            cfd_value,
            relative_error_percent: relative_error_percent(rom_value, cfd_value),
        }
    }
}

/// Append-only list of evaluation results with a stable CSV shape.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvalReport {
    rows: Vec<EvalResult>,
}

/// Header of [`EvalReport::to_csv`].
pub const CSV_HEADER: &str = "case,metric,rom_value,cfd_value,relative_error_percent";

impl EvalReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row.
    pub fn push(&mut self, result: EvalResult) {
        self.rows.push(result);
    }

    /// All rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[EvalResult] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if no result was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Largest relative error per metric label, in first-seen order.
    #[must_use]
    pub fn worst_by_metric(&self) -> Vec<(String, f64)> {
        let mut out: Vec<(String, f64)> = Vec::new();
        for r in &self.rows {
            match out.iter_mut().find(|(label, _)| *label == r.metric_label) {
                Some((_, worst)) => *worst = worst.max(r.relative_error_percent),
                None => out.push((r.metric_label.clone(), r.relative_error_percent)),
            }
        }
        out
    }

    /// Writes the report as CSV.
    ///
    /// Columns: `case`, `metric`, `rom_value`, `cfd_value`,
    /// `relative_error_percent`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn to_csv(&self, mut writer: impl Write) -> std::io::Result<()> {
        writeln!(writer, "{CSV_HEADER}")?;
        for r in &self.rows {
            writeln!(
                writer,
                "{},{},{},{},{}",
                csv_escape(&r.case),
                csv_escape(&r.metric_label),
                r.rom_value,
                r.cfd_value,
                r.relative_error_percent
            )?;
        }
        Ok(())
    }

    /// Writes the report to a CSV file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or written.
    pub fn export_csv(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        self.to_csv(std::io::BufWriter::new(file))
    }
}

impl Extend<EvalResult> for EvalReport {
    fn extend<T: IntoIterator<Item = EvalResult>>(&mut self, iter: T) {
        self.rows.extend(iter);
    }
}

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in &self.rows {
            writeln!(
                f,
                "{:<12} {:<32} rom={:<14} cfd={:<14} err={:.3}%",
                r.case, r.metric_label, r.rom_value, r.cfd_value, r.relative_error_percent
            )?;
        }
        Ok(())
    }
}

/// Quote a CSV field if it contains a comma, quote, or newline.
pub(crate) fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_owned()
    }
}
