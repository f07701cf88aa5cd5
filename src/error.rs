/// Errors produced by the sampling engine and surfaced from its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned for a bad sample count, dimension count, level count or
    /// malformed schema.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Returned when a parameter's lower bound is not below its upper bound.
    #[error("invalid bounds for '{name}': min ({min}) must be less than max ({max})")]
    InvalidBounds {
        /// The parameter name.
        name: String,
        /// The lower bound.
        min: f64,
        /// The upper bound.
        max: f64,
    },

    /// Returned when a log-scaled parameter touches a non-positive value.
    #[error("domain error for '{name}': {reason}")]
    Domain {
        /// The parameter name.
        name: String,
        /// What went wrong.
        reason: String,
    },

    /// Returned when a regression or GP fit has too few training snapshots.
    #[error("insufficient data: need at least {required} snapshots, got {got}")]
    InsufficientData {
        /// Minimum number of rows.
        required: usize,
        /// Rows available.
        got: usize,
    },

    /// Returned when a sequence has no generator for the requested dimension.
    #[error("unsupported dimension: {dims} dimensions requested, at most {max} supported")]
    UnsupportedDimension {
        /// Requested number of dimensions.
        dims: usize,
        /// Largest supported number of dimensions.
        max: usize,
    },

    /// Returned when a parameter name is not part of the table or schema.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    /// Returned when a snapshot row lacks a declared parameter.
    #[error("snapshot '{case}' has no value for parameter '{parameter}'")]
    MissingValue {
        /// The case name.
        case: String,
        /// The missing parameter.
        parameter: String,
    },

    /// Returned when appending a case name that already exists.
    #[error("duplicate case name '{0}'")]
    DuplicateCase(String),

    /// Reported by a case executor when reconstruction or CFD fails.
    #[error("case execution failed: {0}")]
    CaseExecution(String),

    /// Reported by a case executor when the ROM cannot be rebuilt.
    #[error("ROM build failed: {0}")]
    RomBuild(String),

    /// Reported by a case executor when a metric cannot be extracted.
    #[error("metric evaluation failed: {0}")]
    MetricEvaluation(String),

    /// Returned when a linear-algebra step produced no usable result.
    #[error("numerical failure: {0}")]
    Numerical(&'static str),

    /// Returned when a blocking task fails.
    #[cfg(feature = "async")]
    #[error("async task error: {0}")]
    TaskError(String),

    /// Returned when a snapshot store operation fails.
    #[cfg(feature = "journal")]
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Attach a parameter name to a bounds or domain error raised by a
    /// name-agnostic helper.
    pub(crate) fn for_parameter(self, parameter: &str) -> Self {
        match self {
            Self::InvalidBounds { name, min, max } if name.is_empty() => Self::InvalidBounds {
                name: parameter.to_owned(),
                min,
                max,
            },
            Self::Domain { name, reason } if name.is_empty() => Self::Domain {
                name: parameter.to_owned(),
                reason,
            },
            other => other,
        }
    }
}
