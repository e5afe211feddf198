use grapher_model::{ColumnKind, ColumnSlug, Time};
use grapher_table::TransformError;
use thiserror::Error;

/// A chart request that cannot be served as configured.
///
/// Raised before any series computation starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("color scale bin count must be positive, got {0}")]
    InvalidBinCount(i64),

    #[error("custom bin edges must be finite and strictly increasing: {0:?}")]
    InvalidBinEdges(Vec<f64>),

    #[error("tolerance must be a non-negative number, got {0}")]
    InvalidTolerance(f64),

    #[error("start time {start} is after end time {end}")]
    InvertedTimeRange { start: Time, end: Time },

    #[error("{field} {time} is outside the table's time domain {min}..={max}")]
    TimeOutsideDomain {
        field: &'static str,
        time: Time,
        min: Time,
        max: Time,
    },

    #[error("color domain minimum {min} is not below maximum {max}")]
    InvalidDomain { min: f64, max: f64 },

    #[error("no columns configured")]
    NoColumns,

    #[error("unknown column: {0}")]
    UnknownColumn(ColumnSlug),

    #[error("column {slug} has kind {kind}, expected a numeric column")]
    NotNumeric { slug: ColumnSlug, kind: ColumnKind },

    #[error("one series per column needs exactly one selected entity, got {0}")]
    AmbiguousEntity(usize),

    #[error("one series per entity needs exactly one column, got {0}")]
    AmbiguousColumn(usize),

    #[error("faceted charts cannot be nested")]
    NestedFacets,
}

/// Failure of one series derivation request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    /// Nothing is left to draw after filtering and the missing-value policy.
    /// A normal "no data for this selection" outcome.
    #[error("no displayable data for this selection")]
    NoDisplayableData,

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl SeriesError {
    pub fn is_no_data(&self) -> bool {
        matches!(self, SeriesError::NoDisplayableData)
    }
}

pub type Result<T> = std::result::Result<T, SeriesError>;
