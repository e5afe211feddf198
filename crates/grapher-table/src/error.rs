use grapher_model::{ColumnKind, ColumnSlug};
use thiserror::Error;

/// Failure of one derived-column request.
///
/// A transform error is local to the requested column: the table and its
/// other columns stay usable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("column {slug} has kind {kind}, expected a numeric column")]
    NotNumeric { slug: ColumnSlug, kind: ColumnKind },
    #[error("invalid {transform} parameter: {reason}")]
    InvalidParameter {
        transform: &'static str,
        reason: String,
    },
}

impl TransformError {
    pub(crate) fn invalid(transform: &'static str, reason: impl Into<String>) -> Self {
        TransformError::InvalidParameter {
            transform,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
