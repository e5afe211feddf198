use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("column slug must not be empty (got {0:?})")]
    InvalidColumnSlug(String),
    #[error("entity name must not be empty (got {0:?})")]
    InvalidEntityName(String),
    #[error("unknown column kind: {0}")]
    UnknownColumnKind(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
