//! Persistent columnar table for chart data.
//!
//! - [`Table`]: immutable view over a shared column store, keyed by
//!   `(entity, time)` rows
//! - [`TableBuilder`]: ingestion of raw rows with a per-row [`IngestReport`]
//! - [`TransformKind`]: derived columns, memoized per view
//! - selection operators returning new views that share column arrays

pub mod builder;
mod cache;
pub mod column;
pub mod error;
mod export;
mod filter;
pub mod report;
pub mod row;
mod table;
mod transform;

pub use builder::{TableBuilder, infer_column_kind};
pub use cache::CacheEntryInfo;
pub use column::{Column, ColumnView};
pub use error::{Result, TransformError};
pub use export::{ENTITY_COLUMN, TIME_COLUMN};
pub use grapher_model::{RelativeMode, TransformKind};
pub use report::{IngestReport, InvalidCell, RejectReason, RejectedRow};
pub use row::{EntityIndex, RowSetId};
pub use table::Table;
