//! Shared data model for the grapher table engine.
//!
//! - **ids**: column slugs, entity names, row keys and the time axis type
//! - **value**: stored cells and raw ingestion rows
//! - **column**: column definitions and provenance
//! - **options**: per-chart-family configuration objects
//! - **series**: render-ready series, scatter points and color-scale bins
//! - **time**: year / day axis parsing
//! - **transform**: derived-column requests

pub mod column;
pub mod enums;
pub mod error;
pub mod ids;
pub mod options;
pub mod series;
pub mod time;
pub mod transform;
pub mod value;

pub use column::{ColumnDef, ColumnSource, TransformId};
pub use enums::{
    AxisScale, BinningStrategy, ColumnKind, MissingDataStrategy, StackMode, TimeUnit,
};
pub use error::{ModelError, Result};
pub use ids::{ColumnSlug, EntityName, RowKey, Time};
pub use options::{
    AxisConfig, ChartSeriesConfig, ColorScaleConfig, FacetConfig, FacetStrategy, ScatterConfig,
    SeriesOptions, SeriesStrategy, StackConfig,
};
pub use series::{
    BinKind, BinRef, ColorScale, ColorScaleBin, ExclusionStats, MapEntry, Position, ScatterPoint,
    ScatterSeries, Series, SeriesPoint,
};
pub use transform::{RelativeMode, TransformKind};
pub use value::{CellValue, RawRow, RawValue, format_number};
