//! Configuration objects accepted by the series derivation engines.
//!
//! Every chart family gets one variant of [`ChartSeriesConfig`]; the shared
//! knobs (stack mode, missing-data strategy, target time, tolerance, binning)
//! live in [`SeriesOptions`] and are flattened into each variant so a host
//! can send a single JSON object:
//!
//! ```json
//! { "chart": "stackedArea", "columns": ["coal", "gas"], "stackMode": "relative" }
//! ```

use serde::{Deserialize, Serialize};

use crate::enums::{AxisScale, BinningStrategy, MissingDataStrategy, StackMode};
use crate::ids::{ColumnSlug, EntityName, Time};
use crate::transform::TransformKind;

fn default_bin_count() -> i64 {
    5
}

/// Options shared by every chart family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeriesOptions {
    pub stack_mode: StackMode,
    pub missing_data_strategy: MissingDataStrategy,
    /// Start of the active time range (inclusive). Defaults to the table's first time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Time>,
    /// End of the active time range (inclusive) and the target time of
    /// single-time charts. Defaults to the table's last time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Time>,
    /// Maximum distance, in time units, between a target time and the value used for it.
    pub tolerance: f64,
    pub compare_end_points_only: bool,
    /// Signed so a negative count can be reported instead of failing to parse.
    #[serde(default = "default_bin_count")]
    pub color_scale_bin_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_bin_edges: Option<Vec<f64>>,
    /// Read every plotted column through this derived-column transform.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformKind>,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            stack_mode: StackMode::Absolute,
            missing_data_strategy: MissingDataStrategy::Zero,
            start_time: None,
            end_time: None,
            tolerance: 0.0,
            compare_end_points_only: false,
            color_scale_bin_count: default_bin_count(),
            custom_bin_edges: None,
            transform: None,
        }
    }
}

impl SeriesOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack_mode(mut self, mode: StackMode) -> Self {
        self.stack_mode = mode;
        self
    }

    pub fn with_missing_data_strategy(mut self, strategy: MissingDataStrategy) -> Self {
        self.missing_data_strategy = strategy;
        self
    }

    pub fn with_time_range(mut self, start: Option<Time>, end: Option<Time>) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    pub fn with_end_time(mut self, end: Time) -> Self {
        self.end_time = Some(end);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_compare_end_points_only(mut self, enable: bool) -> Self {
        self.compare_end_points_only = enable;
        self
    }

    pub fn with_bin_count(mut self, count: i64) -> Self {
        self.color_scale_bin_count = count;
        self
    }

    pub fn with_custom_bin_edges(mut self, edges: Vec<f64>) -> Self {
        self.custom_bin_edges = Some(edges);
        self
    }

    pub fn with_transform(mut self, transform: TransformKind) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// What becomes a series in a stacked chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesStrategy {
    /// One series per entity, all reading the same column.
    Entity,
    /// One series per column.
    Column,
}

/// Stacked area / stacked bar / stacked discrete bar configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackConfig {
    pub columns: Vec<ColumnSlug>,
    /// Selected entities. Their order is the stack order for entity series
    /// and the category order for discrete bars. Empty selects every entity
    /// in name order.
    #[serde(default)]
    pub entities: Vec<EntityName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_strategy: Option<SeriesStrategy>,
    #[serde(flatten)]
    pub options: SeriesOptions,
}

impl StackConfig {
    pub fn new(columns: Vec<ColumnSlug>) -> Self {
        Self {
            columns,
            entities: Vec::new(),
            series_strategy: None,
            options: SeriesOptions::default(),
        }
    }

    pub fn with_entities(mut self, entities: Vec<EntityName>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_series_strategy(mut self, strategy: SeriesStrategy) -> Self {
        self.series_strategy = Some(strategy);
        self
    }

    pub fn with_options(mut self, options: SeriesOptions) -> Self {
        self.options = options;
        self
    }

    /// The explicit strategy, or one series per column when several columns are given.
    pub fn resolved_strategy(&self) -> SeriesStrategy {
        self.series_strategy.unwrap_or(if self.columns.len() > 1 {
            SeriesStrategy::Column
        } else {
            SeriesStrategy::Entity
        })
    }
}

/// Domain and scale of a scatter axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AxisConfig {
    pub scale: AxisScale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl AxisConfig {
    pub fn log() -> Self {
        Self {
            scale: AxisScale::Log,
            ..Self::default()
        }
    }

    pub fn with_domain(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Returns true when `value` lies within the configured bounds.
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// Scatter plot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterConfig {
    pub x: ColumnSlug,
    pub y: ColumnSlug,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<ColumnSlug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColumnSlug>,
    #[serde(default)]
    pub entities: Vec<EntityName>,
    #[serde(default)]
    pub x_axis: AxisConfig,
    #[serde(default)]
    pub y_axis: AxisConfig,
    #[serde(default)]
    pub remove_points_outside_domain: bool,
    #[serde(flatten)]
    pub options: SeriesOptions,
}

impl ScatterConfig {
    pub fn new(x: ColumnSlug, y: ColumnSlug) -> Self {
        Self {
            x,
            y,
            size: None,
            color: None,
            entities: Vec::new(),
            x_axis: AxisConfig::default(),
            y_axis: AxisConfig::default(),
            remove_points_outside_domain: false,
            options: SeriesOptions::default(),
        }
    }

    pub fn with_size(mut self, size: ColumnSlug) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_color(mut self, color: ColumnSlug) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_entities(mut self, entities: Vec<EntityName>) -> Self {
        self.entities = entities;
        self
    }

    pub fn with_axes(mut self, x_axis: AxisConfig, y_axis: AxisConfig) -> Self {
        self.x_axis = x_axis;
        self.y_axis = y_axis;
        self
    }

    pub fn with_remove_points_outside_domain(mut self, enable: bool) -> Self {
        self.remove_points_outside_domain = enable;
        self
    }

    pub fn with_options(mut self, options: SeriesOptions) -> Self {
        self.options = options;
        self
    }
}

/// Choropleth color-scale configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScaleConfig {
    pub column: ColumnSlug,
    #[serde(default)]
    pub entities: Vec<EntityName>,
    #[serde(default)]
    pub binning_strategy: BinningStrategy,
    /// Palette the bin colors are picked from, light to dark.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_data_color: Option<String>,
    /// Lower bound of the custom domain; smaller values are out of domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_min: Option<f64>,
    /// Upper bound of the custom domain; larger values are out of domain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_max: Option<f64>,
    /// Give out-of-domain values dedicated bins instead of clamping them.
    #[serde(default)]
    pub out_of_domain_bins: bool,
    #[serde(flatten)]
    pub options: SeriesOptions,
}

impl ColorScaleConfig {
    pub fn new(column: ColumnSlug) -> Self {
        Self {
            column,
            entities: Vec::new(),
            binning_strategy: BinningStrategy::default(),
            colors: None,
            no_data_color: None,
            domain_min: None,
            domain_max: None,
            out_of_domain_bins: false,
            options: SeriesOptions::default(),
        }
    }

    pub fn with_binning_strategy(mut self, strategy: BinningStrategy) -> Self {
        self.binning_strategy = strategy;
        self
    }

    pub fn with_colors(mut self, colors: Vec<String>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_domain(mut self, min: Option<f64>, max: Option<f64>, dedicated_bins: bool) -> Self {
        self.domain_min = min;
        self.domain_max = max;
        self.out_of_domain_bins = dedicated_bins;
        self
    }

    pub fn with_options(mut self, options: SeriesOptions) -> Self {
        self.options = options;
        self
    }
}

/// How a table is partitioned into facets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "camelCase")]
pub enum FacetStrategy {
    /// One facet per entity.
    Entity,
    /// One facet per distinct value of a categorical column.
    Category { column: ColumnSlug },
    /// One facet per column of the inner chart.
    Metric,
}

/// A faceted chart: the inner chart is derived once per facet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetConfig {
    pub strategy: FacetStrategy,
    /// The chart derived once per facet.
    pub inner: Box<ChartSeriesConfig>,
}

impl FacetConfig {
    pub fn new(strategy: FacetStrategy, inner: ChartSeriesConfig) -> Self {
        Self {
            strategy,
            inner: Box::new(inner),
        }
    }
}

/// Tagged per-family chart configuration dispatched through one entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "chart", rename_all = "camelCase")]
pub enum ChartSeriesConfig {
    /// Positions are times; values stack into continuous areas.
    StackedArea(StackConfig),
    /// Positions are times; values stack into bars.
    StackedBar(StackConfig),
    /// Positions are entities (categories); series are columns at the end time.
    StackedDiscreteBar(StackConfig),
    Scatter(ScatterConfig),
    Map(ColorScaleConfig),
    Faceted(FacetConfig),
}

impl ChartSeriesConfig {
    /// Short family name for logs and reports.
    pub fn family(&self) -> &'static str {
        match self {
            ChartSeriesConfig::StackedArea(_) => "stackedArea",
            ChartSeriesConfig::StackedBar(_) => "stackedBar",
            ChartSeriesConfig::StackedDiscreteBar(_) => "stackedDiscreteBar",
            ChartSeriesConfig::Scatter(_) => "scatter",
            ChartSeriesConfig::Map(_) => "map",
            ChartSeriesConfig::Faceted(_) => "faceted",
        }
    }

    /// The shared options of the chart; faceted charts report the inner chart's.
    pub fn options(&self) -> &SeriesOptions {
        match self {
            ChartSeriesConfig::StackedArea(config)
            | ChartSeriesConfig::StackedBar(config)
            | ChartSeriesConfig::StackedDiscreteBar(config) => &config.options,
            ChartSeriesConfig::Scatter(config) => &config.options,
            ChartSeriesConfig::Map(config) => &config.options,
            ChartSeriesConfig::Faceted(config) => config.inner.options(),
        }
    }

    /// Data columns the chart plots (not size/color helpers).
    pub fn metric_columns(&self) -> Vec<ColumnSlug> {
        match self {
            ChartSeriesConfig::StackedArea(config)
            | ChartSeriesConfig::StackedBar(config)
            | ChartSeriesConfig::StackedDiscreteBar(config) => config.columns.clone(),
            ChartSeriesConfig::Scatter(config) => vec![config.y.clone()],
            ChartSeriesConfig::Map(config) => vec![config.column.clone()],
            ChartSeriesConfig::Faceted(config) => config.inner.metric_columns(),
        }
    }

    /// A copy of this chart plotting only `column`. Used for metric facets.
    pub fn restricted_to_column(&self, column: &ColumnSlug) -> Option<ChartSeriesConfig> {
        let mut restricted = self.clone();
        match &mut restricted {
            ChartSeriesConfig::StackedArea(config)
            | ChartSeriesConfig::StackedBar(config)
            | ChartSeriesConfig::StackedDiscreteBar(config) => {
                config.columns = vec![column.clone()];
                config.series_strategy = Some(SeriesStrategy::Entity);
            }
            ChartSeriesConfig::Scatter(config) => config.y = column.clone(),
            ChartSeriesConfig::Map(config) => config.column = column.clone(),
            ChartSeriesConfig::Faceted(_) => return None,
        }
        Some(restricted)
    }
}
