//! Chart series derivation.
//!
//! One entry point, [`get_series`], dispatches a [`ChartSeriesConfig`] to the
//! engine of its chart family and returns render-ready series:
//!
//! - stacked area / bar / discrete bar: [`stacking`]
//! - scatter pairing: [`scatter`]
//! - map color scale: [`color_scale`]
//! - facets: [`facet`]
//!
//! Configuration problems fail the whole request with
//! [`SeriesError::Configuration`]; an empty outcome is
//! [`SeriesError::NoDisplayableData`].

pub mod color_scale;
pub mod error;
pub mod facet;
mod input;
mod policy;
pub mod scatter;
pub mod stacking;

pub use color_scale::{MapChart, assign_bin, build_color_scale, map_series};
pub use error::{ConfigurationError, Result, SeriesError};
pub use facet::{Facet, facet_series};
pub use policy::{Resolved, apply as apply_missing_data_strategy};
pub use scatter::{ScatterChart, scatter_series};
pub use stacking::{StackLayout, StackedChart, stack_series};

use grapher_model::ChartSeriesConfig;
use grapher_table::Table;
use serde::Serialize;
use tracing::{debug, info_span};

/// Output of [`get_series`], one variant per chart family.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "chart", content = "data", rename_all = "camelCase")]
pub enum ChartSeries {
    Stacked(StackedChart),
    Scatter(ScatterChart),
    Map(MapChart),
    Faceted(Vec<Facet>),
}

impl ChartSeries {
    /// Number of series (or facets) in the result.
    pub fn len(&self) -> usize {
        match self {
            ChartSeries::Stacked(chart) => chart.series.len(),
            ChartSeries::Scatter(chart) => chart.series.len(),
            ChartSeries::Map(chart) => chart.entries.len(),
            ChartSeries::Faceted(facets) => facets.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Derive the series of one chart from `table`.
pub fn get_series(table: &Table, config: &ChartSeriesConfig) -> Result<ChartSeries> {
    let span = info_span!("get_series", chart = config.family(), rows = table.row_count());
    let _guard = span.enter();

    let result = match config {
        ChartSeriesConfig::StackedArea(config) => {
            stack_series(table, config, StackLayout::Area).map(ChartSeries::Stacked)
        }
        ChartSeriesConfig::StackedBar(config) => {
            stack_series(table, config, StackLayout::Bar).map(ChartSeries::Stacked)
        }
        ChartSeriesConfig::StackedDiscreteBar(config) => {
            stack_series(table, config, StackLayout::DiscreteBar).map(ChartSeries::Stacked)
        }
        ChartSeriesConfig::Scatter(config) => scatter_series(table, config).map(ChartSeries::Scatter),
        ChartSeriesConfig::Map(config) => map_series(table, config).map(ChartSeries::Map),
        ChartSeriesConfig::Faceted(config) => facet_series(table, config).map(ChartSeries::Faceted),
    };
    match &result {
        Ok(series) => debug!(series = series.len(), "derived chart series"),
        Err(err) => debug!(error = %err, "chart series unavailable"),
    }
    result
}
