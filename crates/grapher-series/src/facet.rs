//! Facet splitter.
//!
//! Every facet derives the inner chart against its own filtered view. Views
//! built by the selection operators carry a fresh transform cache, so facets
//! never share derived columns even when the slugs match.

use std::collections::BTreeSet;

use grapher_model::{CellValue, ChartSeriesConfig, EntityName, FacetConfig, FacetStrategy};
use grapher_table::{ColumnView, Table};
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use tracing::{debug, warn};

use crate::ChartSeries;
use crate::error::{ConfigurationError, Result, SeriesError};
use crate::input::{check_parameters, require_column};

/// One facet's name and its own derivation outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    pub name: String,
    pub result: std::result::Result<ChartSeries, SeriesError>,
}

impl Serialize for Facet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Facet", 2)?;
        state.serialize_field("name", &self.name)?;
        match &self.result {
            Ok(series) => state.serialize_field("series", series)?,
            Err(err) => state.serialize_field("error", &err.to_string())?,
        }
        state.end()
    }
}

pub fn facet_series(table: &Table, config: &FacetConfig) -> Result<Vec<Facet>> {
    if matches!(*config.inner, ChartSeriesConfig::Faceted(_)) {
        return Err(ConfigurationError::NestedFacets.into());
    }
    check_parameters(config.inner.options())?;

    let parts = split(table, config)?;
    if parts.is_empty() {
        return Err(SeriesError::NoDisplayableData);
    }
    let facets: Vec<Facet> = parts
        .into_iter()
        .map(|(name, view, inner)| {
            let result = crate::get_series(&view, &inner);
            if let Err(err) = &result
                && !err.is_no_data()
            {
                warn!(facet = %name, error = %err, "facet derivation failed");
            }
            Facet { name, result }
        })
        .collect();
    debug!(
        facets = facets.len(),
        failed = facets.iter().filter(|f| f.result.is_err()).count(),
        "faceted series"
    );
    Ok(facets)
}

/// Name, table view and inner chart of every facet.
fn split(table: &Table, config: &FacetConfig) -> Result<Vec<(String, Table, ChartSeriesConfig)>> {
    match &config.strategy {
        FacetStrategy::Entity => {
            let selected = inner_entities(&config.inner);
            let names = if selected.is_empty() {
                table.entity_names()
            } else {
                selected
                    .into_iter()
                    .filter(|entity| table.entity_index().contains(entity.as_str()))
                    .collect()
            };
            let inner = without_entities(&config.inner);
            Ok(names
                .into_iter()
                .map(|entity| {
                    let view = table.filter_by_entity_names(&[entity.as_str()]);
                    (entity.to_string(), view, inner.clone())
                })
                .collect())
        }
        FacetStrategy::Category { column } => {
            require_column(table, column)?;
            let view = table.column_view(column.as_str())?;
            let values: BTreeSet<String> = view
                .iter()
                .filter(|cell| cell.is_present())
                .map(ToString::to_string)
                .collect();
            let order = table
                .column_def(column.as_str())
                .map(|def| def.sort_order.clone())
                .unwrap_or_default();
            let mut values: Vec<String> = values.into_iter().collect();
            values.sort_by_key(|value| {
                order
                    .iter()
                    .position(|known| known == value)
                    .unwrap_or(order.len())
            });
            values
                .into_iter()
                .map(|value| -> Result<(String, Table, ChartSeriesConfig)> {
                    let cell = category_cell(&view, &value);
                    let facet = table.filter_by_column_value(column.as_str(), &cell)?;
                    Ok((value, facet, (*config.inner).clone()))
                })
                .collect()
        }
        FacetStrategy::Metric => Ok(config
            .inner
            .metric_columns()
            .into_iter()
            .filter_map(|column| {
                let inner = config.inner.restricted_to_column(&column)?;
                let name = table
                    .column_def(column.as_str())
                    .map_or_else(|| column.to_string(), |def| def.display_name().to_string());
                Some((name, table.filter_rows(|_| true), inner))
            })
            .collect()),
    }
}

/// The stored cell whose display form is `value`.
fn category_cell(view: &ColumnView, value: &str) -> CellValue {
    view.iter()
        .find(|cell| cell.is_present() && cell.to_string() == value)
        .cloned()
        .unwrap_or_else(|| CellValue::Text(value.to_string()))
}

fn inner_entities(inner: &ChartSeriesConfig) -> Vec<EntityName> {
    match inner {
        ChartSeriesConfig::StackedArea(config)
        | ChartSeriesConfig::StackedBar(config)
        | ChartSeriesConfig::StackedDiscreteBar(config) => config.entities.clone(),
        ChartSeriesConfig::Scatter(config) => config.entities.clone(),
        ChartSeriesConfig::Map(config) => config.entities.clone(),
        ChartSeriesConfig::Faceted(_) => Vec::new(),
    }
}

fn without_entities(inner: &ChartSeriesConfig) -> ChartSeriesConfig {
    let mut inner = inner.clone();
    match &mut inner {
        ChartSeriesConfig::StackedArea(config)
        | ChartSeriesConfig::StackedBar(config)
        | ChartSeriesConfig::StackedDiscreteBar(config) => config.entities.clear(),
        ChartSeriesConfig::Scatter(config) => config.entities.clear(),
        ChartSeriesConfig::Map(config) => config.entities.clear(),
        ChartSeriesConfig::Faceted(_) => {}
    }
    inner
}
