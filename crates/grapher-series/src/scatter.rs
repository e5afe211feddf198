//! Scatter pairing.
//!
//! X and Y are matched independently per entity with the target-time rule:
//! the latest present value at or before the target time and no more than
//! `tolerance` before it. An entity without a match on either axis produces
//! no point. Axis exclusions run after pairing so the counts stay accurate.

use grapher_model::{
    AxisConfig, AxisScale, ExclusionStats, ScatterConfig, ScatterPoint, ScatterSeries,
    Time,
};
use grapher_table::{ColumnView, Table};
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SeriesError};
use crate::input::{
    TimeWindow, match_at, match_number_at, metric_view, require_column, require_numeric,
    tolerance_for, validate_options,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterChart {
    /// One series per entity, sorted by entity name.
    pub series: Vec<ScatterSeries>,
    pub excluded: ExclusionStats,
}

impl ScatterChart {
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|series| series.points.len()).sum()
    }
}

/// Which times an entity is sampled at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Path {
    /// One point at the end time.
    Single,
    /// One point per table time in the active range.
    Connected,
    /// Exactly the start and end of the active range.
    EndPoints,
}

impl Path {
    fn choose(config: &ScatterConfig, window: TimeWindow) -> Self {
        if config.options.compare_end_points_only {
            Path::EndPoints
        } else if window.explicit_start && window.start < window.end {
            Path::Connected
        } else {
            Path::Single
        }
    }
}

struct Readers {
    x: ColumnView,
    y: ColumnView,
    size: Option<ColumnView>,
    color: Option<ColumnView>,
    x_tolerance: f64,
    y_tolerance: f64,
    size_tolerance: f64,
    color_tolerance: f64,
}

pub fn scatter_series(table: &Table, config: &ScatterConfig) -> Result<ScatterChart> {
    require_numeric(table, &config.x)?;
    require_numeric(table, &config.y)?;
    if let Some(size) = &config.size {
        require_numeric(table, size)?;
    }
    if let Some(color) = &config.color {
        require_column(table, color)?;
    }
    let window = validate_options(table, &config.options)?;

    let selection = if config.entities.is_empty() {
        table.clone()
    } else {
        table.filter_by_entity_names(&config.entities)
    };
    let options = &config.options;
    let readers = Readers {
        x: metric_view(&selection, &config.x, options, window)?,
        y: metric_view(&selection, &config.y, options, window)?,
        size: config
            .size
            .as_ref()
            .map(|slug| selection.column_view(slug.as_str()))
            .transpose()?,
        color: config
            .color
            .as_ref()
            .map(|slug| selection.column_view(slug.as_str()))
            .transpose()?,
        x_tolerance: tolerance_for(&selection, &config.x, options),
        y_tolerance: tolerance_for(&selection, &config.y, options),
        size_tolerance: config
            .size
            .as_ref()
            .map_or(0.0, |slug| tolerance_for(&selection, slug, options)),
        color_tolerance: config
            .color
            .as_ref()
            .map_or(0.0, |slug| tolerance_for(&selection, slug, options)),
    };

    let path = Path::choose(config, window);
    let connected_targets: Vec<Time> = match path {
        Path::Connected => selection
            .times()
            .into_iter()
            .filter(|time| window.contains(*time))
            .collect(),
        Path::Single | Path::EndPoints => Vec::new(),
    };
    let mut excluded = ExclusionStats::default();
    let mut series = Vec::new();
    for (entity, rows) in selection.entity_index().iter() {
        let points = match path {
            Path::Single => {
                trace_path(&selection, &readers, config, rows, &[window.end], &mut excluded)
            }
            Path::Connected => {
                let mut points = trace_path(
                    &selection,
                    &readers,
                    config,
                    rows,
                    &connected_targets,
                    &mut excluded,
                );
                points.dedup_by_key(|point| (point.x_time, point.y_time));
                points
            }
            Path::EndPoints => {
                match end_points(&selection, &readers, config, rows, window, &mut excluded) {
                    Some(pair) => Vec::from(pair),
                    None => {
                        debug!(entity = %entity, "entity lacks a start or end point");
                        continue;
                    }
                }
            }
        };
        if points.is_empty() {
            continue;
        }
        series.push(ScatterSeries {
            series_name: entity.to_string(),
            points,
        });
    }

    if series.is_empty() {
        return Err(SeriesError::NoDisplayableData);
    }
    let chart = ScatterChart { series, excluded };
    debug!(
        entities = chart.series.len(),
        points = chart.point_count(),
        excluded = chart.excluded.total(),
        ?path,
        "scatter series"
    );
    Ok(chart)
}

/// Pair an entity at each target in turn, keeping the points that survive
/// the axis filters.
fn trace_path(
    table: &Table,
    readers: &Readers,
    config: &ScatterConfig,
    rows: &[usize],
    targets: &[Time],
    excluded: &mut ExclusionStats,
) -> Vec<ScatterPoint> {
    targets
        .iter()
        .filter_map(|&target| displayable_pair(table, readers, config, rows, target, excluded))
        .collect()
}

/// The start and end points of an entity, or `None` unless both survive.
fn end_points(
    table: &Table,
    readers: &Readers,
    config: &ScatterConfig,
    rows: &[usize],
    window: TimeWindow,
    excluded: &mut ExclusionStats,
) -> Option<[ScatterPoint; 2]> {
    let first = displayable_pair(table, readers, config, rows, window.start, excluded);
    let last = displayable_pair(table, readers, config, rows, window.end, excluded);
    Some([first?, last?])
}

/// [`pair_at`] followed by the log-axis and domain filters; every rejection
/// is counted in `excluded`.
fn displayable_pair(
    table: &Table,
    readers: &Readers,
    config: &ScatterConfig,
    rows: &[usize],
    target: Time,
    excluded: &mut ExclusionStats,
) -> Option<ScatterPoint> {
    let Some(point) = pair_at(table, readers, rows, target) else {
        excluded.no_match += 1;
        return None;
    };
    if !on_axis(&config.x_axis, point.x) || !on_axis(&config.y_axis, point.y) {
        excluded.non_positive_on_log_axis += 1;
        return None;
    }
    if config.remove_points_outside_domain
        && !(config.x_axis.contains(point.x) && config.y_axis.contains(point.y))
    {
        excluded.outside_domain += 1;
        return None;
    }
    Some(point)
}

/// Pair one entity's X and Y at `target`. Size and color are optional and
/// never prevent a point.
fn pair_at(table: &Table, readers: &Readers, rows: &[usize], target: Time) -> Option<ScatterPoint> {
    let (x, x_time) = match_number_at(table, &readers.x, rows, target, readers.x_tolerance)?;
    let (y, y_time) = match_number_at(table, &readers.y, rows, target, readers.y_tolerance)?;
    let size = readers.size.as_ref().and_then(|view| {
        match_number_at(table, view, rows, target, readers.size_tolerance).map(|(v, _)| v)
    });
    let color = readers.color.as_ref().and_then(|view| {
        match_at(table, view, rows, target, readers.color_tolerance).map(|(cell, _)| cell.clone())
    });
    Some(ScatterPoint {
        x,
        y,
        x_time,
        y_time,
        time: target,
        size,
        color,
    })
}

fn on_axis(axis: &AxisConfig, value: f64) -> bool {
    axis.scale != AxisScale::Log || value > 0.0
}
