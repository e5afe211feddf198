//! Stacked area, stacked bar and stacked discrete bar series.
//!
//! Series are stacked bottom to top in the order the caller configured;
//! the engine never re-sorts them. Each point's `value_offset` is the sum of
//! the values of every lower series at the same position.

use std::collections::{BTreeMap, BTreeSet};

use grapher_model::{
    EntityName, Position, Series, SeriesPoint, SeriesStrategy, StackConfig, StackMode, Time,
};
use grapher_table::{ColumnView, Table};
use serde::Serialize;
use tracing::debug;

use crate::error::{ConfigurationError, Result, SeriesError};
use crate::input::{
    TimeWindow, match_number_at, metric_view, require_numeric, tolerance_for, validate_options,
};
use crate::policy;

/// How positions are laid out along the stacked axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackLayout {
    /// Positions are times, drawn as continuous areas.
    Area,
    /// Positions are times, drawn as bars.
    Bar,
    /// Positions are entities at the end time; one series per column.
    DiscreteBar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StackedChart {
    /// Every position of the chart, in axis order.
    pub positions: Vec<Position>,
    /// Series in stack order, bottom first. Each has one point per position.
    pub series: Vec<Series>,
}

impl StackedChart {
    /// Sum of the non-fake values at position `idx`.
    pub fn total_at(&self, idx: usize) -> f64 {
        self.series
            .iter()
            .filter_map(|series| series.points.get(idx))
            .filter(|point| !point.is_fake)
            .map(|point| point.value)
            .sum()
    }
}

#[derive(Debug, Clone, Copy)]
struct Reading {
    value: f64,
    time: Time,
    interpolated: bool,
}

#[derive(Debug)]
struct Candidate {
    name: String,
    color: Option<String>,
    readings: BTreeMap<Position, Reading>,
}

pub fn stack_series(table: &Table, config: &StackConfig, layout: StackLayout) -> Result<StackedChart> {
    if config.columns.is_empty() {
        return Err(ConfigurationError::NoColumns.into());
    }
    for column in &config.columns {
        require_numeric(table, column)?;
    }
    let window = validate_options(table, &config.options)?;

    let selection = if config.entities.is_empty() {
        table.clone()
    } else {
        table.filter_by_entity_names(&config.entities)
    };
    let entities: Vec<EntityName> = if config.entities.is_empty() {
        selection.entity_names()
    } else {
        config
            .entities
            .iter()
            .filter(|entity| selection.entity_index().contains(entity.as_str()))
            .cloned()
            .collect()
    };
    if entities.is_empty() {
        return Err(SeriesError::NoDisplayableData);
    }

    let (candidates, positions) = match layout {
        StackLayout::Area | StackLayout::Bar => {
            let candidates = time_candidates(&selection, config, &entities, window)?;
            let positions: BTreeSet<Position> = candidates
                .iter()
                .flat_map(|candidate| candidate.readings.keys().cloned())
                .collect();
            (candidates, positions.into_iter().collect::<Vec<_>>())
        }
        StackLayout::DiscreteBar => {
            let candidates = category_candidates(&selection, config, &entities, window)?;
            let positions: Vec<Position> = entities
                .iter()
                .map(|entity| Position::Category(entity.clone()))
                .filter(|position| {
                    candidates
                        .iter()
                        .any(|candidate| candidate.readings.contains_key(position))
                })
                .collect();
            (candidates, positions)
        }
    };

    let chart = assemble(candidates, positions, config, window)?;
    debug!(
        series = chart.series.len(),
        positions = chart.positions.len(),
        mode = ?config.options.stack_mode,
        "stacked series"
    );
    Ok(chart)
}

/// One candidate series per entity (single column) or per column (single entity).
fn time_candidates(
    table: &Table,
    config: &StackConfig,
    entities: &[EntityName],
    window: TimeWindow,
) -> Result<Vec<Candidate>> {
    let read = |entity: &EntityName, view: &ColumnView| {
        let mut readings = BTreeMap::new();
        for &row in table.entity_index().rows_for(entity.as_str()) {
            let time = table.time(row);
            if !window.contains(time) {
                continue;
            }
            if let Some(value) = view.number(row) {
                readings.insert(
                    Position::Time(time),
                    Reading {
                        value,
                        time,
                        interpolated: view.is_interpolated(row),
                    },
                );
            }
        }
        readings
    };

    match config.resolved_strategy() {
        SeriesStrategy::Entity => {
            let [column] = config.columns.as_slice() else {
                return Err(ConfigurationError::AmbiguousColumn(config.columns.len()).into());
            };
            let view = metric_view(table, column, &config.options, window)?;
            Ok(entities
                .iter()
                .map(|entity| Candidate {
                    name: entity.to_string(),
                    color: None,
                    readings: read(entity, &view),
                })
                .collect())
        }
        SeriesStrategy::Column => {
            let [entity] = entities else {
                return Err(ConfigurationError::AmbiguousEntity(entities.len()).into());
            };
            config
                .columns
                .iter()
                .map(|column| {
                    let view = metric_view(table, column, &config.options, window)?;
                    let def = table.column_def(column.as_str());
                    Ok(Candidate {
                        name: def.map_or_else(
                            || column.to_string(),
                            |def| def.display_name().to_string(),
                        ),
                        color: def.and_then(|def| def.color.clone()),
                        readings: read(entity, &view),
                    })
                })
                .collect()
        }
    }
}

/// One candidate series per column, read at the end time for each entity.
fn category_candidates(
    table: &Table,
    config: &StackConfig,
    entities: &[EntityName],
    window: TimeWindow,
) -> Result<Vec<Candidate>> {
    config
        .columns
        .iter()
        .map(|column| {
            let view = metric_view(table, column, &config.options, window)?;
            let tolerance = tolerance_for(table, column, &config.options);
            let mut readings = BTreeMap::new();
            for entity in entities {
                let rows = table.entity_index().rows_for(entity.as_str());
                if let Some((value, time)) = match_number_at(table, &view, rows, window.end, tolerance)
                {
                    readings.insert(
                        Position::Category(entity.clone()),
                        Reading {
                            value,
                            time,
                            interpolated: false,
                        },
                    );
                }
            }
            let def = table.column_def(column.as_str());
            Ok(Candidate {
                name: def.map_or_else(|| column.to_string(), |def| def.display_name().to_string()),
                color: def.and_then(|def| def.color.clone()),
                readings,
            })
        })
        .collect()
}

/// Align candidates on `positions`, apply the missing-value policy, then
/// normalize (relative mode) and accumulate offsets.
fn assemble(
    candidates: Vec<Candidate>,
    positions: Vec<Position>,
    config: &StackConfig,
    window: TimeWindow,
) -> Result<StackedChart> {
    let options = &config.options;
    let coords: Vec<f64> = positions
        .iter()
        .enumerate()
        .map(|(idx, position)| match position {
            Position::Time(time) => *time as f64,
            Position::Category(_) => idx as f64,
        })
        .collect();

    let mut series: Vec<Series> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let readings: Vec<Option<f64>> = positions
            .iter()
            .map(|position| candidate.readings.get(position).map(|r| r.value))
            .collect();
        let Some(resolved) = policy::apply(&readings, &coords, options.missing_data_strategy)
        else {
            debug!(
                series = %candidate.name,
                strategy = ?options.missing_data_strategy,
                "series dropped by missing-value policy"
            );
            continue;
        };
        let points = positions
            .iter()
            .zip(resolved)
            .map(|(position, resolved)| {
                let reading = candidate.readings.get(position);
                let time = match (reading, position) {
                    (Some(reading), _) => reading.time,
                    (None, Position::Time(time)) => *time,
                    (None, Position::Category(_)) => window.end,
                };
                SeriesPoint {
                    position: position.clone(),
                    time,
                    value: resolved.value,
                    value_offset: 0.0,
                    is_interpolated: resolved.is_interpolated
                        || reading.is_some_and(|reading| reading.interpolated),
                    is_fake: resolved.is_fake,
                }
            })
            .collect();
        series.push(Series {
            series_name: candidate.name,
            color: candidate.color,
            points,
        });
    }

    if series.is_empty() {
        return Err(SeriesError::NoDisplayableData);
    }

    if options.stack_mode == StackMode::Relative {
        for idx in 0..positions.len() {
            let total: f64 = series
                .iter()
                .map(|s| &s.points[idx])
                .filter(|point| !point.is_fake)
                .map(|point| point.value)
                .sum();
            for s in &mut series {
                let point = &mut s.points[idx];
                point.value = if total == 0.0 || point.is_fake {
                    0.0
                } else {
                    100.0 * point.value / total
                };
            }
        }
    }

    let mut offsets = vec![0.0; positions.len()];
    for s in &mut series {
        for (point, offset) in s.points.iter_mut().zip(offsets.iter_mut()) {
            point.value_offset = *offset;
            *offset += point.value;
        }
    }

    Ok(StackedChart { positions, series })
}

#[cfg(test)]
mod tests {
    use grapher_model::{ColumnDef, ColumnSlug, MissingDataStrategy, RawRow, SeriesOptions};

    use super::*;

    fn slug(s: &str) -> ColumnSlug {
        ColumnSlug::new(s).unwrap()
    }

    fn entity(s: &str) -> EntityName {
        EntityName::new(s).unwrap()
    }

    fn energy_table() -> Table {
        let rows = vec![
            RawRow::new("France", 2000.0).with("coal", 1.0).with("gas", 2.0),
            RawRow::new("France", 2001.0).with("coal", 3.0),
            RawRow::new("Chad", 2000.0).with("coal", 5.0),
        ];
        let defs = vec![
            ColumnDef::numeric(slug("coal")).with_display_name("Coal"),
            ColumnDef::numeric(slug("gas")).with_color("#f00"),
        ];
        Table::from_raw_rows(&rows, defs).0
    }

    #[test]
    fn test_column_series_use_display_names_and_colors() {
        let config = StackConfig::new(vec![slug("coal"), slug("gas")])
            .with_entities(vec![entity("France")]);
        let chart = stack_series(&energy_table(), &config, StackLayout::Area).unwrap();
        assert_eq!(chart.series[0].series_name, "Coal");
        assert_eq!(chart.series[1].series_name, "gas");
        assert_eq!(chart.series[1].color.as_deref(), Some("#f00"));
        assert!(chart.series[1].points[1].is_fake);
        assert_eq!(chart.total_at(1), 3.0);
    }

    #[test]
    fn test_column_strategy_needs_one_entity() {
        let config = StackConfig::new(vec![slug("coal"), slug("gas")]);
        assert_eq!(
            stack_series(&energy_table(), &config, StackLayout::Bar),
            Err(ConfigurationError::AmbiguousEntity(2).into())
        );
    }

    #[test]
    fn test_discrete_bars_follow_caller_category_order() {
        let config = StackConfig::new(vec![slug("coal"), slug("gas")])
            .with_entities(vec![entity("France"), entity("Chad")])
            .with_options(SeriesOptions::new().with_end_time(2001).with_tolerance(1.0));
        let chart = stack_series(&energy_table(), &config, StackLayout::DiscreteBar).unwrap();
        assert_eq!(
            chart.positions,
            vec![
                Position::Category(entity("France")),
                Position::Category(entity("Chad"))
            ]
        );
        let coal = &chart.series[0].points;
        assert_eq!((coal[0].value, coal[0].time), (3.0, 2001));
        assert_eq!((coal[1].value, coal[1].time), (5.0, 2000));
        let gas = &chart.series[1].points;
        assert_eq!(gas[0].value_offset, 3.0);
        assert_eq!(gas[0].value, 2.0);
        assert!(gas[1].is_fake);
    }

    #[test]
    fn test_unknown_column_is_a_configuration_error() {
        let config = StackConfig::new(vec![slug("oil")]);
        assert_eq!(
            stack_series(&energy_table(), &config, StackLayout::Area),
            Err(ConfigurationError::UnknownColumn(slug("oil")).into())
        );
    }

    #[test]
    fn test_drop_strategy_removes_incomplete_series() {
        let config = StackConfig::new(vec![slug("coal"), slug("gas")])
            .with_entities(vec![entity("France")])
            .with_options(
                SeriesOptions::new().with_missing_data_strategy(MissingDataStrategy::Drop),
            );
        let chart = stack_series(&energy_table(), &config, StackLayout::Area).unwrap();
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].series_name, "Coal");
        assert_eq!(chart.positions, vec![Position::Time(2000), Position::Time(2001)]);
    }
}
