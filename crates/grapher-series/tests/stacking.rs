use grapher_model::{
    ColumnDef, ColumnSlug, EntityName, MissingDataStrategy, Position, RawRow, RelativeMode,
    SeriesOptions, StackConfig, StackMode, TransformKind,
};
use grapher_series::{SeriesError, StackLayout, stack_series};
use grapher_table::Table;
use proptest::prelude::*;

const ENTITIES: [&str; 3] = ["A", "B", "C"];
const TIMES: [i64; 4] = [2000, 2001, 2002, 2003];

fn slug(s: &str) -> ColumnSlug {
    ColumnSlug::new(s).unwrap()
}

fn entities(names: &[&str]) -> Vec<EntityName> {
    names.iter().map(|n| EntityName::new(*n).unwrap()).collect()
}

fn abc_table() -> Table {
    let rows = vec![
        RawRow::new("A", 2000.0).with("v", 1.0),
        RawRow::new("A", 2001.0).with("v", 2.0),
        RawRow::new("B", 2000.0).with("v", 3.0),
        RawRow::new("B", 2001.0).with("v", 4.0),
        RawRow::new("C", 2000.0),
        RawRow::new("C", 2001.0).with("v", 5.0),
    ];
    Table::from_raw_rows(&rows, vec![ColumnDef::numeric(slug("v"))]).0
}

fn abc_config(strategy: MissingDataStrategy) -> StackConfig {
    StackConfig::new(vec![slug("v")])
        .with_entities(entities(&ENTITIES))
        .with_options(SeriesOptions::new().with_missing_data_strategy(strategy))
}

fn bands(chart: &grapher_series::StackedChart, idx: usize) -> Vec<(f64, f64, bool)> {
    chart
        .series
        .iter()
        .map(|s| {
            let point = &s.points[idx];
            (point.value_offset, point.top(), point.is_fake)
        })
        .collect()
}

#[test]
fn test_basic_stacking_offsets() {
    let chart = stack_series(
        &abc_table(),
        &abc_config(MissingDataStrategy::Zero),
        StackLayout::Area,
    )
    .unwrap();
    assert_eq!(chart.positions, vec![Position::Time(2000), Position::Time(2001)]);
    assert_eq!(
        bands(&chart, 0),
        vec![(0.0, 1.0, false), (1.0, 4.0, false), (4.0, 4.0, true)]
    );
    assert_eq!(
        bands(&chart, 1),
        vec![(0.0, 2.0, false), (2.0, 6.0, false), (6.0, 11.0, false)]
    );
}

#[test]
fn test_drop_strategy_removes_entity_with_a_gap() {
    let chart = stack_series(
        &abc_table(),
        &abc_config(MissingDataStrategy::Drop),
        StackLayout::Bar,
    )
    .unwrap();
    let names: Vec<&str> = chart.series.iter().map(|s| s.series_name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(chart.total_at(1), 6.0);
}

#[test]
fn test_interpolate_strategy_fills_between_neighbours() {
    let rows = vec![
        RawRow::new("A", 2000.0).with("v", 2.0),
        RawRow::new("A", 2002.0).with("v", 6.0),
        RawRow::new("B", 2001.0).with("v", 1.0),
    ];
    let table = Table::from_raw_rows(&rows, vec![ColumnDef::numeric(slug("v"))]).0;
    let config = StackConfig::new(vec![slug("v")]).with_options(
        SeriesOptions::new().with_missing_data_strategy(MissingDataStrategy::Interpolate),
    );
    let chart = stack_series(&table, &config, StackLayout::Area).unwrap();
    let a = &chart.series[0].points[1];
    assert_eq!(a.value, 4.0);
    assert!(a.is_interpolated);
    let b = &chart.series[1].points[0];
    assert!(b.is_fake);
}

#[test]
fn test_stack_order_follows_caller() {
    let config = abc_config(MissingDataStrategy::Zero).with_entities(entities(&["C", "A", "B"]));
    let chart = stack_series(&abc_table(), &config, StackLayout::Area).unwrap();
    let names: Vec<&str> = chart.series.iter().map(|s| s.series_name.as_str()).collect();
    assert_eq!(names, vec!["C", "A", "B"]);
    assert_eq!(chart.series[1].points[1].value_offset, 5.0);
}

#[test]
fn test_relative_mode_with_all_zero_total() {
    let rows = vec![
        RawRow::new("A", 2000.0).with("v", 0.0),
        RawRow::new("B", 2000.0).with("v", 0.0),
        RawRow::new("A", 2001.0).with("v", 1.0),
        RawRow::new("B", 2001.0).with("v", 3.0),
    ];
    let table = Table::from_raw_rows(&rows, vec![ColumnDef::numeric(slug("v"))]).0;
    let config = StackConfig::new(vec![slug("v")])
        .with_options(SeriesOptions::new().with_stack_mode(StackMode::Relative));
    let chart = stack_series(&table, &config, StackLayout::Area).unwrap();
    let at_2000: Vec<f64> = chart.series.iter().map(|s| s.points[0].value).collect();
    assert_eq!(at_2000, vec![0.0, 0.0]);
    let at_2001: Vec<f64> = chart.series.iter().map(|s| s.points[1].value).collect();
    assert_eq!(at_2001, vec![25.0, 75.0]);
}

#[test]
fn test_time_range_limits_positions() {
    let config = abc_config(MissingDataStrategy::Zero)
        .with_options(SeriesOptions::new().with_time_range(Some(2001), Some(2001)));
    let chart = stack_series(&abc_table(), &config, StackLayout::Area).unwrap();
    assert_eq!(chart.positions, vec![Position::Time(2001)]);
}

#[test]
fn test_transform_is_applied_to_stacked_column() {
    let rows = vec![
        RawRow::new("A", 2000.0).with("v", 10.0).with("pop", 2.0),
        RawRow::new("A", 2001.0).with("v", 30.0).with("pop", 3.0),
    ];
    let defs = vec![ColumnDef::numeric(slug("v")), ColumnDef::numeric(slug("pop"))];
    let table = Table::from_raw_rows(&rows, defs).0;
    let config = StackConfig::new(vec![slug("v")]).with_options(
        SeriesOptions::new().with_transform(TransformKind::per_capita(slug("pop"))),
    );
    let chart = stack_series(&table, &config, StackLayout::Bar).unwrap();
    let values: Vec<f64> = chart.series[0].points.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![5.0, 10.0]);
    assert_eq!(table.cache_entries().len(), 1);
}

#[test]
fn test_relative_transform_follows_start_time() {
    let rows: Vec<RawRow> = [(2000, 10.0), (2001, 20.0), (2002, 40.0)]
        .iter()
        .map(|&(year, v)| RawRow::new("A", year as f64).with("v", v))
        .collect();
    let table = Table::from_raw_rows(&rows, vec![ColumnDef::numeric(slug("v"))]).0;
    let values = |start: i64| {
        let config = StackConfig::new(vec![slug("v")]).with_options(
            SeriesOptions::new()
                .with_time_range(Some(start), Some(2002))
                .with_transform(TransformKind::relative_to_first_in_range(RelativeMode::Ratio)),
        );
        let chart = stack_series(&table, &config, StackLayout::Area).unwrap();
        chart.series[0]
            .points
            .iter()
            .map(|p| (p.time, p.value))
            .collect::<Vec<_>>()
    };
    assert_eq!(values(2001), vec![(2001, 1.0), (2002, 2.0)]);
    assert_eq!(values(2000), vec![(2000, 1.0), (2001, 2.0), (2002, 4.0)]);
}

#[test]
fn test_empty_selection_has_no_displayable_data() {
    let config = abc_config(MissingDataStrategy::Zero).with_entities(entities(&["Z"]));
    assert_eq!(
        stack_series(&abc_table(), &config, StackLayout::Area),
        Err(SeriesError::NoDisplayableData)
    );
}

fn grid_table(values: &[Option<f64>]) -> Table {
    let mut rows = Vec::new();
    for (e, entity) in ENTITIES.iter().enumerate() {
        for (t, time) in TIMES.iter().enumerate() {
            let mut row = RawRow::new(*entity, *time as f64);
            if let Some(v) = values[e * TIMES.len() + t] {
                row = row.with("v", v);
            }
            rows.push(row);
        }
    }
    Table::from_raw_rows(&rows, vec![ColumnDef::numeric(slug("v"))]).0
}

fn any_strategy() -> impl Strategy<Value = MissingDataStrategy> {
    prop_oneof![
        Just(MissingDataStrategy::Zero),
        Just(MissingDataStrategy::Drop),
        Just(MissingDataStrategy::Interpolate),
        Just(MissingDataStrategy::CarryForward),
    ]
}

proptest! {
    #[test]
    fn test_offsets_accumulate_lower_series(
        values in proptest::collection::vec(proptest::option::of(-50.0f64..100.0), 12),
        strategy in any_strategy(),
    ) {
        let table = grid_table(&values);
        let config = StackConfig::new(vec![slug("v")])
            .with_options(SeriesOptions::new().with_missing_data_strategy(strategy));
        match stack_series(&table, &config, StackLayout::Area) {
            Ok(chart) => {
                for idx in 0..chart.positions.len() {
                    let mut below = 0.0;
                    for series in &chart.series {
                        prop_assert_eq!(series.points.len(), chart.positions.len());
                        let point = &series.points[idx];
                        prop_assert!((point.value_offset - below).abs() < 1e-9);
                        below += point.value;
                    }
                    let drawn: f64 = chart.series.iter().map(|s| s.points[idx].value).sum();
                    prop_assert!((drawn - chart.total_at(idx)).abs() < 1e-9);
                }
            }
            Err(err) => prop_assert!(err.is_no_data()),
        }
    }

    #[test]
    fn test_relative_positions_sum_to_hundred_or_zero(
        values in proptest::collection::vec(proptest::option::of(0.0f64..100.0), 12),
    ) {
        let table = grid_table(&values);
        let config = StackConfig::new(vec![slug("v")])
            .with_options(SeriesOptions::new().with_stack_mode(StackMode::Relative));
        match stack_series(&table, &config, StackLayout::Area) {
            Ok(chart) => {
                for idx in 0..chart.positions.len() {
                    let sum: f64 = chart.series.iter().map(|s| s.points[idx].value).sum();
                    prop_assert!(
                        (sum - 100.0).abs() < 1e-6 || sum == 0.0,
                        "position {} sums to {}",
                        idx,
                        sum
                    );
                    for series in &chart.series {
                        prop_assert!(series.points[idx].value.is_finite());
                    }
                }
            }
            Err(err) => {
                prop_assert!(err.is_no_data());
                prop_assert!(values.iter().all(Option::is_none));
            }
        }
    }
}
