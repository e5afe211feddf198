use grapher_model::{
    BinRef, BinningStrategy, ColorScale, ColorScaleConfig, ColumnDef, ColumnSlug, RawRow,
    SeriesOptions,
};
use grapher_series::{SeriesError, assign_bin, build_color_scale, map_series};
use grapher_table::Table;
use proptest::prelude::*;

fn slug(s: &str) -> ColumnSlug {
    ColumnSlug::new(s).unwrap()
}

fn config() -> ColorScaleConfig {
    ColorScaleConfig::new(slug("gdp"))
}

fn containing(scale: &ColorScale, value: f64) -> Vec<usize> {
    let last = scale.bins.len() - 1;
    scale
        .bins
        .iter()
        .enumerate()
        .filter(|(idx, bin)| value >= bin.min && (value < bin.max || (*idx == last && value == bin.max)))
        .map(|(idx, _)| idx)
        .collect()
}

#[test]
fn test_bin_labels() {
    let scale = build_color_scale(&[3.0, 41.0, 97.0], &config()).unwrap();
    let labels: Vec<&str> = scale
        .bins
        .iter()
        .chain(std::iter::once(&scale.no_data))
        .map(|bin| bin.label.as_str())
        .collect();
    insta::assert_snapshot!(labels.join("\n"), @r"
    0 – 20
    20 – 40
    40 – 60
    60 – 80
    80 – 100
    No data
    ");
}

#[test]
fn test_map_uses_latest_value_within_tolerance() {
    let rows = vec![
        RawRow::new("Chad", 2000.0).with("gdp", 5.0),
        RawRow::new("Chad", 2002.0).with("gdp", 50.0),
        RawRow::new("Mali", 1998.0).with("gdp", 90.0),
        RawRow::new("Niger", 2002.0),
    ];
    let table = Table::from_raw_rows(&rows, vec![ColumnDef::numeric(slug("gdp"))]).0;
    let config = config().with_options(SeriesOptions::new().with_tolerance(1.0));
    let chart = map_series(&table, &config).unwrap();

    let entries: Vec<(&str, Option<f64>, Option<i64>)> = chart
        .entries
        .iter()
        .map(|e| (e.entity.as_str(), e.value, e.time))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("Chad", Some(50.0), Some(2002)),
            ("Mali", None, None),
            ("Niger", None, None),
        ]
    );
    assert_eq!(chart.entries[1].bin, BinRef::NoData);
    assert_eq!(chart.entries[1].color, chart.scale.no_data.color);
    let chad = chart.scale.bin(chart.entries[0].bin).unwrap();
    assert!(chad.min <= 50.0 && 50.0 < chad.max);
}

#[test]
fn test_map_without_any_value_has_no_displayable_data() {
    let rows = vec![
        RawRow::new("Chad", 2000.0).with("gdp", 5.0),
        RawRow::new("Chad", 2010.0),
    ];
    let table = Table::from_raw_rows(&rows, vec![ColumnDef::numeric(slug("gdp"))]).0;
    assert_eq!(map_series(&table, &config()), Err(SeriesError::NoDisplayableData));
}

#[test]
fn test_map_quantiles_count_each_row_once() {
    let mut rows = Vec::new();
    for (i, name) in ["Chad", "Mali", "Niger", "Togo"].iter().enumerate() {
        let v = i as f64 + 1.0;
        rows.push(RawRow::new(*name, 2000.0).with("gdp", v));
        rows.push(RawRow::new(*name, 2001.0).with("gdp", v + 4.0));
    }
    let table = Table::from_raw_rows(&rows, vec![ColumnDef::numeric(slug("gdp"))]).0;
    let cfg = config()
        .with_binning_strategy(BinningStrategy::Quantile)
        .with_options(SeriesOptions::new().with_bin_count(2).with_end_time(2001));
    let chart = map_series(&table, &cfg).unwrap();
    let bins: Vec<(f64, f64)> = chart.scale.bins.iter().map(|b| (b.min, b.max)).collect();
    assert_eq!(bins, vec![(1.0, 5.0), (5.0, 8.0)]);
}

#[test]
fn test_map_domain_includes_match_before_window() {
    let rows = vec![
        RawRow::new("Chad", 1999.0).with("gdp", 100.0),
        RawRow::new("Chad", 2001.0),
        RawRow::new("Mali", 2001.0).with("gdp", 10.0),
    ];
    let table = Table::from_raw_rows(&rows, vec![ColumnDef::numeric(slug("gdp"))]).0;
    let cfg = config().with_options(
        SeriesOptions::new()
            .with_time_range(Some(2001), Some(2001))
            .with_tolerance(2.0),
    );
    let chart = map_series(&table, &cfg).unwrap();
    assert_eq!(chart.entries[0].value, Some(100.0));
    let last = chart.scale.bins.last().unwrap();
    assert!(last.max >= 100.0);
}

#[test]
fn test_custom_palette_and_no_data_color() {
    let mut cfg = config().with_colors(vec!["#111".into(), "#999".into()]);
    cfg.no_data_color = Some("#fff".into());
    let cfg = cfg.with_options(SeriesOptions::new().with_custom_bin_edges(vec![0.0, 1.0, 2.0]));
    let scale = build_color_scale(&[], &cfg).unwrap();
    let colors: Vec<&str> = scale.bins.iter().map(|b| b.color.as_str()).collect();
    assert_eq!(colors, vec!["#111", "#999"]);
    assert_eq!(scale.no_data.color, "#fff");
}

fn any_binning() -> impl Strategy<Value = BinningStrategy> {
    prop_oneof![
        Just(BinningStrategy::EqualInterval),
        Just(BinningStrategy::Quantile),
    ]
}

proptest! {
    #[test]
    fn test_every_value_in_domain_has_exactly_one_bin(
        values in proptest::collection::vec(-1.0e4f64..1.0e4, 1..60),
        count in 1i64..12,
        binning in any_binning(),
    ) {
        let cfg = config()
            .with_binning_strategy(binning)
            .with_options(SeriesOptions::new().with_bin_count(count));
        let scale = build_color_scale(&values, &cfg).unwrap();
        prop_assert!(!scale.bins.is_empty());
        for pair in scale.bins.windows(2) {
            prop_assert_eq!(pair[0].max, pair[1].min);
            prop_assert!(pair[0].min < pair[0].max);
        }
        for &value in &values {
            let hits = containing(&scale, value);
            prop_assert_eq!(hits.len(), 1, "value {} in bins {:?}", value, hits);
            prop_assert_eq!(assign_bin(&scale, Some(value), &cfg), BinRef::Numeric(hits[0]));
        }
    }

    #[test]
    fn test_out_of_domain_values_use_dedicated_bins_or_clamp(
        values in proptest::collection::vec(-200.0f64..200.0, 1..40),
        dedicated in any::<bool>(),
    ) {
        let cfg = config().with_domain(Some(-100.0), Some(100.0), dedicated);
        let scale = build_color_scale(&values, &cfg).unwrap();
        let last = scale.bins.len() - 1;
        for &value in &values {
            let bin = assign_bin(&scale, Some(value), &cfg);
            let expected = match (value < -100.0, value > 100.0, dedicated) {
                (true, _, true) => BinRef::BelowDomain,
                (_, true, true) => BinRef::AboveDomain,
                (true, _, false) => BinRef::Numeric(0),
                (_, true, false) => BinRef::Numeric(last),
                _ => BinRef::Numeric(containing(&scale, value)[0]),
            };
            prop_assert_eq!(bin, expected);
        }
    }
}
