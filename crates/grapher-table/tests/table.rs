use std::sync::Arc;
use std::thread;

use grapher_model::{CellValue, ColumnDef, ColumnSlug, ColumnSource, RawRow};
use grapher_table::{RelativeMode, Table, TransformError, TransformKind};
use proptest::prelude::*;

fn slug(s: &str) -> ColumnSlug {
    ColumnSlug::new(s).unwrap()
}

fn per_capita_table() -> Table {
    let rows = vec![
        RawRow::new("A", 2000.0)
            .with("deaths", 500.0)
            .with("population", 1_000_000.0),
        RawRow::new("A", 2001.0).with("deaths", 300.0),
    ];
    let defs = vec![
        ColumnDef::numeric(slug("deaths")),
        ColumnDef::numeric(slug("population")),
    ];
    Table::from_raw_rows(&rows, defs).0
}

#[test]
fn test_per_capita_divides_and_keeps_missing() {
    let table = per_capita_table();
    let view = table
        .derived_view("deaths", &TransformKind::per_capita(slug("population")))
        .unwrap();
    assert_eq!(view.numbers(), vec![Some(0.0005), None]);
    assert!(view.column().source().is_derived());
}

#[test]
fn test_ratio_with_zero_denominator_is_missing() {
    let rows = vec![
        RawRow::new("A", 2000.0).with("a", 1.0).with("b", 0.0),
        RawRow::new("A", 2001.0).with("a", 0.0).with("b", 2.0),
    ];
    let defs = vec![ColumnDef::numeric(slug("a")), ColumnDef::numeric(slug("b"))];
    let (table, _) = Table::from_raw_rows(&rows, defs);
    let view = table
        .derived_view("a", &TransformKind::ratio(slug("b"), 100.0))
        .unwrap();
    assert_eq!(view.numbers(), vec![None, Some(0.0)]);
}

#[test]
fn test_derived_columns_are_reference_stable() {
    let table = per_capita_table();
    let kind = TransformKind::interpolate(2.0);
    let first = table.derive("deaths", &kind).unwrap();
    let second = table.derive("deaths", &TransformKind::interpolate(2.000_000_01)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    let by_slug = table.get("deaths-interpolated-2").unwrap();
    assert!(Arc::ptr_eq(&first, &by_slug));
    assert_eq!(table.cache_entries().len(), 1);
    assert_eq!(
        first.source(),
        &ColumnSource::Derived(grapher_model::TransformId::new("interpolate(tolerance=2)"))
    );
}

#[test]
fn test_transform_errors_stay_local() {
    let table = per_capita_table();
    let err = table
        .derive("deaths", &TransformKind::per_capita(slug("nope")))
        .unwrap_err();
    assert_eq!(err, TransformError::UnknownColumn("nope".to_string()));
    assert!(table.cache_entries().is_empty());
    assert!(table.derive("deaths", &TransformKind::LogSafe).is_ok());
    assert_eq!(table.num_values("deaths").unwrap(), 2);
}

#[test]
fn test_non_numeric_source_is_rejected() {
    let rows = vec![RawRow::new("A", 2000.0).with("region", "Europe")];
    let (table, _) = Table::from_raw_rows(&rows, Vec::new());
    let err = table.derive("region", &TransformKind::LogSafe).unwrap_err();
    assert!(matches!(err, TransformError::NotNumeric { .. }));
}

#[test]
fn test_relative_to_first_follows_active_range() {
    let rows: Vec<RawRow> = (2000..2004)
        .map(|year| RawRow::new("A", year as f64).with("v", (year - 1999) as f64))
        .collect();
    let (table, _) = Table::from_raw_rows(&rows, vec![ColumnDef::numeric(slug("v"))]);
    let full = table
        .derived_view("v", &TransformKind::relative_to_first(2000, 2003, RelativeMode::Ratio))
        .unwrap();
    let later = table
        .derived_view("v", &TransformKind::relative_to_first(2001, 2003, RelativeMode::Ratio))
        .unwrap();
    assert_eq!(full.number(3), Some(4.0));
    assert_eq!(later.number(3), Some(2.0));
    assert_eq!(later.number(0), None);
}

#[test]
fn test_filtering_never_touches_parent_arrays() {
    let table = per_capita_table();
    let before = table.get("deaths").unwrap();
    let filtered = table.filter_by_time_range(2001, 2001);
    let derived = filtered.derive("deaths", &TransformKind::LogSafe).unwrap();
    assert!(before.shares_values_with(&filtered.get("deaths").unwrap()));
    assert!(!derived.shares_values_with(&before));
    assert_eq!(table.value_at("deaths", "A", 2000).unwrap(), CellValue::Number(500.0));
    assert!(table.get("deaths-log-safe").is_err());
}

#[test]
fn test_views_are_shareable_across_threads() {
    let table = per_capita_table();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let table = table.clone();
            thread::spawn(move || table.derive("deaths", &TransformKind::LogSafe).unwrap())
        })
        .collect();
    let columns: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(columns.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
}

proptest! {
    #[test]
    fn test_interpolation_never_extrapolates(
        cells in prop::collection::vec(prop::option::of(-1000.0f64..1000.0), 1..20),
        tolerance in 0.0f64..10.0,
    ) {
        let rows: Vec<RawRow> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let row = RawRow::new("A", (2000 + i) as f64);
                match cell {
                    Some(v) => row.with("v", *v),
                    None => row,
                }
            })
            .collect();
        let (table, _) = Table::from_raw_rows(&rows, vec![ColumnDef::numeric(slug("v"))]);
        let view = table.derived_view("v", &TransformKind::interpolate(tolerance)).unwrap();
        let first = cells.iter().position(Option::is_some);
        let last = cells.iter().rposition(Option::is_some);
        for (i, cell) in cells.iter().enumerate() {
            match cell {
                Some(v) => prop_assert_eq!(view.number(i), Some(*v)),
                None => {
                    let inside = matches!((first, last), (Some(f), Some(l)) if f < i && i < l);
                    if !inside {
                        prop_assert_eq!(view.number(i), None);
                    }
                }
            }
        }
    }
}
