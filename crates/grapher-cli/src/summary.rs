//! Human-readable rendering of tables, ingestion reports and chart series.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use grapher_model::{Series, format_number};
use grapher_series::{ChartSeries, MapChart, ScatterChart, StackedChart};
use grapher_table::IngestReport;

pub fn render_series(series: &ChartSeries) -> String {
    match series {
        ChartSeries::Stacked(chart) => stacked_table(chart).to_string(),
        ChartSeries::Scatter(chart) => scatter_summary(chart),
        ChartSeries::Map(chart) => map_table(chart).to_string(),
        ChartSeries::Faceted(facets) => facets
            .iter()
            .map(|facet| match &facet.result {
                Ok(inner) => format!("Facet: {}\n{}", facet.name, render_series(inner)),
                Err(err) => format!("Facet: {}\n  {err}", facet.name),
            })
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn stacked_table(chart: &StackedChart) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Series"),
        header_cell("Position"),
        header_cell("Value"),
        header_cell("Offset"),
        header_cell("Note"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for series in &chart.series {
        add_series_rows(&mut table, series);
    }
    table
}

fn add_series_rows(table: &mut Table, series: &Series) {
    for point in &series.points {
        let note = if point.is_fake {
            dim_cell("no data")
        } else if point.is_interpolated {
            Cell::new("estimated").fg(Color::Yellow)
        } else {
            Cell::new("")
        };
        table.add_row(vec![
            Cell::new(&series.series_name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(point.position.to_string()),
            Cell::new(format_number(point.value)),
            dim_cell(format_number(point.value_offset)),
            note,
        ]);
    }
}

fn scatter_summary(chart: &ScatterChart) -> String {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Entity"),
        header_cell("Time"),
        header_cell("X"),
        header_cell("Y"),
        header_cell("Size"),
        header_cell("Color"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for series in &chart.series {
        for point in &series.points {
            table.add_row(vec![
                Cell::new(&series.series_name)
                    .fg(Color::Blue)
                    .add_attribute(Attribute::Bold),
                Cell::new(point.time),
                Cell::new(format!("{} ({})", format_number(point.x), point.x_time)),
                Cell::new(format!("{} ({})", format_number(point.y), point.y_time)),
                point
                    .size
                    .map_or_else(|| dim_cell("-"), |size| Cell::new(format_number(size))),
                point
                    .color
                    .as_ref()
                    .map_or_else(|| dim_cell("-"), |color| Cell::new(color.to_string())),
            ]);
        }
    }
    let excluded = &chart.excluded;
    format!(
        "{table}\nExcluded: {} without a match, {} outside the axis domain, {} non-positive on a log axis",
        excluded.no_match, excluded.outside_domain, excluded.non_positive_on_log_axis
    )
}

fn map_table(chart: &MapChart) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Entity"),
        header_cell("Value"),
        header_cell("Time"),
        header_cell("Bin"),
        header_cell("Color"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for entry in &chart.entries {
        let label = chart
            .scale
            .bin(entry.bin)
            .map_or("-", |bin| bin.label.as_str());
        table.add_row(vec![
            Cell::new(entry.entity.as_str())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            entry
                .value
                .map_or_else(|| dim_cell("-"), |value| Cell::new(format_number(value))),
            entry.time.map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(label),
            Cell::new(&entry.color),
        ]);
    }
    table
}

/// One row per column with its kind and value range over the whole table.
pub fn column_table(data: &grapher_table::Table) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Kind"),
        header_cell("Name"),
        header_cell("Values"),
        header_cell("Min"),
        header_cell("Max"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Right);
    for slug in data.column_slugs() {
        let Some(def) = data.column_def(slug.as_str()) else {
            continue;
        };
        let bound = |value: Option<f64>| value.map_or_else(|| dim_cell("-"), |v| Cell::new(format_number(v)));
        table.add_row(vec![
            Cell::new(slug.as_str())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(def.kind.as_str()),
            Cell::new(def.display_name()),
            Cell::new(data.num_values(slug.as_str()).unwrap_or(0)),
            bound(data.min(slug.as_str()).ok().flatten()),
            bound(data.max(slug.as_str()).ok().flatten()),
        ]);
    }
    table
}

/// Counts of the ingestion report, then every rejected row and invalid cell.
pub fn report_lines(report: &IngestReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Rows: {} read, {} accepted, {} rejected, {} duplicate keys, {} invalid cells",
        report.input_rows,
        report.accepted_rows,
        report.rejected_count(),
        report.duplicate_count(),
        report.invalid_cells.len()
    )];
    lines.extend(
        report
            .rejected
            .iter()
            .map(|row| format!("- row {}: {}", row.index, row.reason)),
    );
    lines.extend(
        report
            .duplicates
            .iter()
            .map(|key| format!("- duplicate key {key}")),
    );
    lines.extend(report.invalid_cells.iter().map(|cell| {
        format!(
            "- row {}: {:?} is not a valid {} value",
            cell.index, cell.raw, cell.slug
        )
    }));
    lines
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
