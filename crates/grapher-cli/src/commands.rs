use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use grapher_ingest::{load_table, read_chart_config};
use grapher_series::{ChartSeries, SeriesError, get_series};
use grapher_table::{IngestReport, Table};

use crate::cli::{DataArgs, InspectArgs, SeriesArgs};

/// Outcome of `grapher series`.
#[derive(Debug)]
pub struct SeriesRun {
    pub family: &'static str,
    pub report: IngestReport,
    /// `None` when the selection had nothing to draw.
    pub series: Option<ChartSeries>,
}

/// Outcome of `grapher inspect`.
#[derive(Debug)]
pub struct InspectRun {
    pub table: Table,
    pub report: IngestReport,
    pub preview: Option<String>,
}

pub fn run_series(args: &SeriesArgs) -> Result<SeriesRun> {
    let span = info_span!("series", config = %args.config.display());
    let _guard = span.enter();

    let (table, report) = load(&args.data)?;
    let config = read_chart_config(&args.config)
        .with_context(|| format!("read chart config {}", args.config.display()))?;
    let family = config.family();
    let series = match get_series(&table, &config) {
        Ok(series) => {
            info!(chart = family, series = series.len(), "derived chart series");
            Some(series)
        }
        Err(SeriesError::NoDisplayableData) => {
            warn!(chart = family, "no displayable data for this selection");
            None
        }
        Err(error) => return Err(error).context(format!("derive {family} series")),
    };
    Ok(SeriesRun {
        family,
        report,
        series,
    })
}

pub fn run_inspect(args: &InspectArgs) -> Result<InspectRun> {
    let (table, report) = load(&args.data)?;
    let preview = match args.preview {
        Some(rows) => {
            let frame = table.to_dataframe().context("convert table to data frame")?;
            Some(frame.head(Some(rows)).to_string())
        }
        None => None,
    };
    Ok(InspectRun {
        table,
        report,
        preview,
    })
}

/// Serialize the derived series (or `null`) as pretty JSON.
pub fn series_json(run: &SeriesRun) -> Result<String> {
    serde_json::to_string_pretty(&run.series).context("serialize series")
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn load(args: &DataArgs) -> Result<(Table, IngestReport)> {
    let (table, report) = load_table(&args.data, args.defs.as_deref(), args.time_unit.into())
        .with_context(|| format!("load {}", args.data.display()))?;
    info!(
        rows = table.row_count(),
        entities = table.entity_index().len(),
        columns = table.column_slugs().len(),
        "loaded table"
    );
    if !report.is_clean() {
        warn!(
            rejected = report.rejected_count(),
            duplicates = report.duplicate_count(),
            invalid_cells = report.invalid_cells.len(),
            "input rows were adjusted during ingestion"
        );
    }
    Ok((table, report))
}
