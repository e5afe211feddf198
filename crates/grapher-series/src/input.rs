//! Request validation and column access shared by every engine.

use grapher_model::{CellValue, ColumnSlug, SeriesOptions, Time};
use grapher_table::{ColumnView, Table};

use crate::error::{ConfigurationError, Result, SeriesError};

/// The resolved active time range, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TimeWindow {
    pub start: Time,
    pub end: Time,
    /// Whether the caller set a start time explicitly.
    pub explicit_start: bool,
}

impl TimeWindow {
    pub fn contains(&self, time: Time) -> bool {
        (self.start..=self.end).contains(&time)
    }
}

/// Check the options that do not depend on the chart family and resolve
/// the active time range against `table`.
pub(crate) fn validate_options(table: &Table, options: &SeriesOptions) -> Result<TimeWindow> {
    check_parameters(options)?;
    let (min, max) = table.time_domain().ok_or(SeriesError::NoDisplayableData)?;
    if let Some(end) = options.end_time
        && !(min..=max).contains(&end)
    {
        return Err(ConfigurationError::TimeOutsideDomain {
            field: "end time",
            time: end,
            min,
            max,
        }
        .into());
    }
    let start = options.start_time.unwrap_or(min).max(min);
    let end = options.end_time.unwrap_or(max);
    if start > end {
        return Err(ConfigurationError::InvertedTimeRange { start, end }.into());
    }
    Ok(TimeWindow {
        start,
        end,
        explicit_start: options.start_time.is_some(),
    })
}

/// Table-independent parameter checks.
pub(crate) fn check_parameters(options: &SeriesOptions) -> std::result::Result<(), ConfigurationError> {
    if !options.tolerance.is_finite() || options.tolerance < 0.0 {
        return Err(ConfigurationError::InvalidTolerance(options.tolerance));
    }
    if options.color_scale_bin_count <= 0 {
        return Err(ConfigurationError::InvalidBinCount(
            options.color_scale_bin_count,
        ));
    }
    if let Some(edges) = &options.custom_bin_edges {
        let finite = edges.iter().all(|edge| edge.is_finite());
        let increasing = edges.windows(2).all(|pair| pair[0] < pair[1]);
        if edges.len() < 2 || !finite || !increasing {
            return Err(ConfigurationError::InvalidBinEdges(edges.clone()));
        }
    }
    if let (Some(start), Some(end)) = (options.start_time, options.end_time)
        && start > end
    {
        return Err(ConfigurationError::InvertedTimeRange { start, end });
    }
    Ok(())
}

/// Fail unless `slug` names a numeric column of `table`.
pub(crate) fn require_numeric(table: &Table, slug: &ColumnSlug) -> Result<()> {
    let def = table
        .column_def(slug.as_str())
        .ok_or_else(|| ConfigurationError::UnknownColumn(slug.clone()))?;
    if !def.kind.is_numeric() {
        return Err(ConfigurationError::NotNumeric {
            slug: slug.clone(),
            kind: def.kind,
        }
        .into());
    }
    Ok(())
}

/// Fail unless `slug` names any column of `table`.
pub(crate) fn require_column(table: &Table, slug: &ColumnSlug) -> Result<()> {
    if table.has_column(slug.as_str()) {
        Ok(())
    } else {
        Err(ConfigurationError::UnknownColumn(slug.clone()).into())
    }
}

/// A plotted column, read through the configured transform if there is one.
/// Relative transforms without bounds are taken over `window`.
pub(crate) fn metric_view(
    table: &Table,
    slug: &ColumnSlug,
    options: &SeriesOptions,
    window: TimeWindow,
) -> Result<ColumnView> {
    let view = match &options.transform {
        Some(kind) => {
            let kind = kind.within_time_range(window.start, window.end);
            table.derived_view(slug.as_str(), &kind)?
        }
        None => table.column_view(slug.as_str())?,
    };
    Ok(view)
}

/// The matching tolerance for `slug`: the request's tolerance, or the
/// column's own default when the request leaves it at zero.
pub(crate) fn tolerance_for(table: &Table, slug: &ColumnSlug, options: &SeriesOptions) -> f64 {
    if options.tolerance > 0.0 {
        return options.tolerance;
    }
    table
        .column_def(slug.as_str())
        .and_then(|def| def.tolerance)
        .filter(|tolerance| tolerance.is_finite() && *tolerance > 0.0)
        .unwrap_or(0.0)
}

/// Latest present cell at or before `target` and no more than `tolerance`
/// before it, among `rows` (view rows of one entity, sorted by time).
pub(crate) fn match_at<'a>(
    table: &Table,
    view: &'a ColumnView,
    rows: &[usize],
    target: Time,
    tolerance: f64,
) -> Option<(&'a CellValue, Time)> {
    for &row in rows.iter().rev() {
        let time = table.time(row);
        if time > target {
            continue;
        }
        if (target - time) as f64 > tolerance {
            return None;
        }
        let cell = view.get(row);
        if cell.is_present() {
            return Some((cell, time));
        }
    }
    None
}

/// Numeric form of [`match_at`].
pub(crate) fn match_number_at(
    table: &Table,
    view: &ColumnView,
    rows: &[usize],
    target: Time,
    tolerance: f64,
) -> Option<(f64, Time)> {
    match_at(table, view, rows, target, tolerance)
        .and_then(|(cell, time)| cell.as_f64().map(|value| (value, time)))
}
