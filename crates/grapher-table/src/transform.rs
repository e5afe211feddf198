//! Derived-column computations.
//!
//! Each [`TransformKind`] maps one numeric source column (and, for ratios, a
//! second column) to a new column over the rows of the requesting view.
//! Results are memoized per view; see [`Table::derive`].
//!
//! # Semantics
//!
//! - **Interpolate**: a Missing cell between two present cells of the same
//!   entity is filled linearly when the two neighbours are at most
//!   `tolerance` time units apart. Cells before the first or after the last
//!   present cell of an entity stay Missing.
//! - **RollingAverage**: trailing mean over the cell and up to `window - 1`
//!   preceding *present* cells of the same entity, Missing when fewer than
//!   `min_count` cells are available.
//! - **Ratio**: `source / denominator * multiplier`, Missing on a Missing
//!   or zero denominator.
//! - **RelativeToFirst**: each cell relative to the entity's first present
//!   cell inside `[start, end]`; Missing outside that range. A missing
//!   bound is taken from the view's time domain.
//! - **LogSafe**: non-positive cells become Missing.

use std::sync::Arc;

use grapher_model::{
    CellValue, ColumnDef, ColumnKind, ColumnSlug, ColumnSource, RelativeMode, Time, TransformId,
    TransformKind, format_number,
};
use tracing::{debug, trace};

use crate::cache::TransformKey;
use crate::column::{Column, ColumnView};
use crate::error::{Result, TransformError};
use crate::table::Table;

/// Transform parameters in hashable form; floats are quantized to 1e-6.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum TransformParams {
    Interpolate(i64),
    RollingAverage(usize, usize),
    Ratio(ColumnSlug, i64),
    RelativeToFirst(Time, Time, RelativeMode),
    LogSafe,
}

const PARAM_SCALE: f64 = 1e6;

fn quantize(value: f64) -> i64 {
    (value * PARAM_SCALE).round() as i64
}

fn dequantize(value: i64) -> f64 {
    value as f64 / PARAM_SCALE
}

/// Check a transform's parameters and normalize them for cache keying.
fn normalize(kind: &TransformKind) -> Result<TransformParams> {
    let name = kind.name();
    match kind {
        TransformKind::Interpolate { tolerance } => {
            if !tolerance.is_finite() || *tolerance < 0.0 {
                return Err(TransformError::invalid(
                    name,
                    format!("tolerance must be a non-negative number, got {tolerance}"),
                ));
            }
            Ok(TransformParams::Interpolate(quantize(*tolerance)))
        }
        TransformKind::RollingAverage { window, min_count } => {
            if *window == 0 {
                return Err(TransformError::invalid(name, "window must be at least 1"));
            }
            if min_count > window {
                return Err(TransformError::invalid(
                    name,
                    format!("min count {min_count} exceeds window {window}"),
                ));
            }
            Ok(TransformParams::RollingAverage(*window, *min_count))
        }
        TransformKind::Ratio {
            denominator,
            multiplier,
        } => {
            if !multiplier.is_finite() {
                return Err(TransformError::invalid(
                    name,
                    format!("multiplier must be finite, got {multiplier}"),
                ));
            }
            Ok(TransformParams::Ratio(
                denominator.clone(),
                quantize(*multiplier),
            ))
        }
        TransformKind::RelativeToFirst { start, end, mode } => {
            let (start, end) = (start.unwrap_or(Time::MIN), end.unwrap_or(Time::MAX));
            if start > end {
                return Err(TransformError::invalid(
                    name,
                    format!("start {start} is after end {end}"),
                ));
            }
            Ok(TransformParams::RelativeToFirst(start, end, *mode))
        }
        TransformKind::LogSafe => Ok(TransformParams::LogSafe),
    }
}

fn derived_slug(source: &ColumnSlug, params: &TransformParams) -> Result<ColumnSlug> {
    let slug = match params {
        TransformParams::Interpolate(tolerance) => {
            format!("{source}-interpolated-{}", format_number(dequantize(*tolerance)))
        }
        TransformParams::RollingAverage(window, min_count) => {
            format!("{source}-rolling-{window}-{min_count}")
        }
        TransformParams::Ratio(denominator, multiplier) if *multiplier == quantize(1.0) => {
            format!("{source}-per-{denominator}")
        }
        TransformParams::Ratio(denominator, multiplier) => format!(
            "{source}-per-{denominator}-x{}",
            format_number(dequantize(*multiplier))
        ),
        TransformParams::RelativeToFirst(start, end, RelativeMode::Ratio) => {
            format!("{source}-relative-{start}-{end}")
        }
        TransformParams::RelativeToFirst(start, end, RelativeMode::PercentChange) => {
            format!("{source}-change-{start}-{end}")
        }
        TransformParams::LogSafe => format!("{source}-log-safe"),
    };
    ColumnSlug::new(slug.clone())
        .map_err(|_| TransformError::invalid("derive", format!("invalid derived slug {slug:?}")))
}

impl Table {
    /// Compute (or fetch from this view's cache) a derived column.
    ///
    /// Requesting the same transform of the same column twice on one view
    /// returns the same `Arc`. The result is also reachable through
    /// [`Table::get`] under its derived slug, e.g. `gdp-interpolated-2`.
    ///
    /// Errors are returned to the caller and never cached; other columns of
    /// the table are unaffected.
    pub fn derive(&self, slug: &str, kind: &TransformKind) -> Result<Arc<Column>> {
        let source = self.numeric_column(slug)?;
        let (min, max) = self.time_domain().unwrap_or((0, 0));
        let kind = &kind.within_time_range(min, max);
        let params = normalize(kind)?;
        let key = TransformKey {
            row_set: self.row_set,
            source: source.slug().clone(),
            params,
        };
        if let Some(hit) = self.cache.get(&key) {
            trace!(slug, transform = %kind, "derived column cache hit");
            return Ok(hit);
        }

        let derived_slug = derived_slug(source.slug(), &key.params)?;
        debug!(
            slug,
            derived = %derived_slug,
            transform = %kind,
            rows = self.row_count(),
            "computing derived column"
        );
        let (values, interpolated) = match kind {
            TransformKind::Interpolate { tolerance } => self.interpolate(&source, *tolerance),
            TransformKind::RollingAverage { window, min_count } => {
                (self.rolling_average(&source, *window, *min_count), None)
            }
            TransformKind::Ratio {
                denominator,
                multiplier,
            } => {
                let denominator = self.numeric_column(denominator.as_str())?;
                (self.ratio(&source, &denominator, *multiplier), None)
            }
            TransformKind::RelativeToFirst { start, end, mode } => (
                self.relative_to_first(
                    &source,
                    start.unwrap_or(min),
                    end.unwrap_or(max),
                    *mode,
                ),
                None,
            ),
            TransformKind::LogSafe => (self.log_safe(&source), None),
        };

        let def = derived_def(source.def(), derived_slug, kind);
        let id = TransformId::new(kind.to_string());
        let column = Column::derived(def, values, interpolated, ColumnSource::Derived(id));
        Ok(self.cache.insert(key, kind, column))
    }

    /// [`Table::derive`], read through this view's row order.
    pub fn derived_view(&self, slug: &str, kind: &TransformKind) -> Result<ColumnView> {
        Ok(self.view_of(self.derive(slug, kind)?))
    }

    /// A raw column, or a derived one already computed on this view.
    fn numeric_column(&self, slug: &str) -> Result<Arc<Column>> {
        let column = self.get(slug)?;
        if !column.kind().is_numeric() {
            return Err(TransformError::NotNumeric {
                slug: column.slug().clone(),
                kind: column.kind(),
            });
        }
        Ok(column)
    }

    fn blank(&self) -> Vec<CellValue> {
        vec![CellValue::Missing; self.store.entities.len()]
    }

    fn interpolate(&self, source: &Column, tolerance: f64) -> (Vec<CellValue>, Option<Vec<bool>>) {
        let mut values = self.blank();
        let mut flags = vec![false; values.len()];
        for (_, rows) in self.index.iter() {
            let present: Vec<(Time, f64)> = rows
                .iter()
                .filter_map(|&row| {
                    let physical = self.physical(row);
                    source
                        .value_at(physical)
                        .as_f64()
                        .map(|v| (self.store.times[physical], v))
                })
                .collect();
            // Index into `present` of the next present cell at or after the current row.
            let mut next = 0;
            for &row in rows {
                let physical = self.physical(row);
                let time = self.store.times[physical];
                if let Some(v) = source.value_at(physical).as_f64() {
                    values[physical] = CellValue::Number(v);
                    next += 1;
                    continue;
                }
                if next == 0 || next >= present.len() {
                    continue;
                }
                let (t0, v0) = present[next - 1];
                let (t1, v1) = present[next];
                if ((t1 - t0) as f64) > tolerance {
                    continue;
                }
                let share = (time - t0) as f64 / (t1 - t0) as f64;
                values[physical] = CellValue::number(v0 + (v1 - v0) * share);
                flags[physical] = true;
            }
        }
        (values, Some(flags))
    }

    fn rolling_average(&self, source: &Column, window: usize, min_count: usize) -> Vec<CellValue> {
        let mut values = self.blank();
        for (_, rows) in self.index.iter() {
            let mut recent: Vec<f64> = Vec::with_capacity(rows.len());
            for &row in rows {
                let physical = self.physical(row);
                let Some(v) = source.value_at(physical).as_f64() else {
                    continue;
                };
                recent.push(v);
                let from = recent.len().saturating_sub(window);
                let slice = &recent[from..];
                if slice.len() >= min_count {
                    let mean = slice.iter().sum::<f64>() / slice.len() as f64;
                    values[physical] = CellValue::number(mean);
                }
            }
        }
        values
    }

    fn ratio(&self, numerator: &Column, denominator: &Column, multiplier: f64) -> Vec<CellValue> {
        let mut values = self.blank();
        for &physical in self.rows.iter() {
            let a = numerator.value_at(physical).as_f64();
            let b = denominator.value_at(physical).as_f64();
            if let (Some(a), Some(b)) = (a, b)
                && b != 0.0
            {
                values[physical] = CellValue::number(a / b * multiplier);
            }
        }
        values
    }

    fn relative_to_first(
        &self,
        source: &Column,
        start: Time,
        end: Time,
        mode: RelativeMode,
    ) -> Vec<CellValue> {
        let mut values = self.blank();
        for (_, rows) in self.index.iter() {
            let in_range: Vec<usize> = rows
                .iter()
                .map(|&row| self.physical(row))
                .filter(|&physical| (start..=end).contains(&self.store.times[physical]))
                .collect();
            let base = in_range
                .iter()
                .find_map(|&physical| source.value_at(physical).as_f64());
            let Some(base) = base.filter(|base| *base != 0.0) else {
                continue;
            };
            for physical in in_range {
                if let Some(v) = source.value_at(physical).as_f64() {
                    let relative = match mode {
                        RelativeMode::Ratio => v / base,
                        RelativeMode::PercentChange => 100.0 * (v / base - 1.0),
                    };
                    values[physical] = CellValue::number(relative);
                }
            }
        }
        values
    }

    fn log_safe(&self, source: &Column) -> Vec<CellValue> {
        let mut values = self.blank();
        for &physical in self.rows.iter() {
            if let Some(v) = source.value_at(physical).as_f64().filter(|v| *v > 0.0) {
                values[physical] = CellValue::Number(v);
            }
        }
        values
    }
}

fn derived_def(source: &ColumnDef, slug: ColumnSlug, kind: &TransformKind) -> ColumnDef {
    let mut def = source.clone();
    def.slug = slug;
    def.kind = ColumnKind::Numeric;
    match kind {
        TransformKind::Ratio { .. } => {
            def.unit = None;
            def.short_unit = None;
        }
        TransformKind::RelativeToFirst { mode, .. } => {
            let unit = match mode {
                RelativeMode::Ratio => None,
                RelativeMode::PercentChange => Some("%".to_string()),
            };
            def.unit = unit.clone();
            def.short_unit = unit;
        }
        _ => {}
    }
    def
}
