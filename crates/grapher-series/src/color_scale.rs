//! Color-scale binning and map series.
//!
//! Bins are half-open `[min, max)` intervals in ascending order; the last
//! numeric bin also includes its upper edge. Automatic edges are computed
//! over the selected rows in the active time range and snapped to round
//! numbers, so the same data always yields the same edges.

use grapher_model::{
    BinKind, BinRef, BinningStrategy, ColorScale, ColorScaleBin, ColorScaleConfig, MapEntry,
    format_number,
};
use grapher_table::Table;
use serde::Serialize;
use tracing::debug;

use crate::error::{ConfigurationError, Result, SeriesError};
use crate::input::{match_number_at, metric_view, require_numeric, tolerance_for, validate_options};

/// Sequential palette, light to dark.
pub const DEFAULT_PALETTE: [&str; 9] = [
    "#ffffd9", "#edf8b1", "#c7e9b4", "#7fcdbb", "#41b6c4", "#1d91c0", "#225ea8", "#253494",
    "#081d58",
];
pub const DEFAULT_NO_DATA_COLOR: &str = "#e6e6e6";
const BELOW_DOMAIN_COLOR: &str = "#f7fcf0";
const ABOVE_DOMAIN_COLOR: &str = "#040c2c";

const NICE_MULTIPLES: [f64; 5] = [1.0, 2.0, 2.5, 5.0, 10.0];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapChart {
    pub scale: ColorScale,
    /// One entry per selected entity, sorted by entity name.
    pub entries: Vec<MapEntry>,
}

pub fn map_series(table: &Table, config: &ColorScaleConfig) -> Result<MapChart> {
    require_numeric(table, &config.column)?;
    let window = validate_options(table, &config.options)?;

    let selection = if config.entities.is_empty() {
        table.clone()
    } else {
        table.filter_by_entity_names(&config.entities)
    };
    let view = metric_view(&selection, &config.column, &config.options, window)?;
    let tolerance = tolerance_for(&selection, &config.column, &config.options);

    let matches: Vec<_> = selection
        .entity_index()
        .iter()
        .map(|(entity, rows)| {
            let found = match_number_at(&selection, &view, rows, window.end, tolerance);
            (entity.clone(), found)
        })
        .collect();
    if matches.iter().all(|(_, found)| found.is_none()) {
        return Err(SeriesError::NoDisplayableData);
    }

    let mut domain: Vec<f64> = (0..selection.row_count())
        .filter(|&row| window.contains(selection.time(row)))
        .filter_map(|row| view.number(row))
        .collect();
    // Matches inside the window are already among its rows.
    domain.extend(
        matches
            .iter()
            .filter_map(|(_, found)| *found)
            .filter(|&(_, time)| time < window.start)
            .map(|(value, _)| value),
    );

    let scale = build_color_scale(&domain, config)?;
    let entries = matches
        .into_iter()
        .map(|(entity, found)| {
            let bin = assign_bin(&scale, found.map(|(v, _)| v), config);
            MapEntry {
                entity,
                value: found.map(|(v, _)| v),
                time: found.map(|(_, t)| t),
                bin,
                color: scale
                    .bin(bin)
                    .map_or_else(|| scale.no_data.color.clone(), |bin| bin.color.clone()),
            }
        })
        .collect::<Vec<_>>();

    debug!(
        bins = scale.bins.len(),
        entries = entries.len(),
        strategy = ?config.binning_strategy,
        "color scale"
    );
    Ok(MapChart { scale, entries })
}

/// Build the bins for `values` under `config`.
///
/// `values` are the readings of the selection; values outside the custom
/// domain bounds are ignored when computing automatic edges.
pub fn build_color_scale(values: &[f64], config: &ColorScaleConfig) -> Result<ColorScale> {
    if let (Some(min), Some(max)) = (config.domain_min, config.domain_max)
        && min >= max
    {
        return Err(ConfigurationError::InvalidDomain { min, max }.into());
    }

    let edges = match &config.options.custom_bin_edges {
        Some(edges) => edges.clone(),
        None => {
            let in_domain: Vec<f64> = values
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .filter(|v| config.domain_min.is_none_or(|min| *v >= min))
                .filter(|v| config.domain_max.is_none_or(|max| *v <= max))
                .collect();
            let data_min = in_domain.iter().copied().reduce(f64::min);
            let data_max = in_domain.iter().copied().reduce(f64::max);
            let (Some(lo), Some(hi)) = (
                config.domain_min.or(data_min),
                config.domain_max.or(data_max),
            ) else {
                return Err(SeriesError::NoDisplayableData);
            };
            let count = usize::try_from(config.options.color_scale_bin_count).map_err(|_| {
                ConfigurationError::InvalidBinCount(config.options.color_scale_bin_count)
            })?;
            match config.binning_strategy {
                BinningStrategy::EqualInterval => equal_interval_edges(lo, hi, count),
                BinningStrategy::Quantile => quantile_edges(&in_domain, lo, hi, count),
            }
        }
    };

    let palette: Vec<String> = match &config.colors {
        Some(colors) if !colors.is_empty() => colors.clone(),
        _ => DEFAULT_PALETTE.iter().map(|c| (*c).to_string()).collect(),
    };
    let picks = pick_colors(&palette, edges.len().saturating_sub(1));
    let bins = edges
        .windows(2)
        .zip(picks)
        .map(|(pair, color)| ColorScaleBin {
            kind: BinKind::Numeric,
            min: pair[0],
            max: pair[1],
            color,
            label: ColorScaleBin::range_label(pair[0], pair[1]),
        })
        .collect();

    let no_data = ColorScaleBin {
        kind: BinKind::NoData,
        min: 0.0,
        max: 0.0,
        color: config
            .no_data_color
            .clone()
            .unwrap_or_else(|| DEFAULT_NO_DATA_COLOR.to_string()),
        label: "No data".to_string(),
    };
    let below_domain = config
        .domain_min
        .filter(|_| config.out_of_domain_bins)
        .map(|min| ColorScaleBin {
            kind: BinKind::BelowDomain,
            min,
            max: min,
            color: BELOW_DOMAIN_COLOR.to_string(),
            label: format!("< {}", format_number(min)),
        });
    let above_domain = config
        .domain_max
        .filter(|_| config.out_of_domain_bins)
        .map(|max| ColorScaleBin {
            kind: BinKind::AboveDomain,
            min: max,
            max,
            color: ABOVE_DOMAIN_COLOR.to_string(),
            label: format!("> {}", format_number(max)),
        });

    Ok(ColorScale {
        bins,
        no_data,
        below_domain,
        above_domain,
    })
}

/// The bin `value` falls in. Values outside the custom domain go to the
/// dedicated bins when the scale has them; anything else outside the bins
/// is clamped to the nearest one.
pub fn assign_bin(scale: &ColorScale, value: Option<f64>, config: &ColorScaleConfig) -> BinRef {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return BinRef::NoData;
    };
    if config.domain_min.is_some_and(|min| value < min) && scale.below_domain.is_some() {
        return BinRef::BelowDomain;
    }
    if config.domain_max.is_some_and(|max| value > max) && scale.above_domain.is_some() {
        return BinRef::AboveDomain;
    }
    let Some(last) = scale.bins.len().checked_sub(1) else {
        return BinRef::NoData;
    };
    let idx = scale
        .bins
        .iter()
        .position(|bin| value < bin.max)
        .unwrap_or(last);
    BinRef::Numeric(idx)
}

/// Equal-width edges covering `[lo, hi]` with a round step.
///
/// The step is the smallest `{1, 2, 2.5, 5, 10} × 10^k` not below
/// `(hi - lo) / count`, and the first edge is `lo` rounded down to a
/// multiple of it; the count of resulting bins can differ from `count`.
fn equal_interval_edges(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    let count = count.max(1);
    let span = if hi > lo { hi - lo } else { lo.abs().max(1.0) };
    let step = nice_step(span / count as f64);
    let first = (lo / step).floor() * step;
    let mut edges = vec![snap_to_step(first, step)];
    let limit = count * 2 + 2;
    for i in 1..=limit {
        let edge = snap_to_step(first + step * i as f64, step);
        edges.push(edge);
        if edge >= hi && edges.len() > 1 {
            break;
        }
    }
    edges
}

/// Quantile edges snapped to two significant figures.
fn quantile_edges(values: &[f64], lo: f64, hi: f64, count: usize) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let count = count.max(1);
    let mut edges = vec![lo];
    if !sorted.is_empty() {
        for k in 1..count {
            let idx = (k * sorted.len() / count).min(sorted.len() - 1);
            let edge = round_significant(sorted[idx], 2);
            if edge > lo && edge < hi {
                edges.push(edge);
            }
        }
    }
    edges.push(if hi > lo { hi } else { lo + lo.abs().max(1.0) });
    edges.dedup();
    edges
}

fn nice_step(raw: f64) -> f64 {
    if !(raw.is_finite() && raw > 0.0) {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    NICE_MULTIPLES
        .iter()
        .map(|m| m * magnitude)
        .find(|step| *step >= raw * (1.0 - 1e-9))
        .unwrap_or(10.0 * magnitude)
}

/// Remove accumulated floating-point noise from a multiple of `step`.
fn snap_to_step(value: f64, step: f64) -> f64 {
    let decimals = (-step.log10().floor()).max(0.0) as i32 + 2;
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn round_significant(value: f64, digits: i32) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let exponent = value.abs().log10().floor() as i32 - (digits - 1);
    if exponent < 0 {
        let factor = 10f64.powi(-exponent);
        (value * factor).round() / factor
    } else {
        let magnitude = 10f64.powi(exponent);
        (value / magnitude).round() * magnitude
    }
}

/// `count` colors spread evenly over `palette`.
fn pick_colors(palette: &[String], count: usize) -> Vec<String> {
    match (palette.len(), count) {
        (_, 0) | (0, _) => Vec::new(),
        (len, 1) => vec![palette[len / 2].clone()],
        (len, n) => (0..n)
            .map(|i| {
                let idx = (i * (len - 1) + (n - 1) / 2) / (n - 1);
                palette[idx.min(len - 1)].clone()
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use grapher_model::{ColumnSlug, SeriesOptions};

    use super::*;

    fn config() -> ColorScaleConfig {
        ColorScaleConfig::new(ColumnSlug::new("gdp").unwrap())
    }

    fn edges(scale: &ColorScale) -> Vec<(f64, f64)> {
        scale.bins.iter().map(|bin| (bin.min, bin.max)).collect()
    }

    #[test]
    fn test_equal_interval_edges_are_round() {
        assert_eq!(
            equal_interval_edges(3.0, 97.0, 5),
            vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]
        );
        assert_eq!(equal_interval_edges(0.0, 1.0, 4), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(equal_interval_edges(0.1, 0.7, 3), vec![0.0, 0.2, 0.4, 0.6, 0.8]);
    }

    #[test]
    fn test_constant_values_still_get_a_bin() {
        let scale = build_color_scale(&[7.0, 7.0], &config()).unwrap();
        assert_eq!(edges(&scale), vec![(6.0, 8.0)]);
        assert_eq!(assign_bin(&scale, Some(7.0), &config()), BinRef::Numeric(0));
    }

    #[test]
    fn test_upper_edge_belongs_to_next_bin_except_last() {
        let cfg = config()
            .with_options(SeriesOptions::new().with_custom_bin_edges(vec![0.0, 10.0, 20.0]));
        let scale = build_color_scale(&[], &cfg).unwrap();
        assert_eq!(edges(&scale), vec![(0.0, 10.0), (10.0, 20.0)]);
        assert_eq!(assign_bin(&scale, Some(10.0), &cfg), BinRef::Numeric(1));
        assert_eq!(assign_bin(&scale, Some(20.0), &cfg), BinRef::Numeric(1));
        assert_eq!(assign_bin(&scale, Some(-5.0), &cfg), BinRef::Numeric(0));
        assert_eq!(assign_bin(&scale, None, &cfg), BinRef::NoData);
    }

    #[test]
    fn test_dedicated_out_of_domain_bins() {
        let cfg = config().with_domain(Some(0.0), Some(100.0), true);
        let scale = build_color_scale(&[-50.0, 10.0, 90.0, 500.0], &cfg).unwrap();
        assert_eq!(scale.bins.first().map(|b| b.min), Some(0.0));
        assert_eq!(scale.bins.last().map(|b| b.max), Some(100.0));
        assert_eq!(assign_bin(&scale, Some(-50.0), &cfg), BinRef::BelowDomain);
        assert_eq!(assign_bin(&scale, Some(500.0), &cfg), BinRef::AboveDomain);
        assert_eq!(scale.below_domain.as_ref().map(|b| b.label.as_str()), Some("< 0"));

        let clamped = config().with_domain(Some(0.0), Some(100.0), false);
        let scale = build_color_scale(&[10.0], &clamped).unwrap();
        assert_eq!(
            assign_bin(&scale, Some(500.0), &clamped),
            BinRef::Numeric(scale.bins.len() - 1)
        );
    }

    #[test]
    fn test_quantile_edges_snap_and_dedupe() {
        let values = [1.0, 1.0, 1.0, 1.0, 2.34, 5.67, 8.91, 12.3];
        assert_eq!(quantile_edges(&values, 1.0, 12.3, 4), vec![1.0, 2.3, 8.9, 12.3]);
    }

    #[test]
    fn test_inverted_custom_domain_is_rejected() {
        let cfg = config().with_domain(Some(5.0), Some(1.0), false);
        assert_eq!(
            build_color_scale(&[1.0], &cfg),
            Err(ConfigurationError::InvalidDomain { min: 5.0, max: 1.0 }.into())
        );
    }

    #[test]
    fn test_colors_spread_over_palette() {
        let palette: Vec<String> = DEFAULT_PALETTE.iter().map(|c| (*c).to_string()).collect();
        let picks = pick_colors(&palette, 3);
        assert_eq!(picks, vec!["#ffffd9", "#41b6c4", "#081d58"]);
    }
}
