//! Derived-column requests.
//!
//! A [`TransformKind`] names a computation over one numeric column. The
//! table crate evaluates and memoizes it; chart configuration can carry one
//! so every plotted column is read through it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{ColumnSlug, Time};
use crate::value::format_number;

/// How `RelativeToFirst` expresses a cell against its base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelativeMode {
    /// `value / first`
    #[default]
    Ratio,
    /// `100 * (value / first - 1)`
    PercentChange,
}

/// A derived-column request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transform", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TransformKind {
    Interpolate {
        tolerance: f64,
    },
    RollingAverage {
        window: usize,
        #[serde(default = "default_min_count")]
        min_count: usize,
    },
    Ratio {
        denominator: ColumnSlug,
        #[serde(default = "default_multiplier")]
        multiplier: f64,
    },
    /// Without bounds the range is the active time range of the chart
    /// (or the view's time domain) it is read for.
    RelativeToFirst {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start: Option<Time>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        end: Option<Time>,
        #[serde(default)]
        mode: RelativeMode,
    },
    LogSafe,
}

fn default_min_count() -> usize {
    1
}

fn default_multiplier() -> f64 {
    1.0
}

impl TransformKind {
    pub fn interpolate(tolerance: f64) -> Self {
        TransformKind::Interpolate { tolerance }
    }

    pub fn rolling_average(window: usize, min_count: usize) -> Self {
        TransformKind::RollingAverage { window, min_count }
    }

    pub fn per_capita(denominator: ColumnSlug) -> Self {
        TransformKind::Ratio {
            denominator,
            multiplier: 1.0,
        }
    }

    pub fn ratio(denominator: ColumnSlug, multiplier: f64) -> Self {
        TransformKind::Ratio {
            denominator,
            multiplier,
        }
    }

    pub fn relative_to_first(start: Time, end: Time, mode: RelativeMode) -> Self {
        TransformKind::RelativeToFirst {
            start: Some(start),
            end: Some(end),
            mode,
        }
    }

    /// Relative to the first value of whatever time range it is read for.
    pub fn relative_to_first_in_range(mode: RelativeMode) -> Self {
        TransformKind::RelativeToFirst {
            start: None,
            end: None,
            mode,
        }
    }

    /// Fill missing `RelativeToFirst` bounds from `start..=end`. Explicit
    /// bounds and every other transform are returned unchanged.
    #[must_use]
    pub fn within_time_range(&self, start: Time, end: Time) -> Self {
        match self {
            TransformKind::RelativeToFirst {
                start: own_start,
                end: own_end,
                mode,
            } => TransformKind::RelativeToFirst {
                start: Some(own_start.unwrap_or(start)),
                end: Some(own_end.unwrap_or(end)),
                mode: *mode,
            },
            other => other.clone(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransformKind::Interpolate { .. } => "interpolate",
            TransformKind::RollingAverage { .. } => "rollingAverage",
            TransformKind::Ratio { .. } => "ratio",
            TransformKind::RelativeToFirst { .. } => "relativeToFirst",
            TransformKind::LogSafe => "logSafe",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformKind::Interpolate { tolerance } => {
                write!(f, "interpolate(tolerance={})", format_number(*tolerance))
            }
            TransformKind::RollingAverage { window, min_count } => {
                write!(f, "rollingAverage(window={window}, minCount={min_count})")
            }
            TransformKind::Ratio {
                denominator,
                multiplier,
            } => write!(
                f,
                "ratio(denominator={denominator}, multiplier={})",
                format_number(*multiplier)
            ),
            TransformKind::RelativeToFirst { start, end, mode } => {
                let bound = |time: &Option<Time>| time.map_or_else(|| "range".to_string(), |t| t.to_string());
                write!(
                    f,
                    "relativeToFirst(start={}, end={}, mode={mode:?})",
                    bound(start),
                    bound(end)
                )
            }
            TransformKind::LogSafe => f.write_str("logSafe"),
        }
    }
}
