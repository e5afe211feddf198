//! Render-ready outputs of the series derivation engines.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{EntityName, Time};
use crate::value::{CellValue, format_number};

/// Where a point sits along a stacked chart's category axis.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Position {
    Time(Time),
    Category(EntityName),
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Time(time) => write!(f, "{time}"),
            Position::Category(entity) => write!(f, "{entity}"),
        }
    }
}

/// One point of a (stacked) series.
///
/// `value_offset` is the baseline the point is drawn from; its top is
/// `value_offset + value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub position: Position,
    pub time: Time,
    pub value: f64,
    pub value_offset: f64,
    pub is_interpolated: bool,
    /// A synthesized placeholder; never shown in tooltips or totals.
    pub is_fake: bool,
}

impl SeriesPoint {
    pub fn top(&self) -> f64 {
        self.value_offset + self.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub series_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub points: Vec<SeriesPoint>,
}

/// One scatter mark: each axis carries the time its value was taken from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub x_time: Time,
    pub y_time: Time,
    /// The target time the point was matched for.
    pub time: Time,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<CellValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterSeries {
    pub series_name: String,
    pub points: Vec<ScatterPoint>,
}

/// Why candidate scatter points were not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionStats {
    /// Entities or times where an axis had no value within tolerance.
    pub no_match: usize,
    pub outside_domain: usize,
    pub non_positive_on_log_axis: usize,
}

impl ExclusionStats {
    pub fn total(&self) -> usize {
        self.no_match + self.outside_domain + self.non_positive_on_log_axis
    }
}

/// Role of a color-scale bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinKind {
    Numeric,
    BelowDomain,
    AboveDomain,
    NoData,
}

/// A half-open interval `[min, max)` mapped to one color.
///
/// The last numeric bin of a scale also includes its `max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScaleBin {
    pub kind: BinKind,
    pub min: f64,
    pub max: f64,
    pub color: String,
    pub label: String,
}

impl ColorScaleBin {
    /// Label for a numeric interval, e.g. `10 – 25`.
    pub fn range_label(min: f64, max: f64) -> String {
        format!("{} – {}", format_number(min), format_number(max))
    }
}

/// Which bin of a [`ColorScale`] a value landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "bin", content = "index", rename_all = "camelCase")]
pub enum BinRef {
    /// Index into [`ColorScale::bins`].
    Numeric(usize),
    BelowDomain,
    AboveDomain,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScale {
    /// Numeric bins in ascending order.
    pub bins: Vec<ColorScaleBin>,
    pub no_data: ColorScaleBin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub below_domain: Option<ColorScaleBin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub above_domain: Option<ColorScaleBin>,
}

impl ColorScale {
    pub fn bin(&self, bin: BinRef) -> Option<&ColorScaleBin> {
        match bin {
            BinRef::Numeric(idx) => self.bins.get(idx),
            BinRef::BelowDomain => self.below_domain.as_ref(),
            BinRef::AboveDomain => self.above_domain.as_ref(),
            BinRef::NoData => Some(&self.no_data),
        }
    }
}

/// One entity's value on a map and its bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEntry {
    pub entity: EntityName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<Time>,
    pub bin: BinRef,
    pub color: String,
}
