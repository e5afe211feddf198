//! Type-safe enumerations for column typing and chart options.
//!
//! Column kinds arrive as strings in column-definition files, so they carry
//! the same `as_str` / `FromStr` pair; chart options are plain serde enums.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// Semantic type of a column.
///
/// The kind decides how raw cells are coerced on ingestion:
/// - **Numeric** and **Time** hold numbers
/// - **Boolean** holds booleans
/// - every other kind holds text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKind {
    Numeric,
    /// Unordered categories, e.g. a region name.
    Categorical,
    /// Categories with a configured order, e.g. income groups.
    Ordinal,
    EntityName,
    EntityCode,
    Time,
    /// A CSS color string assigned per row.
    Color,
    Boolean,
}

impl ColumnKind {
    /// Returns the canonical name used in column-definition files.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "Numeric",
            ColumnKind::Categorical => "Categorical",
            ColumnKind::Ordinal => "Ordinal",
            ColumnKind::EntityName => "EntityName",
            ColumnKind::EntityCode => "EntityCode",
            ColumnKind::Time => "Time",
            ColumnKind::Color => "Color",
            ColumnKind::Boolean => "Boolean",
        }
    }

    /// Returns true if cells of this kind are stored as numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Numeric | ColumnKind::Time)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, ColumnKind::Boolean)
    }

    /// Returns true if cells of this kind are stored as text.
    pub fn is_textual(&self) -> bool {
        !self.is_numeric() && !self.is_boolean()
    }

    /// Returns true if the kind can drive a categorical split (facets, color legends).
    pub fn is_categorical(&self) -> bool {
        matches!(
            self,
            ColumnKind::Categorical
                | ColumnKind::Ordinal
                | ColumnKind::EntityName
                | ColumnKind::EntityCode
                | ColumnKind::Boolean
        )
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnKind {
    type Err = ModelError;

    /// Parse a kind name (case-insensitive, `-`, `_` and spaces ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|ch| !matches!(ch, '-' | '_' | ' '))
            .collect::<String>()
            .to_uppercase();
        match normalized.as_str() {
            "NUMERIC" | "NUMBER" => Ok(ColumnKind::Numeric),
            "CATEGORICAL" | "STRING" => Ok(ColumnKind::Categorical),
            "ORDINAL" => Ok(ColumnKind::Ordinal),
            "ENTITYNAME" => Ok(ColumnKind::EntityName),
            "ENTITYCODE" => Ok(ColumnKind::EntityCode),
            "TIME" | "YEAR" | "DAY" => Ok(ColumnKind::Time),
            "COLOR" => Ok(ColumnKind::Color),
            "BOOLEAN" | "BOOL" => Ok(ColumnKind::Boolean),
            _ => Err(ModelError::UnknownColumnKind(s.to_string())),
        }
    }
}

impl Serialize for ColumnKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Unit of the table's time axis. Units never mix within one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimeUnit {
    #[default]
    Year,
    /// Days relative to [`crate::time::DAY_ZERO`].
    Day,
}

/// Whether stacked values are absolute or shares of the per-position total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StackMode {
    #[default]
    Absolute,
    Relative,
}

/// Rule applied when a series has no present value at a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingDataStrategy {
    /// Synthesize a fake zero point.
    #[default]
    Zero,
    /// Drop the whole series if any position is missing.
    Drop,
    /// Interpolate linearly between present neighbors.
    Interpolate,
    /// Repeat the previous present value.
    CarryForward,
}

/// Axis scale of a scatter axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

/// Automatic bin generation method for color scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinningStrategy {
    #[default]
    EqualInterval,
    Quantile,
}
