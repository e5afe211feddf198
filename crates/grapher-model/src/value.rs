#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single stored cell.
///
/// `Missing` is a distinct state: a present `Number(0.0)` is never treated
/// as missing and a missing cell never reads as zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum CellValue {
    Number(f64),
    Text(String),
    Boolean(bool),
    #[default]
    Missing,
}

impl CellValue {
    /// Wrap a float, mapping non-finite values to `Missing`.
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            CellValue::Number(value)
        } else {
            CellValue::Missing
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn is_present(&self) -> bool {
        !self.is_missing()
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => f.write_str(&format_number(*v)),
            CellValue::Text(v) => f.write_str(v),
            CellValue::Boolean(v) => write!(f, "{v}"),
            CellValue::Missing => Ok(()),
        }
    }
}

/// Formats a floating-point number without trailing fractional zeros.
///
/// # Examples
///
/// ```
/// use grapher_model::format_number;
///
/// assert_eq!(format_number(1.0), "1");
/// assert_eq!(format_number(100.0), "100");
/// assert_eq!(format_number(2.50), "2.5");
/// assert_eq!(format_number(-0.0), "0");
/// ```
pub fn format_number(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let s = format!("{v}");
    if s.contains('.') && !s.contains('e') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// A raw, not yet typed field value as it arrives from CSV or JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum RawValue {
    #[default]
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Returns true for `null` and blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the raw value; numeric strings are accepted.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(v) if v.is_finite() => Some(*v),
            RawValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => Ok(()),
            RawValue::Boolean(v) => write!(f, "{v}"),
            RawValue::Number(v) => f.write_str(&format_number(*v)),
            RawValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Boolean(value)
    }
}

/// One observation row at the ingestion boundary:
/// `{ "entityName": "France", "time": 2000, "<slug>": value, ... }`.
///
/// Entity and time are optional here because malformed rows must be
/// reported, not rejected by the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRow {
    #[serde(default, alias = "entity")]
    pub entity_name: Option<String>,
    #[serde(default, alias = "year", alias = "day")]
    pub time: Option<RawValue>,
    #[serde(flatten)]
    pub values: BTreeMap<String, RawValue>,
}

impl RawRow {
    pub fn new(entity_name: impl Into<String>, time: impl Into<RawValue>) -> Self {
        Self {
            entity_name: Some(entity_name.into()),
            time: Some(time.into()),
            values: BTreeMap::new(),
        }
    }

    /// Add a field value.
    pub fn with(mut self, slug: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.values.insert(slug.into(), value.into());
        self
    }
}
