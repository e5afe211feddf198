//! Column definitions and provenance.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::enums::ColumnKind;
use crate::ids::ColumnSlug;

/// Declared type and display metadata of a column.
///
/// This is the parallel "column definitions" array of the ingestion
/// boundary: `{ slug, kind, displayName, unit?, shortUnit?, tolerance? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub slug: ColumnSlug,
    pub kind: ColumnKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_unit: Option<String>,
    /// Default time tolerance when matching values of this column to a target time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    /// Series color used when this column becomes a series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Category order for `Ordinal` columns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort_order: Vec<String>,
}

impl ColumnDef {
    pub fn new(slug: ColumnSlug, kind: ColumnKind) -> Self {
        Self {
            slug,
            kind,
            display_name: None,
            unit: None,
            short_unit: None,
            tolerance: None,
            color: None,
            sort_order: Vec::new(),
        }
    }

    /// Shorthand for a numeric column definition.
    pub fn numeric(slug: ColumnSlug) -> Self {
        Self::new(slug, ColumnKind::Numeric)
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>, short_unit: Option<String>) -> Self {
        self.unit = Some(unit.into());
        self.short_unit = short_unit;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_sort_order(mut self, order: Vec<String>) -> Self {
        self.sort_order = order;
        self
    }

    /// The display name, falling back to the slug.
    pub fn display_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.slug.as_str())
    }
}

/// Identifier of the transform that produced a derived column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransformId(String);

impl TransformId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provenance of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSource {
    /// Loaded from ingested rows.
    Raw,
    /// Computed by the transform graph.
    Derived(TransformId),
}

impl ColumnSource {
    pub fn is_derived(&self) -> bool {
        matches!(self, ColumnSource::Derived(_))
    }
}
