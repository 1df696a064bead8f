//! Renderer-agnostic view payloads.
//!
//! A `ViewData` is everything the external sink needs to redraw one view:
//! either an ordered series of (x, y, series-label) points or a table with a
//! declared column schema. It carries no styling and no rendering logic.

use serde::Serialize;
use std::fmt;

use crate::error::CoreError;
use crate::frame::Frame;
use crate::frame::Value;

/// Stable identifier of one derived, renderable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ViewId(String);

impl ViewId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a table column should be interpreted by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Text,
    Integer,
    Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSpec {
    /// Field name in the backing frame.
    pub field: String,
    /// Header label shown to the user.
    pub label: String,
    pub semantic: SemanticType,
    /// Display precision for decimal columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
}

impl ColumnSpec {
    pub fn text(field: &str, label: &str) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            semantic: SemanticType::Text,
            precision: None,
        }
    }

    pub fn integer(field: &str, label: &str) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            semantic: SemanticType::Integer,
            precision: None,
        }
    }

    pub fn decimal(field: &str, label: &str, precision: u8) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            semantic: SemanticType::Decimal,
            precision: Some(precision),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub x: Value,
    pub y: f64,
    pub series: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewData {
    Series { points: Vec<SeriesPoint> },
    Table { columns: Vec<ColumnSpec>, rows: Vec<Vec<Value>> },
}

impl ViewData {
    pub fn empty_series() -> Self {
        ViewData::Series { points: Vec::new() }
    }

    pub fn len(&self) -> usize {
        match self {
            ViewData::Series { points } => points.len(),
            ViewData::Table { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds a point series from a frame. The series label is the joined
    /// value of `series_fields` per row, or the y field's name when no label
    /// fields are given (a single unnamed series).
    pub fn series_from(
        frame: &Frame,
        x_field: &str,
        y_field: &str,
        series_fields: &[&str],
    ) -> Result<ViewData, CoreError> {
        let x_idx = frame.schema().require(x_field, "series x")?;
        let y_idx = frame.schema().require(y_field, "series y")?;
        let label_idx: Vec<usize> = series_fields
            .iter()
            .map(|name| frame.schema().require(name, "series label"))
            .collect::<Result<_, _>>()?;

        let mut points = Vec::with_capacity(frame.row_count());
        for row in 0..frame.row_count() {
            let y = frame.column(y_idx).f64_at(row).ok_or_else(|| {
                CoreError::config(format!("series y field '{}' is not numeric", y_field))
            })?;
            let series = if label_idx.is_empty() {
                y_field.to_string()
            } else {
                label_idx
                    .iter()
                    .map(|&i| frame.value(row, i).to_string())
                    .collect::<Vec<_>>()
                    .join(" · ")
            };
            points.push(SeriesPoint { x: frame.value(row, x_idx), y, series });
        }
        Ok(ViewData::Series { points })
    }

    /// Builds a table payload by projecting the declared columns out of a
    /// frame, in declaration order.
    pub fn table_from(frame: &Frame, columns: &[ColumnSpec]) -> Result<ViewData, CoreError> {
        let idx: Vec<usize> = columns
            .iter()
            .map(|c| frame.schema().require(&c.field, "table column"))
            .collect::<Result<_, _>>()?;

        let mut rows = Vec::with_capacity(frame.row_count());
        for row in 0..frame.row_count() {
            rows.push(idx.iter().map(|&i| frame.value(row, i)).collect());
        }
        Ok(ViewData::Table { columns: columns.to_vec(), rows })
    }
}
