//! Static rendering configuration.
//!
//! Colors and dimensions are opaque to the core: it validates shape, not
//! meaning. Every recognized option is an explicit struct field or enum
//! variant; unknown keys fail deserialization instead of riding along in a
//! dynamic map.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowBehavior {
    Auto,
    Scroll,
    Hidden,
}

/// Table rendering options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TableStyle {
    pub height: String,
    pub min_height: String,
    pub overflow: OverflowBehavior,
    pub header_color: String,
    pub cell_color: String,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            height: "80vh".to_string(),
            min_height: "400px".to_string(),
            overflow: OverflowBehavior::Auto,
            header_color: "#303030".to_string(),
            cell_color: "#303030".to_string(),
        }
    }
}

/// Chart rendering options for one view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ChartStyle {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Fixed y axis range; absent means auto-scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_range: Option<(f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<LegendAnchor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendAnchor {
    TopRight,
    TopLeft,
    BottomRight,
    BottomLeft,
}

impl ChartStyle {
    pub fn titled(title: &str, x_label: &str, y_label: &str) -> Self {
        Self {
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            ..Default::default()
        }
    }

    pub fn with_y_range(mut self, lo: f64, hi: f64) -> Self {
        self.y_range = Some((lo, hi));
        self
    }

    pub fn with_legend(mut self, anchor: LegendAnchor) -> Self {
        self.legend = Some(anchor);
        self
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some((lo, hi)) = self.y_range {
            if lo >= hi {
                return Err(CoreError::config(format!(
                    "chart '{}': y_range [{}, {}] is not ascending",
                    self.title, lo, hi
                )));
            }
        }
        Ok(())
    }
}

/// Per-view rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewStyle {
    Chart(ChartStyle),
    Table(TableStyle),
}

impl ViewStyle {
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            ViewStyle::Chart(c) => c.validate(),
            ViewStyle::Table(_) => Ok(()),
        }
    }
}
