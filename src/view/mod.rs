//! View payloads, identifiers, styles, and the startup registry.
pub mod data;
pub mod registry;
pub mod style;

pub use data::{ColumnSpec, SemanticType, SeriesPoint, ViewData, ViewId};
pub use registry::{ViewEntry, ViewRegistry};
pub use style::{ChartStyle, LegendAnchor, OverflowBehavior, TableStyle, ViewStyle};
