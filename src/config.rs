//! Application configuration.
//!
//! Everything here is an explicit structure with enumerated options,
//! validated when the file is read. The draft-range bounds are optional: when
//! absent, the dashboard derives them from the dataset's observed draft
//! years, so new drafts extend the selector without a config change.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CoreError;
use crate::view::TableStyle;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    /// Override for the draft-year range selector bounds, `[min, max]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft_range: Option<(i64, i64)>,
    /// Styling for the player summary table.
    pub table: TableStyle,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<AppConfig, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            CoreError::config(format!("cannot read '{}': {}", path.display(), err))
        })?;
        let config: AppConfig = serde_json::from_str(&text).map_err(|err| {
            CoreError::config(format!("invalid config '{}': {}", path.display(), err))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some((min, max)) = self.draft_range {
            if min > max {
                return Err(CoreError::config(format!(
                    "draft_range bounds [{}, {}] are not ascending",
                    min, max
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_fields_absent() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.draft_range, None);
        assert_eq!(config.table, TableStyle::default());
    }

    #[test]
    fn test_unknown_key_fails() {
        let result = serde_json::from_str::<AppConfig>(r#"{"chart_theme": "dark"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_inverted_bounds_fail_validation() {
        let config: AppConfig =
            serde_json::from_str(r#"{"draft_range": [2023, 2007]}"#).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"draft_range": [2007, 2023], "table": {{"overflow": "scroll"}}}}"#
        )
        .unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.draft_range, Some((2007, 2023)));
        assert_eq!(config.table.overflow, crate::view::OverflowBehavior::Scroll);
    }
}
