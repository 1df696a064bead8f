//! Maps each view identifier to its rendering configuration and its initial
//! payload, computed once at startup.

use std::collections::HashMap;

use super::data::{ViewData, ViewId};
use super::style::ViewStyle;
use crate::error::CoreError;

#[derive(Debug)]
pub struct ViewEntry {
    pub style: ViewStyle,
    pub initial: ViewData,
}

#[derive(Debug, Default)]
pub struct ViewRegistry {
    entries: HashMap<ViewId, ViewEntry>,
    // Registration order, kept so initial emission is deterministic.
    order: Vec<ViewId>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: ViewId,
        style: ViewStyle,
        initial: ViewData,
    ) -> Result<(), CoreError> {
        style.validate()?;
        if self.entries.contains_key(&id) {
            return Err(CoreError::config(format!("duplicate view '{}'", id)));
        }
        self.order.push(id.clone());
        self.entries.insert(id, ViewEntry { style, initial });
        Ok(())
    }

    pub fn contains(&self, id: &ViewId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &ViewId) -> Option<&ViewEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&ViewId, &ViewEntry)> {
        self.order.iter().map(move |id| {
            let entry = self.entries.get(id).expect("order tracks entries");
            (id, entry)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::style::ChartStyle;

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ViewRegistry::new();
        let style = || ViewStyle::Chart(ChartStyle::titled("t", "x", "y"));
        registry
            .register(ViewId::new("a"), style(), ViewData::empty_series())
            .unwrap();
        let err = registry
            .register(ViewId::new("a"), style(), ViewData::empty_series())
            .unwrap_err();
        assert!(matches!(err, CoreError::Configuration(_)));
    }

    #[test]
    fn test_iteration_follows_registration_order() {
        let mut registry = ViewRegistry::new();
        for name in ["c", "a", "b"] {
            registry
                .register(
                    ViewId::new(name),
                    ViewStyle::Chart(ChartStyle::default()),
                    ViewData::empty_series(),
                )
                .unwrap();
        }
        let ids: Vec<_> = registry.iter().map(|(id, _)| id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
