//! Crate-wide error taxonomy.
//!
//! `Schema` and `Configuration` are startup-time errors: a view that
//! references a missing field or a malformed spec can never be produced, so
//! initialization aborts. `Lookup` is the one recoverable category; the
//! scheduler contains it to the affected binding.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("unknown field '{field}' in {context}")]
    Schema { field: String, context: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unknown {entity} '{name}'")]
    Lookup { entity: &'static str, name: String },
}

impl CoreError {
    pub fn schema(field: impl Into<String>, context: impl Into<String>) -> Self {
        CoreError::Schema { field: field.into(), context: context.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        CoreError::Configuration(msg.into())
    }

    pub fn lookup(entity: &'static str, name: impl Into<String>) -> Self {
        CoreError::Lookup { entity, name: name.into() }
    }

    /// Recoverable errors are contained per-binding; everything else aborts
    /// initialization.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CoreError::Lookup { .. })
    }
}
