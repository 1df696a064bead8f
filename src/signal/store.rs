//! Declared input controls and their current values.
//!
//! Every control is declared once at startup with a kind and a default. The
//! store is the only mutable state in a session; it changes exclusively
//! through [`SignalStore::set`], which reports which names actually changed so
//! the scheduler can skip no-op updates.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;
use thiserror::Error;

use crate::error::CoreError;

/// A current or requested control value. Two shapes cover all declared
/// controls: free text and single-selects carry a string, range selectors an
/// integer pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Str(String),
    Range(i64, i64),
}

impl SignalValue {
    pub fn text(value: &str) -> Self {
        SignalValue::Str(value.to_string())
    }
}

/// The declared shape of a control.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalKind {
    /// Free text; empty means "no filter".
    Text,
    /// Ordered inclusive integer pair, clamped to `[min, max]`.
    Range { min: i64, max: i64 },
    /// Single-select over a fixed option list. Membership is not enforced
    /// here: a stale selection surfaces as a lookup failure at
    /// recomputation time, not as a rejected write.
    Choice { options: Vec<String> },
}

impl SignalKind {
    fn expected(&self) -> &'static str {
        match self {
            SignalKind::Text => "a string",
            SignalKind::Range { .. } => "an integer pair",
            SignalKind::Choice { .. } => "an option string",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSpec {
    pub name: String,
    pub kind: SignalKind,
    pub default: SignalValue,
}

impl SignalSpec {
    pub fn text(name: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: SignalKind::Text,
            default: SignalValue::text(default),
        }
    }

    pub fn range(name: &str, min: i64, max: i64, default: (i64, i64)) -> Self {
        Self {
            name: name.to_string(),
            kind: SignalKind::Range { min, max },
            default: SignalValue::Range(default.0, default.1),
        }
    }

    pub fn choice(name: &str, options: Vec<String>, default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: SignalKind::Choice { options },
            default: SignalValue::text(default),
        }
    }
}

/// A rejected write. These are handled at the interaction boundary and never
/// reach the scheduler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("unknown signal '{0}'")]
    Unknown(String),
    #[error("signal '{name}' expects {expected}")]
    KindMismatch { name: String, expected: &'static str },
}

/// Names that actually changed in one `set` call.
pub type ChangedSignals = SmallVec<[String; 1]>;

#[derive(Debug)]
pub struct SignalStore {
    specs: Vec<SignalSpec>,
    index: HashMap<String, usize>,
    values: Vec<SignalValue>,
}

impl SignalStore {
    /// Declares the full signal set. Defaults pass through the same
    /// normalization as live writes, so a default outside the configured
    /// bounds is clamped rather than stored raw.
    pub fn new(specs: Vec<SignalSpec>) -> Result<Self, CoreError> {
        let mut index = HashMap::with_capacity(specs.len());
        let mut values = Vec::with_capacity(specs.len());

        for (i, spec) in specs.iter().enumerate() {
            if index.insert(spec.name.clone(), i).is_some() {
                return Err(CoreError::config(format!(
                    "duplicate signal '{}'",
                    spec.name
                )));
            }
            let value = Self::normalize(&spec.kind, spec.default.clone()).map_err(|_| {
                CoreError::config(format!(
                    "default for signal '{}' does not match its kind",
                    spec.name
                ))
            })?;
            values.push(value);
        }

        Ok(Self { specs, index, values })
    }

    pub fn get(&self, name: &str) -> Option<&SignalValue> {
        self.index.get(name).map(|&i| &self.values[i])
    }

    pub fn spec(&self, name: &str) -> Option<&SignalSpec> {
        self.index.get(name).map(|&i| &self.specs[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    /// Validates, normalizes, and stores a value. Returns the names that
    /// actually changed; empty when the write is a no-op (value equality).
    pub fn set(&mut self, name: &str, value: SignalValue) -> Result<ChangedSignals, SignalError> {
        let &i = self
            .index
            .get(name)
            .ok_or_else(|| SignalError::Unknown(name.to_string()))?;

        let next = Self::normalize(&self.specs[i].kind, value).map_err(|expected| {
            SignalError::KindMismatch { name: name.to_string(), expected }
        })?;

        let mut changed = ChangedSignals::new();
        if self.values[i] != next {
            self.values[i] = next;
            changed.push(name.to_string());
        }
        Ok(changed)
    }

    /// Clamps and orders a requested value against the declared kind, or
    /// reports the expected shape.
    fn normalize(kind: &SignalKind, value: SignalValue) -> Result<SignalValue, &'static str> {
        match (kind, value) {
            (SignalKind::Text, SignalValue::Str(s)) => Ok(SignalValue::Str(s)),
            (SignalKind::Choice { .. }, SignalValue::Str(s)) => Ok(SignalValue::Str(s)),
            (SignalKind::Range { min, max }, SignalValue::Range(a, b)) => {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                // Slider semantics: out-of-bounds requests clamp to the
                // intersection with the configured bounds.
                Ok(SignalValue::Range(lo.clamp(*min, *max), hi.clamp(*min, *max)))
            }
            (kind, _) => Err(kind.expected()),
        }
    }

    /// An immutable copy of every current value, handed to recomputation
    /// functions so a concurrent fan-out reads one consistent state.
    pub fn snapshot(&self) -> SignalSnapshot {
        SignalSnapshot {
            values: self
                .specs
                .iter()
                .zip(&self.values)
                .map(|(s, v)| (s.name.clone(), v.clone()))
                .collect(),
        }
    }
}

/// A point-in-time copy of the store, used by recomputation functions.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSnapshot {
    values: HashMap<String, SignalValue>,
}

impl SignalSnapshot {
    /// Typed accessors. A miss here means a binding read a signal it never
    /// declared, which startup validation rules out; it surfaces as a
    /// configuration error rather than a panic.
    pub fn text(&self, name: &str) -> Result<&str, CoreError> {
        match self.values.get(name) {
            Some(SignalValue::Str(s)) => Ok(s),
            Some(_) => Err(CoreError::config(format!("signal '{}' is not textual", name))),
            None => Err(CoreError::config(format!("undeclared signal '{}'", name))),
        }
    }

    pub fn range(&self, name: &str) -> Result<(i64, i64), CoreError> {
        match self.values.get(name) {
            Some(SignalValue::Range(lo, hi)) => Ok((*lo, *hi)),
            Some(_) => Err(CoreError::config(format!("signal '{}' is not a range", name))),
            None => Err(CoreError::config(format!("undeclared signal '{}'", name))),
        }
    }

    pub fn choice(&self, name: &str) -> Result<&str, CoreError> {
        self.text(name)
    }
}
