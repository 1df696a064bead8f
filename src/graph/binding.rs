//! A declared dependency from a set of signals to one derived view.

use std::fmt;

use crate::error::CoreError;
use crate::signal::SignalSnapshot;
use crate::view::{ViewData, ViewId};

/// Recomputation function: pure given the snapshot and whatever immutable
/// context it closes over (shared frames, static pipeline outputs).
pub type RecomputeFn = Box<dyn Fn(&SignalSnapshot) -> Result<ViewData, CoreError> + Send + Sync>;

pub struct Binding {
    view: ViewId,
    /// Names of the signals this binding depends on. Names, not values: the
    /// store mutates independently of binding definitions.
    inputs: Vec<String>,
    recompute: RecomputeFn,
}

impl Binding {
    pub fn new(view: ViewId, inputs: Vec<&str>, recompute: RecomputeFn) -> Self {
        Self {
            view,
            inputs: inputs.into_iter().map(String::from).collect(),
            recompute,
        }
    }

    pub fn view(&self) -> &ViewId {
        &self.view
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn recompute(&self, snapshot: &SignalSnapshot) -> Result<ViewData, CoreError> {
        (self.recompute)(snapshot)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("view", &self.view)
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}
