//! One user's interaction state.
//!
//! A session owns its signal store and scheduler exclusively; the dataset and
//! static pipeline outputs are shared read-only across sessions. Events for
//! one session are applied strictly one at a time, which makes each `set`
//! atomic with respect to the scheduler's snapshot reads.

use serde::{Deserialize, Serialize};

use super::scheduler::Scheduler;
use super::sink::OutputSink;
use crate::signal::{SignalError, SignalStore, SignalValue};

/// One "set signal" event from a UI control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub signal: String,
    pub value: SignalValue,
}

pub struct Session {
    store: SignalStore,
    scheduler: Scheduler,
}

impl Session {
    pub fn new(store: SignalStore, scheduler: Scheduler) -> Self {
        Self { store, scheduler }
    }

    pub fn store(&self) -> &SignalStore {
        &self.store
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Computes every reactive view from the current (default) signal values
    /// and delivers the results.
    pub fn prime(&mut self, sink: &mut dyn OutputSink) {
        let snapshot = self.store.snapshot();
        self.scheduler.prime(&snapshot, sink);
    }

    /// Applies one interaction event. Returns whether any signal actually
    /// changed; a no-op write triggers no recomputation at all.
    pub fn apply(
        &mut self,
        event: InteractionEvent,
        sink: &mut dyn OutputSink,
    ) -> Result<bool, SignalError> {
        let changed = self.store.set(&event.signal, event.value)?;
        if changed.is_empty() {
            tracing::debug!(signal = %event.signal, "no-op signal write");
            return Ok(false);
        }
        let snapshot = self.store.snapshot();
        self.scheduler.notify(&changed, &snapshot, sink);
        Ok(true)
    }
}
