//! The boundary to the external renderer.
//!
//! The contract is narrow: "replace the data for view X with payload Y", plus
//! an out-of-band channel for recoverable failures. Everything past this
//! trait (drawing, theming, transport) is someone else's job.

use serde_json::json;
use std::io::Write;

use crate::error::CoreError;
use crate::view::{ViewData, ViewId};

pub trait OutputSink {
    /// Replace the rendered content for `view`. Re-delivery of identical
    /// data must be idempotent for the consumer.
    fn accept(&mut self, view: &ViewId, data: &ViewData);

    /// A recoverable failure for `view`; the previously delivered data is
    /// still the valid state.
    fn report(&mut self, view: &ViewId, error: &CoreError);
}

/// Writes one JSON object per line, the process's stdout protocol.
pub struct JsonLineSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> OutputSink for JsonLineSink<W> {
    fn accept(&mut self, view: &ViewId, data: &ViewData) {
        let line = json!({ "view": view, "data": data });
        if let Err(err) = writeln!(self.out, "{}", line) {
            tracing::error!(view = %view, error = %err, "failed to write view update");
        }
    }

    fn report(&mut self, view: &ViewId, error: &CoreError) {
        let line = json!({ "view": view, "error": error.to_string() });
        if let Err(err) = writeln!(self.out, "{}", line) {
            tracing::error!(view = %view, error = %err, "failed to write error report");
        }
    }
}

/// Records everything it receives; used by tests and diagnostics.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub updates: Vec<(ViewId, ViewData)>,
    pub errors: Vec<(ViewId, String)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent payload delivered for `view`.
    pub fn latest(&self, view: &ViewId) -> Option<&ViewData> {
        self.updates
            .iter()
            .rev()
            .find(|(id, _)| id == view)
            .map(|(_, data)| data)
    }
}

impl OutputSink for MemorySink {
    fn accept(&mut self, view: &ViewId, data: &ViewData) {
        self.updates.push((view.clone(), data.clone()));
    }

    fn report(&mut self, view: &ViewId, error: &CoreError) {
        self.errors.push((view.clone(), error.to_string()));
    }
}
