//! Recomputation scheduling.
//!
//! On each signal change the scheduler recomputes every affected binding
//! independently and delivers results to the sink. Delivery is guarded by a
//! per-binding trigger sequence number assigned at trigger start:
//! last-writer-wins by start order, so a slow early recomputation can never
//! overwrite the result of a later one. A failed recomputation keeps the
//! previously committed payload for that view and reports the failure; it
//! never affects other bindings.

use rayon::prelude::*;
use std::collections::HashMap;

use super::sink::OutputSink;
use crate::error::CoreError;
use crate::graph::{BindingId, DependencyGraph};
use crate::signal::SignalSnapshot;
use crate::view::{ViewData, ViewId};

pub struct Scheduler {
    graph: DependencyGraph,
    /// Sequence of the most recently started trigger, per binding.
    started: Vec<u64>,
    /// Sequence of the most recently committed trigger, per binding.
    committed: Vec<u64>,
    /// Last committed payload per view.
    cache: HashMap<ViewId, ViewData>,
}

impl Scheduler {
    pub fn new(graph: DependencyGraph) -> Self {
        let bindings = graph.len();
        Self {
            graph,
            started: vec![0; bindings],
            committed: vec![0; bindings],
            cache: HashMap::new(),
        }
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The last committed payload for a view, if any trigger has succeeded.
    pub fn view_data(&self, view: &ViewId) -> Option<&ViewData> {
        self.cache.get(view)
    }

    /// Recomputes every binding once. Used at session start so reactive
    /// views render from the signal defaults.
    pub fn prime(&mut self, snapshot: &SignalSnapshot, sink: &mut dyn OutputSink) {
        let all: Vec<BindingId> = self.graph.binding_ids().collect();
        self.run_triggers(&all, snapshot, sink);
    }

    /// Recomputes every binding whose dependency set intersects `changed`.
    pub fn notify(
        &mut self,
        changed: &[String],
        snapshot: &SignalSnapshot,
        sink: &mut dyn OutputSink,
    ) {
        let affected = self.graph.affected(changed);
        if affected.is_empty() {
            tracing::debug!(?changed, "no bindings affected");
            return;
        }
        self.run_triggers(&affected, snapshot, sink);
    }

    fn run_triggers(
        &mut self,
        bindings: &[BindingId],
        snapshot: &SignalSnapshot,
        sink: &mut dyn OutputSink,
    ) {
        // Assign sequence numbers before any work starts; they define which
        // completion wins, regardless of completion order.
        let triggers: Vec<(BindingId, u64)> =
            bindings.iter().map(|&b| (b, self.begin(b))).collect();

        let graph = &self.graph;
        let results: Vec<(BindingId, u64, Result<ViewData, CoreError>)> = triggers
            .par_iter()
            .map(|&(b, seq)| (b, seq, graph.binding(b).recompute(snapshot)))
            .collect();

        for (binding, seq, result) in results {
            self.complete(binding, seq, result, sink);
        }
    }

    /// Starts a trigger for `binding`, returning its sequence number.
    pub(crate) fn begin(&mut self, binding: BindingId) -> u64 {
        self.started[binding] += 1;
        self.started[binding]
    }

    /// Commits or discards a finished trigger. Completions older than the
    /// last committed sequence are stale and dropped.
    pub(crate) fn complete(
        &mut self,
        binding: BindingId,
        seq: u64,
        result: Result<ViewData, CoreError>,
        sink: &mut dyn OutputSink,
    ) {
        if seq <= self.committed[binding] {
            tracing::debug!(binding, seq, "discarding stale recomputation result");
            return;
        }
        self.committed[binding] = seq;

        let view = self.graph.binding(binding).view().clone();
        match result {
            Ok(data) => {
                sink.accept(&view, &data);
                self.cache.insert(view, data);
            }
            Err(error) => {
                // The view keeps its last committed payload; only the
                // failure report goes out.
                tracing::warn!(view = %view, %error, "recomputation failed, keeping previous data");
                sink.report(&view, &error);
            }
        }
    }
}
