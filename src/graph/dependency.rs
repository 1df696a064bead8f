//! The explicit dependency graph built at startup.
//!
//! Signals and views are nodes in a digraph; each binding contributes one
//! view node with an incoming edge from every signal it declares. Building
//! the graph validates all references up front. Every error is collected
//! before the first one is reported, so a misconfigured dashboard fails with
//! the full list rather than one complaint at a time.

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::binding::Binding;
use crate::error::CoreError;
use crate::signal::SignalStore;
use crate::view::{ViewId, ViewRegistry};

/// Index of a binding within the graph's binding list.
pub type BindingId = usize;

#[derive(Debug, Clone, Copy)]
enum GraphNode {
    Signal,
    View(BindingId),
}

pub struct DependencyGraph {
    graph: DiGraph<GraphNode, ()>,
    bindings: Vec<Binding>,
    signal_nodes: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    /// Builds and validates the graph: every input must be a declared
    /// signal, every produced view must exist in the registry, and no view
    /// may be produced by two bindings.
    pub fn build(
        store: &SignalStore,
        registry: &ViewRegistry,
        bindings: Vec<Binding>,
    ) -> Result<Self, CoreError> {
        let mut graph = DiGraph::new();
        let mut signal_nodes = HashMap::new();
        let mut seen_views: HashMap<ViewId, BindingId> = HashMap::new();
        let mut problems: Vec<String> = Vec::new();

        for name in store.names() {
            let node = graph.add_node(GraphNode::Signal);
            signal_nodes.insert(name.to_string(), node);
        }

        for (id, binding) in bindings.iter().enumerate() {
            if !registry.contains(binding.view()) {
                problems.push(format!(
                    "binding {} produces unregistered view '{}'",
                    id,
                    binding.view()
                ));
            }
            if let Some(&prior) = seen_views.get(binding.view()) {
                problems.push(format!(
                    "view '{}' is produced by bindings {} and {}",
                    binding.view(),
                    prior,
                    id
                ));
            } else {
                seen_views.insert(binding.view().clone(), id);
            }

            let view_node = graph.add_node(GraphNode::View(id));

            if binding.inputs().is_empty() {
                problems.push(format!(
                    "binding for view '{}' declares no inputs",
                    binding.view()
                ));
            }
            for input in binding.inputs() {
                match signal_nodes.get(input) {
                    Some(&signal_node) => {
                        graph.add_edge(signal_node, view_node, ());
                    }
                    None => problems.push(format!(
                        "binding for view '{}' references undeclared signal '{}'",
                        binding.view(),
                        input
                    )),
                }
            }
        }

        if !problems.is_empty() {
            return Err(CoreError::config(format!(
                "dependency graph is invalid: {}",
                problems.join("; ")
            )));
        }

        Ok(Self { graph, bindings, signal_nodes })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id]
    }

    pub fn binding_ids(&self) -> impl Iterator<Item = BindingId> {
        0..self.bindings.len()
    }

    /// Every binding whose dependency set intersects the changed names,
    /// deduplicated, in binding order.
    pub fn affected(&self, changed: &[String]) -> Vec<BindingId> {
        let mut hit = vec![false; self.bindings.len()];
        for name in changed {
            if let Some(&signal_node) = self.signal_nodes.get(name) {
                for neighbor in self.graph.neighbors(signal_node) {
                    if let GraphNode::View(binding) = self.graph[neighbor] {
                        hit[binding] = true;
                    }
                }
            }
        }
        hit.iter()
            .enumerate()
            .filter_map(|(id, &h)| h.then_some(id))
            .collect()
    }
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("signals", &self.signal_nodes.len())
            .field("bindings", &self.bindings.len())
            .finish()
    }
}
