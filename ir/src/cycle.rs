//! Cycle detection for fusion decisions.
//!
//! Fusing a node set `S` into one node introduces a cycle exactly when some
//! path leaves `S`, passes through at least one node outside `S`, and
//! re-enters `S`. [`ReachabilityDetector`] answers that question with a
//! forward search bounded by topological rank: a node ranked after every
//! member of `S` can never reach back into it.

use std::collections::{HashMap, HashSet};

use crate::graph::ComputeGraph;
use crate::types::NodeId;

/// Decides whether a graph mutation creates a dependency cycle.
pub trait CycleDetector {
    /// Would collapsing `fused` into a single node create a cycle?
    fn would_cause_cycle(&mut self, graph: &ComputeGraph, fused: &[NodeId]) -> bool;

    /// Does the graph currently contain a cycle?
    fn has_cycle(&self, graph: &ComputeGraph) -> bool {
        graph.has_cycle()
    }

    /// Notify the detector that `removed` nodes were replaced by `added` nodes.
    fn update(&mut self, graph: &ComputeGraph, removed: &[NodeId], added: &[NodeId]);
}

/// Rank-pruned reachability detector.
///
/// Caches a topological rank per node; the cache is rebuilt lazily whenever
/// the graph's version moved since the last refresh.
#[derive(Debug, Default)]
pub struct ReachabilityDetector {
    rank: HashMap<NodeId, usize>,
    version: Option<u64>,
}

impl ReachabilityDetector {
    pub fn new(graph: &ComputeGraph) -> Self {
        let mut detector = Self::default();
        detector.refresh(graph);
        detector
    }

    fn refresh(&mut self, graph: &ComputeGraph) {
        if self.version == Some(graph.version()) {
            return;
        }
        self.rank.clear();
        match graph.topological_order() {
            Ok(order) => {
                self.rank.extend(order.into_iter().enumerate().map(|(r, id)| (id, r)));
            }
            Err(e) => tracing::warn!(error = %e, "reachability ranks unavailable, falling back to full search"),
        }
        self.version = Some(graph.version());
    }
}

impl CycleDetector for ReachabilityDetector {
    fn would_cause_cycle(&mut self, graph: &ComputeGraph, fused: &[NodeId]) -> bool {
        self.refresh(graph);
        let members: HashSet<NodeId> = fused.iter().copied().collect();
        let limit = fused.iter().filter_map(|id| self.rank.get(id)).max().copied().unwrap_or(usize::MAX);
        let within_limit = |id: &NodeId, rank: &HashMap<NodeId, usize>| rank.get(id).is_none_or(|&r| r < limit);

        let mut stack: Vec<NodeId> = fused
            .iter()
            .flat_map(|&id| graph.successors(id))
            .filter(|s| !members.contains(s) && within_limit(s, &self.rank))
            .collect();
        let mut visited: HashSet<NodeId> = stack.iter().copied().collect();

        while let Some(id) = stack.pop() {
            for succ in graph.successors(id) {
                if members.contains(&succ) {
                    tracing::trace!(via = %id, reenters = %succ, "fusion would create a cycle");
                    return true;
                }
                if within_limit(&succ, &self.rank) && visited.insert(succ) {
                    stack.push(succ);
                }
            }
        }
        false
    }

    fn update(&mut self, graph: &ComputeGraph, removed: &[NodeId], added: &[NodeId]) {
        tracing::trace!(removed = removed.len(), added = added.len(), "refreshing reachability ranks");
        self.version = None;
        self.refresh(graph);
    }
}
