//! Mapping produced by one successful match.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use graft_ir::{ComputeGraph, InAnchor, NodeId, NodeIo};
use snafu::{OptionExt, ResultExt, ensure};

use super::Pattern;
use super::role::NodeRole;
use crate::error::*;
use crate::rewrite::{SubgraphBoundary, SubgraphInput, SubgraphOutput};

/// Pattern-node to target-node mapping plus the boundary and capture data
/// derived from it.
///
/// Results are cheap to clone; the matcher clones the in-progress result
/// before every branch attempt so a failed branch leaves it untouched.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pattern: Arc<Pattern>,
    pattern_to_target: BTreeMap<NodeId, NodeId>,
    /// Inverse mapping for non-Data pattern nodes only.
    target_to_pattern: BTreeMap<NodeId, NodeId>,
    inputs: BTreeMap<usize, SubgraphInput>,
    outputs: BTreeMap<usize, BTreeSet<NodeIo>>,
    captures: BTreeMap<usize, NodeIo>,
}

impl MatchResult {
    pub fn new(pattern: Arc<Pattern>) -> Self {
        Self {
            pattern,
            pattern_to_target: BTreeMap::new(),
            target_to_pattern: BTreeMap::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            captures: BTreeMap::new(),
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Record that pattern tensor `pattern_io` matched target tensor `target_io`.
    ///
    /// `target_consumer` is the target input anchor the tensor was reached
    /// through; it is registered as a boundary consumer when the pattern side
    /// is a Data wildcard. Output slots and captures naming `pattern_io` are
    /// resolved as a side effect.
    ///
    /// On error the result is unchanged.
    pub fn append_node_match_pair(
        &mut self,
        target: &ComputeGraph,
        pattern_io: NodeIo,
        target_io: NodeIo,
        target_consumer: Option<InAnchor>,
    ) -> Result<()> {
        let pattern_node = self.pattern.graph().try_node(pattern_io.node).context(GraphSnafu)?;
        let role = NodeRole::of(pattern_node);

        let conflict = InconsistentMappingSnafu { pattern: pattern_io.node, target: target_io.node };
        if let Some(&mapped) = self.pattern_to_target.get(&pattern_io.node) {
            ensure!(mapped == target_io.node, conflict);
        }
        if !role.is_data()
            && let Some(&owner) = self.target_to_pattern.get(&target_io.node)
        {
            ensure!(owner == pattern_io.node, conflict);
        }

        if let NodeRole::Data { index } = role
            && let Some(consumer) = target_consumer
        {
            let index = index as usize;
            let mut slot = self.inputs.get(&index).cloned().unwrap_or_default();
            if !slot.consumers().contains(&consumer) {
                slot.add_input(target, consumer)?;
                self.inputs.insert(index, slot);
            }
        }

        self.pattern_to_target.insert(pattern_io.node, target_io.node);
        if !role.is_data() {
            self.target_to_pattern.insert(target_io.node, pattern_io.node);
        }

        let outputs = self.pattern.outputs().iter().enumerate().filter(|(_, o)| **o == pattern_io);
        for (slot, _) in outputs {
            self.outputs.entry(slot).or_default().insert(target_io);
        }

        // Captures on the same node but another port resolve to the same port
        // of the target, except for Data where only the reached tensor is known.
        let captures = self.pattern.captured_tensors().iter().enumerate().filter(|(_, c)| c.node == pattern_io.node);
        for (index, capture) in captures {
            let resolved = match role {
                NodeRole::Data { .. } if *capture == pattern_io => target_io,
                NodeRole::Data { .. } => continue,
                _ => NodeIo::new(target_io.node, capture.index),
            };
            self.captures.insert(index, resolved);
        }
        Ok(())
    }

    /// Target node matched by `pattern_node`. For Data wildcards this is the
    /// external producer.
    pub fn matched_node(&self, pattern_node: NodeId) -> Option<NodeId> {
        self.pattern_to_target.get(&pattern_node).copied()
    }

    /// Pattern node matched onto `target_node`, if it is a non-Data match.
    pub fn pattern_node(&self, target_node: NodeId) -> Option<NodeId> {
        self.target_to_pattern.get(&target_node).copied()
    }

    /// Matched target nodes excluding Data-wildcard matches, in creation order.
    pub fn matched_nodes(&self) -> Vec<NodeId> {
        self.target_to_pattern.keys().copied().collect()
    }

    pub fn contains(&self, target_node: NodeId) -> bool {
        self.target_to_pattern.contains_key(&target_node)
    }

    pub fn captured_tensor(&self, index: usize) -> Result<NodeIo> {
        self.captures.get(&index).copied().context(CaptureNotResolvedSnafu { index })
    }

    /// Boundary inputs resolved so far, keyed by pattern Data index.
    pub fn inputs(&self) -> &BTreeMap<usize, SubgraphInput> {
        &self.inputs
    }

    /// Target tensors resolved per output slot.
    pub fn outputs(&self) -> &BTreeMap<usize, BTreeSet<NodeIo>> {
        &self.outputs
    }

    fn declared_outputs(&self) -> BTreeSet<NodeIo> {
        self.outputs.values().flatten().copied().collect()
    }

    /// Do all mapped target nodes and recorded boundary edges still exist?
    pub(crate) fn is_live(&self, target: &ComputeGraph) -> bool {
        self.pattern_to_target.values().all(|&id| target.contains(id))
            && self
                .inputs
                .values()
                .all(|input| input.consumers().iter().all(|&c| target.producer(c) == input.producer()))
    }

    /// Is the matched region free of undeclared external data edges?
    pub(crate) fn is_self_contained(&self, target: &ComputeGraph) -> bool {
        let declared = self.declared_outputs();
        for &id in self.target_to_pattern.keys() {
            let Some(node) = target.node(id) else { return false };
            let leaks = node.all_consumers().any(|(io, c)| !self.contains(c.node) && !declared.contains(&io));
            if leaks {
                tracing::trace!(node = %id, "match leaks an undeclared output");
                return false;
            }
        }
        if target.outputs().iter().any(|o| self.contains(o.node) && !declared.contains(o)) {
            return false;
        }
        self.inputs.values().filter_map(SubgraphInput::producer).all(|p| !self.contains(p.node))
    }

    /// Boundary describing the matched region, ready for rewriting.
    pub fn to_subgraph_boundary(&self, target: &ComputeGraph) -> Result<SubgraphBoundary> {
        let slots = self.pattern.outputs().len();
        ensure!(slots > 0, NoPatternOutputsSnafu { pattern: self.pattern.name() });

        let mut boundary = SubgraphBoundary::new();
        for (&index, input) in &self.inputs {
            boundary.add_input(index, input.clone())?;
        }
        for index in 0..slots {
            let producers = self.outputs.get(&index);
            let count = producers.map_or(0, BTreeSet::len);
            let producer = producers
                .and_then(|p| p.first().copied())
                .filter(|_| count == 1)
                .context(AmbiguousOutputSnafu { index, count })?;
            let mut output = SubgraphOutput::default();
            output.set_output(target, producer)?;
            boundary.add_output(index, output)?;
        }
        Ok(boundary)
    }
}

impl std::fmt::Display for MatchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "match of '{}':", self.pattern.name())?;
        for (pattern, target) in &self.pattern_to_target {
            let name = self.pattern.graph().node(*pattern).map_or("?", |n| n.name());
            writeln!(f, "  {name} ({pattern}) -> {target}")?;
        }
        for (index, input) in &self.inputs {
            let producer = input.producer().map_or_else(|| "_".to_string(), |p| p.to_string());
            writeln!(f, "  input[{index}] = {producer} ({} consumers)", input.consumers().len())?;
        }
        for (index, producers) in &self.outputs {
            let producers: Vec<String> = producers.iter().map(ToString::to_string).collect();
            writeln!(f, "  output[{index}] = {}", producers.join(" | "))?;
        }
        for (index, tensor) in &self.captures {
            writeln!(f, "  capture[{index}] = {tensor}")?;
        }
        Ok(())
    }
}
