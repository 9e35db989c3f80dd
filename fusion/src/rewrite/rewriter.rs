//! Splice-and-replace graph surgery.
//!
//! # Algorithm
//!
//! [`SubgraphRewriter::replace`] runs in stages:
//!
//! 1. Validate: slot counts, contiguous slot indices, no foreign nodes,
//!    self-containment, well-formed replacement. Nothing is mutated yet.
//! 2. Splice: clone the replacement's operator nodes into the target graph,
//!    stamping provenance and inherited attributes.
//! 3. Reconnect inputs, then outputs (external consumers keep their input
//!    index; graph outputs are re-pointed).
//! 4. Transfer external control edges onto the new nodes.
//! 5. Delete the enclosed nodes.
//! 6. Cycle check. A failure here leaves the graph mutated; callers that need
//!    atomicity snapshot the graph beforehand.

use std::collections::{BTreeMap, BTreeSet};

use graft_ir::{ComputeGraph, CycleDetector, InAnchor, NodeId, NodeIo, ReachabilityDetector};
use snafu::{OptionExt, ResultExt, ensure};
use tracing::debug;

use super::boundary::SubgraphBoundary;
use crate::error::*;
use crate::provenance::{INHERITED_ATTRS, Origins, active_pass_name, inherited_value};

/// Nodes removed and introduced by one replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub removed: Vec<NodeId>,
    pub added: Vec<NodeId>,
}

/// Replaces the region described by a [`SubgraphBoundary`] with a
/// replacement graph.
///
/// The replacement's `Data` node with index `i` stands for boundary input
/// `i`; its graph output `j` stands for boundary output `j`. A replacement
/// output that is itself a `Data` node passes the external input straight
/// through.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubgraphRewriter;

struct Plan {
    enclosed: BTreeSet<NodeId>,
    inputs: Vec<NodeIo>,
    outputs: Vec<NodeIo>,
}

impl SubgraphRewriter {
    pub fn replace(graph: &mut ComputeGraph, boundary: &SubgraphBoundary, replacement: &ComputeGraph) -> Result<()> {
        Self::replace_tracked(graph, boundary, replacement).map(|_| ())
    }

    /// [`replace`](Self::replace), reporting the affected nodes.
    pub fn replace_tracked(
        graph: &mut ComputeGraph,
        boundary: &SubgraphBoundary,
        replacement: &ComputeGraph,
    ) -> Result<RewriteSummary> {
        let plan = Self::validate(graph, boundary, replacement)?;
        let originals: Vec<NodeId> = plan.enclosed.iter().copied().collect();
        let pass = active_pass_name();

        let clones = Self::splice(graph, replacement, &originals, &pass)?;
        Self::reconnect_inputs(graph, replacement, &clones, &plan)?;
        Self::reconnect_outputs(graph, replacement, &clones, &plan)?;
        Self::transfer_control_edges(graph, replacement, &clones, &plan)?;

        for &id in &originals {
            graph.remove_node(id).context(GraphSnafu)?;
        }

        if ReachabilityDetector::default().has_cycle(graph) {
            return CycleIntroducedSnafu { graph: graph.name() }.fail();
        }

        let added: Vec<NodeId> = clones.values().copied().collect();
        debug!(graph = graph.name(), pass = %pass, removed = originals.len(), added = added.len(), "subgraph replaced");
        Ok(RewriteSummary { removed: originals, added })
    }

    fn validate(graph: &ComputeGraph, boundary: &SubgraphBoundary, replacement: &ComputeGraph) -> Result<Plan> {
        let data = replacement.data_nodes();
        ensure!(
            data.len() == boundary.inputs().len(),
            InputCountMismatchSnafu { replacement: data.len(), boundary: boundary.inputs().len() }
        );
        ensure!(
            replacement.outputs().len() == boundary.outputs().len(),
            OutputCountMismatchSnafu { replacement: replacement.outputs().len(), boundary: boundary.outputs().len() }
        );

        let input_indices: Vec<usize> = boundary.inputs().keys().copied().collect();
        ensure!(is_contiguous(&input_indices), NonContiguousBoundarySnafu { kind: "input", indices: input_indices });
        let output_indices: Vec<usize> = boundary.outputs().keys().copied().collect();
        ensure!(is_contiguous(&output_indices), NonContiguousBoundarySnafu { kind: "output", indices: output_indices });

        for node in boundary.referenced_nodes() {
            ensure!(graph.contains(node), CrossGraphBoundarySnafu { node, graph: graph.name() });
        }

        let invalid = |reason: String| InvalidReplacementSnafu { graph: replacement.name(), reason }.fail();
        if data.iter().enumerate().any(|(i, (index, _))| *index != i as i64) {
            let indices: Vec<i64> = data.iter().map(|(index, _)| *index).collect();
            return invalid(format!("Data indices {indices:?} are not contiguous from 0"));
        }
        if replacement.topological_order().is_err() {
            return invalid("replacement graph has a cycle".into());
        }
        for &output in replacement.outputs() {
            if replacement.check_output(output).is_err() {
                return invalid(format!("output {output} does not exist"));
            }
        }

        let inputs = (0..data.len()).map(|i| boundary.input_producer(i)).collect::<Result<Vec<_>>>()?;
        let outputs =
            (0..replacement.outputs().len()).map(|j| boundary.output_producer(j)).collect::<Result<Vec<_>>>()?;

        boundary.check_self_contained(graph)?;
        let enclosed = boundary.enclosed_nodes(graph)?;
        Ok(Plan { enclosed, inputs, outputs })
    }

    /// Clone replacement operators; returns replacement id -> new id.
    fn splice(
        graph: &mut ComputeGraph,
        replacement: &ComputeGraph,
        originals: &[NodeId],
        pass: &str,
    ) -> Result<BTreeMap<NodeId, NodeId>> {
        let origins = Origins::collect(graph, originals.iter().copied());
        let mut clones = BTreeMap::new();

        for source in replacement.nodes().filter(|n| !n.is_data() && !n.is_net_output()) {
            let inherited: Vec<(&str, graft_ir::AttrValue)> = INHERITED_ATTRS
                .iter()
                .filter(|&&name| source.attr(name).is_none())
                .filter_map(|&name| inherited_value(graph, originals, source.op_type(), name).map(|v| (name, v)))
                .collect();

            let name = graph.unique_name(source.name());
            let id = graph.add_node(source.op_type(), name, source.num_inputs(), source.num_outputs());
            let node = graph.try_node_mut(id).context(GraphSnafu)?;
            for (key, value) in source.attrs() {
                if source.ir_attr_names().contains(key) {
                    node.set_ir_attr(key.clone(), value.clone());
                } else {
                    node.set_attr(key.clone(), value.clone());
                }
            }
            for subgraph in source.subgraphs() {
                node.add_subgraph(subgraph.clone());
            }
            node.set_dynamic_io(source.has_dynamic_io());
            for (key, value) in inherited {
                node.set_attr(key, value);
            }
            origins.stamp(node, pass);
            clones.insert(source.id(), id);
        }

        for source in replacement.nodes() {
            let Some(&src) = clones.get(&source.id()) else { continue };
            for (index, producer) in source.inputs().iter().enumerate() {
                if let Some(producer) = producer
                    && let Some(&from) = clones.get(&producer.node)
                {
                    let dst = InAnchor::new(src, index as u32);
                    graph.connect(NodeIo::new(from, producer.index), dst).context(GraphSnafu)?;
                }
            }
            for succ in source.control_outputs() {
                if let Some(&dst) = clones.get(succ) {
                    graph.add_control_edge(src, dst).context(GraphSnafu)?;
                }
            }
        }
        Ok(clones)
    }

    /// External producer standing in for replacement `Data` node `node`.
    fn external_input(replacement: &ComputeGraph, plan: &Plan, node: NodeId) -> Option<NodeIo> {
        let index = replacement.node(node)?.data_index()?;
        plan.inputs.get(usize::try_from(index).ok()?).copied()
    }

    fn reconnect_inputs(
        graph: &mut ComputeGraph,
        replacement: &ComputeGraph,
        clones: &BTreeMap<NodeId, NodeId>,
        plan: &Plan,
    ) -> Result<()> {
        for source in replacement.nodes() {
            let Some(&dst_node) = clones.get(&source.id()) else { continue };
            for (index, producer) in source.inputs().iter().enumerate() {
                let Some(producer) = producer else { continue };
                if let Some(external) = Self::external_input(replacement, plan, producer.node) {
                    graph.connect(external, InAnchor::new(dst_node, index as u32)).context(GraphSnafu)?;
                }
            }
        }
        Ok(())
    }

    fn reconnect_outputs(
        graph: &mut ComputeGraph,
        replacement: &ComputeGraph,
        clones: &BTreeMap<NodeId, NodeId>,
        plan: &Plan,
    ) -> Result<()> {
        let added: BTreeSet<NodeId> = clones.values().copied().collect();
        for (slot, &output) in replacement.outputs().iter().enumerate() {
            let old = plan.outputs[slot];
            let new = match clones.get(&output.node) {
                Some(&id) => NodeIo::new(id, output.index),
                None => Self::external_input(replacement, plan, output.node).context(InvalidReplacementSnafu {
                    graph: replacement.name(),
                    reason: format!("output {output} is neither an operator nor a Data node"),
                })?,
            };
            if new == old {
                continue;
            }

            let external: Vec<InAnchor> = graph
                .consumers(old)
                .iter()
                .copied()
                .filter(|c| !plan.enclosed.contains(&c.node) && !added.contains(&c.node))
                .collect();
            for consumer in external {
                graph.disconnect(consumer).context(GraphSnafu)?;
                graph.connect(new, consumer).context(GraphSnafu)?;
            }
            graph.replace_output(old, new);
        }
        Ok(())
    }

    /// Control predecessors of the region feed the new entry nodes; control
    /// successors depend on the new exit nodes.
    fn transfer_control_edges(
        graph: &mut ComputeGraph,
        replacement: &ComputeGraph,
        clones: &BTreeMap<NodeId, NodeId>,
        plan: &Plan,
    ) -> Result<()> {
        let mut preds = BTreeSet::new();
        let mut succs = BTreeSet::new();
        for &id in &plan.enclosed {
            let node = graph.try_node(id).context(GraphSnafu)?;
            preds.extend(node.control_inputs().iter().filter(|n| !plan.enclosed.contains(n)));
            succs.extend(node.control_outputs().iter().filter(|n| !plan.enclosed.contains(n)));
        }
        if preds.is_empty() && succs.is_empty() {
            return Ok(());
        }

        if clones.is_empty() {
            for &pred in &preds {
                for &succ in succs.iter().filter(|&&s| s != pred) {
                    graph.add_control_edge(pred, succ).context(GraphSnafu)?;
                }
            }
            return Ok(());
        }

        let entries: Vec<NodeId> = replacement
            .nodes()
            .filter(|n| clones.contains_key(&n.id()))
            .filter(|n| n.inputs().iter().flatten().all(|p| !clones.contains_key(&p.node)))
            .filter_map(|n| clones.get(&n.id()).copied())
            .collect();
        let mut exits: Vec<NodeId> = replacement.outputs().iter().filter_map(|o| clones.get(&o.node).copied()).collect();
        if exits.is_empty() {
            exits = clones.values().copied().collect();
        }
        exits.sort();
        exits.dedup();

        for &pred in &preds {
            for &entry in &entries {
                graph.add_control_edge(pred, entry).context(GraphSnafu)?;
            }
        }
        for &succ in &succs {
            for &exit in &exits {
                graph.add_control_edge(exit, succ).context(GraphSnafu)?;
            }
        }
        Ok(())
    }
}

fn is_contiguous(indices: &[usize]) -> bool {
    indices.iter().enumerate().all(|(i, &index)| i == index)
}
