//! Arena-backed mutable dataflow graph.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use snafu::{OptionExt, ensure};

use crate::error::*;
use crate::node::Node;
use crate::types::{GraphId, InAnchor, NodeId, NodeIo};

/// Mutable dataflow graph.
///
/// Nodes are stored in an arena of slots addressed by [`NodeId`]. Removing a
/// node leaves a tombstone, so ids stay valid (and dangling ids are detected)
/// for the lifetime of the graph. Every structural mutation bumps
/// [`version`](Self::version), which lets cursors held outside the graph
/// notice that cached state went stale.
#[derive(Debug, Clone)]
pub struct ComputeGraph {
    id: GraphId,
    name: String,
    nodes: Vec<Option<Node>>,
    outputs: Vec<NodeIo>,
    live: usize,
    version: u64,
}

impl ComputeGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: GraphId::fresh(), name: name.into(), nodes: Vec::new(), outputs: Vec::new(), live: 0, version: 0 }
    }

    pub fn id(&self) -> GraphId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Monotonic mutation counter.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn add_node(
        &mut self,
        op_type: impl Into<String>,
        name: impl Into<String>,
        num_inputs: usize,
        num_outputs: usize,
    ) -> NodeId {
        let id = NodeId { graph: self.id, index: self.nodes.len() as u32 };
        self.nodes.push(Some(Node::new(id, name.into(), op_type.into(), num_inputs, num_outputs)));
        self.live += 1;
        self.version += 1;
        id
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        if id.graph != self.id {
            return None;
        }
        self.nodes.get(id.index as usize).and_then(Option::as_ref)
    }

    /// Mutable access to a live node. Counts as a mutation only when a node
    /// is returned.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.try_node_mut(id).ok()
    }

    pub fn try_node(&self, id: NodeId) -> Result<&Node> {
        ensure!(id.graph == self.id, ForeignNodeSnafu { node: id, expected: self.id });
        self.node(id).context(NodeNotFoundSnafu { node: id, graph: self.id })
    }

    /// Like [`node_mut`](Self::node_mut), reporting why the node is unavailable.
    pub fn try_node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.try_node(id)?;
        self.version += 1;
        self.slot_mut(id)
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        ensure!(id.graph == self.id, ForeignNodeSnafu { node: id, expected: self.id });
        let graph = self.id;
        self.nodes.get_mut(id.index as usize).and_then(Option::as_mut).context(NodeNotFoundSnafu { node: id, graph })
    }

    /// Live nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter_map(Option::as_ref)
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes().map(Node::id).collect()
    }

    pub fn node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes().find(|n| n.name() == name).map(Node::id)
    }

    /// `base` if no live node uses it, otherwise `base_<n>` for the first free `n`.
    pub fn unique_name(&self, base: &str) -> String {
        if self.node_by_name(base).is_none() {
            return base.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{base}_{n}");
            if self.node_by_name(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Check that `anchor` names an existing output port.
    pub fn check_output(&self, anchor: NodeIo) -> Result<()> {
        let node = self.try_node(anchor.node)?;
        ensure!(
            (anchor.index as usize) < node.num_outputs(),
            OutputOutOfRangeSnafu { anchor, count: node.num_outputs() }
        );
        Ok(())
    }

    /// Check that `anchor` names an existing input slot.
    pub fn check_input(&self, anchor: InAnchor) -> Result<()> {
        let node = self.try_node(anchor.node)?;
        ensure!((anchor.index as usize) < node.num_inputs(), InputOutOfRangeSnafu { anchor, count: node.num_inputs() });
        Ok(())
    }

    pub fn producer(&self, anchor: InAnchor) -> Option<NodeIo> {
        self.node(anchor.node).and_then(|n| n.input(anchor.index as usize))
    }

    pub fn consumers(&self, anchor: NodeIo) -> &[InAnchor] {
        self.node(anchor.node).map(|n| n.consumers(anchor.index as usize)).unwrap_or(&[])
    }

    /// Connect `src` to the free input slot `dst`.
    pub fn connect(&mut self, src: NodeIo, dst: InAnchor) -> Result<()> {
        self.check_output(src)?;
        self.check_input(dst)?;
        if let Some(producer) = self.producer(dst) {
            return InputAlreadyConnectedSnafu { anchor: dst, producer }.fail();
        }
        self.slot_mut(dst.node)?.inputs[dst.index as usize] = Some(src);
        self.slot_mut(src.node)?.outputs[src.index as usize].push(dst);
        self.version += 1;
        Ok(())
    }

    /// Detach the producer of `dst`, returning it.
    pub fn disconnect(&mut self, dst: InAnchor) -> Result<Option<NodeIo>> {
        self.check_input(dst)?;
        let Some(src) = self.slot_mut(dst.node)?.inputs[dst.index as usize].take() else {
            return Ok(None);
        };
        if let Ok(producer) = self.slot_mut(src.node)
            && let Some(consumers) = producer.outputs.get_mut(src.index as usize)
        {
            consumers.retain(|c| *c != dst);
        }
        self.version += 1;
        Ok(Some(src))
    }

    /// Add a control dependency `src -> dst`. Duplicate edges are ignored.
    pub fn add_control_edge(&mut self, src: NodeId, dst: NodeId) -> Result<()> {
        ensure!(src != dst, SelfControlEdgeSnafu { node: src });
        self.try_node(dst)?;
        let from = self.slot_mut(src)?;
        if from.control_outputs.contains(&dst) {
            return Ok(());
        }
        from.control_outputs.push(dst);
        self.slot_mut(dst)?.control_inputs.push(src);
        self.version += 1;
        Ok(())
    }

    pub fn remove_control_edge(&mut self, src: NodeId, dst: NodeId) -> bool {
        let Ok(from) = self.slot_mut(src) else { return false };
        let before = from.control_outputs.len();
        from.control_outputs.retain(|n| *n != dst);
        if from.control_outputs.len() == before {
            return false;
        }
        if let Ok(to) = self.slot_mut(dst) {
            to.control_inputs.retain(|n| *n != src);
        }
        self.version += 1;
        true
    }

    /// Remove a node together with every data and control edge touching it.
    ///
    /// Graph output entries referring to the node are dropped as well.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        let node = self.try_node(id)?.clone();

        for (index, producer) in node.inputs.iter().enumerate() {
            if producer.is_some() {
                self.disconnect(InAnchor::new(id, index as u32))?;
            }
        }
        for (_, consumer) in node.all_consumers() {
            self.disconnect(consumer)?;
        }
        for &pred in &node.control_inputs {
            self.remove_control_edge(pred, id);
        }
        for &succ in &node.control_outputs {
            self.remove_control_edge(id, succ);
        }

        self.outputs.retain(|o| o.node != id);
        let removed = self.nodes[id.index as usize].take().context(NodeNotFoundSnafu { node: id, graph: self.id })?;
        self.live -= 1;
        self.version += 1;
        Ok(removed)
    }

    /// Ordered graph outputs.
    pub fn outputs(&self) -> &[NodeIo] {
        &self.outputs
    }

    pub fn set_outputs(&mut self, outputs: Vec<NodeIo>) -> Result<()> {
        for &o in &outputs {
            self.check_output(o)?;
        }
        self.outputs = outputs;
        self.version += 1;
        Ok(())
    }

    /// Re-point every graph output equal to `old` at `new`. Returns the number
    /// of entries changed.
    pub fn replace_output(&mut self, old: NodeIo, new: NodeIo) -> usize {
        let mut changed = 0;
        for o in self.outputs.iter_mut().filter(|o| **o == old) {
            *o = new;
            changed += 1;
        }
        if changed > 0 {
            self.version += 1;
        }
        changed
    }

    /// `Data` nodes with their declared index, ordered by index.
    pub fn data_nodes(&self) -> Vec<(i64, NodeId)> {
        let mut data: Vec<_> = self.nodes().filter_map(|n| n.data_index().map(|i| (i, n.id()))).collect();
        data.sort();
        data
    }

    /// Data and control successors of a node.
    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.node(id) else { return Vec::new() };
        let mut succ: Vec<NodeId> = node.all_consumers().map(|(_, c)| c.node).collect();
        succ.extend(node.control_outputs.iter().copied());
        succ.sort();
        succ.dedup();
        succ
    }

    /// Deterministic topological order over data and control edges.
    ///
    /// Ties are broken by creation order.
    pub fn topological_order(&self) -> Result<Vec<NodeId>> {
        let mut in_degree: HashMap<NodeId, usize> = HashMap::with_capacity(self.live);
        for node in self.nodes() {
            in_degree.entry(node.id()).or_insert(0);
            for succ in self.successors(node.id()) {
                *in_degree.entry(succ).or_insert(0) += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<NodeId>> =
            in_degree.iter().filter(|&(_, &d)| d == 0).map(|(&id, _)| Reverse(id)).collect();
        let mut order = Vec::with_capacity(self.live);
        while let Some(Reverse(id)) = ready.pop() {
            order.push(id);
            for succ in self.successors(id) {
                if let Some(d) = in_degree.get_mut(&succ) {
                    *d -= 1;
                    if *d == 0 {
                        ready.push(Reverse(succ));
                    }
                }
            }
        }

        ensure!(
            order.len() == self.live,
            GraphHasCycleSnafu { graph: self.name.clone(), remaining: self.live - order.len() }
        );
        Ok(order)
    }

    pub fn has_cycle(&self) -> bool {
        self.topological_order().is_err()
    }
}
