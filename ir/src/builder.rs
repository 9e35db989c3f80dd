//! Fluent construction of small graphs (patterns, replacements, tests).
//!
//! ```
//! use graft_ir::GraphBuilder;
//!
//! let mut b = GraphBuilder::new("abs_exp");
//! let x = b.data(0);
//! let abs = b.op("Abs", &[x]);
//! let exp = b.op("Exp", &[abs]);
//! let graph = b.build(&[exp]).unwrap();
//! assert_eq!(graph.len(), 3);
//! assert_eq!(graph.outputs(), &[exp]);
//! ```

use std::collections::{BTreeSet, HashMap};

use crate::attr::{AttrValue, TensorValue};
use crate::error::{DuplicateDataIndexSnafu, Error, ForeignAnchorSnafu, Result};
use crate::graph::ComputeGraph;
use crate::types::{ATTR_INDEX, ATTR_VALUE, DATA, InAnchor, NET_OUTPUT, NodeId, NodeIo};

/// Builds a [`ComputeGraph`] node by node.
///
/// Construction methods are infallible and return anchors directly; the
/// first error encountered is kept and reported by [`build`](Self::build).
pub struct GraphBuilder {
    graph: ComputeGraph,
    error: Option<Error>,
    names: HashMap<String, usize>,
    data_indices: BTreeSet<i64>,
}

impl GraphBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { graph: ComputeGraph::new(name), error: None, names: HashMap::new(), data_indices: BTreeSet::new() }
    }

    /// The graph under construction.
    pub fn graph(&self) -> &ComputeGraph {
        &self.graph
    }

    fn record(&mut self, result: Result<()>) {
        if let Err(e) = result
            && self.error.is_none()
        {
            self.error = Some(e);
        }
    }

    fn auto_name(&mut self, op_type: &str) -> String {
        let count = self.names.entry(op_type.to_string()).or_default();
        let name = format!("{}_{}", op_type.to_lowercase(), count);
        *count += 1;
        name
    }

    /// Free graph input with the given index.
    pub fn data(&mut self, index: i64) -> NodeIo {
        if !self.data_indices.insert(index) {
            let err = DuplicateDataIndexSnafu { graph: self.graph.name().to_string(), index }.build();
            self.record(Err(err));
        }
        let id = self.graph.add_node(DATA, format!("data_{index}"), 0, 1);
        self.set_attr(id, ATTR_INDEX, index);
        NodeIo::new(id, 0)
    }

    /// Constant producer carrying `value`.
    pub fn constant(&mut self, value: TensorValue) -> NodeIo {
        let id = self.node("Const", None, &[], 1);
        self.set_attr(id, ATTR_VALUE, value);
        NodeIo::new(id, 0)
    }

    /// Constant producer without a payload; inside a pattern it matches any constant.
    pub fn any_constant(&mut self) -> NodeIo {
        NodeIo::new(self.node("Const", None, &[], 1), 0)
    }

    /// Single-output operator.
    pub fn op(&mut self, op_type: &str, inputs: &[NodeIo]) -> NodeIo {
        NodeIo::new(self.node(op_type, None, inputs, 1), 0)
    }

    /// Operator with `num_outputs` output ports.
    pub fn op_multi(&mut self, op_type: &str, inputs: &[NodeIo], num_outputs: usize) -> Vec<NodeIo> {
        let id = self.node(op_type, None, inputs, num_outputs);
        (0..num_outputs as u32).map(|i| NodeIo::new(id, i)).collect()
    }

    /// Single-output operator with an explicit name.
    pub fn named_op(&mut self, name: &str, op_type: &str, inputs: &[NodeIo]) -> NodeIo {
        NodeIo::new(self.node(op_type, Some(name), inputs, 1), 0)
    }

    /// General node constructor; inputs are connected in order.
    pub fn node(&mut self, op_type: &str, name: Option<&str>, inputs: &[NodeIo], num_outputs: usize) -> NodeId {
        let name = match name {
            Some(n) => n.to_string(),
            None => self.auto_name(op_type),
        };
        let id = self.graph.add_node(op_type, name, inputs.len(), num_outputs);
        for (index, &src) in inputs.iter().enumerate() {
            let result = self.connect_checked(src, InAnchor::new(id, index as u32));
            self.record(result);
        }
        id
    }

    fn connect_checked(&mut self, src: NodeIo, dst: InAnchor) -> Result<()> {
        if src.node.graph != self.graph.id() {
            return ForeignAnchorSnafu { graph: self.graph.name().to_string(), anchor: src }.fail();
        }
        self.graph.connect(src, dst)
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<AttrValue>) {
        if let Some(n) = self.graph.node_mut(node) {
            n.set_attr(name, value);
        }
    }

    pub fn set_ir_attr(&mut self, node: NodeId, name: &str, value: impl Into<AttrValue>) {
        if let Some(n) = self.graph.node_mut(node) {
            n.set_ir_attr(name, value);
        }
    }

    pub fn control_edge(&mut self, src: NodeId, dst: NodeId) {
        let result = self.graph.add_control_edge(src, dst);
        self.record(result);
    }

    /// Add a `NETOUTPUT` node consuming `outputs` and declare them as the
    /// graph outputs.
    pub fn net_output(&mut self, outputs: &[NodeIo]) -> NodeId {
        let id = self.node(NET_OUTPUT, Some(NET_OUTPUT), outputs, 0);
        let result = self.graph.set_outputs(outputs.to_vec());
        self.record(result);
        id
    }

    /// Finish the graph. A non-empty `outputs` replaces any outputs declared
    /// through [`net_output`](Self::net_output).
    pub fn build(mut self, outputs: &[NodeIo]) -> Result<ComputeGraph> {
        if !outputs.is_empty() {
            let result = self.graph.set_outputs(outputs.to_vec());
            self.record(result);
        }
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.graph),
        }
    }
}
